//! Shared error reporting for the rlyeh instrumentation crates.
//!
//! This crate provides:
//! - The two error kinds every entry point can fail with
//!   ([`Error::Misconfiguration`] and [`Error::MalformedInput`])
//! - The [`Integration`] points a host can wire rlyeh into
//! - A [`Probe`] result used by entry points to reject inputs that belong to
//!   the other integration point
//!
//! # Example
//!
//! ```
//! use rlyeh_diagnostics::{Error, Integration, Probe};
//!
//! let probe: Probe<&str> = Probe::WrongIntegration(Integration::Loader);
//! let err = probe.into_result().unwrap_err();
//! assert!(matches!(err, Error::Misconfiguration { .. }));
//! assert!(err.to_string().contains("rlyeh/lib/babel-plugin"));
//! ```

pub mod error;
pub mod integration;

pub use error::{Error, Result};
pub use integration::{Integration, Probe};
