//! Tree-level hot-reload instrumentation
//!
//! Two passes run over an SWC module:
//!
//! - [`lift::LiftPass`] moves arrow functions held by instance fields and
//!   constructor assignments into named methods, leaving forwarding shims
//!   behind, so the runtime can swap the method bodies.
//! - [`register::RegistrationPass`] registers the module's top-level bindings
//!   with the runtime through a guarded block appended to the module.
//!
//! [`Plugin`] wires both together the way a compiler host runs them: lifting
//! first, registration last, and nothing at all in production builds.

pub mod builders;
pub mod config;
pub mod host;
pub mod lift;
pub mod optout;
pub mod origin;
pub mod register;
pub mod scope;

pub use config::{BuildMode, LiftConfig, Options, RegistrationConfig};
pub use lift::{LiftPass, LiftReport};
pub use register::{RegistrationPass, RegistrationReport};

use rlyeh_diagnostics::Result;
use serde::Serialize;
use serde_json::Value;
use swc_ecma_ast::Module;

/// Everything one file's transform did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformReport {
    pub registration: RegistrationReport,
    pub lifting: LiftReport,
}

/// Both passes, configured once per build.
pub struct Plugin {
    mode: BuildMode,
    registration: RegistrationPass,
    lifting: LiftPass,
}

impl Plugin {
    /// Construct the plugin for a compiler host. The host context is probed
    /// before anything else; the build mode is fixed here.
    pub fn new(host: &Value, options: &Options) -> Result<Self> {
        let mode = options.build_mode.unwrap_or_else(BuildMode::from_env);
        let registration =
            RegistrationPass::from_host(host, options.registration.clone(), mode)?;
        log::debug!("rlyeh plugin initialised ({:?})", mode);

        Ok(Self {
            mode,
            registration,
            lifting: LiftPass::new(options.lifting.clone()),
        })
    }

    pub fn build_mode(&self) -> BuildMode {
        self.mode
    }

    /// Instrument one module in place.
    pub fn transform(&self, module: &mut Module, filename: &str) -> TransformReport {
        if self.mode.is_production() {
            return TransformReport::default();
        }

        let lifting = self.lifting.run(module);
        let registration = self.registration.run(module, filename);
        log::debug!(
            "{}: {} registered, {} lifted, {} skipped",
            filename,
            registration.entries.len(),
            lifting.lifted.len(),
            lifting.skipped.len()
        );

        TransformReport {
            registration,
            lifting,
        }
    }
}
