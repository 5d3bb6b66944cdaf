//! Bundler-side half of rlyeh.
//!
//! Works on emitted module text rather than a syntax tree: the CommonJS export
//! tagger is appended to the module and the module's source map is extended
//! to cover it.
//!
//! ```
//! use rlyeh_loader::{append, AppendRequest};
//!
//! let out = append(
//!     AppendRequest {
//!         text: "module.exports = 1;",
//!         map: None,
//!         resource_path: "/app/one.js",
//!         source_map: true,
//!     },
//!     rlyeh_loader::template::bundled(),
//! )
//! .unwrap();
//! assert!(out.code.starts_with("module.exports = 1;\n\n"));
//! assert!(out.map.is_some());
//! ```

pub mod adapter;
pub mod sourcemap;
pub mod template;
pub mod vlq;

pub use adapter::{append, loader, probe_source, AppendRequest, LoaderContext, LoaderOutput};
pub use sourcemap::{Mapping, OriginalPos, SourceMapJson};
pub use template::{TemplateCache, TemplateSource};
