//! CLI command implementations

pub mod append;
pub mod inspect;
