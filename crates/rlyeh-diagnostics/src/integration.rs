//! Host integration points and the shape probe used to tell them apart.
//!
//! rlyeh ships two entry points: a compiler plugin operating on the syntax
//! tree, and a bundler loader operating on emitted text. Users regularly wire
//! one into the slot meant for the other. Each entry point runs a single probe
//! over what the host handed it and turns a mismatch into an
//! [`Error::Misconfiguration`](crate::Error::Misconfiguration) that names the
//! correct slot.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Where an entry point was invoked from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Integration {
    /// Compiler plugin slot (the tree-level passes).
    CompilerPlugin,
    /// Bundler loader slot (the text-level adapter).
    Loader,
}

impl Integration {
    pub fn as_str(&self) -> &'static str {
        match self {
            Integration::CompilerPlugin => "compiler-plugin",
            Integration::Loader => "loader",
        }
    }

    /// Explanation shown when the *other* entry point was wired into this
    /// integration point.
    pub fn remediation(&self) -> &'static str {
        match self {
            // The plugin ended up in the loader chain.
            Integration::Loader => concat!(
                "You are erroneously trying to use a Babel plugin as a Webpack loader. ",
                "We recommend that you use Babel, remove \"rlyeh/lib/babel-plugin\" from the ",
                "\"loaders\" section of your Webpack configuration, and instead add ",
                "\"rlyeh/lib/babel-plugin\" to the \"plugins\" section of your .babelrc file. ",
                "If you prefer not to use Babel, replace \"rlyeh/lib/babel-plugin\" with ",
                "\"rlyeh/lib/webpack\" in the \"loaders\" section of your Webpack configuration."
            ),
            // The loader ended up in the compiler plugin list.
            Integration::CompilerPlugin => concat!(
                "You are erroneously trying to use a Webpack loader as a Babel plugin. ",
                "Replace \"rlyeh/lib/webpack\" with \"rlyeh/lib/babel-plugin\" in the ",
                "\"plugins\" section of your .babelrc file. While we recommend the above, ",
                "if you prefer not to use Babel, you may remove \"rlyeh/lib/webpack\" from the ",
                "\"plugins\" section of your .babelrc file altogether, and instead add ",
                "\"rlyeh/lib/webpack\" to the \"loaders\" section of your Webpack configuration."
            ),
        }
    }
}

impl std::fmt::Display for Integration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of probing an entry point's input.
#[derive(Debug, Clone, PartialEq)]
pub enum Probe<T> {
    /// The input has the shape this entry point expects.
    Ok(T),
    /// The input belongs to the named integration point instead.
    WrongIntegration(Integration),
}

impl<T> Probe<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Probe::Ok(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Probe<U> {
        match self {
            Probe::Ok(value) => Probe::Ok(f(value)),
            Probe::WrongIntegration(integration) => Probe::WrongIntegration(integration),
        }
    }

    /// Convert into a `Result`, turning a mismatch into a misconfiguration
    /// error.
    pub fn into_result(self) -> Result<T> {
        match self {
            Probe::Ok(value) => Ok(value),
            Probe::WrongIntegration(integration) => {
                log::trace!("integration probe rejected input from {}", integration);
                Err(Error::misconfigured(integration))
            }
        }
    }
}
