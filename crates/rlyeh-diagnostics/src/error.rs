//! Error kinds surfaced by the transform passes and the loader adapter.

use crate::integration::Integration;

/// Result alias used throughout the rlyeh crates.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure is one of two kinds. Both are fatal for the file being
/// processed; the build pipeline decides whether to abort the whole build.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An entry point was wired into the wrong host integration point.
    #[error("Rlyeh: {message}")]
    Misconfiguration {
        /// The integration point the caller was actually wired into.
        integration: Integration,
        message: String,
    },

    /// The tree or text handed to us is not something we can process.
    #[error("malformed input: {0}")]
    MalformedInput(String),
}

impl Error {
    /// Build the misconfiguration error for an entry point that was invoked
    /// through `integration` by mistake.
    pub fn misconfigured(integration: Integration) -> Self {
        Error::Misconfiguration {
            integration,
            message: integration.remediation().to_string(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedInput(message.into())
    }

    /// Whether this error came from an integration-point mismatch.
    pub fn is_misconfiguration(&self) -> bool {
        matches!(self, Error::Misconfiguration { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::MalformedInput(format!("I/O error: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::MalformedInput(format!("invalid JSON: {}", err))
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Error::MalformedInput(format!("invalid UTF-8: {}", err))
    }
}
