//! Error types for aaaa-sync.

use thiserror::Error;

/// Result type alias for aaaa-sync.
pub type Result<T> = std::result::Result<T, DdnsError>;

/// Errors that end a reconciliation pass.
///
/// An unreadable interface table and malformed address entries are not
/// represented here: the detector reports those through
/// [`Discovery`](crate::detector::Discovery) instead.
#[derive(Error, Debug)]
pub enum DdnsError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading the published record set failed.
    #[error("Provider query failed ({provider}): {message}")]
    ProviderQuery { provider: String, message: String },

    /// Submitting the change batch failed.
    #[error("Provider write failed ({provider}): {message}")]
    ProviderWrite { provider: String, message: String },

    /// A provider call did not finish within the configured deadline.
    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: &'static str, secs: u64 },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The log sinks could not be installed.
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl From<toml::de::Error> for DdnsError {
    fn from(e: toml::de::Error) -> Self {
        DdnsError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for DdnsError {
    fn from(e: serde_json::Error) -> Self {
        DdnsError::Serialization(e.to_string())
    }
}
