//! Error types for torlist.

use thiserror::Error;

/// Error type for torlist operations.
///
/// None of these ever reach [`crate::TorChecker::is_tor`]; lookups have no
/// error path.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON metadata error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport-level download failure
    #[error("download error: {0}")]
    Download(String),

    /// Remote source answered with a non-success status
    #[error("HTTP error {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// Unknown fetch mode name
    #[error("invalid fetch mode: {0}")]
    InvalidMode(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for torlist operations.
pub type Result<T> = std::result::Result<T, Error>;
