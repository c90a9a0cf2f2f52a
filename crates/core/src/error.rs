//! Error types for gcs-upload-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for gcs-upload-core
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for gcs-upload-core
#[derive(Error, Debug)]
pub enum Error {
    /// Plugin options failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidConfig(String),

    /// An include/exclude entry is not a valid regular expression
    #[error("Invalid pattern '{pattern}' in '{field}': {source}")]
    InvalidPattern {
        field: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Directory traversal failed
    #[error("Failed to enumerate {}: {source}", path.display())]
    Enumeration {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A single file upload failed
    #[error("Upload of {} to '{destination}' failed: {message}", path.display())]
    Upload {
        path: PathBuf,
        destination: String,
        message: String,
    },

    /// Storage service errors
    #[error("Storage operation failed: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] toml::de::Error),

    /// A spawned task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    /// Build a validation error that names the plugin, as every option error does.
    pub(crate) fn config(message: impl std::fmt::Display) -> Self {
        Error::Config(format!("{}: {}", crate::PLUGIN_NAME, message))
    }
}

// Generic SdkError conversion for all S3 operations
impl<E> From<aws_sdk_s3::error::SdkError<E>> for Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: aws_sdk_s3::error::SdkError<E>) -> Self {
        Error::Storage(aws_sdk_s3::error::DisplayErrorContext(&err).to_string())
    }
}
