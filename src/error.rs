//! Error types for the capture and export pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message reported when the export target cannot be resolved
pub const TARGET_NOT_FOUND_MESSAGE: &str = "Content container not found";

/// Message reported when a failure carries no message of its own
pub const GENERIC_FAILURE_MESSAGE: &str = "Capture engine failure";

/// Errors that can occur while capturing or exporting a document
#[derive(Error, Debug)]
pub enum Error {
    /// The export target id did not resolve to a mounted node
    #[error("Content container not found")]
    TargetNotFound,

    /// The raster stage produced no usable image
    #[error("{0}")]
    CaptureFailure(String),

    /// Building the output document failed after a valid capture
    #[error("{0}")]
    AssemblyFailure(String),

    /// A capture or decode stage exceeded its deadline
    #[error("Capture timed out after {0}ms")]
    CaptureTimeout(u64),

    /// Another export is still running on the same exporter
    #[error("An export is already in progress")]
    ExportInProgress,

    /// Failed to load a page source
    #[error("Failed to load page: {0}")]
    LoadError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Filesystem error while saving or reading
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::CaptureFailure(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}
