//! Central error types for stillcap.
//!
//! Construction failures surface here as typed errors; per-frame failures
//! are logged and counted by the pipeline instead of being bubbled to the
//! render thread.

use thiserror::Error;

/// Main error type for capture operations.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// OS app-data root could not be resolved
    #[error("App data directory is unavailable")]
    DataDirUnavailable,

    /// Configuration rejected at construction
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Storage operation failed
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Image encoding failed
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Encode worker thread could not be spawned
    #[error("Worker spawn failed: {0}")]
    WorkerSpawn(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<image::ImageError> for CaptureError {
    fn from(err: image::ImageError) -> Self {
        CaptureError::Encoding(err.to_string())
    }
}

impl From<String> for CaptureError {
    fn from(msg: String) -> Self {
        CaptureError::Other(msg)
    }
}

impl From<&str> for CaptureError {
    fn from(msg: &str) -> Self {
        CaptureError::Other(msg.to_string())
    }
}

/// Extension trait for adding context to Results.
///
/// Allows chaining context information onto errors for better debugging.
pub trait ResultExt<T> {
    /// Add context to an error, converting it to CaptureError::Other.
    fn context(self, msg: &str) -> CaptureResult<T>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F: FnOnce() -> String>(self, f: F) -> CaptureResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn context(self, msg: &str) -> CaptureResult<T> {
        self.map_err(|e| CaptureError::Other(format!("{}: {}", msg, e)))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> CaptureResult<T> {
        self.map_err(|e| CaptureError::Other(format!("{}: {}", f(), e)))
    }
}

/// Type alias for Results using CaptureError.
pub type CaptureResult<T> = Result<T, CaptureError>;
