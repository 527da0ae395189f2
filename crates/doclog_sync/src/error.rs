//! Error types for file sync.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that abort a sync pass.
///
/// Per-file problems do not surface here; they are collected in the
/// [`SyncReport`](crate::SyncReport).
#[derive(Error, Debug)]
pub enum SyncError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Store error while planning.
    #[error("store error: {0}")]
    Core(#[from] doclog_core::CoreError),

    /// JSON encoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Directory walk failed.
    #[error("directory scan failed: {0}")]
    Walk(#[from] walkdir::Error),

    /// The sync root is not a directory.
    #[error("not a directory: {}", path.display())]
    NotADirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// A background sync task did not complete.
    #[error("sync task failed: {message}")]
    TaskFailed {
        /// Error message.
        message: String,
    },
}

impl SyncError {
    /// Creates a task failure.
    pub fn task_failed(message: impl Into<String>) -> Self {
        Self::TaskFailed {
            message: message.into(),
        }
    }
}
