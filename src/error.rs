//! Unified error types for the slideshow application.

use std::path::PathBuf;
use thiserror::Error;

/// Folder-level scan failures.
///
/// Per-entry problems never show up here; they are logged and skipped
/// while walking.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("folder not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    #[error("no images found in {}", .0.display())]
    EmptyResult(PathBuf),
    #[error("scan cancelled")]
    Cancelled,
}

impl ScanError {
    /// `EmptyResult` is a warning-level outcome, not an I/O failure.
    pub fn is_soft(&self) -> bool {
        matches!(self, ScanError::EmptyResult(_) | ScanError::Cancelled)
    }
}

/// Application-specific errors.
#[derive(Debug, Error)]
pub enum AppError {
    /// A folder or file does not exist (anymore)
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),
    /// A folder or file cannot be read
    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    /// Image bytes could not be decoded
    #[error("failed to decode {}: {message}", path.display())]
    DecodeFailure { path: PathBuf, message: String },
    /// A settings key that does not exist or a value it cannot hold
    #[error("invalid setting {key}: {message}")]
    InvalidSetting { key: String, message: String },
    /// Settings/history/stats read-write failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("file watcher error: {0}")]
    Watch(String),
}

impl AppError {
    /// Maps an I/O error on `path` onto the taxonomy used for user notices.
    pub fn from_io(path: &std::path::Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => AppError::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => AppError::PermissionDenied(path.to_path_buf()),
            _ => AppError::Io(err),
        }
    }
}

/// Type alias for Results in this application.
pub type Result<T> = std::result::Result<T, AppError>;
