//! Error types for the placer module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during subtitle placement.
#[derive(Debug, Error)]
pub enum PlacerError {
    /// The media file's directory is not there (wrong mapping or unmounted).
    #[error("Target directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Media path has no usable file name.
    #[error("Invalid media path: {path}")]
    InvalidMediaPath { path: PathBuf },

    /// Failed to write the staged file.
    #[error("Failed to write {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to move the staged file into place.
    #[error("Failed to move file from {source} to {destination}")]
    MoveFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Permission denied.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlacerError {
    /// Creates a write failed error, singling out permission problems.
    pub fn write_failed(path: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            Self::PermissionDenied { path }
        } else {
            Self::WriteFailed { path, source }
        }
    }

    /// Creates a move failed error.
    pub fn move_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        Self::MoveFailed {
            source,
            destination,
            error,
        }
    }
}
