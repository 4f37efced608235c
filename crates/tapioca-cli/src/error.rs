//! Error types for tapioca-cli

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for tapioca-cli operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tapioca-cli
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from the tapioca readers
    #[error("{0}")]
    Tapioca(#[from] tapioca::Error),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error on a configuration file
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
}

impl Error {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an I/O error with the path that caused it.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
