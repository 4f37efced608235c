//! Error types for the tapioca readers.

use std::path::{Path, PathBuf};

/// Errors that can occur while reading Mandyoc output or building datasets.
///
/// Marked `#[non_exhaustive]` so new failure modes can be added without
/// breaking downstream matches.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A file could not be opened or read.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Malformed text content.
    #[error("Parse error in {}:{line}: {message}", path.display())]
    Parse {
        /// File being parsed
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// File type other than `ascii` or `binary`.
    #[error("Invalid filetype '{0}'")]
    InvalidFiletype(String),

    /// Grid dimension other than 2 or 3.
    #[error("Invalid dimension: {0}")]
    InvalidDimension(usize),

    /// Max-coordinates line does not match the shape line.
    #[error("Dimension mismatch: shape has {expected} axes but {found} max coordinates were given")]
    DimensionMismatch {
        /// Number of axes in the shape line
        expected: usize,
        /// Number of max coordinates found
        found: usize,
    },

    /// A required parameter is absent from the parameters file.
    #[error("Missing parameter '{0}'")]
    MissingParameter(String),

    /// A parameter has an unusable value.
    #[error("Invalid parameter '{key}': {message}")]
    InvalidParameter {
        /// Parameter name
        key: String,
        /// What is wrong with it
        message: String,
    },

    /// A field file holds the wrong number of values for the grid.
    #[error("Shape mismatch in {}: expected {expected} values, found {found}", path.display())]
    ShapeMismatch {
        /// Field file
        path: PathBuf,
        /// Values required by the grid shape
        expected: usize,
        /// Values actually read
        found: usize,
    },

    /// Malformed binary file.
    #[error("Invalid binary file {}: {message}", path.display())]
    BinaryFormat {
        /// Binary file
        path: PathBuf,
        /// What is wrong with it
        message: String,
    },

    /// Particle files for a step were written by a different number of ranks.
    #[error("Invalid number of ranks '{found}' for step '{step}' (expected {expected})")]
    RankMismatch {
        /// Step being read
        step: i64,
        /// Rank count of the first step
        expected: usize,
        /// Rank count found for this step
        found: usize,
    },

    /// A particle id that is not part of the id coordinate.
    #[error("Unknown particle id {id} at step {step}")]
    UnknownParticle {
        /// Step being read
        step: i64,
        /// Offending id
        id: i64,
    },

    /// Unrecognised dataset name.
    #[error("Unknown dataset '{0}'")]
    UnknownDataset(String),

    /// Inconsistent dataset construction.
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Convenience `Result` type alias for tapioca operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wraps an I/O error with the path that caused it.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a parse error for a line of a text file.
    pub fn parse<S: Into<String>>(path: impl AsRef<Path>, line: usize, message: S) -> Self {
        Error::Parse {
            path: path.as_ref().to_path_buf(),
            line,
            message: message.into(),
        }
    }

    /// Creates a binary format error.
    pub fn binary<S: Into<String>>(path: impl AsRef<Path>, message: S) -> Self {
        Error::BinaryFormat {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Creates a dataset construction error.
    pub fn dataset<S: Into<String>>(message: S) -> Self {
        Error::Dataset(message.into())
    }

    /// Returns whether the error comes from a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}
