/// Structured error types for expensectl-core.
///
/// Binaries (expensectl-cli) wrap these in `anyhow`; library callers get
/// the CSV report intact.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::csv::CsvError;

/// Main error type for expensectl-core file operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// I/O operation failed
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// CSV text could not be imported
    #[error(transparent)]
    Csv(#[from] CsvError),

    /// File or directory not found
    #[error("Path not found: {path:?}")]
    PathNotFound { path: PathBuf },
}

/// Result type alias for expensectl-core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Create a path-not-found error
    pub fn path_not_found(path: impl Into<PathBuf>) -> Self {
        Self::PathNotFound { path: path.into() }
    }
}
