//! Error types for storage operations

use std::path::PathBuf;
use thiserror::Error;

use crate::backup::create::BackupError;
use crate::backup::restore::RestoreError;
use crate::storage::db::DatabaseError;

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in a storage backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// A required field was missing or empty; nothing was written
    #[error("Validation error: {0}")]
    Validation(String),

    /// SQLite backend error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// CSV backend error
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing a backup archive failed
    #[error("Export failed: {0}")]
    Export(#[from] BackupError),

    /// Reading or restoring a backup archive failed
    #[error("Import failed: {0}")]
    Import(#[from] RestoreError),

    /// Home directory not found
    #[error("Home directory not found")]
    HomeNotFound,
}

impl StoreError {
    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(DatabaseError::Sqlite(err))
    }
}
