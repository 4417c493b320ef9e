// ==========================================
// Mission Match Engine - Importer Error Types
// ==========================================

use thiserror::Error;

/// Errors that abort an import run. Row-level problems do not land
/// here; they are collected into the ImportReport instead.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("unsupported file format: {0} (only .csv)")]
    UnsupportedFormat(String),

    #[error("file read failed: {0}")]
    FileReadError(String),

    #[error("csv parse failed: {0}")]
    CsvParseError(String),

    #[error("required column missing: {0}")]
    MissingColumn(String),

    #[error("database error: {0}")]
    DatabaseError(String),
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

impl From<crate::repository::RepositoryError> for ImportError {
    fn from(err: crate::repository::RepositoryError) -> Self {
        ImportError::DatabaseError(err.to_string())
    }
}
