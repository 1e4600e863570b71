//! Storage-layer errors for SQLite operations.

use super::error_code::{self, TsdbErrorCode};

/// Errors that can occur in the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("schema bootstrap failed: {message}")]
    SchemaError { message: String },

    #[error("database busy (another operation in progress)")]
    DbBusy,

    #[error("disk full")]
    DiskFull,

    #[error("quantile aggregate called with a changing q within one group")]
    QuantileGroupChanged,

    #[error("operation not supported: {operation} — {reason}")]
    NotSupported { operation: String, reason: String },
}

impl TsdbErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DbBusy => error_code::DB_BUSY,
            Self::DiskFull => error_code::DISK_FULL,
            Self::SchemaError { .. } => error_code::SCHEMA_ERROR,
            Self::QuantileGroupChanged => error_code::QUANTILE_GROUP_CHANGED,
            _ => error_code::STORAGE_ERROR,
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::SqliteError {
            message: e.to_string(),
        }
    }
}
