//! Unrecoverable initialization failures: the process exits non-zero
//! immediately rather than attempting recovery.

use super::error_code::{self, TsdbErrorCode};
use super::storage_error::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    #[error("cannot bind {transport} listener on {addr}: {source}")]
    BindFailed {
        transport: &'static str,
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot open database at {path}: {source}")]
    DatabaseOpenFailed {
        path: String,
        #[source]
        source: StorageError,
    },

    #[error("configuration could not be loaded: {message}")]
    ConfigError { message: String },
}

impl TsdbErrorCode for FatalError {
    fn error_code(&self) -> &'static str {
        error_code::FATAL_ERROR
    }
}
