//! Stable error-code strings for log correlation: one trait, one
//! `&'static str` per variant.

pub trait TsdbErrorCode {
    fn error_code(&self) -> &'static str;
}

pub const DB_BUSY: &str = "DB_BUSY";
pub const DISK_FULL: &str = "DISK_FULL";
pub const SCHEMA_ERROR: &str = "SCHEMA_ERROR";
pub const QUANTILE_GROUP_CHANGED: &str = "QUANTILE_GROUP_CHANGED";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";

pub const PARSE_ERROR: &str = "PARSE_ERROR";
pub const ARGUMENT_ERROR: &str = "ARGUMENT_ERROR";
pub const OVERFLOW_ERROR: &str = "OVERFLOW_ERROR";
pub const FATAL_ERROR: &str = "FATAL_ERROR";
pub const LOCK_ERROR: &str = "LOCK_ERROR";
