//! Query API input-validation errors.

use super::error_code::{self, TsdbErrorCode};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ArgumentError {
    #[error("'{given}' is not a period in the ladder")]
    InvalidPeriod { given: String },

    #[error("'{given}' is not a member of the stat set")]
    InvalidStat { given: String },

    #[error("interval start {start} is after end {end}")]
    InvertedInterval { start: f64, end: f64 },
}

impl TsdbErrorCode for ArgumentError {
    fn error_code(&self) -> &'static str {
        error_code::ARGUMENT_ERROR
    }
}
