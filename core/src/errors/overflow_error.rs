//! Bounded-capacity backpressure errors.

use super::error_code::{self, TsdbErrorCode};

#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone, Copy)]
pub enum OverflowError {
    #[error("ingest queue is full (bound exceeded)")]
    QueueFull,

    #[error("accumulator buffer is full (bound exceeded)")]
    AccumulatorFull,
}

impl TsdbErrorCode for OverflowError {
    fn error_code(&self) -> &'static str {
        error_code::OVERFLOW_ERROR
    }
}
