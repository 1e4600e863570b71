//! Line Parser errors.

use super::error_code::{self, TsdbErrorCode};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParseError {
    #[error("line has {found} whitespace-separated tokens, expected 3: {line:?}")]
    WrongTokenCount { found: usize, line: String },

    #[error("non-finite or unparseable value {field} in line: {line:?}")]
    BadNumber { field: &'static str, line: String },

    #[error("empty line")]
    EmptyLine,

    #[error("payload is not valid UTF-8")]
    NotUtf8,
}

impl TsdbErrorCode for ParseError {
    fn error_code(&self) -> &'static str {
        error_code::PARSE_ERROR
    }
}
