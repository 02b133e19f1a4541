//! Error Taxonomy - One User-Facing Kind
//!
//! `Error::Validation` covers every expected failure: malformed input,
//! policy violations, missing artifacts, structural mismatches. The
//! remaining variants surface unexpected breakage so callers can tell
//! "your input was invalid" from "something broke".

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a user-facing validation error from a message.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// True for expected, user-facing failures (CLI maps these to exit 2).
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
