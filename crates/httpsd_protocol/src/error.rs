//! Error types for domain-level validation.

use thiserror::Error;

/// Domain validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SdError {
    /// A required reference or value is absent or blank where non-blank is
    /// mandated. Surfaced to HTTP callers as 400.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The discovery endpoint received a blank file name. Surfaced as 422.
    #[error("unprocessable input: {0}")]
    UnprocessableInput(String),
}

impl SdError {
    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an unprocessable input error.
    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::UnprocessableInput(msg.into())
    }
}
