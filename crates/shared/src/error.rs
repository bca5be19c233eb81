//! Application-wide error types.

use thiserror::Error;

/// Application error types.
///
/// The variants follow the RPC error classes exposed to callers: malformed
/// input, business-rule violations, and infrastructure failures.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing caller input.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Business rule violation that depends on current state.
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidArgument(_) => 400,
            Self::FailedPrecondition(_) => 412,
            Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::FailedPrecondition(_) => "FAILED_PRECONDITION",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the caller may retry the same request with backoff.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Internal(_))
    }

    /// Returns the message that is safe to show to a caller.
    ///
    /// Infrastructure errors never expose their inner detail.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidArgument(msg) | Self::FailedPrecondition(msg) => msg.clone(),
            Self::Internal(_) => "An internal error occurred".to_string(),
        }
    }
}
