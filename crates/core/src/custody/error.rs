//! Custody error types.
//!
//! Every `CustodyError` belongs to one of three caller-facing classes (see
//! [`ErrorKind`]); storage adapters report failures as [`StorageError`], which
//! the service logs and converts into the `Internal` class.

use thiserror::Error;

use custodian_shared::AppError;

/// Caller-facing error class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing input. Not retriable without fixing the input.
    InvalidArgument,
    /// Business-rule violation. Not retriable until state changes.
    FailedPrecondition,
    /// Storage or infrastructure failure. Safe to retry with backoff.
    Internal,
}

/// Errors returned by custody operations.
#[derive(Debug, Error)]
pub enum CustodyError {
    // ========== Validation Errors ==========
    /// A required field was empty.
    #[error("Field '{0}' is required")]
    MissingField(&'static str),

    /// Period is not in canonical `YYYY-MM` format.
    #[error("Invalid period format '{0}', expected YYYY-MM")]
    InvalidPeriod(String),

    /// Quantity must be strictly positive.
    #[error("Quantity must be greater than zero, got {0}")]
    NonPositiveQuantity(i64),

    /// Price cannot be negative.
    #[error("Price cannot be negative")]
    NegativePrice,

    /// Price does not fit the stored precision.
    #[error("Price {0} exceeds the supported range (below 10^15, at most 4 decimal places)")]
    PriceOutOfRange(String),

    /// Close filter named no period.
    #[error("At least one period is required")]
    EmptyPeriodFilter,

    // ========== State Errors ==========
    /// Period is closed, no accumulation allowed.
    #[error("Period {0} is closed")]
    PeriodClosed(String),

    // ========== Infrastructure Errors ==========
    /// Storage failure. The detail is logged, never returned.
    #[error("Internal error during {operation}")]
    Internal {
        /// Repository operation that failed.
        operation: &'static str,
    },
}

impl CustodyError {
    /// Returns the caller-facing class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField(_)
            | Self::InvalidPeriod(_)
            | Self::NonPositiveQuantity(_)
            | Self::NegativePrice
            | Self::PriceOutOfRange(_)
            | Self::EmptyPeriodFilter => ErrorKind::InvalidArgument,
            Self::PeriodClosed(_) => ErrorKind::FailedPrecondition,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "MISSING_FIELD",
            Self::InvalidPeriod(_) => "INVALID_PERIOD",
            Self::NonPositiveQuantity(_) => "NON_POSITIVE_QUANTITY",
            Self::NegativePrice => "NEGATIVE_PRICE",
            Self::PriceOutOfRange(_) => "PRICE_OUT_OF_RANGE",
            Self::EmptyPeriodFilter => "EMPTY_PERIOD_FILTER",
            Self::PeriodClosed(_) => "PERIOD_CLOSED",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidArgument => 400,
            ErrorKind::FailedPrecondition => 412,
            ErrorKind::Internal => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Internal)
    }
}

impl From<CustodyError> for AppError {
    fn from(err: CustodyError) -> Self {
        match err.kind() {
            ErrorKind::InvalidArgument => Self::InvalidArgument(err.to_string()),
            ErrorKind::FailedPrecondition => Self::FailedPrecondition(err.to_string()),
            ErrorKind::Internal => Self::Internal(err.to_string()),
        }
    }
}

/// Errors reported by a [`CustodyRepository`](super::CustodyRepository).
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store failed.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Accumulating would overflow the stored quantity.
    #[error("quantity overflow for {0}")]
    QuantityOverflow(String),

    /// A stored row could not be mapped to a domain value.
    #[error("invalid stored row: {0}")]
    InvalidRow(String),
}

impl StorageError {
    /// Create a backend error.
    #[must_use]
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}
