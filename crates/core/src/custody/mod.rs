//! Custodial stock holdings per (period, stock, client).
//!
//! This module implements:
//! - Canonical `YYYY-MM` periods
//! - Input validation
//! - The repository port and an in-memory adapter
//! - The custody service: accumulate, query, close periods

mod error;
mod memory;
mod period;
mod repository;
mod service;
mod types;
mod validation;

#[cfg(test)]
mod service_props;

pub use error::{CustodyError, ErrorKind, StorageError};
pub use memory::InMemoryCustodyRepository;
pub use period::Period;
pub use repository::CustodyRepository;
pub use service::CustodyService;
pub use types::{
    AddCustodyInput, ClosePeriodFilter, ClosePeriodOutcome, CustodyAttributes, CustodyFilter,
    CustodyKey, CustodyRecord, PeriodState, PeriodStatus, UpsertOutcome,
};
pub use validation::{ValidatedAdd, validate_add, validate_close_filter};
