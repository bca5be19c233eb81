//! Persistence port for custody records and period state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use custodian_shared::types::{PageRequest, PageResponse};

use super::error::StorageError;
use super::period::Period;
use super::types::{
    ClosePeriodOutcome, CustodyAttributes, CustodyFilter, CustodyKey, CustodyRecord, PeriodState,
    UpsertOutcome,
};

/// Repository trait for custody persistence.
///
/// Implemented by the db crate for Postgres and by
/// [`InMemoryCustodyRepository`](super::InMemoryCustodyRepository).
///
/// `upsert_increment` and `close_periods` must be atomic with respect to each
/// other: once a close is visible, no increment for that period may succeed.
#[async_trait]
pub trait CustodyRepository: Send + Sync {
    /// Finds the record with the given key.
    async fn find_one(&self, key: &CustodyKey) -> Result<Option<CustodyRecord>, StorageError>;

    /// Atomically creates the record with `delta` or adds `delta` to it.
    ///
    /// Returns `UpsertOutcome::PeriodClosed` without writing if the period is closed.
    async fn upsert_increment(
        &self,
        key: &CustodyKey,
        delta: i64,
        attributes: &CustodyAttributes,
    ) -> Result<UpsertOutcome, StorageError>;

    /// Lists matching records ordered by `(period, stock, client_id)`.
    async fn find_many(&self, filter: &CustodyFilter) -> Result<Vec<CustodyRecord>, StorageError>;

    /// Returns one page of matching records with the total match count.
    ///
    /// The page and the total come from the same snapshot.
    async fn find_page(
        &self,
        filter: &CustodyFilter,
        page: PageRequest,
    ) -> Result<PageResponse<CustodyRecord>, StorageError>;

    /// Returns the state of a period; unknown periods are open.
    async fn get_period_status(&self, period: &Period) -> Result<PeriodState, StorageError>;

    /// Closes every listed period that is still open, stamping `closed_at`.
    async fn close_periods(
        &self,
        periods: &[Period],
        closed_at: DateTime<Utc>,
    ) -> Result<ClosePeriodOutcome, StorageError>;
}
