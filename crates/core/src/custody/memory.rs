//! In-memory custody repository.
//!
//! Both tables sit behind one async mutex, so every operation is a single
//! critical section and increments and closes are serialized.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use custodian_shared::types::{PageRequest, PageResponse};

use super::error::StorageError;
use super::period::Period;
use super::repository::CustodyRepository;
use super::types::{
    ClosePeriodOutcome, CustodyAttributes, CustodyFilter, CustodyKey, CustodyRecord, PeriodState,
    UpsertOutcome,
};

#[derive(Debug, Default)]
struct Tables {
    records: BTreeMap<CustodyKey, CustodyRecord>,
    periods: BTreeMap<Period, PeriodState>,
}

/// Custody repository held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryCustodyRepository {
    tables: Mutex<Tables>,
}

impl InMemoryCustodyRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.tables.lock().await.records.len()
    }

    /// Returns true if no record is stored.
    pub async fn is_empty(&self) -> bool {
        self.tables.lock().await.records.is_empty()
    }
}

#[async_trait]
impl CustodyRepository for InMemoryCustodyRepository {
    async fn find_one(&self, key: &CustodyKey) -> Result<Option<CustodyRecord>, StorageError> {
        Ok(self.tables.lock().await.records.get(key).cloned())
    }

    async fn upsert_increment(
        &self,
        key: &CustodyKey,
        delta: i64,
        attributes: &CustodyAttributes,
    ) -> Result<UpsertOutcome, StorageError> {
        let mut guard = self.tables.lock().await;
        let tables = &mut *guard;

        if tables
            .periods
            .get(&key.period)
            .is_some_and(PeriodState::is_closed)
        {
            return Ok(UpsertOutcome::PeriodClosed);
        }

        let now = Utc::now();
        let record = match tables.records.get_mut(key) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(delta)
                    .ok_or_else(|| StorageError::QuantityOverflow(key.to_string()))?;
                if let Some(market) = &attributes.market {
                    existing.market = Some(market.clone());
                }
                if let Some(price) = attributes.price {
                    existing.price = Some(price);
                }
                existing.updated_at = now;
                existing.clone()
            }
            None => {
                let record = CustodyRecord {
                    period: key.period.to_string(),
                    stock: key.stock.clone(),
                    client_id: key.client_id.clone(),
                    market: attributes.market.clone(),
                    price: attributes.price,
                    quantity: delta,
                    created_at: now,
                    updated_at: now,
                };
                tables.records.insert(key.clone(), record.clone());
                record
            }
        };

        Ok(UpsertOutcome::Applied(record))
    }

    async fn find_many(&self, filter: &CustodyFilter) -> Result<Vec<CustodyRecord>, StorageError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .records
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn find_page(
        &self,
        filter: &CustodyFilter,
        page: PageRequest,
    ) -> Result<PageResponse<CustodyRecord>, StorageError> {
        let tables = self.tables.lock().await;
        let matching: Vec<&CustodyRecord> =
            tables.records.values().filter(|r| filter.matches(r)).collect();

        let data = matching
            .iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit()).unwrap_or(usize::MAX))
            .map(|r| (*r).clone())
            .collect();

        Ok(PageResponse::new(
            data,
            page.page,
            page.per_page,
            matching.len() as u64,
        ))
    }

    async fn get_period_status(&self, period: &Period) -> Result<PeriodState, StorageError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .periods
            .get(period)
            .cloned()
            .unwrap_or_else(|| PeriodState::open(period)))
    }

    async fn close_periods(
        &self,
        periods: &[Period],
        closed_at: DateTime<Utc>,
    ) -> Result<ClosePeriodOutcome, StorageError> {
        let mut tables = self.tables.lock().await;
        let mut outcome = ClosePeriodOutcome::default();

        for period in periods {
            let existing = tables
                .periods
                .get(period)
                .filter(|s| s.is_closed())
                .cloned();

            if let Some(state) = existing {
                outcome.already_closed.push(state);
            } else {
                let state = PeriodState::closed(period, closed_at);
                tables.periods.insert(period.clone(), state.clone());
                outcome.closed.push(state);
            }
        }

        Ok(outcome)
    }
}
