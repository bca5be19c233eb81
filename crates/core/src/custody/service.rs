//! Custody service: accumulation, queries and period closing.

use std::fmt::Display;
use std::sync::Arc;

use chrono::Utc;
use tracing::{Instrument, Span, error, info, info_span, warn};

use custodian_shared::types::{PageRequest, PageResponse};

use super::error::{CustodyError, StorageError};
use super::period::Period;
use super::repository::CustodyRepository;
use super::types::{
    AddCustodyInput, ClosePeriodFilter, ClosePeriodOutcome, CustodyFilter, CustodyRecord,
    PeriodState, UpsertOutcome,
};
use super::validation::{validate_add, validate_close_filter};

/// Custody service.
///
/// Holds no per-request state and is shared behind an `Arc`. Log output goes
/// to the span handed in at construction, so callers decide where it lands.
#[derive(Clone)]
pub struct CustodyService {
    repo: Arc<dyn CustodyRepository>,
    span: Span,
}

impl CustodyService {
    /// Create a new custody service logging under a `custody_service` span.
    #[must_use]
    pub fn new(repo: Arc<dyn CustodyRepository>) -> Self {
        Self {
            repo,
            span: info_span!("custody_service"),
        }
    }

    /// Replaces the parent span of every operation.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Adds `quantity` to the holding identified by `(period, stock, client_id)`.
    ///
    /// Creates the record on first add. Validation runs before any storage
    /// access; the closed-period check and the increment happen in one atomic
    /// repository call.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` class if the input is malformed
    /// - `CustodyError::PeriodClosed` if the period is closed
    /// - `CustodyError::Internal` if storage fails
    pub async fn add_custody_stock(
        &self,
        input: AddCustodyInput,
    ) -> Result<CustodyRecord, CustodyError> {
        let span = info_span!(
            parent: &self.span,
            "add_custody_stock",
            period = %input.period,
            stock = %input.stock,
            client_id = %input.client_id,
            quantity = input.quantity,
        );

        async move {
            let validated = validate_add(&input).inspect_err(|e| {
                warn!(error = %e, "Rejected custody add");
            })?;

            let outcome = self
                .repo
                .upsert_increment(&validated.key, validated.quantity, &validated.attributes)
                .await
                .map_err(|e| storage_failure("upsert_increment", &validated.key, &e))?;

            match outcome {
                UpsertOutcome::Applied(record) => {
                    info!(total = record.quantity, "Custody stock added");
                    Ok(record)
                }
                UpsertOutcome::PeriodClosed => {
                    warn!("Rejected custody add for closed period");
                    Err(CustodyError::PeriodClosed(validated.key.period.to_string()))
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Closes every period named by `filter`.
    ///
    /// Idempotent: periods already closed are reported in
    /// `already_closed` with their original close time.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` class if the filter is empty or malformed
    /// - `CustodyError::Internal` if storage fails
    pub async fn close_period(
        &self,
        filter: ClosePeriodFilter,
    ) -> Result<ClosePeriodOutcome, CustodyError> {
        let span = info_span!(parent: &self.span, "close_period", periods = ?filter.periods);

        async move {
            let periods = validate_close_filter(&filter).inspect_err(|e| {
                warn!(error = %e, "Rejected period close");
            })?;

            let outcome = self
                .repo
                .close_periods(&periods, Utc::now())
                .await
                .map_err(|e| storage_failure("close_periods", PeriodList(&periods), &e))?;

            for state in &outcome.closed {
                info!(period = %state.period, closed_at = ?state.closed_at, "Period closed");
            }
            if !outcome.already_closed.is_empty() {
                info!(
                    count = outcome.already_closed.len(),
                    "Periods were already closed"
                );
            }

            Ok(outcome)
        }
        .instrument(span)
        .await
    }

    /// Returns all records matching `filter`, ordered by `(period, stock, client_id)`.
    ///
    /// Blank filter fields are wildcards. A filter naming all three fields is
    /// served by a key lookup.
    ///
    /// # Errors
    ///
    /// Returns `CustodyError::Internal` if storage fails. No match is an empty list.
    pub async fn get_custody(
        &self,
        filter: &CustodyFilter,
    ) -> Result<Vec<CustodyRecord>, CustodyError> {
        let filter = filter.normalized();
        let span = info_span!(parent: &self.span, "get_custody", filter = %FilterDisplay(&filter));

        async move {
            let records = if let Some(key) = filter.as_key() {
                self.repo
                    .find_one(&key)
                    .await
                    .map_err(|e| storage_failure("find_one", &key, &e))?
                    .into_iter()
                    .collect()
            } else {
                self.repo
                    .find_many(&filter)
                    .await
                    .map_err(|e| storage_failure("find_many", FilterDisplay(&filter), &e))?
            };

            info!(count = records.len(), "Custody query served");
            Ok(records)
        }
        .instrument(span)
        .await
    }

    /// Returns one page of records matching `filter`.
    ///
    /// The page and its total are read from one snapshot.
    ///
    /// # Errors
    ///
    /// Returns `CustodyError::Internal` if storage fails.
    pub async fn get_custody_page(
        &self,
        filter: &CustodyFilter,
        page: PageRequest,
    ) -> Result<PageResponse<CustodyRecord>, CustodyError> {
        let filter = filter.normalized();
        let span = info_span!(
            parent: &self.span,
            "get_custody_page",
            filter = %FilterDisplay(&filter),
            page = page.page,
            per_page = page.per_page,
        );

        async move {
            let response = self
                .repo
                .find_page(&filter, page)
                .await
                .map_err(|e| storage_failure("find_page", FilterDisplay(&filter), &e))?;

            info!(
                count = response.data.len(),
                total = response.meta.total,
                "Custody page served"
            );
            Ok(response)
        }
        .instrument(span)
        .await
    }

    /// Returns the state of a period. A period never closed is open.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` class if the period is malformed
    /// - `CustodyError::Internal` if storage fails
    pub async fn period_status(&self, period: &str) -> Result<PeriodState, CustodyError> {
        let span = info_span!(parent: &self.span, "period_status", period = %period);

        async move {
            let period = Period::parse(period)?;
            self.repo
                .get_period_status(&period)
                .await
                .map_err(|e| storage_failure("get_period_status", &period, &e))
        }
        .instrument(span)
        .await
    }
}

/// Logs a storage failure with its operation and key, returning the opaque error.
fn storage_failure(operation: &'static str, key: impl Display, err: &StorageError) -> CustodyError {
    error!(operation, key = %key, error = %err, "Custody storage operation failed");
    CustodyError::Internal { operation }
}

struct PeriodList<'a>(&'a [Period]);

impl Display for PeriodList<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, period) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{period}")?;
        }
        Ok(())
    }
}

struct FilterDisplay<'a>(&'a CustodyFilter);

impl Display for FilterDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let field = |v: &Option<String>| v.clone().unwrap_or_else(|| "*".to_string());
        write!(
            f,
            "{}/{}/{}",
            field(&self.0.period),
            field(&self.0.stock),
            field(&self.0.client_id)
        )
    }
}
