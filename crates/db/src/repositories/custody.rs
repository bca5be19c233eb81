//! Custody repository backed by Postgres.
//!
//! Accumulation uses `INSERT ... ON CONFLICT DO UPDATE` so the increment is a
//! single statement. The period row is read `FOR SHARE` in the same
//! transaction, and closing takes it `FOR UPDATE`, so a close waits for
//! in-flight adds and every add after a close sees the closed status.
//!
//! A paged read runs its count and its select in one read-only
//! `REPEATABLE READ` transaction so the total matches the rows returned.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    AccessMode, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend,
    DbErr, EntityTrait, IsolationLevel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    QueryTrait, RuntimeErr, Select, Set, Statement, TransactionTrait, sqlx,
};

use custodian_core::custody::{
    ClosePeriodOutcome, CustodyAttributes, CustodyFilter, CustodyKey, CustodyRecord,
    CustodyRepository, Period, PeriodState, StorageError, UpsertOutcome,
};
use custodian_shared::types::{PageRequest, PageResponse};

use crate::entities::{custodies, custody_periods, sea_orm_active_enums::CustodyPeriodStatus};

const ENSURE_PERIOD_SQL: &str = r"
INSERT INTO custody_periods (period, status)
VALUES ($1, 'open')
ON CONFLICT (period) DO NOTHING
";

const UPSERT_CUSTODY_SQL: &str = r"
INSERT INTO custodies (period, stock, client_id, market, price, quantity)
VALUES ($1, $2, $3, $4, $5, $6)
ON CONFLICT (period, stock, client_id) DO UPDATE SET
    quantity = custodies.quantity + EXCLUDED.quantity,
    market = COALESCE(EXCLUDED.market, custodies.market),
    price = COALESCE(EXCLUDED.price, custodies.price),
    updated_at = now()
RETURNING id, period, stock, client_id, market, price, quantity, created_at, updated_at
";

/// Postgres SQLSTATE `numeric_value_out_of_range`.
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

/// Custody repository for database operations.
#[derive(Debug, Clone)]
pub struct PgCustodyRepository {
    db: DatabaseConnection,
}

impl PgCustodyRepository {
    /// Creates a new custody repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn ensure_period<C: ConnectionTrait>(conn: &C, period: &Period) -> Result<(), DbErr> {
        conn.execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            ENSURE_PERIOD_SQL,
            [period.as_str().into()],
        ))
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CustodyRepository for PgCustodyRepository {
    async fn find_one(&self, key: &CustodyKey) -> Result<Option<CustodyRecord>, StorageError> {
        custodies::Entity::find()
            .filter(custodies::Column::Period.eq(key.period.as_str()))
            .filter(custodies::Column::Stock.eq(key.stock.as_str()))
            .filter(custodies::Column::ClientId.eq(key.client_id.as_str()))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(to_record)
            .transpose()
    }

    async fn upsert_increment(
        &self,
        key: &CustodyKey,
        delta: i64,
        attributes: &CustodyAttributes,
    ) -> Result<UpsertOutcome, StorageError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        Self::ensure_period(&txn, &key.period)
            .await
            .map_err(db_err)?;

        let state = custody_periods::Entity::find_by_id(key.period.as_str().to_owned())
            .lock_shared()
            .one(&txn)
            .await
            .map_err(db_err)?;

        if state.is_some_and(|s| s.status == CustodyPeriodStatus::Closed) {
            txn.rollback().await.map_err(db_err)?;
            return Ok(UpsertOutcome::PeriodClosed);
        }

        let row = custodies::Entity::find()
            .from_raw_sql(Statement::from_sql_and_values(
                DbBackend::Postgres,
                UPSERT_CUSTODY_SQL,
                [
                    key.period.as_str().into(),
                    key.stock.as_str().into(),
                    key.client_id.as_str().into(),
                    attributes.market.clone().into(),
                    attributes.price.into(),
                    delta.into(),
                ],
            ))
            .one(&txn)
            .await
            .map_err(|e| {
                if is_out_of_range(&e) {
                    StorageError::QuantityOverflow(key.to_string())
                } else {
                    db_err(e)
                }
            })?
            .ok_or_else(|| StorageError::InvalidRow(format!("upsert returned no row for {key}")))?;

        txn.commit().await.map_err(db_err)?;

        Ok(UpsertOutcome::Applied(to_record(row)?))
    }

    async fn find_many(&self, filter: &CustodyFilter) -> Result<Vec<CustodyRecord>, StorageError> {
        ordered(filter)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(to_record)
            .collect()
    }

    async fn find_page(
        &self,
        filter: &CustodyFilter,
        page: PageRequest,
    ) -> Result<PageResponse<CustodyRecord>, StorageError> {
        let txn = self
            .db
            .begin_with_config(
                Some(IsolationLevel::RepeatableRead),
                Some(AccessMode::ReadOnly),
            )
            .await
            .map_err(db_err)?;

        let total = filtered(filter).count(&txn).await.map_err(db_err)?;
        let rows = ordered(filter)
            .offset(page.offset())
            .limit(page.limit())
            .all(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        let data = rows
            .into_iter()
            .map(to_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    async fn get_period_status(&self, period: &Period) -> Result<PeriodState, StorageError> {
        let row = custody_periods::Entity::find_by_id(period.as_str().to_owned())
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(row.map_or_else(|| PeriodState::open(period), to_state))
    }

    async fn close_periods(
        &self,
        periods: &[Period],
        closed_at: DateTime<Utc>,
    ) -> Result<ClosePeriodOutcome, StorageError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let mut outcome = ClosePeriodOutcome::default();

        // Periods arrive sorted, so concurrent closes lock rows in the same order.
        for period in periods {
            Self::ensure_period(&txn, period).await.map_err(db_err)?;

            let row = custody_periods::Entity::find_by_id(period.as_str().to_owned())
                .lock_exclusive()
                .one(&txn)
                .await
                .map_err(db_err)?
                .ok_or_else(|| StorageError::InvalidRow(format!("period {period} vanished")))?;

            if row.status == CustodyPeriodStatus::Closed {
                outcome.already_closed.push(to_state(row));
                continue;
            }

            let mut active: custody_periods::ActiveModel = row.into();
            active.status = Set(CustodyPeriodStatus::Closed);
            active.closed_at = Set(Some(closed_at.into()));
            active.updated_at = Set(Utc::now().into());

            let updated = active.update(&txn).await.map_err(db_err)?;
            outcome.closed.push(to_state(updated));
        }

        txn.commit().await.map_err(db_err)?;
        Ok(outcome)
    }
}

fn filtered(filter: &CustodyFilter) -> Select<custodies::Entity> {
    custodies::Entity::find()
        .apply_if(filter.period.clone(), |q, v| {
            q.filter(custodies::Column::Period.eq(v))
        })
        .apply_if(filter.stock.clone(), |q, v| {
            q.filter(custodies::Column::Stock.eq(v))
        })
        .apply_if(filter.client_id.clone(), |q, v| {
            q.filter(custodies::Column::ClientId.eq(v))
        })
}

fn ordered(filter: &CustodyFilter) -> Select<custodies::Entity> {
    filtered(filter)
        .order_by_asc(custodies::Column::Period)
        .order_by_asc(custodies::Column::Stock)
        .order_by_asc(custodies::Column::ClientId)
}

fn to_record(model: custodies::Model) -> Result<CustodyRecord, StorageError> {
    if model.quantity < 0 {
        return Err(StorageError::InvalidRow(format!(
            "negative quantity {} for {}/{}/{}",
            model.quantity, model.period, model.stock, model.client_id
        )));
    }

    Ok(CustodyRecord {
        period: model.period,
        stock: model.stock,
        client_id: model.client_id,
        market: model.market,
        price: model.price,
        quantity: model.quantity,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn to_state(model: custody_periods::Model) -> PeriodState {
    PeriodState {
        period: model.period,
        status: model.status.into(),
        closed_at: model.closed_at.map(|at| at.with_timezone(&Utc)),
    }
}

fn is_out_of_range(err: &DbErr) -> bool {
    match err {
        DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(e)))
        | DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(e))) => {
            e.code().as_deref() == Some(NUMERIC_VALUE_OUT_OF_RANGE)
        }
        _ => false,
    }
}

#[allow(clippy::needless_pass_by_value)]
fn db_err(err: DbErr) -> StorageError {
    StorageError::backend(err.to_string())
}
