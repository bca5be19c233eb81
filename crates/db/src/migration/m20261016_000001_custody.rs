//! Custody schema migration.
//!
//! Creates the period state table and the custody holdings table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(CUSTODY_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS custodies CASCADE; DROP TABLE IF EXISTS custody_periods CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const CUSTODY_SQL: &str = r"
-- Period state. A period without a row is open.
CREATE TABLE custody_periods (
    period VARCHAR(7) PRIMARY KEY,
    status VARCHAR(16) NOT NULL DEFAULT 'open',
    closed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_custody_period_format CHECK (period ~ '^\d{4}-(0[1-9]|1[0-2])$'),
    CONSTRAINT chk_custody_period_status CHECK (status IN ('open', 'closed')),
    CONSTRAINT chk_custody_period_closed_at CHECK ((status = 'closed') = (closed_at IS NOT NULL))
);

-- Holdings, one row per (period, stock, client_id)
CREATE TABLE custodies (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    period VARCHAR(7) NOT NULL REFERENCES custody_periods(period),
    stock TEXT NOT NULL,
    client_id TEXT NOT NULL,
    market TEXT,
    price NUMERIC(19, 4),
    quantity BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_custodies_key UNIQUE (period, stock, client_id),
    CONSTRAINT chk_custodies_stock CHECK (length(trim(stock)) > 0),
    CONSTRAINT chk_custodies_client CHECK (length(trim(client_id)) > 0),
    CONSTRAINT chk_custodies_price CHECK (price IS NULL OR price >= 0),
    CONSTRAINT chk_custodies_quantity CHECK (quantity >= 0)
);

-- Queries by client across periods
CREATE INDEX idx_custodies_client ON custodies(client_id, period);

-- Queries by stock across periods
CREATE INDEX idx_custodies_stock ON custodies(stock, period);
";
