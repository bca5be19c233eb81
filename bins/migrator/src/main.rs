//! Database migration runner for the custody schema.
//!
//! Reads `DATABASE_URL`. Usage:
//!   migrator up      - Apply the custody tables
//!   migrator down    - Drop them again
//!   migrator status  - Show which migrations ran
//!   migrator fresh   - Drop all tables and re-run migrations

use custodian_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // run_cli installs its own tracing subscriber
    cli::run_cli(Migrator).await;
}
