//! `SeaORM` active enums.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use custodian_core::custody::PeriodStatus;

/// Stored status of a custody period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum CustodyPeriodStatus {
    /// Accepts accumulation.
    #[sea_orm(string_value = "open")]
    Open,
    /// Closed for accumulation.
    #[sea_orm(string_value = "closed")]
    Closed,
}

impl From<CustodyPeriodStatus> for PeriodStatus {
    fn from(status: CustodyPeriodStatus) -> Self {
        match status {
            CustodyPeriodStatus::Open => Self::Open,
            CustodyPeriodStatus::Closed => Self::Closed,
        }
    }
}
