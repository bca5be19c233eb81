//! `SeaORM` Entity for custodies table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "custodies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub period: String,
    pub stock: String,
    pub client_id: String,
    pub market: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub price: Option<Decimal>,
    pub quantity: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::custody_periods::Entity",
        from = "Column::Period",
        to = "super::custody_periods::Column::Period"
    )]
    CustodyPeriods,
}

impl Related<super::custody_periods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustodyPeriods.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
