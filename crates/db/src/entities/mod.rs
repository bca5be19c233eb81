//! `SeaORM` entity definitions.

pub mod custodies;
pub mod custody_periods;
pub mod sea_orm_active_enums;
