//! `SeaORM` entity definitions.

pub mod attachments;
pub mod cash_advances;
pub mod liquidation_items;
pub mod liquidations;
pub mod sea_orm_active_enums;
pub mod sessions;
pub mod stores;
pub mod users;
