//! `SeaORM` Entity for the liquidations table.
//!
//! `cash_advance_id` is unique: one cash advance reconciles to at most one
//! liquidation. `version` backs the optimistic concurrency check on edits
//! and decisions. Rows are soft-deleted via `deleted_at`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::LiquidationStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "liquidations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub cash_advance_id: Uuid,
    pub employee_id: Uuid,
    pub store_id: Uuid,
    pub ticket_id: Option<Uuid>,
    pub liquidation_date: Date,
    pub remarks: Option<String>,
    pub status: LiquidationStatus,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub advance_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub return_to_company: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub reimbursement: Decimal,
    pub level1_approved_by: Option<Uuid>,
    pub level1_approved_at: Option<DateTimeWithTimeZone>,
    pub level1_comment: Option<String>,
    pub level2_approved_by: Option<Uuid>,
    pub level2_approved_at: Option<DateTimeWithTimeZone>,
    pub level2_comment: Option<String>,
    pub version: i32,
    pub deleted_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cash_advances::Entity",
        from = "Column::CashAdvanceId",
        to = "super::cash_advances::Column::Id"
    )]
    CashAdvances,
    #[sea_orm(
        belongs_to = "super::stores::Entity",
        from = "Column::StoreId",
        to = "super::stores::Column::Id"
    )]
    Stores,
    #[sea_orm(has_many = "super::liquidation_items::Entity")]
    LiquidationItems,
    #[sea_orm(has_many = "super::attachments::Entity")]
    Attachments,
}

impl Related<super::cash_advances::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashAdvances.def()
    }
}

impl Related<super::stores::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stores.def()
    }
}

impl Related<super::liquidation_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LiquidationItems.def()
    }
}

impl Related<super::attachments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
