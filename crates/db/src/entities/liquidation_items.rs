//! `SeaORM` Entity for the liquidation_items table.
//!
//! Line totals are not stored; they are recomputed from the eight category
//! columns on every read.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "liquidation_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub liquidation_id: Uuid,
    pub expense_date: Date,
    pub from_destination: String,
    pub to_destination: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub jeep: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub bus: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub fx_van: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub gas: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub toll: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub meals: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub lodging: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub others: Decimal,
    pub remarks: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::liquidations::Entity",
        from = "Column::LiquidationId",
        to = "super::liquidations::Column::Id"
    )]
    Liquidations,
    #[sea_orm(has_many = "super::attachments::Entity")]
    Attachments,
}

impl Related<super::liquidations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Liquidations.def()
    }
}

impl Related<super::attachments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
