//! `SeaORM` Entity for the attachments table.
//!
//! `liquidation_id` always scopes the receipt to its report;
//! `liquidation_item_id` is set only for item-level bindings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::StorageProvider;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "attachments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub liquidation_id: Uuid,
    pub liquidation_item_id: Option<Uuid>,
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub storage_provider: StorageProvider,
    pub storage_bucket: String,
    pub storage_key: String,
    pub uploaded_by: Uuid,
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
    #[sea_orm(
        belongs_to = "super::liquidation_items::Entity",
        from = "Column::LiquidationItemId",
        to = "super::liquidation_items::Column::Id"
    )]
    LiquidationItems,
}

impl Related<super::liquidations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Liquidations.def()
    }
}

impl Related<super::liquidation_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LiquidationItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
