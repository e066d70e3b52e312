//! Attachment repository for receipt metadata.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use tala_core::attachment::{
    Attachment, AttachmentBinding, AttachmentError, AttachmentRepository as AttachmentRepoTrait,
    NewAttachmentRecord,
};
use tala_shared::types::{AttachmentId, LiquidationId, LiquidationItemId};

use crate::entities::{attachments, liquidation_items, liquidations};

use super::liquidation::{attachment_to_domain, provider_to_db};

/// Attachment repository implementation.
#[derive(Debug, Clone)]
pub struct AttachmentRepository {
    db: DatabaseConnection,
}

impl AttachmentRepository {
    /// Creates a new attachment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn repo_err(e: impl std::fmt::Display) -> AttachmentError {
        AttachmentError::repository(e.to_string())
    }

    /// Resolve the owning liquidation of a binding.
    ///
    /// Item-level bindings are scoped through their expense line's row.
    async fn owning_liquidation(
        &self,
        binding: &AttachmentBinding,
    ) -> Result<LiquidationId, AttachmentError> {
        match binding {
            AttachmentBinding::General { liquidation_id } => Ok(*liquidation_id),
            AttachmentBinding::ItemLevel { item_id } => {
                let item = liquidation_items::Entity::find_by_id(item_id.into_inner())
                    .one(&self.db)
                    .await
                    .map_err(Self::repo_err)?
                    .ok_or(AttachmentError::InvalidBinding { item_id: *item_id })?;
                Ok(LiquidationId::from_uuid(item.liquidation_id))
            }
        }
    }
}

impl AttachmentRepoTrait for AttachmentRepository {
    async fn create(&self, record: NewAttachmentRecord) -> Result<Attachment, AttachmentError> {
        let liquidation_id = self.owning_liquidation(&record.binding).await?;

        let model = attachments::ActiveModel {
            id: Set(record.id.into_inner()),
            liquidation_id: Set(liquidation_id.into_inner()),
            liquidation_item_id: Set(record
                .binding
                .item_id()
                .map(LiquidationItemId::into_inner)),
            file_name: Set(record.file_name),
            file_type: Set(record.file_type),
            file_size: Set(record.file_size),
            storage_provider: Set(provider_to_db(&record.storage_provider)),
            storage_bucket: Set(record.storage_bucket),
            storage_key: Set(record.storage_key),
            uploaded_by: Set(record.uploaded_by.into_inner()),
            created_at: Set(chrono::Utc::now().into()),
        };

        let inserted = model.insert(&self.db).await.map_err(Self::repo_err)?;
        Ok(attachment_to_domain(inserted))
    }

    async fn find_by_id(
        &self,
        id: AttachmentId,
    ) -> Result<Option<Attachment>, AttachmentError> {
        let model = attachments::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(Self::repo_err)?;

        Ok(model.map(attachment_to_domain))
    }

    async fn list_by_liquidation(
        &self,
        liquidation_id: LiquidationId,
    ) -> Result<Vec<Attachment>, AttachmentError> {
        let models = attachments::Entity::find()
            .filter(attachments::Column::LiquidationId.eq(liquidation_id.into_inner()))
            .order_by_asc(attachments::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(Self::repo_err)?;

        Ok(models.into_iter().map(attachment_to_domain).collect())
    }

    async fn delete(&self, id: AttachmentId) -> Result<bool, AttachmentError> {
        let result = attachments::Entity::delete_many()
            .filter(attachments::Column::Id.eq(id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(Self::repo_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn liquidation_exists(
        &self,
        liquidation_id: LiquidationId,
    ) -> Result<bool, AttachmentError> {
        let count = liquidations::Entity::find_by_id(liquidation_id.into_inner())
            .filter(liquidations::Column::DeletedAt.is_null())
            .count(&self.db)
            .await
            .map_err(Self::repo_err)?;

        Ok(count > 0)
    }

    async fn item_ids(
        &self,
        liquidation_id: LiquidationId,
    ) -> Result<Vec<LiquidationItemId>, AttachmentError> {
        let models = liquidation_items::Entity::find()
            .filter(liquidation_items::Column::LiquidationId.eq(liquidation_id.into_inner()))
            .all(&self.db)
            .await
            .map_err(Self::repo_err)?;

        Ok(models
            .into_iter()
            .map(|m| LiquidationItemId::from_uuid(m.id))
            .collect())
    }
}
