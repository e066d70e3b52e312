//! Liquidation repository: transactional aggregate persistence.
//!
//! The aggregate (header + items + attachments) is written as one database
//! transaction. `update` and `record_decision` carry an optimistic version
//! check: the write is filtered on the version the caller read, and zero
//! affected rows surfaces as `Conflict`.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use tala_core::attachment::{Attachment, AttachmentBinding};
use tala_core::liquidation::{
    ApprovalLevel, ApprovalRecord, CashAdvance, DecisionAction, Liquidation, LiquidationError,
    LiquidationFilter, LiquidationItem, LiquidationStatus, LiquidationSummary,
};
use tala_core::liquidation::service::LiquidationRepository as LiquidationRepoTrait;
use tala_core::liquidation::Decision;
use tala_core::reconcile::ExpenseAmounts;
use tala_shared::types::{
    AttachmentId, CashAdvanceId, LiquidationId, LiquidationItemId, Money, PageRequest, StoreId,
    TicketId, UserId,
};

use crate::entities::{
    attachments, cash_advances, liquidation_items, liquidations,
    sea_orm_active_enums as db_enums,
};

use super::cash_advance;

/// Liquidation repository implementation.
#[derive(Debug, Clone)]
pub struct LiquidationRepository {
    db: DatabaseConnection,
}

impl LiquidationRepository {
    /// Creates a new liquidation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn repo_err(e: impl std::fmt::Display) -> LiquidationError {
        LiquidationError::repository(e.to_string())
    }

    /// Soft-delete a liquidation. The row stays for audit history.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no live row matches.
    pub async fn soft_delete(&self, id: LiquidationId) -> Result<(), LiquidationError> {
        let result = liquidations::Entity::update_many()
            .set(liquidations::ActiveModel {
                deleted_at: Set(Some(Utc::now().into())),
                ..Default::default()
            })
            .filter(liquidations::Column::Id.eq(id.into_inner()))
            .filter(liquidations::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(Self::repo_err)?;

        if result.rows_affected == 0 {
            return Err(LiquidationError::NotFound(id));
        }
        Ok(())
    }
}

impl LiquidationRepoTrait for LiquidationRepository {
    async fn find_cash_advance(
        &self,
        id: CashAdvanceId,
    ) -> Result<Option<CashAdvance>, LiquidationError> {
        let model = cash_advances::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(Self::repo_err)?;

        Ok(model.map(cash_advance::to_domain))
    }

    async fn cash_advance_liquidated(
        &self,
        id: CashAdvanceId,
    ) -> Result<bool, LiquidationError> {
        let count = liquidations::Entity::find()
            .filter(liquidations::Column::CashAdvanceId.eq(id.into_inner()))
            .filter(liquidations::Column::DeletedAt.is_null())
            .count(&self.db)
            .await
            .map_err(Self::repo_err)?;

        Ok(count > 0)
    }

    async fn insert(&self, liquidation: &Liquidation) -> Result<(), LiquidationError> {
        let txn = self.db.begin().await.map_err(Self::repo_err)?;

        header_active_model(liquidation)
            .insert(&txn)
            .await
            .map_err(Self::repo_err)?;

        for item in &liquidation.items {
            item_active_model(liquidation.id, item)
                .insert(&txn)
                .await
                .map_err(Self::repo_err)?;
        }

        // The advance is settled the moment a liquidation references it.
        cash_advances::Entity::update_many()
            .set(cash_advances::ActiveModel {
                status: Set(db_enums::CashAdvanceStatus::Liquidated),
                updated_at: Set(Utc::now().into()),
                ..Default::default()
            })
            .filter(cash_advances::Column::Id.eq(liquidation.cash_advance_id.into_inner()))
            .exec(&txn)
            .await
            .map_err(Self::repo_err)?;

        txn.commit().await.map_err(Self::repo_err)
    }

    async fn fetch(&self, id: LiquidationId) -> Result<Option<Liquidation>, LiquidationError> {
        let Some(header) = liquidations::Entity::find_by_id(id.into_inner())
            .filter(liquidations::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(Self::repo_err)?
        else {
            return Ok(None);
        };

        let items = liquidation_items::Entity::find()
            .filter(liquidation_items::Column::LiquidationId.eq(id.into_inner()))
            .order_by_asc(liquidation_items::Column::ExpenseDate)
            .order_by_asc(liquidation_items::Column::Id)
            .all(&self.db)
            .await
            .map_err(Self::repo_err)?;

        let attachments = attachments::Entity::find()
            .filter(attachments::Column::LiquidationId.eq(id.into_inner()))
            .order_by_asc(attachments::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(Self::repo_err)?;

        Ok(Some(to_domain(header, items, attachments)))
    }

    async fn update(
        &self,
        liquidation: &Liquidation,
        expected_version: i32,
        removed_attachments: &[AttachmentId],
    ) -> Result<(), LiquidationError> {
        let txn = self.db.begin().await.map_err(Self::repo_err)?;

        // Version-checked header write; zero rows means someone else won.
        let mut header = header_update_model(liquidation);
        header.version = Set(expected_version + 1);
        let result = liquidations::Entity::update_many()
            .set(header)
            .filter(liquidations::Column::Id.eq(liquidation.id.into_inner()))
            .filter(liquidations::Column::Version.eq(expected_version))
            .filter(liquidations::Column::DeletedAt.is_null())
            .exec(&txn)
            .await
            .map_err(Self::repo_err)?;

        if result.rows_affected == 0 {
            txn.rollback().await.map_err(Self::repo_err)?;
            return Err(self.version_miss(liquidation.id).await);
        }

        // Removed receipts go first so nothing points at doomed rows.
        if !removed_attachments.is_empty() {
            let ids: Vec<Uuid> = removed_attachments.iter().map(|a| a.into_inner()).collect();
            attachments::Entity::delete_many()
                .filter(attachments::Column::Id.is_in(ids))
                .exec(&txn)
                .await
                .map_err(Self::repo_err)?;
        }

        // Insert the replacement item set before re-binding receipts to it,
        // then drop the superseded lines.
        let new_item_ids: Vec<Uuid> = liquidation.items.iter().map(|i| i.id.into_inner()).collect();
        for item in &liquidation.items {
            item_active_model(liquidation.id, item)
                .insert(&txn)
                .await
                .map_err(Self::repo_err)?;
        }

        for attachment in &liquidation.attachments {
            let item_id = attachment.binding.item_id().map(LiquidationItemId::into_inner);
            let updated = attachments::Entity::update_many()
                .set(attachments::ActiveModel {
                    liquidation_item_id: Set(item_id),
                    ..Default::default()
                })
                .filter(attachments::Column::Id.eq(attachment.id.into_inner()))
                .exec(&txn)
                .await
                .map_err(Self::repo_err)?;

            if updated.rows_affected == 0 {
                attachment_active_model(liquidation.id, attachment)
                    .insert(&txn)
                    .await
                    .map_err(Self::repo_err)?;
            }
        }

        liquidation_items::Entity::delete_many()
            .filter(liquidation_items::Column::LiquidationId.eq(liquidation.id.into_inner()))
            .filter(liquidation_items::Column::Id.is_not_in(new_item_ids))
            .exec(&txn)
            .await
            .map_err(Self::repo_err)?;

        txn.commit().await.map_err(Self::repo_err)
    }

    async fn record_decision(
        &self,
        id: LiquidationId,
        expected_version: i32,
        decision: &Decision,
    ) -> Result<(), LiquidationError> {
        let mut model = liquidations::ActiveModel {
            status: Set(status_to_db(decision.new_status)),
            version: Set(expected_version + 1),
            updated_at: Set(decision.record.decided_at.into()),
            ..Default::default()
        };

        match decision.level {
            ApprovalLevel::One => {
                model.level1_approved_by = Set(Some(decision.record.decided_by.into_inner()));
                model.level1_approved_at = Set(Some(decision.record.decided_at.into()));
                model.level1_comment = Set(decision.record.comment.clone());
            }
            ApprovalLevel::Two => {
                model.level2_approved_by = Set(Some(decision.record.decided_by.into_inner()));
                model.level2_approved_at = Set(Some(decision.record.decided_at.into()));
                model.level2_comment = Set(decision.record.comment.clone());
            }
        }

        let result = liquidations::Entity::update_many()
            .set(model)
            .filter(liquidations::Column::Id.eq(id.into_inner()))
            .filter(liquidations::Column::Version.eq(expected_version))
            .filter(liquidations::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(Self::repo_err)?;

        if result.rows_affected == 0 {
            return Err(self.version_miss(id).await);
        }
        Ok(())
    }

    async fn list(
        &self,
        filter: &LiquidationFilter,
        page: &PageRequest,
    ) -> Result<(Vec<LiquidationSummary>, u64), LiquidationError> {
        let mut query = liquidations::Entity::find()
            .filter(liquidations::Column::DeletedAt.is_null());

        if let Some(status) = filter.status {
            query = query.filter(liquidations::Column::Status.eq(status_to_db(status)));
        }
        if let Some(store_id) = filter.store_id {
            query = query.filter(liquidations::Column::StoreId.eq(store_id.into_inner()));
        }
        if let Some(employee_id) = filter.employee_id {
            query =
                query.filter(liquidations::Column::EmployeeId.eq(employee_id.into_inner()));
        }

        let total = query
            .clone()
            .count(&self.db)
            .await
            .map_err(Self::repo_err)?;

        let models = query
            .order_by_desc(liquidations::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(Self::repo_err)?;

        Ok((models.into_iter().map(to_summary).collect(), total))
    }
}

impl LiquidationRepository {
    /// A version-filtered write touched nothing: either the row is gone or
    /// another writer advanced it.
    async fn version_miss(&self, id: LiquidationId) -> LiquidationError {
        let exists = liquidations::Entity::find_by_id(id.into_inner())
            .filter(liquidations::Column::DeletedAt.is_null())
            .count(&self.db)
            .await
            .map(|count| count > 0)
            .unwrap_or(false);

        if exists {
            LiquidationError::Conflict
        } else {
            LiquidationError::NotFound(id)
        }
    }
}

fn header_active_model(liquidation: &Liquidation) -> liquidations::ActiveModel {
    liquidations::ActiveModel {
        id: Set(liquidation.id.into_inner()),
        cash_advance_id: Set(liquidation.cash_advance_id.into_inner()),
        employee_id: Set(liquidation.employee_id.into_inner()),
        store_id: Set(liquidation.store_id.into_inner()),
        ticket_id: Set(liquidation.ticket_id.map(TicketId::into_inner)),
        liquidation_date: Set(liquidation.liquidation_date),
        remarks: Set(liquidation.remarks.clone()),
        status: Set(status_to_db(liquidation.status)),
        advance_amount: Set(liquidation.advance_amount.amount()),
        total_amount: Set(liquidation.total_amount.amount()),
        return_to_company: Set(liquidation.return_to_company.amount()),
        reimbursement: Set(liquidation.reimbursement.amount()),
        level1_approved_by: Set(None),
        level1_approved_at: Set(None),
        level1_comment: Set(None),
        level2_approved_by: Set(None),
        level2_approved_at: Set(None),
        level2_comment: Set(None),
        version: Set(liquidation.version),
        deleted_at: Set(None),
        created_at: Set(liquidation.created_at.into()),
        updated_at: Set(liquidation.updated_at.into()),
    }
}

/// Header fields an edit may change. Approval audit columns are only ever
/// written by `record_decision`.
fn header_update_model(liquidation: &Liquidation) -> liquidations::ActiveModel {
    liquidations::ActiveModel {
        liquidation_date: Set(liquidation.liquidation_date),
        remarks: Set(liquidation.remarks.clone()),
        total_amount: Set(liquidation.total_amount.amount()),
        return_to_company: Set(liquidation.return_to_company.amount()),
        reimbursement: Set(liquidation.reimbursement.amount()),
        updated_at: Set(liquidation.updated_at.into()),
        ..Default::default()
    }
}

fn item_active_model(
    liquidation_id: LiquidationId,
    item: &LiquidationItem,
) -> liquidation_items::ActiveModel {
    liquidation_items::ActiveModel {
        id: Set(item.id.into_inner()),
        liquidation_id: Set(liquidation_id.into_inner()),
        expense_date: Set(item.expense_date),
        from_destination: Set(item.from_destination.clone()),
        to_destination: Set(item.to_destination.clone()),
        jeep: Set(item.amounts.jeep.amount()),
        bus: Set(item.amounts.bus.amount()),
        fx_van: Set(item.amounts.fx_van.amount()),
        gas: Set(item.amounts.gas.amount()),
        toll: Set(item.amounts.toll.amount()),
        meals: Set(item.amounts.meals.amount()),
        lodging: Set(item.amounts.lodging.amount()),
        others: Set(item.amounts.others.amount()),
        remarks: Set(item.remarks.clone()),
        created_at: Set(Utc::now().into()),
    }
}

fn attachment_active_model(
    liquidation_id: LiquidationId,
    attachment: &Attachment,
) -> attachments::ActiveModel {
    attachments::ActiveModel {
        id: Set(attachment.id.into_inner()),
        liquidation_id: Set(liquidation_id.into_inner()),
        liquidation_item_id: Set(attachment
            .binding
            .item_id()
            .map(LiquidationItemId::into_inner)),
        file_name: Set(attachment.file_name.clone()),
        file_type: Set(attachment.file_type.clone()),
        file_size: Set(attachment.file_size),
        storage_provider: Set(provider_to_db(&attachment.storage_provider)),
        storage_bucket: Set(attachment.storage_bucket.clone()),
        storage_key: Set(attachment.storage_key.clone()),
        uploaded_by: Set(attachment.uploaded_by.into_inner()),
        created_at: Set(attachment.created_at.into()),
    }
}

fn to_domain(
    header: liquidations::Model,
    items: Vec<liquidation_items::Model>,
    attachments: Vec<attachments::Model>,
) -> Liquidation {
    let status = status_to_core(&header.status);
    let level1 = approval_record(
        header.level1_approved_by,
        header.level1_approved_at,
        header.level1_comment.clone(),
        // a rejected report with no level-2 audit was rejected at level 1
        if status == LiquidationStatus::Rejected && header.level2_approved_by.is_none() {
            DecisionAction::Reject
        } else {
            DecisionAction::Approve
        },
    );
    let level2 = approval_record(
        header.level2_approved_by,
        header.level2_approved_at,
        header.level2_comment.clone(),
        if status == LiquidationStatus::Rejected {
            DecisionAction::Reject
        } else {
            DecisionAction::Approve
        },
    );

    Liquidation {
        id: LiquidationId::from_uuid(header.id),
        cash_advance_id: CashAdvanceId::from_uuid(header.cash_advance_id),
        employee_id: UserId::from_uuid(header.employee_id),
        store_id: StoreId::from_uuid(header.store_id),
        ticket_id: header.ticket_id.map(TicketId::from_uuid),
        liquidation_date: header.liquidation_date,
        remarks: header.remarks,
        status,
        advance_amount: Money::new(header.advance_amount),
        total_amount: Money::new(header.total_amount),
        return_to_company: Money::new(header.return_to_company),
        reimbursement: Money::new(header.reimbursement),
        level1,
        level2,
        items: items.into_iter().map(item_to_domain).collect(),
        attachments: attachments.into_iter().map(attachment_to_domain).collect(),
        version: header.version,
        created_at: header.created_at.into(),
        updated_at: header.updated_at.into(),
    }
}

fn approval_record(
    decided_by: Option<Uuid>,
    decided_at: Option<chrono::DateTime<chrono::FixedOffset>>,
    comment: Option<String>,
    action: DecisionAction,
) -> Option<ApprovalRecord> {
    match (decided_by, decided_at) {
        (Some(by), Some(at)) => Some(ApprovalRecord {
            decided_by: UserId::from_uuid(by),
            decided_at: at.into(),
            action,
            comment,
        }),
        _ => None,
    }
}

fn item_to_domain(model: liquidation_items::Model) -> LiquidationItem {
    LiquidationItem {
        id: LiquidationItemId::from_uuid(model.id),
        expense_date: model.expense_date,
        from_destination: model.from_destination,
        to_destination: model.to_destination,
        amounts: ExpenseAmounts {
            jeep: Money::new(model.jeep),
            bus: Money::new(model.bus),
            fx_van: Money::new(model.fx_van),
            gas: Money::new(model.gas),
            toll: Money::new(model.toll),
            meals: Money::new(model.meals),
            lodging: Money::new(model.lodging),
            others: Money::new(model.others),
        },
        remarks: model.remarks,
    }
}

pub(crate) fn attachment_to_domain(model: attachments::Model) -> Attachment {
    let binding = match model.liquidation_item_id {
        Some(item_id) => AttachmentBinding::ItemLevel {
            item_id: LiquidationItemId::from_uuid(item_id),
        },
        None => AttachmentBinding::General {
            liquidation_id: LiquidationId::from_uuid(model.liquidation_id),
        },
    };

    Attachment {
        id: AttachmentId::from_uuid(model.id),
        binding,
        file_name: model.file_name,
        file_type: model.file_type,
        file_size: model.file_size,
        storage_provider: provider_to_core(&model.storage_provider),
        storage_bucket: model.storage_bucket,
        storage_key: model.storage_key,
        uploaded_by: UserId::from_uuid(model.uploaded_by),
        created_at: model.created_at.into(),
    }
}

fn to_summary(model: liquidations::Model) -> LiquidationSummary {
    LiquidationSummary {
        id: LiquidationId::from_uuid(model.id),
        cash_advance_id: CashAdvanceId::from_uuid(model.cash_advance_id),
        employee_id: UserId::from_uuid(model.employee_id),
        store_id: StoreId::from_uuid(model.store_id),
        liquidation_date: model.liquidation_date,
        status: status_to_core(&model.status),
        total_amount: Money::new(model.total_amount),
        return_to_company: Money::new(model.return_to_company),
        reimbursement: Money::new(model.reimbursement),
        created_at: model.created_at.into(),
    }
}

pub(crate) fn status_to_db(status: LiquidationStatus) -> db_enums::LiquidationStatus {
    match status {
        LiquidationStatus::Pending => db_enums::LiquidationStatus::Pending,
        LiquidationStatus::Level1Approved => db_enums::LiquidationStatus::Level1Approved,
        LiquidationStatus::Approved => db_enums::LiquidationStatus::Approved,
        LiquidationStatus::Rejected => db_enums::LiquidationStatus::Rejected,
    }
}

pub(crate) fn status_to_core(status: &db_enums::LiquidationStatus) -> LiquidationStatus {
    match status {
        db_enums::LiquidationStatus::Pending => LiquidationStatus::Pending,
        db_enums::LiquidationStatus::Level1Approved => LiquidationStatus::Level1Approved,
        db_enums::LiquidationStatus::Approved => LiquidationStatus::Approved,
        db_enums::LiquidationStatus::Rejected => LiquidationStatus::Rejected,
    }
}

pub(crate) fn provider_to_db(provider: &str) -> db_enums::StorageProvider {
    match provider {
        "s3" => db_enums::StorageProvider::S3,
        "azure_blob" => db_enums::StorageProvider::AzureBlob,
        _ => db_enums::StorageProvider::Local,
    }
}

pub(crate) fn provider_to_core(provider: &db_enums::StorageProvider) -> String {
    match provider {
        db_enums::StorageProvider::S3 => "s3".to_string(),
        db_enums::StorageProvider::AzureBlob => "azure_blob".to_string(),
        db_enums::StorageProvider::Local => "local".to_string(),
    }
}
