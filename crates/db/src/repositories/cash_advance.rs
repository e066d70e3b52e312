//! Cash advance repository.
//!
//! Cash advances are read-only to the liquidation core; this repository
//! serves lookups and listings.

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use tala_core::liquidation::{CashAdvance, CashAdvanceStatus, CashAdvanceType, LiquidationError};
use tala_shared::types::{CashAdvanceId, Money, PageRequest, UserId};

use crate::entities::{cash_advances, sea_orm_active_enums as db_enums};

/// Cash advance repository implementation.
#[derive(Debug, Clone)]
pub struct CashAdvanceRepository {
    db: DatabaseConnection,
}

impl CashAdvanceRepository {
    /// Creates a new cash advance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Find a cash advance by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_id(
        &self,
        id: CashAdvanceId,
    ) -> Result<Option<CashAdvance>, LiquidationError> {
        let model = cash_advances::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(|e| LiquidationError::repository(e.to_string()))?;

        Ok(model.map(to_domain))
    }

    /// List cash advances, optionally restricted to one employee.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(
        &self,
        employee_id: Option<UserId>,
        page: &PageRequest,
    ) -> Result<(Vec<CashAdvance>, u64), LiquidationError> {
        let mut query = cash_advances::Entity::find();
        if let Some(employee_id) = employee_id {
            query = query.filter(cash_advances::Column::EmployeeId.eq(employee_id.into_inner()));
        }

        let total = query
            .clone()
            .count(&self.db)
            .await
            .map_err(|e| LiquidationError::repository(e.to_string()))?;

        let models = query
            .order_by_desc(cash_advances::Column::AdvanceDate)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(|e| LiquidationError::repository(e.to_string()))?;

        Ok((models.into_iter().map(to_domain).collect(), total))
    }
}

/// Convert a database row to the domain cash advance.
pub(crate) fn to_domain(model: cash_advances::Model) -> CashAdvance {
    CashAdvance {
        id: CashAdvanceId::from_uuid(model.id),
        employee_id: UserId::from_uuid(model.employee_id),
        amount: Money::new(model.amount),
        status: status_to_core(&model.status),
        advance_type: type_to_core(&model.advance_type),
        purpose: model.purpose,
        advance_date: model.advance_date,
    }
}

/// Convert database cash advance status to the domain enum.
pub(crate) fn status_to_core(status: &db_enums::CashAdvanceStatus) -> CashAdvanceStatus {
    match status {
        db_enums::CashAdvanceStatus::Pending => CashAdvanceStatus::Pending,
        db_enums::CashAdvanceStatus::Approved => CashAdvanceStatus::Approved,
        db_enums::CashAdvanceStatus::Rejected => CashAdvanceStatus::Rejected,
        db_enums::CashAdvanceStatus::Liquidated => CashAdvanceStatus::Liquidated,
    }
}

/// Convert database cash advance type to the domain enum.
pub(crate) fn type_to_core(advance_type: &db_enums::CashAdvanceType) -> CashAdvanceType {
    match advance_type {
        db_enums::CashAdvanceType::Support => CashAdvanceType::Support,
        db_enums::CashAdvanceType::Reimbursement => CashAdvanceType::Reimbursement,
        db_enums::CashAdvanceType::Payroll => CashAdvanceType::Payroll,
    }
}
