//! Database enum mappings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User role in the back office.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
pub enum UserRole {
    /// Files own advances and liquidations.
    #[sea_orm(string_value = "employee")]
    Employee,
    /// First-stage reviewer.
    #[sea_orm(string_value = "supervisor")]
    Supervisor,
    /// Second-stage reviewer.
    #[sea_orm(string_value = "manager")]
    Manager,
    /// Full access.
    #[sea_orm(string_value = "admin")]
    Admin,
}

/// Cash advance status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "cash_advance_status")]
pub enum CashAdvanceStatus {
    /// Awaiting approval.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Approved, eligible for liquidation.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Rejected.
    #[sea_orm(string_value = "rejected")]
    Rejected,
    /// A liquidation has been filed against it.
    #[sea_orm(string_value = "liquidated")]
    Liquidated,
}

/// Cash advance classification.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "cash_advance_type")]
pub enum CashAdvanceType {
    /// Operational support advance.
    #[sea_orm(string_value = "support")]
    Support,
    /// Reimbursable expense advance.
    #[sea_orm(string_value = "reimbursement")]
    Reimbursement,
    /// Payroll advance; settled through payroll.
    #[sea_orm(string_value = "payroll")]
    Payroll,
}

/// Liquidation workflow status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "liquidation_status")]
pub enum LiquidationStatus {
    /// Filed, awaiting level-1 review.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Passed level-1 review.
    #[sea_orm(string_value = "level1_approved")]
    Level1Approved,
    /// Fully approved (terminal).
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Rejected at either level (terminal).
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Object storage provider.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "storage_provider")]
pub enum StorageProvider {
    /// S3-compatible object storage.
    #[sea_orm(string_value = "s3")]
    S3,
    /// Azure Blob Storage.
    #[sea_orm(string_value = "azure_blob")]
    AzureBlob,
    /// Local filesystem (development).
    #[sea_orm(string_value = "local")]
    Local,
}
