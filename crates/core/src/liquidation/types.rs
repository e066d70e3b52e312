//! Liquidation domain types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use tala_shared::types::{
    CashAdvanceId, LiquidationId, LiquidationItemId, Money, StoreId, TicketId, UserId,
};

use crate::attachment::{Attachment, ReconcilePlan};
use crate::reconcile::ExpenseAmounts;

/// Liquidation status in the two-level approval workflow.
///
/// The valid transitions are:
/// - Pending → Level1Approved (level-1 approve)
/// - Pending → Rejected (level-1 reject)
/// - Level1Approved → Approved (level-2 approve)
/// - Level1Approved → Rejected (level-2 reject)
///
/// `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidationStatus {
    /// Filed and awaiting level-1 review; the only editable state.
    Pending,
    /// Passed level-1 review, awaiting level-2.
    Level1Approved,
    /// Fully approved (terminal, immutable).
    Approved,
    /// Rejected at either level (terminal, immutable).
    Rejected,
}

impl LiquidationStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Level1Approved => "level1_approved",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "level1_approved" => Some(Self::Level1Approved),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if the liquidation can still be edited.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns true for terminal states.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for LiquidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The two review stages of the approval gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalLevel {
    /// First-stage review (supervisor).
    One,
    /// Second-stage review (manager); only reachable after level 1.
    Two,
}

impl ApprovalLevel {
    /// Parses a level from its wire number.
    #[must_use]
    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            _ => None,
        }
    }

    /// The wire number of the level.
    #[must_use]
    pub const fn number(&self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

impl fmt::Display for ApprovalLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level {}", self.number())
    }
}

/// Reviewer verdict on a liquidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionAction {
    /// Advance to the next state.
    Approve,
    /// Terminate the liquidation.
    Reject,
}

impl DecisionAction {
    /// Returns the string representation of the action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }

    /// Parses an action from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "approve" => Some(Self::Approve),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }
}

impl fmt::Display for DecisionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Audit record of one level's decision (who, when, what, why).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    /// The reviewer.
    pub decided_by: UserId,
    /// When the decision was made.
    pub decided_at: DateTime<Utc>,
    /// Approve or reject.
    pub action: DecisionAction,
    /// Reviewer comment (required for rejections).
    pub comment: Option<String>,
}

/// Capabilities the permission collaborator is queried for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// May decide at level 1.
    ApproveLiquidationsLevel1,
    /// May decide at level 2.
    ApproveLiquidationsLevel2,
    /// May file/edit liquidations on behalf of others.
    ManageLiquidation,
}

impl Capability {
    /// The capability's wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ApproveLiquidationsLevel1 => "approve_liquidations_level1",
            Self::ApproveLiquidationsLevel2 => "approve_liquidations_level2",
            Self::ManageLiquidation => "manage_liquidation",
        }
    }

    /// The capability required to decide at a level.
    #[must_use]
    pub const fn for_level(level: ApprovalLevel) -> Self {
        match level {
            ApprovalLevel::One => Self::ApproveLiquidationsLevel1,
            ApprovalLevel::Two => Self::ApproveLiquidationsLevel2,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cash advance status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashAdvanceStatus {
    /// Awaiting approval; cannot be liquidated yet.
    Pending,
    /// Approved and available for liquidation.
    Approved,
    /// Rejected; cannot be liquidated.
    Rejected,
    /// A liquidation has been filed against it.
    Liquidated,
}

impl CashAdvanceStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Liquidated => "liquidated",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "liquidated" => Some(Self::Liquidated),
            _ => None,
        }
    }
}

impl fmt::Display for CashAdvanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cash advance classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashAdvanceType {
    /// Operational support advance; liquidatable.
    Support,
    /// Reimbursable expense advance; liquidatable.
    Reimbursement,
    /// Payroll advance; settled through payroll, never liquidated.
    Payroll,
}

impl CashAdvanceType {
    /// Returns the string representation of the type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Support => "support",
            Self::Reimbursement => "reimbursement",
            Self::Payroll => "payroll",
        }
    }

    /// Parses a type from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "support" => Some(Self::Support),
            "reimbursement" => Some(Self::Reimbursement),
            "payroll" => Some(Self::Payroll),
            _ => None,
        }
    }

    /// Returns true for types that are settled via liquidation.
    #[must_use]
    pub const fn is_liquidatable(&self) -> bool {
        matches!(self, Self::Support | Self::Reimbursement)
    }
}

impl fmt::Display for CashAdvanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A cash advance, read-only to this core.
///
/// Owned by the requesting employee and immutable once a liquidation
/// references it.
#[derive(Debug, Clone)]
pub struct CashAdvance {
    /// Unique identifier.
    pub id: CashAdvanceId,
    /// The employee the advance was issued to.
    pub employee_id: UserId,
    /// Advance amount.
    pub amount: Money,
    /// Status; must be `approved` to liquidate.
    pub status: CashAdvanceStatus,
    /// Classification; must be a liquidatable type.
    pub advance_type: CashAdvanceType,
    /// What the advance was issued for.
    pub purpose: String,
    /// When the advance was issued.
    pub advance_date: NaiveDate,
}

impl CashAdvance {
    /// Returns true if a liquidation may be filed against this advance.
    #[must_use]
    pub const fn is_liquidatable(&self) -> bool {
        matches!(self.status, CashAdvanceStatus::Approved) && self.advance_type.is_liquidatable()
    }
}

/// One expense line of a liquidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidationItem {
    /// Unique identifier; fresh on every item-set replacement.
    pub id: LiquidationItemId,
    /// When the expense was incurred.
    pub expense_date: NaiveDate,
    /// Trip origin.
    pub from_destination: String,
    /// Trip destination.
    pub to_destination: String,
    /// The eight category amounts.
    pub amounts: ExpenseAmounts,
    /// Free-form remarks.
    pub remarks: Option<String>,
}

impl LiquidationItem {
    /// The line's total across all categories.
    #[must_use]
    pub fn total(&self) -> Money {
        self.amounts.total()
    }
}

/// An expense line as submitted by the client.
#[derive(Debug, Clone)]
pub struct ItemDraft {
    /// When the expense was incurred.
    pub expense_date: NaiveDate,
    /// Trip origin.
    pub from_destination: String,
    /// Trip destination.
    pub to_destination: String,
    /// The eight category amounts.
    pub amounts: ExpenseAmounts,
    /// Free-form remarks.
    pub remarks: Option<String>,
}

/// The liquidation aggregate: header, expense lines, receipts, and
/// approval state, loaded and persisted as one unit.
#[derive(Debug, Clone)]
pub struct Liquidation {
    /// Unique identifier.
    pub id: LiquidationId,
    /// The cash advance being reconciled (1:1).
    pub cash_advance_id: CashAdvanceId,
    /// The employee who filed.
    pub employee_id: UserId,
    /// Store the expenses were incurred for.
    pub store_id: StoreId,
    /// Related ticket, if any (external module).
    pub ticket_id: Option<TicketId>,
    /// Reporting date of the liquidation.
    pub liquidation_date: NaiveDate,
    /// Free-form remarks.
    pub remarks: Option<String>,
    /// Workflow status.
    pub status: LiquidationStatus,
    /// Snapshot of the advance amount the split is computed against.
    pub advance_amount: Money,
    /// Derived: sum of all line totals.
    pub total_amount: Money,
    /// Derived: amount the employee must remit back.
    pub return_to_company: Money,
    /// Derived: amount owed to the employee.
    pub reimbursement: Money,
    /// Level-1 decision audit, once level 1 has acted.
    pub level1: Option<ApprovalRecord>,
    /// Level-2 decision audit, once level 2 has acted.
    pub level2: Option<ApprovalRecord>,
    /// Expense lines; replaced wholesale on edit.
    pub items: Vec<LiquidationItem>,
    /// Receipt attachments.
    pub attachments: Vec<Attachment>,
    /// Optimistic concurrency version.
    pub version: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for filing a liquidation.
#[derive(Debug, Clone)]
pub struct FileLiquidationInput {
    /// The cash advance to reconcile.
    pub cash_advance_id: CashAdvanceId,
    /// Store the expenses were incurred for.
    pub store_id: StoreId,
    /// Related ticket, if any.
    pub ticket_id: Option<TicketId>,
    /// Reporting date.
    pub liquidation_date: NaiveDate,
    /// Free-form remarks.
    pub remarks: Option<String>,
    /// Expense lines.
    pub items: Vec<ItemDraft>,
}

/// Input for editing a pending liquidation.
///
/// The item set is replaced wholesale; `attachments` reconciles existing
/// receipts against the replacement set.
#[derive(Debug, Clone)]
pub struct EditLiquidationInput {
    /// New reporting date.
    pub liquidation_date: NaiveDate,
    /// New remarks.
    pub remarks: Option<String>,
    /// Replacement expense lines.
    pub items: Vec<ItemDraft>,
    /// Receipt keep/remove/add instructions.
    pub attachments: ReconcilePlan,
}

/// Filters for listing liquidations.
#[derive(Debug, Clone, Default)]
pub struct LiquidationFilter {
    /// Restrict to a status.
    pub status: Option<LiquidationStatus>,
    /// Restrict to a store.
    pub store_id: Option<StoreId>,
    /// Restrict to a filing employee.
    pub employee_id: Option<UserId>,
}

/// Listing row: header and derived money without lines or receipts.
#[derive(Debug, Clone)]
pub struct LiquidationSummary {
    /// Unique identifier.
    pub id: LiquidationId,
    /// The cash advance being reconciled.
    pub cash_advance_id: CashAdvanceId,
    /// The employee who filed.
    pub employee_id: UserId,
    /// Store the expenses were incurred for.
    pub store_id: StoreId,
    /// Reporting date.
    pub liquidation_date: NaiveDate,
    /// Workflow status.
    pub status: LiquidationStatus,
    /// Sum of all line totals.
    pub total_amount: Money,
    /// Amount the employee must remit back.
    pub return_to_company: Money,
    /// Amount owed to the employee.
    pub reimbursement: Money,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
