//! Liquidation lifecycle: aggregate, approval workflow, and service.
//!
//! A liquidation reconciles an approved cash advance against itemized
//! expenses. It is editable while `pending`, passes a two-level approval
//! gate, and carries receipt attachments whose bindings survive edits.
//!
//! # Modules
//!
//! - `types` - Domain types (statuses, cash advance, items, aggregate)
//! - `error` - Liquidation error taxonomy
//! - `workflow` - Two-level approval state machine
//! - `aggregate` - Construction, validation, and mutation rules
//! - `service` - Use-case orchestration over repository/permission traits

mod aggregate;
pub mod error;
pub mod service;
pub mod types;
pub mod workflow;

#[cfg(test)]
mod aggregate_props;
#[cfg(test)]
mod workflow_props;

pub use error::LiquidationError;
pub use service::{LiquidationRepository, LiquidationService, PermissionChecker};
pub use types::{
    ApprovalLevel, ApprovalRecord, Capability, CashAdvance, CashAdvanceStatus, CashAdvanceType,
    DecisionAction, EditLiquidationInput, FileLiquidationInput, ItemDraft, Liquidation,
    LiquidationFilter, LiquidationItem, LiquidationStatus, LiquidationSummary,
};
pub use workflow::{ApprovalState, ApprovalWorkflow, Decision};
