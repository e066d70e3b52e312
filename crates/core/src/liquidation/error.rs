//! Liquidation error taxonomy.
//!
//! Every failure here is recoverable at the caller. The core never logs or
//! formats user-facing text; the api layer maps these onto HTTP via
//! `status_code`/`error_code`. `Conflict` is the only kind worth an
//! automatic retry.

use thiserror::Error;

use tala_shared::types::{CashAdvanceId, LiquidationId};

use crate::attachment::AttachmentError;
use crate::liquidation::types::{ApprovalLevel, Capability, LiquidationStatus};

/// Errors that can occur during liquidation operations.
#[derive(Debug, Error)]
pub enum LiquidationError {
    /// Malformed or out-of-range input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Operation not legal for the liquidation's current status.
    #[error("operation not allowed while liquidation is {status}")]
    InvalidState {
        /// The current status.
        status: LiquidationStatus,
    },

    /// Wrong level/state pairing in a decision.
    #[error("{level} decision is not legal while liquidation is {status}")]
    IllegalTransition {
        /// The requested level.
        level: ApprovalLevel,
        /// The current status.
        status: LiquidationStatus,
    },

    /// The requested transition has already been applied.
    #[error("{level} has already decided; liquidation is {status}")]
    AlreadyDecided {
        /// The requested level.
        level: ApprovalLevel,
        /// The current status.
        status: LiquidationStatus,
    },

    /// A liquidation already exists for this cash advance.
    #[error("cash advance {0} is already liquidated")]
    AlreadyLiquidated(CashAdvanceId),

    /// Liquidation not found.
    #[error("liquidation {0} not found")]
    NotFound(LiquidationId),

    /// Cash advance not found.
    #[error("cash advance {0} not found")]
    CashAdvanceNotFound(CashAdvanceId),

    /// Actor does not hold the required capability.
    #[error("actor lacks capability {0}")]
    Forbidden(Capability),

    /// Optimistic concurrency collision; safe to retry once.
    #[error("liquidation was modified concurrently")]
    Conflict,

    /// Attachment ledger failure.
    #[error(transparent)]
    Attachment(#[from] AttachmentError),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl LiquidationError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::InvalidState { .. } | Self::IllegalTransition { .. } => 422,
            Self::AlreadyDecided { .. } | Self::AlreadyLiquidated(_) | Self::Conflict => 409,
            Self::NotFound(_) | Self::CashAdvanceNotFound(_) => 404,
            Self::Forbidden(_) => 403,
            Self::Attachment(inner) => inner.status_code(),
            Self::Repository(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::IllegalTransition { .. } => "ILLEGAL_TRANSITION",
            Self::AlreadyDecided { .. } => "ALREADY_DECIDED",
            Self::AlreadyLiquidated(_) => "ALREADY_LIQUIDATED",
            Self::NotFound(_) => "LIQUIDATION_NOT_FOUND",
            Self::CashAdvanceNotFound(_) => "CASH_ADVANCE_NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Conflict => "CONFLICT",
            Self::Attachment(inner) => inner.error_code(),
            Self::Repository(_) => "REPOSITORY_ERROR",
        }
    }

    /// Returns true if the orchestrator should retry the operation once.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict)
    }
}
