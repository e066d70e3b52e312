//! Two-level approval state machine.
//!
//! The only code path that produces a status change. Level 1 acts on
//! `pending`, level 2 on `level1_approved`; rejection at either level lands
//! in the absorbing `rejected` state. A request for a transition the
//! liquidation has already moved past fails `AlreadyDecided` instead of
//! double-recording, which keeps duplicate submissions harmless.

use chrono::Utc;

use tala_shared::types::UserId;

use crate::liquidation::error::LiquidationError;
use crate::liquidation::types::{
    ApprovalLevel, ApprovalRecord, DecisionAction, Liquidation, LiquidationStatus,
};

/// The slice of a liquidation the state machine reads.
///
/// `status` alone cannot distinguish a level-1 rejection from a level-2
/// rejection, so the per-level audit flags ride along.
#[derive(Debug, Clone, Copy)]
pub struct ApprovalState {
    /// Current workflow status.
    pub status: LiquidationStatus,
    /// Whether level 1 has recorded a decision.
    pub level1_acted: bool,
    /// Whether level 2 has recorded a decision.
    pub level2_acted: bool,
}

impl From<&Liquidation> for ApprovalState {
    fn from(liquidation: &Liquidation) -> Self {
        Self {
            status: liquidation.status,
            level1_acted: liquidation.level1.is_some(),
            level2_acted: liquidation.level2.is_some(),
        }
    }
}

/// A validated state transition with its audit record.
#[derive(Debug, Clone)]
pub struct Decision {
    /// The status after applying the decision.
    pub new_status: LiquidationStatus,
    /// The level that decided.
    pub level: ApprovalLevel,
    /// Approve or reject.
    pub action: DecisionAction,
    /// The audit record for the deciding level.
    pub record: ApprovalRecord,
}

/// Stateless service validating and producing approval transitions.
pub struct ApprovalWorkflow;

impl ApprovalWorkflow {
    /// Validate a decision against the current state and produce the
    /// transition.
    ///
    /// # Errors
    ///
    /// - `Validation` if a rejection carries no comment
    /// - `IllegalTransition` if the level is not reachable from the current
    ///   state (level 2 before level 1, or after a level-1 rejection)
    /// - `AlreadyDecided` if the requested level has already recorded a
    ///   decision (duplicate request)
    pub fn decide(
        state: &ApprovalState,
        level: ApprovalLevel,
        action: DecisionAction,
        decided_by: UserId,
        comment: Option<String>,
    ) -> Result<Decision, LiquidationError> {
        if action == DecisionAction::Reject
            && comment.as_deref().is_none_or(|c| c.trim().is_empty())
        {
            return Err(LiquidationError::validation(
                "a comment is required when rejecting",
            ));
        }

        match level {
            ApprovalLevel::One => match state.status {
                LiquidationStatus::Pending => Ok(Self::build(level, action, decided_by, comment)),
                // Every other status means level 1 already acted.
                status => Err(LiquidationError::AlreadyDecided { level, status }),
            },
            ApprovalLevel::Two => match state.status {
                LiquidationStatus::Level1Approved => {
                    Ok(Self::build(level, action, decided_by, comment))
                }
                LiquidationStatus::Approved => {
                    Err(LiquidationError::AlreadyDecided { level, status: state.status })
                }
                LiquidationStatus::Rejected if state.level2_acted => {
                    Err(LiquidationError::AlreadyDecided { level, status: state.status })
                }
                // Pending, or rejected at level 1: level 2 never became
                // reachable.
                status => Err(LiquidationError::IllegalTransition { level, status }),
            },
        }
    }

    fn build(
        level: ApprovalLevel,
        action: DecisionAction,
        decided_by: UserId,
        comment: Option<String>,
    ) -> Decision {
        let new_status = match (level, action) {
            (ApprovalLevel::One, DecisionAction::Approve) => LiquidationStatus::Level1Approved,
            (ApprovalLevel::Two, DecisionAction::Approve) => LiquidationStatus::Approved,
            (_, DecisionAction::Reject) => LiquidationStatus::Rejected,
        };

        Decision {
            new_status,
            level,
            action,
            record: ApprovalRecord {
                decided_by,
                decided_at: Utc::now(),
                action,
                comment,
            },
        }
    }

    /// Check if a status transition is one the workflow can produce.
    ///
    /// Valid transitions:
    /// - Pending → Level1Approved (level-1 approve)
    /// - Pending → Rejected (level-1 reject)
    /// - Level1Approved → Approved (level-2 approve)
    /// - Level1Approved → Rejected (level-2 reject)
    #[must_use]
    pub fn is_valid_transition(from: LiquidationStatus, to: LiquidationStatus) -> bool {
        matches!(
            (from, to),
            (
                LiquidationStatus::Pending,
                LiquidationStatus::Level1Approved | LiquidationStatus::Rejected
            ) | (
                LiquidationStatus::Level1Approved,
                LiquidationStatus::Approved | LiquidationStatus::Rejected
            )
        )
    }
}
