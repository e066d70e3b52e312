//! Property-based tests for the approval workflow.

use proptest::prelude::*;
use tala_shared::types::UserId;

use crate::liquidation::error::LiquidationError;
use crate::liquidation::types::{ApprovalLevel, DecisionAction, LiquidationStatus};
use crate::liquidation::workflow::{ApprovalState, ApprovalWorkflow};

fn arb_status() -> impl Strategy<Value = LiquidationStatus> {
    prop_oneof![
        Just(LiquidationStatus::Pending),
        Just(LiquidationStatus::Level1Approved),
        Just(LiquidationStatus::Approved),
        Just(LiquidationStatus::Rejected),
    ]
}

fn arb_level() -> impl Strategy<Value = ApprovalLevel> {
    prop_oneof![Just(ApprovalLevel::One), Just(ApprovalLevel::Two)]
}

fn arb_action() -> impl Strategy<Value = DecisionAction> {
    prop_oneof![Just(DecisionAction::Approve), Just(DecisionAction::Reject)]
}

/// A state with audit flags consistent with its status.
fn arb_state() -> impl Strategy<Value = ApprovalState> {
    arb_status().prop_flat_map(|status| {
        let flags = match status {
            LiquidationStatus::Pending => Just((false, false)).boxed(),
            LiquidationStatus::Level1Approved => Just((true, false)).boxed(),
            LiquidationStatus::Approved => Just((true, true)).boxed(),
            // rejected at level 1 (level 2 untouched) or at level 2
            LiquidationStatus::Rejected => {
                prop_oneof![Just((true, false)), Just((true, true))].boxed()
            }
        };
        flags.prop_map(move |(level1_acted, level2_acted)| ApprovalState {
            status,
            level1_acted,
            level2_acted,
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every decision the workflow accepts produces a transition that
    /// `is_valid_transition` recognizes.
    #[test]
    fn prop_accepted_decisions_are_valid_transitions(
        state in arb_state(),
        level in arb_level(),
        action in arb_action(),
    ) {
        if let Ok(decision) = ApprovalWorkflow::decide(
            &state,
            level,
            action,
            UserId::new(),
            Some("reviewed".to_string()),
        ) {
            prop_assert!(ApprovalWorkflow::is_valid_transition(
                state.status,
                decision.new_status
            ));
        }
    }

    /// Terminal states accept no decision at all.
    #[test]
    fn prop_terminal_states_are_absorbing(
        state in arb_state(),
        level in arb_level(),
        action in arb_action(),
    ) {
        prop_assume!(state.status.is_terminal());

        let result = ApprovalWorkflow::decide(
            &state,
            level,
            action,
            UserId::new(),
            Some("reviewed".to_string()),
        );
        prop_assert!(result.is_err());
    }

    /// Level 2 only ever acts from `level1_approved`.
    #[test]
    fn prop_level2_requires_level1_approval(
        state in arb_state(),
        action in arb_action(),
    ) {
        let result = ApprovalWorkflow::decide(
            &state,
            ApprovalLevel::Two,
            action,
            UserId::new(),
            Some("reviewed".to_string()),
        );

        if state.status == LiquidationStatus::Level1Approved {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(result.is_err());
        }
    }

    /// A decision's audit record carries the actor and action it was built
    /// from.
    #[test]
    fn prop_audit_record_matches_request(
        action in arb_action(),
    ) {
        let actor = UserId::new();
        let decision = ApprovalWorkflow::decide(
            &ApprovalState {
                status: LiquidationStatus::Pending,
                level1_acted: false,
                level2_acted: false,
            },
            ApprovalLevel::One,
            action,
            actor,
            Some("reviewed".to_string()),
        )
        .unwrap();

        prop_assert_eq!(decision.record.decided_by, actor);
        prop_assert_eq!(decision.record.action, action);
        prop_assert_eq!(decision.action, action);
    }

    /// Replaying a decision against the state it produced fails with
    /// `AlreadyDecided`, never a silent second transition.
    #[test]
    fn prop_replay_is_already_decided(
        action in arb_action(),
    ) {
        let decision = ApprovalWorkflow::decide(
            &ApprovalState {
                status: LiquidationStatus::Pending,
                level1_acted: false,
                level2_acted: false,
            },
            ApprovalLevel::One,
            action,
            UserId::new(),
            Some("reviewed".to_string()),
        )
        .unwrap();

        let after = ApprovalState {
            status: decision.new_status,
            level1_acted: true,
            level2_acted: false,
        };

        let replay = ApprovalWorkflow::decide(
            &after,
            ApprovalLevel::One,
            action,
            UserId::new(),
            Some("reviewed".to_string()),
        );

        prop_assert!(
            matches!(replay, Err(LiquidationError::AlreadyDecided { .. })),
            "expected AlreadyDecided error on replay"
        );
    }
}
