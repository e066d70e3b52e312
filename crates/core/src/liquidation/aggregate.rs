//! Liquidation aggregate rules: construction, validation, and mutation.

use chrono::Utc;

use tala_shared::types::{LiquidationId, LiquidationItemId, Money, UserId};

use crate::liquidation::error::LiquidationError;
use crate::liquidation::types::{
    ApprovalLevel, CashAdvance, CashAdvanceStatus, FileLiquidationInput, ItemDraft, Liquidation,
    LiquidationItem, LiquidationStatus,
};
use crate::liquidation::workflow::Decision;
use crate::reconcile;

impl Liquidation {
    /// File a liquidation against an approved cash advance.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the advance is not in an eligible state/type,
    /// the item set is empty, any category amount is negative, or no line
    /// has a positive total.
    pub fn file(
        advance: &CashAdvance,
        input: FileLiquidationInput,
    ) -> Result<Self, LiquidationError> {
        if advance.status != CashAdvanceStatus::Approved {
            return Err(LiquidationError::validation(format!(
                "cash advance is {}, only approved advances can be liquidated",
                advance.status
            )));
        }
        if !advance.advance_type.is_liquidatable() {
            return Err(LiquidationError::validation(format!(
                "cash advance type '{}' cannot be liquidated",
                advance.advance_type
            )));
        }

        let items = build_items(input.items)?;
        let now = Utc::now();

        let mut liquidation = Self {
            id: LiquidationId::new(),
            cash_advance_id: advance.id,
            employee_id: advance.employee_id,
            store_id: input.store_id,
            ticket_id: input.ticket_id,
            liquidation_date: input.liquidation_date,
            remarks: input.remarks,
            status: LiquidationStatus::Pending,
            advance_amount: advance.amount,
            total_amount: Money::ZERO,
            return_to_company: Money::ZERO,
            reimbursement: Money::ZERO,
            level1: None,
            level2: None,
            items,
            attachments: Vec::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        };

        liquidation.recompute_derived();
        Ok(liquidation)
    }

    /// Replace the item set and header fields of a pending liquidation.
    ///
    /// This is replace-not-merge: old lines are discarded and the new ones
    /// get fresh ids. Attachment reconciliation runs separately against the
    /// returned state's item ids.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the liquidation is `pending`, or
    /// `Validation` if the replacement items are invalid.
    pub fn apply_edit(
        &mut self,
        items: Vec<ItemDraft>,
        liquidation_date: chrono::NaiveDate,
        remarks: Option<String>,
    ) -> Result<(), LiquidationError> {
        if !self.status.is_editable() {
            return Err(LiquidationError::InvalidState {
                status: self.status,
            });
        }

        self.items = build_items(items)?;
        self.liquidation_date = liquidation_date;
        self.remarks = remarks;
        self.recompute_derived();
        self.updated_at = Utc::now();

        Ok(())
    }

    /// Recompute `total_amount` and the return/reimbursement split from the
    /// current items.
    ///
    /// Called after every mutation; a persisted total is never trusted.
    pub fn recompute_derived(&mut self) {
        let result = reconcile::reconcile(
            self.advance_amount,
            self.items.iter().map(LiquidationItem::total),
        );
        self.total_amount = result.total_amount;
        self.return_to_company = result.return_to_company;
        self.reimbursement = result.reimbursement;
    }

    /// Apply a validated workflow decision to the aggregate.
    pub fn apply_decision(&mut self, decision: &Decision) {
        match decision.level {
            ApprovalLevel::One => self.level1 = Some(decision.record.clone()),
            ApprovalLevel::Two => self.level2 = Some(decision.record.clone()),
        }
        self.status = decision.new_status;
        self.updated_at = decision.record.decided_at;
    }

    /// The ids of the current expense lines, in order.
    #[must_use]
    pub fn item_ids(&self) -> Vec<LiquidationItemId> {
        self.items.iter().map(|item| item.id).collect()
    }

    /// Returns true if `user` filed this liquidation.
    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.employee_id == user
    }
}

/// Validate drafts and mint the expense lines.
fn build_items(drafts: Vec<ItemDraft>) -> Result<Vec<LiquidationItem>, LiquidationError> {
    if drafts.is_empty() {
        return Err(LiquidationError::validation(
            "at least one expense line is required",
        ));
    }

    for (index, draft) in drafts.iter().enumerate() {
        if draft.amounts.has_negative() {
            return Err(LiquidationError::validation(format!(
                "expense line {index} has a negative amount"
            )));
        }
    }

    if !drafts.iter().any(|d| d.amounts.total().is_positive()) {
        return Err(LiquidationError::validation(
            "at least one expense line must have a positive amount",
        ));
    }

    Ok(drafts
        .into_iter()
        .map(|draft| LiquidationItem {
            id: LiquidationItemId::new(),
            expense_date: draft.expense_date,
            from_destination: draft.from_destination,
            to_destination: draft.to_destination,
            amounts: draft.amounts,
            remarks: draft.remarks,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tala_shared::types::{CashAdvanceId, Money, StoreId, UserId};

    use crate::liquidation::types::{
        CashAdvanceStatus, CashAdvanceType, DecisionAction,
    };
    use crate::liquidation::workflow::{ApprovalState, ApprovalWorkflow};
    use crate::reconcile::ExpenseAmounts;

    fn advance(amount: Decimal) -> CashAdvance {
        CashAdvance {
            id: CashAdvanceId::new(),
            employee_id: UserId::new(),
            amount: Money::new(amount),
            status: CashAdvanceStatus::Approved,
            advance_type: CashAdvanceType::Support,
            purpose: "provincial store audit".to_string(),
            advance_date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
        }
    }

    fn draft(gas: Decimal, meals: Decimal) -> ItemDraft {
        ItemDraft {
            expense_date: NaiveDate::from_ymd_opt(2026, 7, 2).unwrap(),
            from_destination: "Makati".to_string(),
            to_destination: "Batangas".to_string(),
            amounts: ExpenseAmounts {
                gas: Money::new(gas),
                meals: Money::new(meals),
                ..ExpenseAmounts::default()
            },
            remarks: None,
        }
    }

    fn file_input(items: Vec<ItemDraft>) -> FileLiquidationInput {
        FileLiquidationInput {
            cash_advance_id: CashAdvanceId::new(),
            store_id: StoreId::new(),
            ticket_id: None,
            liquidation_date: NaiveDate::from_ymd_opt(2026, 7, 5).unwrap(),
            remarks: Some("week 27 trip".to_string()),
            items,
        }
    }

    #[test]
    fn test_file_scenario_a_return_to_company() {
        // advance 5000.00, items sum to 4500.00
        let adv = advance(dec!(5000.00));
        let liquidation =
            Liquidation::file(&adv, file_input(vec![draft(dec!(3000.00), dec!(1500.00))]))
                .unwrap();

        assert_eq!(liquidation.status, LiquidationStatus::Pending);
        assert_eq!(liquidation.total_amount, Money::new(dec!(4500.00)));
        assert_eq!(liquidation.return_to_company, Money::new(dec!(500.00)));
        assert_eq!(liquidation.reimbursement, Money::ZERO);
        assert_eq!(liquidation.employee_id, adv.employee_id);
        assert_eq!(liquidation.version, 1);
    }

    #[test]
    fn test_file_scenario_b_reimbursement() {
        // advance 3000.00, items sum to 3450.00
        let adv = advance(dec!(3000.00));
        let liquidation = Liquidation::file(
            &adv,
            file_input(vec![draft(dec!(2000.00), dec!(450.00)), draft(dec!(1000.00), dec!(0))]),
        )
        .unwrap();

        assert_eq!(liquidation.total_amount, Money::new(dec!(3450.00)));
        assert_eq!(liquidation.reimbursement, Money::new(dec!(450.00)));
        assert_eq!(liquidation.return_to_company, Money::ZERO);
    }

    #[test]
    fn test_file_scenario_c_zero_items() {
        let adv = advance(dec!(1000.00));
        let result = Liquidation::file(&adv, file_input(vec![]));
        assert!(matches!(result, Err(LiquidationError::Validation(_))));
    }

    #[test]
    fn test_file_rejects_unapproved_advance() {
        let mut adv = advance(dec!(1000.00));
        adv.status = CashAdvanceStatus::Pending;
        let result = Liquidation::file(&adv, file_input(vec![draft(dec!(100), dec!(0))]));
        assert!(matches!(result, Err(LiquidationError::Validation(_))));
    }

    #[test]
    fn test_file_rejects_payroll_advance() {
        let mut adv = advance(dec!(1000.00));
        adv.advance_type = CashAdvanceType::Payroll;
        let result = Liquidation::file(&adv, file_input(vec![draft(dec!(100), dec!(0))]));
        assert!(matches!(result, Err(LiquidationError::Validation(_))));
    }

    #[test]
    fn test_file_rejects_negative_amounts() {
        let adv = advance(dec!(1000.00));
        let result = Liquidation::file(&adv, file_input(vec![draft(dec!(-50), dec!(200))]));
        assert!(matches!(result, Err(LiquidationError::Validation(_))));
    }

    #[test]
    fn test_file_rejects_all_zero_items() {
        let adv = advance(dec!(1000.00));
        let result =
            Liquidation::file(&adv, file_input(vec![draft(dec!(0), dec!(0)), draft(dec!(0), dec!(0))]));
        assert!(matches!(result, Err(LiquidationError::Validation(_))));
    }

    #[test]
    fn test_edit_replaces_items_with_fresh_ids() {
        let adv = advance(dec!(5000.00));
        let mut liquidation =
            Liquidation::file(&adv, file_input(vec![draft(dec!(3000.00), dec!(1500.00))]))
                .unwrap();
        let old_ids = liquidation.item_ids();

        liquidation
            .apply_edit(
                vec![draft(dec!(1000.00), dec!(500.00)), draft(dec!(200.00), dec!(0))],
                NaiveDate::from_ymd_opt(2026, 7, 6).unwrap(),
                Some("corrected".to_string()),
            )
            .unwrap();

        assert_eq!(liquidation.items.len(), 2);
        for id in liquidation.item_ids() {
            assert!(!old_ids.contains(&id));
        }
        // derived fields recomputed from the replacement set
        assert_eq!(liquidation.total_amount, Money::new(dec!(1700.00)));
        assert_eq!(liquidation.return_to_company, Money::new(dec!(3300.00)));
        assert_eq!(liquidation.reimbursement, Money::ZERO);
    }

    #[test]
    fn test_edit_requires_pending() {
        let adv = advance(dec!(5000.00));
        let mut liquidation =
            Liquidation::file(&adv, file_input(vec![draft(dec!(3000.00), dec!(1500.00))]))
                .unwrap();

        let decision = ApprovalWorkflow::decide(
            &ApprovalState::from(&liquidation),
            ApprovalLevel::One,
            DecisionAction::Approve,
            UserId::new(),
            None,
        )
        .unwrap();
        liquidation.apply_decision(&decision);

        let result = liquidation.apply_edit(
            vec![draft(dec!(1.00), dec!(0))],
            NaiveDate::from_ymd_opt(2026, 7, 6).unwrap(),
            None,
        );

        assert!(matches!(
            result,
            Err(LiquidationError::InvalidState {
                status: LiquidationStatus::Level1Approved
            })
        ));
    }

    #[test]
    fn test_edit_validation_leaves_state_untouched() {
        let adv = advance(dec!(5000.00));
        let mut liquidation =
            Liquidation::file(&adv, file_input(vec![draft(dec!(3000.00), dec!(1500.00))]))
                .unwrap();
        let before_ids = liquidation.item_ids();
        let before_total = liquidation.total_amount;

        let result = liquidation.apply_edit(
            vec![],
            NaiveDate::from_ymd_opt(2026, 7, 6).unwrap(),
            None,
        );
        assert!(matches!(result, Err(LiquidationError::Validation(_))));

        assert_eq!(liquidation.item_ids(), before_ids);
        assert_eq!(liquidation.total_amount, before_total);
    }

    #[test]
    fn test_full_approval_records_both_levels() {
        let adv = advance(dec!(2000.00));
        let mut liquidation =
            Liquidation::file(&adv, file_input(vec![draft(dec!(2000.00), dec!(0))])).unwrap();

        let supervisor = UserId::new();
        let manager = UserId::new();

        let first = ApprovalWorkflow::decide(
            &ApprovalState::from(&liquidation),
            ApprovalLevel::One,
            DecisionAction::Approve,
            supervisor,
            Some("complete".to_string()),
        )
        .unwrap();
        liquidation.apply_decision(&first);

        assert_eq!(liquidation.status, LiquidationStatus::Level1Approved);
        assert_eq!(liquidation.level1.as_ref().unwrap().decided_by, supervisor);
        assert!(liquidation.level2.is_none());

        let second = ApprovalWorkflow::decide(
            &ApprovalState::from(&liquidation),
            ApprovalLevel::Two,
            DecisionAction::Approve,
            manager,
            None,
        )
        .unwrap();
        liquidation.apply_decision(&second);

        assert_eq!(liquidation.status, LiquidationStatus::Approved);
        assert_eq!(liquidation.level2.as_ref().unwrap().decided_by, manager);
        // level ordering invariant
        assert!(liquidation.level1.is_some());
    }

    #[test]
    fn test_rejection_leaves_other_level_untouched() {
        let adv = advance(dec!(2000.00));
        let mut liquidation =
            Liquidation::file(&adv, file_input(vec![draft(dec!(2000.00), dec!(0))])).unwrap();

        let decision = ApprovalWorkflow::decide(
            &ApprovalState::from(&liquidation),
            ApprovalLevel::One,
            DecisionAction::Reject,
            UserId::new(),
            Some("no receipts".to_string()),
        )
        .unwrap();
        liquidation.apply_decision(&decision);

        assert_eq!(liquidation.status, LiquidationStatus::Rejected);
        assert_eq!(
            liquidation.level1.as_ref().unwrap().action,
            DecisionAction::Reject
        );
        // level 2 never acted, so its audit stays empty: the UI can show
        // "rejected at level 1"
        assert!(liquidation.level2.is_none());
    }

    #[test]
    fn test_is_owned_by() {
        let adv = advance(dec!(1000.00));
        let liquidation =
            Liquidation::file(&adv, file_input(vec![draft(dec!(100.00), dec!(0))])).unwrap();

        assert!(liquidation.is_owned_by(adv.employee_id));
        assert!(!liquidation.is_owned_by(UserId::new()));
    }
}
