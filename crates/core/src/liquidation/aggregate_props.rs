//! Property-based tests for aggregate invariants.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use tala_shared::types::{CashAdvanceId, Money, StoreId, UserId};

use crate::liquidation::types::{
    CashAdvance, CashAdvanceStatus, CashAdvanceType, FileLiquidationInput, ItemDraft, Liquidation,
    LiquidationItem,
};
use crate::reconcile::ExpenseAmounts;

fn arb_money() -> impl Strategy<Value = Money> {
    (0i64..10_000_000i64).prop_map(|cents| Money::new(Decimal::new(cents, 2)))
}

fn arb_amounts() -> impl Strategy<Value = ExpenseAmounts> {
    (
        arb_money(),
        arb_money(),
        arb_money(),
        arb_money(),
        arb_money(),
        arb_money(),
        arb_money(),
        arb_money(),
    )
        .prop_map(
            |(jeep, bus, fx_van, gas, toll, meals, lodging, others)| ExpenseAmounts {
                jeep,
                bus,
                fx_van,
                gas,
                toll,
                meals,
                lodging,
                others,
            },
        )
}

fn arb_drafts() -> impl Strategy<Value = Vec<ItemDraft>> {
    prop::collection::vec(
        arb_amounts().prop_map(|amounts| ItemDraft {
            expense_date: NaiveDate::from_ymd_opt(2026, 7, 2).unwrap(),
            from_destination: "Makati".to_string(),
            to_destination: "Laguna".to_string(),
            amounts,
            remarks: None,
        }),
        1..12,
    )
}

fn advance(amount: Money) -> CashAdvance {
    CashAdvance {
        id: CashAdvanceId::new(),
        employee_id: UserId::new(),
        amount,
        status: CashAdvanceStatus::Approved,
        advance_type: CashAdvanceType::Reimbursement,
        purpose: "field work".to_string(),
        advance_date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
    }
}

fn file_input(cash_advance_id: CashAdvanceId, items: Vec<ItemDraft>) -> FileLiquidationInput {
    FileLiquidationInput {
        cash_advance_id,
        store_id: StoreId::new(),
        ticket_id: None,
        liquidation_date: NaiveDate::from_ymd_opt(2026, 7, 5).unwrap(),
        remarks: None,
        items,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// For any filed liquidation, `total_amount` equals the sum over its
    /// items, and the split sides are mutually exclusive.
    #[test]
    fn prop_derived_fields_hold_after_file(
        advance_amount in arb_money(),
        drafts in arb_drafts(),
    ) {
        prop_assume!(drafts.iter().any(|d| d.amounts.total().is_positive()));

        let adv = advance(advance_amount);
        let liquidation = Liquidation::file(&adv, file_input(adv.id, drafts)).unwrap();

        let expected: Money = liquidation.items.iter().map(LiquidationItem::total).sum();
        prop_assert_eq!(liquidation.total_amount, expected);
        prop_assert!(
            liquidation.return_to_company.is_zero() || liquidation.reimbursement.is_zero()
        );
    }

    /// Edits preserve the same invariants and always mint fresh item ids.
    #[test]
    fn prop_derived_fields_hold_after_edit(
        advance_amount in arb_money(),
        first in arb_drafts(),
        second in arb_drafts(),
    ) {
        prop_assume!(first.iter().any(|d| d.amounts.total().is_positive()));
        prop_assume!(second.iter().any(|d| d.amounts.total().is_positive()));

        let adv = advance(advance_amount);
        let mut liquidation = Liquidation::file(&adv, file_input(adv.id, first)).unwrap();
        let old_ids = liquidation.item_ids();

        liquidation
            .apply_edit(
                second,
                NaiveDate::from_ymd_opt(2026, 7, 8).unwrap(),
                None,
            )
            .unwrap();

        let expected: Money = liquidation.items.iter().map(LiquidationItem::total).sum();
        prop_assert_eq!(liquidation.total_amount, expected);
        prop_assert!(
            liquidation.return_to_company.is_zero() || liquidation.reimbursement.is_zero()
        );
        for id in liquidation.item_ids() {
            prop_assert!(!old_ids.contains(&id));
        }
    }
}
