//! Property-based tests for the reconciliation calculator.

use proptest::prelude::*;
use rust_decimal::Decimal;
use tala_shared::types::Money;

use super::calculator::reconcile;

/// Strategy for non-negative centavo amounts up to PHP 1,000,000.
fn arb_amount() -> impl Strategy<Value = Money> {
    (0i64..100_000_000i64).prop_map(|cents| Money::new(Decimal::new(cents, 2)))
}

/// Strategy for a list of expense line totals.
fn arb_item_totals() -> impl Strategy<Value = Vec<Money>> {
    prop::collection::vec(arb_amount(), 0..20)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The reported total is always the sum of the line totals.
    #[test]
    fn prop_total_is_sum_of_items(
        advance in arb_amount(),
        items in arb_item_totals()
    ) {
        let expected: Money = items.iter().copied().sum();
        let result = reconcile(advance, items);
        prop_assert_eq!(result.total_amount, expected);
    }

    /// Never both return-to-company and reimbursement at once.
    #[test]
    fn prop_split_is_exclusive(
        advance in arb_amount(),
        items in arb_item_totals()
    ) {
        let result = reconcile(advance, items);
        prop_assert!(
            result.return_to_company.is_zero() || result.reimbursement.is_zero(),
            "both sides nonzero: return={} reimbursement={}",
            result.return_to_company,
            result.reimbursement
        );
    }

    /// The split conserves money: advance + reimbursement == total + return.
    #[test]
    fn prop_split_conserves_money(
        advance in arb_amount(),
        items in arb_item_totals()
    ) {
        let result = reconcile(advance, items);
        prop_assert_eq!(
            advance + result.reimbursement,
            result.total_amount + result.return_to_company
        );
    }

    /// Both sides are always non-negative.
    #[test]
    fn prop_split_is_non_negative(
        advance in arb_amount(),
        items in arb_item_totals()
    ) {
        let result = reconcile(advance, items);
        prop_assert!(!result.return_to_company.is_negative());
        prop_assert!(!result.reimbursement.is_negative());
    }

    /// Reconciliation is order-independent over the item list.
    #[test]
    fn prop_item_order_is_irrelevant(
        advance in arb_amount(),
        items in arb_item_totals()
    ) {
        let mut reversed = items.clone();
        reversed.reverse();
        prop_assert_eq!(reconcile(advance, items), reconcile(advance, reversed));
    }
}
