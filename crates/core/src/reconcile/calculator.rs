//! Expense totals and the advance/expense split.

use serde::{Deserialize, Serialize};
use tala_shared::types::Money;

/// The eight expense categories of a liquidation line item.
///
/// Every category is a peso amount; a line's total is the sum across all
/// eight. Negative values are a validation error upstream, never clamped
/// here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExpenseAmounts {
    /// Jeepney fare.
    pub jeep: Money,
    /// Bus fare.
    pub bus: Money,
    /// FX / van fare.
    pub fx_van: Money,
    /// Fuel.
    pub gas: Money,
    /// Toll fees.
    pub toll: Money,
    /// Meals.
    pub meals: Money,
    /// Lodging.
    pub lodging: Money,
    /// Anything that does not fit the categories above.
    pub others: Money,
}

impl ExpenseAmounts {
    /// Sum across all eight categories.
    #[must_use]
    pub fn total(&self) -> Money {
        [
            self.jeep,
            self.bus,
            self.fx_van,
            self.gas,
            self.toll,
            self.meals,
            self.lodging,
            self.others,
        ]
        .into_iter()
        .sum()
    }

    /// Returns true if any category is negative.
    #[must_use]
    pub fn has_negative(&self) -> bool {
        [
            self.jeep,
            self.bus,
            self.fx_van,
            self.gas,
            self.toll,
            self.meals,
            self.lodging,
            self.others,
        ]
        .into_iter()
        .any(Money::is_negative)
    }
}

/// The computed money relationship between an advance and its expenses.
///
/// Exactly one of `return_to_company` / `reimbursement` is nonzero, unless
/// the expenses match the advance exactly, in which case both are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Sum of all line item totals.
    pub total_amount: Money,
    /// Amount the employee must remit back (advance exceeded expenses).
    pub return_to_company: Money,
    /// Amount owed to the employee (expenses exceeded the advance).
    pub reimbursement: Money,
}

impl Reconciliation {
    /// Returns true if the expenses matched the advance to the centavo.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.return_to_company.is_zero() && self.reimbursement.is_zero()
    }
}

/// Computes the total and the advance/expense split.
///
/// The split is saturating on both sides: the side that would go negative
/// reports zero, which is what makes the exclusivity invariant hold.
#[must_use]
pub fn reconcile(advance_amount: Money, item_totals: impl IntoIterator<Item = Money>) -> Reconciliation {
    let total_amount: Money = item_totals.into_iter().sum();

    Reconciliation {
        total_amount,
        return_to_company: advance_amount.saturating_sub(total_amount),
        reimbursement: total_amount.saturating_sub(advance_amount),
    }
}
