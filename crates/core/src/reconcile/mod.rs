//! Cash-advance reconciliation arithmetic.
//!
//! Pure calculations that turn an advance amount and a set of expense lines
//! into a total and its signed split: what the employee returns to the
//! company, or what the company reimburses the employee. No I/O, no side
//! effects.

mod calculator;

#[cfg(test)]
mod props;

pub use calculator::{ExpenseAmounts, Reconciliation, reconcile};
