//! The budget summary engine.
//!
//! Everything here is pure: the caller reads a user's categories, budget
//! allocations and transactions for a date range and passes them to
//! [compute_budget_summary].

pub(crate) mod aggregator;
mod builder;
pub(crate) mod interval;
mod matcher;
mod reducer;

pub use builder::{CategorySummaryRow, MonthlyOccurrence};
pub use reducer::{BudgetSummary, compute_budget_summary};
