//! Monthly budgets per category and the budget-vs-actual summary.

mod core;
mod endpoints;
pub(crate) mod summary;

pub use core::{
    BudgetAllocation, UpsertOutcome, create_budget_table, get_budgets_overlapping, upsert_budget,
};
pub use endpoints::{get_budget_summary_endpoint, upsert_budget_endpoint};
pub use summary::{BudgetSummary, CategorySummaryRow, MonthlyOccurrence, compute_budget_summary};
