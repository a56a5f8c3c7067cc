//! Reduces categories, budgets and transactions into the budget summary.

use std::{collections::HashMap, ops::RangeInclusive};

use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    budget::{
        BudgetAllocation,
        summary::{
            builder::{CategorySummaryRow, summarize_category},
            interval::months_in_range,
        },
    },
    category::{Category, CategoryId},
    money::{checked_add, checked_sub},
    transaction::Transaction,
};

/// The budget-vs-actual summary for a date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    /// The signed sum of transactions in income categories.
    #[serde(with = "rust_decimal::serde::float")]
    pub overall_inflow: Decimal,
    /// The magnitude of the sum of transactions in expense categories.
    #[serde(with = "rust_decimal::serde::float")]
    pub overall_outflow: Decimal,
    /// `overall_inflow - overall_outflow`.
    #[serde(with = "rust_decimal::serde::float")]
    pub net_change: Decimal,
    /// One row per category that is not excluded from the budget.
    pub categories: Vec<CategorySummaryRow>,
}

/// Compute the budget summary for `range` from a user's data.
///
/// `budgets` and `transactions` are expected to have been read for `range`
/// already. Transactions without a category, or whose category is not in
/// `categories`, count towards nothing.
///
/// # Errors
/// Returns [Error::AmountOverflow] if any total cannot be represented.
pub fn compute_budget_summary(
    range: &RangeInclusive<Date>,
    categories: &[Category],
    budgets: &[BudgetAllocation],
    transactions: &[Transaction],
) -> Result<BudgetSummary, Error> {
    let is_income_by_id: HashMap<CategoryId, bool> = categories
        .iter()
        .map(|category| (category.id, category.is_income))
        .collect();

    let mut overall_inflow = Decimal::ZERO;
    let mut expense_sum = Decimal::ZERO;

    for transaction in transactions
        .iter()
        .filter(|transaction| range.contains(&transaction.date))
    {
        match transaction
            .category_id
            .and_then(|category_id| is_income_by_id.get(&category_id).copied())
        {
            Some(true) => overall_inflow = checked_add(overall_inflow, transaction.amount)?,
            Some(false) => expense_sum = checked_add(expense_sum, transaction.amount)?,
            None => tracing::debug!(
                "Leaving uncategorized transaction {} out of the budget summary.",
                transaction.id
            ),
        }
    }

    let overall_outflow = expense_sum.abs();
    let months = months_in_range(*range.start(), *range.end());

    let category_rows = categories
        .iter()
        .filter_map(|category| {
            summarize_category(category, &months, budgets, transactions, range).transpose()
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(BudgetSummary {
        overall_inflow,
        overall_outflow,
        net_change: checked_sub(overall_inflow, overall_outflow)?,
        categories: category_rows,
    })
}
