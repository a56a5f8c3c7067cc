//! Builds the budget-vs-actual row for a single category.

use std::ops::RangeInclusive;

use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    budget::{
        BudgetAllocation,
        summary::{
            aggregator::category_activity,
            interval::{month_end, month_key, month_start},
            matcher::budgeted_for_month,
        },
    },
    category::{Category, CategoryId},
    money::{checked_sub, checked_sum},
    transaction::Transaction,
};

/// One month of a category's budget summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyOccurrence {
    /// The month formatted as `YYYY-MM`.
    pub month: String,
    /// The category's activity during the month.
    #[serde(with = "rust_decimal::serde::float")]
    pub activity: Decimal,
    /// The amount budgeted for the month.
    #[serde(with = "rust_decimal::serde::float")]
    pub budgeted: Decimal,
    /// `budgeted - activity`.
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

/// A category's budget-vs-actual summary over a date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummaryRow {
    /// The category's ID.
    pub id: CategoryId,
    /// The category's name.
    pub name: String,
    /// Whether the category is for income.
    pub is_income: bool,
    /// Grouping metadata copied from the category.
    pub is_group: bool,
    /// Grouping metadata copied from the category.
    pub group_id: Option<CategoryId>,
    /// Grouping metadata copied from the category.
    pub group_category_name: Option<String>,
    /// Activity over the whole range.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_activity: Decimal,
    /// The sum of the monthly budgets.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_budgeted: Decimal,
    /// `total_budgeted - total_activity`.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_balance: Decimal,
    /// One entry per month in the range, in ascending order.
    pub occurrences: Vec<MonthlyOccurrence>,
}

/// Summarize `category` over `range`, which spans `months`.
///
/// Returns `None` for categories excluded from the budget. Every other
/// category gets a row, with zeroes if there was no activity or budget.
///
/// # Errors
/// Returns [Error::AmountOverflow] if a total or balance cannot be represented.
pub fn summarize_category(
    category: &Category,
    months: &[Date],
    budgets: &[BudgetAllocation],
    transactions: &[Transaction],
    range: &RangeInclusive<Date>,
) -> Result<Option<CategorySummaryRow>, Error> {
    if category.exclude_from_budget {
        return Ok(None);
    }

    let occurrences = months
        .iter()
        .map(|&month| {
            let activity = category_activity(
                transactions,
                category,
                &(month_start(month)..=month_end(month)),
            )?;
            let budgeted = budgeted_for_month(budgets, category.id, month)?;

            Ok(MonthlyOccurrence {
                month: month_key(month),
                activity,
                budgeted,
                balance: checked_sub(budgeted, activity)?,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let total_activity = category_activity(transactions, category, range)?;
    let total_budgeted = checked_sum(occurrences.iter().map(|occurrence| occurrence.budgeted))?;

    Ok(Some(CategorySummaryRow {
        id: category.id,
        name: category.name.to_string(),
        is_income: category.is_income,
        is_group: category.is_group,
        group_id: category.group_id,
        group_category_name: category.group_category_name.clone(),
        total_activity,
        total_budgeted,
        total_balance: checked_sub(total_budgeted, total_activity)?,
        occurrences,
    }))
}
