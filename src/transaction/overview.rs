//! Income, expense and savings totals for a date range.

use std::ops::RangeInclusive;

use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    category::{Category, CategoryId},
    money::{checked_add, checked_sub, checked_sum},
    transaction::Transaction,
};

/// Totals for the transactions in a date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewSummary {
    /// The signed sum over income categories.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_income: Decimal,
    /// The magnitude of the signed sum over all expense categories.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_expenses: Decimal,
    /// Income minus expenses.
    #[serde(with = "rust_decimal::serde::float")]
    pub net_income: Decimal,
    /// Always zero, there are no scheduled transactions to project from.
    #[serde(with = "rust_decimal::serde::float")]
    pub projected_net_income: Decimal,
    /// Net income as a percentage of income, rounded to two places.
    #[serde(with = "rust_decimal::serde::float")]
    pub current_savings_rate: Decimal,
    /// Spending per expense category, largest first.
    pub expenses_by_category: Vec<CategoryExpense>,
}

/// The spending in one expense category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryExpense {
    /// The category's ID.
    pub category_id: CategoryId,
    /// The category's name.
    pub category_name: String,
    /// The spending as a magnitude.
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// Summarize `transactions` dated within `range` by the kind of their category.
///
/// Transactions without a known category are not counted. Refunds in one
/// expense category offset spending in the others before the magnitude of
/// `total_expenses` is taken.
///
/// # Errors
/// Returns [Error::AmountOverflow] if any total cannot be represented.
pub fn compute_overview(
    range: &RangeInclusive<Date>,
    categories: &[Category],
    transactions: &[Transaction],
) -> Result<OverviewSummary, Error> {
    let mut total_income = Decimal::ZERO;
    let mut expense_sum = Decimal::ZERO;
    let mut expenses_by_category = Vec::new();

    for category in categories {
        let mut amounts = transactions
            .iter()
            .filter(|transaction| {
                transaction.category_id == Some(category.id) && range.contains(&transaction.date)
            })
            .map(|transaction| transaction.amount)
            .peekable();

        if amounts.peek().is_none() {
            continue;
        }

        let sum = checked_sum(amounts)?;

        if category.is_income {
            total_income = checked_add(total_income, sum)?;
        } else {
            expense_sum = checked_add(expense_sum, sum)?;
            expenses_by_category.push(CategoryExpense {
                category_id: category.id,
                category_name: category.name.to_string(),
                total: sum.abs(),
            });
        }
    }

    expenses_by_category.sort_by(|a, b| b.total.cmp(&a.total));

    let total_expenses = expense_sum.abs();
    let net_income = checked_sub(total_income, total_expenses)?;

    Ok(OverviewSummary {
        total_income,
        total_expenses,
        net_income,
        projected_net_income: Decimal::ZERO,
        current_savings_rate: savings_rate(net_income, total_income)?,
        expenses_by_category,
    })
}

fn savings_rate(net_income: Decimal, total_income: Decimal) -> Result<Decimal, Error> {
    if total_income <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }

    net_income
        .checked_div(total_income)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|rate| rate.round_dp(2))
        .ok_or(Error::AmountOverflow)
}
