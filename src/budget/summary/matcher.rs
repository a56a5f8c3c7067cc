//! Finds the budget allocated to a category for a month.

use rust_decimal::Decimal;
use time::Date;

use crate::{Error, budget::BudgetAllocation, category::CategoryId, money::checked_sum};

/// The total allocated to `category_id` for the month containing `month`.
///
/// Allocations are matched on the year and month of their start date rather
/// than the exact date. Every match is summed, there is no assumption that
/// at most one allocation exists per month.
///
/// # Errors
/// Returns [Error::AmountOverflow] if the total cannot be represented.
pub fn budgeted_for_month(
    budgets: &[BudgetAllocation],
    category_id: CategoryId,
    month: Date,
) -> Result<Decimal, Error> {
    checked_sum(
        budgets
            .iter()
            .filter(|budget| {
                budget.category_id == category_id && same_month(budget.start_date, month)
            })
            .map(|budget| budget.amount),
    )
}

fn same_month(left: Date, right: Date) -> bool {
    left.year() == right.year() && left.month() == right.month()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use time::{Date, macros::date};

    use crate::budget::BudgetAllocation;

    use super::budgeted_for_month;

    fn allocation(id: i64, category_id: i64, amount: Decimal, start_date: Date) -> BudgetAllocation {
        BudgetAllocation {
            id,
            category_id,
            amount,
            start_date,
            end_date: start_date,
        }
    }

    #[test]
    fn matches_on_year_and_month() {
        let budgets = vec![allocation(1, 7, dec!(2000.00), date!(2025 - 06 - 15))];

        let got = budgeted_for_month(&budgets, 7, date!(2025 - 06 - 01)).unwrap();

        assert_eq!(got, dec!(2000.00));
    }

    #[test]
    fn ignores_other_categories_and_months() {
        let budgets = vec![
            allocation(1, 7, dec!(100), date!(2025 - 05 - 01)),
            allocation(2, 8, dec!(200), date!(2025 - 06 - 01)),
            allocation(3, 7, dec!(300), date!(2024 - 06 - 01)),
        ];

        let got = budgeted_for_month(&budgets, 7, date!(2025 - 06 - 01)).unwrap();

        assert_eq!(got, Decimal::ZERO);
    }

    #[test]
    fn sums_duplicate_allocations() {
        let budgets = vec![
            allocation(1, 7, dec!(100.10), date!(2025 - 06 - 01)),
            allocation(2, 7, dec!(50.05), date!(2025 - 06 - 30)),
        ];

        let got = budgeted_for_month(&budgets, 7, date!(2025 - 06 - 01)).unwrap();

        assert_eq!(got, dec!(150.15));
    }
}
