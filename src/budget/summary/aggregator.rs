//! Sums transaction amounts per category.

use std::ops::RangeInclusive;

use rust_decimal::Decimal;
use time::Date;

use crate::{Error, category::Category, money::checked_sum, transaction::Transaction};

/// The activity of `category` over the dates in `range`.
///
/// Income categories keep the signed sum. Expense categories report the
/// magnitude of the sum, whatever sign the individual amounts were entered with.
///
/// # Errors
/// Returns [Error::AmountOverflow] if the sum cannot be represented.
pub fn category_activity(
    transactions: &[Transaction],
    category: &Category,
    range: &RangeInclusive<Date>,
) -> Result<Decimal, Error> {
    let sum = checked_sum(
        transactions
            .iter()
            .filter(|transaction| {
                transaction.category_id == Some(category.id) && range.contains(&transaction.date)
            })
            .map(|transaction| transaction.amount),
    )?;

    Ok(normalize_sign(sum, category.is_income))
}

/// Keep `sum` as is for income, take its magnitude for expenses.
pub fn normalize_sign(sum: Decimal, is_income: bool) -> Decimal {
    if is_income { sum } else { sum.abs() }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use time::{Date, macros::date};

    use crate::{
        Error,
        category::{Category, CategoryName},
        transaction::Transaction,
    };

    use super::category_activity;

    fn category(id: i64, is_income: bool) -> Category {
        Category {
            id,
            name: CategoryName::new_unchecked("Test"),
            description: None,
            is_income,
            exclude_from_budget: false,
            exclude_from_totals: false,
            is_group: false,
            group_id: None,
            group_category_name: None,
        }
    }

    fn transaction(category_id: Option<i64>, amount: Decimal, date: Date) -> Transaction {
        Transaction {
            id: 0,
            account_id: 1,
            category_id,
            payee_id: None,
            date,
            amount,
            description: String::new(),
        }
    }

    #[test]
    fn expense_activity_is_non_negative() {
        let transactions = vec![
            transaction(Some(1), dec!(-400.00), date!(2025 - 06 - 02)),
            transaction(Some(1), dec!(-50.00), date!(2025 - 06 - 20)),
        ];

        let got = category_activity(
            &transactions,
            &category(1, false),
            &(date!(2025 - 06 - 01)..=date!(2025 - 06 - 30)),
        )
        .unwrap();

        assert_eq!(got, dec!(450.00));
    }

    #[test]
    fn income_activity_keeps_sign() {
        let transactions = vec![
            transaction(Some(2), dec!(3000), date!(2025 - 06 - 01)),
            transaction(Some(2), dec!(-3500), date!(2025 - 06 - 15)),
        ];

        let got = category_activity(
            &transactions,
            &category(2, true),
            &(date!(2025 - 06 - 01)..=date!(2025 - 06 - 30)),
        )
        .unwrap();

        assert_eq!(got, dec!(-500));
    }

    #[test]
    fn mixed_signs_are_summed_before_normalizing() {
        let transactions = vec![
            transaction(Some(1), dec!(-100), date!(2025 - 06 - 02)),
            transaction(Some(1), dec!(30), date!(2025 - 06 - 03)),
        ];

        let got = category_activity(
            &transactions,
            &category(1, false),
            &(date!(2025 - 06 - 01)..=date!(2025 - 06 - 30)),
        )
        .unwrap();

        assert_eq!(got, dec!(70));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let transactions = vec![
            transaction(Some(1), dec!(-1), date!(2025 - 05 - 31)),
            transaction(Some(1), dec!(-2), date!(2025 - 06 - 01)),
            transaction(Some(1), dec!(-4), date!(2025 - 06 - 30)),
            transaction(Some(1), dec!(-8), date!(2025 - 07 - 01)),
            transaction(None, dec!(-16), date!(2025 - 06 - 15)),
            transaction(Some(9), dec!(-32), date!(2025 - 06 - 15)),
        ];

        let got = category_activity(
            &transactions,
            &category(1, false),
            &(date!(2025 - 06 - 01)..=date!(2025 - 06 - 30)),
        )
        .unwrap();

        assert_eq!(got, dec!(6));
    }

    #[test]
    fn many_cents_sum_exactly() {
        let transactions: Vec<_> = (0..1000)
            .map(|_| transaction(Some(1), dec!(-0.10), date!(2025 - 06 - 10)))
            .collect();

        let got = category_activity(
            &transactions,
            &category(1, false),
            &(date!(2025 - 06 - 01)..=date!(2025 - 06 - 30)),
        )
        .unwrap();

        assert_eq!(got, dec!(100.00));
    }

    #[test]
    fn overflowing_sum_is_an_error() {
        let transactions = vec![
            transaction(Some(1), dec!(-50000000000000000000000000000), date!(2025 - 06 - 02)),
            transaction(Some(1), dec!(-50000000000000000000000000000), date!(2025 - 06 - 03)),
        ];

        let got = category_activity(
            &transactions,
            &category(1, false),
            &(date!(2025 - 06 - 01)..=date!(2025 - 06 - 30)),
        );

        assert_eq!(got, Err(Error::AmountOverflow));
    }
}
