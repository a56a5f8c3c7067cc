//! Exact decimal handling for monetary amounts.
//!
//! Amounts are stored as TEXT holding the exact decimal string so that sums
//! over many rows do not pick up binary floating point error. A malformed
//! stored amount is read as zero so that one bad row cannot block a summary.

use std::str::FromStr;

use rusqlite::{Row, types::Value};
use rust_decimal::Decimal;

use crate::Error;

/// The largest magnitude accepted for a single amount, one quadrillion.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Check that `amount` is no larger in magnitude than [MAX_AMOUNT].
///
/// # Errors
/// Returns [Error::InvalidAmount] if it is.
pub fn validate_amount(amount: Decimal) -> Result<Decimal, Error> {
    if amount.abs() > MAX_AMOUNT {
        return Err(Error::InvalidAmount(amount.to_string()));
    }

    Ok(amount)
}

/// Add up `amounts` without overflowing.
///
/// # Errors
/// Returns [Error::AmountOverflow] if the total cannot be represented.
pub fn checked_sum<I>(amounts: I) -> Result<Decimal, Error>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, amount| checked_add(total, amount))
}

/// `left + right`, or [Error::AmountOverflow].
pub fn checked_add(left: Decimal, right: Decimal) -> Result<Decimal, Error> {
    left.checked_add(right).ok_or(Error::AmountOverflow)
}

/// `left - right`, or [Error::AmountOverflow].
pub fn checked_sub(left: Decimal, right: Decimal) -> Result<Decimal, Error> {
    left.checked_sub(right).ok_or(Error::AmountOverflow)
}

/// Parse `raw` as an exact decimal, falling back to zero.
///
/// Plain decimal notation and scientific notation are accepted. Anything
/// else is logged and read as [Decimal::ZERO].
pub fn parse_amount(raw: &str) -> Decimal {
    let trimmed = raw.trim();

    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .unwrap_or_else(|error| {
            tracing::warn!("could not parse the amount \"{raw}\", treating it as zero: {error}");
            Decimal::ZERO
        })
}

/// Read the amount in column `index` of `row`.
///
/// TEXT is parsed with [parse_amount]. INTEGER and REAL values written by
/// other tools are converted, NULL and BLOB values are read as zero.
pub fn read_amount(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let amount = match row.get::<_, Value>(index)? {
        Value::Text(text) => parse_amount(&text),
        Value::Integer(integer) => Decimal::from(integer),
        Value::Real(real) => Decimal::try_from(real).unwrap_or_else(|error| {
            tracing::warn!("could not convert the amount {real}, treating it as zero: {error}");
            Decimal::ZERO
        }),
        Value::Null | Value::Blob(_) => {
            tracing::warn!("found an amount that is not a number, treating it as zero");
            Decimal::ZERO
        }
    };

    Ok(amount)
}
