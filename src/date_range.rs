//! Validation of `YYYY-MM-DD` dates and the date range query shared by the
//! summary endpoints.

use std::ops::RangeInclusive;

use serde::{Deserialize, Deserializer, Serialize};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::Error;

const ISO_DATE: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// Parse a date in the format `YYYY-MM-DD`.
///
/// # Errors
/// Returns [Error::InvalidDateFormat] if `raw` does not match the format or
/// is not a real calendar date, e.g. "2025-02-30".
pub fn parse_date(raw: &str) -> Result<Date, Error> {
    if raw.len() != 10 {
        return Err(Error::InvalidDateFormat(raw.to_owned()));
    }

    Date::parse(raw, ISO_DATE).map_err(|_| Error::InvalidDateFormat(raw.to_owned()))
}

/// Deserialize a `YYYY-MM-DD` string field with the same rules as [parse_date].
pub fn deserialize_date<'de, D>(deserializer: D) -> Result<Date, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;

    parse_date(&raw).map_err(serde::de::Error::custom)
}

/// The query string for endpoints that report on a date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRangeQuery {
    /// The first day of the range, inclusive.
    pub start_date: String,
    /// The last day of the range, inclusive.
    pub end_date: String,
}

impl DateRangeQuery {
    /// Validate both dates and convert the query into an inclusive range.
    ///
    /// The range is not reordered, an end date before the start date is
    /// passed on as is.
    ///
    /// # Errors
    /// Returns [Error::InvalidDateFormat] for the first date that is invalid.
    pub fn parse(&self) -> Result<RangeInclusive<Date>, Error> {
        let start = parse_date(&self.start_date)?;
        let end = parse_date(&self.end_date)?;

        Ok(start..=end)
    }
}
