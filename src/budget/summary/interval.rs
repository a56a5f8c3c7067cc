//! Calendar month arithmetic for the budget summary.

use time::{Date, Duration};

/// The first day of the month containing `date`.
pub fn month_start(date: Date) -> Date {
    date - Duration::days(i64::from(date.day()) - 1)
}

/// The first day of the month after the one containing `date`.
///
/// Returns `None` past the last month representable by [Date].
pub fn next_month_start(date: Date) -> Option<Date> {
    month_start(date)
        .checked_add(Duration::days(32))
        .map(month_start)
}

/// The last day of the month containing `date`.
pub fn month_end(date: Date) -> Date {
    next_month_start(date)
        .and_then(Date::previous_day)
        .unwrap_or(Date::MAX)
}

/// The month containing `date` formatted as `YYYY-MM`.
pub fn month_key(date: Date) -> String {
    format!("{:04}-{:02}", date.year(), u8::from(date.month()))
}

/// The first day of every calendar month touched by `start..=end`, ascending.
///
/// The month containing `start` is always included, so an inverted range
/// yields that month alone.
pub fn months_in_range(start: Date, end: Date) -> Vec<Date> {
    let last = month_start(end.max(start));
    let mut current = month_start(start);
    let mut months = vec![current];

    while let Some(next) = next_month_start(current) {
        if next > last {
            break;
        }

        months.push(next);
        current = next;
    }

    months
}
