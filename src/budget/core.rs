//! Monthly budget allocations and their storage.

use std::ops::RangeInclusive;

use rusqlite::{Connection, Row, Transaction as SqlTransaction, TransactionBehavior, params};
use rust_decimal::Decimal;
use serde::Serialize;
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    budget::summary::interval::{month_end, month_start},
    category::{CategoryId, ensure_category_owned},
    database_id::DatabaseId,
    money::{read_amount, validate_amount},
    user::UserID,
};

/// Database identifier for a budget allocation.
pub type BudgetId = DatabaseId;

/// A planned amount for a category in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAllocation {
    /// The ID of the allocation.
    pub id: BudgetId,
    /// The category the budget is for.
    pub category_id: CategoryId,
    /// The planned amount.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// The first day of the month.
    pub start_date: Date,
    /// The last day of the month.
    pub end_date: Date,
}

/// Whether an upsert inserted a new allocation or changed an existing one.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    /// No allocation existed for the category and month.
    Created(BudgetAllocation),
    /// The existing allocation's amount was replaced.
    Updated(BudgetAllocation),
}

impl UpsertOutcome {
    /// The allocation as stored after the upsert.
    pub fn allocation(&self) -> &BudgetAllocation {
        match self {
            UpsertOutcome::Created(allocation) | UpsertOutcome::Updated(allocation) => allocation,
        }
    }
}

/// Set the budget of `category_id` for the month containing `month` to `amount`.
///
/// The month is normalised to its first and last day. At most one
/// allocation exists per user, category and month: the existence check and
/// the write happen in one immediate SQLite transaction and the write is an
/// `INSERT .. ON CONFLICT DO UPDATE` on that key.
///
/// # Errors
/// Returns an:
/// - [Error::InvalidAmount] if the amount is larger in magnitude than the largest supported amount,
/// - [Error::InvalidCategory] if the category does not belong to `user_id`,
/// - [Error::SqlError] if there is some other SQL error.
pub fn upsert_budget(
    user_id: UserID,
    category_id: CategoryId,
    amount: Decimal,
    month: Date,
    connection: &Connection,
) -> Result<UpsertOutcome, Error> {
    let amount = validate_amount(amount)?;
    let start_date = month_start(month);
    let end_date = month_end(month);

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    ensure_category_owned(category_id, user_id, &transaction)?;

    let exists: bool = transaction.query_row(
        "SELECT EXISTS (
            SELECT 1 FROM budget WHERE user_id = ?1 AND category_id = ?2 AND start_date = ?3
        )",
        params![user_id.as_i64(), category_id, start_date],
        |row| row.get(0),
    )?;

    let now = OffsetDateTime::now_utc();
    let allocation = transaction
        .prepare(
            "INSERT INTO budget (user_id, category_id, amount, start_date, end_date, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT(user_id, category_id, start_date) DO UPDATE SET
                amount = excluded.amount,
                end_date = excluded.end_date,
                updated_at = excluded.updated_at
            RETURNING id, category_id, amount, start_date, end_date",
        )?
        .query_row(
            params![
                user_id.as_i64(),
                category_id,
                amount.to_string(),
                start_date,
                end_date,
                now
            ],
            map_budget_row,
        )?;

    transaction.commit()?;

    if exists {
        tracing::debug!(
            "Updated the budget for category {category_id} in {start_date} to {amount}."
        );
        Ok(UpsertOutcome::Updated(allocation))
    } else {
        tracing::debug!(
            "Created a budget for category {category_id} in {start_date} of {amount}."
        );
        Ok(UpsertOutcome::Created(allocation))
    }
}

/// Get the user's allocations whose month overlaps `range`.
pub fn get_budgets_overlapping(
    user_id: UserID,
    range: &RangeInclusive<Date>,
    connection: &Connection,
) -> Result<Vec<BudgetAllocation>, Error> {
    connection
        .prepare(
            "SELECT id, category_id, amount, start_date, end_date FROM budget
            WHERE user_id = ?1 AND start_date <= ?2 AND end_date >= ?3
            ORDER BY start_date ASC, category_id ASC",
        )?
        .query_map(
            params![user_id.as_i64(), range.end(), range.start()],
            map_budget_row,
        )?
        .map(|maybe_budget| maybe_budget.map_err(|error| error.into()))
        .collect()
}

/// Create the budget table.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            amount TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(user_id, category_id, start_date),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_budget_user_dates ON budget(user_id, start_date, end_date);",
    )?;

    Ok(())
}

fn map_budget_row(row: &Row) -> Result<BudgetAllocation, rusqlite::Error> {
    Ok(BudgetAllocation {
        id: row.get(0)?,
        category_id: row.get(1)?,
        amount: read_amount(row, 2)?,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
    })
}
