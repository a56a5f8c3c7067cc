//! The audit trail of changes made to transactions.

use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, Row, types::Type};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::DatabaseId,
    transaction::{TransactionId, get_transaction},
    user::UserID,
};

/// Who or what made a change.
pub const USER_SOURCE: &str = "user";

/// The details of a transaction being created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationNote {
    /// How the transaction was created.
    pub descriptor: String,
    /// Who or what created it, see [USER_SOURCE].
    pub source: String,
    /// The display name of the user who created it.
    pub actor_name: String,
}

impl CreationNote {
    /// A transaction entered by hand by `actor_name`.
    pub fn manual(actor_name: &str) -> Self {
        Self {
            descriptor: "Manual transaction".to_owned(),
            source: USER_SOURCE.to_owned(),
            actor_name: actor_name.to_owned(),
        }
    }
}

/// The details of a single field of a transaction being changed.
///
/// Values are recorded as text, a missing value is recorded as `"null"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    /// The name of the field in the API, e.g. "categoryId".
    pub field: String,
    /// The value before the change.
    pub old_value: String,
    /// The value after the change.
    pub new_value: String,
    /// Who or what made the change, see [USER_SOURCE].
    pub source: String,
    /// The display name of the user who made the change.
    pub actor_name: String,
    /// The name of the category or payee `old_value` refers to.
    ///
    /// Only filled in when reading history, never stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value_name: Option<String>,
    /// The name of the category or payee `new_value` refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value_name: Option<String>,
}

/// Something that happened to a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "details", rename_all = "lowercase")]
pub enum HistoryEvent {
    /// The transaction was created.
    Created(CreationNote),
    /// A field of the transaction was changed.
    Updated(FieldChange),
}

impl HistoryEvent {
    fn action(&self) -> &'static str {
        match self {
            HistoryEvent::Created(_) => "created",
            HistoryEvent::Updated(_) => "updated",
        }
    }

    fn details_json(&self) -> Result<String, serde_json::Error> {
        match self {
            HistoryEvent::Created(note) => serde_json::to_string(note),
            HistoryEvent::Updated(change) => serde_json::to_string(change),
        }
    }
}

/// An entry in a transaction's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// The ID of the entry.
    pub id: DatabaseId,
    /// The transaction the entry is about.
    pub transaction_id: TransactionId,
    /// What happened.
    #[serde(flatten)]
    pub event: HistoryEvent,
    /// When it happened.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Append `event` to the history of `transaction_id`.
pub fn record_history(
    transaction_id: TransactionId,
    user_id: UserID,
    event: &HistoryEvent,
    timestamp: OffsetDateTime,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO transaction_history (transaction_id, user_id, action, details, timestamp)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            transaction_id,
            user_id.as_i64(),
            event.action(),
            event.details_json()?,
            timestamp,
        ),
    )?;

    Ok(())
}

/// Get the history of one of the user's transactions, newest first.
///
/// Changes to the category or payee get the names of the old and new
/// records, or `(ID: n)` if the record no longer exists.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not belong to the user.
pub fn get_transaction_history(
    transaction_id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<HistoryEntry>, Error> {
    get_transaction(transaction_id, user_id, connection)?;

    let mut entries = connection
        .prepare(
            "SELECT id, transaction_id, action, details, timestamp FROM transaction_history
            WHERE transaction_id = ?1 AND user_id = ?2
            ORDER BY timestamp DESC, id DESC",
        )?
        .query_map((transaction_id, user_id.as_i64()), map_history_row)?
        .collect::<Result<Vec<_>, rusqlite::Error>>()?;

    let mut name_cache = HashMap::new();

    for entry in &mut entries {
        let HistoryEvent::Updated(change) = &mut entry.event else {
            continue;
        };

        let table = match change.field.as_str() {
            "categoryId" => "category",
            "payeeId" => "payee",
            _ => continue,
        };

        change.old_value_name =
            lookup_name(table, &change.old_value, user_id, &mut name_cache, connection)?;
        change.new_value_name =
            lookup_name(table, &change.new_value, user_id, &mut name_cache, connection)?;
    }

    Ok(entries)
}

fn lookup_name(
    table: &'static str,
    raw_id: &str,
    user_id: UserID,
    cache: &mut HashMap<(&'static str, DatabaseId), String>,
    connection: &Connection,
) -> Result<Option<String>, Error> {
    let Ok(id) = raw_id.parse::<DatabaseId>() else {
        return Ok(None);
    };

    if let Some(name) = cache.get(&(table, id)) {
        return Ok(Some(name.clone()));
    }

    let name = connection
        .query_row(
            &format!("SELECT name FROM {table} WHERE id = ?1 AND user_id = ?2"),
            (id, user_id.as_i64()),
            |row| row.get::<_, String>(0),
        )
        .optional()?
        .unwrap_or_else(|| format!("(ID: {id})"));

    cache.insert((table, id), name.clone());

    Ok(Some(name))
}

/// Create the transaction history table.
pub fn create_transaction_history_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS transaction_history (
            id INTEGER PRIMARY KEY,
            transaction_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            action TEXT NOT NULL,
            details TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            FOREIGN KEY(transaction_id) REFERENCES \"transaction\"(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_history_transaction
            ON transaction_history(transaction_id);",
    )?;

    Ok(())
}

fn map_history_row(row: &Row) -> Result<HistoryEntry, rusqlite::Error> {
    let action: String = row.get(2)?;
    let details: String = row.get(3)?;

    let event = match action.as_str() {
        "created" => serde_json::from_str(&details).map(HistoryEvent::Created),
        "updated" => serde_json::from_str(&details).map(HistoryEvent::Updated),
        other => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                2,
                Type::Text,
                format!("unknown history action \"{other}\"").into(),
            ));
        }
    }
    .map_err(|error| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(error)))?;

    Ok(HistoryEntry {
        id: row.get(0)?,
        transaction_id: row.get(1)?,
        event,
        timestamp: row.get(4)?,
    })
}
