//! Typed single-field updates to transactions.

use rusqlite::{Connection, ToSql};
use rust_decimal::Decimal;
use serde::Deserialize;
use time::{Date, OffsetDateTime};

use crate::{
    Error, User,
    account::{AccountId, ensure_account_owned},
    category::{CategoryId, ensure_category_owned},
    date_range::deserialize_date,
    money::validate_amount,
    transaction::{
        RecordRef, Transaction, TransactionId,
        core::resolve_payee,
        get_transaction,
        history::{FieldChange, HistoryEvent, USER_SOURCE, record_history},
    },
};

/// A change to one field of a transaction.
///
/// In JSON this is `{"field": "<name>", "value": <value>}`, e.g.
/// `{"field": "amount", "value": -12.5}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum TransactionUpdate {
    /// Set the amount.
    Amount(Decimal),
    /// Set the date, `YYYY-MM-DD`.
    Date(#[serde(deserialize_with = "deserialize_date")] Date),
    /// Set the description.
    Description(String),
    /// Move the transaction to one of the user's categories.
    CategoryId(CategoryId),
    /// Set the payee to an existing payee or one found or created by name.
    PayeeId(RecordRef),
    /// Move the transaction to one of the user's accounts.
    AccountId(AccountId),
}

impl TransactionUpdate {
    fn field_name(&self) -> &'static str {
        match self {
            TransactionUpdate::Amount(_) => "amount",
            TransactionUpdate::Date(_) => "date",
            TransactionUpdate::Description(_) => "description",
            TransactionUpdate::CategoryId(_) => "categoryId",
            TransactionUpdate::PayeeId(_) => "payeeId",
            TransactionUpdate::AccountId(_) => "accountId",
        }
    }
}

/// The resolved column, new value and text of old and new values for history.
struct ResolvedUpdate {
    column: &'static str,
    value: Box<dyn ToSql>,
    old_value: String,
    new_value: String,
}

/// Apply `update` to one of `user`'s transactions.
///
/// The update and its history entry are written in one SQLite transaction,
/// so either both are stored or neither is.
///
/// # Errors
/// This function will return an:
/// - [Error::UpdateMissingTransaction] if the transaction does not belong to the user,
/// - [Error::InvalidCategory], [Error::InvalidPayee] or [Error::InvalidAccount] if the new
///   value refers to a record that does not belong to the user,
/// - [Error::InvalidAmount] if a new amount is larger in magnitude than the largest supported amount,
/// - [Error::SqlError] if there is some other SQL error.
pub fn update_transaction_field(
    transaction_id: TransactionId,
    user: &User,
    update: TransactionUpdate,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let current = match get_transaction(transaction_id, user.id, &sql_transaction) {
        Ok(transaction) => transaction,
        Err(Error::NotFound) => return Err(Error::UpdateMissingTransaction),
        Err(error) => return Err(error),
    };

    let field = update.field_name();
    let resolved = resolve_update(&current, user, update, &sql_transaction)?;

    let now = OffsetDateTime::now_utc();
    sql_transaction.execute(
        &format!(
            "UPDATE \"transaction\" SET {} = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4",
            resolved.column
        ),
        (&resolved.value, now, transaction_id, user.id.as_i64()),
    )?;

    record_history(
        transaction_id,
        user.id,
        &HistoryEvent::Updated(FieldChange {
            field: field.to_owned(),
            old_value: resolved.old_value,
            new_value: resolved.new_value,
            source: USER_SOURCE.to_owned(),
            actor_name: user.name.clone(),
            old_value_name: None,
            new_value_name: None,
        }),
        now,
        &sql_transaction,
    )?;

    sql_transaction.commit()?;

    get_transaction(transaction_id, user.id, connection)
}

fn resolve_update(
    current: &Transaction,
    user: &User,
    update: TransactionUpdate,
    connection: &Connection,
) -> Result<ResolvedUpdate, Error> {
    let resolved = match update {
        TransactionUpdate::Amount(amount) => {
            let amount = validate_amount(amount)?;

            ResolvedUpdate {
                column: "amount",
                value: Box::new(amount.to_string()),
                old_value: current.amount.to_string(),
                new_value: amount.to_string(),
            }
        }
        TransactionUpdate::Date(date) => ResolvedUpdate {
            column: "date",
            value: Box::new(date),
            old_value: current.date.to_string(),
            new_value: date.to_string(),
        },
        TransactionUpdate::Description(description) => ResolvedUpdate {
            column: "description",
            old_value: current.description.clone(),
            new_value: description.clone(),
            value: Box::new(description),
        },
        TransactionUpdate::CategoryId(category_id) => {
            ensure_category_owned(category_id, user.id, connection)?;

            ResolvedUpdate {
                column: "category_id",
                value: Box::new(category_id),
                old_value: optional_id_text(current.category_id),
                new_value: category_id.to_string(),
            }
        }
        TransactionUpdate::PayeeId(payee) => {
            let payee_id = resolve_payee(user.id, payee, connection)?;

            ResolvedUpdate {
                column: "payee_id",
                value: Box::new(payee_id),
                old_value: optional_id_text(current.payee_id),
                new_value: payee_id.to_string(),
            }
        }
        TransactionUpdate::AccountId(account_id) => {
            ensure_account_owned(account_id, user.id, connection)?;

            ResolvedUpdate {
                column: "account_id",
                value: Box::new(account_id),
                old_value: current.account_id.to_string(),
                new_value: account_id.to_string(),
            }
        }
    };

    Ok(resolved)
}

fn optional_id_text(id: Option<i64>) -> String {
    id.map_or_else(|| "null".to_owned(), |id| id.to_string())
}
