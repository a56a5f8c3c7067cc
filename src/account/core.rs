use std::{fmt::Display, str::FromStr};

use rusqlite::{Connection, Row, params, types::Type};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    database_id::DatabaseId,
    money::{read_amount, validate_amount},
    user::UserID,
};

/// Database identifier for an account.
pub type AccountId = DatabaseId;

/// The kind of financial account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// Physical cash.
    Cash,
    /// A bank account.
    Debit,
    /// A credit card.
    Credit,
    /// A brokerage or retirement account.
    Investment,
}

impl AccountKind {
    /// The name used when storing the kind in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Cash => "cash",
            AccountKind::Debit => "debit",
            AccountKind::Credit => "credit",
            AccountKind::Investment => "investment",
        }
    }
}

impl Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(AccountKind::Cash),
            "debit" => Ok(AccountKind::Debit),
            "credit" => Ok(AccountKind::Credit),
            "investment" => Ok(AccountKind::Investment),
            other => Err(format!("unknown account kind \"{other}\"")),
        }
    }
}

/// A place money is held, e.g. a bank account or credit card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The name of the account, unique per user.
    pub name: String,
    /// What sort of account this is.
    pub kind: AccountKind,
    /// The balance.
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    /// The bank or provider that holds the account.
    pub institution_name: String,
    /// When the balance was last set.
    pub balance_as_of: Date,
    /// Whether the account's transactions are hidden from clients' totals.
    pub exclude_transactions: bool,
}

/// The data for creating an account.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    /// The account name.
    pub name: String,
    /// What sort of account this is.
    #[serde(alias = "typeName")]
    pub kind: AccountKind,
    /// The opening balance.
    pub balance: Decimal,
    /// The bank or provider that holds the account.
    pub institution_name: String,
}

/// Create an account for `user_id`.
///
/// The balance date is set to today (UTC).
///
/// # Errors
/// Returns an:
/// - [Error::EmptyAccountName] if the name is empty or whitespace,
/// - [Error::DuplicateAccountName] if the user already has an account with that name,
/// - [Error::InvalidAmount] if the balance is larger in magnitude than the largest supported amount,
/// - [Error::SqlError] for any other SQL error.
pub fn create_account(
    user_id: UserID,
    account: NewAccount,
    connection: &Connection,
) -> Result<Account, Error> {
    let name = account.name.trim();

    if name.is_empty() {
        return Err(Error::EmptyAccountName);
    }

    let balance = validate_amount(account.balance)?;

    let now = OffsetDateTime::now_utc();
    let balance_as_of = now.date();

    connection
        .execute(
            "INSERT INTO account (user_id, name, kind, balance, institution_name, balance_as_of,
                exclude_transactions, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?7)",
            params![
                user_id.as_i64(),
                name,
                account.kind.as_str(),
                balance.to_string(),
                account.institution_name,
                balance_as_of,
                now,
            ],
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateAccountName(name.to_owned()),
            error => error.into(),
        })?;

    let id = connection.last_insert_rowid();

    Ok(Account {
        id,
        name: name.to_owned(),
        kind: account.kind,
        balance,
        institution_name: account.institution_name,
        balance_as_of,
        exclude_transactions: false,
    })
}

/// Get all of the user's accounts ordered by name.
pub fn get_all_accounts(user_id: UserID, connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(
            "SELECT id, name, kind, balance, institution_name, balance_as_of, exclude_transactions
            FROM account WHERE user_id = :user_id ORDER BY name ASC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(|error| error.into()))
        .collect()
}

/// Check that `account_id` refers to an account owned by `user_id`.
///
/// # Errors
/// Returns [Error::InvalidAccount] if it does not.
pub fn ensure_account_owned(
    account_id: AccountId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let is_owned: bool = connection.query_row(
        "SELECT EXISTS (SELECT 1 FROM account WHERE id = ?1 AND user_id = ?2)",
        (account_id, user_id.as_i64()),
        |row| row.get(0),
    )?;

    if is_owned {
        Ok(())
    } else {
        Err(Error::InvalidAccount(account_id))
    }
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            balance TEXT NOT NULL,
            institution_name TEXT NOT NULL,
            balance_as_of TEXT NOT NULL,
            exclude_transactions INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(user_id, name),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    let raw_kind: String = row.get(2)?;
    let kind = raw_kind.parse().map_err(|error: String| {
        rusqlite::Error::FromSqlConversionFailure(2, Type::Text, error.into())
    })?;

    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        kind,
        balance: read_amount(row, 3)?,
        institution_name: row.get(4)?,
        balance_as_of: row.get(5)?,
        exclude_transactions: row.get(6)?,
    })
}
