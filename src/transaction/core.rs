//! Defines the core data models and database queries for transactions.

use std::ops::RangeInclusive;

use rusqlite::{Connection, Row, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error, User,
    account::{AccountId, ensure_account_owned},
    category::{CategoryId, CategoryName, ensure_category_owned, get_or_create_category},
    database_id::DatabaseId,
    date_range::deserialize_date,
    money::{read_amount, validate_amount},
    payee::{PayeeId, ensure_payee_owned, get_or_create_payee},
    transaction::history::{CreationNote, HistoryEvent, record_history},
    user::UserID,
};

// ============================================================================
// MODELS
// ============================================================================

/// Database identifier for a transaction.
pub type TransactionId = DatabaseId;

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The account the money moved in or out of.
    pub account_id: AccountId,
    /// The category of the transaction, `None` if uncategorized.
    pub category_id: Option<CategoryId>,
    /// Who the money was paid to or received from.
    pub payee_id: Option<PayeeId>,
    /// When the transaction happened.
    pub date: Date,
    /// The amount of money spent or earned in this transaction.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// A text description of what the transaction was for.
    pub description: String,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(amount: Decimal, date: Date, account_id: AccountId) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            date,
            account_id,
            description: String::new(),
            category: None,
            payee: None,
        }
    }
}

/// A reference to a category or payee by ID, or by name.
///
/// A name refers to the user's record with that name, which is created if it
/// does not exist yet. In JSON, numbers are IDs and strings are names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordRef {
    /// An existing record.
    Id(DatabaseId),
    /// A record that is looked up, or created, by name.
    Name(String),
}

/// A builder for creating [Transaction] instances.
///
/// # Examples
///
/// ```ignore
/// use rust_decimal_macros::dec;
/// use time::macros::date;
///
/// let builder = Transaction::build(dec!(-45.99), date!(2025 - 01 - 15), account.id)
///     .description("Coffee")
///     .category(RecordRef::Name("Eating out".to_owned()))
///     .payee(RecordRef::Id(payee.id));
/// let transaction = create_transaction(&user, builder, &connection)?;
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The monetary amount of the transaction.
    ///
    /// Income is usually entered as a positive amount and expenses as a
    /// negative amount, but nothing relies on it.
    pub amount: Decimal,

    /// The date when the transaction occurred.
    pub date: Date,

    /// The account the money moved in or out of.
    pub account_id: AccountId,

    /// A human-readable description of the transaction.
    pub description: String,

    /// The category of the transaction, e.g. "Groceries", "Transport", "Rent".
    pub category: Option<RecordRef>,

    /// Who the money was paid to or received from.
    pub payee: Option<RecordRef>,
}

impl TransactionBuilder {
    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Set the category for the transaction.
    pub fn category(mut self, category: RecordRef) -> Self {
        self.category = Some(category);
        self
    }

    /// Set the payee for the transaction.
    pub fn payee(mut self, payee: RecordRef) -> Self {
        self.payee = Some(payee);
        self
    }
}

/// The request body for creating a transaction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransactionPayload {
    /// `YYYY-MM-DD`.
    #[serde(deserialize_with = "deserialize_date")]
    pub date: Date,
    /// An existing category ID or the name of a category.
    pub category_id: RecordRef,
    /// An existing payee ID or the name of a payee.
    pub payee_id: RecordRef,
    /// The account the money moved in or out of.
    pub account_id: AccountId,
    /// A JSON number or numeric string.
    pub amount: Decimal,
    /// Defaults to an empty string.
    #[serde(default)]
    pub description: String,
}

impl From<NewTransactionPayload> for TransactionBuilder {
    fn from(payload: NewTransactionPayload) -> Self {
        Transaction::build(payload.amount, payload.date, payload.account_id)
            .description(&payload.description)
            .category(payload.category_id)
            .payee(payload.payee_id)
    }
}

/// The name of a category or payee joined onto a transaction listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedRecord {
    /// The record's ID.
    pub id: DatabaseId,
    /// The record's name.
    pub name: String,
}

/// A transaction as shown in a list, with the names of its payee and category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListing {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// When the transaction happened.
    pub date: Date,
    /// The amount of money spent or earned.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// What the transaction was for.
    pub description: String,
    /// The payee, if any.
    pub payee: Option<NamedRecord>,
    /// The category, if any.
    pub category: Option<NamedRecord>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str =
    "id, account_id, category_id, payee_id, date, amount, description";

/// Create a new transaction for `user` from a builder.
///
/// Categories and payees given by name are looked up or created. The
/// transaction and its "created" history entry are written in a single
/// SQLite transaction.
///
/// # Errors
/// This function will return an:
/// - [Error::InvalidAccount], [Error::InvalidCategory] or [Error::InvalidPayee] if an ID does
///   not refer to one of the user's records,
/// - [Error::EmptyCategoryName] or [Error::EmptyPayeeName] for an empty name,
/// - [Error::InvalidAmount] if the amount is larger in magnitude than the largest supported amount,
/// - [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user: &User,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let amount = validate_amount(builder.amount)?;

    let sql_transaction = connection.unchecked_transaction()?;

    ensure_account_owned(builder.account_id, user.id, &sql_transaction)?;

    let category_id = match builder.category {
        Some(RecordRef::Id(category_id)) => {
            ensure_category_owned(category_id, user.id, &sql_transaction)?;
            Some(category_id)
        }
        Some(RecordRef::Name(name)) => {
            let name = CategoryName::new(&name)?;
            Some(get_or_create_category(user.id, name, &sql_transaction)?.id)
        }
        None => None,
    };

    let payee_id = match builder.payee {
        Some(payee) => Some(resolve_payee(user.id, payee, &sql_transaction)?),
        None => None,
    };

    let now = OffsetDateTime::now_utc();
    let transaction = sql_transaction
        .prepare(&format!(
            "INSERT INTO \"transaction\"
                (user_id, account_id, category_id, payee_id, date, amount, description, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            params![
                user.id.as_i64(),
                builder.account_id,
                category_id,
                payee_id,
                builder.date,
                amount.to_string(),
                builder.description,
                now,
            ],
            map_transaction_row,
        )?;

    record_history(
        transaction.id,
        user.id,
        &HistoryEvent::Created(CreationNote::manual(&user.name)),
        now,
        &sql_transaction,
    )?;

    sql_transaction.commit()?;

    Ok(transaction)
}

/// Resolve a payee reference to the ID of one of the user's payees.
pub(crate) fn resolve_payee(
    user_id: UserID,
    payee: RecordRef,
    connection: &Connection,
) -> Result<PayeeId, Error> {
    match payee {
        RecordRef::Id(payee_id) => {
            ensure_payee_owned(payee_id, user_id, connection)?;
            Ok(payee_id)
        }
        RecordRef::Name(name) => Ok(get_or_create_payee(user_id, &name, connection)?.id),
    }
}

/// Retrieve one of the user's transactions by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to one of the user's transactions,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id AND user_id = :user_id"
        ))?
        .query_one(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Get the user's transactions dated within `range`, oldest first.
pub fn get_transactions_in_range(
    user_id: UserID,
    range: &RangeInclusive<Date>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
            WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
            ORDER BY date ASC, id ASC"
        ))?
        .query_map(
            params![user_id.as_i64(), range.start(), range.end()],
            map_transaction_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// List the user's transactions dated within `range`, newest first.
///
/// Transactions without a category or payee are included with `None` for
/// the missing record.
pub fn get_transaction_listings(
    user_id: UserID,
    range: &RangeInclusive<Date>,
    connection: &Connection,
) -> Result<Vec<TransactionListing>, Error> {
    connection
        .prepare(
            "SELECT t.id, t.date, t.amount, t.description, p.id, p.name, c.id, c.name
            FROM \"transaction\" t
            LEFT JOIN payee p ON p.id = t.payee_id
            LEFT JOIN category c ON c.id = t.category_id
            WHERE t.user_id = ?1 AND t.date BETWEEN ?2 AND ?3
            ORDER BY t.date DESC, t.id DESC",
        )?
        .query_map(
            params![user_id.as_i64(), range.start(), range.end()],
            map_listing_row,
        )?
        .map(|maybe_listing| maybe_listing.map_err(|error| error.into()))
        .collect()
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                account_id INTEGER NOT NULL,
                category_id INTEGER,
                payee_id INTEGER,
                date TEXT NOT NULL,
                amount TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL,
                FOREIGN KEY(payee_id) REFERENCES payee(id) ON UPDATE CASCADE ON DELETE SET NULL
                )",
        (),
    )?;

    // Used by the date range queries behind the summaries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

pub(crate) fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        account_id: row.get(1)?,
        category_id: row.get(2)?,
        payee_id: row.get(3)?,
        date: row.get(4)?,
        amount: read_amount(row, 5)?,
        description: row.get(6)?,
    })
}

fn map_listing_row(row: &Row) -> Result<TransactionListing, rusqlite::Error> {
    let named_record = |id_index: usize, name_index: usize| -> Result<_, rusqlite::Error> {
        let id: Option<DatabaseId> = row.get(id_index)?;
        let name: Option<String> = row.get(name_index)?;

        Ok(id.zip(name).map(|(id, name)| NamedRecord { id, name }))
    };

    Ok(TransactionListing {
        id: row.get(0)?,
        date: row.get(1)?,
        amount: read_amount(row, 2)?,
        description: row.get(3)?,
        payee: named_record(4, 5)?,
        category: named_record(6, 7)?,
    })
}

#[cfg(test)]
mod create_transaction_tests {
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error,
        category::get_all_categories,
        payee::get_all_payees,
        test_utils::{
            get_test_connection, must_create_account, must_create_category, must_create_user,
        },
        transaction::history::{HistoryEvent, get_transaction_history},
    };

    use super::{RecordRef, Transaction, create_transaction, get_transaction};

    #[test]
    fn create_with_ids_succeeds() {
        let connection = get_test_connection();
        let user = must_create_user("Ana", &connection);
        let account = must_create_account(&user, "Everyday", &connection);
        let category = must_create_category(&user, "Groceries", false, &connection);

        let transaction = create_transaction(
            &user,
            Transaction::build(dec!(-42.10), date!(2025 - 06 - 14), account.id)
                .description("Weekly shop")
                .category(RecordRef::Id(category.id)),
            &connection,
        )
        .expect("Could not create transaction");

        assert!(transaction.id > 0);
        assert_eq!(transaction.amount, dec!(-42.10));
        assert_eq!(transaction.category_id, Some(category.id));
        assert_eq!(transaction.payee_id, None);
        assert_eq!(transaction.description, "Weekly shop");
        assert_eq!(
            get_transaction(transaction.id, user.id, &connection),
            Ok(transaction)
        );
    }

    #[test]
    fn create_with_names_reuses_or_creates_records() {
        let connection = get_test_connection();
        let user = must_create_user("Ana", &connection);
        let account = must_create_account(&user, "Everyday", &connection);
        let existing = must_create_category(&user, "Groceries", false, &connection);

        let first = create_transaction(
            &user,
            Transaction::build(dec!(-5), date!(2025 - 06 - 14), account.id)
                .category(RecordRef::Name("Groceries".to_owned()))
                .payee(RecordRef::Name("Bakery".to_owned())),
            &connection,
        )
        .unwrap();
        let second = create_transaction(
            &user,
            Transaction::build(dec!(-6), date!(2025 - 06 - 15), account.id)
                .category(RecordRef::Name("Coffee".to_owned()))
                .payee(RecordRef::Name("Bakery".to_owned())),
            &connection,
        )
        .unwrap();

        assert_eq!(first.category_id, Some(existing.id));
        assert_eq!(first.payee_id, second.payee_id);
        assert_eq!(get_all_categories(user.id, &connection).unwrap().len(), 2);
        assert_eq!(get_all_payees(user.id, &connection).unwrap().len(), 1);
    }

    #[test]
    fn create_records_creation_history() {
        let connection = get_test_connection();
        let user = must_create_user("Ana", &connection);
        let account = must_create_account(&user, "Everyday", &connection);

        let transaction = create_transaction(
            &user,
            Transaction::build(dec!(10), date!(2025 - 06 - 14), account.id),
            &connection,
        )
        .unwrap();

        let history = get_transaction_history(transaction.id, user.id, &connection).unwrap();
        assert_eq!(history.len(), 1);
        let HistoryEvent::Created(note) = &history[0].event else {
            panic!("expected a creation entry, got {:?}", history[0].event);
        };
        assert_eq!(note.actor_name, "Ana");
    }

    #[test]
    fn create_rejects_account_of_other_user() {
        let connection = get_test_connection();
        let ana = must_create_user("Ana", &connection);
        let bob = must_create_user("Bob", &connection);
        let bobs_account = must_create_account(&bob, "Savings", &connection);

        let result = create_transaction(
            &ana,
            Transaction::build(dec!(10), date!(2025 - 06 - 14), bobs_account.id),
            &connection,
        );

        assert_eq!(result, Err(Error::InvalidAccount(bobs_account.id)));
    }

    #[test]
    fn create_rejects_category_of_other_user_without_writing() {
        let connection = get_test_connection();
        let ana = must_create_user("Ana", &connection);
        let bob = must_create_user("Bob", &connection);
        let account = must_create_account(&ana, "Everyday", &connection);
        let bobs_category = must_create_category(&bob, "Fuel", false, &connection);

        let result = create_transaction(
            &ana,
            Transaction::build(dec!(10), date!(2025 - 06 - 14), account.id)
                .payee(RecordRef::Name("Garage".to_owned()))
                .category(RecordRef::Id(bobs_category.id)),
            &connection,
        );

        assert_eq!(result, Err(Error::InvalidCategory(bobs_category.id)));
        assert_eq!(get_all_payees(ana.id, &connection), Ok(vec![]));
    }

    #[test]
    fn get_transaction_of_other_user_is_not_found() {
        let connection = get_test_connection();
        let ana = must_create_user("Ana", &connection);
        let bob = must_create_user("Bob", &connection);
        let account = must_create_account(&ana, "Everyday", &connection);
        let transaction = create_transaction(
            &ana,
            Transaction::build(dec!(10), date!(2025 - 06 - 14), account.id),
            &connection,
        )
        .unwrap();

        assert_eq!(
            get_transaction(transaction.id, bob.id, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn create_rejects_amount_beyond_limit_without_writing() {
        let connection = get_test_connection();
        let user = must_create_user("Ana", &connection);
        let account = must_create_account(&user, "Everyday", &connection);

        let result = create_transaction(
            &user,
            Transaction::build(
                dec!(50000000000000000000000000000),
                date!(2025 - 06 - 14),
                account.id,
            ),
            &connection,
        );

        assert_eq!(
            result,
            Err(Error::InvalidAmount("50000000000000000000000000000".to_owned()))
        );
        let count: i64 = connection
            .query_row("SELECT COUNT(*) FROM \"transaction\"", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}

#[cfg(test)]
mod range_query_tests {
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::test_utils::{
        get_test_connection, must_create_account, must_create_category, must_create_user,
    };

    use super::{
        NamedRecord, RecordRef, Transaction, create_transaction, get_transaction_listings,
        get_transactions_in_range,
    };

    #[test]
    fn range_includes_both_end_days() {
        let connection = get_test_connection();
        let user = must_create_user("Ana", &connection);
        let account = must_create_account(&user, "Everyday", &connection);
        for date in [
            date!(2025 - 05 - 31),
            date!(2025 - 06 - 01),
            date!(2025 - 06 - 30),
            date!(2025 - 07 - 01),
        ] {
            create_transaction(&user, Transaction::build(dec!(1), date, account.id), &connection)
                .unwrap();
        }

        let transactions = get_transactions_in_range(
            user.id,
            &(date!(2025 - 06 - 01)..=date!(2025 - 06 - 30)),
            &connection,
        )
        .unwrap();

        let dates: Vec<_> = transactions.iter().map(|t| t.date).collect();
        assert_eq!(dates, vec![date!(2025 - 06 - 01), date!(2025 - 06 - 30)]);
    }

    #[test]
    fn listings_are_newest_first_with_names() {
        let connection = get_test_connection();
        let user = must_create_user("Ana", &connection);
        let account = must_create_account(&user, "Everyday", &connection);
        let category = must_create_category(&user, "Groceries", false, &connection);
        let older = create_transaction(
            &user,
            Transaction::build(dec!(-3), date!(2025 - 06 - 01), account.id)
                .category(RecordRef::Id(category.id))
                .payee(RecordRef::Name("Bakery".to_owned())),
            &connection,
        )
        .unwrap();
        let newer = create_transaction(
            &user,
            Transaction::build(dec!(-4), date!(2025 - 06 - 02), account.id),
            &connection,
        )
        .unwrap();

        let listings = get_transaction_listings(
            user.id,
            &(date!(2025 - 06 - 01)..=date!(2025 - 06 - 30)),
            &connection,
        )
        .unwrap();

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].id, newer.id);
        assert_eq!(listings[0].category, None);
        assert_eq!(listings[0].payee, None);
        assert_eq!(listings[1].id, older.id);
        assert_eq!(
            listings[1].category,
            Some(NamedRecord {
                id: category.id,
                name: "Groceries".to_owned()
            })
        );
        assert_eq!(
            listings[1].payee.as_ref().map(|payee| payee.name.as_str()),
            Some("Bakery")
        );
    }
}
