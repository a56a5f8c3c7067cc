//! Database initialization.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, account::create_account_table, budget::create_budget_table,
    category::create_category_table, payee::create_payee_table,
    transaction::{create_transaction_history_table, create_transaction_table},
    user::create_user_table,
};

/// Create all of the application's tables if they do not already exist.
///
/// Foreign key enforcement is switched on for `connection`, the tables are
/// then created inside a single exclusive transaction so a partially
/// initialized database is never left behind.
///
/// # Errors
/// Returns an [Error::SqlError] if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_account_table(&transaction)?;
    create_payee_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_transaction_history_table(&transaction)?;
    create_budget_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
