//! Budgetbook is a web API for managing your budget and personal finances.
//!
//! Users track accounts, categorize transactions and set monthly budgets per
//! category. The budget summary endpoint reconciles categories, monthly budget
//! allocations and transactions into a month-by-month breakdown of planned
//! versus actual amounts.
//!
//! This library provides a JSON REST API.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod account;
mod app_state;
mod budget;
mod category;
mod database_id;
mod date_range;
mod db;
mod endpoints;
mod logging;
mod money;
mod payee;
mod routing;
mod transaction;
mod user;
mod user_guard;

#[cfg(test)]
mod test_utils;

pub use account::{Account, AccountKind, NewAccount, create_account};
pub use app_state::AppState;
pub use budget::{
    BudgetAllocation, BudgetSummary, CategorySummaryRow, MonthlyOccurrence, UpsertOutcome,
    compute_budget_summary, upsert_budget,
};
pub use category::{Category, CategoryName, NewCategory, create_category};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use transaction::{
    HistoryEntry, OverviewSummary, RecordRef, Transaction, TransactionBuilder, TransactionUpdate,
    create_transaction, update_transaction_field,
};
pub use user::{User, UserID, create_user, get_user_by_id};
pub use user_guard::USER_ID_HEADER;

use crate::{account::AccountId, category::CategoryId, payee::PayeeId};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("could not listen for the Ctrl+C signal: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("could not listen for the terminate signal: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received ctrl+c signal, shutting down."),
        _ = terminate => tracing::info!("Received terminate signal, shutting down."),
    }

    handle.graceful_shutdown(Some(Duration::from_secs(1)));
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request did not identify a known user.
    #[error("unauthorized")]
    Unauthorized,

    /// A date string did not match the format `YYYY-MM-DD` or is not a real
    /// calendar date.
    #[error("\"{0}\" is not a valid date, expected the format YYYY-MM-DD")]
    InvalidDateFormat(String),

    /// A category ID given as text could not be parsed as an integer.
    #[error("\"{0}\" is not a valid category ID, expected a number")]
    InvalidCategoryId(String),

    /// An amount is larger in magnitude than the largest supported amount.
    #[error("the amount {0} is outside the supported range")]
    InvalidAmount(String),

    /// Adding up amounts gave a total too large to represent.
    #[error("an amount total is too large to represent")]
    AmountOverflow,

    /// An empty string was used to create a category name.
    #[error("category name cannot be empty")]
    EmptyCategoryName,

    /// An empty string was used to create a payee name.
    #[error("payee name cannot be empty")]
    EmptyPayeeName,

    /// An empty string was used to create an account name.
    #[error("account name cannot be empty")]
    EmptyAccountName,

    /// The category ID does not refer to a category owned by the user.
    #[error("the category ID {0} does not refer to a valid category")]
    InvalidCategory(CategoryId),

    /// The payee ID does not refer to a payee owned by the user.
    #[error("the payee ID {0} does not refer to a valid payee")]
    InvalidPayee(PayeeId),

    /// The account ID does not refer to an account owned by the user.
    #[error("the account ID {0} does not refer to a valid account")]
    InvalidAccount(AccountId),

    /// The user already has a category with this name.
    #[error("the category \"{0}\" already exists")]
    DuplicateCategoryName(String),

    /// The user already has an account with this name.
    #[error("the account \"{0}\" already exists")]
    DuplicateAccountName(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a category that does not exist.
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to update a transaction that does not exist.
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Reading or adding up the data for a summary failed.
    ///
    /// No partial summary is ever returned, the cause is only logged.
    #[error("could not compute summary")]
    SummaryUnavailable,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while serializing or deserializing JSON.
    #[error("could not (de)serialize JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::JSONSerializationError(value.to_string())
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::InvalidDateFormat(_)
            | Error::InvalidCategoryId(_)
            | Error::InvalidAmount(_)
            | Error::EmptyCategoryName
            | Error::EmptyPayeeName
            | Error::EmptyAccountName
            | Error::InvalidCategory(_)
            | Error::InvalidPayee(_)
            | Error::InvalidAccount(_)
            | Error::DuplicateCategoryName(_)
            | Error::DuplicateAccountName(_) => StatusCode::BAD_REQUEST,
            Error::NotFound | Error::UpdateMissingCategory | Error::UpdateMissingTransaction => {
                StatusCode::NOT_FOUND
            }
            Error::SummaryUnavailable
            | Error::AmountOverflow
            | Error::SqlError(_)
            | Error::JSONSerializationError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match self {
            Error::SummaryUnavailable => Error::SummaryUnavailable.to_string(),
            // Any other server errors are not intended to be shown to the client.
            error if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("An unexpected error occurred: {}", error);
                "An unexpected error occurred, check the server logs for more details.".to_owned()
            }
            error => error.to_string(),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
