//! Endpoints for listing, creating, updating and auditing transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error, User,
    category::get_all_categories,
    date_range::DateRangeQuery,
    transaction::{
        NewTransactionPayload, OverviewSummary, Transaction, TransactionId, TransactionListing,
        TransactionUpdate, compute_overview, create_transaction, get_transaction,
        get_transaction_listings, get_transactions_in_range,
        history::{HistoryEntry, get_transaction_history},
        update_transaction_field,
    },
};

/// The state needed for the transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that lists the user's transactions in a date range, newest first.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user): Extension<User>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<TransactionListing>>, Error> {
    let range = query.parse()?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_transaction_listings(user.id, &range, &connection).map(Json)
}

/// A route handler for creating a new transaction, responds with 201 and the transaction.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user): Extension<User>,
    Json(payload): Json<NewTransactionPayload>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = create_transaction(&user, payload.into(), &connection)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// A route handler for the income and expense totals of a date range.
///
/// Any failure while reading or adding up the amounts is reported as
/// [Error::SummaryUnavailable].
pub async fn get_overview_endpoint(
    State(state): State<TransactionState>,
    Extension(user): Extension<User>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<OverviewSummary>, Error> {
    let range = query.parse()?;

    let inputs = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::SummaryUnavailable)?;

        let read_inputs = || -> Result<_, Error> {
            let categories = get_all_categories(user.id, &connection)?;
            let transactions = get_transactions_in_range(user.id, &range, &connection)?;

            Ok((categories, transactions))
        };

        read_inputs()
    };

    let (categories, transactions) = inputs
        .inspect_err(|error| tracing::error!("could not read the data for the overview: {error}"))
        .map_err(|_| Error::SummaryUnavailable)?;

    compute_overview(&range, &categories, &transactions)
        .map(Json)
        .inspect_err(|error| tracing::error!("could not compute the overview: {error}"))
        .map_err(|_| Error::SummaryUnavailable)
}

/// A route handler for getting one of the user's transactions.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user): Extension<User>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Transaction>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_transaction(transaction_id, user.id, &connection).map(Json)
}

/// A route handler for changing one field of a transaction.
pub async fn update_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user): Extension<User>,
    Path(transaction_id): Path<TransactionId>,
    Json(update): Json<TransactionUpdate>,
) -> Result<Json<Transaction>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    update_transaction_field(transaction_id, &user, update, &connection).map(Json)
}

/// A route handler for a transaction's history, newest first.
pub async fn get_transaction_history_endpoint(
    State(state): State<TransactionState>,
    Extension(user): Extension<User>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Vec<HistoryEntry>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_transaction_history(transaction_id, user.id, &connection).map(Json)
}
