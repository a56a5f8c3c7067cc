//! Endpoints for setting monthly budgets and reading the budget summary.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    AppState, Error, User,
    budget::{
        BudgetAllocation, BudgetSummary, UpsertOutcome, compute_budget_summary,
        get_budgets_overlapping, upsert_budget,
    },
    category::get_all_categories,
    date_range::{DateRangeQuery, parse_date},
    transaction::get_transactions_in_range,
};

/// The state needed for the budget endpoints.
#[derive(Debug, Clone)]
pub struct BudgetState {
    /// The database connection for reading and writing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for setting a category's budget for a month.
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetPayload {
    /// The category ID as a numeric string.
    pub category_id: String,
    /// The amount to budget, a JSON number or numeric string.
    pub amount: Decimal,
    /// Any day in the month to budget for, `YYYY-MM-DD`.
    pub budget_month: String,
}

/// Set the budget for a category and month.
///
/// Responds with 201 if the allocation was created, 200 if an existing one was updated.
pub async fn upsert_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user): Extension<User>,
    Json(payload): Json<BudgetPayload>,
) -> Result<(StatusCode, Json<BudgetAllocation>), Error> {
    let category_id = payload
        .category_id
        .trim()
        .parse()
        .map_err(|_| Error::InvalidCategoryId(payload.category_id.clone()))?;
    let month = parse_date(&payload.budget_month)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    match upsert_budget(user.id, category_id, payload.amount, month, &connection)? {
        UpsertOutcome::Created(allocation) => Ok((StatusCode::CREATED, Json(allocation))),
        UpsertOutcome::Updated(allocation) => Ok((StatusCode::OK, Json(allocation))),
    }
}

/// Get the budget-vs-actual summary for the query's date range.
///
/// A malformed date is rejected before anything is read. Any failure while
/// reading or adding up the amounts is reported as [Error::SummaryUnavailable].
pub async fn get_budget_summary_endpoint(
    State(state): State<BudgetState>,
    Extension(user): Extension<User>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<BudgetSummary>, Error> {
    let range = query.parse()?;

    // The lock is released before the summary is computed.
    let inputs = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::SummaryUnavailable)?;

        let read_inputs = || -> Result<_, Error> {
            let categories = get_all_categories(user.id, &connection)?;
            let budgets = get_budgets_overlapping(user.id, &range, &connection)?;
            let transactions = get_transactions_in_range(user.id, &range, &connection)?;

            Ok((categories, budgets, transactions))
        };

        read_inputs()
    };

    let (categories, budgets, transactions) = inputs
        .inspect_err(|error| {
            tracing::error!("could not read the data for the budget summary: {error}")
        })
        .map_err(|_| Error::SummaryUnavailable)?;

    compute_budget_summary(&range, &categories, &budgets, &transactions)
        .map(Json)
        .inspect_err(|error| tracing::error!("could not compute the budget summary: {error}"))
        .map_err(|_| Error::SummaryUnavailable)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Router,
        http::StatusCode,
        routing::{get, post},
    };
    use axum_test::TestServer;
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};
    use time::macros::date;

    use crate::{
        User, endpoints,
        test_utils::{
            get_test_connection, must_create_account, must_create_category, must_create_user,
        },
        transaction::{RecordRef, Transaction, create_transaction},
    };

    use super::{BudgetState, get_budget_summary_endpoint, upsert_budget_endpoint};

    fn get_test_server(connection: Connection, user: User) -> TestServer {
        let state = BudgetState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let app = Router::new()
            .route(endpoints::BUDGETS, post(upsert_budget_endpoint))
            .route(endpoints::BUDGET_SUMMARY, get(get_budget_summary_endpoint))
            .layer(Extension(user))
            .with_state(state);

        TestServer::new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn upsert_returns_created_then_ok() {
        let connection = get_test_connection();
        let user = must_create_user("Ana", &connection);
        let category = must_create_category(&user, "Groceries", false, &connection);
        let server = get_test_server(connection, user);
        let body = json!({
            "category_id": category.id.to_string(),
            "amount": 2000,
            "budget_month": "2025-06-15",
        });

        let created = server.post(endpoints::BUDGETS).json(&body).await;
        let updated = server.post(endpoints::BUDGETS).json(&body).await;

        created.assert_status(StatusCode::CREATED);
        updated.assert_status_ok();
        let allocation: Value = updated.json();
        assert_eq!(allocation["startDate"], "2025-06-01");
        assert_eq!(allocation["endDate"], "2025-06-30");
        assert_eq!(allocation["amount"], 2000.0);
    }

    #[tokio::test]
    async fn upsert_rejects_non_numeric_category_id() {
        let connection = get_test_connection();
        let user = must_create_user("Ana", &connection);
        let server = get_test_server(connection, user);

        let response = server
            .post(endpoints::BUDGETS)
            .json(&json!({
                "category_id": "groceries",
                "amount": 10,
                "budget_month": "2025-06-01",
            }))
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({
            "message": "\"groceries\" is not a valid category ID, expected a number"
        }));
    }

    #[tokio::test]
    async fn upsert_rejects_malformed_month() {
        let connection = get_test_connection();
        let user = must_create_user("Ana", &connection);
        let category = must_create_category(&user, "Groceries", false, &connection);
        let server = get_test_server(connection, user);

        server
            .post(endpoints::BUDGETS)
            .json(&json!({
                "category_id": category.id.to_string(),
                "amount": 10,
                "budget_month": "June 2025",
            }))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn upsert_rejects_category_of_other_user() {
        let connection = get_test_connection();
        let ana = must_create_user("Ana", &connection);
        let bob = must_create_user("Bob", &connection);
        let category = must_create_category(&bob, "Fuel", false, &connection);
        let server = get_test_server(connection, ana);

        server
            .post(endpoints::BUDGETS)
            .json(&json!({
                "category_id": category.id.to_string(),
                "amount": 10,
                "budget_month": "2025-06-01",
            }))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn summary_reconciles_budgets_and_transactions() {
        let connection = get_test_connection();
        let user = must_create_user("Ana", &connection);
        let groceries = must_create_category(&user, "Groceries", false, &connection);
        let account = must_create_account(&user, "Everyday", &connection);
        for (amount, date) in [
            (dec!(-150.00), date!(2025 - 06 - 03)),
            (dec!(-75.50), date!(2025 - 06 - 30)),
        ] {
            create_transaction(
                &user,
                Transaction::build(amount, date, account.id).category(RecordRef::Id(groceries.id)),
                &connection,
            )
            .unwrap();
        }
        let server = get_test_server(connection, user);
        server
            .post(endpoints::BUDGETS)
            .json(&json!({
                "category_id": groceries.id.to_string(),
                "amount": "2000.00",
                "budget_month": "2025-06-01",
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .get(endpoints::BUDGET_SUMMARY)
            .add_query_param("start_date", "2025-06-01")
            .add_query_param("end_date", "2025-06-30")
            .await;

        response.assert_status_ok();
        let summary: Value = response.json();
        assert_eq!(summary["overallOutflow"], 225.5);
        let row = &summary["categories"][0];
        assert_eq!(row["name"], "Groceries");
        assert_eq!(row["totalBudgeted"], 2000.0);
        assert_eq!(row["totalActivity"], 225.5);
        assert_eq!(row["totalBalance"], 1774.5);
        assert_eq!(
            row["occurrences"],
            json!([{"month": "2025-06", "activity": 225.5, "budgeted": 2000.0, "balance": 1774.5}])
        );
    }

    #[tokio::test]
    async fn summary_rejects_malformed_dates() {
        let connection = get_test_connection();
        let user = must_create_user("Ana", &connection);
        let server = get_test_server(connection, user);

        let response = server
            .get(endpoints::BUDGET_SUMMARY)
            .add_query_param("start_date", "2025-6-1")
            .add_query_param("end_date", "2025-06-30")
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn summary_read_failure_is_generic_error() {
        let connection = get_test_connection();
        let user = must_create_user("Ana", &connection);
        connection
            .execute_batch("DROP TABLE budget;")
            .unwrap();
        let server = get_test_server(connection, user);

        let response = server
            .get(endpoints::BUDGET_SUMMARY)
            .add_query_param("start_date", "2025-06-01")
            .add_query_param("end_date", "2025-06-30")
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        response.assert_json(&json!({"message": "could not compute summary"}));
    }

    #[tokio::test]
    async fn upsert_rejects_amount_beyond_limit() {
        let connection = get_test_connection();
        let user = must_create_user("Ana", &connection);
        let category = must_create_category(&user, "Groceries", false, &connection);
        let server = get_test_server(connection, user);

        let response = server
            .post(endpoints::BUDGETS)
            .json(&json!({
                "category_id": category.id.to_string(),
                "amount": "50000000000000000000000000000",
                "budget_month": "2025-06-01",
            }))
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({
            "message": "the amount 50000000000000000000000000000 is outside the supported range"
        }));
    }

    #[tokio::test]
    async fn summary_overflow_is_generic_error_and_server_recovers() {
        let connection = get_test_connection();
        let user = must_create_user("Ana", &connection);
        let groceries = must_create_category(&user, "Groceries", false, &connection);
        let account = must_create_account(&user, "Everyday", &connection);
        for day in [date!(2025 - 06 - 03), date!(2025 - 06 - 04)] {
            create_transaction(
                &user,
                Transaction::build(dec!(-1), day, account.id).category(RecordRef::Id(groceries.id)),
                &connection,
            )
            .unwrap();
        }
        // Rows written before amounts were bounded.
        connection
            .execute(
                "UPDATE \"transaction\" SET amount = '-50000000000000000000000000000'",
                [],
            )
            .unwrap();
        let server = get_test_server(connection, user);

        let response = server
            .get(endpoints::BUDGET_SUMMARY)
            .add_query_param("start_date", "2025-06-01")
            .add_query_param("end_date", "2025-06-30")
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        response.assert_json(&json!({"message": "could not compute summary"}));
        server
            .post(endpoints::BUDGETS)
            .json(&json!({
                "category_id": groceries.id.to_string(),
                "amount": 100,
                "budget_month": "2025-06-01",
            }))
            .await
            .assert_status(StatusCode::CREATED);
    }
}
