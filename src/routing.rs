//! Application router configuration with the public health check and the user-scoped API.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;

use crate::{
    AppState,
    account::{create_account_endpoint, get_accounts_endpoint},
    budget::{get_budget_summary_endpoint, upsert_budget_endpoint},
    category::{
        create_category_endpoint, get_categories_endpoint, get_category_endpoint,
        update_category_endpoint,
    },
    endpoints,
    payee::get_payees_endpoint,
    transaction::{
        create_transaction_endpoint, get_overview_endpoint, get_transaction_endpoint,
        get_transaction_history_endpoint, get_transactions_endpoint, update_transaction_endpoint,
    },
    user_guard::user_guard,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new().route(endpoints::HEALTH, get(get_health));

    let protected_routes = Router::new()
        .route(endpoints::BUDGETS, post(upsert_budget_endpoint))
        .route(endpoints::BUDGET_SUMMARY, get(get_budget_summary_endpoint))
        .route(
            endpoints::CATEGORIES,
            get(get_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::CATEGORY,
            get(get_category_endpoint).put(update_category_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(endpoints::TRANSACTION_SUMMARY, get(get_overview_endpoint))
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint).patch(update_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION_HISTORY,
            get(get_transaction_history_endpoint),
        )
        .route(
            endpoints::ACCOUNTS,
            get(get_accounts_endpoint).post(create_account_endpoint),
        )
        .route(endpoints::PAYEES, get(get_payees_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), user_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_health() -> &'static str {
    "OK"
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"message": "the requested resource could not be found"})),
    )
        .into_response()
}
