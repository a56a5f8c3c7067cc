//! Endpoints for listing and creating accounts.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error, User,
    account::{Account, NewAccount, create_account, get_all_accounts},
};

/// The state needed to list or create accounts.
#[derive(Debug, Clone)]
pub struct AccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that lists the user's accounts.
pub async fn get_accounts_endpoint(
    State(state): State<AccountState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Account>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_all_accounts(user.id, &connection).map(Json)
}

/// A route handler for creating a new account, responds with 201 and the account.
pub async fn create_account_endpoint(
    State(state): State<AccountState>,
    Extension(user): Extension<User>,
    Json(new_account): Json<NewAccount>,
) -> Result<(StatusCode, Json<Account>), Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let account = create_account(user.id, new_account, &connection)?;

    Ok((StatusCode::CREATED, Json(account)))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{
        endpoints,
        test_utils::{get_test_connection, must_create_user},
    };

    use super::{AccountState, create_account_endpoint, get_accounts_endpoint};

    fn get_test_server() -> TestServer {
        let connection = get_test_connection();
        let user = must_create_user("Ana", &connection);
        let state = AccountState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let app = Router::new()
            .route(
                endpoints::ACCOUNTS,
                get(get_accounts_endpoint).post(create_account_endpoint),
            )
            .layer(Extension(user))
            .with_state(state);

        TestServer::new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn create_account_accepts_string_balance() {
        let server = get_test_server();

        let response = server
            .post(endpoints::ACCOUNTS)
            .json(&json!({
                "name": "Everyday",
                "typeName": "debit",
                "balance": "1520.75",
                "institutionName": "ACME Bank",
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let account: Value = response.json();
        assert_eq!(account["kind"], "debit");
        assert_eq!(account["balance"], 1520.75);

        let accounts: Value = server.get(endpoints::ACCOUNTS).await.json();
        assert_eq!(accounts, json!([account]));
    }

    #[tokio::test]
    async fn duplicate_account_is_bad_request() {
        let server = get_test_server();
        let body = json!({
            "name": "Everyday",
            "kind": "debit",
            "balance": 10,
            "institutionName": "ACME Bank",
        });

        server
            .post(endpoints::ACCOUNTS)
            .json(&body)
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post(endpoints::ACCOUNTS)
            .json(&body)
            .await
            .assert_status_bad_request();
    }
}
