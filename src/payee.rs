//! Payees are the people and businesses that transactions are paid to or received from.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::{AppState, Error, User, database_id::DatabaseId, user::UserID};

/// Database identifier for a payee.
pub type PayeeId = DatabaseId;

/// Someone a transaction is paid to or received from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payee {
    /// The ID of the payee.
    pub id: PayeeId,
    /// The name of the payee, unique per user.
    pub name: String,
}

/// Create the payee table.
pub fn create_payee_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS payee (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            UNIQUE(user_id, name),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

/// Get all of the user's payees ordered by name.
pub fn get_all_payees(user_id: UserID, connection: &Connection) -> Result<Vec<Payee>, Error> {
    connection
        .prepare("SELECT id, name FROM payee WHERE user_id = :user_id ORDER BY name ASC")?
        .query_map(&[(":user_id", &user_id.as_i64())], map_payee_row)?
        .map(|maybe_payee| maybe_payee.map_err(|error| error.into()))
        .collect()
}

/// Find the user's payee called `name`, creating it if there is none.
///
/// # Errors
/// Returns [Error::EmptyPayeeName] if `name` is empty or whitespace.
pub fn get_or_create_payee(
    user_id: UserID,
    name: &str,
    connection: &Connection,
) -> Result<Payee, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::EmptyPayeeName);
    }

    let existing = connection
        .query_row(
            "SELECT id, name FROM payee WHERE user_id = ?1 AND name = ?2",
            (user_id.as_i64(), name),
            map_payee_row,
        )
        .optional()?;

    if let Some(payee) = existing {
        return Ok(payee);
    }

    tracing::debug!("Creating payee \"{name}\" for user {user_id}.");
    connection.execute(
        "INSERT INTO payee (user_id, name) VALUES (?1, ?2)",
        (user_id.as_i64(), name),
    )?;

    Ok(Payee {
        id: connection.last_insert_rowid(),
        name: name.to_owned(),
    })
}

/// Check that `payee_id` refers to a payee owned by `user_id`.
///
/// # Errors
/// Returns [Error::InvalidPayee] if it does not.
pub fn ensure_payee_owned(
    payee_id: PayeeId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let is_owned: bool = connection.query_row(
        "SELECT EXISTS (SELECT 1 FROM payee WHERE id = ?1 AND user_id = ?2)",
        (payee_id, user_id.as_i64()),
        |row| row.get(0),
    )?;

    if is_owned {
        Ok(())
    } else {
        Err(Error::InvalidPayee(payee_id))
    }
}

fn map_payee_row(row: &Row) -> Result<Payee, rusqlite::Error> {
    Ok(Payee {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

/// The state needed to list payees.
#[derive(Debug, Clone)]
pub struct PayeeState {
    /// The database connection for reading payees.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for PayeeState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that lists the user's payees.
pub async fn get_payees_endpoint(
    State(state): State<PayeeState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Payee>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_all_payees(user.id, &connection).map(Json)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Router, routing::get};
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{
        Error, endpoints,
        test_utils::{get_test_connection, must_create_user},
    };

    use super::{
        PayeeState, ensure_payee_owned, get_all_payees, get_or_create_payee, get_payees_endpoint,
    };

    #[test]
    fn get_or_create_payee_creates_once() {
        let connection = get_test_connection();
        let user = must_create_user("Ana", &connection);

        let first = get_or_create_payee(user.id, "Corner Store", &connection).unwrap();
        let second = get_or_create_payee(user.id, " Corner Store ", &connection).unwrap();

        assert_eq!(first, second);
        assert_eq!(get_all_payees(user.id, &connection), Ok(vec![first]));
    }

    #[test]
    fn get_or_create_payee_rejects_empty_name() {
        let connection = get_test_connection();
        let user = must_create_user("Ana", &connection);

        let result = get_or_create_payee(user.id, "", &connection);

        assert_eq!(result, Err(Error::EmptyPayeeName));
    }

    #[test]
    fn payees_are_scoped_by_user() {
        let connection = get_test_connection();
        let ana = must_create_user("Ana", &connection);
        let bob = must_create_user("Bob", &connection);
        let payee = get_or_create_payee(bob.id, "Landlord", &connection).unwrap();

        assert_eq!(get_all_payees(ana.id, &connection), Ok(vec![]));
        assert_eq!(
            ensure_payee_owned(payee.id, ana.id, &connection),
            Err(Error::InvalidPayee(payee.id))
        );
        assert_eq!(ensure_payee_owned(payee.id, bob.id, &connection), Ok(()));
    }

    #[tokio::test]
    async fn endpoint_lists_payees_by_name() {
        let connection = get_test_connection();
        let user = must_create_user("Ana", &connection);
        get_or_create_payee(user.id, "Landlord", &connection).unwrap();
        get_or_create_payee(user.id, "Bakery", &connection).unwrap();
        let state = PayeeState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let app = Router::new()
            .route(endpoints::PAYEES, get(get_payees_endpoint))
            .layer(Extension(user))
            .with_state(state);
        let server = TestServer::new(app).expect("Could not create test server.");

        let payees: Value = server.get(endpoints::PAYEES).await.json();

        assert_eq!(payees[0]["name"], json!("Bakery"));
        assert_eq!(payees[1]["name"], json!("Landlord"));
    }
}
