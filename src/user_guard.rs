//! Middleware that resolves the user for API requests.
//!
//! Authentication happens upstream of this server. The gateway that
//! authenticated the request forwards the user's ID in [USER_ID_HEADER].

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    user::{UserID, get_user_by_id},
};

/// The header carrying the authenticated user's ID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The state needed for the user guard.
#[derive(Debug, Clone)]
pub struct UserGuardState {
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UserGuardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Middleware function that checks for a valid user ID header.
///
/// The [crate::User] is placed into the request extensions and the request
/// executed normally if the header refers to a known user, otherwise a 401
/// response is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user): Extension<User>` to receive the user.
pub async fn user_guard(
    State(state): State<UserGuardState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(user_id) = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<i64>().ok())
        .map(UserID::new)
    else {
        tracing::debug!("Missing or malformed {USER_ID_HEADER} header.");
        return Error::Unauthorized.into_response();
    };

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        match get_user_by_id(user_id, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => {
                tracing::warn!("Rejected request for unknown user {user_id}.");
                return Error::Unauthorized.into_response();
            }
            Err(error) => return error.into_response(),
        }
    };

    request.extensions_mut().insert(user);

    next.run(request).await
}
