//! JSON endpoints for listing, creating and editing categories.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error, User,
    category::{
        Category, CategoryId, NewCategory, create_category, domain::CategoryPayload,
        get_all_categories, get_category, update_category,
    },
};

/// The state needed for the category endpoints.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// List the user's categories ordered by name.
pub async fn get_categories_endpoint(
    State(state): State<CategoryState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_all_categories(user.id, &connection).map(Json)
}

/// Get one of the user's categories.
pub async fn get_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user): Extension<User>,
    Path(category_id): Path<CategoryId>,
) -> Result<Json<Category>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_category(category_id, user.id, &connection).map(Json)
}

/// Create a category, responding with 201 and the stored category.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CategoryPayload>,
) -> Result<(StatusCode, Json<Category>), Error> {
    let new_category = NewCategory::try_from(payload)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let category = create_category(user.id, new_category, &connection)?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// Replace the fields of one of the user's categories.
pub async fn update_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user): Extension<User>,
    Path(category_id): Path<CategoryId>,
    Json(payload): Json<CategoryPayload>,
) -> Result<Json<Category>, Error> {
    let new_category = NewCategory::try_from(payload)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    update_category(category_id, user.id, new_category, &connection).map(Json)
}
