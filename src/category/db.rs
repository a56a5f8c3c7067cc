//! Database operations for categories.

use rusqlite::{Connection, OptionalExtension, Row, named_params, params};
use time::OffsetDateTime;

use crate::{
    Error,
    category::{Category, CategoryId, CategoryName, NewCategory},
    user::UserID,
};

const CATEGORY_COLUMNS: &str = "id, name, description, is_income, exclude_from_budget, \
    exclude_from_totals, is_group, group_id, group_category_name";

/// Create a category for `user_id` and return it with its generated ID.
///
/// # Errors
///
/// This function will return a:
/// - [Error::DuplicateCategoryName] if the user already has a category with the same name,
/// - [Error::InvalidCategory] if the group ID does not refer to one of the user's categories,
/// - [Error::SqlError] if there is some other SQL error.
pub fn create_category(
    user_id: UserID,
    category: NewCategory,
    connection: &Connection,
) -> Result<Category, Error> {
    check_group(user_id, category.group_id, connection)?;

    let now = OffsetDateTime::now_utc();

    connection
        .execute(
            "INSERT INTO category (user_id, name, description, is_income, exclude_from_budget,
                exclude_from_totals, is_group, group_id, group_category_name, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            params![
                user_id.as_i64(),
                category.name.as_ref(),
                category.description,
                category.is_income,
                category.exclude_from_budget,
                category.exclude_from_totals,
                category.is_group,
                category.group_id,
                category.group_category_name,
                now,
            ],
        )
        .map_err(|error| map_duplicate_name(error, &category.name))?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        name: category.name,
        description: category.description,
        is_income: category.is_income,
        exclude_from_budget: category.exclude_from_budget,
        exclude_from_totals: category.exclude_from_totals,
        is_group: category.is_group,
        group_id: category.group_id,
        group_category_name: category.group_category_name,
    })
}

/// Retrieve a single category owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the category does not exist or belongs to another user.
pub fn get_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE id = :id AND user_id = :user_id;"
        ))?
        .query_row(
            &[(":id", &category_id), (":user_id", &user_id.as_i64())],
            map_category_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve all of the user's categories ordered alphabetically by name.
pub fn get_all_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE user_id = :user_id ORDER BY name ASC;"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Replace every editable field of a category.
///
/// # Errors
///
/// Returns [Error::UpdateMissingCategory] if the category does not exist or belongs to another
/// user, and the same errors as [create_category] for invalid names and groups.
pub fn update_category(
    category_id: CategoryId,
    user_id: UserID,
    category: NewCategory,
    connection: &Connection,
) -> Result<Category, Error> {
    if category.group_id == Some(category_id) {
        return Err(Error::InvalidCategory(category_id));
    }

    check_group(user_id, category.group_id, connection)?;

    let rows_affected = connection
        .execute(
            "UPDATE category SET name = ?1, description = ?2, is_income = ?3,
                exclude_from_budget = ?4, exclude_from_totals = ?5, is_group = ?6, group_id = ?7,
                group_category_name = ?8, updated_at = ?9
            WHERE id = ?10 AND user_id = ?11",
            params![
                category.name.as_ref(),
                category.description,
                category.is_income,
                category.exclude_from_budget,
                category.exclude_from_totals,
                category.is_group,
                category.group_id,
                category.group_category_name,
                OffsetDateTime::now_utc(),
                category_id,
                user_id.as_i64(),
            ],
        )
        .map_err(|error| map_duplicate_name(error, &category.name))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    get_category(category_id, user_id, connection)
}

/// Find the user's category called `name`, creating an expense category
/// with that name if there is none.
pub fn get_or_create_category(
    user_id: UserID,
    name: CategoryName,
    connection: &Connection,
) -> Result<Category, Error> {
    let existing = connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE user_id = :user_id AND name = :name;"
        ))?
        .query_row(
            named_params! {":user_id": user_id.as_i64(), ":name": name.as_ref()},
            map_category_row,
        )
        .optional()?;

    match existing {
        Some(category) => Ok(category),
        None => {
            tracing::debug!("Creating category \"{name}\" for user {user_id}.");
            create_category(user_id, NewCategory::new(name), connection)
        }
    }
}

/// Check that `category_id` refers to a category owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::InvalidCategory] if it does not.
pub fn ensure_category_owned(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let is_owned: bool = connection.query_row(
        "SELECT EXISTS (SELECT 1 FROM category WHERE id = ?1 AND user_id = ?2)",
        (category_id, user_id.as_i64()),
        |row| row.get(0),
    )?;

    if is_owned {
        Ok(())
    } else {
        Err(Error::InvalidCategory(category_id))
    }
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            is_income INTEGER NOT NULL DEFAULT 0,
            exclude_from_budget INTEGER NOT NULL DEFAULT 0,
            exclude_from_totals INTEGER NOT NULL DEFAULT 0,
            is_group INTEGER NOT NULL DEFAULT 0,
            group_id INTEGER,
            group_category_name TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(user_id, name),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(group_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_category_user ON category(user_id);",
    )?;

    Ok(())
}

fn check_group(
    user_id: UserID,
    group_id: Option<CategoryId>,
    connection: &Connection,
) -> Result<(), Error> {
    match group_id {
        Some(group_id) => ensure_category_owned(group_id, user_id, connection),
        None => Ok(()),
    }
}

fn map_duplicate_name(error: rusqlite::Error, name: &CategoryName) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            _,
        ) => Error::DuplicateCategoryName(name.to_string()),
        error => error.into(),
    }
}

pub(crate) fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(1)?;

    Ok(Category {
        id: row.get(0)?,
        name: CategoryName::new_unchecked(&raw_name),
        description: row.get(2)?,
        is_income: row.get(3)?,
        exclude_from_budget: row.get(4)?,
        exclude_from_totals: row.get(5)?,
        is_group: row.get(6)?,
        group_id: row.get(7)?,
        group_category_name: row.get(8)?,
    })
}
