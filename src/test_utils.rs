#![allow(missing_docs)]

use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::{
    User,
    account::{Account, AccountKind, NewAccount, create_account},
    category::{Category, CategoryName, NewCategory, create_category},
    db::initialize,
    user::create_user,
};

#[track_caller]
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("could not create in-memory SQLite database");
    initialize(&connection).expect("could not initialize test DB");

    connection
}

#[track_caller]
pub(crate) fn must_create_user(name: &str, connection: &Connection) -> User {
    create_user(name, connection).expect("could not create test user")
}

#[track_caller]
pub(crate) fn must_create_category(
    user: &User,
    name: &str,
    is_income: bool,
    connection: &Connection,
) -> Category {
    create_category(
        user.id,
        NewCategory::new(CategoryName::new_unchecked(name)).is_income(is_income),
        connection,
    )
    .expect("could not create test category")
}

#[track_caller]
pub(crate) fn must_create_account(user: &User, name: &str, connection: &Connection) -> Account {
    create_account(
        user.id,
        NewAccount {
            name: name.to_owned(),
            kind: AccountKind::Debit,
            balance: Decimal::ZERO,
            institution_name: "Test Bank".to_owned(),
        },
        connection,
    )
    .expect("could not create test account")
}
