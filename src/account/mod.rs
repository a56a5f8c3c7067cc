//! Accounts that transactions are drawn from.

mod core;
mod endpoints;

pub use core::{
    Account, AccountId, AccountKind, NewAccount, create_account, create_account_table,
    ensure_account_owned, get_all_accounts,
};
pub use endpoints::{create_account_endpoint, get_accounts_endpoint};
