//! Transactions, their change history and the income/expense overview.

mod core;
mod endpoints;
pub(crate) mod history;
mod overview;
mod update;

pub use core::{
    NewTransactionPayload, RecordRef, Transaction, TransactionBuilder, TransactionId,
    TransactionListing, create_transaction, create_transaction_table, get_transaction,
    get_transaction_listings, get_transactions_in_range,
};
pub use endpoints::{
    create_transaction_endpoint, get_overview_endpoint, get_transaction_endpoint,
    get_transaction_history_endpoint, get_transactions_endpoint, update_transaction_endpoint,
};
pub use history::{HistoryEntry, create_transaction_history_table};
pub use overview::{OverviewSummary, compute_overview};
pub use update::{TransactionUpdate, update_transaction_field};
