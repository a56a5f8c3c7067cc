//! The API endpoints URIs.

/// The route for checking whether the server is up.
pub const HEALTH: &str = "/health";
/// The route to upsert a monthly budget allocation.
pub const BUDGETS: &str = "/api/budgets";
/// The route to get the budget-vs-actual summary for a date range.
pub const BUDGET_SUMMARY: &str = "/api/budgets/summary";
/// The route to list and create categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to get and update a single category.
pub const CATEGORY: &str = "/api/categories/{category_id}";
/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to get the income vs. expense overview for a date range.
pub const TRANSACTION_SUMMARY: &str = "/api/transactions/summary";
/// The route to get and update a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to get the audit history of a transaction.
pub const TRANSACTION_HISTORY: &str = "/api/transactions/{transaction_id}/history";
/// The route to list and create accounts.
pub const ACCOUNTS: &str = "/api/accounts";
/// The route to list payees.
pub const PAYEES: &str = "/api/payees";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// Assumes `endpoint_path` contains a single parameter wrapped in braces,
/// e.g. "/api/categories/{category_id}". Paths without a parameter are
/// returned unchanged.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    match (endpoint_path.find('{'), endpoint_path.find('}')) {
        (Some(start), Some(end)) if start < end => format!(
            "{}{}{}",
            &endpoint_path[..start],
            id,
            &endpoint_path[end + 1..]
        ),
        _ => endpoint_path.to_owned(),
    }
}
