//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/expenses/{entry_id}', use
//! [format_endpoint].

/// The route to list and create expenses.
pub const EXPENSES: &str = "/api/expenses";
/// The route to update or delete a single expense.
pub const EXPENSE: &str = "/api/expenses/{entry_id}";
/// The route to list and create incomes.
pub const INCOMES: &str = "/api/incomes";
/// The route to update or delete a single income.
pub const INCOME: &str = "/api/incomes/{entry_id}";
/// The route to list and create categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to update or delete a single category.
pub const CATEGORY: &str = "/api/categories/{category_id}";
/// The route for per-category expense statistics.
pub const CATEGORY_STATS: &str = "/api/categories/stats";
/// The route to list and create recurring items.
pub const RECURRING: &str = "/api/recurring";
/// The route to update or delete a single recurring item.
pub const RECURRING_ITEM: &str = "/api/recurring/{item_id}";
/// The route for the pending recurring items and their total.
pub const RECURRING_PENDING: &str = "/api/recurring/pending";
/// The route to settle a recurring item.
pub const RECURRING_PAY: &str = "/api/recurring/{item_id}/pay";
/// The route to read and update the caller's profile.
pub const PROFILE: &str = "/api/profile";
/// The route for the caller's lifetime balance.
pub const BALANCE: &str = "/api/balance";
/// The route for the caller's cash flow over a period.
pub const CASH_FLOW: &str = "/api/cash-flow";
/// The route for the caller's balance trajectory.
pub const BALANCE_HISTORY: &str = "/api/balance/history";
/// The route for the caller's financial health score.
pub const HEALTH: &str = "/api/health";
/// The route for the dashboard's stat-card summary.
pub const SUMMARY: &str = "/api/summary";
/// The route for bucketed chart data.
pub const CHART: &str = "/api/chart";
/// The route for display-only exchange rates.
pub const RATES: &str = "/api/rates";
/// The route to request a cup of coffee (experimental).
pub const COFFEE: &str = "/api/coffee";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/expenses/{entry_id}', '{entry_id}'
/// is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
