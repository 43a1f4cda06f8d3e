//! JSON endpoints for balances, cash flow and financial health.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    balance::{
        BalancePoint, CashFlow, FinancialHealth, balance_history_for_owner, cash_flow_for_window,
        current_balance, financial_health, trend_percentage,
    },
    currency::format_currency,
    db::lock_connection,
    ledger::{LedgerKind, daily_totals},
    period::{ChartPoint, Grain, aggregate_by_grain, date_range_for_grain, previous_period_range},
    profile::ensure_profile,
    recurring::pending_total,
    timezone::now_local,
    user::UserId,
};

/// The longest balance history window a request may ask for, in days.
const MAX_HISTORY_DAYS: u32 = 365;

/// The state needed for the balance endpoints.
#[derive(Debug, Clone)]
pub struct BalanceEndpointState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name.
    pub local_timezone: String,
}

impl FromRef<AppState> for BalanceEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The caller's authoritative lifetime balance.
pub async fn balance_endpoint(
    State(state): State<BalanceEndpointState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<Value>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let balance = current_balance(user_id, &connection)?;

    Ok(Json(json!({ "balance": balance })))
}

#[derive(Debug, Deserialize)]
pub(crate) struct GrainQuery {
    grain: Option<Grain>,
}

/// The caller's cash flow for the current period.
pub async fn cash_flow_endpoint(
    State(state): State<BalanceEndpointState>,
    Extension(user_id): Extension<UserId>,
    Query(query): Query<GrainQuery>,
) -> Result<Json<CashFlow>, Error> {
    let today = now_local(&state.local_timezone).date();
    let range = date_range_for_grain(query.grain.unwrap_or(Grain::Month), today);
    let connection = lock_connection(&state.db_connection)?;

    let flow = cash_flow_for_window(user_id, range.start, range.end, &connection)?;

    Ok(Json(flow))
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryQuery {
    days: Option<u32>,
}

/// The caller's relative balance trajectory over the last `days` days.
pub async fn balance_history_endpoint(
    State(state): State<BalanceEndpointState>,
    Extension(user_id): Extension<UserId>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<BalancePoint>>, Error> {
    let days = query.days.unwrap_or(30).clamp(1, MAX_HISTORY_DAYS);
    let today = now_local(&state.local_timezone).date();
    let connection = lock_connection(&state.db_connection)?;

    let history = balance_history_for_owner(user_id, days, today, &connection)?;

    Ok(Json(history))
}

/// The caller's financial health score, band and advisories.
pub async fn financial_health_endpoint(
    State(state): State<BalanceEndpointState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<FinancialHealth>, Error> {
    let today = now_local(&state.local_timezone).date();
    let month = date_range_for_grain(Grain::Month, today);
    let connection = lock_connection(&state.db_connection)?;

    let balance = current_balance(user_id, &connection)?;
    let monthly = cash_flow_for_window(user_id, month.start, month.end, &connection)?;

    Ok(Json(financial_health(balance, monthly)))
}

/// The windowed totals behind the dashboard's stat cards.
#[derive(Debug, Serialize)]
pub struct Summary {
    /// The lifetime balance.
    pub balance: f64,
    /// The lifetime balance formatted in the profile currency, e.g. "₱1,234.50".
    pub balance_display: String,
    /// The cash flow for the requested period.
    pub cash_flow: CashFlow,
    /// The amount of recurring obligations still pending this period.
    pub pending_total: f64,
    /// Income change against the previous period, as a percentage.
    pub income_trend: f64,
    /// Expense change against the previous period, as a percentage.
    pub expense_trend: f64,
}

/// The caller's stat-card summary for the current period.
pub async fn summary_endpoint(
    State(state): State<BalanceEndpointState>,
    Extension(user_id): Extension<UserId>,
    Query(query): Query<GrainQuery>,
) -> Result<Json<Summary>, Error> {
    let grain = query.grain.unwrap_or(Grain::Month);
    let now = now_local(&state.local_timezone);
    let today = now.date();
    let current = date_range_for_grain(grain, today);
    let previous = previous_period_range(grain, today);
    let connection = lock_connection(&state.db_connection)?;

    let profile = ensure_profile(user_id, &connection)?;
    let balance = current_balance(user_id, &connection)?;
    let current_flow = cash_flow_for_window(user_id, current.start, current.end, &connection)?;
    let previous_flow = cash_flow_for_window(user_id, previous.start, previous.end, &connection)?;
    let pending = pending_total(user_id, now, &connection)?;

    Ok(Json(Summary {
        balance,
        balance_display: format_currency(balance, &profile.currency),
        cash_flow: current_flow,
        pending_total: pending,
        income_trend: trend_percentage(current_flow.total_income, previous_flow.total_income),
        expense_trend: trend_percentage(current_flow.total_expenses, previous_flow.total_expenses),
    }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartQuery {
    grain: Option<Grain>,
    kind: Option<LedgerKind>,
}

/// Bucketed amounts for charting one ledger over the current period.
pub async fn chart_endpoint(
    State(state): State<BalanceEndpointState>,
    Extension(user_id): Extension<UserId>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<Vec<ChartPoint>>, Error> {
    let grain = query.grain.unwrap_or(Grain::Month);
    let kind = query.kind.unwrap_or(LedgerKind::Expense);
    let today = now_local(&state.local_timezone).date();
    let range = date_range_for_grain(grain, today);
    let connection = lock_connection(&state.db_connection)?;

    let totals = daily_totals(kind, user_id, range.start, range.end, &connection)?;

    Ok(Json(aggregate_by_grain(&totals, grain)))
}
