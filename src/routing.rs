//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post, put},
};
use serde_json::json;

use crate::{
    AppState,
    auth::auth_guard,
    balance::{
        balance_endpoint, balance_history_endpoint, cash_flow_endpoint, chart_endpoint,
        financial_health_endpoint, summary_endpoint,
    },
    category::{
        category_stats_endpoint, create_category_endpoint, delete_category_endpoint,
        list_categories_endpoint, update_category_endpoint,
    },
    endpoints,
    ledger::{
        create_expense_endpoint, create_income_endpoint, delete_expense_endpoint,
        delete_income_endpoint, list_expenses_endpoint, list_incomes_endpoint,
        update_expense_endpoint, update_income_endpoint,
    },
    profile::{get_profile_endpoint, update_profile_endpoint},
    rates::rates_endpoint,
    recurring::{
        create_recurring_endpoint, delete_recurring_endpoint, list_pending_endpoint,
        list_recurring_endpoint, mark_as_paid_endpoint, update_recurring_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new().route(endpoints::COFFEE, get(get_coffee));

    let protected_routes = Router::new()
        .route(
            endpoints::EXPENSES,
            get(list_expenses_endpoint).post(create_expense_endpoint),
        )
        .route(
            endpoints::EXPENSE,
            put(update_expense_endpoint).delete(delete_expense_endpoint),
        )
        .route(
            endpoints::INCOMES,
            get(list_incomes_endpoint).post(create_income_endpoint),
        )
        .route(
            endpoints::INCOME,
            put(update_income_endpoint).delete(delete_income_endpoint),
        )
        .route(
            endpoints::CATEGORIES,
            get(list_categories_endpoint).post(create_category_endpoint),
        )
        .route(endpoints::CATEGORY_STATS, get(category_stats_endpoint))
        .route(
            endpoints::CATEGORY,
            put(update_category_endpoint).delete(delete_category_endpoint),
        )
        .route(
            endpoints::RECURRING,
            get(list_recurring_endpoint).post(create_recurring_endpoint),
        )
        .route(endpoints::RECURRING_PENDING, get(list_pending_endpoint))
        .route(
            endpoints::RECURRING_ITEM,
            put(update_recurring_endpoint).delete(delete_recurring_endpoint),
        )
        .route(endpoints::RECURRING_PAY, post(mark_as_paid_endpoint))
        .route(
            endpoints::PROFILE,
            get(get_profile_endpoint).patch(update_profile_endpoint),
        )
        .route(endpoints::BALANCE, get(balance_endpoint))
        .route(endpoints::BALANCE_HISTORY, get(balance_history_endpoint))
        .route(endpoints::CASH_FLOW, get(cash_flow_endpoint))
        .route(endpoints::HEALTH, get(financial_health_endpoint))
        .route(endpoints::SUMMARY, get(summary_endpoint))
        .route(endpoints::CHART, get(chart_endpoint))
        .route(endpoints::RATES, get(rates_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, Html("I'm a teapot")).into_response()
}

/// The JSON body returned for routes that do not exist.
async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "the requested resource could not be found" })),
    )
        .into_response()
}
