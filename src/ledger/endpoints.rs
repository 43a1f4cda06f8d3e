//! JSON endpoints for the expense and income ledgers.
//!
//! The two ledgers share one set of handlers parametrized by [LedgerKind];
//! the router exposes them under `/api/expenses` and `/api/incomes`.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    balance::recompute_cached_balance,
    category::CategoryId,
    currency::validate_currency_code,
    db::lock_connection,
    ledger::{
        EntryFilter, LedgerEntry, LedgerEntryId, LedgerKind, NewLedgerEntry, count_entries,
        create_entry, delete_entry, list_entries, parse_date, update_entry, validate_amount,
        validate_description,
    },
    pagination::{Page, PageQuery, Paginated, PaginationConfig},
    profile::ensure_profile,
    user::UserId,
};

/// The state needed for the ledger endpoints.
#[derive(Debug, Clone)]
pub struct LedgerEndpointState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls how list endpoints page their data.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for LedgerEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

// The paging fields live inline rather than as a flattened [PageQuery];
// axum's query deserializer cannot flatten non-string fields.
#[derive(Debug, Deserialize)]
pub(crate) struct ListEntriesQuery {
    start: Option<String>,
    end: Option<String>,
    category_id: Option<CategoryId>,
    page: Option<u64>,
    per_page: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EntryForm {
    amount: f64,
    currency: Option<String>,
    description: Option<String>,
    category_id: Option<CategoryId>,
    occurred_on: String,
}

async fn list_entries_impl(
    kind: LedgerKind,
    state: LedgerEndpointState,
    user_id: UserId,
    query: ListEntriesQuery,
) -> Result<Json<Paginated<LedgerEntry>>, Error> {
    let filter = EntryFilter {
        start: query.start.as_deref().map(parse_date).transpose()?,
        end: query.end.as_deref().map(parse_date).transpose()?,
        category_id: query.category_id,
    };
    let page = Page::resolve(
        PageQuery {
            page: query.page,
            per_page: query.per_page,
        },
        &state.pagination_config,
    );
    let connection = lock_connection(&state.db_connection)?;

    // The count runs separately from the page query; a write in between can
    // skew the total by a few rows.
    let total = count_entries(kind, user_id, filter, &connection)?;
    let items = list_entries(kind, user_id, filter, page.limit(), page.offset(), &connection)?;

    Ok(Json(Paginated::new(items, page, total)))
}

async fn create_entry_impl(
    kind: LedgerKind,
    state: LedgerEndpointState,
    user_id: UserId,
    form: EntryForm,
) -> Result<(StatusCode, Json<LedgerEntry>), Error> {
    let amount = validate_amount(form.amount)?;
    let description = validate_description(form.description)?;
    let occurred_on = parse_date(&form.occurred_on)?;
    let connection = lock_connection(&state.db_connection)?;

    let currency = match form.currency {
        Some(code) => validate_currency_code(&code)?,
        None => ensure_profile(user_id, &connection)?.currency,
    };

    let entry = create_entry(
        NewLedgerEntry {
            kind,
            amount,
            currency,
            description,
            category_id: form.category_id,
            occurred_on,
            owner: user_id,
        },
        &connection,
    )?;

    if kind == LedgerKind::Income {
        refresh_balance_cache(user_id, &connection);
    }

    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_entry_impl(
    kind: LedgerKind,
    state: LedgerEndpointState,
    user_id: UserId,
    entry_id: LedgerEntryId,
    form: EntryForm,
) -> Result<Json<LedgerEntry>, Error> {
    let amount = validate_amount(form.amount)?;
    let description = validate_description(form.description)?;
    let occurred_on = parse_date(&form.occurred_on)?;
    let connection = lock_connection(&state.db_connection)?;

    let entry = update_entry(
        entry_id,
        kind,
        user_id,
        amount,
        description,
        form.category_id,
        occurred_on,
        &connection,
    )?;

    if kind == LedgerKind::Income {
        refresh_balance_cache(user_id, &connection);
    }

    Ok(Json(entry))
}

async fn delete_entry_impl(
    kind: LedgerKind,
    state: LedgerEndpointState,
    user_id: UserId,
    entry_id: LedgerEntryId,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_entry(entry_id, kind, user_id, &connection)?;

    if kind == LedgerKind::Income {
        refresh_balance_cache(user_id, &connection);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Recompute the profile's cached balance after a mutation.
///
/// Best effort: a failure here is logged and never fails the mutation that
/// triggered it. The cache self-heals on the next recomputation.
fn refresh_balance_cache(user_id: UserId, connection: &Connection) {
    if let Err(error) = recompute_cached_balance(user_id, connection) {
        tracing::warn!("could not refresh the cached balance for {user_id}: {error}");
    }
}

/// List the caller's expenses.
pub async fn list_expenses_endpoint(
    State(state): State<LedgerEndpointState>,
    Extension(user_id): Extension<UserId>,
    Query(query): Query<ListEntriesQuery>,
) -> Result<Json<Paginated<LedgerEntry>>, Error> {
    list_entries_impl(LedgerKind::Expense, state, user_id, query).await
}

/// Record an expense for the caller.
pub async fn create_expense_endpoint(
    State(state): State<LedgerEndpointState>,
    Extension(user_id): Extension<UserId>,
    Json(form): Json<EntryForm>,
) -> Result<(StatusCode, Json<LedgerEntry>), Error> {
    create_entry_impl(LedgerKind::Expense, state, user_id, form).await
}

/// Update one of the caller's expenses.
pub async fn update_expense_endpoint(
    State(state): State<LedgerEndpointState>,
    Extension(user_id): Extension<UserId>,
    Path(entry_id): Path<LedgerEntryId>,
    Json(form): Json<EntryForm>,
) -> Result<Json<LedgerEntry>, Error> {
    update_entry_impl(LedgerKind::Expense, state, user_id, entry_id, form).await
}

/// Delete one of the caller's expenses.
pub async fn delete_expense_endpoint(
    State(state): State<LedgerEndpointState>,
    Extension(user_id): Extension<UserId>,
    Path(entry_id): Path<LedgerEntryId>,
) -> Result<StatusCode, Error> {
    delete_entry_impl(LedgerKind::Expense, state, user_id, entry_id).await
}

/// List the caller's income entries.
pub async fn list_incomes_endpoint(
    State(state): State<LedgerEndpointState>,
    Extension(user_id): Extension<UserId>,
    Query(query): Query<ListEntriesQuery>,
) -> Result<Json<Paginated<LedgerEntry>>, Error> {
    list_entries_impl(LedgerKind::Income, state, user_id, query).await
}

/// Record income for the caller.
pub async fn create_income_endpoint(
    State(state): State<LedgerEndpointState>,
    Extension(user_id): Extension<UserId>,
    Json(form): Json<EntryForm>,
) -> Result<(StatusCode, Json<LedgerEntry>), Error> {
    create_entry_impl(LedgerKind::Income, state, user_id, form).await
}

/// Update one of the caller's income entries.
pub async fn update_income_endpoint(
    State(state): State<LedgerEndpointState>,
    Extension(user_id): Extension<UserId>,
    Path(entry_id): Path<LedgerEntryId>,
    Json(form): Json<EntryForm>,
) -> Result<Json<LedgerEntry>, Error> {
    update_entry_impl(LedgerKind::Income, state, user_id, entry_id, form).await
}

/// Delete one of the caller's income entries.
pub async fn delete_income_endpoint(
    State(state): State<LedgerEndpointState>,
    Extension(user_id): Extension<UserId>,
    Path(entry_id): Path<LedgerEntryId>,
) -> Result<StatusCode, Error> {
    delete_entry_impl(LedgerKind::Income, state, user_id, entry_id).await
}
