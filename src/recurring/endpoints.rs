//! JSON endpoints for recurring items.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
    AppState, Error,
    category::CategoryId,
    db::lock_connection,
    ledger::validate_amount,
    period::Frequency,
    recurring::{
        ItemName, NewRecurringItem, RecurringItem, RecurringItemId, create_item, delete_item,
        list_items, list_pending, mark_as_paid, pending_total, update_item,
    },
    timezone::now_local,
    user::UserId,
};

/// The state needed for the recurring item endpoints.
#[derive(Debug, Clone)]
pub struct RecurringEndpointState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name.
    pub local_timezone: String,
}

impl FromRef<AppState> for RecurringEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecurringForm {
    name: String,
    amount: f64,
    category_id: Option<CategoryId>,
    frequency: Frequency,
    next_due_at: String,
}

/// The pending items and what they add up to.
#[derive(Debug, Serialize)]
pub struct PendingSummary {
    /// The items that still need settling this period.
    pub items: Vec<RecurringItem>,
    /// The sum of their amounts.
    pub total: f64,
}

fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, Error> {
    OffsetDateTime::parse(raw, &Rfc3339)
        .map_err(|error| Error::InvalidDateFormat(error.to_string(), raw.to_owned()))
}

/// List the caller's recurring items, soonest due first.
pub async fn list_recurring_endpoint(
    State(state): State<RecurringEndpointState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<Vec<RecurringItem>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let items = list_items(user_id, &connection)?;

    Ok(Json(items))
}

/// List the caller's pending items and their total.
pub async fn list_pending_endpoint(
    State(state): State<RecurringEndpointState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<PendingSummary>, Error> {
    let now = now_local(&state.local_timezone);
    let connection = lock_connection(&state.db_connection)?;

    let items = list_pending(user_id, now, &connection)?;
    let total = pending_total(user_id, now, &connection)?;

    Ok(Json(PendingSummary { items, total }))
}

/// Create a recurring item for the caller.
pub async fn create_recurring_endpoint(
    State(state): State<RecurringEndpointState>,
    Extension(user_id): Extension<UserId>,
    Json(form): Json<RecurringForm>,
) -> Result<(StatusCode, Json<RecurringItem>), Error> {
    let name = ItemName::new(&form.name)?;
    let amount = validate_amount(form.amount)?;
    let next_due_at = parse_timestamp(&form.next_due_at)?;
    let connection = lock_connection(&state.db_connection)?;

    let item = create_item(
        NewRecurringItem {
            name,
            amount,
            category_id: form.category_id,
            frequency: form.frequency,
            next_due_at,
            owner: user_id,
        },
        &connection,
    )?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// Update one of the caller's recurring items.
pub async fn update_recurring_endpoint(
    State(state): State<RecurringEndpointState>,
    Extension(user_id): Extension<UserId>,
    Path(item_id): Path<RecurringItemId>,
    Json(form): Json<RecurringForm>,
) -> Result<Json<RecurringItem>, Error> {
    let name = ItemName::new(&form.name)?;
    let amount = validate_amount(form.amount)?;
    let next_due_at = parse_timestamp(&form.next_due_at)?;
    let connection = lock_connection(&state.db_connection)?;

    let item = update_item(
        item_id,
        user_id,
        name,
        amount,
        form.category_id,
        form.frequency,
        next_due_at,
        &connection,
    )?;

    Ok(Json(item))
}

/// Delete one of the caller's recurring items.
pub async fn delete_recurring_endpoint(
    State(state): State<RecurringEndpointState>,
    Extension(user_id): Extension<UserId>,
    Path(item_id): Path<RecurringItemId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_item(item_id, user_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Settle one of the caller's recurring items.
///
/// Posts an expense and advances the schedule atomically; on failure nothing
/// is recorded.
pub async fn mark_as_paid_endpoint(
    State(state): State<RecurringEndpointState>,
    Extension(user_id): Extension<UserId>,
    Path(item_id): Path<RecurringItemId>,
) -> Result<Json<Value>, Error> {
    let now = now_local(&state.local_timezone);
    let connection = lock_connection(&state.db_connection)?;

    let expense_id = mark_as_paid(item_id, user_id, now, &connection)?;

    Ok(Json(json!({ "success": true, "expense_id": expense_id })))
}

#[cfg(test)]
mod recurring_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Router, middleware,
        routing::{get, post},
    };
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};
    use time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339};

    use crate::{
        db::initialize,
        endpoints::{self, format_endpoint},
        user::UserId,
    };

    use super::{
        RecurringEndpointState, create_recurring_endpoint, list_pending_endpoint,
        list_recurring_endpoint, mark_as_paid_endpoint,
    };

    fn get_test_server() -> TestServer {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let state = RecurringEndpointState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        let app = Router::new()
            .route(
                endpoints::RECURRING,
                get(list_recurring_endpoint).post(create_recurring_endpoint),
            )
            .route(endpoints::RECURRING_PENDING, get(list_pending_endpoint))
            .route(endpoints::RECURRING_PAY, post(mark_as_paid_endpoint))
            .layer(middleware::from_fn(
                |mut request: axum::extract::Request, next: axum::middleware::Next| async move {
                    request.extensions_mut().insert(UserId::new(1));
                    next.run(request).await
                },
            ))
            .with_state(state);

        TestServer::new(app)
    }

    fn due_in(days: i64) -> String {
        (OffsetDateTime::now_utc() + Duration::days(days))
            .format(&Rfc3339)
            .unwrap()
    }

    #[tokio::test]
    async fn create_then_settle_round_trip() {
        let server = get_test_server();

        let created: Value = server
            .post(endpoints::RECURRING)
            .json(&json!({
                "name": "Rent",
                "amount": 50.0,
                "frequency": "monthly",
                "next_due_at": due_in(-3)
            }))
            .await
            .json();
        let item_id = created["id"].as_i64().unwrap();

        let pending: Value = server.get(endpoints::RECURRING_PENDING).await.json();
        assert_eq!(pending["total"], 50.0);
        assert_eq!(pending["items"].as_array().unwrap().len(), 1);

        let paid: Value = server
            .post(&format_endpoint(endpoints::RECURRING_PAY, item_id))
            .await
            .json();
        assert_eq!(paid["success"], true);
        assert!(paid["expense_id"].as_i64().unwrap() > 0);

        let pending: Value = server.get(endpoints::RECURRING_PENDING).await.json();
        assert_eq!(pending["items"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn create_rejects_unknown_frequency() {
        let server = get_test_server();

        let response = server
            .post(endpoints::RECURRING)
            .json(&json!({
                "name": "Rent",
                "amount": 50.0,
                "frequency": "fortnightly",
                "next_due_at": due_in(1)
            }))
            .await;

        assert!(response.status_code().is_client_error());
    }

    #[tokio::test]
    async fn settling_a_missing_item_is_not_found() {
        let server = get_test_server();

        let response = server
            .post(&format_endpoint(endpoints::RECURRING_PAY, 9000))
            .await;

        response.assert_status_not_found();
    }
}
