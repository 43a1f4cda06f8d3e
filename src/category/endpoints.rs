//! JSON endpoints for managing categories.

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
    category::{
        Category, CategoryId, CategoryKind, CategoryName, CategorySpend, NewCategory,
        create_category, delete_category, expense_stats_for_window, list_categories,
        update_category,
    },
    db::lock_connection,
    period::{Grain, date_range_for_grain},
    timezone::now_local,
    user::UserId,
};

/// The default color for categories created without one.
const DEFAULT_COLOR: &str = "#64748b";

/// The state needed for the category endpoints.
#[derive(Debug, Clone)]
pub struct CategoryEndpointState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name.
    pub local_timezone: String,
}

impl FromRef<AppState> for CategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    kind: Option<CategoryKind>,
}

/// List the categories visible to the caller, optionally filtered by kind.
pub async fn list_categories_endpoint(
    State(state): State<CategoryEndpointState>,
    Extension(user_id): Extension<UserId>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let categories = list_categories(user_id, query.kind, &connection)?;

    Ok(Json(categories))
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryForm {
    name: String,
    color: Option<String>,
    icon: Option<String>,
    kind: CategoryKind,
}

/// Create a category for the caller.
pub async fn create_category_endpoint(
    State(state): State<CategoryEndpointState>,
    Extension(user_id): Extension<UserId>,
    Json(form): Json<CategoryForm>,
) -> Result<(StatusCode, Json<Category>), Error> {
    let name = CategoryName::new(&form.name)?;
    let connection = lock_connection(&state.db_connection)?;

    let category = create_category(
        NewCategory {
            name,
            color: form.color.unwrap_or_else(|| DEFAULT_COLOR.to_owned()),
            icon: form.icon,
            kind: form.kind,
            owner: user_id,
        },
        &connection,
    )?;

    Ok((StatusCode::CREATED, Json(category)))
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryPatch {
    name: String,
    color: Option<String>,
    icon: Option<String>,
}

/// Update one of the caller's categories.
pub async fn update_category_endpoint(
    State(state): State<CategoryEndpointState>,
    Extension(user_id): Extension<UserId>,
    Path(category_id): Path<CategoryId>,
    Json(patch): Json<CategoryPatch>,
) -> Result<Json<Category>, Error> {
    let name = CategoryName::new(&patch.name)?;
    let connection = lock_connection(&state.db_connection)?;

    let category = update_category(
        category_id,
        user_id,
        name,
        patch.color.unwrap_or_else(|| DEFAULT_COLOR.to_owned()),
        patch.icon,
        &connection,
    )?;

    Ok(Json(category))
}

/// Delete one of the caller's categories.
pub async fn delete_category_endpoint(
    State(state): State<CategoryEndpointState>,
    Extension(user_id): Extension<UserId>,
    Path(category_id): Path<CategoryId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_category(category_id, user_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatsQuery {
    grain: Option<Grain>,
}

/// Per-category spending shares for the current period.
pub async fn category_stats_endpoint(
    State(state): State<CategoryEndpointState>,
    Extension(user_id): Extension<UserId>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Vec<CategorySpend>>, Error> {
    let today = now_local(&state.local_timezone).date();
    let range = date_range_for_grain(query.grain.unwrap_or(Grain::Month), today);
    let connection = lock_connection(&state.db_connection)?;

    let stats = expense_stats_for_window(user_id, range.start, range.end, &connection)?;

    Ok(Json(stats))
}

#[cfg(test)]
mod category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Router, middleware,
        routing::{get, post},
    };
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{db::initialize, user::UserId};

    use super::{
        CategoryEndpointState, create_category_endpoint, delete_category_endpoint,
        list_categories_endpoint, update_category_endpoint,
    };

    fn get_test_server() -> TestServer {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let state = CategoryEndpointState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        let app = Router::new()
            .route(
                "/api/categories",
                get(list_categories_endpoint).post(create_category_endpoint),
            )
            .route(
                "/api/categories/{category_id}",
                post(update_category_endpoint).delete(delete_category_endpoint),
            )
            .layer(middleware::from_fn(
                |mut request: axum::extract::Request, next: axum::middleware::Next| async move {
                    request.extensions_mut().insert(UserId::new(1));
                    next.run(request).await
                },
            ))
            .with_state(state);

        TestServer::new(app)
    }

    #[tokio::test]
    async fn create_then_list_round_trip() {
        let server = get_test_server();

        let response = server
            .post("/api/categories")
            .json(&json!({ "name": "Groceries", "kind": "expense", "color": "#10b981" }))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);

        let listed: Value = server.get("/api/categories").await.json();
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["name"], "Groceries");
    }

    #[tokio::test]
    async fn create_rejects_empty_name() {
        let server = get_test_server();

        let response = server
            .post("/api/categories")
            .json(&json!({ "name": "  ", "kind": "expense" }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn delete_missing_category_is_not_found() {
        let server = get_test_server();

        let response = server.delete("/api/categories/42").await;

        response.assert_status_not_found();
    }
}
