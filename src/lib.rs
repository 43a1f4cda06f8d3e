//! Centavo is a personal finance tracker: log expenses and income, keep
//! recurring bills on schedule, and watch spending trends, cash flow, and a
//! financial health score roll up on the dashboard.
//!
//! This library provides the domain logic and a JSON REST API served by the
//! `server` binary. Authentication is delegated to an external identity
//! provider; this crate only validates the session cookie it issues.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod balance;
mod category;
mod currency;
mod db;
mod endpoints;
mod ledger;
mod logging;
mod pagination;
mod period;
mod profile;
mod rates;
mod recurring;
mod routing;
mod timezone;
mod user;

pub use app_state::AppState;
pub use auth::{clear_session_cookie, set_session_cookie};
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use pagination::PaginationConfig;
pub use routing::build_router;
pub use user::UserId;

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request carried no valid session cookie, so no owner could be
    /// resolved. Every operation requires a resolved owner.
    #[error("not authenticated")]
    NotAuthenticated,

    /// An amount was zero or negative. Amounts are always positive; whether
    /// money came in or went out is implied by the ledger a record belongs
    /// to, never by sign.
    #[error("amount must be greater than zero, got {0}")]
    InvalidAmount(f64),

    /// A transaction description exceeded the 500 character limit.
    #[error("description must be 500 characters or less, got {0}")]
    DescriptionTooLong(usize),

    /// An empty string was used where a name is required.
    #[error("name cannot be empty")]
    EmptyName,

    /// A name exceeded the 100 character limit.
    #[error("name must be 100 characters or less, got {0}")]
    NameTooLong(usize),

    /// There was an error parsing a date string.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not parse date \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// A currency code was not a 3-letter alphabetic code.
    #[error("invalid currency code \"{0}\"")]
    InvalidCurrencyCode(String),

    /// A recurring frequency was not one of the supported values.
    #[error("frequency must be weekly, monthly or yearly, got \"{0}\"")]
    InvalidFrequency(String),

    /// The requested resource was not found.
    ///
    /// Also returned when the resource exists but belongs to another owner,
    /// so that the API does not leak which ids exist.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The transactional mark-as-paid operation reported no success.
    ///
    /// The storage layer guarantees that no partial state change occurred:
    /// neither the expense was recorded nor the schedule advanced.
    #[error("the recurring item could not be marked as paid")]
    MarkAsPaidFailed,

    /// The third-party exchange-rate service could not be reached or returned
    /// an unusable response.
    #[error("exchange rates are unavailable: {0}")]
    ExchangeRatesUnavailable(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = match self {
            Error::NotAuthenticated => StatusCode::UNAUTHORIZED,
            Error::InvalidAmount(_)
            | Error::DescriptionTooLong(_)
            | Error::EmptyName
            | Error::NameTooLong(_)
            | Error::InvalidDateFormat(_, _)
            | Error::InvalidCurrencyCode(_)
            | Error::InvalidFrequency(_) => StatusCode::BAD_REQUEST,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::MarkAsPaidFailed => StatusCode::CONFLICT,
            Error::ExchangeRatesUnavailable(_) => StatusCode::BAD_GATEWAY,
            Error::DatabaseLockError | Error::SqlError(_) => {
                // These are not intended to be shown to the client.
                tracing::error!("An unexpected error occurred: {}", self);

                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "an internal error occurred" })),
                )
                    .into_response();
            }
        };

        (status_code, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
