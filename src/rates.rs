//! Display-only exchange rates for the caller's base currency.
//!
//! Rates come from the free open.er-api.com service and are never applied to
//! stored amounts. Every ledger amount stays in the currency it was recorded
//! in.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    currency::currency_for_code,
    db::lock_connection,
    profile::ensure_profile,
    user::UserId,
};

const RATES_URL: &str = "https://open.er-api.com/v6/latest";

/// The currencies shown on the rates card, in display order.
const POPULAR_CODES: [&str; 5] = ["PHP", "AED", "INR", "USD", "AUD"];

const USER_AGENT: &str = concat!(
    env!("CARGO_PKG_NAME"),
    "/",
    env!("CARGO_PKG_VERSION")
);

/// The state needed for the exchange rate endpoint.
#[derive(Debug, Clone)]
pub struct RatesEndpointState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The shared HTTP client for the rates service.
    pub http_client: reqwest::Client,
}

impl FromRef<AppState> for RatesEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            http_client: state.http_client.clone(),
        }
    }
}

/// Build the HTTP client used to fetch exchange rates.
pub fn rates_http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .user_agent(USER_AGENT)
        .build()
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    result: String,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

/// One quoted rate against the caller's base currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeRate {
    /// The ISO 4217 code of the quoted currency.
    pub code: String,
    /// The currency's display name, or the code when unknown.
    pub name: String,
    /// The currency's symbol, or the code when unknown.
    pub symbol: String,
    /// How many units of the quoted currency one unit of the base buys.
    pub rate: f64,
}

/// The rates card payload.
#[derive(Debug, Serialize)]
pub struct RatesCard {
    /// The base currency the rates are quoted against.
    pub base: String,
    /// The popular currencies, excluding the base itself.
    pub rates: Vec<ExchangeRate>,
}

/// Shape the raw rate table into the popular-currency list, skipping the
/// base currency and any code the service did not quote.
fn popular_rates(base: &str, rates: &HashMap<String, f64>) -> Vec<ExchangeRate> {
    POPULAR_CODES
        .iter()
        .filter(|code| **code != base)
        .filter_map(|code| {
            rates.get(*code).map(|rate| {
                let currency = currency_for_code(code);

                ExchangeRate {
                    code: (*code).to_owned(),
                    name: currency
                        .map(|currency| currency.name.to_owned())
                        .unwrap_or_else(|| (*code).to_owned()),
                    symbol: currency
                        .map(|currency| currency.symbol.to_owned())
                        .unwrap_or_else(|| (*code).to_owned()),
                    rate: *rate,
                }
            })
        })
        .collect()
}

/// Fetch current exchange rates against the caller's profile currency.
pub async fn rates_endpoint(
    State(state): State<RatesEndpointState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<RatesCard>, Error> {
    let base = {
        let connection = lock_connection(&state.db_connection)?;
        ensure_profile(user_id, &connection)?.currency
    };

    let response = state
        .http_client
        .get(format!("{RATES_URL}/{base}"))
        .send()
        .await
        .map_err(|error| Error::ExchangeRatesUnavailable(error.to_string()))?;

    let body: RatesResponse = response
        .json()
        .await
        .map_err(|error| Error::ExchangeRatesUnavailable(error.to_string()))?;

    if body.result != "success" {
        return Err(Error::ExchangeRatesUnavailable(format!(
            "the rates service answered with result {:?}",
            body.result
        )));
    }

    let rates = popular_rates(&base, &body.rates);

    Ok(Json(RatesCard { base, rates }))
}

#[cfg(test)]
mod rates_tests {
    use std::collections::HashMap;

    use super::popular_rates;

    fn rate_table() -> HashMap<String, f64> {
        HashMap::from([
            ("PHP".to_owned(), 56.2),
            ("AED".to_owned(), 3.67),
            ("INR".to_owned(), 83.1),
            ("USD".to_owned(), 1.0),
            ("AUD".to_owned(), 1.5),
            ("JPY".to_owned(), 149.3),
        ])
    }

    #[test]
    fn excludes_the_base_currency() {
        let rates = popular_rates("USD", &rate_table());

        assert_eq!(rates.len(), 4);
        assert!(rates.iter().all(|rate| rate.code != "USD"));
    }

    #[test]
    fn keeps_the_popular_display_order() {
        let rates = popular_rates("JPY", &rate_table());

        let codes: Vec<&str> = rates.iter().map(|rate| rate.code.as_str()).collect();
        assert_eq!(codes, ["PHP", "AED", "INR", "USD", "AUD"]);
    }

    #[test]
    fn resolves_names_and_symbols_from_the_directory() {
        let rates = popular_rates("USD", &rate_table());

        let php = rates.iter().find(|rate| rate.code == "PHP").unwrap();
        assert_eq!(php.symbol, "₱");
        assert_eq!(php.rate, 56.2);
    }

    #[test]
    fn skips_codes_the_service_did_not_quote() {
        let mut table = rate_table();
        table.remove("AED");

        let rates = popular_rates("USD", &table);

        assert!(rates.iter().all(|rate| rate.code != "AED"));
    }
}
