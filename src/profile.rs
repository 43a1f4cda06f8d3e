//! Per-user profile settings and the cached balance.
//!
//! A profile row is created lazily the first time an owner touches the API.
//! The cached balance on the profile is a denormalized copy of the
//! authoritative ledger sums and is allowed to lag behind them.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::{Connection, Row, named_params};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{AppState, Error, currency::validate_currency_code, db::lock_connection, user::UserId};

/// The accent theme a profile may select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeAccent {
    /// The default blue accent.
    Blue,
    /// Emerald green.
    Emerald,
    /// Violet.
    Violet,
    /// Rose.
    Rose,
}

impl ThemeAccent {
    /// The database representation of the theme.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Emerald => "emerald",
            Self::Violet => "violet",
            Self::Rose => "rose",
        }
    }

    fn from_db(value: &str) -> Self {
        match value {
            "emerald" => Self::Emerald,
            "violet" => Self::Violet,
            "rose" => Self::Rose,
            _ => Self::Blue,
        }
    }
}

/// An owner's settings and cached balance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    /// The owner this profile belongs to.
    pub owner: UserId,
    /// The email asserted by the identity provider, if recorded.
    pub email: Option<String>,
    /// The selected accent theme.
    pub theme: ThemeAccent,
    /// Whether the client should render in dark mode.
    pub dark_mode: bool,
    /// The display currency as an ISO 4217 code.
    pub currency: String,
    /// The cached lifetime balance. Not authoritative; see module docs.
    pub current_balance: f64,
    /// When the profile row was created.
    pub created_at: OffsetDateTime,
}

/// Fetch the owner's profile, creating it with defaults on first access.
pub fn ensure_profile(owner: UserId, connection: &Connection) -> Result<Profile, Error> {
    connection.execute(
        "INSERT OR IGNORE INTO profile (user_id, theme, dark_mode, currency, current_balance, created_at) \
         VALUES (?1, 'blue', 0, 'PHP', 0, ?2);",
        (owner.as_i64(), OffsetDateTime::now_utc()),
    )?;

    connection
        .prepare(
            "SELECT user_id, email, theme, dark_mode, currency, current_balance, created_at \
             FROM profile WHERE user_id = :user_id;",
        )?
        .query_row(named_params! {":user_id": owner.as_i64()}, map_row)
        .map_err(|error| error.into())
}

/// Overwrite the cached balance on the owner's profile.
pub fn set_cached_balance(
    owner: UserId,
    balance: f64,
    connection: &Connection,
) -> Result<(), Error> {
    ensure_profile(owner, connection)?;

    connection.execute(
        "UPDATE profile SET current_balance = ?1 WHERE user_id = ?2;",
        (balance, owner.as_i64()),
    )?;

    Ok(())
}

/// The updatable profile fields. Absent fields keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct ProfilePatch {
    /// A new contact email.
    pub email: Option<String>,
    /// A new accent theme.
    pub theme: Option<ThemeAccent>,
    /// A new dark mode preference.
    pub dark_mode: Option<bool>,
    /// A new display currency code.
    pub currency: Option<String>,
}

/// Apply a patch to the owner's profile and return the updated profile.
pub fn update_profile(
    owner: UserId,
    patch: ProfilePatch,
    connection: &Connection,
) -> Result<Profile, Error> {
    let current = ensure_profile(owner, connection)?;

    let currency = match patch.currency {
        Some(code) => validate_currency_code(&code)?,
        None => current.currency,
    };

    connection.execute(
        "UPDATE profile SET email = ?1, theme = ?2, dark_mode = ?3, currency = ?4 \
         WHERE user_id = ?5;",
        (
            patch.email.or(current.email),
            patch.theme.unwrap_or(current.theme).as_str(),
            patch.dark_mode.unwrap_or(current.dark_mode),
            currency,
            owner.as_i64(),
        ),
    )?;

    ensure_profile(owner, connection)
}

/// Initialize the profile table.
pub fn create_profile_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS profile (
            user_id INTEGER PRIMARY KEY,
            email TEXT,
            theme TEXT NOT NULL DEFAULT 'blue',
            dark_mode INTEGER NOT NULL DEFAULT 0,
            currency TEXT NOT NULL DEFAULT 'PHP',
            current_balance REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Profile, rusqlite::Error> {
    let raw_theme: String = row.get(2)?;

    Ok(Profile {
        owner: UserId::new(row.get(0)?),
        email: row.get(1)?,
        theme: ThemeAccent::from_db(&raw_theme),
        dark_mode: row.get(3)?,
        currency: row.get(4)?,
        current_balance: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// The state needed for the profile endpoints.
#[derive(Debug, Clone)]
pub struct ProfileEndpointState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProfileEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Fetch the caller's profile.
pub async fn get_profile_endpoint(
    State(state): State<ProfileEndpointState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<Profile>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let profile = ensure_profile(user_id, &connection)?;

    Ok(Json(profile))
}

/// Update the caller's profile settings.
pub async fn update_profile_endpoint(
    State(state): State<ProfileEndpointState>,
    Extension(user_id): Extension<UserId>,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<Profile>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let profile = update_profile(user_id, patch, &connection)?;

    Ok(Json(profile))
}

#[cfg(test)]
mod profile_tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize, user::UserId};

    use super::{ProfilePatch, ThemeAccent, ensure_profile, set_cached_balance, update_profile};

    fn init_db() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    #[test]
    fn first_access_creates_default_profile() {
        let connection = init_db();

        let profile = ensure_profile(UserId::new(1), &connection).unwrap();

        assert_eq!(profile.currency, "PHP");
        assert_eq!(profile.theme, ThemeAccent::Blue);
        assert!(!profile.dark_mode);
        assert_eq!(profile.current_balance, 0.0);
    }

    #[test]
    fn second_access_returns_the_same_row() {
        let connection = init_db();
        let owner = UserId::new(1);

        let first = ensure_profile(owner, &connection).unwrap();
        let second = ensure_profile(owner, &connection).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn patch_updates_only_provided_fields() {
        let connection = init_db();
        let owner = UserId::new(1);

        let profile = update_profile(
            owner,
            ProfilePatch {
                theme: Some(ThemeAccent::Rose),
                dark_mode: Some(true),
                ..ProfilePatch::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(profile.theme, ThemeAccent::Rose);
        assert!(profile.dark_mode);
        assert_eq!(profile.currency, "PHP");
    }

    #[test]
    fn patch_rejects_bad_currency() {
        let connection = init_db();

        let result = update_profile(
            UserId::new(1),
            ProfilePatch {
                currency: Some("PESOS".to_owned()),
                ..ProfilePatch::default()
            },
            &connection,
        );

        assert_eq!(
            result,
            Err(Error::InvalidCurrencyCode("PESOS".to_owned()))
        );
    }

    #[test]
    fn cached_balance_round_trips() {
        let connection = init_db();
        let owner = UserId::new(1);

        set_cached_balance(owner, 1234.5, &connection).unwrap();

        let profile = ensure_profile(owner, &connection).unwrap();
        assert_eq!(profile.current_balance, 1234.5);
    }
}
