//! Core ledger domain types.
//!
//! Expenses and income are structurally identical records kept in separate
//! ledgers. Direction is implied by which ledger an entry belongs to, never
//! by the sign of the amount.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, category::CategoryId, user::UserId};

/// The largest amount a single entry may carry.
pub const MAX_AMOUNT: f64 = 999_999_999.99;

/// The longest description an entry may carry, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Which ledger an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerKind {
    /// Money going out.
    Expense,
    /// Money coming in.
    Income,
}

impl LedgerKind {
    /// The database representation of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
        }
    }
}

/// Database identifier for a ledger entry.
pub type LedgerEntryId = i64;

/// A dated, amount-bearing record in one of the two ledgers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    /// The entry's id.
    pub id: LedgerEntryId,
    /// Which ledger the entry belongs to.
    pub kind: LedgerKind,
    /// The amount, always positive.
    pub amount: f64,
    /// The ISO 4217 code the amount was entered in.
    pub currency: String,
    /// An optional free-text description.
    pub description: Option<String>,
    /// The category the entry is labelled with, if any.
    pub category_id: Option<CategoryId>,
    /// The calendar day the money moved.
    pub occurred_on: Date,
    /// When the record was created.
    pub created_at: OffsetDateTime,
    /// The owner of the entry.
    pub owner: UserId,
}

/// The data needed to create a ledger entry.
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    /// Which ledger the entry belongs to.
    pub kind: LedgerKind,
    /// The amount, always positive.
    pub amount: f64,
    /// The ISO 4217 code the amount was entered in.
    pub currency: String,
    /// An optional free-text description.
    pub description: Option<String>,
    /// The category the entry is labelled with, if any.
    pub category_id: Option<CategoryId>,
    /// The calendar day the money moved.
    pub occurred_on: Date,
    /// The owner of the entry.
    pub owner: UserId,
}

/// Validate an entry amount: strictly positive and at most [MAX_AMOUNT].
pub fn validate_amount(amount: f64) -> Result<f64, Error> {
    if amount > 0.0 && amount <= MAX_AMOUNT {
        Ok(amount)
    } else {
        Err(Error::InvalidAmount(amount))
    }
}

/// Validate an optional description against [MAX_DESCRIPTION_LENGTH].
pub fn validate_description(description: Option<String>) -> Result<Option<String>, Error> {
    match description {
        Some(text) if text.chars().count() > MAX_DESCRIPTION_LENGTH => {
            Err(Error::DescriptionTooLong(text.chars().count()))
        }
        other => Ok(other),
    }
}

/// Parse an ISO `YYYY-MM-DD` date string from a request payload.
pub fn parse_date(raw: &str) -> Result<Date, Error> {
    Date::parse(raw, &time::format_description::well_known::Iso8601::DATE)
        .map_err(|error| Error::InvalidDateFormat(error.to_string(), raw.to_owned()))
}

#[cfg(test)]
mod validation_tests {
    use time::macros::date;

    use crate::Error;

    use super::{parse_date, validate_amount, validate_description};

    #[test]
    fn amount_must_be_positive() {
        assert_eq!(validate_amount(0.0), Err(Error::InvalidAmount(0.0)));
        assert_eq!(validate_amount(-5.0), Err(Error::InvalidAmount(-5.0)));
        assert_eq!(validate_amount(5.0), Ok(5.0));
    }

    #[test]
    fn amount_is_capped() {
        assert_eq!(validate_amount(999_999_999.99), Ok(999_999_999.99));
        assert_eq!(
            validate_amount(1_000_000_000.0),
            Err(Error::InvalidAmount(1_000_000_000.0))
        );
    }

    #[test]
    fn description_length_is_capped() {
        assert!(validate_description(Some("a".repeat(500))).is_ok());
        assert_eq!(
            validate_description(Some("a".repeat(501))),
            Err(Error::DescriptionTooLong(501))
        );
        assert_eq!(validate_description(None), Ok(None));
    }

    #[test]
    fn parses_iso_dates() {
        assert_eq!(parse_date("2025-06-15"), Ok(date!(2025 - 06 - 15)));
        assert!(matches!(
            parse_date("15/06/2025"),
            Err(Error::InvalidDateFormat(_, _))
        ));
    }
}
