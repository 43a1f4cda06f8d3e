//! Core recurring obligation domain types.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, category::CategoryId, user::UserId};

pub use crate::period::Frequency;

/// A validated, non-empty obligation name of at most 100 characters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct ItemName(String);

impl ItemName {
    /// Create an obligation name.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyName] if `name` is empty after trimming, or
    /// [Error::NameTooLong] if it exceeds 100 characters.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyName)
        } else if name.chars().count() > 100 {
            Err(Error::NameTooLong(name.chars().count()))
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create an obligation name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for ItemName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for ItemName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Database identifier for a recurring item.
pub type RecurringItemId = i64;

/// A recurring bill or subscription with a schedule.
///
/// Whether an item is pending is never stored; it is derived from
/// `last_processed_on` and `next_due_at` by the functions in
/// [crate::recurring::pending].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurringItem {
    /// The item's id.
    pub id: RecurringItemId,
    /// The display name, e.g. "Rent".
    pub name: ItemName,
    /// The amount charged each period, always positive.
    pub amount: f64,
    /// The category posted expenses are labelled with, if any.
    pub category_id: Option<CategoryId>,
    /// How often the obligation falls due.
    pub frequency: Frequency,
    /// The day the item was last settled, if ever.
    pub last_processed_on: Option<Date>,
    /// When the obligation next falls due.
    pub next_due_at: OffsetDateTime,
    /// The owner of the item.
    pub owner: UserId,
}

/// The data needed to create a recurring item.
#[derive(Debug, Clone)]
pub struct NewRecurringItem {
    /// The display name.
    pub name: ItemName,
    /// The amount charged each period, always positive.
    pub amount: f64,
    /// The category posted expenses are labelled with, if any.
    pub category_id: Option<CategoryId>,
    /// How often the obligation falls due.
    pub frequency: Frequency,
    /// When the obligation first falls due.
    pub next_due_at: OffsetDateTime,
    /// The owner of the item.
    pub owner: UserId,
}
