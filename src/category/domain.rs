//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, user::UserId};

/// A validated, non-empty category name of at most 100 characters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
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

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because
    /// if the invariant is violated it will cause incorrect behaviour but not
    /// affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a category labels money going out or coming in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    /// Labels expense entries.
    Expense,
    /// Labels income entries.
    Income,
}

impl CategoryKind {
    /// The database representation of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
        }
    }
}

/// Database identifier for a category.
pub type CategoryId = i64;

/// A label for ledger entries (e.g., 'Groceries', 'Salary').
///
/// Categories with no owner are global defaults visible to everyone; owned
/// categories are visible only to their owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    /// The category's id.
    pub id: CategoryId,
    /// The display name.
    pub name: CategoryName,
    /// The display color as a hex string, e.g. "#10b981".
    pub color: String,
    /// An optional icon tag understood by the client.
    pub icon: Option<String>,
    /// Which ledger this category labels.
    pub kind: CategoryKind,
    /// The owner, or `None` for a global default.
    pub owner: Option<UserId>,
}

/// The data needed to create a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    /// The display name.
    pub name: CategoryName,
    /// The display color as a hex string.
    pub color: String,
    /// An optional icon tag.
    pub icon: Option<String>,
    /// Which ledger this category labels.
    pub kind: CategoryKind,
    /// The owner of the category.
    pub owner: UserId,
}

/// One category's share of spending within a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpend {
    /// The category the expenses were labelled with.
    pub category: Category,
    /// The sum of expense amounts in the window.
    pub amount: f64,
    /// This category's share of the window total, 0 to 100.
    pub percentage: f64,
}
