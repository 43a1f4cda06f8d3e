//! The identity of the owner of every record in the application.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The id of a user as asserted by the external identity provider.
///
/// Every query and mutation is scoped to a `UserId`; rows belonging to other
/// users are invisible, not forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(i64);

impl UserId {
    /// Create a user id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The id as an integer, for use in database queries.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
