//! Session handling for identities asserted by the external identity
//! provider.
//!
//! This crate never checks passwords. The identity provider calls
//! [set_session_cookie] once it has authenticated a user; from then on the
//! middleware in this module resolves the owner of each request from the
//! private session cookie and rejects requests without one.

pub(crate) mod cookie;
mod middleware;

pub use cookie::{DEFAULT_SESSION_DURATION, clear_session_cookie, set_session_cookie};
pub use middleware::{AuthState, auth_guard};
