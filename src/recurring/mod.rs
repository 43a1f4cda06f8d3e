//! Recurring bills and subscriptions.

mod db;
mod domain;
mod endpoints;
pub(crate) mod pending;

pub use db::{
    create_item, create_recurring_table, delete_item, get_item, list_items, list_pending,
    mark_as_paid, pending_total, update_item,
};
pub use domain::{Frequency, ItemName, NewRecurringItem, RecurringItem, RecurringItemId};
pub use endpoints::{
    PendingSummary, RecurringEndpointState, create_recurring_endpoint, delete_recurring_endpoint,
    list_pending_endpoint, list_recurring_endpoint, mark_as_paid_endpoint,
    update_recurring_endpoint,
};
pub use pending::{LOOKBACK, is_pending, is_settled_this_period, is_within_lookback};
