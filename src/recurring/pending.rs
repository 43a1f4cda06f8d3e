//! Derived pending state for recurring items.
//!
//! Pending is never stored. It is a pure function of an item's
//! `last_processed_on` and `next_due_at` and the caller's "now", so stored
//! flags can never drift from the due-date and processed-date facts.

use time::{Duration, OffsetDateTime};

use crate::recurring::RecurringItem;

/// How far past its due date an item still counts as pending.
pub const LOOKBACK: Duration = Duration::days(7);

/// Whether the item was settled in the calendar month containing `now`.
pub fn is_settled_this_period(item: &RecurringItem, now: OffsetDateTime) -> bool {
    match item.last_processed_on {
        Some(processed) => {
            processed.year() == now.year() && processed.month() == now.month()
        }
        None => false,
    }
}

/// Whether the item's due date is no older than the lookback window.
pub fn is_within_lookback(item: &RecurringItem, now: OffsetDateTime) -> bool {
    item.next_due_at >= now - LOOKBACK
}

/// Whether the item still needs to be settled.
///
/// An item settled this month is never pending, even if its `next_due_at` is
/// overdue.
pub fn is_pending(item: &RecurringItem, now: OffsetDateTime) -> bool {
    !is_settled_this_period(item, now) && is_within_lookback(item, now)
}
