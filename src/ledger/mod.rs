//! The expense and income ledgers.

mod db;
mod domain;
mod endpoints;

pub use db::{
    EntryFilter, count_entries, create_entry, create_ledger_table, daily_totals, delete_entry,
    get_entry, lifetime_total, list_entries, total_for_window, update_entry,
};
pub use domain::{
    LedgerEntry, LedgerEntryId, LedgerKind, MAX_AMOUNT, MAX_DESCRIPTION_LENGTH, NewLedgerEntry,
    parse_date, validate_amount, validate_description,
};
pub use endpoints::{
    LedgerEndpointState, create_expense_endpoint, create_income_endpoint, delete_expense_endpoint,
    delete_income_endpoint, list_expenses_endpoint, list_incomes_endpoint, update_expense_endpoint,
    update_income_endpoint,
};
