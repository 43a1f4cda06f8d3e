//! Database initialization for the application.
//!
//! Each feature module owns its table schema; this module wires them together
//! so the whole schema is created in a single exclusive transaction.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, category::create_category_table, ledger::create_ledger_table,
    profile::create_profile_table, recurring::create_recurring_table,
};

/// Acquire the shared database connection for the duration of a request.
pub(crate) fn lock_connection(
    connection: &Arc<Mutex<Connection>>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}

/// Create all of the application's tables if they do not exist yet.
///
/// # Errors
/// Returns an error if the schema could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_profile_table(&transaction)?;
    create_category_table(&transaction)?;
    create_ledger_table(&transaction)?;
    create_recurring_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
