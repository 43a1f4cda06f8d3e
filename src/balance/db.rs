//! Database-backed balance computations.

use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    balance::{BalancePoint, CashFlow, balance_history, cash_flow},
    ledger::{LedgerKind, daily_totals, lifetime_total, total_for_window},
    profile::set_cached_balance,
    user::UserId,
};

/// The owner's authoritative lifetime balance: all-time income minus
/// all-time expenses.
///
/// As a side effect the result is written to the profile's cached balance.
/// The write is fire and forget; a failure is logged and the fresh value is
/// still returned.
pub fn current_balance(owner: UserId, connection: &Connection) -> Result<f64, Error> {
    let balance = compute_balance(owner, connection)?;

    if let Err(error) = set_cached_balance(owner, balance, connection) {
        tracing::warn!("could not write the cached balance for {owner}: {error}");
    }

    Ok(balance)
}

/// Recompute the owner's balance and write it to the profile cache.
///
/// Unlike [current_balance] a cache-write failure is reported, so callers
/// that only wanted the refresh can log it.
pub fn recompute_cached_balance(owner: UserId, connection: &Connection) -> Result<f64, Error> {
    let balance = compute_balance(owner, connection)?;

    set_cached_balance(owner, balance, connection)?;

    Ok(balance)
}

fn compute_balance(owner: UserId, connection: &Connection) -> Result<f64, Error> {
    let income = lifetime_total(LedgerKind::Income, owner, connection)?;
    let expenses = lifetime_total(LedgerKind::Expense, owner, connection)?;

    Ok(income - expenses)
}

/// The owner's cash flow over `[start, end]`.
pub fn cash_flow_for_window(
    owner: UserId,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<CashFlow, Error> {
    let income = total_for_window(LedgerKind::Income, owner, start, end, connection)?;
    let expenses = total_for_window(LedgerKind::Expense, owner, start, end, connection)?;

    Ok(cash_flow(income, expenses))
}

/// The owner's relative balance trajectory over the `days` up to `today`.
pub fn balance_history_for_owner(
    owner: UserId,
    days: u32,
    today: Date,
    connection: &Connection,
) -> Result<Vec<BalancePoint>, Error> {
    let start = today - time::Duration::days(days as i64);
    let income = daily_totals(LedgerKind::Income, owner, start, today, connection)?;
    let expenses = daily_totals(LedgerKind::Expense, owner, start, today, connection)?;

    Ok(balance_history(days, today, &income, &expenses))
}

#[cfg(test)]
mod balance_db_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        db::initialize,
        ledger::{LedgerKind, NewLedgerEntry, create_entry},
        profile::ensure_profile,
        user::UserId,
    };

    use super::{cash_flow_for_window, current_balance, recompute_cached_balance};

    fn init_db() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn insert(kind: LedgerKind, amount: f64, day: time::Date, owner: UserId, conn: &Connection) {
        create_entry(
            NewLedgerEntry {
                kind,
                amount,
                currency: "PHP".to_owned(),
                description: None,
                category_id: None,
                occurred_on: day,
                owner,
            },
            conn,
        )
        .unwrap();
    }

    #[test]
    fn balance_is_lifetime_income_minus_expenses() {
        let connection = init_db();
        let owner = UserId::new(1);
        insert(LedgerKind::Income, 1000.0, date!(2024 - 01 - 01), owner, &connection);
        insert(LedgerKind::Expense, 400.0, date!(2025 - 06 - 15), owner, &connection);

        let balance = current_balance(owner, &connection).unwrap();

        assert_eq!(balance, 600.0);
    }

    #[test]
    fn current_balance_refreshes_the_profile_cache() {
        let connection = init_db();
        let owner = UserId::new(1);
        insert(LedgerKind::Income, 250.0, date!(2025 - 06 - 01), owner, &connection);

        current_balance(owner, &connection).unwrap();

        let profile = ensure_profile(owner, &connection).unwrap();
        assert_eq!(profile.current_balance, 250.0);
    }

    #[test]
    fn recompute_repairs_a_stale_cache() {
        let connection = init_db();
        let owner = UserId::new(1);
        crate::profile::set_cached_balance(owner, 9999.0, &connection).unwrap();
        insert(LedgerKind::Income, 100.0, date!(2025 - 06 - 01), owner, &connection);

        let balance = recompute_cached_balance(owner, &connection).unwrap();

        assert_eq!(balance, 100.0);
        let profile = ensure_profile(owner, &connection).unwrap();
        assert_eq!(profile.current_balance, 100.0);
    }

    #[test]
    fn cash_flow_matches_the_monthly_scenario() {
        let connection = init_db();
        let owner = UserId::new(1);
        insert(LedgerKind::Income, 1000.0, date!(2025 - 06 - 05), owner, &connection);
        insert(LedgerKind::Expense, 400.0, date!(2025 - 06 - 20), owner, &connection);

        let flow = cash_flow_for_window(
            owner,
            date!(2025 - 06 - 01),
            date!(2025 - 06 - 30),
            &connection,
        )
        .unwrap();

        assert_eq!(flow.total_income, 1000.0);
        assert_eq!(flow.total_expenses, 400.0);
        assert_eq!(flow.net_cash_flow, 600.0);
        assert_eq!(flow.cash_flow_percentage, 60.0);
    }
}
