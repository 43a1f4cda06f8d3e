//! Database operations for recurring items.

use rusqlite::{Connection, Row, Transaction as SqlTransaction, TransactionBehavior, named_params};
use time::OffsetDateTime;

use crate::{
    Error,
    category::CategoryId,
    ledger::{LedgerEntryId, LedgerKind},
    period::{Frequency, next_due_date},
    profile::ensure_profile,
    recurring::{ItemName, NewRecurringItem, RecurringItem, RecurringItemId, is_pending},
    user::UserId,
};

/// Create a recurring item and return it with its generated ID.
pub fn create_item(item: NewRecurringItem, connection: &Connection) -> Result<RecurringItem, Error> {
    connection.execute(
        "INSERT INTO recurring_item \
             (name, amount, category_id, frequency, last_processed_on, next_due_at, user_id) \
         VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?6);",
        (
            item.name.as_ref(),
            item.amount,
            item.category_id,
            item.frequency.as_str(),
            item.next_due_at,
            item.owner.as_i64(),
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(RecurringItem {
        id,
        name: item.name,
        amount: item.amount,
        category_id: item.category_id,
        frequency: item.frequency,
        last_processed_on: None,
        next_due_at: item.next_due_at,
        owner: item.owner,
    })
}

/// Retrieve a single recurring item, scoped to its owner.
pub fn get_item(
    id: RecurringItemId,
    owner: UserId,
    connection: &Connection,
) -> Result<RecurringItem, Error> {
    connection
        .prepare(
            "SELECT id, name, amount, category_id, frequency, last_processed_on, next_due_at, \
                 user_id \
             FROM recurring_item WHERE id = :id AND user_id = :user_id;",
        )?
        .query_row(
            named_params! {":id": id, ":user_id": owner.as_i64()},
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve the owner's recurring items ordered by due date, soonest first.
pub fn list_items(owner: UserId, connection: &Connection) -> Result<Vec<RecurringItem>, Error> {
    connection
        .prepare(
            "SELECT id, name, amount, category_id, frequency, last_processed_on, next_due_at, \
                 user_id \
             FROM recurring_item WHERE user_id = :user_id ORDER BY next_due_at ASC;",
        )?
        .query_map(named_params! {":user_id": owner.as_i64()}, map_row)?
        .map(|maybe_item| maybe_item.map_err(|error| error.into()))
        .collect()
}

/// The owner's items that still need settling, judged at `now`.
pub fn list_pending(
    owner: UserId,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Vec<RecurringItem>, Error> {
    let items = list_items(owner, connection)?;

    Ok(items
        .into_iter()
        .filter(|item| is_pending(item, now))
        .collect())
}

/// The total amount the owner still owes this period, judged at `now`.
pub fn pending_total(
    owner: UserId,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<f64, Error> {
    Ok(list_pending(owner, now, connection)?
        .iter()
        .map(|item| item.amount)
        .sum())
}

/// Update an owned item. Mutating another owner's item reports not found.
pub fn update_item(
    id: RecurringItemId,
    owner: UserId,
    name: ItemName,
    amount: f64,
    category_id: Option<CategoryId>,
    frequency: Frequency,
    next_due_at: OffsetDateTime,
    connection: &Connection,
) -> Result<RecurringItem, Error> {
    let rows_affected = connection.execute(
        "UPDATE recurring_item \
         SET name = ?1, amount = ?2, category_id = ?3, frequency = ?4, next_due_at = ?5 \
         WHERE id = ?6 AND user_id = ?7;",
        (
            name.as_ref(),
            amount,
            category_id,
            frequency.as_str(),
            next_due_at,
            id,
            owner.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_item(id, owner, connection)
}

/// Delete an owned item. Deleting another owner's item reports not found.
pub fn delete_item(
    id: RecurringItemId,
    owner: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM recurring_item WHERE id = ?1 AND user_id = ?2;",
        (id, owner.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Settle a recurring item: post an expense for its amount dated `now` and
/// advance its schedule, all in one database transaction.
///
/// Either both the expense exists and the schedule is advanced, or neither.
/// The new `next_due_at` is one frequency unit beyond its previous value, not
/// beyond `now`, so a late payment does not shift the schedule.
///
/// Returns the id of the created expense.
pub fn mark_as_paid(
    id: RecurringItemId,
    owner: UserId,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<LedgerEntryId, Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let item = get_item(id, owner, &transaction)?;
    let currency = ensure_profile(owner, &transaction)?.currency;
    let today = now.date();

    transaction.execute(
        "INSERT INTO ledger_entry \
             (kind, amount, currency, description, category_id, occurred_on, created_at, user_id) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        (
            LedgerKind::Expense.as_str(),
            item.amount,
            &currency,
            item.name.as_ref(),
            item.category_id,
            today,
            now,
            owner.as_i64(),
        ),
    )?;
    let expense_id = transaction.last_insert_rowid();

    let advanced = item
        .next_due_at
        .replace_date(next_due_date(item.frequency, item.next_due_at.date()));

    let rows_affected = transaction.execute(
        "UPDATE recurring_item SET last_processed_on = ?1, next_due_at = ?2 \
         WHERE id = ?3 AND user_id = ?4;",
        (today, advanced, id, owner.as_i64()),
    )?;

    if rows_affected == 0 {
        // The transaction is dropped without a commit, rolling back the
        // expense insert.
        return Err(Error::MarkAsPaidFailed);
    }

    transaction.commit()?;

    Ok(expense_id)
}

/// Initialize the recurring item table and indexes.
pub fn create_recurring_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS recurring_item (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            amount REAL NOT NULL,
            category_id INTEGER REFERENCES category(id) ON DELETE SET NULL,
            frequency TEXT NOT NULL CHECK (frequency IN ('weekly', 'monthly', 'yearly')),
            last_processed_on TEXT,
            next_due_at TEXT NOT NULL,
            user_id INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_recurring_owner_due
            ON recurring_item(user_id, next_due_at);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<RecurringItem, rusqlite::Error> {
    let raw_name: String = row.get(1)?;
    let raw_frequency: String = row.get(4)?;

    let frequency = Frequency::parse(&raw_frequency).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(error))
    })?;

    Ok(RecurringItem {
        id: row.get(0)?,
        name: ItemName::new_unchecked(&raw_name),
        amount: row.get(2)?,
        category_id: row.get(3)?,
        frequency,
        last_processed_on: row.get(5)?,
        next_due_at: row.get(6)?,
        owner: UserId::new(row.get(7)?),
    })
}

#[cfg(test)]
mod recurring_query_tests {
    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime};

    use crate::{Error, db::initialize, period::Frequency, user::UserId};

    use super::{
        ItemName, NewRecurringItem, create_item, delete_item, get_item, list_items, list_pending,
        pending_total, update_item,
    };

    fn init_db() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn new_item(
        name: &str,
        amount: f64,
        next_due_at: OffsetDateTime,
        owner: UserId,
    ) -> NewRecurringItem {
        NewRecurringItem {
            name: ItemName::new_unchecked(name),
            amount,
            category_id: None,
            frequency: Frequency::Monthly,
            next_due_at,
            owner,
        }
    }

    #[test]
    fn list_orders_by_due_date_ascending() {
        let connection = init_db();
        let owner = UserId::new(1);
        let now = OffsetDateTime::now_utc();
        create_item(new_item("Rent", 500.0, now + Duration::days(10), owner), &connection)
            .unwrap();
        create_item(new_item("Netflix", 15.0, now + Duration::days(2), owner), &connection)
            .unwrap();

        let items = list_items(owner, &connection).unwrap();

        let names: Vec<&str> = items.iter().map(|i| i.name.as_ref()).collect();
        assert_eq!(names, vec!["Netflix", "Rent"]);
    }

    #[test]
    fn pending_total_sums_only_pending_items() {
        let connection = init_db();
        let owner = UserId::new(1);
        let now = OffsetDateTime::now_utc();
        // Due soon, never settled: pending.
        create_item(new_item("Rent", 500.0, now + Duration::days(2), owner), &connection)
            .unwrap();
        // Overdue beyond the lookback: not pending.
        create_item(new_item("Gym", 30.0, now - Duration::days(30), owner), &connection)
            .unwrap();

        let pending = list_pending(owner, now, &connection).unwrap();
        let total = pending_total(owner, now, &connection).unwrap();

        assert_eq!(pending.len(), 1);
        assert_eq!(total, 500.0);
    }

    #[test]
    fn update_is_owner_scoped() {
        let connection = init_db();
        let now = OffsetDateTime::now_utc();
        let item =
            create_item(new_item("Rent", 500.0, now, UserId::new(1)), &connection).unwrap();

        let result = update_item(
            item.id,
            UserId::new(2),
            ItemName::new_unchecked("Hijacked"),
            1.0,
            None,
            Frequency::Weekly,
            now,
            &connection,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn delete_removes_the_item() {
        let connection = init_db();
        let owner = UserId::new(1);
        let now = OffsetDateTime::now_utc();
        let item = create_item(new_item("Rent", 500.0, now, owner), &connection).unwrap();

        delete_item(item.id, owner, &connection).unwrap();

        assert_eq!(get_item(item.id, owner, &connection), Err(Error::NotFound));
    }
}

#[cfg(test)]
mod mark_as_paid_tests {
    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime};

    use crate::{
        db::initialize,
        period::{Frequency, next_due_date},
        recurring::is_pending,
        user::UserId,
    };

    use super::{ItemName, NewRecurringItem, create_item, get_item, mark_as_paid};

    fn init_db() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    #[test]
    fn settling_posts_an_expense_and_advances_the_schedule() {
        let connection = init_db();
        let owner = UserId::new(1);
        let now = OffsetDateTime::now_utc();
        let prior_due = now - Duration::days(3);
        let item = create_item(
            NewRecurringItem {
                name: ItemName::new_unchecked("Rent"),
                amount: 50.0,
                category_id: None,
                frequency: Frequency::Monthly,
                next_due_at: prior_due,
                owner,
            },
            &connection,
        )
        .unwrap();
        assert!(is_pending(&item, now));

        let expense_id = mark_as_paid(item.id, owner, now, &connection).unwrap();

        let (amount, occurred_on): (f64, time::Date) = connection
            .query_row(
                "SELECT amount, occurred_on FROM ledger_entry WHERE id = ?1 AND kind = 'expense';",
                [expense_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(amount, 50.0);
        assert_eq!(occurred_on, now.date());

        let settled = get_item(item.id, owner, &connection).unwrap();
        assert_eq!(settled.last_processed_on, Some(now.date()));
        // The schedule advances from the prior due date, not from now.
        assert_eq!(
            settled.next_due_at.date(),
            next_due_date(Frequency::Monthly, prior_due.date())
        );
        assert!(!is_pending(&settled, now));
    }

    #[test]
    fn settling_another_owners_item_reports_not_found() {
        let connection = init_db();
        let now = OffsetDateTime::now_utc();
        let item = create_item(
            NewRecurringItem {
                name: ItemName::new_unchecked("Rent"),
                amount: 50.0,
                category_id: None,
                frequency: Frequency::Monthly,
                next_due_at: now,
                owner: UserId::new(1),
            },
            &connection,
        )
        .unwrap();

        let result = mark_as_paid(item.id, UserId::new(2), now, &connection);

        assert_eq!(result, Err(crate::Error::NotFound));
    }

    #[test]
    fn settling_is_all_or_nothing() {
        let connection = init_db();
        let owner = UserId::new(1);
        let now = OffsetDateTime::now_utc();
        let item = create_item(
            NewRecurringItem {
                name: ItemName::new_unchecked("Rent"),
                amount: 50.0,
                category_id: None,
                frequency: Frequency::Monthly,
                next_due_at: now - Duration::days(3),
                owner,
            },
            &connection,
        )
        .unwrap();

        // Make the expense-insert half of the operation fail.
        connection
            .execute_batch(
                "CREATE TRIGGER block_expense_insert BEFORE INSERT ON ledger_entry \
                 BEGIN SELECT RAISE(ABORT, 'simulated failure'); END;",
            )
            .unwrap();

        let result = mark_as_paid(item.id, owner, now, &connection);

        assert!(result.is_err());
        let untouched = get_item(item.id, owner, &connection).unwrap();
        assert_eq!(untouched.last_processed_on, None);
        assert_eq!(untouched.next_due_at, item.next_due_at);

        let expense_count: i64 = connection
            .query_row("SELECT COUNT(*) FROM ledger_entry;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(expense_count, 0);
    }
}
