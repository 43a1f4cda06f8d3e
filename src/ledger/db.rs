//! Database operations for the expense and income ledgers.

use rusqlite::{Connection, Row, ToSql, named_params, params_from_iter};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    category::CategoryId,
    ledger::{LedgerEntry, LedgerEntryId, LedgerKind, NewLedgerEntry},
    user::UserId,
};

/// Optional conjunctive filters for listing ledger entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryFilter {
    /// Keep entries on or after this day.
    pub start: Option<Date>,
    /// Keep entries on or before this day.
    pub end: Option<Date>,
    /// Keep entries labelled with this category.
    pub category_id: Option<CategoryId>,
}

impl EntryFilter {
    fn clauses_and_params(&self, sql: &mut String, params: &mut Vec<Box<dyn ToSql>>) {
        if let Some(start) = self.start {
            sql.push_str(" AND occurred_on >= ?");
            params.push(Box::new(start));
        }

        if let Some(end) = self.end {
            sql.push_str(" AND occurred_on <= ?");
            params.push(Box::new(end));
        }

        if let Some(category_id) = self.category_id {
            sql.push_str(" AND category_id = ?");
            params.push(Box::new(category_id));
        }
    }
}

/// Create a ledger entry and return it with its generated ID.
pub fn create_entry(entry: NewLedgerEntry, connection: &Connection) -> Result<LedgerEntry, Error> {
    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO ledger_entry \
             (kind, amount, currency, description, category_id, occurred_on, created_at, user_id) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        (
            entry.kind.as_str(),
            entry.amount,
            &entry.currency,
            &entry.description,
            entry.category_id,
            entry.occurred_on,
            created_at,
            entry.owner.as_i64(),
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(LedgerEntry {
        id,
        kind: entry.kind,
        amount: entry.amount,
        currency: entry.currency,
        description: entry.description,
        category_id: entry.category_id,
        occurred_on: entry.occurred_on,
        created_at,
        owner: entry.owner,
    })
}

/// Retrieve a single entry from `kind`'s ledger, scoped to its owner.
pub fn get_entry(
    id: LedgerEntryId,
    kind: LedgerKind,
    owner: UserId,
    connection: &Connection,
) -> Result<LedgerEntry, Error> {
    connection
        .prepare(
            "SELECT id, kind, amount, currency, description, category_id, occurred_on, \
                 created_at, user_id \
             FROM ledger_entry WHERE id = :id AND kind = :kind AND user_id = :user_id;",
        )?
        .query_row(
            named_params! {":id": id, ":kind": kind.as_str(), ":user_id": owner.as_i64()},
            map_row,
        )
        .map_err(|error| error.into())
}

/// Count the owner's entries in `kind`'s ledger that match `filter`.
///
/// Runs independently of [list_entries]; a write between the two queries may
/// skew the count by a few rows, which is acceptable for paging.
pub fn count_entries(
    kind: LedgerKind,
    owner: UserId,
    filter: EntryFilter,
    connection: &Connection,
) -> Result<u64, Error> {
    let mut sql =
        String::from("SELECT COUNT(*) FROM ledger_entry WHERE user_id = ? AND kind = ?");
    let mut params: Vec<Box<dyn ToSql>> =
        vec![Box::new(owner.as_i64()), Box::new(kind.as_str())];
    filter.clauses_and_params(&mut sql, &mut params);

    let count: i64 = connection
        .prepare(&sql)?
        .query_row(params_from_iter(params.iter().map(|p| p.as_ref())), |row| {
            row.get(0)
        })?;

    Ok(count as u64)
}

/// Retrieve one page of the owner's entries in `kind`'s ledger, newest first.
pub fn list_entries(
    kind: LedgerKind,
    owner: UserId,
    filter: EntryFilter,
    limit: u64,
    offset: u64,
    connection: &Connection,
) -> Result<Vec<LedgerEntry>, Error> {
    let mut sql = String::from(
        "SELECT id, kind, amount, currency, description, category_id, occurred_on, \
             created_at, user_id \
         FROM ledger_entry WHERE user_id = ? AND kind = ?",
    );
    let mut params: Vec<Box<dyn ToSql>> =
        vec![Box::new(owner.as_i64()), Box::new(kind.as_str())];
    filter.clauses_and_params(&mut sql, &mut params);

    sql.push_str(" ORDER BY occurred_on DESC, created_at DESC LIMIT ? OFFSET ?;");
    params.push(Box::new(limit as i64));
    params.push(Box::new(offset as i64));

    connection
        .prepare(&sql)?
        .query_map(params_from_iter(params.iter().map(|p| p.as_ref())), map_row)?
        .map(|maybe_entry| maybe_entry.map_err(|error| error.into()))
        .collect()
}

/// Update an owned entry. Mutating another owner's entry reports not found.
pub fn update_entry(
    id: LedgerEntryId,
    kind: LedgerKind,
    owner: UserId,
    amount: f64,
    description: Option<String>,
    category_id: Option<CategoryId>,
    occurred_on: Date,
    connection: &Connection,
) -> Result<LedgerEntry, Error> {
    let rows_affected = connection.execute(
        "UPDATE ledger_entry \
         SET amount = ?1, description = ?2, category_id = ?3, occurred_on = ?4 \
         WHERE id = ?5 AND kind = ?6 AND user_id = ?7;",
        (
            amount,
            &description,
            category_id,
            occurred_on,
            id,
            kind.as_str(),
            owner.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_entry(id, kind, owner, connection)
}

/// Delete an owned entry. Deleting another owner's entry reports not found.
pub fn delete_entry(
    id: LedgerEntryId,
    kind: LedgerKind,
    owner: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM ledger_entry WHERE id = ?1 AND kind = ?2 AND user_id = ?3;",
        (id, kind.as_str(), owner.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Sum the owner's entries in `kind`'s ledger over `[start, end]`.
pub fn total_for_window(
    kind: LedgerKind,
    owner: UserId,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<f64, Error> {
    let total: f64 = connection
        .prepare(
            "SELECT COALESCE(SUM(amount), 0) FROM ledger_entry \
             WHERE user_id = :user_id AND kind = :kind \
                 AND occurred_on >= :start AND occurred_on <= :end;",
        )?
        .query_row(
            named_params! {
                ":user_id": owner.as_i64(),
                ":kind": kind.as_str(),
                ":start": start,
                ":end": end,
            },
            |row| row.get(0),
        )?;

    Ok(total)
}

/// Sum the owner's entries in `kind`'s ledger over all time.
pub fn lifetime_total(
    kind: LedgerKind,
    owner: UserId,
    connection: &Connection,
) -> Result<f64, Error> {
    let total: f64 = connection
        .prepare(
            "SELECT COALESCE(SUM(amount), 0) FROM ledger_entry \
             WHERE user_id = :user_id AND kind = :kind;",
        )?
        .query_row(
            named_params! {":user_id": owner.as_i64(), ":kind": kind.as_str()},
            |row| row.get(0),
        )?;

    Ok(total)
}

/// The owner's per-day totals for `kind`'s ledger over `[start, end]`.
///
/// Days with no activity are omitted; rows come back in ascending date order.
pub fn daily_totals(
    kind: LedgerKind,
    owner: UserId,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Vec<(Date, f64)>, Error> {
    connection
        .prepare(
            "SELECT occurred_on, SUM(amount) FROM ledger_entry \
             WHERE user_id = :user_id AND kind = :kind \
                 AND occurred_on >= :start AND occurred_on <= :end \
             GROUP BY occurred_on ORDER BY occurred_on ASC;",
        )?
        .query_map(
            named_params! {
                ":user_id": owner.as_i64(),
                ":kind": kind.as_str(),
                ":start": start,
                ":end": end,
            },
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?
        .map(|maybe_pair| maybe_pair.map_err(|error| error.into()))
        .collect()
}

/// Initialize the ledger table and indexes.
pub fn create_ledger_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS ledger_entry (
            id INTEGER PRIMARY KEY,
            kind TEXT NOT NULL CHECK (kind IN ('expense', 'income')),
            amount REAL NOT NULL,
            currency TEXT NOT NULL,
            description TEXT,
            category_id INTEGER REFERENCES category(id) ON DELETE SET NULL,
            occurred_on TEXT NOT NULL,
            created_at TEXT NOT NULL,
            user_id INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_ledger_owner_kind_date
            ON ledger_entry(user_id, kind, occurred_on);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<LedgerEntry, rusqlite::Error> {
    let raw_kind: String = row.get(1)?;
    let kind = if raw_kind == "income" {
        LedgerKind::Income
    } else {
        LedgerKind::Expense
    };

    Ok(LedgerEntry {
        id: row.get(0)?,
        kind,
        amount: row.get(2)?,
        currency: row.get(3)?,
        description: row.get(4)?,
        category_id: row.get(5)?,
        occurred_on: row.get(6)?,
        created_at: row.get(7)?,
        owner: UserId::new(row.get(8)?),
    })
}

#[cfg(test)]
mod ledger_query_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{Error, db::initialize, user::UserId};

    use super::{
        EntryFilter, LedgerKind, NewLedgerEntry, count_entries, create_entry, daily_totals,
        delete_entry, get_entry, lifetime_total, list_entries, total_for_window, update_entry,
    };

    fn init_db() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn new_entry(kind: LedgerKind, amount: f64, day: time::Date, owner: UserId) -> NewLedgerEntry {
        NewLedgerEntry {
            kind,
            amount,
            currency: "PHP".to_owned(),
            description: Some("test".to_owned()),
            category_id: None,
            occurred_on: day,
            owner,
        }
    }

    #[test]
    fn create_then_get_round_trips() {
        let connection = init_db();
        let owner = UserId::new(1);

        let created = create_entry(
            new_entry(LedgerKind::Expense, 12.5, date!(2025 - 06 - 15), owner),
            &connection,
        )
        .unwrap();

        let fetched = get_entry(created.id, LedgerKind::Expense, owner, &connection).unwrap();

        assert_eq!(created, fetched);
    }

    #[test]
    fn entries_are_invisible_across_ledgers() {
        let connection = init_db();
        let owner = UserId::new(1);
        let created = create_entry(
            new_entry(LedgerKind::Expense, 12.5, date!(2025 - 06 - 15), owner),
            &connection,
        )
        .unwrap();

        let result = get_entry(created.id, LedgerKind::Income, owner, &connection);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn entries_are_invisible_across_owners() {
        let connection = init_db();
        let created = create_entry(
            new_entry(LedgerKind::Expense, 12.5, date!(2025 - 06 - 15), UserId::new(1)),
            &connection,
        )
        .unwrap();

        let result = get_entry(created.id, LedgerKind::Expense, UserId::new(2), &connection);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn list_filters_are_conjunctive_and_count_matches() {
        let connection = init_db();
        let owner = UserId::new(1);
        for (amount, day) in [
            (10.0, date!(2025 - 06 - 01)),
            (20.0, date!(2025 - 06 - 15)),
            (30.0, date!(2025 - 07 - 01)),
        ] {
            create_entry(new_entry(LedgerKind::Expense, amount, day, owner), &connection).unwrap();
        }

        let filter = EntryFilter {
            start: Some(date!(2025 - 06 - 01)),
            end: Some(date!(2025 - 06 - 30)),
            category_id: None,
        };

        let entries =
            list_entries(LedgerKind::Expense, owner, filter, 10, 0, &connection).unwrap();
        let count = count_entries(LedgerKind::Expense, owner, filter, &connection).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(count, 2);
        // Newest first.
        assert_eq!(entries[0].occurred_on, date!(2025 - 06 - 15));
    }

    #[test]
    fn pagination_limits_the_page_but_not_the_count() {
        let connection = init_db();
        let owner = UserId::new(1);
        for day in 1..=5 {
            create_entry(
                new_entry(
                    LedgerKind::Expense,
                    1.0,
                    date!(2025 - 06 - 01).replace_day(day).unwrap(),
                    owner,
                ),
                &connection,
            )
            .unwrap();
        }

        let entries = list_entries(
            LedgerKind::Expense,
            owner,
            EntryFilter::default(),
            2,
            2,
            &connection,
        )
        .unwrap();
        let count =
            count_entries(LedgerKind::Expense, owner, EntryFilter::default(), &connection)
                .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(count, 5);
    }

    #[test]
    fn update_is_owner_scoped() {
        let connection = init_db();
        let created = create_entry(
            new_entry(LedgerKind::Income, 100.0, date!(2025 - 06 - 15), UserId::new(1)),
            &connection,
        )
        .unwrap();

        let result = update_entry(
            created.id,
            LedgerKind::Income,
            UserId::new(2),
            999.0,
            None,
            None,
            date!(2025 - 06 - 15),
            &connection,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn delete_removes_the_entry() {
        let connection = init_db();
        let owner = UserId::new(1);
        let created = create_entry(
            new_entry(LedgerKind::Income, 100.0, date!(2025 - 06 - 15), owner),
            &connection,
        )
        .unwrap();

        delete_entry(created.id, LedgerKind::Income, owner, &connection).unwrap();

        assert_eq!(
            get_entry(created.id, LedgerKind::Income, owner, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn totals_are_windowed_and_ledger_scoped() {
        let connection = init_db();
        let owner = UserId::new(1);
        create_entry(
            new_entry(LedgerKind::Income, 1000.0, date!(2025 - 06 - 10), owner),
            &connection,
        )
        .unwrap();
        create_entry(
            new_entry(LedgerKind::Expense, 400.0, date!(2025 - 06 - 20), owner),
            &connection,
        )
        .unwrap();
        create_entry(
            new_entry(LedgerKind::Expense, 50.0, date!(2025 - 05 - 01), owner),
            &connection,
        )
        .unwrap();

        let income = total_for_window(
            LedgerKind::Income,
            owner,
            date!(2025 - 06 - 01),
            date!(2025 - 06 - 30),
            &connection,
        )
        .unwrap();
        let expenses = total_for_window(
            LedgerKind::Expense,
            owner,
            date!(2025 - 06 - 01),
            date!(2025 - 06 - 30),
            &connection,
        )
        .unwrap();

        assert_eq!(income, 1000.0);
        assert_eq!(expenses, 400.0);
        assert_eq!(
            lifetime_total(LedgerKind::Expense, owner, &connection).unwrap(),
            450.0
        );
    }

    #[test]
    fn daily_totals_group_by_day_ascending() {
        let connection = init_db();
        let owner = UserId::new(1);
        for (amount, day) in [
            (5.0, date!(2025 - 06 - 02)),
            (7.0, date!(2025 - 06 - 01)),
            (3.0, date!(2025 - 06 - 02)),
        ] {
            create_entry(new_entry(LedgerKind::Expense, amount, day, owner), &connection).unwrap();
        }

        let totals = daily_totals(
            LedgerKind::Expense,
            owner,
            date!(2025 - 06 - 01),
            date!(2025 - 06 - 30),
            &connection,
        )
        .unwrap();

        assert_eq!(
            totals,
            vec![(date!(2025 - 06 - 01), 7.0), (date!(2025 - 06 - 02), 8.0)]
        );
    }
}
