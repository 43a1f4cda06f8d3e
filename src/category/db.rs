//! Database operations for categories.

use rusqlite::{Connection, Row, named_params};
use time::Date;

use crate::{
    Error,
    category::{Category, CategoryId, CategoryKind, CategoryName, CategorySpend, NewCategory},
    user::UserId,
};

/// Create a category and return it with its generated ID.
pub fn create_category(new_category: NewCategory, connection: &Connection) -> Result<Category, Error> {
    connection.execute(
        "INSERT INTO category (name, color, icon, kind, user_id) VALUES (?1, ?2, ?3, ?4, ?5);",
        (
            new_category.name.as_ref(),
            &new_category.color,
            &new_category.icon,
            new_category.kind.as_str(),
            new_category.owner.as_i64(),
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        name: new_category.name,
        color: new_category.color,
        icon: new_category.icon,
        kind: new_category.kind,
        owner: Some(new_category.owner),
    })
}

/// Retrieve a single category visible to `owner`: one of their own or a
/// global default.
pub fn get_category(
    id: CategoryId,
    owner: UserId,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "SELECT id, name, color, icon, kind, user_id FROM category \
             WHERE id = :id AND (user_id IS NULL OR user_id = :user_id);",
        )?
        .query_row(
            named_params! {":id": id, ":user_id": owner.as_i64()},
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve the categories visible to `owner`, optionally filtered by kind,
/// ordered alphabetically by name.
///
/// Global defaults are included alongside the owner's own categories.
pub fn list_categories(
    owner: UserId,
    kind: Option<CategoryKind>,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    let kind_filter = kind.map(CategoryKind::as_str).unwrap_or("%");

    connection
        .prepare(
            "SELECT id, name, color, icon, kind, user_id FROM category \
             WHERE (user_id IS NULL OR user_id = :user_id) AND kind LIKE :kind \
             ORDER BY name ASC;",
        )?
        .query_map(
            named_params! {":user_id": owner.as_i64(), ":kind": kind_filter},
            map_row,
        )?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Update an owned category's name, color and icon.
///
/// Global defaults cannot be edited, so updating one reports not found.
pub fn update_category(
    id: CategoryId,
    owner: UserId,
    name: CategoryName,
    color: String,
    icon: Option<String>,
    connection: &Connection,
) -> Result<Category, Error> {
    let rows_affected = connection.execute(
        "UPDATE category SET name = ?1, color = ?2, icon = ?3 WHERE id = ?4 AND user_id = ?5;",
        (name.as_ref(), &color, &icon, id, owner.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_category(id, owner, connection)
}

/// Delete an owned category. Ledger entries that referenced it become
/// uncategorized rather than being deleted.
///
/// Global defaults cannot be deleted, so deleting one reports not found.
pub fn delete_category(id: CategoryId, owner: UserId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2;",
        (id, owner.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Sum the owner's expenses per category over `[start, end]` and express each
/// category's share as a percentage of the window total.
///
/// Categories with no expenses in the window are omitted, so an empty window
/// yields an empty list. Percentages sum to roughly 100; floating-point
/// rounding is tolerated, not corrected.
pub fn expense_stats_for_window(
    owner: UserId,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Vec<CategorySpend>, Error> {
    let totals: Vec<(Category, f64)> = connection
        .prepare(
            "SELECT c.id, c.name, c.color, c.icon, c.kind, c.user_id, SUM(l.amount) \
             FROM ledger_entry l \
             INNER JOIN category c ON l.category_id = c.id \
             WHERE l.user_id = :user_id AND l.kind = 'expense' \
                 AND l.occurred_on >= :start AND l.occurred_on <= :end \
             GROUP BY c.id \
             ORDER BY SUM(l.amount) DESC;",
        )?
        .query_map(
            named_params! {":user_id": owner.as_i64(), ":start": start, ":end": end},
            |row| {
                let category = map_row(row)?;
                let amount: f64 = row.get(6)?;

                Ok((category, amount))
            },
        )?
        .collect::<Result<_, _>>()?;

    let window_total: f64 = totals.iter().map(|(_, amount)| amount).sum();

    if window_total <= 0.0 {
        return Ok(Vec::new());
    }

    Ok(totals
        .into_iter()
        .map(|(category, amount)| CategorySpend {
            category,
            amount,
            percentage: 100.0 * amount / window_total,
        })
        .collect())
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            color TEXT NOT NULL,
            icon TEXT,
            kind TEXT NOT NULL CHECK (kind IN ('expense', 'income')),
            user_id INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_category_user_id ON category(user_id);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let color = row.get(2)?;
    let icon = row.get(3)?;
    let raw_kind: String = row.get(4)?;
    let owner: Option<i64> = row.get(5)?;

    let kind = if raw_kind == "income" {
        CategoryKind::Income
    } else {
        CategoryKind::Expense
    };

    Ok(Category {
        id,
        name: CategoryName::new_unchecked(&raw_name),
        color,
        icon,
        kind,
        owner: owner.map(UserId::new),
    })
}
