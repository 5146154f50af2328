//! Shopping list model
//!
//! One row per ingredient needed on a given date.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// An ingredient to buy for a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingListEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub ingredient: String,
}

impl ShoppingListEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            date: row.get("date")?,
            ingredient: row.get("ingredient")?,
        })
    }

    /// Insert one entry
    pub fn create(conn: &Connection, date: NaiveDate, ingredient: &str) -> DbResult<i64> {
        conn.execute(
            "INSERT INTO shopping_list (date, ingredient) VALUES (?1, ?2)",
            params![date, ingredient],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Entries within an inclusive date range
    pub fn list_range(conn: &Connection, start: NaiveDate, end: NaiveDate) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT id, date, ingredient FROM shopping_list
            WHERE date >= ?1 AND date <= ?2
            ORDER BY date ASC, id ASC
            "#,
        )?;
        let items = stmt
            .query_map(params![start, end], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Remove entries within an inclusive date range
    pub fn delete_range(conn: &Connection, start: NaiveDate, end: NaiveDate) -> DbResult<usize> {
        let rows = conn.execute(
            "DELETE FROM shopping_list WHERE date >= ?1 AND date <= ?2",
            params![start, end],
        )?;
        Ok(rows)
    }
}
