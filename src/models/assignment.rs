//! Assignment model
//!
//! A meal placed on a calendar day.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// Meal slot within a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    #[default]
    Dinner,
    Snack,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Some(MealType::Breakfast),
            "lunch" => Some(MealType::Lunch),
            "dinner" | "supper" => Some(MealType::Dinner),
            "snack" => Some(MealType::Snack),
            _ => None,
        }
    }
}

/// A meal assigned to a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub date: NaiveDate,
    pub meal_name: String,
    pub meal_type: MealType,
    pub created_at: String,
}

/// Data for creating an assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentCreate {
    pub date: NaiveDate,
    pub meal_name: String,
    #[serde(default)]
    pub meal_type: MealType,
}

impl Assignment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let meal_type: String = row.get("meal_type")?;
        Ok(Self {
            id: row.get("id")?,
            date: row.get("date")?,
            meal_name: row.get("meal_name")?,
            meal_type: MealType::from_str(&meal_type).unwrap_or_default(),
            created_at: row.get("created_at")?,
        })
    }

    /// Insert a new assignment
    pub fn create(conn: &Connection, data: &AssignmentCreate) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO assignments (date, meal_name, meal_type) VALUES (?1, ?2, ?3)",
            params![data.date, data.meal_name, data.meal_type.as_str()],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get an assignment by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM assignments WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(a) => Ok(Some(a)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Assignments within an inclusive date range, ordered by date then slot
    pub fn list_range(conn: &Connection, start: NaiveDate, end: NaiveDate) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM assignments
            WHERE date >= ?1 AND date <= ?2
            ORDER BY date ASC,
                CASE meal_type
                    WHEN 'breakfast' THEN 0
                    WHEN 'lunch' THEN 1
                    WHEN 'dinner' THEN 2
                    ELSE 3
                END ASC,
                id ASC
            "#,
        )?;
        let items = stmt
            .query_map(params![start, end], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Delete an assignment. Returns Ok(false) if not found.
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM assignments WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
