//! Meal model
//!
//! A named meal with an ordered list of ingredient names.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// A meal in the library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: i64,
    pub name: String,
    pub ingredients: Vec<String>,
}

/// Data for creating a meal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealCreate {
    pub name: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
}

impl Meal {
    fn header_from_row(row: &Row) -> rusqlite::Result<(i64, String)> {
        Ok((row.get("id")?, row.get("name")?))
    }

    fn load_ingredients(conn: &Connection, meal_id: i64) -> DbResult<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT ingredient FROM meal_ingredients WHERE meal_id = ?1 ORDER BY position ASC",
        )?;
        let ingredients = stmt
            .query_map([meal_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ingredients)
    }

    fn hydrate(conn: &Connection, header: Option<(i64, String)>) -> DbResult<Option<Self>> {
        match header {
            Some((id, name)) => Ok(Some(Self {
                id,
                name,
                ingredients: Self::load_ingredients(conn, id)?,
            })),
            None => Ok(None),
        }
    }

    fn insert_ingredients(conn: &Connection, meal_id: i64, ingredients: &[String]) -> DbResult<()> {
        let mut stmt = conn.prepare(
            "INSERT INTO meal_ingredients (meal_id, position, ingredient) VALUES (?1, ?2, ?3)",
        )?;
        for (position, ingredient) in ingredients.iter().enumerate() {
            stmt.execute(params![meal_id, position as i64, ingredient])?;
        }
        Ok(())
    }

    /// Insert a new meal with its ingredients
    pub fn create(conn: &Connection, data: &MealCreate) -> DbResult<Self> {
        conn.execute("INSERT INTO meals (name) VALUES (?1)", [&data.name])?;
        let id = conn.last_insert_rowid();
        Self::insert_ingredients(conn, id, &data.ingredients)?;

        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a meal by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let header = conn
            .query_row("SELECT id, name FROM meals WHERE id = ?1", [id], Self::header_from_row)
            .optional()?;
        Self::hydrate(conn, header)
    }

    /// Get a meal by name (case-insensitive)
    pub fn get_by_name(conn: &Connection, name: &str) -> DbResult<Option<Self>> {
        let header = conn
            .query_row(
                "SELECT id, name FROM meals WHERE name = ?1 COLLATE NOCASE",
                [name],
                Self::header_from_row,
            )
            .optional()?;
        Self::hydrate(conn, header)
    }

    /// All meals, sorted by name
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT id, name FROM meals ORDER BY name ASC")?;
        let headers = stmt
            .query_map([], Self::header_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut meals = Vec::with_capacity(headers.len());
        for (id, name) in headers {
            meals.push(Self {
                id,
                name,
                ingredients: Self::load_ingredients(conn, id)?,
            });
        }
        Ok(meals)
    }

    /// Replace a meal's ingredient list
    pub fn set_ingredients(
        conn: &Connection,
        id: i64,
        ingredients: &[String],
    ) -> DbResult<Option<Self>> {
        if Self::get_by_id(conn, id)?.is_none() {
            return Ok(None);
        }
        conn.execute("DELETE FROM meal_ingredients WHERE meal_id = ?1", [id])?;
        Self::insert_ingredients(conn, id, ingredients)?;
        Self::get_by_id(conn, id)
    }

    /// Delete a meal (ingredients cascade). Returns Ok(false) if not found.
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM meals WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Remove every meal
    pub fn delete_all(conn: &Connection) -> DbResult<usize> {
        Ok(conn.execute("DELETE FROM meals", [])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn tacos() -> MealCreate {
        MealCreate {
            name: "Tacos".to_string(),
            ingredients: vec![
                "taco shells".to_string(),
                "ground beef".to_string(),
                "lettuce".to_string(),
                "cheese".to_string(),
            ],
        }
    }

    #[test]
    fn test_ingredient_order_preserved() {
        let conn = conn();
        let meal = Meal::create(&conn, &tacos()).unwrap();
        assert_eq!(meal.ingredients, tacos().ingredients);
    }

    #[test]
    fn test_lookup_by_name_ignores_case() {
        let conn = conn();
        let meal = Meal::create(&conn, &tacos()).unwrap();
        assert_eq!(Meal::get_by_name(&conn, "tacos").unwrap(), Some(meal));
        assert_eq!(Meal::get_by_name(&conn, "Nachos").unwrap(), None);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let conn = conn();
        Meal::create(&conn, &tacos()).unwrap();
        let dup = MealCreate {
            name: "TACOS".to_string(),
            ingredients: vec![],
        };
        assert!(Meal::create(&conn, &dup).is_err());
    }

    #[test]
    fn test_delete_cascades_ingredients() {
        let conn = conn();
        let meal = Meal::create(&conn, &tacos()).unwrap();
        assert!(Meal::delete(&conn, meal.id).unwrap());
        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM meal_ingredients", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_set_ingredients() {
        let conn = conn();
        let meal = Meal::create(&conn, &tacos()).unwrap();
        let updated = Meal::set_ingredients(&conn, meal.id, &["tortillas".to_string()])
            .unwrap()
            .unwrap();
        assert_eq!(updated.ingredients, vec!["tortillas"]);
        assert!(Meal::set_ingredients(&conn, 999, &[]).unwrap().is_none());
    }
}
