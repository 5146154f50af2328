//! Plan model
//!
//! A priced snapshot of a meal's ingredients at the grocery retailer.

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// One ingredient with its looked-up price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedIngredient {
    pub name: String,
    pub price: f64,
    pub description: String,
}

/// A priced meal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: i64,
    pub meal_name: String,
    pub ingredients: Vec<PricedIngredient>,
    pub created_at: String,
}

impl Plan {
    /// Sum of ingredient prices
    pub fn total_price(&self) -> f64 {
        self.ingredients.iter().map(|i| i.price).sum()
    }

    fn load_ingredients(conn: &Connection, plan_id: i64) -> DbResult<Vec<PricedIngredient>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT name, price, description FROM plan_ingredients
            WHERE plan_id = ?1 ORDER BY position ASC
            "#,
        )?;
        let items = stmt
            .query_map([plan_id], |row| {
                Ok(PricedIngredient {
                    name: row.get("name")?,
                    price: row.get("price")?,
                    description: row.get("description")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Insert a plan with its ingredients
    pub fn create(
        conn: &Connection,
        meal_name: &str,
        ingredients: &[PricedIngredient],
    ) -> DbResult<Self> {
        conn.execute("INSERT INTO plans (meal_name) VALUES (?1)", [meal_name])?;
        let id = conn.last_insert_rowid();

        let mut stmt = conn.prepare(
            r#"
            INSERT INTO plan_ingredients (plan_id, position, name, price, description)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )?;
        for (position, ing) in ingredients.iter().enumerate() {
            stmt.execute(params![id, position as i64, ing.name, ing.price, ing.description])?;
        }

        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a plan by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let result = conn.query_row(
            "SELECT id, meal_name, created_at FROM plans WHERE id = ?1",
            [id],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?)),
        );
        match result {
            Ok((id, meal_name, created_at)) => Ok(Some(Self {
                id,
                meal_name,
                ingredients: Self::load_ingredients(conn, id)?,
                created_at,
            })),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Most recent plans first
    pub fn list_recent(conn: &Connection, limit: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT id FROM plans ORDER BY id DESC LIMIT ?1")?;
        let ids = stmt
            .query_map([limit], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut plans = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(plan) = Self::get_by_id(conn, id)? {
                plans.push(plan);
            }
        }
        Ok(plans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    #[test]
    fn test_create_and_list() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let ingredients = vec![
            PricedIngredient {
                name: "spaghetti noodles".to_string(),
                price: 1.25,
                description: "Kroger Spaghetti".to_string(),
            },
            PricedIngredient {
                name: "tomato sauce".to_string(),
                price: 0.0,
                description: "Not found".to_string(),
            },
        ];
        let plan = Plan::create(&conn, "Spaghetti", &ingredients).unwrap();
        assert_eq!(plan.ingredients, ingredients);
        assert_eq!(plan.total_price(), 1.25);

        Plan::create(&conn, "Tacos", &[]).unwrap();
        let recent = Plan::list_recent(&conn, 10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].meal_name, "Tacos");
    }
}
