//! Storage Item model
//!
//! A pantry entry: stock data plus the nutrition resolved when it was added.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use crate::nutrition::totals::{compute_totals, TotalsResult};
use super::NutrientRecord;

/// A pantry item with per-serving nutrition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    pub name: String,
    pub barcode: Option<String>,
    pub quantity: Option<i64>, // units on hand
    pub unit: String, // display label, e.g. "bag"
    pub servings_per_unit: Option<f64>,
    pub expires: Option<NaiveDate>,
    pub category: String,
    pub nutrition: NutrientRecord,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a storage item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageItemCreate {
    pub name: String,
    pub barcode: Option<String>,
    pub quantity: Option<i64>,
    #[serde(default)]
    pub unit: String,
    pub servings_per_unit: Option<f64>,
    pub expires: Option<NaiveDate>,
    #[serde(default)]
    pub category: String,
}

/// Data for updating a storage item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageItemUpdate {
    pub name: Option<String>,
    pub barcode: Option<String>,
    pub quantity: Option<i64>,
    pub unit: Option<String>,
    pub servings_per_unit: Option<f64>,
    pub expires: Option<NaiveDate>,
    pub category: Option<String>,
}

impl InventoryItem {
    /// An unsaved item with no stock data and empty nutrition
    pub fn new(name: &str, unit: &str, category: &str) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            barcode: None,
            quantity: None,
            unit: unit.to_string(),
            servings_per_unit: None,
            expires: None,
            category: category.to_string(),
            nutrition: NutrientRecord::named(name),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    /// The string handed to the resolver: barcode if set, otherwise the name
    pub fn lookup_identifier(&self) -> &str {
        self.barcode
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .unwrap_or(&self.name)
    }

    /// Quantity and servings per unit are both present and non-zero
    pub fn is_computable(&self) -> bool {
        let quantity_ok = matches!(self.quantity, Some(q) if q != 0);
        let servings_ok = matches!(self.servings_per_unit, Some(s) if s != 0.0 && s.is_finite());
        quantity_ok && servings_ok
    }

    /// Household totals, or `None` when they are unknown
    pub fn totals(&self, family_size: u32) -> Option<TotalsResult> {
        self.is_computable()
            .then(|| compute_totals(self, family_size))
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            barcode: row.get("barcode")?,
            quantity: row.get("quantity")?,
            unit: row.get("unit")?,
            servings_per_unit: row.get("servings_per_unit")?,
            expires: row.get("expires")?,
            category: row.get("category")?,
            nutrition: NutrientRecord {
                name: row.get("resolved_name")?,
                calories_per_serving: row.get("calories_per_serving")?,
                protein_per_serving: row.get("protein_per_serving")?,
                fat_per_serving: row.get("fat_per_serving")?,
                carbs_per_serving: row.get("carbs_per_serving")?,
                iron_per_serving: row.get("iron_per_serving")?,
                vitamin_c_per_serving: row.get("vitamin_c_per_serving")?,
                vitamin_a_per_serving: row.get("vitamin_a_per_serving")?,
            },
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new storage item with its resolved nutrition
    pub fn create(
        conn: &Connection,
        data: &StorageItemCreate,
        nutrition: &NutrientRecord,
    ) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO storage_items (
                name, barcode, quantity, unit, servings_per_unit, expires, category,
                resolved_name, calories_per_serving, protein_per_serving, fat_per_serving,
                carbs_per_serving, iron_per_serving, vitamin_c_per_serving, vitamin_a_per_serving
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                data.name,
                data.barcode,
                data.quantity,
                data.unit,
                data.servings_per_unit,
                data.expires,
                data.category,
                nutrition.name,
                nutrition.calories_per_serving,
                nutrition.protein_per_serving,
                nutrition.fat_per_serving,
                nutrition.carbs_per_serving,
                nutrition.iron_per_serving,
                nutrition.vitamin_c_per_serving,
                nutrition.vitamin_a_per_serving,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a storage item by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM storage_items WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All storage items, sorted by name
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM storage_items ORDER BY name COLLATE NOCASE ASC")?;
        let items = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Items expiring on or before a date, soonest first
    pub fn expiring_by(conn: &Connection, date: NaiveDate) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM storage_items
            WHERE expires IS NOT NULL AND expires <= ?1
            ORDER BY expires ASC, name ASC
            "#,
        )?;
        let items = stmt
            .query_map([date], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Update stock fields, and replace nutrition when a new record is given
    pub fn update(
        conn: &Connection,
        id: i64,
        data: &StorageItemUpdate,
        nutrition: Option<&NutrientRecord>,
    ) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        macro_rules! add_update {
            ($value:expr, $col:expr) => {
                if let Some(ref val) = $value {
                    updates.push(format!("{} = ?{}", $col, params_vec.len() + 1));
                    params_vec.push(Box::new(val.clone()));
                }
            };
        }

        add_update!(data.name, "name");
        add_update!(data.barcode, "barcode");
        add_update!(data.quantity, "quantity");
        add_update!(data.unit, "unit");
        add_update!(data.servings_per_unit, "servings_per_unit");
        add_update!(data.expires, "expires");
        add_update!(data.category, "category");

        if let Some(n) = nutrition {
            add_update!(Some(n.name.clone()), "resolved_name");
            add_update!(Some(n.calories_per_serving), "calories_per_serving");
            add_update!(Some(n.protein_per_serving), "protein_per_serving");
            add_update!(Some(n.fat_per_serving), "fat_per_serving");
            add_update!(Some(n.carbs_per_serving), "carbs_per_serving");
            add_update!(Some(n.iron_per_serving), "iron_per_serving");
            add_update!(Some(n.vitamin_c_per_serving), "vitamin_c_per_serving");
            add_update!(Some(n.vitamin_a_per_serving), "vitamin_a_per_serving");
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE storage_items SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Delete a storage item. Returns Ok(false) if not found.
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM storage_items WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
