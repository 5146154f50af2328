//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- STORAGE ITEMS
        -- Pantry stock with resolved per-serving nutrition
        -- ============================================
        CREATE TABLE storage_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            barcode TEXT,                        -- UPC/EAN used for lookup, if any
            quantity INTEGER CHECK(quantity IS NULL OR quantity >= 0),
            unit TEXT NOT NULL DEFAULT '',       -- display label, e.g. "bag"
            servings_per_unit REAL,
            expires TEXT,                        -- ISO date
            category TEXT NOT NULL DEFAULT '',

            -- Resolved nutrition (per serving)
            resolved_name TEXT NOT NULL,
            calories_per_serving REAL NOT NULL DEFAULT 0,
            protein_per_serving REAL NOT NULL DEFAULT 0,
            fat_per_serving REAL NOT NULL DEFAULT 0,
            carbs_per_serving REAL NOT NULL DEFAULT 0,
            iron_per_serving REAL NOT NULL DEFAULT 0,
            vitamin_c_per_serving REAL NOT NULL DEFAULT 0,
            vitamin_a_per_serving REAL NOT NULL DEFAULT 0,

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_storage_items_name ON storage_items(name);
        CREATE INDEX idx_storage_items_expires ON storage_items(expires);

        -- ============================================
        -- MEALS
        -- Meal library with ordered ingredient names
        -- ============================================
        CREATE TABLE meals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE meal_ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            meal_id INTEGER NOT NULL REFERENCES meals(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            ingredient TEXT NOT NULL
        );

        CREATE INDEX idx_meal_ingredients_meal ON meal_ingredients(meal_id);

        -- ============================================
        -- ASSIGNMENTS
        -- Meals placed on calendar days
        -- ============================================
        CREATE TABLE assignments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,                  -- ISO date
            meal_name TEXT NOT NULL,
            meal_type TEXT NOT NULL CHECK(meal_type IN ('breakfast', 'lunch', 'dinner', 'snack')),
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_assignments_date ON assignments(date);

        -- ============================================
        -- SHOPPING LIST
        -- One row per ingredient needed on a date
        -- ============================================
        CREATE TABLE shopping_list (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            ingredient TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_shopping_list_date ON shopping_list(date);

        -- ============================================
        -- PLANS
        -- Priced snapshots of a meal's ingredients
        -- ============================================
        CREATE TABLE plans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            meal_name TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE plan_ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            plan_id INTEGER NOT NULL REFERENCES plans(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            price REAL NOT NULL DEFAULT 0,
            description TEXT NOT NULL
        );

        CREATE INDEX idx_plan_ingredients_plan ON plan_ingredients(plan_id);
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}
