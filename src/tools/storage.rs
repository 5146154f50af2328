//! Pantry MCP Tools
//!
//! Storage item CRUD. Adding an item (or editing its name/barcode) resolves
//! nutrition first; an item whose nutrition cannot be found is never stored.

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::Database;
use crate::models::{InventoryItem, NutrientRecord, StorageItemCreate, StorageItemUpdate};
use crate::nutrition::{summarize, PantrySummary, Resolver, TotalsResult, DEFAULT_FAMILY_SIZE};

/// Storage item with its household totals (`None` when unknown)
#[derive(Debug, Serialize)]
pub struct StorageItemDetail {
    #[serde(flatten)]
    pub item: InventoryItem,
    pub totals: Option<TotalsResult>,
}

impl StorageItemDetail {
    fn new(item: InventoryItem, family_size: u32) -> Self {
        let totals = item.totals(family_size);
        Self { item, totals }
    }
}

/// Response for list_storage_items
#[derive(Debug, Serialize)]
pub struct ListStorageItemsResponse {
    pub items: Vec<StorageItemDetail>,
    pub total: usize,
    pub family_size: u32,
}

/// Response for update_storage_item
#[derive(Debug, Serialize)]
pub struct UpdateStorageItemResponse {
    pub item: StorageItemDetail,
    pub nutrition_refreshed: bool,
}

/// Response for delete_storage_item
#[derive(Debug, Serialize)]
pub struct DeleteStorageItemResponse {
    pub success: bool,
    pub deleted_id: i64,
}

fn validate_quantity(quantity: Option<i64>) -> Result<(), String> {
    match quantity {
        Some(q) if q < 0 => Err("quantity cannot be negative".to_string()),
        _ => Ok(()),
    }
}

fn validate_servings(servings_per_unit: Option<f64>) -> Result<(), String> {
    match servings_per_unit {
        Some(s) if !s.is_finite() || s <= 0.0 => {
            Err("servings_per_unit must be greater than 0".to_string())
        }
        _ => Ok(()),
    }
}

fn lookup_identifier<'a>(name: &'a str, barcode: Option<&'a str>) -> &'a str {
    barcode.map(str::trim).filter(|b| !b.is_empty()).unwrap_or(name)
}

/// Resolve nutrition for an identifier without storing anything
pub async fn lookup_nutrition(
    resolver: &Resolver,
    identifier: &str,
) -> Result<NutrientRecord, String> {
    if identifier.trim().is_empty() {
        return Err("identifier cannot be empty".to_string());
    }
    resolver.resolve(identifier).await.map_err(|e| e.to_string())
}

/// Add a storage item, resolving its nutrition first
pub async fn add_storage_item(
    db: &Database,
    resolver: &Resolver,
    mut data: StorageItemCreate,
) -> Result<StorageItemDetail, String> {
    let name = data.name.trim().to_string();
    if name.is_empty() {
        return Err("Storage item name cannot be empty".to_string());
    }
    data.name = name;
    data.barcode = data
        .barcode
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty());
    validate_quantity(data.quantity)?;
    validate_servings(data.servings_per_unit)?;

    let identifier = lookup_identifier(&data.name, data.barcode.as_deref());
    let nutrition = resolver.resolve(identifier).await.map_err(|e| e.to_string())?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let item = InventoryItem::create(&conn, &data, &nutrition)
        .map_err(|e| format!("Failed to create storage item: {}", e))?;

    tracing::info!("Added storage item {} ({})", item.id, item.name);
    Ok(StorageItemDetail::new(item, DEFAULT_FAMILY_SIZE))
}

/// Update a storage item.
///
/// A changed name or barcode (or `refresh_nutrition`) re-resolves nutrition;
/// if that fails the edit is rejected and nothing changes.
pub async fn update_storage_item(
    db: &Database,
    resolver: &Resolver,
    id: i64,
    mut data: StorageItemUpdate,
    refresh_nutrition: bool,
) -> Result<UpdateStorageItemResponse, String> {
    if let Some(name) = data.name.as_mut() {
        *name = name.trim().to_string();
        if name.is_empty() {
            return Err("Storage item name cannot be empty".to_string());
        }
    }
    if let Some(barcode) = data.barcode.as_mut() {
        *barcode = barcode.trim().to_string();
    }
    validate_quantity(data.quantity)?;
    validate_servings(data.servings_per_unit)?;

    let existing = {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
        InventoryItem::get_by_id(&conn, id)
            .map_err(|e| format!("Failed to get storage item: {}", e))?
            .ok_or_else(|| format!("Storage item not found with id: {}", id))?
    };

    let name_changed = data.name.as_ref().is_some_and(|n| *n != existing.name);
    let barcode_changed = data
        .barcode
        .as_ref()
        .is_some_and(|b| Some(b) != existing.barcode.as_ref());

    let nutrition = if name_changed || barcode_changed || refresh_nutrition {
        let name = data.name.as_deref().unwrap_or(&existing.name);
        let barcode = data.barcode.as_deref().or(existing.barcode.as_deref());
        let identifier = lookup_identifier(name, barcode);
        Some(resolver.resolve(identifier).await.map_err(|e| e.to_string())?)
    } else {
        None
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let updated = InventoryItem::update(&conn, id, &data, nutrition.as_ref())
        .map_err(|e| format!("Failed to update storage item: {}", e))?
        .ok_or_else(|| format!("Storage item not found with id: {}", id))?;

    Ok(UpdateStorageItemResponse {
        item: StorageItemDetail::new(updated, DEFAULT_FAMILY_SIZE),
        nutrition_refreshed: nutrition.is_some(),
    })
}

/// Get a storage item by ID
pub fn get_storage_item(
    db: &Database,
    id: i64,
    family_size: Option<u32>,
) -> Result<Option<StorageItemDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let item = InventoryItem::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get storage item: {}", e))?;

    Ok(item.map(|i| StorageItemDetail::new(i, family_size.unwrap_or(DEFAULT_FAMILY_SIZE))))
}

/// List storage items sorted by name, optionally only those expiring by a date
pub fn list_storage_items(
    db: &Database,
    family_size: Option<u32>,
    expiring_by: Option<NaiveDate>,
) -> Result<ListStorageItemsResponse, String> {
    let family_size = family_size.unwrap_or(DEFAULT_FAMILY_SIZE);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let items = match expiring_by {
        Some(date) => InventoryItem::expiring_by(&conn, date),
        None => InventoryItem::list(&conn),
    }
    .map_err(|e| format!("Failed to list storage items: {}", e))?;

    let items: Vec<StorageItemDetail> = items
        .into_iter()
        .map(|i| StorageItemDetail::new(i, family_size))
        .collect();
    let total = items.len();

    Ok(ListStorageItemsResponse {
        items,
        total,
        family_size,
    })
}

/// Delete a storage item
pub fn delete_storage_item(db: &Database, id: i64) -> Result<DeleteStorageItemResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = InventoryItem::delete(&conn, id)
        .map_err(|e| format!("Failed to delete storage item: {}", e))?;
    if !deleted {
        return Err(format!("Storage item not found with id: {}", id));
    }

    Ok(DeleteStorageItemResponse {
        success: true,
        deleted_id: id,
    })
}

/// Household totals across the whole pantry
pub fn storage_summary(db: &Database, family_size: Option<u32>) -> Result<PantrySummary, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let items = InventoryItem::list(&conn)
        .map_err(|e| format!("Failed to list storage items: {}", e))?;

    Ok(summarize(&items, family_size.unwrap_or(DEFAULT_FAMILY_SIZE)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::db::migrations::run_migrations;
    use crate::nutrition::{NutritionSource, SourceError};

    /// Knows one product by name and one by barcode
    struct Shelf;

    #[async_trait]
    impl NutritionSource for Shelf {
        fn name(&self) -> &'static str {
            "shelf"
        }

        async fn lookup_barcode(&self, code: &str) -> Result<Option<NutrientRecord>, SourceError> {
            Ok((code == "0123456789012").then(|| NutrientRecord {
                calories_per_serving: 150.0,
                ..NutrientRecord::named("Canned Beans")
            }))
        }

        async fn search_name(&self, query: &str) -> Result<Option<NutrientRecord>, SourceError> {
            Ok(query.eq_ignore_ascii_case("rice").then(|| NutrientRecord {
                calories_per_serving: 200.0,
                protein_per_serving: 4.0,
                iron_per_serving: 0.5,
                ..NutrientRecord::named("Long Grain Rice")
            }))
        }
    }

    fn setup() -> (Database, Resolver) {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| Ok(run_migrations(conn)?)).unwrap();
        (db, Resolver::new(vec![Box::new(Shelf)]))
    }

    fn rice() -> StorageItemCreate {
        StorageItemCreate {
            name: "rice".to_string(),
            quantity: Some(2),
            unit: "bag".to_string(),
            servings_per_unit: Some(25.0),
            category: "grains".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_add_stores_resolved_nutrition() {
        let (db, resolver) = setup();
        let added = add_storage_item(&db, &resolver, rice()).await.unwrap();

        assert_eq!(added.item.nutrition.name, "Long Grain Rice");
        let totals = added.totals.unwrap();
        assert_eq!(totals.total_calories, 10000.0);
        assert_eq!(totals.total_protein, 200.0);
        assert_eq!(totals.days_of_support, 1);
    }

    #[tokio::test]
    async fn test_add_rejected_when_not_found() {
        let (db, resolver) = setup();
        let data = StorageItemCreate {
            name: "unobtainium".to_string(),
            ..Default::default()
        };
        let err = add_storage_item(&db, &resolver, data).await.unwrap_err();
        assert!(err.contains("Nutrition info not found"));
        assert_eq!(list_storage_items(&db, None, None).unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_barcode_takes_precedence_over_name() {
        let (db, resolver) = setup();
        let data = StorageItemCreate {
            name: "beans".to_string(),
            barcode: Some(" 0123456789012 ".to_string()),
            ..Default::default()
        };
        let added = add_storage_item(&db, &resolver, data).await.unwrap();
        assert_eq!(added.item.nutrition.name, "Canned Beans");
        assert_eq!(added.item.barcode.as_deref(), Some("0123456789012"));
        assert!(added.totals.is_none());
    }

    #[tokio::test]
    async fn test_add_validation() {
        let (db, resolver) = setup();

        let blank = StorageItemCreate {
            name: "   ".to_string(),
            ..Default::default()
        };
        assert!(add_storage_item(&db, &resolver, blank).await.is_err());

        let negative = StorageItemCreate {
            quantity: Some(-1),
            ..rice()
        };
        assert!(add_storage_item(&db, &resolver, negative).await.is_err());

        let zero_servings = StorageItemCreate {
            servings_per_unit: Some(0.0),
            ..rice()
        };
        assert!(add_storage_item(&db, &resolver, zero_servings).await.is_err());
    }

    #[tokio::test]
    async fn test_stock_update_keeps_nutrition() {
        let (db, resolver) = setup();
        let added = add_storage_item(&db, &resolver, rice()).await.unwrap();

        let update = StorageItemUpdate {
            quantity: Some(4),
            ..Default::default()
        };
        let result = update_storage_item(&db, &resolver, added.item.id, update, false)
            .await
            .unwrap();
        assert!(!result.nutrition_refreshed);
        assert_eq!(result.item.item.quantity, Some(4));
        assert_eq!(result.item.totals.unwrap().total_calories, 20000.0);
    }

    #[tokio::test]
    async fn test_rename_to_unknown_is_rejected() {
        let (db, resolver) = setup();
        let added = add_storage_item(&db, &resolver, rice()).await.unwrap();

        let update = StorageItemUpdate {
            name: Some("mystery".to_string()),
            quantity: Some(9),
            ..Default::default()
        };
        assert!(update_storage_item(&db, &resolver, added.item.id, update, false)
            .await
            .is_err());

        let unchanged = get_storage_item(&db, added.item.id, None).unwrap().unwrap();
        assert_eq!(unchanged.item.name, "rice");
        assert_eq!(unchanged.item.quantity, Some(2));
    }

    #[tokio::test]
    async fn test_refresh_reresolves() {
        let (db, resolver) = setup();
        let added = add_storage_item(&db, &resolver, rice()).await.unwrap();

        let update = StorageItemUpdate::default();
        let result = update_storage_item(&db, &resolver, added.item.id, update, true)
            .await
            .unwrap();
        assert!(result.nutrition_refreshed);
        assert_eq!(result.item.item.nutrition.name, "Long Grain Rice");
    }

    #[tokio::test]
    async fn test_list_summary_and_delete() {
        let (db, resolver) = setup();
        let rice = add_storage_item(&db, &resolver, rice()).await.unwrap();
        let beans = StorageItemCreate {
            name: "beans".to_string(),
            barcode: Some("0123456789012".to_string()),
            expires: NaiveDate::from_ymd_opt(2026, 11, 1),
            ..Default::default()
        };
        add_storage_item(&db, &resolver, beans).await.unwrap();

        let listed = list_storage_items(&db, Some(2), None).unwrap();
        assert_eq!(listed.total, 2);
        assert_eq!(listed.items[0].item.name, "beans");
        assert!(listed.items[0].totals.is_none());
        assert_eq!(listed.items[1].totals.unwrap().days_of_support, 2);

        let expiring = list_storage_items(&db, None, NaiveDate::from_ymd_opt(2026, 12, 1)).unwrap();
        assert_eq!(expiring.total, 1);

        let summary = storage_summary(&db, Some(5)).unwrap();
        assert_eq!(summary.item_count, 2);
        assert_eq!(summary.items_without_totals, 1);
        assert_eq!(summary.total_calories, 10000.0);
        assert_eq!(summary.days_of_support, 1);

        assert!(delete_storage_item(&db, rice.item.id).unwrap().success);
        assert!(delete_storage_item(&db, rice.item.id).is_err());
    }

    #[tokio::test]
    async fn test_lookup_without_storing() {
        let (db, resolver) = setup();
        let record = lookup_nutrition(&resolver, "Rice").await.unwrap();
        assert_eq!(record.calories_per_serving, 200.0);
        assert!(lookup_nutrition(&resolver, " ").await.is_err());
        assert_eq!(list_storage_items(&db, None, None).unwrap().total, 0);
    }
}
