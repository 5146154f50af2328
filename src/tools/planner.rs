//! Meal Planner MCP Tools
//!
//! Meal library, ingredient pricing, calendar assignments and the shopping
//! list derived from them.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::task::JoinSet;

use crate::db::Database;
use crate::grocery::{ProductSearch, NOT_FOUND_DESCRIPTION};
use crate::models::{
    Assignment, AssignmentCreate, Meal, MealCreate, MealType, Plan, PricedIngredient,
    ShoppingListEntry,
};
use super::parse_date;

/// Response for delete_* tools
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// Response for list_meals
#[derive(Debug, Serialize)]
pub struct ListMealsResponse {
    pub meals: Vec<Meal>,
    pub total: usize,
}

/// Plan with its total
#[derive(Debug, Serialize)]
pub struct PlanDetail {
    #[serde(flatten)]
    pub plan: Plan,
    pub total_price: f64,
}

impl From<Plan> for PlanDetail {
    fn from(plan: Plan) -> Self {
        let total_price = plan.total_price();
        Self { plan, total_price }
    }
}

/// Response for list_plans
#[derive(Debug, Serialize)]
pub struct ListPlansResponse {
    pub plans: Vec<PlanDetail>,
    pub total: usize,
}

/// Response for assign_meal
#[derive(Debug, Serialize)]
pub struct AssignMealResponse {
    #[serde(flatten)]
    pub assignment: Assignment,
    /// False when no meal of that name exists yet
    pub meal_in_library: bool,
}

/// Response for list_assignments
#[derive(Debug, Serialize)]
pub struct ListAssignmentsResponse {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub assignments: Vec<Assignment>,
    pub total: usize,
}

/// Response for build_shopping_list / get_shopping_list
#[derive(Debug, Serialize)]
pub struct ShoppingListResponse {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub entries: Vec<ShoppingListEntry>,
    pub total: usize,
    /// Assigned meal names with no library entry
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unknown_meals: Vec<String>,
}

/// Response for clear_shopping_list
#[derive(Debug, Serialize)]
pub struct ClearShoppingListResponse {
    pub success: bool,
    pub removed: usize,
}

fn parse_range(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate), String> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    if end < start {
        return Err(format!("End date {} is before start date {}", end, start));
    }
    Ok((start, end))
}

fn clean_ingredients(ingredients: Vec<String>) -> Vec<String> {
    ingredients
        .into_iter()
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .collect()
}

// ============================================================================
// Meals
// ============================================================================

/// Add a meal to the library
pub fn add_meal(db: &Database, name: &str, ingredients: Vec<String>) -> Result<Meal, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Meal name cannot be empty".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let existing = Meal::get_by_name(&conn, name)
        .map_err(|e| format!("Database error: {}", e))?;
    if let Some(meal) = existing {
        return Err(format!("Meal '{}' already exists with id: {}", meal.name, meal.id));
    }

    let data = MealCreate {
        name: name.to_string(),
        ingredients: clean_ingredients(ingredients),
    };
    Meal::create(&conn, &data).map_err(|e| format!("Failed to create meal: {}", e))
}

/// List every meal with its ingredients
pub fn list_meals(db: &Database) -> Result<ListMealsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let meals = Meal::list(&conn).map_err(|e| format!("Failed to list meals: {}", e))?;
    let total = meals.len();

    Ok(ListMealsResponse { meals, total })
}

/// Replace a meal's ingredient list
pub fn set_meal_ingredients(
    db: &Database,
    id: i64,
    ingredients: Vec<String>,
) -> Result<Meal, String> {
    let ingredients = clean_ingredients(ingredients);

    db.with_transaction(|tx| Meal::set_ingredients(tx, id, &ingredients))
        .map_err(|e| format!("Failed to update meal: {}", e))?
        .ok_or_else(|| format!("Meal not found with id: {}", id))
}

/// Delete a meal
pub fn delete_meal(db: &Database, id: i64) -> Result<DeleteResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = Meal::delete(&conn, id).map_err(|e| format!("Failed to delete meal: {}", e))?;
    if !deleted {
        return Err(format!("Meal not found with id: {}", id));
    }

    Ok(DeleteResponse {
        success: true,
        deleted_id: id,
    })
}

// ============================================================================
// Pricing
// ============================================================================

/// Price every ingredient of a meal and store the result as a plan.
///
/// Ingredient searches run concurrently; a failed or empty search prices the
/// ingredient at 0 with a "Not found" description.
pub async fn price_meal(
    db: &Database,
    grocery: Arc<dyn ProductSearch>,
    meal_id: i64,
) -> Result<PlanDetail, String> {
    let meal = {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
        Meal::get_by_id(&conn, meal_id)
            .map_err(|e| format!("Failed to get meal: {}", e))?
            .ok_or_else(|| format!("Meal not found with id: {}", meal_id))?
    };

    let mut searches = JoinSet::new();
    for (index, ingredient) in meal.ingredients.iter().cloned().enumerate() {
        let grocery = Arc::clone(&grocery);
        searches.spawn(async move {
            let result = grocery.search_product(&ingredient).await;
            (index, ingredient, result)
        });
    }

    let mut priced: Vec<Option<PricedIngredient>> = vec![None; meal.ingredients.len()];
    while let Some(joined) = searches.join_next().await {
        let (index, name, result) = joined.map_err(|e| format!("Pricing task failed: {}", e))?;
        let (price, description) = match result {
            Ok(Some(product)) => (product.price_or_zero(), product.description_or_not_found()),
            Ok(None) => (0.0, NOT_FOUND_DESCRIPTION.to_string()),
            Err(e) => {
                tracing::warn!("Price lookup for \"{}\" failed: {}", name, e);
                (0.0, NOT_FOUND_DESCRIPTION.to_string())
            }
        };
        priced[index] = Some(PricedIngredient {
            name,
            price,
            description,
        });
    }
    let ingredients: Vec<PricedIngredient> = priced.into_iter().flatten().collect();

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let plan = Plan::create(&conn, &meal.name, &ingredients)
        .map_err(|e| format!("Failed to save plan: {}", e))?;

    tracing::info!("Priced meal '{}' at {:.2}", plan.meal_name, plan.total_price());
    Ok(PlanDetail::from(plan))
}

/// Most recent plans first
pub fn list_plans(db: &Database, limit: i64) -> Result<ListPlansResponse, String> {
    let limit = limit.clamp(1, 100);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let plans: Vec<PlanDetail> = Plan::list_recent(&conn, limit)
        .map_err(|e| format!("Failed to list plans: {}", e))?
        .into_iter()
        .map(PlanDetail::from)
        .collect();
    let total = plans.len();

    Ok(ListPlansResponse { plans, total })
}

// ============================================================================
// Assignments
// ============================================================================

/// Put a meal on a calendar day
pub fn assign_meal(
    db: &Database,
    date: &str,
    meal_name: &str,
    meal_type: Option<&str>,
) -> Result<AssignMealResponse, String> {
    let date = parse_date(date)?;
    let meal_name = meal_name.trim();
    if meal_name.is_empty() {
        return Err("Meal name cannot be empty".to_string());
    }
    let meal_type = match meal_type {
        Some(s) => MealType::from_str(s).ok_or_else(|| {
            format!("Invalid meal type '{}': use breakfast, lunch, dinner or snack", s)
        })?,
        None => MealType::default(),
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let library_meal = Meal::get_by_name(&conn, meal_name)
        .map_err(|e| format!("Database error: {}", e))?;
    let data = AssignmentCreate {
        date,
        meal_name: library_meal
            .as_ref()
            .map(|m| m.name.clone())
            .unwrap_or_else(|| meal_name.to_string()),
        meal_type,
    };

    let assignment = Assignment::create(&conn, &data)
        .map_err(|e| format!("Failed to assign meal: {}", e))?;

    Ok(AssignMealResponse {
        assignment,
        meal_in_library: library_meal.is_some(),
    })
}

/// Assignments within an inclusive date range
pub fn list_assignments(
    db: &Database,
    start: &str,
    end: &str,
) -> Result<ListAssignmentsResponse, String> {
    let (start, end) = parse_range(start, end)?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let assignments = Assignment::list_range(&conn, start, end)
        .map_err(|e| format!("Failed to list assignments: {}", e))?;
    let total = assignments.len();

    Ok(ListAssignmentsResponse {
        start,
        end,
        assignments,
        total,
    })
}

/// Remove an assignment
pub fn delete_assignment(db: &Database, id: i64) -> Result<DeleteResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = Assignment::delete(&conn, id)
        .map_err(|e| format!("Failed to delete assignment: {}", e))?;
    if !deleted {
        return Err(format!("Assignment not found with id: {}", id));
    }

    Ok(DeleteResponse {
        success: true,
        deleted_id: id,
    })
}

// ============================================================================
// Shopping list
// ============================================================================

/// Rebuild the shopping list for a date range from the assigned meals.
///
/// Existing rows in the range are replaced. Assigned names with no library
/// meal are reported back rather than failing the build.
pub fn build_shopping_list(
    db: &Database,
    start: &str,
    end: &str,
) -> Result<ShoppingListResponse, String> {
    let (start, end) = parse_range(start, end)?;

    let (entries, unknown_meals) = db
        .with_transaction(|tx| {
            ShoppingListEntry::delete_range(tx, start, end)?;

            let mut unknown_meals: Vec<String> = Vec::new();
            for assignment in Assignment::list_range(tx, start, end)? {
                match Meal::get_by_name(tx, &assignment.meal_name)? {
                    Some(meal) => {
                        for ingredient in &meal.ingredients {
                            ShoppingListEntry::create(tx, assignment.date, ingredient)?;
                        }
                    }
                    None => {
                        if !unknown_meals.contains(&assignment.meal_name) {
                            unknown_meals.push(assignment.meal_name.clone());
                        }
                    }
                }
            }

            let entries = ShoppingListEntry::list_range(tx, start, end)?;
            Ok((entries, unknown_meals))
        })
        .map_err(|e| format!("Failed to build shopping list: {}", e))?;

    if !unknown_meals.is_empty() {
        tracing::warn!(
            "Shopping list skipped meals not in the library: {}",
            unknown_meals.join(", ")
        );
    }

    let total = entries.len();
    Ok(ShoppingListResponse {
        start,
        end,
        entries,
        total,
        unknown_meals,
    })
}

/// Stored shopping list rows for a date range
pub fn get_shopping_list(
    db: &Database,
    start: &str,
    end: &str,
) -> Result<ShoppingListResponse, String> {
    let (start, end) = parse_range(start, end)?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let entries = ShoppingListEntry::list_range(&conn, start, end)
        .map_err(|e| format!("Failed to get shopping list: {}", e))?;
    let total = entries.len();

    Ok(ShoppingListResponse {
        start,
        end,
        entries,
        total,
        unknown_meals: Vec::new(),
    })
}

/// Remove shopping list rows for a date range
pub fn clear_shopping_list(
    db: &Database,
    start: &str,
    end: &str,
) -> Result<ClearShoppingListResponse, String> {
    let (start, end) = parse_range(start, end)?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let removed = ShoppingListEntry::delete_range(&conn, start, end)
        .map_err(|e| format!("Failed to clear shopping list: {}", e))?;

    Ok(ClearShoppingListResponse {
        success: true,
        removed,
    })
}
