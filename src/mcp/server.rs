//! Larder MCP Server Implementation
//!
//! Implements the MCP server with all Larder tools.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::db::Database;
use crate::grocery::{KrogerClient, ProductSearch};
use crate::models::{StorageItemCreate, StorageItemUpdate};
use crate::nutrition::Resolver;
use crate::tools::status::StatusTracker;
use crate::tools::{parse_date, planner, storage};

/// Larder MCP Service
#[derive(Clone)]
pub struct LarderService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    resolver: Resolver,
    grocery: Arc<dyn ProductSearch>,
    tool_router: ToolRouter<LarderService>,
}

impl LarderService {
    pub fn new(
        database_path: PathBuf,
        database: Database,
        resolver: Resolver,
        grocery: Arc<KrogerClient>,
    ) -> Self {
        let tracker =
            StatusTracker::new(database_path, resolver.source_names(), grocery.is_configured());
        Self {
            status_tracker: Arc::new(Mutex::new(tracker)),
            database,
            resolver,
            grocery,
            tool_router: Self::tool_router(),
        }
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn parse_optional_date(date: Option<&str>) -> Result<Option<chrono::NaiveDate>, McpError> {
    date.map(parse_date)
        .transpose()
        .map_err(|e| McpError::invalid_params(e, None))
}

// ============================================================================
// Pantry Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddStorageItemParams {
    /// Item name, used for the nutrition lookup when no barcode is given
    pub name: String,
    /// UPC/EAN barcode (8+ digits); preferred over the name for lookup
    pub barcode: Option<String>,
    /// Units on hand (0 or more)
    pub quantity: Option<i64>,
    /// Display unit, e.g. "can" or "bag"
    #[serde(default)]
    pub unit: String,
    /// Servings in one unit
    pub servings_per_unit: Option<f64>,
    /// Expiry date (YYYY-MM-DD)
    pub expires: Option<String>,
    /// Category, e.g. "canned goods"
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateStorageItemParams {
    /// Storage item ID
    pub id: i64,
    /// New name (re-runs the nutrition lookup when changed)
    pub name: Option<String>,
    /// New barcode (re-runs the nutrition lookup when changed)
    pub barcode: Option<String>,
    pub quantity: Option<i64>,
    pub unit: Option<String>,
    pub servings_per_unit: Option<f64>,
    /// Expiry date (YYYY-MM-DD)
    pub expires: Option<String>,
    pub category: Option<String>,
    /// Force a new nutrition lookup (default false)
    #[serde(default)]
    pub refresh_nutrition: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetStorageItemParams {
    /// Storage item ID
    pub id: i64,
    /// Household size for totals (default 5)
    pub family_size: Option<u32>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListStorageItemsParams {
    /// Household size for totals (default 5)
    pub family_size: Option<u32>,
    /// Only items expiring on or before this date (YYYY-MM-DD)
    pub expiring_by: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteByIdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct StorageSummaryParams {
    /// Household size (default 5)
    pub family_size: Option<u32>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LookupNutritionParams {
    /// Food name or barcode
    pub identifier: String,
}

// ============================================================================
// Planner Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddMealParams {
    /// Meal name (unique, case-insensitive)
    pub name: String,
    /// Ingredient names in order
    #[serde(default)]
    pub ingredients: Vec<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetMealIngredientsParams {
    /// Meal ID
    pub meal_id: i64,
    /// New ingredient names in order (replaces the current list)
    pub ingredients: Vec<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PriceMealParams {
    /// Meal ID
    pub meal_id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListPlansParams {
    /// Maximum results (default 10, max 100)
    #[serde(default = "default_plan_limit")]
    pub limit: i64,
}

fn default_plan_limit() -> i64 {
    10
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AssignMealParams {
    /// Date (YYYY-MM-DD)
    pub date: String,
    /// Meal name from the library
    pub meal_name: String,
    /// breakfast, lunch, dinner or snack (default dinner)
    pub meal_type: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DateRangeParams {
    /// Start date, inclusive (YYYY-MM-DD)
    pub start: String,
    /// End date, inclusive (YYYY-MM-DD)
    pub end: String,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl LarderService {
    // --- Status ---

    #[tool(description = "Get the current status of the Larder service including build info, database status, configured integrations, and process information")]
    async fn larder_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        json_result(&tracker.get_status())
    }

    #[tool(description = "Get instructions for the pantry, meal planning and pricing tools. Call this when unsure how the tools fit together.")]
    fn larder_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::WORKFLOW_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(WORKFLOW_INSTRUCTIONS)]))
    }

    // --- Pantry ---

    #[tool(description = "Add a pantry item. Nutrition is looked up by barcode (if given) or name; the add is rejected if no food database knows the item.")]
    async fn add_storage_item(
        &self,
        Parameters(p): Parameters<AddStorageItemParams>,
    ) -> Result<CallToolResult, McpError> {
        let data = StorageItemCreate {
            name: p.name,
            barcode: p.barcode,
            quantity: p.quantity,
            unit: p.unit,
            servings_per_unit: p.servings_per_unit,
            expires: parse_optional_date(p.expires.as_deref())?,
            category: p.category,
        };
        let result = storage::add_storage_item(&self.database, &self.resolver, data)
            .await
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Update a pantry item. Changing the name or barcode (or refresh_nutrition=true) looks nutrition up again; a failed lookup rejects the edit.")]
    async fn update_storage_item(
        &self,
        Parameters(p): Parameters<UpdateStorageItemParams>,
    ) -> Result<CallToolResult, McpError> {
        let data = StorageItemUpdate {
            name: p.name,
            barcode: p.barcode,
            quantity: p.quantity,
            unit: p.unit,
            servings_per_unit: p.servings_per_unit,
            expires: parse_optional_date(p.expires.as_deref())?,
            category: p.category,
        };
        let result = storage::update_storage_item(
            &self.database,
            &self.resolver,
            p.id,
            data,
            p.refresh_nutrition,
        )
        .await
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a pantry item with its household totals (null when quantity or servings are missing)")]
    fn get_storage_item(
        &self,
        Parameters(p): Parameters<GetStorageItemParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = storage::get_storage_item(&self.database, p.id, p.family_size)
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(item) => json_result(&item),
            None => Ok(CallToolResult::success(vec![Content::text(format!(
                r#"{{"error": "Storage item not found", "id": {}}}"#,
                p.id
            ))])),
        }
    }

    #[tool(description = "List pantry items sorted by name, each with household totals. Optionally only items expiring by a date.")]
    fn list_storage_items(
        &self,
        Parameters(p): Parameters<ListStorageItemsParams>,
    ) -> Result<CallToolResult, McpError> {
        let expiring_by = parse_optional_date(p.expiring_by.as_deref())?;
        let result = storage::list_storage_items(&self.database, p.family_size, expiring_by)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Delete a pantry item")]
    fn delete_storage_item(
        &self,
        Parameters(p): Parameters<DeleteByIdParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = storage::delete_storage_item(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Total calories, protein and iron across the pantry, and how many full days it feeds the household (2000 kcal per person per day)")]
    fn storage_summary(
        &self,
        Parameters(p): Parameters<StorageSummaryParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = storage::storage_summary(&self.database, p.family_size)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Look up per-serving nutrition for a food name or barcode without storing anything")]
    async fn lookup_nutrition(
        &self,
        Parameters(p): Parameters<LookupNutritionParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = storage::lookup_nutrition(&self.resolver, &p.identifier)
            .await
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Meals ---

    #[tool(description = "Add a meal with an ordered list of ingredient names")]
    fn add_meal(
        &self,
        Parameters(p): Parameters<AddMealParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = planner::add_meal(&self.database, &p.name, p.ingredients)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "List all meals with their ingredients")]
    fn list_meals(&self) -> Result<CallToolResult, McpError> {
        let result = planner::list_meals(&self.database)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Replace a meal's ingredient list")]
    fn set_meal_ingredients(
        &self,
        Parameters(p): Parameters<SetMealIngredientsParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = planner::set_meal_ingredients(&self.database, p.meal_id, p.ingredients)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Delete a meal from the library")]
    fn delete_meal(
        &self,
        Parameters(p): Parameters<DeleteByIdParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = planner::delete_meal(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Price each ingredient of a meal at the grocery retailer and save the result as a plan")]
    async fn price_meal(
        &self,
        Parameters(p): Parameters<PriceMealParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = planner::price_meal(&self.database, Arc::clone(&self.grocery), p.meal_id)
            .await
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "List the most recent priced plans")]
    fn list_plans(
        &self,
        Parameters(p): Parameters<ListPlansParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = planner::list_plans(&self.database, p.limit)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Calendar ---

    #[tool(description = "Assign a meal to a date and meal type (breakfast, lunch, dinner, snack)")]
    fn assign_meal(
        &self,
        Parameters(p): Parameters<AssignMealParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = planner::assign_meal(
            &self.database,
            &p.date,
            &p.meal_name,
            p.meal_type.as_deref(),
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "List meal assignments within an inclusive date range")]
    fn list_assignments(
        &self,
        Parameters(p): Parameters<DateRangeParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = planner::list_assignments(&self.database, &p.start, &p.end)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Remove a meal assignment")]
    fn delete_assignment(
        &self,
        Parameters(p): Parameters<DeleteByIdParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = planner::delete_assignment(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Shopping list ---

    #[tool(description = "Rebuild the shopping list for a date range from the assigned meals' ingredients. Replaces existing rows in the range.")]
    fn build_shopping_list(
        &self,
        Parameters(p): Parameters<DateRangeParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = planner::build_shopping_list(&self.database, &p.start, &p.end)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get the stored shopping list for a date range")]
    fn get_shopping_list(
        &self,
        Parameters(p): Parameters<DateRangeParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = planner::get_shopping_list(&self.database, &p.start, &p.end)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Clear the shopping list for a date range")]
    fn clear_shopping_list(
        &self,
        Parameters(p): Parameters<DateRangeParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = planner::clear_shopping_list(&self.database, &p.start, &p.end)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for LarderService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "larder".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Larder".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Larder - pantry nutrition and meal planning. \
                 Call larder_instructions for the full workflow. \
                 Pantry: add/update/get/list/delete_storage_item, storage_summary, lookup_nutrition. \
                 Meals: add_meal, list_meals, set_meal_ingredients, delete_meal, price_meal, list_plans. \
                 Calendar: assign_meal, list_assignments, delete_assignment. \
                 Shopping: build_shopping_list, get_shopping_list, clear_shopping_list. \
                 Dates use YYYY-MM-DD."
                    .into(),
            ),
        }
    }
}
