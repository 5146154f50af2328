//! Larder Status Tool
//!
//! Provides runtime status information about the Larder service.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Workflow instructions for AI assistants
pub const WORKFLOW_INSTRUCTIONS: &str = r#"
# Larder Workflow

## Pantry

1. `add_storage_item` with a `name` (or a `barcode` of 8+ digits, which is
   preferred when present). Nutrition is looked up first; if no food database
   knows the item the add is rejected. Try a more generic name or the barcode.
2. Set `quantity` (units on hand) and `servings_per_unit` so totals can be
   computed. Without both, totals are reported as `null`, never zero.
3. `storage_summary` reports total calories, protein and iron plus the number
   of full days the pantry feeds the household (2000 kcal per person per day,
   family size 5 unless given).

Renaming an item or changing its barcode looks nutrition up again. Use
`refresh_nutrition: true` to force a new lookup.

## Meals and calendar

- `add_meal` with an ordered ingredient list. Meal names are unique
  (case-insensitive).
- `assign_meal` with a date (YYYY-MM-DD) and a meal type (breakfast, lunch,
  dinner or snack; dinner by default).
- `build_shopping_list` for a date range replaces the stored list for that
  range with every ingredient of every assigned meal. Assigned names that are
  not in the meal library are listed in `unknown_meals`.

## Pricing

`price_meal` searches each ingredient at the grocery retailer and saves the
result as a plan. Ingredients with no match are priced at 0 and described as
"Not found". Without retailer credentials every ingredient is "Not found".
"#;

/// Runtime status of the Larder service
#[derive(Debug, Clone, Serialize)]
pub struct LarderStatus {
    /// Build information
    pub build: String,
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// Integrations
    pub nutrition_sources: Vec<&'static str>,
    pub grocery_configured: bool,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
    nutrition_sources: Vec<&'static str>,
    grocery_configured: bool,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(
        database_path: PathBuf,
        nutrition_sources: Vec<&'static str>,
        grocery_configured: bool,
    ) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
            nutrition_sources,
            grocery_configured,
        }
    }

    /// Get the current status
    pub fn get_status(&self) -> LarderStatus {
        let build_info = BuildInfo::current();

        // Get database size if it exists
        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        // Get process info
        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        LarderStatus {
            build: build_info.label(),
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            nutrition_sources: self.nutrition_sources.clone(),
            grocery_configured: self.grocery_configured,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reports_integrations() {
        let tracker = StatusTracker::new(
            PathBuf::from("/nonexistent/larder.db"),
            vec!["open_food_facts"],
            false,
        );
        let status = tracker.get_status();
        assert_eq!(status.database_size_bytes, None);
        assert_eq!(status.nutrition_sources, vec!["open_food_facts"]);
        assert!(!status.grocery_configured);
        assert_eq!(status.process_id, std::process::id());
        assert!(status.build.starts_with("larder "));
    }
}
