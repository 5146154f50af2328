//! Household totals
//!
//! Pure arithmetic over stored pantry items: total calories, protein and iron,
//! and how many full days the stock could feed a household.

use serde::Serialize;

use crate::models::InventoryItem;

/// Reference intake per person per day (kcal)
pub const DAILY_CALORIES_PER_PERSON: f64 = 2000.0;

/// Household size used when the caller does not supply one
pub const DEFAULT_FAMILY_SIZE: u32 = 5;

/// Aggregate nutrition for one pantry item. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TotalsResult {
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_iron: f64,
    pub days_of_support: u64,
}

/// Full days of caloric support, floor-divided.
///
/// Zero for a zero household or for non-positive / non-finite calories.
pub fn days_of_support(total_calories: f64, family_size: u32) -> u64 {
    if family_size == 0 || !total_calories.is_finite() || total_calories <= 0.0 {
        return 0;
    }
    let days = (total_calories / (f64::from(family_size) * DAILY_CALORIES_PER_PERSON)).floor();
    if days >= u64::MAX as f64 {
        u64::MAX
    } else {
        days as u64
    }
}

/// Compute totals for an item.
///
/// Callers check `InventoryItem::is_computable` first; missing quantity or
/// servings count as zero here. Fat, carbs and vitamins are not aggregated.
pub fn compute_totals(item: &InventoryItem, family_size: u32) -> TotalsResult {
    let quantity = item.quantity.unwrap_or(0) as f64;
    let servings_per_unit = item
        .servings_per_unit
        .filter(|s| s.is_finite())
        .unwrap_or(0.0);
    let total_servings = quantity * servings_per_unit;

    let totals = item.nutrition.scale(total_servings);

    TotalsResult {
        total_calories: totals.calories_per_serving,
        total_protein: totals.protein_per_serving,
        total_iron: totals.iron_per_serving,
        days_of_support: days_of_support(totals.calories_per_serving, family_size),
    }
}

/// Totals across a whole pantry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PantrySummary {
    pub family_size: u32,
    pub item_count: usize,
    /// Items whose totals are unknown (missing quantity or servings)
    pub items_without_totals: usize,
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_iron: f64,
    /// Computed from the summed calories, not the sum of per-item days
    pub days_of_support: u64,
}

/// Sum the totals of every computable item
pub fn summarize(items: &[InventoryItem], family_size: u32) -> PantrySummary {
    let mut summary = PantrySummary {
        family_size,
        item_count: items.len(),
        items_without_totals: 0,
        total_calories: 0.0,
        total_protein: 0.0,
        total_iron: 0.0,
        days_of_support: 0,
    };

    for item in items {
        match item.totals(family_size) {
            Some(t) => {
                summary.total_calories += t.total_calories;
                summary.total_protein += t.total_protein;
                summary.total_iron += t.total_iron;
            }
            None => summary.items_without_totals += 1,
        }
    }

    summary.days_of_support = days_of_support(summary.total_calories, family_size);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NutrientRecord;

    fn item(quantity: Option<i64>, servings: Option<f64>, calories: f64) -> InventoryItem {
        InventoryItem {
            quantity,
            servings_per_unit: servings,
            nutrition: NutrientRecord {
                calories_per_serving: calories,
                protein_per_serving: 3.0,
                iron_per_serving: 0.5,
                fat_per_serving: 9.0,
                ..NutrientRecord::named("Test")
            },
            ..InventoryItem::new("Test", "bag", "grains")
        }
    }

    #[test]
    fn test_partial_day_rounds_down() {
        // 10 units * 4 servings * 200 kcal = 8000 kcal; 8000 / 10000 -> 0
        let totals = compute_totals(&item(Some(10), Some(4.0), 200.0), 5);
        assert_eq!(totals.total_calories, 8000.0);
        assert_eq!(totals.total_protein, 120.0);
        assert_eq!(totals.total_iron, 20.0);
        assert_eq!(totals.days_of_support, 0);
    }

    #[test]
    fn test_two_full_days() {
        // 20 * 2 * 500 = 20000 kcal -> 2 days for five people
        let totals = compute_totals(&item(Some(20), Some(2.0), 500.0), DEFAULT_FAMILY_SIZE);
        assert_eq!(totals.total_calories, 20000.0);
        assert_eq!(totals.days_of_support, 2);
    }

    #[test]
    fn test_linear_in_total_servings() {
        let one = compute_totals(&item(Some(3), Some(2.5), 120.0), 5);
        let double = compute_totals(&item(Some(6), Some(2.5), 120.0), 5);
        let same_servings = compute_totals(&item(Some(5), Some(1.5), 120.0), 5);

        assert_eq!(double.total_calories, one.total_calories * 2.0);
        assert_eq!(double.total_protein, one.total_protein * 2.0);
        assert_eq!(double.total_iron, one.total_iron * 2.0);
        assert_eq!(same_servings.total_calories, one.total_calories);
    }

    #[test]
    fn test_idempotent() {
        let pantry_item = item(Some(7), Some(3.0), 310.0);
        assert_eq!(compute_totals(&pantry_item, 4), compute_totals(&pantry_item, 4));
    }

    #[test]
    fn test_missing_inputs_are_nan_safe() {
        let totals = compute_totals(&item(None, Some(2.0), 500.0), 5);
        assert_eq!(totals.total_calories, 0.0);
        assert_eq!(totals.days_of_support, 0);

        let totals = compute_totals(&item(Some(2), Some(f64::NAN), 500.0), 5);
        assert_eq!(totals.total_calories, 0.0);
        assert_eq!(totals.days_of_support, 0);
    }

    #[test]
    fn test_days_of_support_edges() {
        assert_eq!(days_of_support(10_000.0, 0), 0);
        assert_eq!(days_of_support(-500.0, 5), 0);
        assert_eq!(days_of_support(f64::INFINITY, 5), 0);
        assert_eq!(days_of_support(9_999.0, 5), 0);
        assert_eq!(days_of_support(10_000.0, 5), 1);
        assert_eq!(days_of_support(4_000.0, 1), 2);
    }

    #[test]
    fn test_summary_skips_unknown_items() {
        let items = vec![
            item(Some(20), Some(2.0), 500.0),
            item(Some(10), Some(4.0), 200.0),
            item(None, Some(4.0), 200.0),
            item(Some(3), None, 200.0),
        ];
        let summary = summarize(&items, 5);
        assert_eq!(summary.item_count, 4);
        assert_eq!(summary.items_without_totals, 2);
        assert_eq!(summary.total_calories, 28000.0);
        assert_eq!(summary.days_of_support, 2);
    }
}
