//! Shared nutrition data structure
//!
//! Normalized per-serving nutrition facts, produced by the resolver and
//! embedded in pantry items.

use serde::{Deserialize, Serialize};

/// Per-serving nutrition facts for one food item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientRecord {
    /// Resolved product name (falls back to the lookup identifier)
    pub name: String,
    pub calories_per_serving: f64, // kcal
    pub protein_per_serving: f64, // grams
    pub fat_per_serving: f64, // grams
    pub carbs_per_serving: f64, // grams
    pub iron_per_serving: f64, // milligrams
    pub vitamin_c_per_serving: f64, // milligrams
    pub vitamin_a_per_serving: f64, // source units (µg RAE or IU)
}

impl NutrientRecord {
    /// A record with the given name and all nutrients zero
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Scale nutrient values by a multiplier (name is kept)
    pub fn scale(&self, multiplier: f64) -> Self {
        Self {
            name: self.name.clone(),
            calories_per_serving: self.calories_per_serving * multiplier,
            protein_per_serving: self.protein_per_serving * multiplier,
            fat_per_serving: self.fat_per_serving * multiplier,
            carbs_per_serving: self.carbs_per_serving * multiplier,
            iron_per_serving: self.iron_per_serving * multiplier,
            vitamin_c_per_serving: self.vitamin_c_per_serving * multiplier,
            vitamin_a_per_serving: self.vitamin_a_per_serving * multiplier,
        }
    }

    /// True when every nutrient is zero
    pub fn is_empty(&self) -> bool {
        [
            self.calories_per_serving,
            self.protein_per_serving,
            self.fat_per_serving,
            self.carbs_per_serving,
            self.iron_per_serving,
            self.vitamin_c_per_serving,
            self.vitamin_a_per_serving,
        ]
        .iter()
        .all(|v| *v == 0.0)
    }
}

impl std::ops::Mul<f64> for NutrientRecord {
    type Output = NutrientRecord;

    fn mul(self, multiplier: f64) -> NutrientRecord {
        self.scale(multiplier)
    }
}
