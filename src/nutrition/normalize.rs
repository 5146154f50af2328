//! Nutrient field normalization
//!
//! Maps source-specific nutrient labels ("Energy", "energy-kcal",
//! "Total lipid (fat)", ...) onto the fixed fields of a `NutrientRecord`.

use serde_json::Value;

use crate::models::NutrientRecord;

/// Target fields of a normalized record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NutrientField {
    Calories,
    Protein,
    Fat,
    Carbs,
    Iron,
    VitaminC,
    VitaminA,
}

/// Acceptable labels for one target field
#[derive(Debug)]
pub struct FieldSynonyms {
    pub field: NutrientField,
    /// Lowercase synonyms in priority order
    pub synonyms: &'static [&'static str],
    /// Lowercase fragments that disqualify a label
    pub excludes: &'static [&'static str],
}

/// The synonym table used for every source
pub const FIELD_TABLE: &[FieldSynonyms] = &[
    FieldSynonyms {
        field: NutrientField::Calories,
        synonyms: &["energy-kcal", "calories", "energy"],
        excludes: &["kj", "kilojoule", "from fat", "from-fat"],
    },
    FieldSynonyms {
        field: NutrientField::Protein,
        synonyms: &["proteins", "protein"],
        excludes: &[],
    },
    FieldSynonyms {
        field: NutrientField::Fat,
        synonyms: &["total lipid", "total fat", "fat"],
        excludes: &["saturated", "trans", "fatty acids", "from fat", "from-fat"],
    },
    FieldSynonyms {
        field: NutrientField::Carbs,
        synonyms: &["carbohydrates", "carbohydrate", "carbs"],
        excludes: &[],
    },
    FieldSynonyms {
        field: NutrientField::Iron,
        synonyms: &["iron"],
        excludes: &[],
    },
    FieldSynonyms {
        field: NutrientField::VitaminC,
        synonyms: &["vitamin c", "vitamin-c", "ascorbic acid"],
        excludes: &[],
    },
    FieldSynonyms {
        field: NutrientField::VitaminA,
        synonyms: &["vitamin a", "vitamin-a"],
        excludes: &[],
    },
];

/// One labelled nutrient amount taken from a source payload
#[derive(Debug, Clone, PartialEq)]
pub struct NutrientEntry {
    pub label: String,
    pub amount: f64,
}

impl NutrientEntry {
    pub fn new(label: impl Into<String>, amount: f64) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }
}

/// Read a JSON number or numeric string. Non-finite values are rejected.
pub fn numeric(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Find the entry that best matches a field.
///
/// Synonyms are tried in order; for each one an exact label match wins over a
/// substring match. Labels containing an excluded fragment never match.
fn find_amount(entries: &[(String, f64)], field: &FieldSynonyms) -> Option<f64> {
    let allowed = |label: &str| !field.excludes.iter().any(|ex| label.contains(ex));

    for synonym in field.synonyms {
        if let Some((_, amount)) = entries
            .iter()
            .find(|(label, _)| label == synonym && allowed(label))
        {
            return Some(*amount);
        }
        if let Some((_, amount)) = entries
            .iter()
            .find(|(label, _)| label.contains(synonym) && allowed(label))
        {
            return Some(*amount);
        }
    }
    None
}

/// Build a record from labelled entries. Unmatched fields are zero.
pub fn normalize(name: impl Into<String>, entries: &[NutrientEntry]) -> NutrientRecord {
    let lowered: Vec<(String, f64)> = entries
        .iter()
        .map(|e| {
            let amount = if e.amount.is_finite() { e.amount } else { 0.0 };
            (e.label.trim().to_lowercase(), amount)
        })
        .collect();

    let mut record = NutrientRecord::named(name);
    for entry in FIELD_TABLE {
        let amount = find_amount(&lowered, entry).unwrap_or(0.0);
        let slot = match entry.field {
            NutrientField::Calories => &mut record.calories_per_serving,
            NutrientField::Protein => &mut record.protein_per_serving,
            NutrientField::Fat => &mut record.fat_per_serving,
            NutrientField::Carbs => &mut record.carbs_per_serving,
            NutrientField::Iron => &mut record.iron_per_serving,
            NutrientField::VitaminC => &mut record.vitamin_c_per_serving,
            NutrientField::VitaminA => &mut record.vitamin_a_per_serving,
        };
        *slot = amount;
    }
    record
}

/// Source product name if present and non-blank, otherwise the identifier
pub fn display_name(product_name: Option<&str>, identifier: &str) -> String {
    product_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(identifier)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_energy_maps_to_calories_case_insensitive() {
        let record = normalize("Oats", &[NutrientEntry::new("ENERGY", 389.0)]);
        assert_eq!(record.calories_per_serving, 389.0);

        let record = normalize("Oats", &[NutrientEntry::new("Calories", 150.0)]);
        assert_eq!(record.calories_per_serving, 150.0);
    }

    #[test]
    fn test_missing_fields_are_zero() {
        let record = normalize(
            "Rice",
            &[
                NutrientEntry::new("Energy", 130.0),
                NutrientEntry::new("Protein", 2.7),
            ],
        );
        assert_eq!(record.iron_per_serving, 0.0);
        assert_eq!(record.vitamin_a_per_serving, 0.0);
        assert_eq!(record.protein_per_serving, 2.7);
    }

    #[test]
    fn test_kcal_preferred_over_kj() {
        let record = normalize(
            "Mix",
            &[
                NutrientEntry::new("energy-kj", 1046.0),
                NutrientEntry::new("energy", 1046.0),
                NutrientEntry::new("energy-kcal", 250.0),
            ],
        );
        assert_eq!(record.calories_per_serving, 250.0);
    }

    #[test]
    fn test_saturated_fat_does_not_fill_fat() {
        let record = normalize("Butter", &[NutrientEntry::new("saturated-fat", 7.0)]);
        assert_eq!(record.fat_per_serving, 0.0);

        let record = normalize(
            "Butter",
            &[
                NutrientEntry::new("Fatty acids, total saturated", 7.0),
                NutrientEntry::new("Total lipid (fat)", 11.0),
            ],
        );
        assert_eq!(record.fat_per_serving, 11.0);
    }

    #[test]
    fn test_energy_from_fat_is_not_calories() {
        let record = normalize(
            "Chips",
            &[
                NutrientEntry::new("energy-from-fat", 90.0),
                NutrientEntry::new("Calories from fat", 90.0),
            ],
        );
        assert_eq!(record.calories_per_serving, 0.0);
        assert_eq!(record.fat_per_serving, 0.0);
    }

    #[test]
    fn test_usda_style_labels() {
        let record = normalize(
            "Spinach",
            &[
                NutrientEntry::new("Carbohydrate, by difference", 3.6),
                NutrientEntry::new("Iron, Fe", 2.71),
                NutrientEntry::new("Vitamin C, total ascorbic acid", 28.1),
                NutrientEntry::new("Vitamin A, RAE", 469.0),
            ],
        );
        assert_eq!(record.carbs_per_serving, 3.6);
        assert_eq!(record.iron_per_serving, 2.71);
        assert_eq!(record.vitamin_c_per_serving, 28.1);
        assert_eq!(record.vitamin_a_per_serving, 469.0);
    }

    #[test]
    fn test_non_finite_amounts_are_zero() {
        let record = normalize("Odd", &[NutrientEntry::new("iron", f64::NAN)]);
        assert_eq!(record.iron_per_serving, 0.0);
    }

    #[test]
    fn test_numeric_accepts_numbers_and_strings() {
        assert_eq!(numeric(&json!(12.5)), Some(12.5));
        assert_eq!(numeric(&json!(" 3 ")), Some(3.0));
        assert_eq!(numeric(&json!("n/a")), None);
        assert_eq!(numeric(&json!(null)), None);
    }

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(
            display_name(Some("Krusteaz Pancake Mix"), "pancake mix"),
            "Krusteaz Pancake Mix"
        );
        assert_eq!(display_name(Some("  "), "04963406"), "04963406");
        assert_eq!(display_name(None, "04963406"), "04963406");
    }
}
