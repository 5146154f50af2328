//! USDA FoodData Central source
//!
//! Name search only: `/foods/search` picks the first hit, then `/food/{fdcId}`
//! supplies the full nutrient list. USDA values are reported per 100 g and
//! are stored as the serving values.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;

use super::normalize::{display_name, normalize, numeric, NutrientEntry};
use super::resolver::NutritionSource;
use super::transport::{parse_json, HttpFetch, SourceError};
use crate::models::NutrientRecord;

pub struct Usda {
    base_url: String,
    api_key: String,
    http: Arc<dyn HttpFetch>,
}

impl Usda {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        http: Arc<dyn HttpFetch>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
        }
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, SourceError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| SourceError::Transport(format!("invalid URL: {}", e)))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("api_key", &self.api_key);
        }
        Ok(url)
    }

    async fn fetch(&self, url: &Url) -> Result<Value, SourceError> {
        let body = self.http.get_text(url).await?;
        let value = parse_json(&body)?;
        if !value.is_object() {
            return Err(SourceError::UnexpectedShape(
                "top-level JSON is not an object".to_string(),
            ));
        }
        Ok(value)
    }

    /// Nutrient list from the detail endpoint
    async fn food_details(&self, fdc_id: u64) -> Result<Vec<NutrientEntry>, SourceError> {
        let url = self.url(&format!("/food/{}", fdc_id), &[])?;
        let data = self.fetch(&url).await?;
        data.get("foodNutrients")
            .and_then(Value::as_array)
            .map(|list| nutrient_entries(list))
            .ok_or_else(|| {
                SourceError::UnexpectedShape("food detail has no foodNutrients".to_string())
            })
    }
}

/// Read `foodNutrients` in either the flat search shape
/// (`nutrientName`/`value`/`unitName`) or the nested detail shape
/// (`nutrient.name`/`nutrient.unitName`/`amount`). kJ energy rows are skipped.
fn nutrient_entries(list: &[Value]) -> Vec<NutrientEntry> {
    list.iter()
        .filter_map(|n| {
            let nested = n.get("nutrient");
            let label = n
                .get("nutrientName")
                .or_else(|| nested.and_then(|x| x.get("name")))
                .and_then(Value::as_str)?;
            let unit = n
                .get("unitName")
                .or_else(|| nested.and_then(|x| x.get("unitName")))
                .and_then(Value::as_str)
                .unwrap_or("");
            if unit.eq_ignore_ascii_case("kj") {
                return None;
            }
            let amount = n
                .get("value")
                .or_else(|| n.get("amount"))
                .and_then(numeric)
                .unwrap_or(0.0);
            Some(NutrientEntry::new(label, amount))
        })
        .collect()
}

#[async_trait]
impl NutritionSource for Usda {
    fn name(&self) -> &'static str {
        "USDA FoodData Central"
    }

    async fn search_name(&self, query: &str) -> Result<Option<NutrientRecord>, SourceError> {
        let url = self.url("/foods/search", &[("query", query)])?;
        let data = self.fetch(&url).await?;

        let Some(food) = data
            .get("foods")
            .and_then(Value::as_array)
            .and_then(|foods| foods.first())
        else {
            tracing::warn!("USDA search returned no match for: {}", query);
            return Ok(None);
        };

        let name = display_name(food.get("description").and_then(Value::as_str), query);

        let fdc_id = food
            .get("fdcId")
            .and_then(numeric)
            .filter(|id| *id >= 0.0)
            .map(|id| id as u64);

        let detailed = match fdc_id {
            Some(id) => match self.food_details(id).await {
                Ok(entries) => Some(entries),
                Err(e) => {
                    tracing::warn!("USDA detail lookup for fdcId {} failed: {}", id, e);
                    None
                }
            },
            None => None,
        };

        let entries = match detailed {
            Some(entries) => entries,
            None => food
                .get("foodNutrients")
                .and_then(Value::as_array)
                .map(|list| nutrient_entries(list))
                .unwrap_or_default(),
        };

        Ok(Some(normalize(name, &entries)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::transport::testing::{FakeFetch, Reply};

    const SEARCH: &str = r#"{
        "totalHits": 2,
        "foods": [
            {
                "fdcId": 168462,
                "description": "Spinach, raw",
                "foodNutrients": [
                    {"nutrientName": "Energy", "unitName": "KCAL", "value": 23},
                    {"nutrientName": "Iron, Fe", "unitName": "MG", "value": 2.7}
                ]
            }
        ]
    }"#;

    const DETAIL: &str = r#"{
        "fdcId": 168462,
        "description": "Spinach, raw",
        "foodNutrients": [
            {"nutrient": {"name": "Energy", "unitName": "kJ"}, "amount": 97},
            {"nutrient": {"name": "Energy", "unitName": "kcal"}, "amount": 23},
            {"nutrient": {"name": "Protein", "unitName": "g"}, "amount": 2.86},
            {"nutrient": {"name": "Total lipid (fat)", "unitName": "g"}, "amount": 0.39},
            {"nutrient": {"name": "Iron, Fe", "unitName": "mg"}, "amount": 2.71},
            {"nutrient": {"name": "Vitamin C, total ascorbic acid", "unitName": "mg"}, "amount": 28.1}
        ]
    }"#;

    fn source(fetch: FakeFetch) -> Usda {
        Usda::new("https://usda.test/fdc/v1", "KEY", Arc::new(fetch))
    }

    #[tokio::test]
    async fn test_search_then_detail() {
        let fetch = FakeFetch::new()
            .route("/foods/search", Reply::Body(SEARCH))
            .route("/food/168462", Reply::Body(DETAIL));
        let usda = source(fetch);
        let record = usda.search_name("spinach").await.unwrap().unwrap();

        assert_eq!(record.name, "Spinach, raw");
        assert_eq!(record.calories_per_serving, 23.0);
        assert_eq!(record.protein_per_serving, 2.86);
        assert_eq!(record.fat_per_serving, 0.39);
        assert_eq!(record.iron_per_serving, 2.71);
        assert_eq!(record.vitamin_c_per_serving, 28.1);
        assert_eq!(record.vitamin_a_per_serving, 0.0);
    }

    #[tokio::test]
    async fn test_detail_failure_uses_search_hit_nutrients() {
        let fetch = FakeFetch::new()
            .route("/foods/search", Reply::Body(SEARCH))
            .route("/food/168462", Reply::Fail);
        let usda = source(fetch);
        let record = usda.search_name("spinach").await.unwrap().unwrap();

        assert_eq!(record.calories_per_serving, 23.0);
        assert_eq!(record.iron_per_serving, 2.7);
        assert_eq!(record.protein_per_serving, 0.0);
    }

    #[tokio::test]
    async fn test_api_key_and_query_are_sent() {
        let fetch =
            Arc::new(FakeFetch::new().route("/foods/search", Reply::Body(r#"{"foods": []}"#)));
        let usda = Usda::new("https://usda.test/fdc/v1/", "KEY", fetch.clone());
        assert!(usda.search_name("brown rice").await.unwrap().is_none());

        let calls = fetch.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            "https://usda.test/fdc/v1/foods/search?query=brown+rice&api_key=KEY"
        );
    }
}
