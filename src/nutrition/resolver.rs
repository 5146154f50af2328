//! Nutrition resolver
//!
//! Maps a pantry identifier (barcode or free-text name) to a normalized
//! `NutrientRecord` by consulting the configured sources in priority order.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::identifier::Identifier;
use super::open_food_facts::OpenFoodFacts;
use super::transport::{HttpFetch, SourceError};
use super::usda::Usda;
use crate::config::NutritionConfig;
use crate::models::NutrientRecord;

/// An external nutrition database
#[async_trait]
pub trait NutritionSource: Send + Sync {
    /// Source name for logs
    fn name(&self) -> &'static str;

    /// Look up a product by barcode. Sources without a barcode endpoint
    /// report no product.
    async fn lookup_barcode(&self, _code: &str) -> Result<Option<NutrientRecord>, SourceError> {
        Ok(None)
    }

    /// Free-text search; the first result is used
    async fn search_name(&self, query: &str) -> Result<Option<NutrientRecord>, SourceError>;
}

/// No source produced a product for the identifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Nutrition info not found for \"{identifier}\", try a different name or barcode")]
pub struct NotFound {
    pub identifier: String,
}

/// Resolves identifiers against an ordered list of sources.
///
/// Holds no per-call state; one resolver can serve concurrent lookups.
#[derive(Clone)]
pub struct Resolver {
    sources: Arc<Vec<Box<dyn NutritionSource>>>,
}

impl Resolver {
    pub fn new(sources: Vec<Box<dyn NutritionSource>>) -> Self {
        Self {
            sources: Arc::new(sources),
        }
    }

    /// Open Food Facts first, then USDA when an API key is configured
    pub fn from_config(config: &NutritionConfig, http: Arc<dyn HttpFetch>) -> Self {
        let mut sources: Vec<Box<dyn NutritionSource>> =
            vec![Box::new(OpenFoodFacts::new(config.off_base_url.clone(), http.clone()))];
        match &config.usda_api_key {
            Some(key) => sources.push(Box::new(Usda::new(
                config.usda_base_url.clone(),
                key.clone(),
                http,
            ))),
            None => tracing::info!("USDA_API_KEY not set; USDA nutrition lookups disabled"),
        }
        Self::new(sources)
    }

    /// Names of the configured sources, in priority order
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Resolve an identifier to per-serving nutrition facts.
    ///
    /// For each source: barcode lookup (barcodes only), then name search with
    /// the same string. The first product found wins. Source failures are
    /// logged and skipped.
    pub async fn resolve(&self, raw: &str) -> Result<NutrientRecord, NotFound> {
        let identifier = Identifier::classify(raw);
        let text = identifier.as_str();
        let not_found = || NotFound {
            identifier: text.to_string(),
        };

        if text.is_empty() {
            return Err(not_found());
        }

        for source in self.sources.iter() {
            if let Identifier::Barcode(code) = identifier {
                match source.lookup_barcode(code).await {
                    Ok(Some(record)) => {
                        tracing::debug!(
                            "Resolved {} via {} barcode lookup",
                            identifier,
                            source.name()
                        );
                        return Ok(record);
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!(
                        "{} barcode lookup for {} failed: {}",
                        source.name(),
                        code,
                        e
                    ),
                }
            }

            match source.search_name(text).await {
                Ok(Some(record)) => {
                    tracing::debug!("Resolved {} via {} search", identifier, source.name());
                    return Ok(record);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("{} search for \"{}\" failed: {}", source.name(), text, e),
            }
        }

        tracing::warn!("No nutrition source matched {}", identifier);
        Err(not_found())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::transport::testing::{FakeFetch, Reply};

    const OFF: &str = "https://off.test";
    const USDA: &str = "https://usda.test/fdc/v1";

    fn resolver(fetch: Arc<FakeFetch>, with_usda: bool) -> Resolver {
        let config = NutritionConfig {
            off_base_url: OFF.to_string(),
            usda_base_url: USDA.to_string(),
            usda_api_key: with_usda.then(|| "KEY".to_string()),
        };
        Resolver::from_config(&config, fetch)
    }

    #[tokio::test]
    async fn test_barcode_hits_barcode_endpoint_first() {
        let coke = r#"{"product": {"product_name": "Coca-Cola",
            "nutriments": {"energy-kcal_serving": 139}}}"#;
        let fetch =
            Arc::new(FakeFetch::new().route("/api/v0/product/04963406.json", Reply::Body(coke)));
        let record = resolver(fetch.clone(), false).resolve("04963406").await.unwrap();

        assert_eq!(record.name, "Coca-Cola");
        assert_eq!(record.calories_per_serving, 139.0);
        assert_eq!(fetch.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_barcode_miss_falls_back_to_name_search() {
        let fetch = Arc::new(
            FakeFetch::new()
                .route("/api/v0/product/", Reply::Body(r#"{"status": 0}"#))
                .route(
                    "search_terms=04963406",
                    Reply::Body(r#"{"products": [{"nutriments": {"proteins_serving": 1}}]}"#),
                ),
        );
        let record = resolver(fetch.clone(), false).resolve("04963406").await.unwrap();

        assert_eq!(record.name, "04963406");
        assert_eq!(record.protein_per_serving, 1.0);
        let calls = fetch.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].contains("/api/v0/product/04963406.json"));
        assert!(calls[1].contains("search.pl"));
    }

    #[tokio::test]
    async fn test_name_skips_barcode_endpoint() {
        let fetch = Arc::new(FakeFetch::new().route(
            "search.pl",
            Reply::Body(r#"{"products": [{"product_name": "Pancake Mix", "nutriments": {}}]}"#),
        ));
        let record = resolver(fetch.clone(), false).resolve("pancake mix").await.unwrap();

        // Found but sparse: every nutrient zero, still a product
        assert_eq!(record.name, "Pancake Mix");
        assert!(record.is_empty());
        assert_eq!(fetch.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_non_json_response_is_not_found() {
        let fetch = Arc::new(FakeFetch::new().route("search.pl", Reply::Body("<html>oops</html>")));
        let err = resolver(fetch, false).resolve("pancake mix").await.unwrap_err();
        assert_eq!(err.identifier, "pancake mix");
        assert!(err.to_string().contains("try a different name or barcode"));
    }

    #[tokio::test]
    async fn test_second_source_used_when_first_fails() {
        let lentils = r#"{"foods": [{"description": "Lentils, raw", "foodNutrients":
            [{"nutrientName": "Iron, Fe", "unitName": "MG", "value": 6.5}]}]}"#;
        let fetch = Arc::new(
            FakeFetch::new()
                .route("off.test", Reply::Fail)
                .route("/foods/search", Reply::Body(lentils)),
        );
        let resolver = resolver(fetch.clone(), true);
        assert_eq!(resolver.source_names(), vec!["Open Food Facts", "USDA FoodData Central"]);

        let record = resolver.resolve("lentils").await.unwrap();
        assert_eq!(record.name, "Lentils, raw");
        assert_eq!(record.iron_per_serving, 6.5);
        assert_eq!(record.calories_per_serving, 0.0);
    }

    #[tokio::test]
    async fn test_barcode_searches_source_without_barcode_endpoint() {
        let lentils = r#"{"foods": [{"description": "Lentils, raw", "foodNutrients": []}]}"#;
        let fetch = Arc::new(
            FakeFetch::new()
                .route("off.test", Reply::Fail)
                .route("/foods/search", Reply::Body(lentils)),
        );
        let record = resolver(fetch.clone(), true).resolve("04963406").await.unwrap();
        assert_eq!(record.name, "Lentils, raw");

        let usda_calls: Vec<String> =
            fetch.calls().into_iter().filter(|url| url.starts_with(USDA)).collect();
        assert_eq!(usda_calls.len(), 1);
        assert!(usda_calls[0].contains("/foods/search?query=04963406"));
    }

    #[tokio::test]
    async fn test_first_source_wins_without_merging() {
        let off = r#"{"products": [{"product_name": "Lentils",
            "nutriments": {"energy-kcal_serving": 80}}]}"#;
        let usda = r#"{"foods": [{"description": "x",
            "foodNutrients": [{"nutrientName": "Iron", "value": 6.5}]}]}"#;
        let fetch = Arc::new(
            FakeFetch::new()
                .route("search.pl", Reply::Body(off))
                .route("/foods/search", Reply::Body(usda)),
        );
        let record = resolver(fetch.clone(), true).resolve("lentils").await.unwrap();
        assert_eq!(record.calories_per_serving, 80.0);
        assert_eq!(record.iron_per_serving, 0.0);
        assert_eq!(fetch.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_all_sources_unavailable_is_not_found() {
        let fetch = Arc::new(FakeFetch::new());
        let err = resolver(fetch.clone(), true).resolve("0041196910452").await.unwrap_err();
        assert_eq!(err.identifier, "0041196910452");
        // barcode + search on OFF, search on USDA
        assert_eq!(fetch.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_blank_identifier_is_not_found() {
        let fetch = Arc::new(FakeFetch::new());
        assert!(resolver(fetch.clone(), false).resolve("   ").await.is_err());
        assert!(fetch.calls().is_empty());
    }
}
