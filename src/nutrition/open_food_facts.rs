//! Open Food Facts source
//!
//! Barcode lookups go to `/api/v0/product/{code}.json`, name lookups to the
//! `/cgi/search.pl` text search. Only per-serving nutriments are used.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;

use super::normalize::{display_name, normalize, numeric, NutrientEntry};
use super::resolver::NutritionSource;
use super::transport::{parse_json, HttpFetch, SourceError};
use crate::models::NutrientRecord;

const SERVING_SUFFIX: &str = "_serving";

/// Energy keys Open Food Facts reports in kJ whatever their name says
const KILOJOULE_LABELS: &[&str] = &["energy", "energy-kj"];

pub struct OpenFoodFacts {
    base_url: String,
    http: Arc<dyn HttpFetch>,
}

impl OpenFoodFacts {
    pub fn new(base_url: impl Into<String>, http: Arc<dyn HttpFetch>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    fn url(&self, path: &str) -> Result<Url, SourceError> {
        Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| SourceError::Transport(format!("invalid URL: {}", e)))
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
}

/// Convert a product object into a record, or `None` without nutriments
fn product_to_record(product: &Value, identifier: &str) -> Option<NutrientRecord> {
    let nutriments = product.get("nutriments")?.as_object()?;

    let entries: Vec<NutrientEntry> = nutriments
        .iter()
        .filter_map(|(key, value)| {
            let label = key.strip_suffix(SERVING_SUFFIX)?;
            if KILOJOULE_LABELS.contains(&label) {
                return None;
            }
            Some(NutrientEntry::new(label, numeric(value).unwrap_or(0.0)))
        })
        .collect();

    let name = display_name(
        product.get("product_name").and_then(Value::as_str),
        identifier,
    );
    Some(normalize(name, &entries))
}

#[async_trait]
impl NutritionSource for OpenFoodFacts {
    fn name(&self) -> &'static str {
        "Open Food Facts"
    }

    async fn lookup_barcode(&self, code: &str) -> Result<Option<NutrientRecord>, SourceError> {
        let url = self.url(&format!("/api/v0/product/{}.json", code))?;
        let data = self.fetch(&url).await?;

        let record = data
            .get("product")
            .filter(|p| p.is_object())
            .and_then(|p| product_to_record(p, code));
        if record.is_none() {
            tracing::warn!("No product found for barcode: {}", code);
        }
        Ok(record)
    }

    async fn search_name(&self, query: &str) -> Result<Option<NutrientRecord>, SourceError> {
        let mut url = self.url("/cgi/search.pl")?;
        url.query_pairs_mut()
            .append_pair("search_terms", query)
            .append_pair("search_simple", "1")
            .append_pair("action", "process")
            .append_pair("json", "1");
        let data = self.fetch(&url).await?;

        let record = data
            .get("products")
            .and_then(Value::as_array)
            .and_then(|products| products.first())
            .and_then(|p| product_to_record(p, query));
        if record.is_none() {
            tracing::warn!("No product found for name: \"{}\"", query);
        }
        Ok(record)
    }
}
