//! Grocery retailer integration
//!
//! Product search used to price meal ingredients.

mod kroger;
mod token;
mod transport;

pub use kroger::KrogerClient;
pub use token::{TokenCache, DEFAULT_EXPIRY_SKEW};
pub use transport::{GroceryTransport, HttpReply, ReqwestTransport};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Description used when a search finds nothing
pub const NOT_FOUND_DESCRIPTION: &str = "Not found";

/// Grocery client error types
#[derive(Debug, Error)]
pub enum GroceryError {
    #[error("Grocery credentials are not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Token request failed: {0}")]
    Token(String),

    #[error("Product search for \"{term}\" returned status {status}")]
    Status { status: u16, term: String },

    #[error("Unexpected response: {0}")]
    UnexpectedShape(String),
}

/// First product a search returned
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroceryProduct {
    pub description: Option<String>,
    pub regular_price: Option<f64>,
}

impl GroceryProduct {
    pub fn description_or_not_found(&self) -> String {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(NOT_FOUND_DESCRIPTION)
            .to_string()
    }

    pub fn price_or_zero(&self) -> f64 {
        self.regular_price.filter(|p| p.is_finite()).unwrap_or(0.0)
    }
}

/// Retailer product search
#[async_trait]
pub trait ProductSearch: Send + Sync {
    async fn search_product(&self, term: &str) -> Result<Option<GroceryProduct>, GroceryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallbacks() {
        let blank = GroceryProduct {
            description: Some("  ".to_string()),
            regular_price: Some(f64::NAN),
        };
        assert_eq!(blank.description_or_not_found(), "Not found");
        assert_eq!(blank.price_or_zero(), 0.0);

        let found = GroceryProduct {
            description: Some("Ranch Dressing".to_string()),
            regular_price: Some(2.99),
        };
        assert_eq!(found.description_or_not_found(), "Ranch Dressing");
        assert_eq!(found.price_or_zero(), 2.99);
    }
}
