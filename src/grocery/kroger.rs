//! Kroger product API client
//!
//! Client-credentials token plus a single-product search used to price meal
//! ingredients.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::{GroceryConfig, HttpPolicy};
use super::token::TokenCache;
use super::transport::{GroceryTransport, HttpReply, ReqwestTransport};
use super::{GroceryError, GroceryProduct, ProductSearch};

const TOKEN_SCOPE: &str = "product.compact";
const UNAUTHORIZED: u16 = 401;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    1800
}

#[derive(Debug, Deserialize)]
struct ProductsResponse {
    #[serde(default)]
    data: Vec<ProductData>,
}

#[derive(Debug, Deserialize)]
struct ProductData {
    description: Option<String>,
    #[serde(default)]
    items: Vec<ProductItem>,
}

#[derive(Debug, Deserialize)]
struct ProductItem {
    price: Option<ProductPrice>,
}

#[derive(Debug, Deserialize)]
struct ProductPrice {
    regular: Option<f64>,
}

impl From<ProductData> for GroceryProduct {
    fn from(data: ProductData) -> Self {
        let regular_price = data
            .items
            .into_iter()
            .next()
            .and_then(|item| item.price)
            .and_then(|price| price.regular);
        Self {
            description: data.description,
            regular_price,
        }
    }
}

/// Kroger API client
pub struct KrogerClient {
    http: Arc<dyn GroceryTransport>,
    config: GroceryConfig,
    tokens: Arc<TokenCache>,
}

impl KrogerClient {
    pub fn new(
        config: GroceryConfig,
        policy: &HttpPolicy,
        tokens: Arc<TokenCache>,
    ) -> Result<Self, GroceryError> {
        let client = Client::builder().timeout(policy.timeout).build()?;
        Ok(Self::with_transport(
            config,
            Arc::new(ReqwestTransport::new(client)),
            tokens,
        ))
    }

    pub fn with_transport(
        config: GroceryConfig,
        http: Arc<dyn GroceryTransport>,
        tokens: Arc<TokenCache>,
    ) -> Self {
        Self { http, config, tokens }
    }

    pub fn is_configured(&self) -> bool {
        self.config.has_credentials()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn request_token(&self) -> Result<(String, Duration), GroceryError> {
        let (Some(id), Some(secret)) = (&self.config.client_id, &self.config.client_secret) else {
            return Err(GroceryError::NotConfigured);
        };

        let reply = self
            .http
            .post_form(
                &self.url("/connect/oauth2/token"),
                id,
                secret,
                &[("grant_type", "client_credentials"), ("scope", TOKEN_SCOPE)],
            )
            .await?;
        if !reply.is_success() {
            return Err(GroceryError::Token(format!("token endpoint returned {}", reply.status)));
        }

        let token: TokenResponse =
            serde_json::from_str(&reply.body).map_err(|e| GroceryError::Token(e.to_string()))?;
        tracing::debug!("Obtained grocery token valid for {}s", token.expires_in);
        Ok((token.access_token, Duration::from_secs(token.expires_in)))
    }

    async fn token(&self) -> Result<String, GroceryError> {
        self.tokens.get_or_refresh(|| self.request_token()).await
    }

    async fn fetch_product(&self, term: &str, token: &str) -> Result<HttpReply, GroceryError> {
        self.http
            .get(
                &self.url("/products"),
                token,
                &[
                    ("filter.term", term),
                    ("filter.limit", "1"),
                    ("filter.locationId", self.config.location_id.as_str()),
                ],
            )
            .await
    }
}

#[async_trait]
impl ProductSearch for KrogerClient {
    async fn search_product(&self, term: &str) -> Result<Option<GroceryProduct>, GroceryError> {
        if !self.is_configured() {
            return Err(GroceryError::NotConfigured);
        }

        let token = self.token().await?;
        let mut reply = self.fetch_product(term, &token).await?;

        // Token revoked early: drop it and try once more with a fresh one
        if reply.status == UNAUTHORIZED {
            self.tokens.clear().await;
            let token = self.token().await?;
            reply = self.fetch_product(term, &token).await?;
        }

        if !reply.is_success() {
            return Err(GroceryError::Status {
                status: reply.status,
                term: term.to_string(),
            });
        }

        let body: ProductsResponse = serde_json::from_str(&reply.body)
            .map_err(|e| GroceryError::UnexpectedShape(e.to_string()))?;
        Ok(body.data.into_iter().next().map(GroceryProduct::from))
    }
}
