//! HTTP transport for nutrition sources
//!
//! Sources fetch response bodies through the `HttpFetch` trait so that the
//! timeout/retry policy lives in one place and tests can supply canned bodies.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde_json::Value;
use thiserror::Error;

use crate::config::HttpPolicy;

/// Failure talking to an external nutrition source.
///
/// Always recovered inside the resolver (next step, next source, or not found).
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Response was not JSON: {snippet}")]
    NotJson { snippet: String },

    #[error("Unexpected payload: {0}")]
    UnexpectedShape(String),
}

/// Fetches a URL and returns the raw response body
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get_text(&self, url: &Url) -> Result<String, SourceError>;
}

/// Parse a response body, keeping a short snippet of non-JSON bodies for logs
pub fn parse_json(body: &str) -> Result<Value, SourceError> {
    serde_json::from_str(body).map_err(|_| SourceError::NotJson {
        snippet: body.chars().take(200).collect(),
    })
}

/// Production transport over `reqwest` with a bounded retry policy
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    policy: HttpPolicy,
}

impl ReqwestFetcher {
    /// Build a client with the policy's per-request timeout
    pub fn new(policy: HttpPolicy) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(policy.timeout)
            .user_agent(concat!("larder/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, policy))
    }

    /// Use an already configured client with the given retry policy
    pub fn with_client(client: reqwest::Client, policy: HttpPolicy) -> Self {
        Self { client, policy }
    }

    fn is_retryable_status(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get_text(&self, url: &Url) -> Result<String, SourceError> {
        let mut attempt: u32 = 0;
        loop {
            let failure = match self.client.get(url.clone()).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .text()
                            .await
                            .map_err(|e| SourceError::Transport(e.to_string()));
                    }
                    let err = SourceError::Status {
                        status: status.as_u16(),
                        url: url.path().to_string(),
                    };
                    if !Self::is_retryable_status(status) {
                        return Err(err);
                    }
                    err
                }
                Err(e) => SourceError::Transport(e.to_string()),
            };

            if attempt >= self.policy.max_retries {
                return Err(failure);
            }

            let backoff = self.policy.initial_backoff * 2u32.saturating_pow(attempt);
            attempt += 1;
            tracing::warn!(
                "{} - retry {}/{} after {:?}",
                failure,
                attempt,
                self.policy.max_retries,
                backoff
            );
            tokio::time::sleep(backoff).await;
        }
    }
}
