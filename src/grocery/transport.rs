//! HTTP transport for the grocery client
//!
//! The client speaks to the retailer through `GroceryTransport` so token and
//! search handling can be exercised with scripted replies.

use async_trait::async_trait;
use reqwest::Client;

use super::GroceryError;

/// Status and body of one response
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The two calls the retailer API needs
#[async_trait]
pub trait GroceryTransport: Send + Sync {
    /// Form POST with basic auth (token endpoint)
    async fn post_form(
        &self,
        url: &str,
        client_id: &str,
        client_secret: &str,
        form: &[(&str, &str)],
    ) -> Result<HttpReply, GroceryError>;

    /// GET with a bearer token
    async fn get(
        &self,
        url: &str,
        token: &str,
        query: &[(&str, &str)],
    ) -> Result<HttpReply, GroceryError>;
}

/// Production transport over `reqwest`
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

async fn into_reply(response: reqwest::Response) -> Result<HttpReply, GroceryError> {
    let status = response.status().as_u16();
    let body = response.text().await?;
    Ok(HttpReply { status, body })
}

#[async_trait]
impl GroceryTransport for ReqwestTransport {
    async fn post_form(
        &self,
        url: &str,
        client_id: &str,
        client_secret: &str,
        form: &[(&str, &str)],
    ) -> Result<HttpReply, GroceryError> {
        let response = self
            .client
            .post(url)
            .basic_auth(client_id, Some(client_secret))
            .form(form)
            .send()
            .await?;
        into_reply(response).await
    }

    async fn get(
        &self,
        url: &str,
        token: &str,
        query: &[(&str, &str)],
    ) -> Result<HttpReply, GroceryError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;
        into_reply(response).await
    }
}
