//! HTTP client for the Rakuten Web Service REST endpoints

use super::transport::{QueryParams, Transport};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::resource::{self, Resource, ResourceType, SearchOptions, SearchResult};
use anyhow::Context;
use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Maximum length of response body to log
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Truncate a response body for logging
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|&i| body.is_char_boundary(i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

/// Fallback description for a failure status without an error body
fn status_hint(status: u16) -> &'static str {
    match status {
        400 => "wrong_parameter",
        401 | 403 => "access_denied",
        404 => "not_found",
        429 => "too_many_requests",
        503 => "service_unavailable",
        500..=599 => "system_error",
        _ => "request_failed",
    }
}

/// Build the API error from a failure status and its body
///
/// The API reports failures as `{"error": "...", "error_description": "..."}`.
fn api_error(status: u16, body: &str) -> Error {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let field = |key: &str| {
        parsed
            .as_ref()
            .and_then(|v| v.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    Error::Api {
        status,
        error: field("error").unwrap_or_else(|| status_hint(status).to_string()),
        description: field("error_description"),
    }
}

/// HTTP client for the Rakuten Web Service API
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl Client {
    /// Create a new client. The configuration must carry an application id.
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.application_id.is_empty() {
            return Err(Error::MissingApplicationId);
        }

        let http = reqwest::Client::builder()
            .user_agent(config.effective_user_agent())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Make a GET request to a resource endpoint
    pub async fn get(&self, endpoint: &str, query: &QueryParams) -> Result<Value> {
        tracing::debug!("GET {} {:?}", endpoint, query);

        let credentials = self.config.credential_params();
        let url = Url::parse_with_params(endpoint, credentials.iter().chain(query.iter()))
            .with_context(|| format!("Invalid endpoint URL: {}", endpoint))?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(api_error(status.as_u16(), &body));
        }

        let value: Value = serde_json::from_str(&body).context("Failed to parse response JSON")?;
        Ok(value)
    }

    /// Share this client as a search transport
    pub fn into_transport(self) -> Arc<dyn Transport> {
        Arc::new(self)
    }

    /// Lazy search against `resource_type`
    pub fn search(&self, resource_type: &Arc<ResourceType>, options: SearchOptions) -> SearchResult {
        resource::search(self.clone().into_transport(), Arc::clone(resource_type), options)
    }

    /// Every record across all result pages
    pub fn all(
        &self,
        resource_type: &Arc<ResourceType>,
        options: SearchOptions,
    ) -> impl Stream<Item = Result<Resource>> + Send + 'static {
        resource::all(self.clone().into_transport(), Arc::clone(resource_type), options)
    }
}

#[async_trait]
impl Transport for Client {
    async fn get(&self, endpoint: &str, query: &QueryParams) -> Result<Value> {
        Client::get(self, endpoint, query).await
    }
}
