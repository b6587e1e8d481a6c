//! HTTP client for the JSearch API on RapidAPI

use super::transport::{SearchRequest, SearchTransport, TransportFailure};
use crate::config::IngestConfig;
use async_trait::async_trait;
use jobfeed_common::{JobfeedError, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Error bodies are cut to this many characters in failure messages.
const MAX_ERROR_BODY_CHARS: usize = 300;

pub struct JSearchClient {
    client: Client,
    base_url: String,
    api_host: String,
}

impl JSearchClient {
    pub fn new(
        base_url: impl Into<String>,
        api_host: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| JobfeedError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_host: api_host.into(),
        })
    }

    pub fn from_config(config: &IngestConfig) -> Result<Self> {
        Self::new(config.base_url.clone(), config.api_host.clone(), config.timeout())
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SearchTransport for JSearchClient {
    async fn search(
        &self,
        request: &SearchRequest,
    ) -> std::result::Result<Value, TransportFailure> {
        let page = request.page.to_string();
        let num_pages = request.num_pages.to_string();

        debug!(page = request.page, query = %request.query, "Requesting search page");

        let response = self
            .client
            .get(self.search_url())
            .header("x-rapidapi-key", &request.api_key)
            .header("x-rapidapi-host", &self.api_host)
            .query(&[
                ("query", request.query.as_str()),
                ("page", page.as_str()),
                ("num_pages", num_pages.as_str()),
            ])
            .send()
            .await
            .map_err(|e| TransportFailure::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportFailure::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| TransportFailure::Network(format!("invalid JSON body: {}", e)))
    }
}
