//! Transport seam between the fetcher and the search API

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// One search call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub api_key: String,
    pub query: String,
    pub page: u32,
    /// Pages bundled into this request (`num_pages`)
    pub num_pages: u32,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    /// Upstream answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection, timeout or body decoding failure.
    #[error("{0}")]
    Network(String),
}

/// Executes search requests and returns the decoded JSON body.
#[async_trait]
pub trait SearchTransport: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Value, TransportFailure>;
}
