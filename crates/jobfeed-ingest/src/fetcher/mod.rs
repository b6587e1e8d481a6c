//! Paginated fetching from the job search API
//!
//! Pages are requested one at a time, in order, with a fixed pause between
//! consecutive requests. The first failing page aborts the whole fetch.
//!
//! Two modes share the same page loop:
//! - [`FetchMode::Batch`] returns the pages and persists nothing.
//! - [`FetchMode::Append`] also appends every page to a [`RawPageLog`] as soon
//!   as it arrives, so pages before a failure are already stored.

pub mod jsearch;
pub mod transport;

pub use jsearch::JSearchClient;
pub use transport::{SearchRequest, SearchTransport, TransportFailure};

use crate::raw_log::RawPageLog;
use indicatif::ProgressBar;
use jobfeed_common::{JobfeedError, RawPage, Result};
use std::ops::RangeInclusive;
use std::time::Duration;
use tracing::{info, warn};

/// Request parameters fixed for the lifetime of a [`Fetcher`].
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub api_key: Option<String>,
    pub query: String,
    pub pages_per_request: u32,
    /// Pause between two consecutive requests
    pub page_delay: Duration,
}

#[derive(Debug, Clone)]
pub enum FetchMode {
    Batch,
    Append(RawPageLog),
}

pub struct Fetcher<T> {
    transport: T,
    settings: FetchSettings,
    progress: ProgressBar,
}

impl<T: SearchTransport> Fetcher<T> {
    pub fn new(transport: T, settings: FetchSettings) -> Self {
        Self {
            transport,
            settings,
            progress: ProgressBar::hidden(),
        }
    }

    /// Report page progress on `progress` instead of a hidden bar.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch every page of `pages` in order.
    ///
    /// Fails with [`JobfeedError::Configuration`] before any request when no
    /// API key is set, with [`JobfeedError::Authentication`] on 401/403, and
    /// with [`JobfeedError::Transport`] on any other failure. No pages are
    /// returned on failure.
    pub async fn fetch(
        &self,
        pages: RangeInclusive<u32>,
        mode: &FetchMode,
    ) -> Result<Vec<RawPage>> {
        let api_key = self.api_key()?;

        self.progress.set_length(pages.clone().count() as u64);
        self.progress.set_position(0);

        match self.fetch_all(api_key, pages, mode).await {
            Ok(fetched) => {
                self.progress.finish_and_clear();
                Ok(fetched)
            },
            Err(err) => {
                self.progress.abandon();
                Err(err)
            },
        }
    }

    async fn fetch_all(
        &self,
        api_key: &str,
        pages: RangeInclusive<u32>,
        mode: &FetchMode,
    ) -> Result<Vec<RawPage>> {
        let first = *pages.start();
        let mut fetched = Vec::new();

        for page in pages {
            if page != first && !self.settings.page_delay.is_zero() {
                tokio::time::sleep(self.settings.page_delay).await;
            }

            let raw = self.fetch_page(api_key, page).await?;

            if let FetchMode::Append(log) = mode {
                let stored = log.append(raw.clone())?;
                info!(page, stored, "Appended page to raw log");
            }

            fetched.push(raw);
            self.progress.inc(1);
        }

        Ok(fetched)
    }

    async fn fetch_page(&self, api_key: &str, page: u32) -> Result<RawPage> {
        let request = SearchRequest {
            api_key: api_key.to_string(),
            query: self.settings.query.clone(),
            page,
            num_pages: self.settings.pages_per_request,
        };

        match self.transport.search(&request).await {
            Ok(body) => {
                let raw = RawPage::new(body);
                let entries = raw.entries().map(|e| e.len()).unwrap_or(0);
                info!(page, entries, "Fetched page");
                Ok(raw)
            },
            Err(TransportFailure::Status { status, .. }) if matches!(status, 401 | 403) => {
                warn!(page, status, "Search API rejected the API key");
                Err(JobfeedError::Authentication { page, status })
            },
            Err(failure) => {
                warn!(page, error = %failure, "Page request failed");
                Err(JobfeedError::transport(page, failure.to_string()))
            },
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.settings
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| JobfeedError::config("JSEARCH_API_KEY (or RAPIDAPI_KEY) is not set"))
    }
}
