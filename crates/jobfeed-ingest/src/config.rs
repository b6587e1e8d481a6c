//! Ingestion configuration
//!
//! Settings for the JSearch fetcher and the on-disk state, loaded from
//! environment variables.

use crate::fetcher::FetchSettings;
use jobfeed_common::{JobfeedError, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default JSearch endpoint on RapidAPI.
pub const DEFAULT_BASE_URL: &str = "https://jsearch.p.rapidapi.com";

/// Value of the `x-rapidapi-host` header.
pub const DEFAULT_API_HOST: &str = "jsearch.p.rapidapi.com";

pub const DEFAULT_QUERY: &str = "internship in india";

/// Main ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// RapidAPI key. Absence is reported by the fetcher, not by `validate`.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub api_host: String,
    /// Free-text search query
    pub query: String,
    /// First page to request (1-based)
    pub start_page: u32,
    /// Number of pages fetched by a full run
    pub page_count: u32,
    /// `num_pages` sent with each request
    pub pages_per_request: u32,
    /// Pause between consecutive page requests
    pub page_delay_ms: u64,
    /// HTTP timeout per request
    pub timeout_secs: u64,
    /// Directory holding the raw log, the job store and the run history
    pub data_dir: PathBuf,
}

impl IngestConfig {
    /// Load ingestion configuration from environment variables
    ///
    /// - `JSEARCH_API_KEY` (falls back to `RAPIDAPI_KEY`)
    /// - `JSEARCH_BASE_URL`, `JSEARCH_API_HOST`, `JSEARCH_QUERY`
    /// - `JSEARCH_START_PAGE`, `JSEARCH_PAGE_COUNT`, `JSEARCH_NUM_PAGES`
    /// - `JSEARCH_PAGE_DELAY_MS`, `JSEARCH_TIMEOUT_SECS`
    /// - `JOBFEED_DATA_DIR`
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|_| {})
    }

    /// Load from the environment, apply `overrides`, then validate.
    pub fn from_env_with(overrides: impl FnOnce(&mut Self)) -> Result<Self> {
        Self::from_lookup_with(|key| std::env::var(key).ok(), overrides)
    }

    /// Same as [`IngestConfig::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup_with(lookup, |_| {})
    }

    pub fn from_lookup_with<F>(lookup: F, overrides: impl FnOnce(&mut Self)) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parsed = |key: &str, default| parse_or(lookup(key), default);

        let mut config = Self {
            api_key: lookup("JSEARCH_API_KEY")
                .or_else(|| lookup("RAPIDAPI_KEY"))
                .filter(|key| !key.trim().is_empty()),
            base_url: lookup("JSEARCH_BASE_URL").unwrap_or(defaults.base_url),
            api_host: lookup("JSEARCH_API_HOST").unwrap_or(defaults.api_host),
            query: lookup("JSEARCH_QUERY").unwrap_or(defaults.query),
            start_page: parsed("JSEARCH_START_PAGE", defaults.start_page),
            page_count: parsed("JSEARCH_PAGE_COUNT", defaults.page_count),
            pages_per_request: parsed("JSEARCH_NUM_PAGES", defaults.pages_per_request),
            page_delay_ms: parse_or(lookup("JSEARCH_PAGE_DELAY_MS"), defaults.page_delay_ms),
            timeout_secs: parse_or(lookup("JSEARCH_TIMEOUT_SECS"), defaults.timeout_secs),
            data_dir: lookup("JOBFEED_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
        };

        overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(JobfeedError::config("JSEARCH_QUERY cannot be empty"));
        }
        if self.base_url.trim().is_empty() {
            return Err(JobfeedError::config("JSEARCH_BASE_URL cannot be empty"));
        }
        if self.start_page == 0 {
            return Err(JobfeedError::config("JSEARCH_START_PAGE must be at least 1"));
        }
        if self.page_count == 0 {
            return Err(JobfeedError::config("JSEARCH_PAGE_COUNT must be greater than 0"));
        }
        if self.pages_per_request == 0 {
            return Err(JobfeedError::config("JSEARCH_NUM_PAGES must be greater than 0"));
        }
        if self.timeout_secs == 0 {
            return Err(JobfeedError::config("JSEARCH_TIMEOUT_SECS must be greater than 0"));
        }
        Ok(())
    }

    /// Page numbers requested by a full run.
    pub fn pages(&self) -> RangeInclusive<u32> {
        let last = self
            .start_page
            .saturating_add(self.page_count.saturating_sub(1));
        self.start_page..=last
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn raw_log_path(&self) -> PathBuf {
        self.data_dir.join("raw_pages.json")
    }

    pub fn jobs_path(&self) -> PathBuf {
        self.data_dir.join("jobs.json")
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("fetch_history.jsonl")
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            api_key: self.api_key.clone(),
            query: self.query.clone(),
            pages_per_request: self.pages_per_request,
            page_delay: self.page_delay(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_host: DEFAULT_API_HOST.to_string(),
            query: DEFAULT_QUERY.to_string(),
            start_page: 1,
            page_count: 10,
            pages_per_request: 1,
            page_delay_ms: 1000,
            timeout_secs: 30,
            data_dir: PathBuf::from("./data"),
        }
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
