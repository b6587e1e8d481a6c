//! Jobfeed Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Fetches job search results from the JSearch API, normalizes them into
//! [`jobfeed_common::NormalizedJob`] records and merges them into a
//! deduplicated job store on disk.
//!
//! # Modules
//!
//! - [`config`]: environment driven settings
//! - [`fetcher`]: paginated, rate limited fetching behind a transport trait
//! - [`raw_log`]: the persisted log of raw search responses
//! - [`normalizer`]: raw entries to normalized records
//! - [`store`]: first-seen-wins merge and the job store file
//! - [`pipeline`]: the `fetch_page`, `process_raw_log` and `run` operations
//! - [`history`]: JSON-lines record of past runs
//!
//! # Example
//!
//! ```no_run
//! use jobfeed_ingest::{config::IngestConfig, fetcher::{Fetcher, JSearchClient}, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::from_env()?;
//!     let client = JSearchClient::from_config(&config)?;
//!     let pipeline = Pipeline::new(Fetcher::new(client, config.fetch_settings()), &config);
//!
//!     let report = pipeline.run().await;
//!     println!("{}", report.message);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod fetcher;
pub mod history;
pub mod normalizer;
pub mod persist;
pub mod pipeline;
pub mod raw_log;
pub mod store;

pub use config::IngestConfig;
pub use history::RunHistory;
pub use pipeline::{Operation, Pipeline, RunReport, RunStatus, Stage, Trigger};
