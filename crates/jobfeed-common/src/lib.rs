//! Jobfeed Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging, and error handling for the jobfeed workspace.
//!
//! # Overview
//!
//! - **Error Handling**: the [`JobfeedError`] taxonomy and [`Result`] alias
//! - **Logging**: `tracing` subscriber setup driven by [`logging::LogConfig`]
//! - **Types**: raw search payloads and the normalized job record
//!
//! # Example
//!
//! ```no_run
//! use jobfeed_common::types::{NormalizedJob, RawPage};
//!
//! let page = RawPage::new(serde_json::json!({ "data": [] }));
//! assert!(page.entries().is_ok());
//!
//! let job = NormalizedJob::new("abc").with_title("Backend Intern");
//! assert_eq!(job.id, "abc");
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{JobfeedError, Result};
pub use types::{NormalizedJob, RawPage, RawPayload};
