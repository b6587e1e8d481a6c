//! Persisted log of raw search responses
//!
//! Written by the append fetch mode, read back by the process step. The file
//! holds a JSON array of pages; a single page object is also accepted.

use crate::persist;
use jobfeed_common::{JobfeedError, RawPage, RawPayload, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RawPageLog {
    path: PathBuf,
}

impl RawPageLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pages currently in the log.
    ///
    /// Fails with [`JobfeedError::MissingRawLog`] when nothing has been
    /// fetched yet. An unreadable log counts as empty.
    pub fn read(&self) -> Result<Vec<RawPage>> {
        self.read_payload().map(RawPayload::into_pages)
    }

    /// The log as stored: a single page or a batch.
    pub fn read_payload(&self) -> Result<RawPayload> {
        match persist::read_json::<RawPayload>(&self.path) {
            Ok(Some(payload)) => Ok(payload),
            Ok(None) => Err(JobfeedError::MissingRawLog(self.path.clone())),
            Err(err) => {
                warn!(error = %err, "Raw payload log unreadable, treating as empty");
                Ok(RawPayload::Batch(Vec::new()))
            },
        }
    }

    /// Like [`RawPageLog::read`] but a missing log is simply empty.
    pub fn load(&self) -> Vec<RawPage> {
        self.read().unwrap_or_default()
    }

    pub fn save(&self, pages: &[RawPage]) -> Result<()> {
        persist::write_json(&self.path, pages)
    }

    /// Add one page at the end of the log and rewrite it. Returns the number
    /// of pages now stored.
    pub fn append(&self, page: RawPage) -> Result<usize> {
        let mut pages = self.load();
        pages.push(page);
        self.save(&pages)?;
        debug!(path = %self.path.display(), pages = pages.len(), "Appended page to raw log");
        Ok(pages.len())
    }
}
