//! Deduplicated job collection
//!
//! [`JobStore`] holds normalized jobs in insertion order with unique ids.
//! Merging is append-only and first-seen wins: a record whose id is already
//! present is dropped, never used to update the stored one.
//!
//! [`JobStoreFile`] is the on-disk form. Updates go through a
//! [`StoreTransaction`] that loads, merges and rewrites the whole file.

use crate::persist;
use jobfeed_common::{NormalizedJob, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of [`merge`].
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub jobs: Vec<NormalizedJob>,
    pub added: usize,
}

/// Merge `incoming` into `existing`.
///
/// Existing records keep their order; new records are appended in encounter
/// order, skipping ids seen earlier in either sequence.
pub fn merge(
    existing: Vec<NormalizedJob>,
    incoming: impl IntoIterator<Item = NormalizedJob>,
) -> MergeOutcome {
    let mut store = JobStore::from_jobs(existing);
    let added = store.merge(incoming);
    MergeOutcome {
        jobs: store.into_jobs(),
        added,
    }
}

#[derive(Debug, Clone, Default)]
pub struct JobStore {
    jobs: Vec<NormalizedJob>,
    ids: HashSet<String>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a persisted sequence. Repeated ids keep their first
    /// occurrence.
    pub fn from_jobs(jobs: Vec<NormalizedJob>) -> Self {
        let loaded = jobs.len();
        let mut store = Self::new();
        store.merge(jobs);

        if store.len() < loaded {
            warn!(
                dropped = loaded - store.len(),
                "Persisted jobs contained repeated ids"
            );
        }
        store
    }

    /// Append every record whose id is not yet present. Returns the number
    /// of records added.
    pub fn merge(&mut self, incoming: impl IntoIterator<Item = NormalizedJob>) -> usize {
        let before = self.jobs.len();
        for job in incoming {
            if self.ids.contains(&job.id) {
                continue;
            }
            self.ids.insert(job.id.clone());
            self.jobs.push(job);
        }
        self.jobs.len() - before
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn get(&self, id: &str) -> Option<&NormalizedJob> {
        if !self.contains(id) {
            return None;
        }
        self.jobs.iter().find(|job| job.id == id)
    }

    pub fn jobs(&self) -> &[NormalizedJob] {
        &self.jobs
    }

    pub fn into_jobs(self) -> Vec<NormalizedJob> {
        self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Persisted job collection (a JSON array of [`NormalizedJob`]).
#[derive(Debug, Clone)]
pub struct JobStoreFile {
    path: PathBuf,
}

/// Counts produced by a committed [`StoreTransaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreUpdate {
    pub added: usize,
    pub total: usize,
}

impl JobStoreFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the collection. Missing or unreadable state yields an empty store.
    pub fn load(&self) -> JobStore {
        match persist::read_json::<Vec<NormalizedJob>>(&self.path) {
            Ok(Some(jobs)) => {
                debug!(path = %self.path.display(), jobs = jobs.len(), "Loaded job store");
                JobStore::from_jobs(jobs)
            },
            Ok(None) => {
                info!(path = %self.path.display(), "No job store yet, starting empty");
                JobStore::new()
            },
            Err(err) => {
                warn!(error = %err, "Job store unreadable, starting empty");
                JobStore::new()
            },
        }
    }

    pub fn save(&self, store: &JobStore) -> Result<()> {
        persist::write_json(&self.path, store.jobs())?;
        debug!(path = %self.path.display(), jobs = store.len(), "Saved job store");
        Ok(())
    }

    /// Start a load-merge-save cycle.
    pub fn begin(&self) -> StoreTransaction<'_> {
        StoreTransaction {
            file: self,
            store: self.load(),
            added: 0,
        }
    }

    /// Merge `incoming` into the persisted collection in one step.
    pub fn merge_and_save(
        &self,
        incoming: impl IntoIterator<Item = NormalizedJob>,
    ) -> Result<StoreUpdate> {
        let mut txn = self.begin();
        txn.merge(incoming);
        txn.commit()
    }
}

/// In-memory working copy of a [`JobStoreFile`]. Nothing is written until
/// [`StoreTransaction::commit`]; dropping it discards the merge.
#[must_use = "a transaction does nothing unless committed"]
pub struct StoreTransaction<'a> {
    file: &'a JobStoreFile,
    store: JobStore,
    added: usize,
}

impl StoreTransaction<'_> {
    pub fn merge(&mut self, incoming: impl IntoIterator<Item = NormalizedJob>) -> usize {
        let added = self.store.merge(incoming);
        self.added += added;
        added
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Rewrite the persisted collection with the merged state.
    pub fn commit(self) -> Result<StoreUpdate> {
        self.file.save(&self.store)?;
        Ok(StoreUpdate {
            added: self.added,
            total: self.store.len(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn job(id: &str, title: &str) -> NormalizedJob {
        NormalizedJob::new(id).with_title(title)
    }

    fn ids(jobs: &[NormalizedJob]) -> Vec<&str> {
        jobs.iter().map(|j| j.id.as_str()).collect()
    }

    #[test]
    fn test_merge_keeps_first_seen_record() {
        let existing = vec![job("1", "X")];
        let incoming = vec![job("1", "Y"), job("2", "Z")];

        let outcome = merge(existing, incoming);

        assert_eq!(outcome.jobs, vec![job("1", "X"), job("2", "Z")]);
        assert_eq!(outcome.added, 1);
    }

    #[test]
    fn test_merge_dedupes_within_incoming() {
        let outcome = merge(
            Vec::new(),
            vec![job("a", "first"), job("b", "b"), job("a", "second")],
        );

        assert_eq!(ids(&outcome.jobs), vec!["a", "b"]);
        assert_eq!(outcome.jobs[0].title.as_deref(), Some("first"));
        assert_eq!(outcome.added, 2);
    }

    #[test]
    fn test_merge_into_empty_and_from_empty() {
        let outcome = merge(vec![job("1", "X")], Vec::new());
        assert_eq!(outcome.added, 0);
        assert_eq!(outcome.jobs.len(), 1);

        let outcome = merge(Vec::new(), Vec::new());
        assert!(outcome.jobs.is_empty());
    }

    #[test]
    fn test_store_lookup() {
        let mut store = JobStore::new();
        store.merge(vec![job("1", "X"), job("2", "Y")]);

        assert!(store.contains("2"));
        assert_eq!(store.get("1").unwrap().title.as_deref(), Some("X"));
        assert!(store.get("3").is_none());
    }

    #[test]
    fn test_from_jobs_collapses_repeated_ids() {
        let store = JobStore::from_jobs(vec![job("1", "X"), job("1", "Y"), job("2", "Z")]);
        assert_eq!(ids(store.jobs()), vec!["1", "2"]);
        assert_eq!(store.get("1").unwrap().title.as_deref(), Some("X"));
    }

    #[test]
    fn test_file_transaction_round_trip() {
        let dir = TempDir::new().unwrap();
        let file = JobStoreFile::new(dir.path().join("jobs.json"));

        let first = file.merge_and_save(vec![job("1", "X")]).unwrap();
        assert_eq!(first, StoreUpdate { added: 1, total: 1 });

        let second = file
            .merge_and_save(vec![job("1", "Y"), job("2", "Z")])
            .unwrap();
        assert_eq!(second, StoreUpdate { added: 1, total: 2 });

        let stored = file.load();
        assert_eq!(stored.jobs(), &[job("1", "X"), job("2", "Z")]);
    }

    #[test]
    fn test_uncommitted_transaction_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let file = JobStoreFile::new(dir.path().join("jobs.json"));

        let mut txn = file.begin();
        assert_eq!(txn.merge(vec![job("1", "X")]), 1);
        assert_eq!(txn.store().len(), 1);
        drop(txn);

        assert!(!file.path().exists());
    }

    #[test]
    fn test_corrupt_file_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobs.json");
        std::fs::write(&path, "[{\"id\": ").unwrap();

        let file = JobStoreFile::new(&path);
        assert!(file.load().is_empty());

        let update = file.merge_and_save(vec![job("9", "fresh")]).unwrap();
        assert_eq!(update.total, 1);
        assert_eq!(ids(file.load().jobs()), vec!["9"]);
    }

    fn arb_jobs() -> impl Strategy<Value = Vec<NormalizedJob>> {
        proptest::collection::vec(("[a-e]", "[a-z]{0,4}"), 0..20).prop_map(|pairs| {
            pairs
                .into_iter()
                .map(|(id, title)| job(&id, &title))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_merge_is_idempotent(existing in arb_jobs(), incoming in arb_jobs()) {
            let once = merge(existing, incoming.clone());
            let twice = merge(once.jobs.clone(), incoming);
            prop_assert_eq!(twice.added, 0);
            prop_assert_eq!(twice.jobs, once.jobs);
        }

        #[test]
        fn prop_ids_stay_unique(existing in arb_jobs(), incoming in arb_jobs()) {
            let outcome = merge(existing, incoming);
            let unique: HashSet<&str> = outcome.jobs.iter().map(|j| j.id.as_str()).collect();
            prop_assert_eq!(unique.len(), outcome.jobs.len());
        }

        #[test]
        fn prop_existing_order_is_a_prefix(existing in arb_jobs(), incoming in arb_jobs()) {
            let base = JobStore::from_jobs(existing).into_jobs();
            let outcome = merge(base.clone(), incoming.clone());

            prop_assert_eq!(&outcome.jobs[..base.len()], &base[..]);
            prop_assert_eq!(outcome.jobs.len(), base.len() + outcome.added);

            // New records appear in the order they were first encountered
            let mut seen: HashSet<String> = base.iter().map(|j| j.id.clone()).collect();
            let expected: Vec<NormalizedJob> = incoming
                .into_iter()
                .filter(|j| seen.insert(j.id.clone()))
                .collect();
            prop_assert_eq!(&outcome.jobs[base.len()..], &expected[..]);
        }
    }
}
