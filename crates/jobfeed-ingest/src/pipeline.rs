//! Pipeline orchestration
//!
//! Drives Fetch → Normalize → Merge → Persist → Report for the three
//! operations exposed to callers. Every operation returns a [`RunReport`];
//! errors are folded into the report and never propagate further.

use crate::config::IngestConfig;
use crate::fetcher::{FetchMode, Fetcher, SearchTransport};
use crate::history::RunHistory;
use crate::normalizer;
use crate::raw_log::RawPageLog;
use crate::store::JobStoreFile;
use chrono::{DateTime, Utc};
use jobfeed_common::{JobfeedError, RawPayload, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Fetch one page and append it to the raw log
    FetchPage,
    /// Normalize the raw log and merge it into the job store
    ProcessRawLog,
    /// Fetch every configured page and merge in one go
    Run,
}

/// What started the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    #[default]
    Manual,
    Scheduled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Fetch,
    Normalize,
    Merge,
    Persist,
    Report,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Fetch => "fetch",
            Stage::Normalize => "normalize",
            Stage::Merge => "merge",
            Stage::Persist => "persist",
            Stage::Report => "report",
        };
        f.write_str(name)
    }
}

/// Outcome of one pipeline operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub operation: Operation,
    pub trigger: Trigger,
    pub status: RunStatus,
    pub message: String,
    /// Records newly added to the job store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added: Option<usize>,
    pub pages_fetched: usize,
    /// Records produced by normalization
    pub total_fetched: usize,
    /// Normalized records that were already known
    pub duplicates: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_page: Option<u32>,
    /// Last stage reached; the failing stage for errors
    pub stage: Stage,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl RunReport {
    /// Error report for an operation that could not start, for example
    /// because its configuration was rejected.
    pub fn rejected(operation: Operation, trigger: Trigger, err: JobfeedError) -> Self {
        RunState::start(operation, trigger).into_report(Err(err))
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

/// Mutable bookkeeping for a run in progress.
struct RunState {
    run_id: Uuid,
    operation: Operation,
    trigger: Trigger,
    started_at: DateTime<Utc>,
    stage: Stage,
    pages_fetched: usize,
    total_fetched: usize,
    added: Option<usize>,
}

impl RunState {
    fn start(operation: Operation, trigger: Trigger) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            operation,
            trigger,
            started_at: Utc::now(),
            stage: Stage::Fetch,
            pages_fetched: 0,
            total_fetched: 0,
            added: None,
        }
    }

    fn enter(&mut self, stage: Stage) {
        info!(stage = %stage, "Entering stage");
        self.stage = stage;
    }

    fn into_report(self, outcome: Result<String>) -> RunReport {
        let duplicates = self
            .added
            .map(|added| self.total_fetched.saturating_sub(added))
            .unwrap_or(0);

        let (status, message, failed_page, stage) = match outcome {
            Ok(message) => (RunStatus::Success, message, None, Stage::Report),
            Err(err) => (RunStatus::Error, err.to_string(), err.failed_page(), self.stage),
        };

        RunReport {
            run_id: self.run_id,
            operation: self.operation,
            trigger: self.trigger,
            status,
            message,
            added: self.added,
            pages_fetched: self.pages_fetched,
            total_fetched: self.total_fetched,
            duplicates,
            failed_page,
            stage,
            started_at: self.started_at,
            completed_at: Utc::now(),
        }
    }
}

pub struct Pipeline<T> {
    fetcher: Fetcher<T>,
    pages: RangeInclusive<u32>,
    raw_log: RawPageLog,
    store: JobStoreFile,
    history: Option<RunHistory>,
    trigger: Trigger,
}

impl<T: SearchTransport> Pipeline<T> {
    /// Build a pipeline over the page range and data directory of `config`.
    pub fn new(fetcher: Fetcher<T>, config: &IngestConfig) -> Self {
        Self {
            fetcher,
            pages: config.pages(),
            raw_log: RawPageLog::new(config.raw_log_path()),
            store: JobStoreFile::new(config.jobs_path()),
            history: Some(RunHistory::new(config.history_path())),
            trigger: Trigger::Manual,
        }
    }

    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = trigger;
        self
    }

    /// Do not record reports in the run history.
    pub fn without_history(mut self) -> Self {
        self.history = None;
        self
    }

    pub fn raw_log(&self) -> &RawPageLog {
        &self.raw_log
    }

    /// Fetch `page` and append its payload to the raw log.
    pub async fn fetch_page(&self, page: u32) -> RunReport {
        let mut state = RunState::start(Operation::FetchPage, self.trigger);
        let span = info_span!("fetch_page", run_id = %state.run_id, page);

        let outcome = async {
            state.enter(Stage::Fetch);
            let mode = FetchMode::Append(self.raw_log.clone());
            let pages = self.fetcher.fetch(page..=page, &mode).await?;
            state.pages_fetched = pages.len();

            let stored = self.raw_log.load().len();
            Ok::<_, JobfeedError>(format!(
                "Fetched page {} and appended it to the raw log ({} pages stored)",
                page, stored
            ))
        }
        .instrument(span.clone())
        .await;

        self.finish(state, outcome, span)
    }

    /// Normalize every page in the raw log and merge the records into the
    /// job store.
    pub fn process_raw_log(&self) -> RunReport {
        let mut state = RunState::start(Operation::ProcessRawLog, self.trigger);
        let span = info_span!("process_raw_log", run_id = %state.run_id);

        let outcome = span.in_scope(|| {
            state.enter(Stage::Fetch);
            let payload = self.raw_log.read_payload()?;
            state.pages_fetched = payload.pages().len();
            self.ingest(&mut state, &payload)
        });

        self.finish(state, outcome, span)
    }

    /// Fetch the configured page range, then normalize, merge and persist.
    /// Nothing is stored if any page fails.
    pub async fn run(&self) -> RunReport {
        let mut state = RunState::start(Operation::Run, self.trigger);
        let span = info_span!(
            "run",
            run_id = %state.run_id,
            first_page = *self.pages.start(),
            last_page = *self.pages.end()
        );

        let outcome = async {
            state.enter(Stage::Fetch);
            let pages = self
                .fetcher
                .fetch(self.pages.clone(), &FetchMode::Batch)
                .await?;
            state.pages_fetched = pages.len();
            self.ingest(&mut state, &RawPayload::from(pages))
        }
        .instrument(span.clone())
        .await;

        self.finish(state, outcome, span)
    }

    /// Normalize → Merge → Persist over already fetched pages.
    fn ingest(&self, state: &mut RunState, payload: &RawPayload) -> Result<String> {
        state.enter(Stage::Normalize);
        let jobs = normalizer::normalize(payload);
        state.total_fetched = jobs.len();

        state.enter(Stage::Merge);
        let mut txn = self.store.begin();
        let added = txn.merge(jobs);
        state.added = Some(added);

        state.enter(Stage::Persist);
        let update = txn.commit()?;

        Ok(format!(
            "Added {} new jobs from {} pages ({} already known, {} stored)",
            update.added,
            payload.pages().len(),
            state.total_fetched.saturating_sub(update.added),
            update.total
        ))
    }

    fn finish(
        &self,
        mut state: RunState,
        outcome: Result<String>,
        span: tracing::Span,
    ) -> RunReport {
        let _entered = span.enter();

        if outcome.is_ok() {
            state.enter(Stage::Report);
        }
        let report = state.into_report(outcome);

        if report.is_success() {
            info!(
                added = ?report.added,
                pages = report.pages_fetched,
                "{}",
                report.message
            );
        } else {
            error!(
                stage = %report.stage,
                failed_page = ?report.failed_page,
                "{}",
                report.message
            );
        }

        if let Some(history) = &self.history {
            if let Err(err) = history.record(&report) {
                warn!(error = %err, "Failed to record run history");
            }
        }

        report
    }
}
