//! Run history as JSON lines, one [`RunReport`] per line.

use crate::pipeline::RunReport;
use jobfeed_common::Result;
use std::collections::VecDeque;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RunHistory {
    path: PathBuf,
}

impl RunHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn record(&self, report: &RunReport) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        serde_jsonlines::append_json_lines(&self.path, [report])?;
        debug!(run_id = %report.run_id, path = %self.path.display(), "Recorded run");
        Ok(())
    }

    /// The last `limit` reports, oldest first. Lines that do not parse,
    /// including ones cut short by an interrupted write, are skipped.
    pub fn recent(&self, limit: usize) -> Result<Vec<RunReport>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reports = VecDeque::with_capacity(limit);
        for (index, line) in serde_jsonlines::json_lines(&self.path)?.enumerate() {
            let report: RunReport = match line {
                Ok(report) => report,
                Err(e) if matches!(e.kind(), ErrorKind::InvalidData | ErrorKind::UnexpectedEof) => {
                    warn!(line = index + 1, error = %e, "Skipping unreadable history line");
                    continue;
                },
                Err(e) => return Err(e.into()),
            };

            if reports.len() == limit {
                reports.pop_front();
            }
            if limit > 0 {
                reports.push_back(report);
            }
        }

        Ok(reports.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::pipeline::{Operation, RunStatus, Stage, Trigger};
    use chrono::Utc;
    use std::io::Write;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn report(message: &str) -> RunReport {
        RunReport {
            run_id: Uuid::new_v4(),
            operation: Operation::Run,
            trigger: Trigger::Scheduled,
            status: RunStatus::Success,
            message: message.to_string(),
            added: Some(1),
            pages_fetched: 1,
            total_fetched: 1,
            duplicates: 0,
            failed_page: None,
            stage: Stage::Report,
            started_at: Utc::now(),
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn test_missing_history_is_empty() {
        let dir = TempDir::new().unwrap();
        let history = RunHistory::new(dir.path().join("fetch_history.jsonl"));
        assert!(history.recent(10).unwrap().is_empty());
    }

    #[test]
    fn test_recent_keeps_last_entries_in_order() {
        let dir = TempDir::new().unwrap();
        let history = RunHistory::new(dir.path().join("nested/fetch_history.jsonl"));

        for n in 1..=5 {
            history.record(&report(&format!("run {}", n))).unwrap();
        }

        let recent = history.recent(2).unwrap();
        let messages: Vec<_> = recent.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["run 4", "run 5"]);
        assert!(history.recent(0).unwrap().is_empty());
    }

    #[test]
    fn test_unreadable_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fetch_history.jsonl");
        let history = RunHistory::new(&path);

        history.record(&report("first")).unwrap();
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{ not json").unwrap();
        drop(file);
        history.record(&report("second")).unwrap();

        let recent = history.recent(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1].message, "second");
    }

    #[test]
    fn test_truncated_line_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fetch_history.jsonl");
        let history = RunHistory::new(&path);

        history.record(&report("before crash")).unwrap();
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{\"run_id\": ").unwrap();
        drop(file);

        let recent = history.recent(10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].message, "before crash");

        history.record(&report("after crash")).unwrap();
        let recent = history.recent(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1].message, "after crash");
    }
}
