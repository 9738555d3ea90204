//! Run and evaluation events routed into the JSONL log.

#![allow(missing_docs)]

use std::path::Path;
use std::time::Duration;

use crate::core::errors::PwfError;
use crate::generator::category::TestCategory;
use crate::harness::plan::RunPlan;
use crate::harness::progress::{CategoryStats, Checkpoint, ProgressObserver, RunSummary};
use crate::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, LogTarget, Severity};
use crate::results::evaluator::EvaluationReport;
use crate::results::record::TestResult;

/// Structured event log for one process.
pub struct EventLog {
    writer: JsonlWriter,
    config_hash: Option<String>,
    results_file: Option<String>,
}

impl EventLog {
    /// Open the log at `path` with the default rotation policy.
    pub fn open(path: &Path) -> Self {
        Self::with_config(JsonlConfig::for_path(path))
    }

    pub fn with_config(config: JsonlConfig) -> Self {
        Self {
            writer: JsonlWriter::open(config),
            config_hash: None,
            results_file: None,
        }
    }

    /// Stamp the effective config hash and result file onto run events.
    #[must_use]
    pub fn with_context(mut self, config_hash: Option<String>, results_file: &Path) -> Self {
        self.config_hash = config_hash;
        self.results_file = Some(results_file.display().to_string());
        self
    }

    /// Where entries are currently going.
    pub fn state(&self) -> LogTarget {
        self.writer.state()
    }

    pub fn eval_complete(&mut self, report: &EvaluationReport) {
        let mut entry = LogEntry::new(
            EventType::EvalComplete,
            if report.is_success() {
                Severity::Info
            } else {
                Severity::Warning
            },
        );
        entry.total = Some(report.total);
        entry.mismatches = Some(report.mismatches);
        entry.ok = Some(report.is_success());
        entry.duration_ms = Some(millis(report.elapsed));
        entry.results_file = Some(report.source.display().to_string());
        entry.sha256 = Some(report.sha256.clone());
        self.writer.write_entry(&entry);
        self.writer.flush();
    }

    pub fn error(&mut self, error: &PwfError) {
        let entry = LogEntry::new(EventType::Error, Severity::Critical).with_error(error);
        self.writer.write_entry(&entry);
        self.writer.flush();
    }
}

impl ProgressObserver for EventLog {
    fn on_start(&mut self, plan: &RunPlan) {
        let mut entry = LogEntry::new(EventType::RunStart, Severity::Info);
        entry.total = Some(plan.total_cases());
        entry.seed = plan.seed();
        entry.config_hash.clone_from(&self.config_hash);
        entry.results_file.clone_from(&self.results_file);
        entry.details = Some(
            plan.categories()
                .iter()
                .map(|c| c.id())
                .collect::<Vec<_>>()
                .join(","),
        );
        self.writer.write_entry(&entry);
    }

    fn on_checkpoint(&mut self, checkpoint: &Checkpoint) {
        let mut entry = LogEntry::new(EventType::Checkpoint, Severity::Info);
        entry.processed = Some(checkpoint.processed);
        entry.total = Some(checkpoint.total);
        entry.duration_ms = Some(millis(checkpoint.elapsed));
        self.writer.write_entry(&entry);
        self.writer.flush();
        self.writer.try_recover();
    }

    fn on_mismatch(&mut self, category: TestCategory, result: &TestResult) {
        let mut entry = LogEntry::new(EventType::Mismatch, Severity::Warning);
        entry.category = Some(category.id().to_string());
        entry.password = Some(result.password.clone());
        entry.expected = Some(result.expected);
        entry.actual = Some(result.actual);
        self.writer.write_entry(&entry);
    }

    fn on_category_complete(&mut self, stats: &CategoryStats, elapsed: Duration) {
        let mut entry = LogEntry::new(EventType::CategoryComplete, Severity::Info);
        entry.category = Some(stats.category.id().to_string());
        entry.processed = Some(stats.cases);
        entry.mismatches = Some(stats.mismatches);
        entry.duration_ms = Some(millis(elapsed));
        self.writer.write_entry(&entry);
    }

    fn on_finish(&mut self, summary: &RunSummary, aborted: bool) {
        let (event, severity) = if aborted {
            (EventType::RunAborted, Severity::Warning)
        } else {
            (EventType::RunComplete, Severity::Info)
        };
        let mut entry = LogEntry::new(event, severity);
        entry.processed = Some(summary.processed);
        entry.total = Some(summary.total);
        entry.mismatches = Some(summary.mismatches);
        entry.ok = Some(summary.mismatches == 0);
        entry.duration_ms = Some(millis(summary.elapsed));
        entry.results_file.clone_from(&self.results_file);
        self.writer.write_entry(&entry);
        self.writer.sync();
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
