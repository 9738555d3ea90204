//! Progress checkpoints, run observers, and elapsed-time formatting.

#![allow(missing_docs)]

use std::time::Duration;

use serde::Serialize;

use crate::generator::category::TestCategory;
use crate::harness::plan::RunPlan;
use crate::results::record::TestResult;

/// Snapshot emitted every `checkpoint_interval` results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Checkpoint {
    /// Results persisted so far.
    pub processed: u64,
    pub total: u64,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl Checkpoint {
    /// Completion in percent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.processed as f64 / self.total as f64 * 100.0
    }
}

/// Cases and mismatches seen for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub category: TestCategory,
    pub cases: u64,
    pub mismatches: u64,
}

/// Aggregate outcome of a run, complete or aborted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Planned results.
    pub total: u64,
    /// Results persisted; below `total` only when aborted.
    pub processed: u64,
    pub mismatches: u64,
    /// In plan order.
    pub categories: Vec<CategoryStats>,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Hooks the orchestrator calls from its consumer loop.
///
/// All methods default to no-ops.
#[allow(unused_variables)]
pub trait ProgressObserver {
    fn on_start(&mut self, plan: &RunPlan) {}

    fn on_checkpoint(&mut self, checkpoint: &Checkpoint) {}

    fn on_mismatch(&mut self, category: TestCategory, result: &TestResult) {}

    fn on_category_complete(&mut self, stats: &CategoryStats, elapsed: Duration) {}

    fn on_finish(&mut self, summary: &RunSummary, aborted: bool) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}

/// Render a duration at the coarsest unit that keeps it readable:
/// nanoseconds, microseconds, milliseconds, seconds (3 significant digits),
/// then minutes and hours with whole seconds.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let nanos = elapsed.as_nanos();
    if nanos < 1_000 {
        return format!("{nanos} nanoseconds");
    }
    let micros = elapsed.as_micros();
    if micros < 1_000 {
        return format!("{micros} microseconds");
    }
    let millis = elapsed.as_millis();
    if millis < 1_000 {
        return format!("{millis} milliseconds");
    }
    let secs = elapsed.as_secs_f64();
    if secs < 10.0 {
        return format!("{secs:.2} seconds");
    }
    if secs < 60.0 {
        return format!("{secs:.1} seconds");
    }
    let whole = elapsed.as_secs();
    if whole < 3_600 {
        return format!("{} minutes, {} seconds", whole / 60, whole % 60);
    }
    format!(
        "{} hours, {} minutes, {} seconds",
        whole / 3_600,
        (whole % 3_600) / 60,
        whole % 60
    )
}
