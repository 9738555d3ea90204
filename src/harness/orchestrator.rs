//! Concurrent fan-in of case generators into a single scoring loop.
//!
//! One worker thread per selected category pushes cases into a bounded
//! channel. The calling thread is the only consumer: it scores each case,
//! writes the result to the sink, and drives checkpoints. Completion is
//! decided purely by count; worker status is never polled.
//!
//! Invariants:
//! - exactly `repetitions × categories` results are consumed on success
//! - every result is written before the next case is received
//! - the sink is touched only by the consumer loop

#![allow(missing_docs)]

use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel as channel;

use crate::core::errors::{PwfError, Result};
use crate::generator::category::TestCategory;
use crate::generator::engine::{CaseGenerator, TestCase};
use crate::harness::plan::RunPlan;
use crate::harness::progress::{CategoryStats, Checkpoint, ProgressObserver, RunSummary};
use crate::policy::validator::PasswordValidator;
use crate::results::record::TestResult;
use crate::results::sink::ResultSink;

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Every planned case was generated, scored and persisted.
    Completed(RunSummary),
    /// Fail-fast stopped the run at `mismatch`, which was persisted before
    /// returning. Outstanding generators were abandoned.
    Aborted {
        summary: RunSummary,
        category: TestCategory,
        mismatch: TestResult,
    },
}

impl RunOutcome {
    /// Counts for the results consumed, whether or not the run finished.
    #[must_use]
    pub fn summary(&self) -> &RunSummary {
        match self {
            Self::Completed(summary) | Self::Aborted { summary, .. } => summary,
        }
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }
}

/// A case in flight from a generator to the consumer.
struct Handoff {
    slot: usize,
    case: TestCase,
}

/// Runs a [`RunPlan`] against a validator.
pub struct Orchestrator<V> {
    plan: RunPlan,
    validator: V,
}

impl<V: PasswordValidator> Orchestrator<V> {
    pub fn new(plan: RunPlan, validator: V) -> Self {
        Self { plan, validator }
    }

    #[must_use]
    pub fn plan(&self) -> &RunPlan {
        &self.plan
    }

    /// Execute the plan, persisting every result into `sink`.
    ///
    /// Sink failures abort the run with an error. On fail-fast abort the
    /// mismatching row is written and the sink flushed before returning.
    pub fn run<S, O>(&self, sink: &mut S, observer: &mut O) -> Result<RunOutcome>
    where
        S: ResultSink + ?Sized,
        O: ProgressObserver + ?Sized,
    {
        let started = Instant::now();
        let total = self.plan.total_cases();
        let repetitions = self.plan.repetitions();
        let interval = self.plan.checkpoint_interval();
        let categories = self.plan.categories();

        observer.on_start(&self.plan);

        let (tx, rx) = channel::bounded::<Handoff>(self.plan.handoff_capacity());
        let mut workers: Vec<JoinHandle<()>> = Vec::with_capacity(categories.len());
        for (slot, &category) in categories.iter().enumerate() {
            let generator = match self.plan.seed_for(category) {
                Some(seed) => CaseGenerator::seeded(category, seed),
                None => CaseGenerator::new(category),
            };
            let tx = tx.clone();
            let handle = thread::Builder::new()
                .name(format!("pwf-gen-{}", category.id()))
                .spawn(move || generator_thread(slot, generator, repetitions, &tx))
                .map_err(|e| PwfError::Runtime {
                    details: format!("failed to spawn generator for {category}: {e}"),
                })?;
            workers.push(handle);
        }
        // Workers hold the only senders; the channel disconnects once they finish.
        drop(tx);

        let mut stats: Vec<CategoryStats> = categories
            .iter()
            .map(|&category| CategoryStats {
                category,
                cases: 0,
                mismatches: 0,
            })
            .collect();
        let mut processed = 0u64;
        let mut mismatches = 0u64;

        while processed < total {
            let Handoff { slot, case } = rx.recv().map_err(|_| PwfError::ChannelClosed {
                component: "orchestrator",
            })?;

            let actual = self.validator.validate(&case.password);
            let result = TestResult::scored(case, actual);
            sink.write(&result)?;

            processed += 1;
            let entry = &mut stats[slot];
            entry.cases += 1;

            if result.is_mismatch() {
                mismatches += 1;
                entry.mismatches += 1;
                let category = entry.category;
                observer.on_mismatch(category, &result);

                if self.plan.fail_fast() {
                    sink.flush()?;
                    let summary = RunSummary {
                        total,
                        processed,
                        mismatches,
                        categories: stats,
                        elapsed: started.elapsed(),
                    };
                    observer.on_finish(&summary, true);
                    // Dropping `rx` here unblocks any worker waiting on a
                    // handoff; the workers are detached, not joined.
                    return Ok(RunOutcome::Aborted {
                        summary,
                        category,
                        mismatch: result,
                    });
                }
            }

            if entry.cases == repetitions {
                observer.on_category_complete(entry, started.elapsed());
            }

            if processed % interval == 0 {
                sink.flush()?;
                observer.on_checkpoint(&Checkpoint {
                    processed,
                    total,
                    elapsed: started.elapsed(),
                });
            }
        }

        sink.flush()?;

        for handle in workers {
            if handle.join().is_err() {
                return Err(PwfError::Runtime {
                    details: "generator thread panicked".to_string(),
                });
            }
        }

        let summary = RunSummary {
            total,
            processed,
            mismatches,
            categories: stats,
            elapsed: started.elapsed(),
        };
        observer.on_finish(&summary, false);
        Ok(RunOutcome::Completed(summary))
    }
}

/// Worker body: generate `repetitions` cases and hand each one off. Returns
/// early if the consumer has gone away.
fn generator_thread(
    slot: usize,
    mut generator: CaseGenerator,
    repetitions: u64,
    tx: &channel::Sender<Handoff>,
) {
    for _ in 0..repetitions {
        let case = generator.next_case();
        if tx.send(Handoff { slot, case }).is_err() {
            return;
        }
    }
}
