//! Immutable description of one generation run.

#![allow(missing_docs)]

use serde::Serialize;

use crate::core::errors::{PwfError, Result};
use crate::generator::category::TestCategory;

/// Default number of results between progress checkpoints.
pub const DEFAULT_CHECKPOINT_INTERVAL: u64 = 10_000;

/// Which categories to run, how often, and how to react to mismatches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunPlan {
    categories: Vec<TestCategory>,
    repetitions: u64,
    fail_fast: bool,
    checkpoint_interval: u64,
    handoff_capacity: usize,
    seed: Option<u64>,
}

impl RunPlan {
    /// Plan `repetitions` cases for each category. Duplicates collapse and the
    /// categories are kept in canonical order.
    pub fn new(categories: impl IntoIterator<Item = TestCategory>, repetitions: u64) -> Result<Self> {
        let mut categories: Vec<TestCategory> = categories.into_iter().collect();
        categories.sort_unstable();
        categories.dedup();

        if categories.is_empty() {
            return Err(PwfError::InvalidConfig {
                details: "no test categories selected".to_string(),
            });
        }
        if repetitions == 0 {
            return Err(PwfError::InvalidConfig {
                details: "repetitions must be > 0".to_string(),
            });
        }

        Ok(Self {
            categories,
            repetitions,
            fail_fast: false,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            handoff_capacity: 0,
            seed: None,
        })
    }

    /// Abort at the first mismatch.
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Results between checkpoints; zero is treated as one.
    #[must_use]
    pub fn with_checkpoint_interval(mut self, interval: u64) -> Self {
        self.checkpoint_interval = interval.max(1);
        self
    }

    /// Cases a generator may hand off before blocking; zero means every
    /// handoff waits for the consumer.
    #[must_use]
    pub fn with_handoff_capacity(mut self, capacity: usize) -> Self {
        self.handoff_capacity = capacity;
        self
    }

    /// Seed every generator deterministically from `seed`.
    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn categories(&self) -> &[TestCategory] {
        &self.categories
    }

    #[must_use]
    pub fn repetitions(&self) -> u64 {
        self.repetitions
    }

    #[must_use]
    pub fn fail_fast(&self) -> bool {
        self.fail_fast
    }

    #[must_use]
    pub fn checkpoint_interval(&self) -> u64 {
        self.checkpoint_interval
    }

    #[must_use]
    pub fn handoff_capacity(&self) -> usize {
        self.handoff_capacity
    }

    #[must_use]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Seed for one category's generator.
    #[must_use]
    pub fn seed_for(&self, category: TestCategory) -> Option<u64> {
        self.seed.map(|s| s.wrapping_add(category as u64))
    }

    /// Exact number of results the run consumes.
    #[must_use]
    pub fn total_cases(&self) -> u64 {
        self.repetitions
            .saturating_mul(self.categories.len() as u64)
    }
}
