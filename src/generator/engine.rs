//! The parameterized case generator.
//!
//! One generator serves every category: the category's [`GenerationProfile`]
//! decides how many characters each class contributes, the runs are
//! concatenated and shuffled, and truncating profiles cut the result short.

#![allow(missing_docs)]

use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::generator::category::TestCategory;
use crate::generator::profile::GenerationProfile;
use crate::policy::charset::CharacterClass;

/// A generated candidate and the verdict a correct validator must return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub password: String,
    /// `true` only for [`TestCategory::AllValid`].
    pub expected: bool,
}

/// Stream of test cases for one category, driven by its own RNG.
#[derive(Debug, Clone)]
pub struct CaseGenerator {
    category: TestCategory,
    profile: GenerationProfile,
    rng: StdRng,
    scratch: Vec<char>,
}

impl CaseGenerator {
    /// Generator seeded from the thread-local entropy source.
    #[must_use]
    pub fn new(category: TestCategory) -> Self {
        Self::with_rng(category, StdRng::from_rng(&mut rand::rng()))
    }

    /// Reproducible generator: the same seed yields the same case sequence.
    #[must_use]
    pub fn seeded(category: TestCategory, seed: u64) -> Self {
        Self::with_rng(category, StdRng::seed_from_u64(seed))
    }

    #[must_use]
    pub fn with_rng(category: TestCategory, rng: StdRng) -> Self {
        Self::with_profile(category, category.profile(), rng)
    }

    /// Generator with a custom run-length table. The expected verdict still
    /// comes from `category`.
    #[must_use]
    pub fn with_profile(category: TestCategory, profile: GenerationProfile, rng: StdRng) -> Self {
        Self {
            category,
            profile,
            rng,
            scratch: Vec::with_capacity(128),
        }
    }

    #[must_use]
    pub fn category(&self) -> TestCategory {
        self.category
    }

    #[must_use]
    pub fn profile(&self) -> &GenerationProfile {
        &self.profile
    }

    /// Produce the next case.
    pub fn next_case(&mut self) -> TestCase {
        self.scratch.clear();

        for class in CharacterClass::ALL {
            let run = self.profile.run_length(class);
            if run.is_absent() {
                continue;
            }
            let count = self.rng.random_range(run.min..=run.max);
            let alphabet = class.alphabet();
            for _ in 0..count {
                if let Some(&b) = alphabet.choose(&mut self.rng) {
                    self.scratch.push(char::from(b));
                }
            }
        }

        self.scratch.shuffle(&mut self.rng);

        if let Some(cut) = self.profile.truncation() {
            let keep = self.rng.random_range(cut.min..=cut.max);
            self.scratch.truncate(keep);
        }

        TestCase {
            password: self.scratch.iter().collect(),
            expected: self.category.expected_verdict(),
        }
    }

    /// Produce `count` cases.
    pub fn generate(&mut self, count: usize) -> Vec<TestCase> {
        (0..count).map(|_| self.next_case()).collect()
    }
}

impl Iterator for CaseGenerator {
    type Item = TestCase;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_case())
    }
}
