//! Scored test outcomes.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use crate::generator::engine::TestCase;

/// A test case together with the verdict the validator actually returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub password: String,
    /// Verdict the category promises.
    pub expected: bool,
    /// Verdict the validator under test returned.
    pub actual: bool,
}

impl TestResult {
    /// Pair a case with the validator's verdict.
    #[must_use]
    pub fn scored(case: TestCase, actual: bool) -> Self {
        Self {
            password: case.password,
            expected: case.expected,
            actual,
        }
    }

    /// Whether the validator disagreed with the expected verdict.
    #[must_use]
    pub fn is_mismatch(&self) -> bool {
        self.expected != self.actual
    }
}
