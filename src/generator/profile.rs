//! Per-category generation profiles: how many characters of each class to draw,
//! and whether to cut the shuffled result short.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use crate::core::errors::{PwfError, Result};
use crate::policy::charset::CharacterClass;

/// Inclusive range for a random run length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLength {
    /// Shortest run, inclusive.
    pub min: usize,
    /// Longest run, inclusive.
    pub max: usize,
}

impl RunLength {
    /// The class never appears.
    pub const ABSENT: Self = Self::new(0, 0);
    /// The class appears at least twice.
    pub const PRESENT: Self = Self::new(2, 24);
    /// The class may or may not appear.
    pub const ANY: Self = Self::new(0, 24);
    /// The class appears at least once.
    pub const FORCED: Self = Self::new(1, 25);
    /// Truncation bounds that always land below the policy minimum.
    pub const BELOW_MINIMUM: Self = Self::new(1, 7);

    #[must_use]
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// A zero upper bound means the class never appears.
    #[must_use]
    pub const fn is_absent(self) -> bool {
        self.max == 0
    }
}

/// Run-length configuration for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationProfile {
    runs: [RunLength; CharacterClass::ALL.len()],
    truncate_to: Option<RunLength>,
}

impl GenerationProfile {
    /// Start from the conforming profile: every legal class present, no
    /// illegal characters, no truncation.
    #[must_use]
    pub fn builder() -> GenerationProfileBuilder {
        GenerationProfileBuilder {
            profile: Self {
                runs: [
                    RunLength::PRESENT,
                    RunLength::PRESENT,
                    RunLength::PRESENT,
                    RunLength::PRESENT,
                    RunLength::ABSENT,
                ],
                truncate_to: None,
            },
        }
    }

    #[must_use]
    pub fn run_length(&self, class: CharacterClass) -> RunLength {
        self.runs[class.index()]
    }

    #[must_use]
    pub fn truncation(&self) -> Option<RunLength> {
        self.truncate_to
    }

    /// Shortest candidate the runs can produce before truncation.
    #[must_use]
    pub fn min_untruncated_length(&self) -> usize {
        self.runs.iter().map(|r| r.min).sum()
    }

    /// Longest candidate the runs can produce before truncation.
    #[must_use]
    pub fn max_untruncated_length(&self) -> usize {
        self.runs.iter().map(|r| r.max).sum()
    }

    /// Longest candidate this profile can emit.
    #[must_use]
    pub fn max_length(&self) -> usize {
        let untruncated = self.max_untruncated_length();
        self.truncate_to
            .map_or(untruncated, |t| t.max.min(untruncated))
    }

    /// Verify the range table is well formed.
    ///
    /// A truncation bound longer than the shortest untruncated candidate would
    /// let a cut silently become a no-op, so it is rejected.
    pub fn check_invariants(&self) -> Result<()> {
        for class in CharacterClass::ALL {
            let run = self.run_length(class);
            if run.min > run.max {
                return Err(PwfError::InvalidConfig {
                    details: format!(
                        "run length for {class} has min {} above max {}",
                        run.min, run.max
                    ),
                });
            }
        }
        if self.max_untruncated_length() == 0 {
            return Err(PwfError::InvalidConfig {
                details: "profile can only produce empty candidates".to_string(),
            });
        }
        if let Some(cut) = self.truncate_to {
            if cut.min == 0 || cut.min > cut.max {
                return Err(PwfError::InvalidConfig {
                    details: format!("truncation range {}..={} is invalid", cut.min, cut.max),
                });
            }
            let shortest = self.min_untruncated_length();
            if cut.max > shortest {
                return Err(PwfError::InvalidConfig {
                    details: format!(
                        "truncation to {} exceeds the shortest untruncated candidate ({shortest})",
                        cut.max
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Builder over [`GenerationProfile`].
#[derive(Debug, Clone)]
pub struct GenerationProfileBuilder {
    profile: GenerationProfile,
}

impl GenerationProfileBuilder {
    /// Set the run length for one class.
    #[must_use]
    pub fn run(mut self, class: CharacterClass, length: RunLength) -> Self {
        self.profile.runs[class.index()] = length;
        self
    }

    /// Force a class to zero occurrences.
    #[must_use]
    pub fn absent(self, class: CharacterClass) -> Self {
        self.run(class, RunLength::ABSENT)
    }

    /// Cut the shuffled candidate to a random length in `range`.
    #[must_use]
    pub fn truncate_to(mut self, range: RunLength) -> Self {
        self.profile.truncate_to = Some(range);
        self
    }

    #[must_use]
    pub fn build(self) -> GenerationProfile {
        self.profile
    }
}
