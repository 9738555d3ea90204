//! Test categories: one generation strategy per policy dimension.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::PwfError;
use crate::generator::profile::{GenerationProfile, RunLength};
use crate::policy::charset::CharacterClass;

/// A named strategy that exercises one policy dimension in isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestCategory {
    /// Conforming candidates.
    AllValid,
    /// No uppercase letter.
    MissingUpper,
    /// No lowercase letter.
    MissingLower,
    /// No digit.
    MissingDigit,
    /// No legal special character.
    MissingLegalSpecial,
    /// At least one illegal character, everything else random.
    HasIllegalChars,
    /// Otherwise valid, truncated below the minimum length.
    TooShort,
}

impl TestCategory {
    /// Every category, in canonical order.
    pub const ALL: [Self; 7] = [
        Self::AllValid,
        Self::MissingUpper,
        Self::MissingLower,
        Self::MissingDigit,
        Self::MissingLegalSpecial,
        Self::HasIllegalChars,
        Self::TooShort,
    ];

    /// Stable identifier used on the command line, in config and in JSON.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::AllValid => "all-valid",
            Self::MissingUpper => "missing-upper",
            Self::MissingLower => "missing-lower",
            Self::MissingDigit => "missing-digit",
            Self::MissingLegalSpecial => "missing-legal-special",
            Self::HasIllegalChars => "has-illegal-chars",
            Self::TooShort => "too-short",
        }
    }

    /// Banner used in progress output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AllValid => "SHOULD PASS",
            Self::MissingUpper => "SHOULD FAIL UPPER",
            Self::MissingLower => "SHOULD FAIL LOWER",
            Self::MissingDigit => "SHOULD FAIL NUMBER",
            Self::MissingLegalSpecial => "SHOULD FAIL SPECIAL CHARS",
            Self::HasIllegalChars => "SHOULD FAIL ILLEGAL CHARACTERS",
            Self::TooShort => "SHOULD FAIL LENGTH",
        }
    }

    /// One-line description of what the category checks.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AllValid => "conforming passwords are accepted",
            Self::MissingUpper => "uppercase letters are required",
            Self::MissingLower => "lowercase letters are required",
            Self::MissingDigit => "digits are required",
            Self::MissingLegalSpecial => "special characters are required",
            Self::HasIllegalChars => "illegal characters are rejected",
            Self::TooShort => "passwords must be long enough",
        }
    }

    /// The verdict a correct validator returns for every case.
    #[must_use]
    pub const fn expected_verdict(self) -> bool {
        matches!(self, Self::AllValid)
    }

    /// Run-length table for this category.
    #[must_use]
    pub fn profile(self) -> GenerationProfile {
        let builder = GenerationProfile::builder();
        match self {
            Self::AllValid => builder.build(),
            Self::MissingUpper => builder.absent(CharacterClass::Upper).build(),
            Self::MissingLower => builder.absent(CharacterClass::Lower).build(),
            Self::MissingDigit => builder.absent(CharacterClass::Digit).build(),
            Self::MissingLegalSpecial => builder.absent(CharacterClass::LegalSpecial).build(),
            Self::HasIllegalChars => builder
                .run(CharacterClass::Upper, RunLength::ANY)
                .run(CharacterClass::Lower, RunLength::ANY)
                .run(CharacterClass::Digit, RunLength::ANY)
                .run(CharacterClass::LegalSpecial, RunLength::ANY)
                .run(CharacterClass::IllegalSpecial, RunLength::FORCED)
                .build(),
            Self::TooShort => builder.truncate_to(RunLength::BELOW_MINIMUM).build(),
        }
    }
}

impl fmt::Display for TestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for TestCategory {
    type Err = PwfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|c| c.id() == wanted)
            .ok_or_else(|| PwfError::InvalidConfig {
                details: format!(
                    "unknown test category {s:?} (expected one of: {})",
                    Self::ALL.map(Self::id).join(", ")
                ),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_all_valid_expects_acceptance() {
        for category in TestCategory::ALL {
            assert_eq!(
                category.expected_verdict(),
                category == TestCategory::AllValid,
                "{category}"
            );
        }
    }

    #[test]
    fn ids_round_trip_through_from_str() {
        for category in TestCategory::ALL {
            assert_eq!(category.id().parse::<TestCategory>().unwrap(), category);
        }
        assert_eq!(
            "Missing_Upper".parse::<TestCategory>().unwrap(),
            TestCategory::MissingUpper
        );
    }

    #[test]
    fn unknown_id_is_config_error() {
        let err = "bogus".parse::<TestCategory>().unwrap_err();
        assert_eq!(err.code(), "PWF-1001");
        assert!(err.to_string().contains("all-valid"));
    }

    #[test]
    fn serde_uses_kebab_case_ids() {
        for category in TestCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.id()));
        }
    }

    #[test]
    fn every_profile_is_sound() {
        for category in TestCategory::ALL {
            category
                .profile()
                .check_invariants()
                .unwrap_or_else(|e| panic!("{category}: {e}"));
        }
    }

    #[test]
    fn absent_class_matches_category() {
        let cases = [
            (TestCategory::MissingUpper, CharacterClass::Upper),
            (TestCategory::MissingLower, CharacterClass::Lower),
            (TestCategory::MissingDigit, CharacterClass::Digit),
            (TestCategory::MissingLegalSpecial, CharacterClass::LegalSpecial),
        ];
        for (category, class) in cases {
            let profile = category.profile();
            assert_eq!(profile.run_length(class), RunLength::ABSENT);
            for other in CharacterClass::ALL {
                if other != class && other != CharacterClass::IllegalSpecial {
                    assert_eq!(profile.run_length(other), RunLength::PRESENT);
                }
            }
            assert_eq!(
                profile.run_length(CharacterClass::IllegalSpecial),
                RunLength::ABSENT
            );
        }
    }

    #[test]
    fn illegal_profile_forces_an_illegal_character() {
        let profile = TestCategory::HasIllegalChars.profile();
        assert!(profile.run_length(CharacterClass::IllegalSpecial).min >= 1);
        assert_eq!(profile.truncation(), None);
    }

    #[test]
    fn only_too_short_truncates() {
        for category in TestCategory::ALL {
            assert_eq!(
                category.profile().truncation().is_some(),
                category == TestCategory::TooShort
            );
        }
    }
}
