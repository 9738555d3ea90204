//! The password policy predicate.
//!
//! A candidate conforms when it is at least [`MIN_LENGTH`] characters long,
//! contains at least one character from every required class, and contains
//! nothing outside those classes. Evaluation is a single pass over the
//! characters with class lookups; there is no backtracking.

#![allow(missing_docs)]

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::policy::charset::CharacterClass;

/// Minimum candidate length, in characters.
pub const MIN_LENGTH: usize = 8;

/// Classes a conforming candidate must contain at least once.
pub const REQUIRED_CLASSES: [CharacterClass; 4] = [
    CharacterClass::Upper,
    CharacterClass::Lower,
    CharacterClass::Digit,
    CharacterClass::LegalSpecial,
];

/// A predicate that decides whether a candidate password conforms.
///
/// The orchestrator exercises any implementation of this trait; [`PolicyRule`]
/// is the reference implementation.
pub trait PasswordValidator: Send + Sync {
    /// Return `true` when `candidate` conforms to the policy.
    fn validate(&self, candidate: &str) -> bool;
}

impl<F> PasswordValidator for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn validate(&self, candidate: &str) -> bool {
        self(candidate)
    }
}

/// One policy dimension a candidate failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// The candidate is the empty string.
    Empty,
    /// Shorter than the minimum length.
    TooShort {
        /// Length in characters.
        length: usize,
        minimum: usize,
    },
    /// A required class does not appear.
    MissingClass {
        class: CharacterClass,
    },
    /// A character outside the permitted classes appears.
    IllegalCharacter {
        ch: char,
        /// Character index, not byte offset.
        position: usize,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty password"),
            Self::TooShort { length, minimum } => {
                write!(f, "length {length} is below the minimum of {minimum}")
            }
            Self::MissingClass { class } => write!(f, "no {class}"),
            Self::IllegalCharacter { ch, position } => {
                write!(f, "illegal character {ch:?} at position {position}")
            }
        }
    }
}

/// Immutable policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    min_length: usize,
    required: Vec<CharacterClass>,
}

impl Default for PolicyRule {
    fn default() -> Self {
        Self::standard()
    }
}

impl PolicyRule {
    /// The policy under test: 8+ characters, one of each required class,
    /// no illegal characters.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            min_length: MIN_LENGTH,
            required: REQUIRED_CLASSES.to_vec(),
        }
    }

    #[must_use]
    pub fn min_length(&self) -> usize {
        self.min_length
    }

    #[must_use]
    pub fn required_classes(&self) -> &[CharacterClass] {
        &self.required
    }

    /// Check a candidate and report every violated dimension.
    ///
    /// Illegal characters are reported once per occurrence; missing classes in
    /// [`REQUIRED_CLASSES`] order.
    pub fn check(&self, candidate: &str) -> Result<(), Vec<Violation>> {
        if candidate.is_empty() {
            return Err(vec![Violation::Empty]);
        }

        let mut seen = [false; CharacterClass::ALL.len()];
        let mut length = 0usize;
        let mut violations = Vec::new();

        for (position, ch) in candidate.chars().enumerate() {
            length += 1;
            let class = CharacterClass::classify(ch);
            if class == CharacterClass::IllegalSpecial {
                violations.push(Violation::IllegalCharacter { ch, position });
            } else {
                seen[class.index()] = true;
            }
        }

        if length < self.min_length {
            violations.push(Violation::TooShort {
                length,
                minimum: self.min_length,
            });
        }
        for class in &self.required {
            if !seen[class.index()] {
                violations.push(Violation::MissingClass { class: *class });
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

impl PasswordValidator for PolicyRule {
    fn validate(&self, candidate: &str) -> bool {
        if candidate.is_empty() {
            return false;
        }
        let mut seen = [false; CharacterClass::ALL.len()];
        let mut length = 0usize;
        for ch in candidate.chars() {
            let class = CharacterClass::classify(ch);
            if class == CharacterClass::IllegalSpecial {
                return false;
            }
            seen[class.index()] = true;
            length += 1;
        }
        length >= self.min_length && self.required.iter().all(|c| seen[c.index()])
    }
}
