//! Character classes and their fixed membership alphabets.
//!
//! Every alphabet is ASCII, so membership is a byte-table lookup and a
//! generated candidate can be built one `char` per byte.

use std::fmt;

use serde::{Deserialize, Serialize};

/// `A`-`Z`.
pub const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
/// `a`-`z`.
pub const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
/// `0`-`9`.
pub const DIGITS: &[u8] = b"0123456789";
/// Punctuation the policy explicitly permits.
pub const LEGAL_SPECIALS: &[u8] = b"-_.!$|@%^&*";
/// Punctuation and whitespace the policy rejects anywhere in a candidate.
pub const ILLEGAL_SPECIALS: &[u8] = b"+=()#~}{[]\\<>/? \"'`,";

/// A fixed family of characters with its own membership set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CharacterClass {
    /// Uppercase ASCII letters.
    Upper,
    /// Lowercase ASCII letters.
    Lower,
    /// ASCII digits.
    Digit,
    /// Permitted punctuation.
    LegalSpecial,
    /// Forbidden punctuation and whitespace.
    IllegalSpecial,
}

impl CharacterClass {
    /// All classes in generation order.
    pub const ALL: [Self; 5] = [
        Self::Upper,
        Self::Lower,
        Self::Digit,
        Self::LegalSpecial,
        Self::IllegalSpecial,
    ];

    /// The membership set of this class.
    #[must_use]
    pub const fn alphabet(self) -> &'static [u8] {
        match self {
            Self::Upper => UPPER,
            Self::Lower => LOWER,
            Self::Digit => DIGITS,
            Self::LegalSpecial => LEGAL_SPECIALS,
            Self::IllegalSpecial => ILLEGAL_SPECIALS,
        }
    }

    /// Stable index into per-class tables (`0..5`).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Upper => 0,
            Self::Lower => 1,
            Self::Digit => 2,
            Self::LegalSpecial => 3,
            Self::IllegalSpecial => 4,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Upper => "uppercase letter",
            Self::Lower => "lowercase letter",
            Self::Digit => "digit",
            Self::LegalSpecial => "legal special character",
            Self::IllegalSpecial => "illegal character",
        }
    }

    /// Classify one character. Anything outside the five alphabets (including
    /// all non-ASCII input) is reported as `IllegalSpecial`.
    #[must_use]
    pub fn classify(ch: char) -> Self {
        match ch {
            'A'..='Z' => Self::Upper,
            'a'..='z' => Self::Lower,
            '0'..='9' => Self::Digit,
            _ if u8::try_from(ch).is_ok_and(|b| LEGAL_SPECIALS.contains(&b)) => {
                Self::LegalSpecial
            }
            _ => Self::IllegalSpecial,
        }
    }

    /// Whether `ch` is a member of this class's alphabet.
    #[must_use]
    pub fn contains(self, ch: char) -> bool {
        u8::try_from(ch).is_ok_and(|b| self.alphabet().contains(&b))
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
