//! Re-scoring of a persisted result file.
//!
//! The evaluator trusts nothing about the file: the header must match, every
//! row must have exactly three fields, and both verdict columns must parse as
//! booleans. Any deviation aborts the evaluation, since a damaged truth file
//! cannot support a conclusion.

#![allow(missing_docs)]

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::core::errors::{PwfError, Result};
use crate::results::codec::{HEADER, RecordReader};
use crate::results::digest::DigestReader;

/// Largest exit code the evaluation reports; higher mismatch counts saturate.
/// Codes above 125 are reserved by POSIX shells.
pub const MAX_EXIT_CODE: i32 = 125;

/// Default number of discrepancies kept in a report.
pub const DEFAULT_RETAIN_LIMIT: usize = 10_000;

/// A row whose recorded verdicts disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    pub line: usize,
    pub password: String,
    pub expected: bool,
    pub actual: bool,
}

/// Outcome of evaluating one result file.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub source: PathBuf,
    pub total: u64,
    pub mismatches: u64,
    pub discrepancies: Vec<Discrepancy>,
    /// Discrepancies counted but not retained because of the retain limit.
    pub omitted_discrepancies: u64,
    pub sha256: String,
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl EvaluationReport {
    #[must_use]
    pub fn passed(&self) -> u64 {
        self.total - self.mismatches
    }

    /// Share of rows whose verdicts agree, in percent. An empty file passes.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn pass_percentage(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.passed() as f64 / self.total as f64 * 100.0
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.mismatches == 0
    }

    /// Process exit code: the mismatch count, saturated at [`MAX_EXIT_CODE`].
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::try_from(self.mismatches).map_or(MAX_EXIT_CODE, |n| n.min(MAX_EXIT_CODE))
    }
}

fn serialize_millis<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// Reads result files and recomputes agreement.
#[derive(Debug, Clone)]
pub struct Evaluator {
    retain_limit: usize,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            retain_limit: DEFAULT_RETAIN_LIMIT,
        }
    }

    /// Cap the number of discrepancies kept in the report; the count is
    /// always exact.
    #[must_use]
    pub fn with_retain_limit(mut self, limit: usize) -> Self {
        self.retain_limit = limit;
        self
    }

    /// Evaluate the result file at `path`.
    pub fn evaluate_path(&self, path: &Path) -> Result<EvaluationReport> {
        let file = File::open(path).map_err(|e| PwfError::io(path, e))?;
        self.evaluate_reader(file, path)
    }

    /// Evaluate result rows from any reader; `source` labels errors and the
    /// report.
    pub fn evaluate_reader<R: Read>(&self, reader: R, source: &Path) -> Result<EvaluationReport> {
        let started = Instant::now();
        let mut records = RecordReader::new(BufReader::new(DigestReader::new(reader)), source);

        let header = records.next_record()?.ok_or_else(|| PwfError::MalformedRecord {
            line: 1,
            details: "missing header row".to_string(),
        })?;
        let header_matches = header.fields.len() == HEADER.len()
            && header
                .fields
                .iter()
                .zip(HEADER)
                .all(|(got, want)| got.trim().eq_ignore_ascii_case(want));
        if !header_matches {
            return Err(PwfError::MalformedRecord {
                line: header.line,
                details: format!(
                    "expected header {:?}, found {:?}",
                    HEADER.join(","),
                    header.fields.join(",")
                ),
            });
        }

        let mut total = 0u64;
        let mut mismatches = 0u64;
        let mut discrepancies = Vec::new();
        let mut omitted = 0u64;

        while let Some(record) = records.next_record()? {
            let [password, expected, actual]: [String; 3] =
                record
                    .fields
                    .try_into()
                    .map_err(|fields: Vec<String>| PwfError::MalformedRecord {
                        line: record.line,
                        details: format!("expected 3 fields, found {}", fields.len()),
                    })?;
            let expected = parse_verdict(&expected, record.line, "expected")?;
            let actual = parse_verdict(&actual, record.line, "actual")?;

            total += 1;
            if expected != actual {
                mismatches += 1;
                if discrepancies.len() < self.retain_limit {
                    discrepancies.push(Discrepancy {
                        line: record.line,
                        password,
                        expected,
                        actual,
                    });
                } else {
                    omitted += 1;
                }
            }
        }

        let sha256 = records.into_inner().into_inner().finish();
        Ok(EvaluationReport {
            source: source.to_path_buf(),
            total,
            mismatches,
            discrepancies,
            omitted_discrepancies: omitted,
            sha256,
            elapsed: started.elapsed(),
        })
    }
}

fn parse_verdict(raw: &str, line: usize, column: &str) -> Result<bool> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(PwfError::MalformedRecord {
            line,
            details: format!("{column} column is not a boolean: {raw:?}"),
        })
    }
}
