//! JSONL event log: append-only line-delimited JSON describing each run.
//!
//! Each line is a self-contained JSON object. Lines are assembled in memory and
//! written with a single `write_all` so a concurrent `tail -f` never sees a
//! partial line.
//!
//! A log that cannot be written degrades instead of failing the run: primary
//! path, then a fallback file, then stderr with a `[PWF-JSONL]` prefix, then
//! nothing.

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions, rename};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{PwfError, Result};

/// Severity level for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Events emitted over the life of a run or evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    RunStart,
    Checkpoint,
    Mismatch,
    CategoryComplete,
    RunComplete,
    RunAborted,
    EvalComplete,
    Error,
}

/// A single JSONL log entry. All fields optional except `ts`, `event`, `severity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO 8601 UTC timestamp.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    /// Category id the event concerns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<bool>,
    /// Results consumed so far.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed: Option<u64>,
    /// Results planned, or rows evaluated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mismatches: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    /// Result file the event concerns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_file: Option<String>,
    /// SHA-256 of an evaluated result file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    /// Stable hash of the effective configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// PWF error code if the action failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Freeform details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// Create a new entry stamped with the current UTC time.
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            category: None,
            password: None,
            expected: None,
            actual: None,
            processed: None,
            total: None,
            mismatches: None,
            duration_ms: None,
            ok: None,
            results_file: None,
            sha256: None,
            config_hash: None,
            seed: None,
            error_code: None,
            error_message: None,
            details: None,
        }
    }

    /// Attach the code and message of a failed action.
    #[must_use]
    pub fn with_error(mut self, error: &PwfError) -> Self {
        self.ok = Some(false);
        self.error_code = Some(error.code().to_string());
        self.error_message = Some(error.to_string());
        self
    }
}

/// Where log lines currently go, from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Primary,
    Fallback,
    Stderr,
    Discard,
}

impl LogTarget {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
            Self::Stderr => "stderr",
            Self::Discard => "discard",
        }
    }

    const fn next(self) -> Self {
        match self {
            Self::Primary => Self::Fallback,
            Self::Fallback => Self::Stderr,
            Self::Stderr | Self::Discard => Self::Discard,
        }
    }
}

impl std::fmt::Display for LogTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the event log lives and when it rotates.
#[derive(Debug, Clone)]
pub struct JsonlConfig {
    pub path: PathBuf,
    /// Used when `path` cannot be opened or written.
    pub fallback_path: Option<PathBuf>,
    /// Rotate before a line would push the file past this size.
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
}

impl JsonlConfig {
    /// 64 MiB files, three rotations, fallback in the temp dir.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fallback_path: Some(std::env::temp_dir().join("pwfuzz-events.jsonl")),
            max_size_bytes: 64 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

/// Append-only JSONL writer. Failures move it down the [`LogTarget`] chain
/// instead of surfacing as errors.
pub struct JsonlWriter {
    config: JsonlConfig,
    target: LogTarget,
    file: Option<BufWriter<File>>,
    bytes_written: u64,
}

impl JsonlWriter {
    pub fn open(config: JsonlConfig) -> Self {
        let mut writer = Self {
            config,
            target: LogTarget::Primary,
            file: None,
            bytes_written: 0,
        };
        writer.attach(LogTarget::Primary);
        writer
    }

    /// Append one entry as a single line.
    pub fn write_entry(&mut self, entry: &LogEntry) {
        match serde_json::to_string(entry) {
            Ok(mut line) => {
                line.push('\n');
                self.write_line(&line);
            }
            Err(e) => warn(format_args!("cannot serialize {:?} entry: {e}", entry.event)),
        }
    }

    pub fn flush(&mut self) {
        if let Some(file) = self.file.as_mut() {
            let _ = file.flush();
        }
    }

    /// Flush and push file contents to disk. Called once per finished run.
    pub fn sync(&mut self) {
        if let Some(file) = self.file.as_mut() {
            let _ = file.flush();
            let _ = file.get_ref().sync_data();
        }
    }

    pub fn state(&self) -> LogTarget {
        self.target
    }

    /// Size of the current file, including what was there before opening.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Return to the primary path if it has become writable again.
    pub fn try_recover(&mut self) {
        if self.target == LogTarget::Primary {
            return;
        }
        if let Ok((file, size)) = open_append(&self.config.path) {
            self.flush();
            self.file = Some(BufWriter::new(file));
            self.bytes_written = size;
            self.target = LogTarget::Primary;
            warn(format_args!(
                "event log back on {}",
                self.config.path.display()
            ));
        }
    }

    fn path_for(&self, target: LogTarget) -> Option<&Path> {
        match target {
            LogTarget::Primary => Some(&self.config.path),
            LogTarget::Fallback => self.config.fallback_path.as_deref(),
            LogTarget::Stderr | LogTarget::Discard => None,
        }
    }

    /// Open `wanted`, stepping down the chain until something accepts lines.
    fn attach(&mut self, wanted: LogTarget) {
        self.file = None;
        let mut target = wanted;
        loop {
            match self.path_for(target).map(open_append) {
                Some(Ok((file, size))) => {
                    self.file = Some(BufWriter::new(file));
                    self.bytes_written = size;
                    break;
                }
                Some(Err(e)) => {
                    warn(format_args!("{e}"));
                    target = target.next();
                }
                None if matches!(target, LogTarget::Primary | LogTarget::Fallback) => {
                    target = target.next();
                }
                None => break,
            }
        }
        if target != wanted {
            warn(format_args!("event log now writing to {target}"));
        }
        self.target = target;
    }

    fn write_line(&mut self, line: &str) {
        let len = line.len() as u64;
        if self.file.is_some() && self.bytes_written + len > self.config.max_size_bytes {
            self.rotate();
        }
        loop {
            match self.target {
                LogTarget::Primary | LogTarget::Fallback => {
                    let written = self
                        .file
                        .as_mut()
                        .is_some_and(|file| file.write_all(line.as_bytes()).is_ok());
                    if written {
                        self.bytes_written += len;
                        return;
                    }
                    self.attach(self.target.next());
                }
                LogTarget::Stderr => {
                    if write!(io::stderr(), "[PWF-JSONL] {line}").is_err() {
                        self.target = LogTarget::Discard;
                    }
                    return;
                }
                LogTarget::Discard => return,
            }
        }
    }

    /// Shift `log.N` to `log.N+1`, move the live file to `log.1`, reopen.
    fn rotate(&mut self) {
        let Some(base) = self.path_for(self.target).map(Path::to_path_buf) else {
            return;
        };
        self.flush();
        self.file = None;
        for i in (1..self.config.max_rotated_files).rev() {
            let _ = rename(rotated_name(&base, i), rotated_name(&base, i + 1));
        }
        let _ = rename(&base, rotated_name(&base, 1));
        self.attach(self.target);
    }
}

impl Drop for JsonlWriter {
    fn drop(&mut self) {
        self.flush();
    }
}

// ──────────────────────── helpers ────────────────────────

/// Open or create a file for appending. Returns `(File, current_size)`.
fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| PwfError::io(parent, e))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| PwfError::io(path, e))?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    Ok((file, size))
}

/// Build a rotated filename: `events.jsonl` → `events.jsonl.3`.
fn rotated_name(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn warn(message: std::fmt::Arguments<'_>) {
    let _ = writeln!(io::stderr(), "[PWF-JSONL] {message}");
}

/// Format current UTC time as ISO 8601.
fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

// ──────────────────────── tests ────────────────────────
