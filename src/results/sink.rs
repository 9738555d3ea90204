//! Append-only persistence of scored results.

#![allow(missing_docs)]

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::errors::{PwfError, Result};
use crate::results::codec::{self, HEADER};
use crate::results::record::TestResult;

/// Destination for scored results.
///
/// Implementations need not be safe for concurrent writers: the orchestrator
/// routes every write through its single consumer loop.
pub trait ResultSink {
    /// Append one result.
    fn write(&mut self, result: &TestResult) -> Result<()>;

    /// Push buffered output to durable storage.
    fn flush(&mut self) -> Result<()>;
}

impl<S: ResultSink + ?Sized> ResultSink for &mut S {
    fn write(&mut self, result: &TestResult) -> Result<()> {
        (**self).write(result)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// In-memory sink.
impl ResultSink for Vec<TestResult> {
    fn write(&mut self, result: &TestResult) -> Result<()> {
        self.push(result.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// CSV result file: header `password,expected,actual`, one row per result.
pub struct CsvResultSink<W: Write> {
    writer: W,
    path: PathBuf,
    rows: u64,
    line: String,
}

impl CsvResultSink<BufWriter<File>> {
    /// Create (or truncate) the result file at `path` and write the header.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| PwfError::io(parent, e))?;
        }
        let file = File::create(path).map_err(|e| PwfError::io(path, e))?;
        Self::from_writer(BufWriter::with_capacity(64 * 1024, file), path)
    }
}

impl<W: Write> CsvResultSink<W> {
    /// Wrap an arbitrary writer; `path` labels IO errors.
    pub fn from_writer(writer: W, path: impl AsRef<Path>) -> Result<Self> {
        let mut sink = Self {
            writer,
            path: path.as_ref().to_path_buf(),
            rows: 0,
            line: String::with_capacity(128),
        };
        codec::encode_record_into(&mut sink.line, &HEADER);
        sink.writer
            .write_all(sink.line.as_bytes())
            .map_err(|e| PwfError::io(&sink.path, e))?;
        Ok(sink)
    }

    /// Data rows written so far (header excluded).
    #[must_use]
    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.writer
            .flush()
            .map_err(|e| PwfError::io(&self.path, e))?;
        Ok(self.writer)
    }
}

impl<W: Write> ResultSink for CsvResultSink<W> {
    fn write(&mut self, result: &TestResult) -> Result<()> {
        codec::encode_record_into(
            &mut self.line,
            &[
                result.password.as_str(),
                bool_field(result.expected),
                bool_field(result.actual),
            ],
        );
        self.writer
            .write_all(self.line.as_bytes())
            .map_err(|e| PwfError::io(&self.path, e))?;
        self.rows += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| PwfError::io(&self.path, e))
    }
}

const fn bool_field(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
