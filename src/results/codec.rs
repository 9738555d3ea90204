//! Minimal CSV codec for the result file.
//!
//! Writing follows RFC 4180: a field is wrapped in double quotes when it
//! contains a delimiter, a quote, a line break, or leading/trailing spaces, and
//! embedded quotes are doubled. Reading accepts the same dialect, including
//! quoted fields spanning several lines, and skips blank lines.

#![allow(missing_docs)]

use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::core::errors::{PwfError, Result};

/// Header row of the result file.
pub const HEADER: [&str; 3] = ["password", "expected", "actual"];

/// Whether `field` must be quoted to survive a round trip.
#[must_use]
pub fn needs_quoting(field: &str) -> bool {
    let bytes = field.as_bytes();
    memchr::memchr3(b',', b'"', b'\n', bytes).is_some()
        || memchr::memchr(b'\r', bytes).is_some()
        || field.starts_with(' ')
        || field.ends_with(' ')
}

/// Append one field to `out`, quoting as needed.
pub fn push_field(out: &mut String, field: &str) {
    if needs_quoting(field) {
        out.push('"');
        for ch in field.chars() {
            if ch == '"' {
                out.push('"');
            }
            out.push(ch);
        }
        out.push('"');
    } else {
        out.push_str(field);
    }
}

/// Encode a record, newline-terminated, into `out` (which is cleared first).
pub fn encode_record_into(out: &mut String, fields: &[&str]) {
    out.clear();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, field);
    }
    out.push('\n');
}

/// Encode a record as a newline-terminated string.
#[must_use]
pub fn encode_record(fields: &[&str]) -> String {
    let mut out = String::new();
    encode_record_into(&mut out, fields);
    out
}

/// A parsed record and the line it started on (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Line the record starts on; quoted fields may span more.
    pub line: usize,
    pub fields: Vec<String>,
}

/// Streaming record reader.
pub struct RecordReader<R> {
    inner: R,
    source: PathBuf,
    line: usize,
    buf: String,
}

impl<R: BufRead> RecordReader<R> {
    /// `source` is used in error messages only.
    pub fn new(inner: R, source: impl AsRef<Path>) -> Self {
        Self {
            inner,
            source: source.as_ref().to_path_buf(),
            line: 0,
            buf: String::new(),
        }
    }

    /// Number of physical lines consumed so far.
    #[must_use]
    pub fn lines_read(&self) -> usize {
        self.line
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Read the next record, or `None` at end of input.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        let mut fields = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut after_quote = false;
        let mut start_line = 0;

        loop {
            self.buf.clear();
            let n = self
                .inner
                .read_line(&mut self.buf)
                .map_err(|e| PwfError::io(&self.source, e))?;
            if n == 0 {
                if start_line == 0 {
                    return Ok(None);
                }
                return Err(PwfError::MalformedRecord {
                    line: start_line,
                    details: "unterminated quoted field".to_string(),
                });
            }
            self.line += 1;

            if start_line == 0 {
                if self.buf == "\n" || self.buf == "\r\n" {
                    continue;
                }
                start_line = self.line;
            }

            if !in_quotes && memchr::memchr(b'"', self.buf.as_bytes()).is_none() {
                return Ok(Some(Record {
                    line: start_line,
                    fields: split_unquoted(&self.buf),
                }));
            }

            let mut chars = self.buf.chars().peekable();
            while let Some(ch) = chars.next() {
                if in_quotes {
                    if ch == '"' {
                        if chars.peek() == Some(&'"') {
                            chars.next();
                            field.push('"');
                        } else {
                            in_quotes = false;
                            after_quote = true;
                        }
                    } else {
                        field.push(ch);
                    }
                    continue;
                }
                match ch {
                    ',' => {
                        fields.push(std::mem::take(&mut field));
                        after_quote = false;
                    }
                    '\r' if chars.peek() == Some(&'\n') => {}
                    '\n' => {
                        fields.push(std::mem::take(&mut field));
                        return Ok(Some(Record {
                            line: start_line,
                            fields,
                        }));
                    }
                    _ if after_quote => {
                        return Err(PwfError::MalformedRecord {
                            line: self.line,
                            details: format!("unexpected {ch:?} after closing quote"),
                        });
                    }
                    '"' if field.is_empty() => in_quotes = true,
                    '"' => {
                        return Err(PwfError::MalformedRecord {
                            line: self.line,
                            details: "bare quote inside unquoted field".to_string(),
                        });
                    }
                    _ => field.push(ch),
                }
            }

            if !in_quotes {
                // Final record without a trailing newline.
                fields.push(field);
                return Ok(Some(Record {
                    line: start_line,
                    fields,
                }));
            }
        }
    }
}

/// Split a physical line that contains no quotes at every comma.
fn split_unquoted(line: &str) -> Vec<String> {
    let line = line
        .strip_suffix('\n')
        .map_or(line, |l| l.strip_suffix('\r').unwrap_or(l));
    let mut fields = Vec::with_capacity(3);
    let mut start = 0;
    for pos in memchr::memchr_iter(b',', line.as_bytes()) {
        fields.push(line[start..pos].to_string());
        start = pos + 1;
    }
    fields.push(line[start..].to_string());
    fields
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_all(input: &str) -> Result<Vec<Record>> {
        RecordReader::new(Cursor::new(input.as_bytes()), "test.csv").collect()
    }

    #[test]
    fn plain_fields_are_not_quoted() {
        assert_eq!(
            encode_record(&["Aa1$Aa1$", "true", "true"]),
            "Aa1$Aa1$,true,true\n"
        );
    }

    #[test]
    fn delimiters_and_quotes_are_escaped() {
        assert_eq!(encode_record(&["a,b"]), "\"a,b\"\n");
        assert_eq!(encode_record(&["say \"hi\""]), "\"say \"\"hi\"\"\"\n");
        assert_eq!(encode_record(&[" lead"]), "\" lead\"\n");
        assert_eq!(encode_record(&["trail "]), "\"trail \"\n");
        assert_eq!(encode_record(&["x\ny"]), "\"x\ny\"\n");
    }

    #[test]
    fn header_encodes_verbatim() {
        assert_eq!(encode_record(&HEADER), "password,expected,actual\n");
    }

    #[test]
    fn reads_back_every_illegal_special() {
        let password = "+=()#~}{[]\\<>/? \"'`,";
        let encoded = encode_record(&[password, "false", "false"]);
        let records = read_all(&encoded).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fields, vec![password, "false", "false"]);
    }

    #[test]
    fn multi_line_quoted_field() {
        let records = read_all("\"a\nb\",true,false\nc,false,false\n").unwrap();
        assert_eq!(records[0].fields, vec!["a\nb", "true", "false"]);
        assert_eq!(records[0].line, 1);
        assert_eq!(records[1].line, 3);
    }

    #[test]
    fn crlf_and_missing_trailing_newline() {
        let records = read_all("a,b\r\nc,d").unwrap();
        assert_eq!(records[0].fields, vec!["a", "b"]);
        assert_eq!(records[1].fields, vec!["c", "d"]);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let records = read_all("a,b\n\n\r\nc,d\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].line, 4);
    }

    #[test]
    fn empty_fields_survive() {
        let records = read_all(",,\n\"\",x,\n").unwrap();
        assert_eq!(records[0].fields, vec!["", "", ""]);
        assert_eq!(records[1].fields, vec!["", "x", ""]);
    }

    #[test]
    fn unterminated_quote_is_malformed() {
        let err = read_all("\"abc,true,false\n").unwrap_err();
        assert_eq!(err.code(), "PWF-2001");
    }

    #[test]
    fn bare_quote_is_malformed() {
        let err = read_all("ab\"c,true,false\n").unwrap_err();
        assert!(err.to_string().contains("bare quote"), "{err}");
    }

    #[test]
    fn garbage_after_closing_quote_is_malformed() {
        let err = read_all("\"ab\"c,true,false\n").unwrap_err();
        assert!(err.to_string().contains("after closing quote"), "{err}");
    }

    #[test]
    fn unquoted_and_quoted_lines_interleave() {
        let records = read_all("a\rb,true,false\r\n\"c,d\",false,false\ne,f\r").unwrap();
        assert_eq!(records[0].fields, vec!["a\rb", "true", "false"]);
        assert_eq!(records[1].fields, vec!["c,d", "false", "false"]);
        assert_eq!(records[2].fields, vec!["e", "f\r"]);
        assert_eq!(records[2].line, 3);
    }

    #[test]
    fn empty_input_has_no_records() {
        assert!(read_all("").unwrap().is_empty());
    }
}
