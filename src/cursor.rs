//! Forward-only line access to a log stream.
//!
//! All text consumption during a scan goes through [`LogCursor`]. The cursor
//! hands out one line at a time, never rewinds and never looks ahead, which
//! keeps every block parser an explicit state machine over the line stream.

use crate::error::{ParseError, Result};
use std::io::BufRead;

/// A forward-only cursor over the lines of a log file.
pub struct LogCursor<'a> {
    reader: Box<dyn BufRead + 'a>,
    line: u64,
}

impl<'a> LogCursor<'a> {
    /// Wraps a buffered reader. Works for files and in-memory text alike.
    pub fn new<R: BufRead + 'a>(reader: R) -> Self {
        LogCursor {
            reader: Box::new(reader),
            line: 0,
        }
    }

    /// Returns the next line with the trailing newline (and any `\r`)
    /// removed, or [`ParseError::EndOfInput`] once the stream is exhausted.
    pub fn next_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line)?;
        if read == 0 {
            return Err(ParseError::EndOfInput);
        }
        self.line += 1;
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }

    /// 1-based number of the last line returned by [`Self::next_line`].
    pub fn line_number(&self) -> u64 {
        self.line
    }

    /// Consumes exactly one line and returns it.
    ///
    /// The label only documents what the caller expects to throw away
    /// ("blank", "dashes", a column header); the content is not checked.
    pub fn skip_line(&mut self, what: &'static str) -> Result<String> {
        log::debug!("skipping {what} line");
        self.next_line()
    }

    /// Consumes one line per label and returns them in order.
    pub fn skip_lines(&mut self, what: &[&'static str]) -> Result<Vec<String>> {
        let mut consumed = Vec::with_capacity(what.len());
        for label in what {
            consumed.push(self.skip_line(label)?);
        }
        Ok(consumed)
    }
}

/// Fixed-column slice of a line, clamped to the text that is actually there.
///
/// Program output aligns many quantities by column rather than by token, so
/// triggers compare slices like `field(line, 1, 12)` against literal text.
/// Lines shorter than the requested range yield the available tail or `""`;
/// the function never panics.
pub fn field(line: &str, start: usize, end: usize) -> &str {
    let bytes = line.as_bytes();
    let end = end.min(bytes.len());
    if start >= end {
        return "";
    }
    std::str::from_utf8(&bytes[start..end]).unwrap_or("")
}
