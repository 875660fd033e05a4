//! Single-pass rule dispatch over a log file.
//!
//! A program-specific parser is a bag of mutable state plus an ordered
//! table of [`Rule`]s. [`run_rules`] pulls one line at a time from a
//! [`LogCursor`] and offers it to every rule in table order; a rule whose
//! trigger matches gets to run its handler, which may consume further
//! lines through the cursor. Lines consumed inside a handler are gone:
//! they are never re-offered to other rules, which is what makes a single
//! forward pass sufficient.

use crate::cursor::LogCursor;
use crate::data::CcData;
use crate::diagnostics::Diagnostic;
use crate::error::{ParseError, Result};

/// What the dispatch loop should do after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Offer the trigger line to the remaining rules in the table.
    Continue,
    /// Stop matching this line and move on to the next one.
    SkipRest,
}

/// One trigger/handler pair in a parser's dispatch table.
///
/// `hit` is a cheap predicate evaluated against the raw line; `run` is
/// only called when it returns true. Handlers receive the trigger line
/// and the cursor, and advance the cursor past whatever block the
/// trigger announces.
pub struct Rule<P> {
    /// Name used in trace logging.
    pub name: &'static str,
    /// Trigger predicate on the raw line.
    pub hit: fn(&str) -> bool,
    /// Handler run when the trigger matches.
    pub run: fn(&mut P, &str, &mut LogCursor<'_>) -> Result<Dispatch>,
}

/// Drives `parser` over the whole input.
///
/// Every line is offered to the rules in table order. Reaching the end
/// of input between lines is the normal way a scan ends; reaching it
/// inside a handler surfaces as [`ParseError::EndOfInput`] from that
/// handler, because a block the log announced was cut short.
pub fn run_rules<P>(parser: &mut P, rules: &[Rule<P>], cursor: &mut LogCursor<'_>) -> Result<()> {
    loop {
        let line = match cursor.next_line() {
            Ok(line) => line,
            Err(ParseError::EndOfInput) => return Ok(()),
            Err(err) => return Err(err),
        };
        for rule in rules {
            if (rule.hit)(&line) {
                log::debug!("line {}: rule `{}` fired", cursor.line_number(), rule.name);
                match (rule.run)(parser, &line, cursor)? {
                    Dispatch::Continue => {}
                    Dispatch::SkipRest => break,
                }
            }
        }
    }
}

/// Result of scanning one log file.
///
/// Extraction is best-effort: whatever was collected before a fatal
/// error is kept, with the error recorded alongside it.
#[derive(Debug)]
pub struct ParseOutput {
    /// Attributes extracted from the log.
    pub data: CcData,
    /// Non-fatal events recorded during the scan.
    pub diagnostics: Vec<Diagnostic>,
    /// Fatal error that stopped the scan early, if any.
    pub failure: Option<ParseError>,
}

impl ParseOutput {
    /// True when the scan ran through the whole file without a fatal error.
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[derive(Default)]
    struct Tally {
        alphas: usize,
        any: usize,
        consumed: Vec<String>,
    }

    const RULES: &[Rule<Tally>] = &[
        Rule {
            name: "alpha",
            hit: |line| line.starts_with("ALPHA"),
            run: |tally, _line, _cursor| {
                tally.alphas += 1;
                Ok(Dispatch::Continue)
            },
        },
        Rule {
            name: "block",
            hit: |line| line.starts_with("BLOCK"),
            run: |tally, _line, cursor| {
                tally.consumed.push(cursor.next_line()?);
                Ok(Dispatch::Continue)
            },
        },
        Rule {
            name: "stop",
            hit: |line| line.starts_with("STOP"),
            run: |_tally, _line, _cursor| Ok(Dispatch::SkipRest),
        },
        Rule {
            name: "any",
            hit: |_line| true,
            run: |tally, _line, _cursor| {
                tally.any += 1;
                Ok(Dispatch::Continue)
            },
        },
    ];

    fn scan(text: &str) -> (Tally, Result<()>) {
        let mut tally = Tally::default();
        let mut cursor = LogCursor::new(Cursor::new(text.to_owned()));
        let outcome = run_rules(&mut tally, RULES, &mut cursor);
        (tally, outcome)
    }

    #[test]
    fn every_rule_sees_the_trigger_line() {
        let (tally, outcome) = scan("ALPHA one\nplain\nALPHA two\n");
        assert!(outcome.is_ok());
        assert_eq!(tally.alphas, 2);
        // The catch-all rule also saw all three lines.
        assert_eq!(tally.any, 3);
    }

    #[test]
    fn lines_consumed_by_a_handler_are_not_re_offered() {
        let (tally, outcome) = scan("BLOCK\nALPHA hidden\nALPHA seen\n");
        assert!(outcome.is_ok());
        assert_eq!(tally.consumed, vec!["ALPHA hidden"]);
        // "ALPHA hidden" went to the block handler, not the alpha rule.
        assert_eq!(tally.alphas, 1);
        assert_eq!(tally.any, 2);
    }

    #[test]
    fn skip_rest_stops_matching_the_current_line() {
        let (tally, outcome) = scan("STOP\nplain\n");
        assert!(outcome.is_ok());
        // The catch-all never saw the STOP line.
        assert_eq!(tally.any, 1);
    }

    #[test]
    fn end_of_input_between_lines_ends_the_scan_cleanly() {
        let (tally, outcome) = scan("ALPHA only");
        assert!(outcome.is_ok());
        assert_eq!(tally.alphas, 1);
    }

    #[test]
    fn end_of_input_inside_a_handler_is_an_error() {
        let (_tally, outcome) = scan("BLOCK");
        assert!(matches!(outcome, Err(ParseError::EndOfInput)));
    }
}
