//! Error types shared across the extraction engine.
//!
//! A scan distinguishes between three ways a recognized block can fail and
//! plain I/O trouble. Inconsistent attribute values are never errors; they
//! are reported through [`crate::diagnostics::Diagnostics`] instead.

use thiserror::Error;

/// Errors raised while scanning a log file.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The input ended while a block parser still expected more lines.
    ///
    /// At the top of the scan loop this is the normal end of the file; out
    /// of a block parser it is fatal, because the block has no terminator.
    #[error("unexpected end of input")]
    EndOfInput,

    /// A recognized block did not have the layout its parser requires.
    #[error("malformed {block} block near line {line}: {reason}")]
    MalformedBlock {
        /// Name of the block being parsed.
        block: &'static str,
        /// 1-based number of the last line read.
        line: u64,
        /// What was wrong with the text.
        reason: String,
    },

    /// A block fired before the state it depends on was established.
    ///
    /// The engine never guesses a default for a missing precondition; the
    /// scan aborts and whatever was extracted so far is returned.
    #[error("{block} block requires {missing}, which has not been seen yet")]
    MissingPrecondition {
        /// Name of the block being parsed.
        block: &'static str,
        /// The attribute or flag that should have been set earlier.
        missing: &'static str,
    },

    /// I/O error from the underlying reader.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A unit conversion was requested across unit families.
    #[error(transparent)]
    Unit(#[from] crate::units::UnitError),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ParseError>;
