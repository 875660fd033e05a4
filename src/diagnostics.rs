//! Collected warnings and notes from a scan.
//!
//! Block parsers report anything unusual here and move on; nothing reads the
//! sink back during the scan. The accumulated entries ride out with the
//! final result so a caller can inspect them without scraping logs, and
//! every entry is also forwarded to the [`log`] facade as it is recorded.

use serde::Serialize;
use std::fmt;

/// Classification of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// A scalar attribute was printed twice with different values; the
    /// later value replaced the earlier one.
    InconsistentAttribute,
    /// A recognized block was malformed in a known way and was skipped or
    /// truncated instead of aborting the scan.
    SkippedBlock,
    /// Informational remark, usually quoting advisory text from the log.
    Note,
}

/// One warning or note produced during a scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// What kind of event this records.
    pub kind: DiagnosticKind,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// One-way sink for diagnostics, in order of emission.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning-level diagnostic.
    pub fn warn(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        self.entries.push(Diagnostic { kind, message });
    }

    /// Records an informational note.
    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{message}");
        self.entries.push(Diagnostic {
            kind: DiagnosticKind::Note,
            message,
        });
    }

    /// Records the attribute-overwrite warning emitted when a value that was
    /// already extracted shows up again with different content.
    pub fn inconsistent<T: fmt::Debug + ?Sized>(&mut self, attribute: &str, old: &T, new: &T) {
        self.warn(
            DiagnosticKind::InconsistentAttribute,
            format!("attribute {attribute} changed value ({old:?} -> {new:?})"),
        );
    }

    /// Entries recorded so far.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Consumes the sink, yielding the entries.
    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_entries_in_order() {
        let mut diags = Diagnostics::new();
        diags.info("first");
        diags.warn(DiagnosticKind::SkippedBlock, "second");
        let kinds: Vec<_> = diags.entries().iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DiagnosticKind::Note, DiagnosticKind::SkippedBlock]);
    }

    #[test]
    fn inconsistent_formats_both_values() {
        let mut diags = Diagnostics::new();
        diags.inconsistent("charge", &-1, &0);
        let entry = &diags.entries()[0];
        assert_eq!(entry.kind, DiagnosticKind::InconsistentAttribute);
        assert!(entry.message.contains("charge"));
        assert!(entry.message.contains("-1"));
    }
}
