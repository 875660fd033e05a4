#![deny(missing_docs)]

//! ccparse - Computational Chemistry Log File Extraction
//!
//! ccparse reads the text output of quantum chemistry packages and turns it
//! into typed, program-independent data. This crate covers the GAMESS family:
//! GAMESS(US), PC GAMESS and Firefly.
//!
//! # Overview
//!
//! A quantum chemistry log is a long, loosely structured text stream in which
//! results appear as recognizable blocks: geometries, SCF iteration tables,
//! orbital eigenvectors, vibrational analyses, thermochemistry summaries. The
//! reader makes a single forward pass over the file and dispatches each line
//! against an ordered trigger table; a matching rule consumes the lines of
//! its block and fills the corresponding fields of [`CcData`].
//!
//! Extracted quantities follow fixed conventions regardless of what the
//! program printed:
//! - energies in hartree, coordinates in Angstrom
//! - orbital and atom indices zero-based
//! - vectors indexed over optimization steps or vibrational modes
//! - matrices as [`nalgebra`] types with rows over molecular orbitals
//!
//! # Quick Start
//!
//! ```no_run
//! use ccparse::Gamess;
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let file = File::open("water.log")?;
//!     let output = Gamess::parse(BufReader::new(file));
//!
//!     if let Some(energy) = output.data.scfenergies.last() {
//!         println!("final SCF energy: {energy} hartree");
//!     }
//!     for note in &output.diagnostics {
//!         eprintln!("{note}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! Log files are frequently truncated by killed jobs and full disks, so a
//! scan never panics on bad input. Everything extracted before a fatal
//! problem survives in [`ParseOutput::data`], the problem itself lands in
//! [`ParseOutput::failure`], and recoverable oddities (conflicting values,
//! skipped blocks) are collected as [`Diagnostic`] entries. A log that was
//! read to the end and carries the termination stamp reports
//! `metadata.success`.
//!
//! # Modules
//!
//! - [`gamess`](gamess/index.html) - the GAMESS/Firefly trigger table and handlers
//! - [`data`](data/index.html) - the extracted attributes
//! - [`scan`](scan/index.html) - the line dispatch loop
//! - [`cursor`](cursor/index.html) - buffered line access with lookahead helpers
//! - [`units`](units/index.html) - unit conversions
//! - [`diagnostics`](diagnostics/index.html) - non-fatal event reporting
//! - [`error`](error/index.html) - fatal scan errors

/// Buffered line reading over a log file.
pub mod cursor;
pub mod data;
/// Non-fatal events collected during a scan.
pub mod diagnostics;
pub mod error;
pub mod gamess;
pub mod scan;
/// Conversion factors between the units found in log files.
pub mod units;

pub use data::CcData;
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use error::ParseError;
pub use gamess::Gamess;
pub use scan::ParseOutput;
