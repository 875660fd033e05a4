//! Typed container for every attribute the extraction engine can produce.
//!
//! One [`CcData`] value accumulates over a whole log file. Scalar attributes
//! (atom count, charge, thermochemical sums) live in `Option` slots written
//! through [`set_scalar`], which reports a diagnostic when a log prints the
//! same attribute twice with different values. Per-step attributes (SCF
//! energies, geometries, orbital sets) are plain vectors that grow as the
//! scan advances.
//!
//! Units are normalized on the way in: energies in hartree, coordinates in
//! Angstrom, vibrational frequencies in cm^-1, IR intensities in km/mol,
//! rotational constants in GHz, polarizabilities in bohr^3.

use std::collections::BTreeMap;
use std::fmt;

use nalgebra::DMatrix;
use serde::Serialize;

use crate::diagnostics::Diagnostics;

/// Spin of a molecular orbital.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Spin {
    /// Alpha (spin-up) set.
    Alpha,
    /// Beta (spin-down) set.
    Beta,
}

/// One orbital pair contributing to an electronic excitation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Excitation {
    /// Occupied orbital index (zero-based).
    pub from_mo: usize,
    /// Spin of the occupied orbital.
    pub from_spin: Spin,
    /// Virtual orbital index (zero-based).
    pub to_mo: usize,
    /// Spin of the virtual orbital.
    pub to_spin: Spin,
    /// Configuration coefficient of this pair.
    pub coeff: f64,
}

/// Angular momentum of a basis shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShellType {
    /// s shell.
    S,
    /// p shell.
    P,
    /// d shell.
    D,
    /// f shell.
    F,
    /// g shell.
    G,
}

impl ShellType {
    /// Maps a one-letter shell label to its type.
    ///
    /// `L` shells are not mapped here: the printed table lists them as a
    /// combined sp shell and the reader splits them into separate [`S`]
    /// and [`P`] entries.
    ///
    /// [`S`]: ShellType::S
    /// [`P`]: ShellType::P
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "S" => Some(ShellType::S),
            "P" => Some(ShellType::P),
            "D" => Some(ShellType::D),
            "F" => Some(ShellType::F),
            "G" => Some(ShellType::G),
            _ => None,
        }
    }
}

/// One contracted Gaussian shell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shell {
    /// Angular momentum of the shell.
    pub shell_type: ShellType,
    /// `(exponent, contraction coefficient)` pairs of the primitives.
    pub primitives: Vec<(f64, f64)>,
}

/// Electrostatic moments of the charge distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Moments {
    /// Origin of the multipole expansion in Angstrom.
    pub reference: [f64; 3],
    /// Dipole moment components in Debye.
    pub dipole: [f64; 3],
}

/// Provenance and bookkeeping for a parsed log.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Metadata {
    /// Name of the program that produced the log.
    pub package: String,
    /// Program version, normalized (e.g. `2018.r1` or `8.0+10295`).
    pub package_version: Option<String>,
    /// Version string closer to what the log itself prints.
    pub legacy_package_version: Option<String>,
    /// Methods seen in the log, in order of first appearance.
    pub methods: Vec<String>,
    /// Name of the basis set, when the printed options identify one.
    pub basis_set: Option<String>,
    /// Full point group detected for the molecule.
    pub symmetry_detected: Option<String>,
    /// Point group actually used by the calculation.
    pub symmetry_used: Option<String>,
    /// T1 diagnostic from a coupled cluster calculation.
    pub t1_diagnostic: Option<f64>,
    /// Whether the log ends with a normal-termination banner.
    pub success: bool,
}

impl Metadata {
    /// Records the program version. The first banner in the file wins;
    /// later banners (e.g. a host program echoing the version of the
    /// engine it wraps) are ignored.
    pub fn note_version(&mut self, version: impl Into<String>, legacy: impl Into<String>) {
        if self.package_version.is_none() {
            self.package_version = Some(version.into());
            self.legacy_package_version = Some(legacy.into());
        }
    }

    /// Appends a method name unless it is already listed.
    pub fn note_method(&mut self, method: &str) {
        if !self.methods.iter().any(|m| m == method) {
            self.methods.push(method.to_owned());
        }
    }
}

/// Everything extracted from one log file.
///
/// Fields mirror the attribute names long established for this kind of
/// data; a field is `None` (or empty) when the log never printed the
/// corresponding block.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct CcData {
    /// Provenance and bookkeeping.
    pub metadata: Metadata,

    /// Number of atoms.
    pub natom: Option<usize>,
    /// Net charge of the system.
    pub charge: Option<i32>,
    /// Spin multiplicity.
    pub mult: Option<u32>,
    /// Atomic numbers, one per atom.
    pub atomnos: Option<Vec<u32>>,
    /// Atomic masses in amu, one per atom.
    pub atommasses: Option<Vec<f64>>,
    /// Core electrons replaced by an effective potential, one per atom.
    pub coreelectrons: Option<Vec<u32>>,
    /// Coordinates in Angstrom for each geometry in the log, one
    /// `[x, y, z]` per atom.
    pub atomcoords: Vec<Vec<[f64; 3]>>,

    /// Number of basis functions.
    pub nbasis: Option<usize>,
    /// Number of molecular orbitals.
    pub nmo: Option<usize>,
    /// Index of the highest occupied orbital per spin set (zero-based).
    pub homos: Option<Vec<usize>>,

    /// Final SCF energy of each step, in hartree.
    pub scfenergies: Vec<f64>,
    /// Empirical dispersion correction of each step, in hartree.
    pub dispersionenergies: Vec<f64>,
    /// Moller-Plesset energies per step, lowest order first, in hartree.
    pub mpenergies: Vec<Vec<f64>>,
    /// Coupled cluster energies (highest level reached), in hartree.
    pub ccenergies: Vec<f64>,
    /// SCF convergence targets per SCF block.
    pub scftargets: Vec<Vec<f64>>,
    /// SCF convergence values per SCF block, one per iteration.
    pub scfvalues: Vec<Vec<f64>>,

    /// Geometry optimization targets `[maximum gradient, rms gradient]`.
    pub geotargets: Option<Vec<f64>>,
    /// Gradient measures `[maximum, rms]` for each optimization step.
    pub geovalues: Vec<[f64; 2]>,
    /// Indices into `atomcoords` where an optimization converged.
    pub optdone: Option<Vec<usize>>,

    /// Excitation energies in hartree.
    pub etenergies: Vec<f64>,
    /// Oscillator strengths of the excitations.
    pub etoscs: Vec<f64>,
    /// Symmetries of the excited states.
    pub etsyms: Vec<String>,
    /// Orbital contributions of each excited state.
    pub etsecs: Vec<Vec<Excitation>>,

    /// Vibrational frequencies in cm^-1; imaginary modes are negative.
    pub vibfreqs: Vec<f64>,
    /// IR intensities in km/mol.
    pub vibirs: Vec<f64>,
    /// Reduced masses of the normal modes in amu.
    pub vibrmasses: Vec<f64>,
    /// Raman activities.
    pub vibramans: Vec<f64>,
    /// Cartesian displacements of each normal mode, one `[x, y, z]`
    /// per atom.
    pub vibdisps: Vec<Vec<[f64; 3]>>,

    /// Orbital energies per spin set, in hartree.
    pub moenergies: Vec<Vec<f64>>,
    /// Orbital symmetry labels per spin set.
    pub mosyms: Vec<Vec<String>>,
    /// Orbital coefficients per spin set, one `nmo x nbasis` matrix each.
    pub mocoeffs: Vec<DMatrix<f64>>,
    /// Natural orbital coefficients, `nmo x nbasis`.
    pub nocoeffs: Option<DMatrix<f64>>,
    /// Natural orbital occupation numbers.
    pub nooccnos: Vec<f64>,

    /// Basis function labels, e.g. `C1_PX`.
    pub aonames: Vec<String>,
    /// Indices of the basis functions sitting on each atom.
    pub atombasis: Vec<Vec<usize>>,
    /// Contracted shells of each atom.
    pub gbasis: Vec<Vec<Shell>>,
    /// Overlap matrix in the atomic orbital basis, `nbasis x nbasis`.
    pub aooverlaps: Option<DMatrix<f64>>,

    /// Electrostatic moments (origin and dipole).
    pub moments: Option<Moments>,
    /// Static polarizability tensors in bohr^3.
    pub polarizabilities: Vec<DMatrix<f64>>,
    /// Cartesian force constant matrix, `3N x 3N` in hartree/bohr^2.
    pub hessian: Option<DMatrix<f64>>,
    /// Partial atomic charges by population analysis scheme.
    pub atomcharges: BTreeMap<String, Vec<f64>>,

    /// Temperature of the thermochemistry section in K.
    pub temperature: Option<f64>,
    /// Pressure of the thermochemistry section in atm.
    pub pressure: Option<f64>,
    /// Rotational constants in GHz for each geometry analyzed.
    pub rotconsts: Vec<Vec<f64>>,
    /// Zero-point vibrational energy in hartree.
    pub zpve: Option<f64>,
    /// Sum of electronic and thermal enthalpies in hartree.
    pub enthalpy: Option<f64>,
    /// Sum of electronic and thermal free energies in hartree.
    pub freeenergy: Option<f64>,
    /// Entropy in hartree/K.
    pub entropy: Option<f64>,
}

/// Stores `value` into an optional scalar slot.
///
/// The first write fills the slot silently. Rewriting the same value is a
/// no-op. Rewriting a different value emits one
/// [`InconsistentAttribute`](crate::diagnostics::DiagnosticKind::InconsistentAttribute)
/// diagnostic and keeps the new value, so the last occurrence in the log
/// wins.
pub fn set_scalar<T>(slot: &mut Option<T>, name: &str, value: T, diags: &mut Diagnostics)
where
    T: PartialEq + fmt::Debug,
{
    if let Some(old) = slot {
        if *old == value {
            return;
        }
        diags.inconsistent(name, old, &value);
    }
    *slot = Some(value);
}
