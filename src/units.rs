//! Unit conversion for quantities extracted from program output.
//!
//! The extraction code normalizes everything it stores: energies to hartree,
//! lengths to Angstrom, IR intensities to km/mol. Each [`Unit`] belongs to a
//! family and [`convert`] only moves values within one family; asking for a
//! cross-family conversion is an error rather than a silent wrong answer.

use thiserror::Error;

/// Bohr radius in Angstrom.
pub const BOHR_TO_ANGSTROM: f64 = 0.529177210903;
/// One hartree in electronvolt.
pub const HARTREE_TO_EV: f64 = 27.211386245988;
/// One hartree in kcal/mol.
pub const HARTREE_TO_KCAL_PER_MOL: f64 = 627.509474063;
/// One hartree in kJ/mol.
pub const HARTREE_TO_KJ_PER_MOL: f64 = 2625.4996394799;
/// One hartree in wavenumbers (cm^-1).
pub const HARTREE_TO_WAVENUMBER: f64 = 219474.6313632;
/// IR intensity: one Debye^2/(amu Angstrom^2) in km/mol.
pub const DEBYE2_PER_AMU_ANGSTROM2_TO_KM_PER_MOL: f64 = 42.255;

/// Units understood by [`convert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// Atomic unit of energy.
    Hartree,
    /// Electronvolt.
    ElectronVolt,
    /// Spectroscopic wavenumber, cm^-1.
    Wavenumber,
    /// Kilocalorie per mole.
    KcalPerMol,
    /// Kilojoule per mole.
    KjPerMol,
    /// Atomic unit of length.
    Bohr,
    /// Angstrom.
    Angstrom,
    /// IR intensity as printed by vibrational analyses.
    DebyeSqPerAmuAngstromSq,
    /// IR intensity in km/mol.
    KmPerMol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Energy,
    Length,
    IrIntensity,
}

impl Unit {
    fn family(self) -> Family {
        match self {
            Unit::Hartree | Unit::ElectronVolt | Unit::Wavenumber | Unit::KcalPerMol
            | Unit::KjPerMol => Family::Energy,
            Unit::Bohr | Unit::Angstrom => Family::Length,
            Unit::DebyeSqPerAmuAngstromSq | Unit::KmPerMol => Family::IrIntensity,
        }
    }

    // Factor from this unit to its family base (hartree, Angstrom, km/mol).
    fn to_base(self) -> f64 {
        match self {
            Unit::Hartree => 1.0,
            Unit::ElectronVolt => 1.0 / HARTREE_TO_EV,
            Unit::Wavenumber => 1.0 / HARTREE_TO_WAVENUMBER,
            Unit::KcalPerMol => 1.0 / HARTREE_TO_KCAL_PER_MOL,
            Unit::KjPerMol => 1.0 / HARTREE_TO_KJ_PER_MOL,
            Unit::Bohr => BOHR_TO_ANGSTROM,
            Unit::Angstrom => 1.0,
            Unit::DebyeSqPerAmuAngstromSq => DEBYE2_PER_AMU_ANGSTROM2_TO_KM_PER_MOL,
            Unit::KmPerMol => 1.0,
        }
    }
}

/// Error for conversions that make no physical sense.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitError {
    /// The two units measure different kinds of quantity.
    #[error("cannot convert {from:?} to {to:?}: different unit families")]
    FamilyMismatch {
        /// Source unit.
        from: Unit,
        /// Target unit.
        to: Unit,
    },
}

/// Converts `value` from one unit to another within the same family.
///
/// The conversion is the identity when `from == to`.
pub fn convert(value: f64, from: Unit, to: Unit) -> Result<f64, UnitError> {
    if from.family() != to.family() {
        return Err(UnitError::FamilyMismatch { from, to });
    }
    if from == to {
        return Ok(value);
    }
    Ok(value * from.to_base() / to.to_base())
}
