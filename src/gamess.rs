//! Reader for GAMESS(US), PC GAMESS and Firefly log files.
//!
//! The whole file is consumed in a single forward pass. Every line is
//! offered to the [`RULES`] table in order; a rule whose trigger matches
//! gets the cursor and may consume the lines of its block before the scan
//! moves on. State that spans blocks (convergence targets, the CI
//! Hamiltonian flavor, whether the first standard orientation was seen)
//! lives on the [`Gamess`] struct between dispatches.

use std::io::BufRead;

use lazy_static::lazy_static;
use nalgebra::DMatrix;
use regex::Regex;

use crate::cursor::{field, LogCursor};
use crate::data::{set_scalar, CcData, Excitation, Moments, Shell, ShellType, Spin};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{ParseError, Result};
use crate::scan::{run_rules, Dispatch, ParseOutput, Rule};
use crate::units::{convert, Unit};

lazy_static! {
    // * Firefly version 8.0.1, build number 10295 *
    static ref FIREFLY_VERSION_RE: Regex =
        Regex::new(r"Firefly version\s([\d.]*)\D*(\d*)\s*\*").unwrap();
    // CI-SINGLES EXCITATION ENERGIES / TDDFT EXCITATION ENERGIES
    static ref EXCITATION_HEADER_RE: Regex =
        Regex::new(r"^(CI-SINGLES|TDDFT) EXCITATION ENERGIES").unwrap();
    // The numbered column header over each group of normal modes. Newer
    // builds indent it by 28 blanks, older ones by 26.
    static ref MODE_COLUMNS_RE: Regex = Regex::new(r" {26,}1").unwrap();
    // 56  C  12  XXZ (orbital number, element, atom number, orbital label)
    static ref AO_LABEL_RE: Regex =
        Regex::new(r"(\d+)\s*([A-Z][A-Z]?)\s*(\d+)\s*([A-Z]+)").unwrap();
    static ref TEMPERATURE_RE: Regex = Regex::new(r"THERMOCHEMISTRY AT T=(.*)K").unwrap();
    static ref PRESSURE_RE: Regex = Regex::new(r"P=(.*)PASCAL\.").unwrap();
}

/// Basis names printed as `GBASIS=` tokens for the correlation-consistent
/// (Dunning) families.
fn dunning_basis(token: &str) -> Option<&'static str> {
    let name = match token {
        "CCD" => "cc-pVDZ",
        "CCT" => "cc-pVTZ",
        "CCQ" => "cc-pVQZ",
        "CC5" => "cc-pV5Z",
        "CC6" => "cc-pV6Z",
        "ACCD" => "aug-cc-pVDZ",
        "ACCT" => "aug-cc-pVTZ",
        "ACCQ" => "aug-cc-pVQZ",
        "ACC5" => "aug-cc-pV5Z",
        "ACC6" => "aug-cc-pV6Z",
        "CCDC" => "cc-pCVDZ",
        "CCTC" => "cc-pCVTZ",
        "CCQC" => "cc-pCVQZ",
        "CC5C" => "cc-pCV5Z",
        "CC6C" => "cc-pCV6Z",
        "ACCDC" => "aug-cc-pCVDZ",
        "ACCTC" => "aug-cc-pCVTZ",
        "ACCQC" => "aug-cc-pCVQZ",
        "ACC5C" => "aug-cc-pCV5Z",
        "ACC6C" => "aug-cc-pCV6Z",
        _ => return None,
    };
    Some(name)
}

/// Which CI Hamiltonian the CIS section was run with. With determinants,
/// alpha and beta excitations are listed separately and rows may carry a
/// `BETA` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CiHamiltonian {
    Unset,
    Saps,
    Dets,
}

/// Stateful reader for one GAMESS-family log file.
///
/// Use [`Gamess::parse`]; the struct itself only carries the scan state.
pub struct Gamess {
    data: CcData,
    diags: Diagnostics,
    /// The first standard orientation replaces the input orientation.
    first_stdorient: bool,
    ci_hamiltonian: CiHamiltonian,
    /// Text before " SCF CALCULATION" in the last SCF banner (RHF, ROHF-GVB, ...).
    scf_type: String,
    /// Column of the total energy in the iteration table; ROHF prints one less.
    scf_value_column: Option<usize>,
}

impl Gamess {
    fn new() -> Self {
        let mut data = CcData::default();
        data.metadata.package = "GAMESS".to_owned();
        Gamess {
            data,
            diags: Diagnostics::new(),
            first_stdorient: true,
            ci_hamiltonian: CiHamiltonian::Unset,
            scf_type: String::new(),
            scf_value_column: None,
        }
    }

    /// Scans a whole log from `reader`.
    ///
    /// The scan never aborts silently: an unreadable block stops it and the
    /// error lands in [`ParseOutput::failure`] next to everything that was
    /// extracted before the failure point.
    pub fn parse<R: BufRead>(reader: R) -> ParseOutput {
        let mut cursor = LogCursor::new(reader);
        let mut gamess = Gamess::new();
        let failure = run_rules(&mut gamess, RULES, &mut cursor).err();
        if let Some(err) = &failure {
            log::error!("scan stopped at line {}: {err}", cursor.line_number());
        }
        ParseOutput {
            data: gamess.data,
            diagnostics: gamess.diags.into_entries(),
            failure,
        }
    }

    fn require_natom(&self, block: &'static str) -> Result<usize> {
        self.data.natom.ok_or(ParseError::MissingPrecondition {
            block,
            missing: "natom",
        })
    }

    fn require_nbasis(&self, block: &'static str) -> Result<usize> {
        self.data.nbasis.ok_or(ParseError::MissingPrecondition {
            block,
            missing: "nbasis",
        })
    }

    // * Firefly version 8.0.1, build number 10295 *
    //
    // A Firefly log carries the original GAMESS banner too, further down,
    // so the Firefly version is assigned unconditionally and the GAMESS
    // banner below defers to it.
    fn firefly_version(&mut self, line: &str, _cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        if let Some(caps) = FIREFLY_VERSION_RE.captures(line) {
            let base = &caps[1];
            let build = &caps[2];
            self.data.metadata.package_version = Some(format!("{base}+{build}"));
            self.data.metadata.legacy_package_version = Some(base.to_owned());
        }
        Ok(Dispatch::Continue)
    }

    // *         GAMESS VERSION =  1 MAY 2013 (R1)          *
    //
    // The (Rn) token is missing for the first release of a year, in which
    // case the second-to-last token is the year itself.
    fn gamess_version(&mut self, line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "version banner";
        if self.data.metadata.package_version.is_some() {
            return Ok(Dispatch::Continue);
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 7 {
            return Err(malformed(BLOCK, cursor, "banner has too few fields"));
        }
        let year = tokens[6];
        let possible_release = tokens[tokens.len() - 2];
        let release = if possible_release == year {
            "1"
        } else {
            // (R23) -> 23
            possible_release
                .get(2..possible_release.len().saturating_sub(1))
                .ok_or_else(|| {
                    malformed(
                        BLOCK,
                        cursor,
                        format!("unrecognized release token {possible_release:?}"),
                    )
                })?
        };
        self.data
            .metadata
            .note_version(format!("{year}.r{release}"), format!("{year}R{release}"));
        Ok(Dispatch::Continue)
    }

    // Echoed input lines can contain anything, including text that looks
    // like a real trigger, so nothing else may match on them.
    fn input_echo(&mut self, _line: &str, _cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        Ok(Dispatch::SkipRest)
    }

    //  SCFTYP=RHF          RUNTYP=OPTIMIZE    EXETYP=RUN
    fn scf_method(&mut self, line: &str, _cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        if let Some(first) = line.split_whitespace().next() {
            let method = first.get(7..).unwrap_or("");
            if self.data.metadata.methods.is_empty() && !method.is_empty() {
                self.data.metadata.note_method(method);
            }
        }
        Ok(Dispatch::Continue)
    }

    //      GBASIS=N31          IGAUSS=       6      POLAR=POPN31
    //
    // Pople sets need a look at the next lines of the $BASIS echo to learn
    // whether diffuse or extra polarization functions were requested.
    fn basis_name(&mut self, line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let name = tokens
            .first()
            .and_then(|first| first.get(7..))
            .unwrap_or("");

        if let Some(dunning) = dunning_basis(name) {
            self.data.metadata.basis_set = Some(dunning.to_owned());
            return Ok(Dispatch::Continue);
        }

        if name == "PM3" || name == "AM1" {
            self.data.metadata.note_method(name);
        }

        let igauss = tokens.get(2).copied().unwrap_or("");
        let polar = tokens.get(3).copied().unwrap_or("");
        match name {
            "STO" => {
                let set = match igauss {
                    "2" => Some("STO-2G"),
                    "3" => Some("STO-3G"),
                    "4" => Some("STO-4G"),
                    "5" => Some("STO-5G"),
                    _ => None,
                };
                if let Some(set) = set {
                    self.data.metadata.basis_set = Some(set.to_owned());
                }
            }
            "N21" => {
                let set = match (igauss, polar) {
                    ("3", "POLAR=COMMON") => Some("3-21G*"),
                    ("3", "POLAR=NONE") => Some("3-21G"),
                    ("4", "POLAR=NONE") => Some("4-21G"),
                    ("6", "POLAR=NONE") => Some("6-21G"),
                    _ => None,
                };
                if let Some(set) = set {
                    self.data.metadata.basis_set = Some(set.to_owned());
                }
            }
            "N31" => {
                if igauss == "6" && (polar == "POLAR=POPN31" || polar == "POLAR=POPLE") {
                    self.data.metadata.basis_set = Some("6-31G*".to_owned());
                    let set = pople_variant("6-31", cursor)?;
                    self.data.metadata.basis_set = Some(set);
                } else if igauss == "6" && polar == "POLAR=NONE" {
                    self.data.metadata.basis_set = Some("6-31G".to_owned());
                } else if igauss == "4" && polar == "POLAR=NONE" {
                    self.data.metadata.basis_set = Some("4-31G".to_owned());
                } else if igauss == "4" && polar == "POLAR=POPN31" {
                    self.data.metadata.basis_set = Some("4-31G*".to_owned());
                }
            }
            "N311" => {
                if igauss == "6" && polar == "POLAR=POPN311" {
                    self.data.metadata.basis_set = Some("6-311G*".to_owned());
                    let set = pople_variant("6-311", cursor)?;
                    self.data.metadata.basis_set = Some(set);
                } else if igauss == "6" && polar == "POLAR=NONE" {
                    self.data.metadata.basis_set = Some("6-311G".to_owned());
                }
            }
            _ => {}
        }
        Ok(Dispatch::Continue)
    }

    //  THE POINT GROUP OF THE MOLECULE IS CNV
    //  THE ORDER OF THE PRINCIPAL AXIS IS     2
    fn point_group(&mut self, line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "point group";
        let pg = rtoken(line, 0, BLOCK, cursor)?.to_owned();
        let order_line = cursor.next_line()?;
        let order = rtoken(&order_line, 0, BLOCK, cursor)?;
        let full = pg.replace('N', order).to_lowercase();
        self.data.metadata.symmetry_detected = Some(full.clone());
        self.data.metadata.symmetry_used = Some(full);
        Ok(Dispatch::Continue)
    }

    fn symmetry_subspaces(&mut self, _line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        cursor.skip_line("irreducible representation dimensions")?;
        Ok(Dispatch::Continue)
    }

    //           OPTTOL = 1.000E-04          RMIN   = 1.500E-03
    //
    // OPTTOL is the threshold on the largest gradient component; the rms
    // gradient must fall below a third of it.
    fn geometry_targets(&mut self, line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "geometry search targets";
        if self.data.geotargets.is_none() {
            let opttol = float_at(line, 2, BLOCK, cursor)?;
            self.data.geotargets = Some(vec![opttol, opttol / 3.0]);
        }
        Ok(Dispatch::Continue)
    }

    //  FINAL R-B3LYP ENERGY IS     -382.0507446475 AFTER  10 ITERATIONS
    fn final_energy(&mut self, line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "final energy";
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let pos = tokens
            .iter()
            .position(|t| *t == "IS")
            .ok_or_else(|| malformed(BLOCK, cursor, "no IS token on the FINAL energy line"))?;
        let value = tokens
            .get(pos + 1)
            .ok_or_else(|| malformed(BLOCK, cursor, "nothing after the IS token"))?;
        self.data.scfenergies.push(parse_f64(value, BLOCK, cursor)?);
        Ok(Dispatch::Continue)
    }

    fn dispersion_energy(&mut self, line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "dispersion energy";
        let value = float_back(line, 0, BLOCK, cursor)?;
        self.data.dispersionenergies.push(value);
        Ok(Dispatch::Continue)
    }

    //       E(MP2)=      -286.7247480864
    //
    // PC GAMESS also prints third and fourth order corrections; only the
    // highest MP4 flavor (SDQ or SDTQ) is kept. An optimization prints one
    // such block per step.
    fn mp_energies(&mut self, _line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "Moller-Plesset energies";
        let mut line = cursor.next_line()?;
        if line.contains("END OF INTEGRAL TRANSFORMATION") {
            return Ok(Dispatch::Continue);
        }
        self.data.mpenergies.push(Vec::new());
        while !line.contains("DONE WITH MP") {
            match line.split_whitespace().next() {
                Some("E(MP2)=") => {
                    self.data.metadata.note_method("MP2");
                    let value = float_at(&line, 1, BLOCK, cursor)?;
                    if let Some(bucket) = self.data.mpenergies.last_mut() {
                        bucket.push(value);
                    }
                }
                Some("E(MP2)") => {
                    let value = float_at(&line, 2, BLOCK, cursor)?;
                    if let Some(bucket) = self.data.mpenergies.last_mut() {
                        bucket.push(value);
                    }
                }
                Some("E(MP3)") => {
                    self.data.metadata.note_method("MP3");
                    let value = float_at(&line, 2, BLOCK, cursor)?;
                    if let Some(bucket) = self.data.mpenergies.last_mut() {
                        bucket.push(value);
                    }
                }
                Some("E(MP4-SDQ)") | Some("E(MP4-SDTQ)") => {
                    self.data.metadata.note_method("MP4");
                    let value = float_at(&line, 2, BLOCK, cursor)?;
                    if let Some(bucket) = self.data.mpenergies.last_mut() {
                        bucket.push(value);
                    }
                }
                _ => {}
            }
            line = cursor.next_line()?;
        }
        Ok(Dispatch::Continue)
    }

    fn ccd_energy(&mut self, line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "coupled cluster energy";
        self.data.metadata.note_method("CCD");
        let value = float_at(line, 2, BLOCK, cursor)?;
        self.data.ccenergies.push(value);
        Ok(Dispatch::Continue)
    }

    //             CCSD    ENERGY: -76.3456789012   CORR. E:  -0.2345678901
    //
    // The [T] and (T) corrections follow on the next lines when computed;
    // only the highest level reached is recorded.
    fn ccsd_energy(&mut self, line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "coupled cluster energy";
        self.data.metadata.note_method("CCSD");
        let mut energy = float_at(line, 2, BLOCK, cursor)?;
        let next = cursor.next_line()?;
        if field(&next, 8, 23) == "CCSD[T] ENERGY:" {
            self.data.metadata.note_method("CCSD[T]");
            energy = float_at(&next, 2, BLOCK, cursor)?;
            let next = cursor.next_line()?;
            if field(&next, 8, 23) == "CCSD(T) ENERGY:" {
                self.data.metadata.note_method("CCSD(T)");
                energy = float_at(&next, 2, BLOCK, cursor)?;
            }
        }
        self.data.ccenergies.push(energy);
        Ok(Dispatch::Continue)
    }

    fn t1_diagnostic(&mut self, line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "T1 diagnostic";
        self.data.metadata.t1_diagnostic = Some(float_at(line, 3, BLOCK, cursor)?);
        Ok(Dispatch::Continue)
    }

    // MP2 energies printed ahead of a coupled cluster run.
    fn mbpt2_energy(&mut self, line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "MBPT(2) energy";
        let value = float_at(line, 2, BLOCK, cursor)?;
        self.data.mpenergies.push(vec![value]);
        Ok(Dispatch::Continue)
    }

    //  CHARGE OF MOLECULE        =    0
    //  SPIN MULTIPLICITY         =    1
    fn charge_and_mult(&mut self, line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "charge and multiplicity";
        let charge = float_back(line, 0, BLOCK, cursor)?.round() as i32;
        set_scalar(&mut self.data.charge, "charge", charge, &mut self.diags);
        let mult_line = cursor.next_line()?;
        let mult = rtoken(&mult_line, 0, BLOCK, cursor)?
            .parse::<u32>()
            .map_err(|_| malformed(BLOCK, cursor, "multiplicity is not an integer"))?;
        set_scalar(&mut self.data.mult, "mult", mult, &mut self.diags);
        Ok(Dispatch::Continue)
    }

    //                     CI-SINGLES EXCITATION ENERGIES
    //  STATE       HARTREE        EV      KCAL/MOL       CM-1         NM
    //  ---------------------------------------------------------------------
    //   1A''   0.1677341781     4.5643    105.2548      36813.40     271.64
    //
    // The hartree column has the most digits, so it is the one recorded.
    // Oscillator strengths are only in this table for some Hamiltonians;
    // otherwise they come from the transition blocks further down.
    fn excitation_table(&mut self, _line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "excitation energy table";
        let header = cursor.next_line()?;
        let get_etosc = header.trim_end().ends_with("OSC. STR.");
        if get_etosc {
            self.data.etoscs.clear();
        }
        cursor.skip_line("dashes")?;
        let mut row = cursor.next_line()?;
        while !row.trim().is_empty() {
            let energy = float_at(&row, 1, BLOCK, cursor)?;
            self.data.etenergies.push(energy);
            if get_etosc {
                let osc = float_back(&row, 0, BLOCK, cursor)?;
                self.data.etoscs.push(osc);
            }
            row = cursor.next_line()?;
        }
        Ok(Dispatch::Continue)
    }

    fn saps_hamiltonian(&mut self, _line: &str, _cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        self.ci_hamiltonian = CiHamiltonian::Saps;
        Ok(Dispatch::Continue)
    }

    fn dets_hamiltonian(&mut self, _line: &str, _cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        self.ci_hamiltonian = CiHamiltonian::Dets;
        Ok(Dispatch::Continue)
    }

    //  EXCITED STATE   1  ENERGY=      0.1677341781  S =  0.0  SPACE SYM = A''
    //
    // Contribution rows follow a short header and end at a dashed line.
    // With the determinant Hamiltonian both spins are listed and beta rows
    // are marked; with SAPS everything is alpha.
    fn excited_state_contribs(&mut self, line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "excited state contributions";
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let spin_token = tokens
            .get(7)
            .ok_or_else(|| malformed(BLOCK, cursor, "no spin field on the state line"))?;
        let spin = parse_f64(spin_token, BLOCK, cursor)? as i64;
        let multiplicity = match spin {
            0 => "Singlet",
            1 => "Triplet",
            _ => return Err(malformed(BLOCK, cursor, format!("unrecognized spin {spin}"))),
        };
        let label = tokens
            .last()
            .ok_or_else(|| malformed(BLOCK, cursor, "empty state line"))?;
        self.data.etsyms.push(format!("{multiplicity}-{label}"));

        cursor.skip_lines(&[
            "blank",
            "dashes",
            "excitation header",
            "from/to header",
            "dashes",
        ])?;
        let mut row = cursor.next_line()?;
        let mut contribs = Vec::new();
        while !row.trim().starts_with('-') {
            let rtokens: Vec<&str> = row.split_whitespace().collect();
            let n = rtokens.len();
            if n < 3 {
                return Err(malformed(BLOCK, cursor, "contribution row too short"));
            }
            let spin = if self.ci_hamiltonian == CiHamiltonian::Dets && rtokens[0] == "BETA" {
                Spin::Beta
            } else {
                Spin::Alpha
            };
            let from_mo = int_token(rtokens[n - 3], BLOCK, cursor)?.saturating_sub(1);
            let to_mo = int_token(rtokens[n - 2], BLOCK, cursor)?.saturating_sub(1);
            let coeff = parse_f64(rtokens[n - 1], BLOCK, cursor)?;
            contribs.push(Excitation {
                from_mo,
                from_spin: spin,
                to_mo,
                to_spin: spin,
                coeff,
            });
            row = cursor.next_line()?;
        }
        self.data.etsecs.push(contribs);
        Ok(Dispatch::Continue)
    }

    //  TRANSITION FROM THE GROUND STATE TO EXCITED STATE   1
    //
    // Spin-forbidden transitions print an OPTICALLY FORBIDDEN note on the
    // same line and carry no strength.
    fn transition_strength(&mut self, line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "transition strength";
        if line.contains("OPTICALLY") {
            return Ok(Dispatch::Continue);
        }
        cursor.skip_lines(&[
            "blank",
            "multiplicities",
            "state energies",
            "excitation energy",
            "x/y/z/norm header",
            "transition dipole (a.u.)",
            "transition dipole (debye)",
        ])?;
        let row = cursor.next_line()?;
        let strength = float_at(&row, 3, BLOCK, cursor)?;
        self.data.etoscs.push(strength);
        Ok(Dispatch::Continue)
    }

    //          -------------------
    //          TRIPLET EXCITATIONS
    //          -------------------
    //
    // STATE #   1  ENERGY =    3.027228 EV
    // OSCILLATOR STRENGTH =    0.000000
    //
    // Two table layouts exist. Around 2007 the contribution rows read
    // "35 -1.105383  35 -> 36"; since 2012 they read "35  36  -0.929190"
    // with amplitude headers. The arrow tells them apart. This section
    // restarts the transition attributes: TD-DFT logs print a separate
    // singlet and triplet section and only the last one is kept.
    fn tddft_excitations(&mut self, _line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "TD-DFT excitations";
        self.data.etenergies.clear();
        self.data.etoscs.clear();
        self.data.etsecs.clear();
        let mut etsyms: Vec<String> = Vec::new();

        cursor.skip_lines(&["dashes", "blank"])?;
        let mut line = cursor.next_line()?;
        while field(&line, 1, 6) == "STATE" {
            let energy_ev = float_back(&line, 1, BLOCK, cursor)?;
            self.data
                .etenergies
                .push(convert(energy_ev, Unit::ElectronVolt, Unit::Hartree)?);
            let osc_line = cursor.next_line()?;
            let osc = float_back(&osc_line, 0, BLOCK, cursor)?;
            self.data.etoscs.push(osc);

            // Symmetry is not always present, and newer builds add a lambda
            // diagnostic and amplitude headers.
            line = cursor.next_line()?;
            if line.contains("LAMBDA DIAGNOSTIC") {
                line = cursor.next_line()?;
            }
            if line.contains("SYMMETRY") {
                if let Some(label) = line.split_whitespace().last() {
                    etsyms.push(label.to_owned());
                }
                line = cursor.next_line()?;
            }
            if line.contains("EXCITATION") && line.contains("DE-EXCITATION") {
                line = cursor.next_line()?;
            }
            if line.matches("AMPLITUDE").count() == 2 {
                line = cursor.next_line()?;
            }
            cursor.skip_line("dashes")?;

            let mut contribs = Vec::new();
            line = cursor.next_line()?;
            while !line.trim().is_empty() {
                let cols: Vec<&str> = line.split_whitespace().collect();
                let (i_occ, i_vir, i_coeff) = if line.contains("->") {
                    (2, 4, 1)
                } else {
                    (0, 1, 2)
                };
                let from_mo = int_at(&cols, i_occ, BLOCK, cursor)?.saturating_sub(1);
                let to_mo = int_at(&cols, i_vir, BLOCK, cursor)?.saturating_sub(1);
                let coeff = parse_f64(
                    cols.get(i_coeff)
                        .ok_or_else(|| malformed(BLOCK, cursor, "contribution row too short"))?,
                    BLOCK,
                    cursor,
                )?;
                contribs.push(Excitation {
                    from_mo,
                    from_spin: Spin::Alpha,
                    to_mo,
                    to_spin: Spin::Alpha,
                    coeff,
                });
                line = cursor.next_line()?;
            }
            self.data.etsecs.push(contribs);
            line = cursor.next_line()?;
        }
        if !etsyms.is_empty() {
            self.data.etsyms = etsyms;
        }
        Ok(Dispatch::Continue)
    }

    //       MAXIMUM GRADIENT =  0.0531540    RMS GRADIENT = 0.0189223
    //
    // Older builds span two lines; FMO runs prefix a (1). Restart advice
    // text also mentions these phrases, and since it can be followed by
    // more echoed guidance, the rest of the line is not offered to any
    // other rule.
    fn gradient_step(&mut self, line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "geometry gradient";
        let parts: Vec<&str> = line.split_whitespace().collect();
        let first = parts.first().copied().unwrap_or("");
        if first != "MAXIMUM" && first != "RMS" && first != "(1)" {
            return Ok(Dispatch::SkipRest);
        }
        let (maximum, rms) = match parts.len() {
            8 => (
                parse_f64(parts[3], BLOCK, cursor)?,
                parse_f64(parts[7], BLOCK, cursor)?,
            ),
            4 => {
                let maximum = parse_f64(parts[3], BLOCK, cursor)?;
                let rms_line = cursor.next_line()?;
                let rms = float_at(&rms_line, 3, BLOCK, cursor)?;
                (maximum, rms)
            }
            9 => (
                parse_f64(parts[4], BLOCK, cursor)?,
                parse_f64(parts[8], BLOCK, cursor)?,
            ),
            n => {
                return Err(malformed(
                    BLOCK,
                    cursor,
                    format!("unexpected field count {n} on a gradient line"),
                ))
            }
        };
        self.data.geovalues.push([maximum, rms]);
        Ok(Dispatch::Continue)
    }

    //  ATOM      ATOMIC                      COORDINATES (BOHR)
    //            CHARGE         X                   Y                   Z
    //  O           8.0     0.0000000000        0.0000000000        0.0000000000
    //
    // This input orientation is all a single point provides; optimization
    // steps overwrite it with standard orientations below. Atomic numbers
    // come from the charge column, since the atom name is arbitrary.
    fn input_orientation(&mut self, _line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "input orientation";
        cursor.skip_line("column header")?;
        let mut coords: Vec<[f64; 3]> = Vec::new();
        let mut numbers: Vec<u32> = Vec::new();
        let mut line = cursor.next_line()?;
        while !line.trim().is_empty() {
            let temp: Vec<&str> = line.split_whitespace().collect();
            if temp.len() < 5 {
                return Err(malformed(BLOCK, cursor, "coordinate row too short"));
            }
            let mut xyz = [0.0f64; 3];
            for (k, text) in temp[2..5].iter().enumerate() {
                let bohr = parse_f64(text, BLOCK, cursor)?;
                xyz[k] = convert(bohr, Unit::Bohr, Unit::Angstrom)?;
            }
            coords.push(xyz);
            numbers.push(parse_f64(temp[1], BLOCK, cursor)?.round() as u32);
            line = cursor.next_line()?;
        }
        set_scalar(&mut self.data.atomnos, "atomnos", numbers, &mut self.diags);
        self.data.atomcoords.push(coords);
        Ok(Dispatch::Continue)
    }

    fn equilibrium_located(&mut self, _line: &str, _cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        let step = self.data.geovalues.len().saturating_sub(1);
        self.data.optdone.get_or_insert_with(Vec::new).push(step);
        Ok(Dispatch::Continue)
    }

    // A failed search still ends the optimization, so optdone must exist
    // (empty) even without a located equilibrium.
    fn search_not_converged(&mut self, _line: &str, _cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        self.data.optdone.get_or_insert_with(Vec::new);
        Ok(Dispatch::Continue)
    }

    //  COORDINATES OF ALL ATOMS ARE (ANGS)
    //    ATOM   CHARGE       X              Y              Z
    //  ------------------------------------------------------------
    //
    // One block per optimization cycle. Once the optimization is done the
    // final geometry is printed again and must not be collected twice.
    fn standard_orientation(&mut self, _line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "standard orientation";
        let already_done = self.data.optdone.as_ref().is_some_and(|v| !v.is_empty());
        if already_done {
            return Ok(Dispatch::Continue);
        }
        if self.first_stdorient {
            self.first_stdorient = false;
            // Replaces the single input orientation from the start of the file.
            self.data.atomcoords.clear();
        }
        cursor.skip_lines(&["column header", "dashes"])?;
        let natom = self.require_natom(BLOCK)?;
        let mut coords = Vec::with_capacity(natom);
        let mut line = cursor.next_line()?;
        for _ in 0..natom {
            let temp: Vec<&str> = line.split_whitespace().collect();
            if temp.len() < 5 {
                return Err(malformed(BLOCK, cursor, "coordinate row too short"));
            }
            coords.push([
                parse_f64(temp[2], BLOCK, cursor)?,
                parse_f64(temp[3], BLOCK, cursor)?,
                parse_f64(temp[4], BLOCK, cursor)?,
            ]);
            line = cursor.next_line()?;
        }
        self.data.atomcoords.push(coords);
        Ok(Dispatch::Continue)
    }

    //          ------------------------
    //          ROHF-GVB SCF CALCULATION
    //          ------------------------
    //     MAXIT=  30   NPUNCH= 2   SQCDF TOL=1.0000E-05
    //  ITER EX     TOTAL ENERGY       E CHANGE        SQCDF       DIIS ERROR
    //    0  0      -38.298939963   -38.298939963   0.131784454   0.000000000
    //
    // Everything before " SCF CALCULATION" names the SCF flavor. GVB runs
    // converge on SQCDF, everything else on the density change. The
    // iteration table ends at a blank line; rows that do not start with a
    // step number are status messages and are skipped.
    fn scf_block(&mut self, line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "SCF iterations";
        let trimmed = line.trim();
        self.scf_type = trimmed
            .strip_suffix(" SCF CALCULATION")
            .unwrap_or(trimmed)
            .to_owned();
        cursor.skip_line("dashes")?;

        let mut target: Option<f64> = None;
        let mut line = line.to_owned();
        while field(&line, 0, 5) != " ITER" {
            if self.scf_type.contains("GVB") && line.contains("SQCDF TOL=") {
                let text = line.split('=').last().unwrap_or("");
                target = Some(parse_f64(text, BLOCK, cursor)?);
            } else if line.contains("DENSITY CONV") || line.contains("DENSITY MATRIX CONV") {
                target = Some(float_back(&line, 0, BLOCK, cursor)?);
            }
            line = cursor.next_line()?;
        }
        let target = target
            .ok_or_else(|| malformed(BLOCK, cursor, "no convergence target before the table"))?;
        self.data.scftargets.push(vec![target]);

        // ROHF tables lack the EX column, shifting the energy left by one.
        let value_column = if self.scf_type.contains("ROHF") { 4 } else { 5 };
        self.scf_value_column = Some(value_column);

        let mut values: Vec<f64> = Vec::new();
        let mut row = cursor.next_line()?;
        while !row.trim().is_empty() {
            if field(&row, 0, 4).trim().parse::<i64>().is_ok() {
                // Beyond 99 iterations the two step counters run together,
                // so the first two columns are cut at fixed widths.
                let mut cells: Vec<&str> = vec![field(&row, 0, 4), field(&row, 4, 7)];
                cells.extend(field(&row, 7, usize::MAX).split_whitespace());
                let cell = cells
                    .get(value_column)
                    .ok_or_else(|| malformed(BLOCK, cursor, "iteration row too short"))?;
                values.push(parse_f64(cell, BLOCK, cursor)?);
            }
            row = match cursor.next_line() {
                Ok(row) => row,
                Err(ParseError::EndOfInput) => {
                    self.diags.warn(
                        DiagnosticKind::SkippedBlock,
                        "file terminated before the end of the last SCF block",
                    );
                    break;
                }
                Err(err) => return Err(err),
            };
        }
        self.data.scfvalues.push(values);
        Ok(Dispatch::Continue)
    }

    // Later cycles of some optimizations print the iteration table without
    // the banner above, so the table header itself is the trigger. The
    // convergence target is assumed unchanged.
    fn scf_continuation(&mut self, _line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "SCF continuation";
        let last_target = self
            .data
            .scftargets
            .last()
            .cloned()
            .ok_or(ParseError::MissingPrecondition {
                block: BLOCK,
                missing: "scftargets",
            })?;
        self.data.scftargets.push(last_target);
        let value_column = self
            .scf_value_column
            .ok_or(ParseError::MissingPrecondition {
                block: BLOCK,
                missing: "scf value column",
            })?;

        let mut values: Vec<f64> = Vec::new();
        let mut row = cursor.next_line()?;
        while !row.trim().is_empty() {
            if field(&row, 0, 4).trim().parse::<i64>().is_ok() {
                let tokens: Vec<&str> = row.split_whitespace().collect();
                let cell = tokens
                    .get(value_column)
                    .ok_or_else(|| malformed(BLOCK, cursor, "iteration row too short"))?;
                values.push(parse_f64(cell, BLOCK, cursor)?);
            }
            row = cursor.next_line()?;
        }
        self.data.scfvalues.push(values);
        Ok(Dispatch::Continue)
    }

    // MODES 1 TO 6 ARE TAKEN AS ROTATIONS AND TRANSLATIONS.
    //
    //                         1           2           3
    //     FREQUENCY:       825.18 I    111.53       12.62
    //  REDUCED MASS:      3.44177     2.33326     5.00348
    //  IR INTENSITY:      0.00000     0.00000     0.00000
    //
    // Frequencies come in column groups of five. An "I" column marks the
    // preceding value as imaginary and it is stored negated. The modes in
    // the startrot..endrot window are rotations and translations and are
    // cut from all vibration attributes at the end. Atomic masses and
    // stationary point warnings appear on the way to the MODES line.
    fn normal_modes(&mut self, line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "normal modes";
        self.data.vibfreqs.clear();
        self.data.vibirs.clear();
        self.data.vibdisps.clear();

        let mut line = line.to_owned();
        while !line.contains("MODES") {
            line = cursor.next_line()?;
            if line.contains("ATOMIC WEIGHTS") {
                let mut masses = Vec::new();
                cursor.skip_line("blank")?;
                let mut row = cursor.next_line()?;
                while !row.trim().is_empty() {
                    masses.push(float_at(&row, 2, BLOCK, cursor)?);
                    row = cursor.next_line()?;
                }
                set_scalar(
                    &mut self.data.atommasses,
                    "atommasses",
                    masses,
                    &mut self.diags,
                );
            }
            if line.contains("THIS IS NOT A STATIONARY POINT") {
                self.diags.warn(
                    DiagnosticKind::Note,
                    "not a stationary point on the potential energy surface; \
                     the vibrational analysis is not valid",
                );
            }
            if line.contains("* * * WARNING, MODE") {
                let first = line.trim().to_owned();
                let second = cursor.next_line()?.trim().to_owned();
                let third = cursor.next_line()?.trim().to_owned();
                self.diags
                    .warn(DiagnosticKind::Note, format!("{first} {second} {third}"));
            }
        }

        // MODES 1 TO 6 ... or, squeezed, MODES 9 TO14 ...
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let startrot = int_at(&tokens, 1, BLOCK, cursor)?;
        let to_token = tokens
            .get(2)
            .ok_or_else(|| malformed(BLOCK, cursor, "truncated MODES line"))?;
        let endrot = if to_token.len() == 2 {
            int_at(&tokens, 3, BLOCK, cursor)?
        } else {
            let digits = to_token
                .get(2..)
                .ok_or_else(|| malformed(BLOCK, cursor, "unreadable TO field"))?;
            int_token(digits, BLOCK, cursor)?
        };

        cursor.skip_line("blank")?;
        line = cursor.next_line()?;
        while line.trim().is_empty() || !MODE_COLUMNS_RE.is_match(&line) {
            line = cursor.next_line()?;
        }

        while !line.contains("SAYVETZ") {
            let freq_row = cursor.next_line()?;
            for col in freq_row.split_whitespace().skip(1) {
                if col == "I" {
                    if let Some(last) = self.data.vibfreqs.last_mut() {
                        *last = -*last;
                    }
                } else {
                    self.data.vibfreqs.push(parse_f64(col, BLOCK, cursor)?);
                }
            }

            line = cursor.next_line()?;
            // Symmetry labels appear in newer builds only.
            if line.contains("SYMMETRY") {
                line = cursor.next_line()?;
            }
            if line.contains("REDUCED") {
                for col in line.split_whitespace().skip(2) {
                    self.data.vibrmasses.push(parse_f64(col, BLOCK, cursor)?);
                }
                line = cursor.next_line()?;
            }
            // Absent from numerical Hessian runs.
            if line.contains("IR INTENSITY") {
                for col in line.split_whitespace().skip(2) {
                    let raw = parse_f64(col, BLOCK, cursor)?;
                    self.data
                        .vibirs
                        .push(convert(raw, Unit::DebyeSqPerAmuAngstromSq, Unit::KmPerMol)?);
                }
                line = cursor.next_line()?;
            }
            if line.contains("RAMAN") {
                for col in line.split_whitespace().skip(2) {
                    self.data.vibramans.push(parse_f64(col, BLOCK, cursor)?);
                }
                cursor.skip_line("depolarization")?;
                line = cursor.next_line()?;
            }
            if !line.trim().is_empty() {
                return Err(malformed(
                    BLOCK,
                    cursor,
                    "expected a blank line before the displacement rows",
                ));
            }

            // Three rows (x, y, z) per atom; the leading atom name and
            // coordinate letter occupy the first 21 columns.
            let natom = self.require_natom(BLOCK)?;
            let mut columns: [Vec<[f64; 3]>; 5] = Default::default();
            let mut ncols = 0;
            for _ in 0..natom {
                let mut q = [[0.0f64; 3]; 5];
                for cart in 0..3 {
                    let row = cursor.next_line()?;
                    let cells: Vec<&str> = field(&row, 21, usize::MAX).split_whitespace().collect();
                    if cells.len() > 5 {
                        return Err(malformed(BLOCK, cursor, "too many displacement columns"));
                    }
                    for (k, cell) in cells.iter().enumerate() {
                        q[k][cart] = parse_f64(cell, BLOCK, cursor)?;
                    }
                    ncols = cells.len();
                }
                for k in 0..ncols {
                    columns[k].push(q[k]);
                }
            }
            for column in columns.iter_mut().take(ncols) {
                self.data.vibdisps.push(std::mem::take(column));
            }

            // Ten lines of Sayvetz translation and rotation sums follow.
            for _ in 0..10 {
                cursor.next_line()?;
            }
            cursor.skip_line("blank")?;
            line = cursor.next_line()?;
        }

        self.data.vibfreqs = excise(std::mem::take(&mut self.data.vibfreqs), startrot, endrot);
        self.data.vibirs = excise(std::mem::take(&mut self.data.vibirs), startrot, endrot);
        self.data.vibdisps = excise(std::mem::take(&mut self.data.vibdisps), startrot, endrot);
        if !self.data.vibrmasses.is_empty() {
            self.data.vibrmasses =
                excise(std::mem::take(&mut self.data.vibrmasses), startrot, endrot);
        }
        if !self.data.vibramans.is_empty() {
            self.data.vibramans =
                excise(std::mem::take(&mut self.data.vibramans), startrot, endrot);
        }
        Ok(Dispatch::Continue)
    }

    //           ATOMIC BASIS SET
    //   SHELL TYPE  PRIMITIVE        EXPONENT          CONTRACTION COEFFICIENT(S)
    //  O
    //       1   S       1            5484.6717000    0.001831074430
    //
    // Shells are numbered across the whole molecule; identical atoms share
    // one printed set, and the gap in the numbering says how many copies to
    // add. An L shell is an SP pair contracted over the same exponents. PC
    // GAMESS prints the unnormalized coefficient in parentheses after the
    // normalized one.
    fn basis_table(&mut self, _line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "basis set table";
        self.data.gbasis.clear();
        let mut line = cursor.next_line()?;
        while !line.contains("SHELL") {
            line = cursor.next_line()?;
        }
        cursor.skip_lines(&["blank", "atom name"])?;

        // Number of the last shell in the previous printed set.
        let mut shellcounter: usize = 1;
        while !line.contains("TOTAL NUMBER") {
            cursor.skip_line("blank")?;
            line = cursor.next_line()?;
            let shellno = int_at(&line.split_whitespace().collect::<Vec<_>>(), 0, BLOCK, cursor)?;
            let shellgap = shellno as isize - shellcounter as isize;
            let mut atom_shells: Vec<Shell> = Vec::new();
            let mut shellsize: usize = 0;
            while line.split_whitespace().count() != 1 && !line.contains("TOTAL NUMBER") {
                shellsize += 1;
                let mut l_s: Vec<(f64, f64)> = Vec::new();
                let mut l_p: Vec<(f64, f64)> = Vec::new();
                let mut prims: Vec<(f64, f64)> = Vec::new();
                let mut last_type: Option<ShellType> = None;
                let mut last_is_l = false;
                while !line.trim().is_empty() {
                    let temp: Vec<&str> = line.split_whitespace().collect();
                    let sym = *temp
                        .get(1)
                        .ok_or_else(|| malformed(BLOCK, cursor, "primitive row too short"))?;
                    let exponent = parse_f64(
                        temp.get(3)
                            .ok_or_else(|| malformed(BLOCK, cursor, "primitive row too short"))?,
                        BLOCK,
                        cursor,
                    )?;
                    if sym == "L" {
                        last_is_l = true;
                        if temp.len() == 6 {
                            l_s.push((exponent, parse_f64(temp[4], BLOCK, cursor)?));
                            l_p.push((exponent, parse_f64(temp[5], BLOCK, cursor)?));
                        } else {
                            l_s.push((exponent, paren_value(temp.get(6), BLOCK, cursor)?));
                            l_p.push((exponent, paren_value(temp.get(9), BLOCK, cursor)?));
                        }
                    } else {
                        let shell_type = ShellType::from_label(sym).ok_or_else(|| {
                            malformed(BLOCK, cursor, format!("unrecognized shell label {sym:?}"))
                        })?;
                        last_is_l = false;
                        last_type = Some(shell_type);
                        if temp.len() == 5 {
                            prims.push((exponent, parse_f64(temp[4], BLOCK, cursor)?));
                        } else {
                            prims.push((exponent, paren_value(temp.get(6), BLOCK, cursor)?));
                        }
                    }
                    line = cursor.next_line()?;
                }
                if last_is_l {
                    atom_shells.push(Shell {
                        shell_type: ShellType::S,
                        primitives: l_s,
                    });
                    atom_shells.push(Shell {
                        shell_type: ShellType::P,
                        primitives: l_p,
                    });
                } else if let Some(shell_type) = last_type {
                    atom_shells.push(Shell {
                        shell_type,
                        primitives: prims,
                    });
                }
                line = cursor.next_line()?;
            }
            if shellsize == 0 {
                return Err(malformed(BLOCK, cursor, "empty shell group"));
            }
            let numtoadd = 1 + shellgap.div_euclid(shellsize as isize);
            shellcounter = shellno + shellsize;
            for _ in 0..numtoadd.max(0) {
                self.data.gbasis.push(atom_shells.clone());
            }
        }
        Ok(Dispatch::Continue)
    }

    //           ------------
    //           EIGENVECTORS
    //           ------------
    //
    //                       1          2          3          4          5
    //                   -11.0303    -0.9517    -0.5401    -0.3501    -0.2922
    //                      A          A          A          A          A
    //     1  C  1  S    0.99925   -0.11734    0.00000    0.00000   -0.00671
    //
    // Orbitals come in column groups of five: energies, symmetries, then
    // one row per basis function with coefficients in 11-column fields
    // starting at column 15. AO names and the per-atom basis map are built
    // from the row labels on the first pass. Unrestricted logs follow with
    // a BETA SET block of the same shape.
    fn eigenvector_block(&mut self, _line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "orbital eigenvectors";
        let nbasis = self.require_nbasis(BLOCK)?;
        if self.data.nmo.is_none() {
            self.data.nmo = Some(nbasis);
        }
        let nmo = self.data.nmo.unwrap_or(nbasis);

        self.data.moenergies = vec![Vec::new()];
        self.data.mosyms = vec![Vec::new()];
        self.data.mocoeffs = vec![DMatrix::zeros(nmo, nbasis)];

        let read_atombasis = self.data.atombasis.is_empty();
        if read_atombasis {
            let natom = self.require_natom(BLOCK)?;
            self.data.atombasis = vec![Vec::new(); natom];
            self.data.aonames.clear();
        }

        cursor.skip_line("dashes")?;

        let mut line = String::new();
        let mut base = 0;
        while base < nmo {
            line = cursor.next_line()?;
            // A non-blank line here means the section ended early.
            if !line.trim().is_empty() {
                break;
            }
            let mut numbers = cursor.next_line()?;
            if numbers.contains("ALPHA SET") {
                cursor.skip_line("blank")?;
                numbers = cursor.next_line()?;
            }
            // A truncated printout heads straight into the beta section.
            if numbers.contains("BETA SET") {
                line = numbers;
                break;
            }
            while line.trim().is_empty() {
                line = cursor.next_line()?;
            }
            // Optimizations run into the next section without a terminator.
            if line.contains("--------") {
                break;
            }

            let mut energies = Vec::with_capacity(5);
            let mut unparsable = false;
            for token in line.split_whitespace() {
                match token.parse::<f64>() {
                    Ok(value) => energies.push(value),
                    Err(_) => {
                        unparsable = true;
                        break;
                    }
                }
            }
            if unparsable {
                self.diags.warn(
                    DiagnosticKind::SkippedBlock,
                    "orbital section found but could not be parsed",
                );
                break;
            }
            self.data.moenergies[0].extend(energies);

            line = cursor.next_line()?;
            if !line.trim().is_empty() {
                for label in line.split_whitespace() {
                    self.data.mosyms[0].push(normalise_sym(label));
                }
            }

            // The atom number column resets to 0 past atom 99, so keep a
            // running offset: bump it at the first 0 of each wrap and hold
            // it while that atom's remaining functions print.
            let mut oldatom: usize = 0;
            let mut atom_offset: usize = 0;
            let mut wrap_armed = true;
            for i in 0..nbasis {
                line = cursor.next_line()?;
                if line.trim().is_empty() {
                    break;
                }
                if read_atombasis && base == 0 {
                    let start = field(&line, 0, 17).trim().to_owned();
                    let (aoname, atomno, orbno) = if let Some(caps) = AO_LABEL_RE.captures(&start) {
                        let mut atom = int_token(&caps[3], BLOCK, cursor)?;
                        if atom == 0 && wrap_armed {
                            atom_offset += 100;
                            wrap_armed = false;
                        }
                        if atom != 0 {
                            wrap_armed = true;
                        }
                        atom += atom_offset;
                        let aoname = format!("{}{}_{}", capitalize(&caps[2]), atom, &caps[4]);
                        oldatom = atom;
                        let atomno = atom.checked_sub(1).ok_or_else(|| {
                            malformed(BLOCK, cursor, "atom number zero in basis label")
                        })?;
                        let orbno = int_token(&caps[1], BLOCK, cursor)?.saturating_sub(1);
                        (aoname, atomno, orbno)
                    } else {
                        // F shells print without the atom number; reuse the
                        // last one seen.
                        let cells: Vec<&str> = line.split_whitespace().collect();
                        if cells.len() < 3 {
                            return Err(malformed(BLOCK, cursor, "basis label row too short"));
                        }
                        let aoname = format!("{}{}_{}", capitalize(cells[1]), oldatom, cells[2]);
                        let atomno = oldatom.checked_sub(1).ok_or_else(|| {
                            malformed(BLOCK, cursor, "basis label row before any numbered atom")
                        })?;
                        let orbno = int_token(cells[0], BLOCK, cursor)?.saturating_sub(1);
                        (aoname, atomno, orbno)
                    };
                    let slot = self.data.atombasis.get_mut(atomno).ok_or_else(|| {
                        malformed(BLOCK, cursor, "atom index out of range in basis label")
                    })?;
                    slot.push(orbno);
                    self.data.aonames.push(aoname);
                }
                read_coefficient_row(
                    &line,
                    base,
                    i,
                    nmo,
                    &mut self.data.mocoeffs[0],
                    BLOCK,
                    cursor,
                )?;
            }
            base += 5;
        }

        if !line.contains("BETA SET") {
            line = cursor.next_line()?;
            line = cursor.next_line()?;
        }

        // Can sit between the alpha and beta sets.
        if line.trim() == "LZ VALUE ANALYSIS FOR THE MOS" {
            while !line.trim().is_empty() {
                line = cursor.next_line()?;
            }
            line = cursor.next_line()?;
        }

        if line.contains("BETA SET") {
            self.data.mocoeffs.push(DMatrix::zeros(nmo, nbasis));
            self.data.moenergies.push(Vec::new());
            self.data.mosyms.push(Vec::new());
            cursor.skip_line("blank")?;
            line = cursor.next_line()?;
            // The EIGENVECTORS banner is sometimes missing; dashes signal it.
            if all_dashes(&line) {
                cursor.skip_lines(&["eigenvectors banner", "dashes", "blank"])?;
                line = cursor.next_line()?;
            }
            let mut base = 0;
            while base < nmo {
                if base != 0 {
                    cursor.next_line()?;
                    cursor.next_line()?;
                }
                line = cursor.next_line()?;
                if line.to_lowercase().contains("properties") {
                    break;
                }
                for token in line.split_whitespace() {
                    let value = token.parse::<f64>().map_err(|_| {
                        malformed(BLOCK, cursor, "unparsable beta orbital energy")
                    })?;
                    self.data.moenergies[1].push(value);
                }
                line = cursor.next_line()?;
                for label in line.split_whitespace() {
                    self.data.mosyms[1].push(normalise_sym(label));
                }
                for i in 0..nbasis {
                    line = cursor.next_line()?;
                    read_coefficient_row(
                        &line,
                        base,
                        i,
                        nmo,
                        &mut self.data.mocoeffs[1],
                        BLOCK,
                        cursor,
                    )?;
                }
                base += 5;
            }
            cursor.next_line()?;
        }
        Ok(Dispatch::Continue)
    }

    // Same shape as the eigenvectors, with occupation numbers in place of
    // orbital energies and no symmetry labels worth keeping.
    fn natural_orbitals(&mut self, _line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "natural orbitals";
        let nmo = self.data.nmo.ok_or(ParseError::MissingPrecondition {
            block: BLOCK,
            missing: "nmo",
        })?;
        let nbasis = self.require_nbasis(BLOCK)?;
        let mut nocoeffs = DMatrix::zeros(nmo, nbasis);
        self.data.nooccnos.clear();

        cursor.skip_line("dashes")?;
        let mut base = 0;
        while base < nmo {
            cursor.skip_lines(&["blank", "orbital numbers"])?;
            let mut line = cursor.next_line()?;
            while line.trim().is_empty() {
                line = cursor.next_line()?;
            }
            for token in line.split_whitespace() {
                self.data.nooccnos.push(parse_f64(token, BLOCK, cursor)?);
            }
            cursor.skip_line("symmetry labels")?;
            for i in 0..nbasis {
                let row = cursor.next_line()?;
                read_coefficient_row(&row, base, i, nmo, &mut nocoeffs, BLOCK, cursor)?;
            }
            base += 5;
        }
        self.data.nocoeffs = Some(nocoeffs);
        Ok(Dispatch::Continue)
    }

    //  NUMBER OF OCCUPIED ORBITALS (ALPHA)          =    5
    //  NUMBER OF OCCUPIED ORBITALS (BETA )          =    5
    //
    // Printed early and not authoritative: the guess symmetry section
    // decides whether the calculation is restricted. MCSCF runs print it
    // too, hence first-one-wins.
    fn occupied_counts(&mut self, line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "occupied orbital counts";
        if self.data.homos.is_some() {
            return Ok(Dispatch::Continue);
        }
        let alpha = int_token(rtoken(line, 0, BLOCK, cursor)?, BLOCK, cursor)?.saturating_sub(1);
        let beta_line = cursor.next_line()?;
        let beta =
            int_token(rtoken(&beta_line, 0, BLOCK, cursor)?, BLOCK, cursor)?.saturating_sub(1);
        set_scalar(
            &mut self.data.homos,
            "homos",
            vec![alpha, beta],
            &mut self.diags,
        );
        Ok(Dispatch::Continue)
    }

    //  SYMMETRIES FOR INITIAL GUESS ORBITALS FOLLOW.   BOTH SET(S).
    //      5 ORBITALS ARE OCCUPIED (    1 CORE ORBITALS).
    //
    // BOTH SET(S) means a restricted run, so homos keeps one entry.
    fn guess_symmetries(&mut self, line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "guess orbital symmetries";
        if line.contains("BOTH SET(S)") {
            let next = cursor.next_line()?;
            if next.contains("ORBITALS ARE OCCUPIED") {
                let homo = int_token(token(&next, 0, BLOCK, cursor)?, BLOCK, cursor)?
                    .saturating_sub(1);
                match &self.data.homos {
                    Some(existing) if existing.first() != Some(&homo) => {
                        self.diags.warn(
                            DiagnosticKind::Note,
                            "number of occupied orbitals not consistent; \
                             this is normal for ECP and FMO jobs",
                        );
                    }
                    Some(_) => {}
                    None => self.data.homos = Some(vec![homo]),
                }
            }
            let homos = self
                .data
                .homos
                .as_mut()
                .ok_or(ParseError::MissingPrecondition {
                    block: BLOCK,
                    missing: "homos",
                })?;
            homos.truncate(1);
        }
        Ok(Dispatch::Continue)
    }

    // TOTAL NUMBER OF ATOMS, in assorted capitalizations; the count never
    // changes, so only the first occurrence is read.
    fn atom_count(&mut self, line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "atom count";
        if self.data.natom.is_some() {
            return Ok(Dispatch::Continue);
        }
        let natom = int_token(rtoken(line, 0, BLOCK, cursor)?, BLOCK, cursor)?;
        set_scalar(&mut self.data.natom, "natom", natom, &mut self.diags);
        Ok(Dispatch::Continue)
    }

    fn basis_count(&mut self, line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "basis function count";
        let nbasis = int_token(rtoken(line, 0, BLOCK, cursor)?, BLOCK, cursor)?;
        set_scalar(&mut self.data.nbasis, "nbasis", nbasis, &mut self.diags);
        Ok(Dispatch::Continue)
    }

    // Spherical harmonics leave fewer independent functions than the
    // cartesian count; the dropped contaminants shrink nmo.
    fn contaminants_dropped(&mut self, line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "dropped contaminants";
        let dropped = int_token(rtoken(line, 0, BLOCK, cursor)?, BLOCK, cursor)?;
        let current = match self.data.nmo {
            Some(nmo) => nmo,
            None => self.require_nbasis(BLOCK)?,
        };
        set_scalar(
            &mut self.data.nmo,
            "nmo",
            current.saturating_sub(dropped),
            &mut self.diags,
        );
        Ok(Dispatch::Continue)
    }

    fn spherical_harmonics(&mut self, line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "spherical harmonics kept";
        let nmo = int_token(rtoken(line, 0, BLOCK, cursor)?, BLOCK, cursor)?;
        set_scalar(&mut self.data.nmo, "nmo", nmo, &mut self.diags);
        Ok(Dispatch::Continue)
    }

    fn variation_space(&mut self, line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "variation space";
        let nmo = int_token(rtoken(line, 0, BLOCK, cursor)?, BLOCK, cursor)?;
        set_scalar(&mut self.data.nmo, "nmo", nmo, &mut self.diags);
        Ok(Dispatch::Continue)
    }

    //          OVERLAP MATRIX
    //
    //             1           2           3           4           5
    //               H 1           H 1           O 1           O 1           O 1
    //               S             S             S             S             X
    //  1     1.000000
    //  2     0.659180    1.000000
    //
    // Stored symmetrically as it is read. A second occurrence (from a
    // reordered basis, for instance) overwrites in place.
    fn overlap_matrix(&mut self, _line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "overlap matrix";
        let nbasis = self.require_nbasis(BLOCK)?;
        if self.data.aooverlaps.is_none() {
            self.data.aooverlaps = Some(DMatrix::zeros(nbasis, nbasis));
        } else {
            self.diags.info("reading additional overlap matrix");
        }
        let mut base = 0;
        while base < nbasis {
            cursor.skip_lines(&["blank", "basis function numbers", "blank"])?;
            for i in 0..nbasis - base {
                let row = cursor.next_line()?;
                let mut cells: Vec<&str> = row.split_whitespace().collect();
                // Past 99 functions the row number and the element symbol
                // run together (for example CL12); cut them back apart.
                if cells.len() > 1 && cells[1].len() == 4 {
                    let (element, number) = cells[1].split_at(2);
                    cells[1] = element;
                    cells.insert(2, number);
                }
                for j in 4..cells.len() {
                    let value = parse_f64(cells[j], BLOCK, cursor)?;
                    let r = base + j - 4;
                    let c = i + base;
                    if r >= nbasis || c >= nbasis {
                        return Err(malformed(BLOCK, cursor, "overlap element out of range"));
                    }
                    if let Some(matrix) = self.data.aooverlaps.as_mut() {
                        matrix[(r, c)] = value;
                        matrix[(c, r)] = value;
                    }
                }
            }
            base += 5;
        }
        Ok(Dispatch::Continue)
    }

    //  ECP POTENTIALS
    //  ----------------
    //  PARAMETERS FOR "SN-ECP " ON ATOM  1 WITH ZCORE 46 AND LMAX 3
    //  PARAMETERS FOR "SN-ECP " ON ATOM  4 ARE THE SAME AS ATOM  1
    fn ecp_potentials(&mut self, _line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "ECP potentials";
        let natom = self.require_natom(BLOCK)?;
        if self.data.coreelectrons.is_none() {
            self.data.coreelectrons = Some(vec![0; natom]);
        }
        cursor.skip_lines(&["dashes", "blank"])?;
        let mut header = cursor.next_line()?;
        while header.split_whitespace().next() == Some("PARAMETERS") {
            let atomnum = int_token(field(&header, 34, 40).trim(), BLOCK, cursor)?;
            let index = atomnum
                .checked_sub(1)
                .filter(|i| *i < natom)
                .ok_or_else(|| malformed(BLOCK, cursor, "ECP atom index out of range"))?;
            if field(&header, 40, 50) == "WITH ZCORE" {
                let zcore = field(&header, 50, 55)
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| malformed(BLOCK, cursor, "unreadable ZCORE field"))?;
                if let Some(core) = self.data.coreelectrons.as_mut() {
                    core[index] = zcore;
                }
            } else if field(&header, 40, 55) == "ARE THE SAME AS" {
                let source = int_token(field(&header, 60, usize::MAX).trim(), BLOCK, cursor)?;
                let source_index = source
                    .checked_sub(1)
                    .filter(|i| *i < natom)
                    .ok_or_else(|| malformed(BLOCK, cursor, "ECP atom index out of range"))?;
                if let Some(core) = self.data.coreelectrons.as_mut() {
                    core[index] = core[source_index];
                }
            }
            let mut line = cursor.next_line()?;
            while !line.trim().is_empty() {
                line = cursor.next_line()?;
            }
            header = cursor.next_line()?;
        }
        Ok(Dispatch::Continue)
    }

    //           TOTAL MULLIKEN AND LOWDIN ATOMIC POPULATIONS
    //        ATOM         MULL.POP.    CHARGE          LOW.POP.     CHARGE
    //     1 O             8.825409   -0.825409         8.734077   -0.734077
    //
    // Some builds print every row twice (once per symmetry-unique pass);
    // that case announces itself with a repeated title and a blank line,
    // and the duplicate of each row is the one parsed. A header without
    // exactly five fields is a different population table and the whole
    // line is dropped.
    fn population_charges(&mut self, _line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "atomic populations";
        let mut header = cursor.next_line()?;
        let mut line = cursor.next_line()?;
        let doubles_printed = line.trim().is_empty();
        if doubles_printed {
            cursor.skip_line("repeated title")?;
            header = cursor.next_line()?;
            line = cursor.next_line()?;
        }
        if header.split_whitespace().count() != 5 {
            return Ok(Dispatch::SkipRest);
        }
        let mut mulliken = Vec::new();
        let mut lowdin = Vec::new();
        while !line.trim().is_empty() {
            if doubles_printed {
                line = cursor.next_line()?;
            }
            mulliken.push(float_at(&line, 3, BLOCK, cursor)?);
            lowdin.push(float_at(&line, 5, BLOCK, cursor)?);
            line = cursor.next_line()?;
        }
        self.data.atomcharges.insert("mulliken".to_owned(), mulliken);
        self.data.atomcharges.insert("lowdin".to_owned(), lowdin);
        Ok(Dispatch::Continue)
    }

    //          ELECTROSTATIC MOMENTS
    //
    //  POINT   1           X           Y           Z (BOHR)    CHARGE
    //                 0.000000    0.000000    0.000000        0.00 (A.U.)
    //          DX          DY          DZ         /D/  (DEBYE)
    //      0.000000    0.000000   -2.380288    2.380288
    fn electrostatic_moments(&mut self, _line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "electrostatic moments";
        cursor.skip_lines(&["dashes", "blank"])?;
        let mut line = cursor.next_line()?;
        if line.contains("MEMORY ASSIGNMENT") {
            cursor.skip_line("memory assignment")?;
            line = cursor.next_line()?;
        }
        if line.split_whitespace().next() != Some("POINT") {
            return Err(malformed(BLOCK, cursor, "expected the POINT header"));
        }
        let coords_line = cursor.next_line()?;
        let tokens: Vec<&str> = coords_line.split_whitespace().collect();
        if tokens.last() != Some(&"(A.U.)") {
            return Err(malformed(
                BLOCK,
                cursor,
                "reference coordinates are not in atomic units",
            ));
        }
        if tokens.len() < 5 {
            return Err(malformed(BLOCK, cursor, "reference line too short"));
        }
        let mut reference = [0.0f64; 3];
        for (k, slot) in reference.iter_mut().enumerate() {
            let bohr = parse_f64(tokens[k], BLOCK, cursor)?;
            *slot = convert(bohr, Unit::Bohr, Unit::Angstrom)?;
        }
        let charge = parse_f64(tokens[tokens.len() - 2], BLOCK, cursor)?.round() as i32;
        set_scalar(&mut self.data.charge, "charge", charge, &mut self.diags);

        let dipole_header = cursor.next_line()?;
        let head: Vec<&str> = dipole_header.split_whitespace().collect();
        let labelled = head.len() >= 3
            && head[0] == "DX"
            && head[1] == "DY"
            && head[2] == "DZ"
            && head.last() == Some(&"(DEBYE)");
        if !labelled {
            return Err(malformed(BLOCK, cursor, "unexpected dipole header"));
        }
        let dipole_line = cursor.next_line()?;
        let cells: Vec<&str> = dipole_line.split_whitespace().collect();
        if cells.len() < 3 {
            return Err(malformed(BLOCK, cursor, "dipole row too short"));
        }
        let mut dipole = [0.0f64; 3];
        for (k, slot) in dipole.iter_mut().enumerate() {
            *slot = parse_f64(cells[k], BLOCK, cursor)?;
        }

        let moments = Moments { reference, dipole };
        match &self.data.moments {
            None => self.data.moments = Some(moments),
            Some(old) if old.dipole == dipole => {}
            Some(_) => {
                self.diags.warn(
                    DiagnosticKind::Note,
                    "overwriting previous multipole moments with new values; this could be \
                     from post-HF properties or geometry optimization",
                );
                self.data.moments = Some(moments);
            }
        }
        Ok(Dispatch::Continue)
    }

    //   ALPHA POLARIZABILITY TENSOR (ANGSTROMS**3)
    //
    // Lower triangle, one more value per row; stored in bohr^3.
    fn polarizability_tensor(&mut self, _line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "polarizability tensor";
        cursor.skip_lines(&["dashes", "blank", "directions"])?;
        let mut tensor = DMatrix::zeros(3, 3);
        for i in 0..3 {
            let row = cursor.next_line()?;
            let cells: Vec<&str> = row.split_whitespace().collect();
            if cells.len() != i + 2 {
                return Err(malformed(BLOCK, cursor, "unexpected triangle row length"));
            }
            for (j, cell) in cells[1..].iter().enumerate() {
                tensor[(i, j)] = parse_f64(cell, BLOCK, cursor)?;
            }
        }
        symmetrize_lower(&mut tensor);
        let factor = convert(1.0, Unit::Angstrom, Unit::Bohr)?.powi(3);
        tensor *= factor;
        self.data.polarizabilities.push(tensor);
        Ok(Dispatch::Continue)
    }

    //      TIME-DEPENDENT HARTREE-FOCK NLO PROPERTIES
    //
    //  ALPHA AT   0.000000 A.U.
    //   ALPHA(XX;-X)        7.1129132
    //
    // Nine labelled components, already in bohr^3.
    fn tdhf_polarizability(&mut self, _line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "TDHF polarizability";
        cursor.skip_lines(&["dashes", "blank", "dots"])?;
        let header = cursor.next_line()?;
        if !header.contains("ALPHA AT") {
            return Err(malformed(BLOCK, cursor, "expected the ALPHA AT header"));
        }
        cursor.skip_lines(&["dots", "blank"])?;
        let axis = |c: Option<char>| match c {
            Some('X') => Some(0),
            Some('Y') => Some(1),
            Some('Z') => Some(2),
            _ => None,
        };
        let mut tensor = DMatrix::zeros(3, 3);
        for _ in 0..9 {
            let row = cursor.next_line()?;
            let cells: Vec<&str> = row.split_whitespace().collect();
            let pair = cells
                .get(1)
                .ok_or_else(|| malformed(BLOCK, cursor, "component row too short"))?;
            let mut chars = pair.chars();
            let i = axis(chars.next())
                .ok_or_else(|| malformed(BLOCK, cursor, "unrecognized tensor component"))?;
            let j = axis(chars.next())
                .ok_or_else(|| malformed(BLOCK, cursor, "unrecognized tensor component"))?;
            let value = parse_f64(
                cells
                    .get(3)
                    .ok_or_else(|| malformed(BLOCK, cursor, "component row too short"))?,
                BLOCK,
                cursor,
            )?;
            tensor[(i, j)] = value;
        }
        self.data.polarizabilities.push(tensor);
        Ok(Dispatch::Continue)
    }

    //      -------------------------------
    //      THERMOCHEMISTRY AT T=  298.15 K
    //      -------------------------------
    //
    // Pressure converts from pascal to atmosphere, entropy from cal/(mol K)
    // to hartree per kelvin further down in the summary handler; here the
    // rotational constants (GHz) and the zero point energy are collected.
    fn thermochemistry(&mut self, line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "thermochemistry";
        if let Some(caps) = TEMPERATURE_RE.captures(line) {
            let t = parse_f64(caps[1].trim(), BLOCK, cursor)?;
            set_scalar(&mut self.data.temperature, "temperature", t, &mut self.diags);
        }
        cursor.skip_lines(&["dashes", "blank", "ideal gas assumptions"])?;
        let pressure_line = cursor.next_line()?;
        if !pressure_line.contains("PASCAL.") {
            return Err(malformed(BLOCK, cursor, "expected the pressure line"));
        }
        if let Some(caps) = PRESSURE_RE.captures(&pressure_line) {
            let pascals = parse_f64(caps[1].trim(), BLOCK, cursor)?;
            set_scalar(
                &mut self.data.pressure,
                "pressure",
                pascals / 1.01325e5,
                &mut self.diags,
            );
        }
        let consumed = cursor.skip_lines(&[
            "frequency scaling",
            "moments of inertia header",
            "moments of inertia",
            "rotational symmetry number",
            "rotational constants header",
        ])?;
        let rot_line = cursor.next_line()?;
        let mut constants = Vec::new();
        for token in rot_line.split_whitespace() {
            constants.push(parse_f64(token, BLOCK, cursor)?);
        }
        self.data.rotconsts.push(constants);

        // The volume is sometimes printed between the pressure and the
        // frequency scaling line, shifting everything down by one.
        if consumed.first().map(|l| field(l, 0, 3)) == Some(" V=") {
            cursor.next_line()?;
        }
        let mut line = cursor.next_line()?;
        if line.contains("IMAGINARY FREQUENCY VIBRATION(S)") {
            cursor.next_line()?;
            line = cursor.next_line()?;
        }
        if line.contains("VIBRATIONAL MODES ARE USED IN THERMOCHEMISTRY.") {
            cursor.next_line()?;
        }
        let zpve_line = cursor.next_line()?;
        if !zpve_line.contains("HARTREE/MOLECULE") {
            return Err(malformed(BLOCK, cursor, "expected the zero point energy line"));
        }
        let zpve = float_at(&zpve_line, 0, BLOCK, cursor)?;
        set_scalar(&mut self.data.zpve, "zpve", zpve, &mut self.diags);
        Ok(Dispatch::Continue)
    }

    //       CARTESIAN FORCE CONSTANT MATRIX
    //
    // Blocks of two atoms (six columns, 9-character fields from column 20),
    // rows from the diagonal atom down; the last block of an odd molecule
    // has a single atom and three columns. Only the lower triangle is
    // stored, so it is mirrored afterwards.
    fn force_constants(&mut self, _line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "force constant matrix";
        let natom = self.require_natom(BLOCK)?;
        let n3 = 3 * natom;
        let mut hessian = DMatrix::zeros(n3, n3);
        cursor.skip_line("dashes")?;
        let mut ncols = 6;
        let mut atom_block = 0;
        while atom_block < natom {
            let lines = cursor.skip_lines(&[
                "blank",
                "atom indices",
                "atom symbols",
                "coordinate header",
            ])?;
            if lines[1].split_whitespace().count() == 1 {
                ncols = 3;
            }
            let col_start = 3 * atom_block;
            for atom in atom_block..natom {
                for cart in 0..3 {
                    let row_line = cursor.next_line()?;
                    for k in 0..ncols {
                        let cell = field(&row_line, 20 + k * 9, 20 + (k + 1) * 9).trim();
                        if cell.is_empty() {
                            break;
                        }
                        let value = parse_f64(cell, BLOCK, cursor)?;
                        let (r, c) = (3 * atom + cart, col_start + k);
                        if c >= n3 {
                            return Err(malformed(BLOCK, cursor, "column out of range"));
                        }
                        hessian[(r, c)] = value;
                    }
                }
            }
            atom_block += 2;
        }
        symmetrize_lower(&mut hessian);
        set_scalar(&mut self.data.hessian, "hessian", hessian, &mut self.diags);
        Ok(Dispatch::Continue)
    }

    //                KCAL/MOL  KCAL/MOL  KCAL/MOL CAL/MOL-K CAL/MOL-K CAL/MOL-K
    //   ELEC.     ...
    //   TOTAL     ...
    //
    // Thermal corrections are relative to the first SCF energy of the run.
    fn thermo_summary(&mut self, _line: &str, cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        const BLOCK: &str = "thermochemistry summary";
        cursor.skip_lines(&[
            "electronic row",
            "translational row",
            "rotational row",
            "vibrational row",
        ])?;
        let total = cursor.next_line()?;
        let cells: Vec<&str> = total.split_whitespace().collect();
        if cells.len() < 7 {
            return Err(malformed(BLOCK, cursor, "summary row too short"));
        }
        let electronic = self
            .data
            .scfenergies
            .first()
            .copied()
            .ok_or(ParseError::MissingPrecondition {
                block: BLOCK,
                missing: "scfenergies",
            })?;
        let enthalpy = electronic
            + convert(
                parse_f64(cells[2], BLOCK, cursor)?,
                Unit::KcalPerMol,
                Unit::Hartree,
            )?;
        set_scalar(&mut self.data.enthalpy, "enthalpy", enthalpy, &mut self.diags);
        let free = electronic
            + convert(
                parse_f64(cells[3], BLOCK, cursor)?,
                Unit::KcalPerMol,
                Unit::Hartree,
            )?;
        set_scalar(&mut self.data.freeenergy, "freeenergy", free, &mut self.diags);
        let entropy = convert(
            parse_f64(cells[6], BLOCK, cursor)? / 1000.0,
            Unit::KcalPerMol,
            Unit::Hartree,
        )?;
        set_scalar(&mut self.data.entropy, "entropy", entropy, &mut self.diags);
        Ok(Dispatch::Continue)
    }

    fn termination(&mut self, _line: &str, _cursor: &mut LogCursor<'_>) -> Result<Dispatch> {
        self.data.metadata.success = true;
        Ok(Dispatch::Continue)
    }
}

/// Trigger table, tried in order for every line.
const RULES: &[Rule<Gamess>] = &[
    Rule {
        name: "firefly-version",
        hit: |line| line.contains("Firefly version"),
        run: |p, line, cur| p.firefly_version(line, cur),
    },
    Rule {
        name: "gamess-version",
        hit: |line| line.contains("GAMESS VERSION ="),
        run: |p, line, cur| p.gamess_version(line, cur),
    },
    Rule {
        name: "input-echo",
        hit: |line| field(line, 1, 12) == "INPUT CARD>",
        run: |p, line, cur| p.input_echo(line, cur),
    },
    Rule {
        name: "scf-method",
        hit: |line| field(line, 1, 7) == "SCFTYP",
        run: |p, line, cur| p.scf_method(line, cur),
    },
    Rule {
        name: "basis-name",
        hit: |line| field(line, 5, 11) == "GBASIS",
        run: |p, line, cur| p.basis_name(line, cur),
    },
    Rule {
        name: "point-group",
        hit: |line| line.contains(" THE POINT GROUP OF THE MOLECULE IS"),
        run: |p, line, cur| p.point_group(line, cur),
    },
    Rule {
        name: "symmetry-subspaces",
        hit: |line| line.trim() == "DIMENSIONS OF THE SYMMETRY SUBSPACES ARE",
        run: |p, line, cur| p.symmetry_subspaces(line, cur),
    },
    Rule {
        name: "geometry-targets",
        hit: |line| field(line, 10, 18) == "OPTTOL =",
        run: |p, line, cur| p.geometry_targets(line, cur),
    },
    Rule {
        name: "final-energy",
        hit: |line| line.find("FINAL") == Some(1),
        run: |p, line, cur| p.final_energy(line, cur),
    },
    Rule {
        name: "dispersion-energy",
        hit: |line| {
            line.find("GRIMME'S DISPERSION ENERGY") == Some(1)
                || line.find("Dispersion correction to total energy") == Some(1)
        },
        run: |p, line, cur| p.dispersion_energy(line, cur),
    },
    Rule {
        name: "mp-energies",
        hit: |line| {
            line.contains("RESULTS OF MOLLER-PLESSET")
                || field(line, 6, 37) == "SCHWARZ INEQUALITY TEST SKIPPED"
        },
        run: |p, line, cur| p.mp_energies(line, cur),
    },
    Rule {
        name: "ccd-energy",
        hit: |line| field(line, 12, 23) == "CCD ENERGY:",
        run: |p, line, cur| p.ccd_energy(line, cur),
    },
    Rule {
        name: "ccsd-energy",
        hit: |line| {
            let mut tokens = line.split_whitespace();
            tokens.next() == Some("CCSD") && tokens.next() == Some("ENERGY:")
        },
        run: |p, line, cur| p.ccsd_energy(line, cur),
    },
    Rule {
        name: "t1-diagnostic",
        hit: |line| line.contains("T1 DIAGNOSTIC"),
        run: |p, line, cur| p.t1_diagnostic(line, cur),
    },
    Rule {
        name: "mbpt2-energy",
        hit: |line| field(line, 8, 23) == "MBPT(2) ENERGY:",
        run: |p, line, cur| p.mbpt2_energy(line, cur),
    },
    Rule {
        name: "charge-and-mult",
        hit: |line| field(line, 1, 19) == "CHARGE OF MOLECULE",
        run: |p, line, cur| p.charge_and_mult(line, cur),
    },
    Rule {
        name: "excitation-table",
        hit: |line| EXCITATION_HEADER_RE.is_match(line.trim()),
        run: |p, line, cur| p.excitation_table(line, cur),
    },
    Rule {
        name: "saps-hamiltonian",
        hit: |line| {
            field(line, 8, 64) == "RESULTS FROM SPIN-ADAPTED ANTISYMMETRIZED PRODUCT (SAPS)"
        },
        run: |p, line, cur| p.saps_hamiltonian(line, cur),
    },
    Rule {
        name: "dets-hamiltonian",
        hit: |line| {
            field(line, 8, 64) == "RESULTS FROM DETERMINANT BASED ATOMIC ORBITAL CI-SINGLES"
        },
        run: |p, line, cur| p.dets_hamiltonian(line, cur),
    },
    Rule {
        name: "excited-state-contribs",
        hit: |line| field(line, 1, 14) == "EXCITED STATE",
        run: |p, line, cur| p.excited_state_contribs(line, cur),
    },
    Rule {
        name: "transition-strength",
        hit: |line| field(line, 1, 50) == "TRANSITION FROM THE GROUND STATE TO EXCITED STATE",
        run: |p, line, cur| p.transition_strength(line, cur),
    },
    Rule {
        name: "tddft-excitations",
        hit: |line| field(line, 14, 29) == "LET EXCITATIONS",
        run: |p, line, cur| p.tddft_excitations(line, cur),
    },
    Rule {
        name: "gradient-step",
        hit: |line| line.contains("MAXIMUM GRADIENT") || line.contains("RMS GRADIENT"),
        run: |p, line, cur| p.gradient_step(line, cur),
    },
    Rule {
        name: "input-orientation",
        hit: |line| field(line, 11, 50) == "ATOMIC                      COORDINATES",
        run: |p, line, cur| p.input_orientation(line, cur),
    },
    Rule {
        name: "equilibrium-located",
        hit: |line| field(line, 12, 40) == "EQUILIBRIUM GEOMETRY LOCATED",
        run: |p, line, cur| p.equilibrium_located(line, cur),
    },
    Rule {
        name: "search-not-converged",
        hit: |line| line.contains("GEOMETRY SEARCH IS NOT CONVERGED"),
        run: |p, line, cur| p.search_not_converged(line, cur),
    },
    Rule {
        name: "standard-orientation",
        hit: |line| field(line, 1, 29) == "COORDINATES OF ALL ATOMS ARE",
        run: |p, line, cur| p.standard_orientation(line, cur),
    },
    Rule {
        name: "scf-block",
        hit: |line| line.trim_end().ends_with(" SCF CALCULATION"),
        run: |p, line, cur| p.scf_block(line, cur),
    },
    Rule {
        name: "scf-continuation",
        hit: |line| field(line, 1, 8) == "ITER EX",
        run: |p, line, cur| p.scf_continuation(line, cur),
    },
    Rule {
        name: "normal-modes",
        hit: |line| line.contains("NORMAL COORDINATE ANALYSIS IN THE HARMONIC APPROXIMATION"),
        run: |p, line, cur| p.normal_modes(line, cur),
    },
    Rule {
        name: "basis-table",
        hit: |line| field(line, 5, 21) == "ATOMIC BASIS SET",
        run: |p, line, cur| p.basis_table(line, cur),
    },
    Rule {
        name: "eigenvector-block",
        hit: |line| {
            line.find("EIGENVECTORS") == Some(10)
                || line.find("MOLECULAR ORBITALS") == Some(10)
                || line.find("INITIAL GUESS ORBITALS") == Some(30)
        },
        run: |p, line, cur| p.eigenvector_block(line, cur),
    },
    Rule {
        name: "natural-orbitals",
        hit: |line| {
            field(line, 10, 30) == "CIS NATURAL ORBITALS"
                || field(line, 10, 50) == "NATURAL ORBITALS IN ATOMIC ORBITAL BASIS"
        },
        run: |p, line, cur| p.natural_orbitals(line, cur),
    },
    Rule {
        name: "occupied-counts",
        hit: |line| field(line, 1, 28) == "NUMBER OF OCCUPIED ORBITALS",
        run: |p, line, cur| p.occupied_counts(line, cur),
    },
    Rule {
        name: "guess-symmetries",
        hit: |line| line.contains("SYMMETRIES FOR INITIAL GUESS ORBITALS FOLLOW"),
        run: |p, line, cur| p.guess_symmetries(line, cur),
    },
    Rule {
        name: "atom-count",
        hit: |line| line.to_uppercase().contains("NUMBER OF ATOMS"),
        run: |p, line, cur| p.atom_count(line, cur),
    },
    Rule {
        name: "basis-count",
        hit: |line| {
            line.find("NUMBER OF CARTESIAN GAUSSIAN BASIS") == Some(1)
                || line.find("TOTAL NUMBER OF BASIS FUNCTIONS") == Some(1)
        },
        run: |p, line, cur| p.basis_count(line, cur),
    },
    Rule {
        name: "contaminants-dropped",
        hit: |line| line.contains("TOTAL NUMBER OF CONTAMINANTS DROPPED"),
        run: |p, line, cur| p.contaminants_dropped(line, cur),
    },
    Rule {
        name: "spherical-harmonics",
        hit: |line| line.contains("SPHERICAL HARMONICS KEPT IN THE VARIATION SPACE"),
        run: |p, line, cur| p.spherical_harmonics(line, cur),
    },
    Rule {
        name: "variation-space",
        hit: |line| line.find("TOTAL NUMBER OF MOS IN VARIATION SPACE") == Some(1),
        run: |p, line, cur| p.variation_space(line, cur),
    },
    Rule {
        name: "overlap-matrix",
        hit: |line| matches!(line.find("OVERLAP MATRIX"), Some(0) | Some(1)),
        run: |p, line, cur| p.overlap_matrix(line, cur),
    },
    Rule {
        name: "ecp-potentials",
        hit: |line| line.contains("ECP POTENTIALS"),
        run: |p, line, cur| p.ecp_potentials(line, cur),
    },
    Rule {
        name: "population-charges",
        hit: |line| line.contains("TOTAL MULLIKEN AND LOWDIN ATOMIC POPULATIONS"),
        run: |p, line, cur| p.population_charges(line, cur),
    },
    Rule {
        name: "electrostatic-moments",
        hit: |line| line.trim() == "ELECTROSTATIC MOMENTS",
        run: |p, line, cur| p.electrostatic_moments(line, cur),
    },
    Rule {
        name: "polarizability-tensor",
        hit: |line| line.trim() == "ALPHA POLARIZABILITY TENSOR (ANGSTROMS**3)",
        run: |p, line, cur| p.polarizability_tensor(line, cur),
    },
    Rule {
        name: "tdhf-polarizability",
        hit: |line| line.trim() == "TIME-DEPENDENT HARTREE-FOCK NLO PROPERTIES",
        run: |p, line, cur| p.tdhf_polarizability(line, cur),
    },
    Rule {
        name: "thermochemistry",
        hit: |line| line.contains("THERMOCHEMISTRY AT T="),
        run: |p, line, cur| p.thermochemistry(line, cur),
    },
    Rule {
        name: "force-constants",
        hit: |line| line.trim() == "CARTESIAN FORCE CONSTANT MATRIX",
        run: |p, line, cur| p.force_constants(line, cur),
    },
    Rule {
        name: "thermo-summary",
        hit: |line| {
            line.contains("KCAL/MOL  KCAL/MOL  KCAL/MOL CAL/MOL-K CAL/MOL-K CAL/MOL-K")
        },
        run: |p, line, cur| p.thermo_summary(line, cur),
    },
    Rule {
        name: "termination",
        hit: |line| {
            field(line, 0, 30) == " ddikick.x: exited gracefully."
                || field(line, 0, 41) == " EXECUTION OF FIREFLY TERMINATED NORMALLY"
                || field(line, 0, 40) == " EXECUTION OF GAMESS TERMINATED NORMALLY"
        },
        run: |p, line, cur| p.termination(line, cur),
    },
];

fn malformed(block: &'static str, cursor: &LogCursor<'_>, reason: impl Into<String>) -> ParseError {
    ParseError::MalformedBlock {
        block,
        line: cursor.line_number(),
        reason: reason.into(),
    }
}

fn parse_f64(text: &str, block: &'static str, cursor: &LogCursor<'_>) -> Result<f64> {
    text.trim()
        .parse()
        .map_err(|_| malformed(block, cursor, format!("expected a number, got {text:?}")))
}

fn int_token(text: &str, block: &'static str, cursor: &LogCursor<'_>) -> Result<usize> {
    text.trim()
        .parse()
        .map_err(|_| malformed(block, cursor, format!("expected an integer, got {text:?}")))
}

/// `idx`-th whitespace token of `line`.
fn token<'l>(
    line: &'l str,
    idx: usize,
    block: &'static str,
    cursor: &LogCursor<'_>,
) -> Result<&'l str> {
    line.split_whitespace()
        .nth(idx)
        .ok_or_else(|| malformed(block, cursor, format!("missing field {idx}")))
}

/// `back`-th whitespace token of `line`, counted from the end.
fn rtoken<'l>(
    line: &'l str,
    back: usize,
    block: &'static str,
    cursor: &LogCursor<'_>,
) -> Result<&'l str> {
    line.split_whitespace()
        .rev()
        .nth(back)
        .ok_or_else(|| malformed(block, cursor, format!("missing field {back} from the end")))
}

fn float_at(line: &str, idx: usize, block: &'static str, cursor: &LogCursor<'_>) -> Result<f64> {
    parse_f64(token(line, idx, block, cursor)?, block, cursor)
}

fn float_back(line: &str, back: usize, block: &'static str, cursor: &LogCursor<'_>) -> Result<f64> {
    parse_f64(rtoken(line, back, block, cursor)?, block, cursor)
}

fn int_at(cells: &[&str], idx: usize, block: &'static str, cursor: &LogCursor<'_>) -> Result<usize> {
    let cell = cells
        .get(idx)
        .ok_or_else(|| malformed(block, cursor, format!("missing field {idx}")))?;
    int_token(cell, block, cursor)
}

/// Value printed with a closing parenthesis, as in PC GAMESS contraction
/// coefficients: `(  0.154328967)`.
fn paren_value(
    cell: Option<&&str>,
    block: &'static str,
    cursor: &LogCursor<'_>,
) -> Result<f64> {
    let cell = cell.ok_or_else(|| malformed(block, cursor, "primitive row too short"))?;
    let inner = cell
        .strip_suffix(')')
        .ok_or_else(|| malformed(block, cursor, "expected a closing parenthesis"))?;
    parse_f64(inner, block, cursor)
}

/// Reads the diffuse and polarization lines of a Pople `$BASIS` echo and
/// builds the conventional name from `stem` (`6-31` or `6-311`).
fn pople_variant(stem: &str, cursor: &mut LogCursor<'_>) -> Result<String> {
    const BLOCK: &str = "basis options";
    let diffuse_line = cursor.next_line()?;
    if diffuse_line.split_whitespace().last() == Some("T") {
        let line = cursor.next_line()?;
        let npfunc = token(&line, 1, BLOCK, cursor)?;
        let diffuse_h = token(&line, 3, BLOCK, cursor)?;
        Ok(match (npfunc, diffuse_h) {
            ("0", "T") => format!("{stem}++G*"),
            ("1", "T") => format!("{stem}++G**"),
            _ => format!("{stem}+G*"),
        })
    } else {
        let line = cursor.next_line()?;
        if token(&line, 1, BLOCK, cursor)? == "1" {
            Ok(format!("{stem}G**"))
        } else {
            Ok(format!("{stem}G*"))
        }
    }
}

/// One row of orbital coefficients: 11-column fields starting at column 15.
fn read_coefficient_row(
    line: &str,
    base: usize,
    basis_fn: usize,
    nmo: usize,
    matrix: &mut DMatrix<f64>,
    block: &'static str,
    cursor: &LogCursor<'_>,
) -> Result<()> {
    let coeffs = field(line, 15, usize::MAX);
    let mut j = 0;
    while j * 11 + 4 < coeffs.len() {
        let cell = field(coeffs, j * 11, (j + 1) * 11).trim();
        let value = cell
            .parse::<f64>()
            .map_err(|_| malformed(block, cursor, format!("bad coefficient field {cell:?}")))?;
        if base + j >= nmo {
            return Err(malformed(block, cursor, "more orbital columns than nmo"));
        }
        matrix[(base + j, basis_fn)] = value;
        j += 1;
    }
    Ok(())
}

/// First character upper-cased, the rest lowered, as element symbols are
/// printed in AO names.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Normalises a symmetry label: U and G past the first position are
/// lowered and a double prime replaces two single quotes.
fn normalise_sym(label: &str) -> String {
    let mut chars = label.chars();
    let first = match chars.next() {
        Some(first) => first,
        None => return String::new(),
    };
    let tail = chars.as_str();
    if tail == "''" {
        format!("{first}\"")
    } else {
        let tail = tail.replace('U', "u").replace('G', "g");
        format!("{first}{tail}")
    }
}

/// Mirrors the lower triangle into the upper one.
fn symmetrize_lower(matrix: &mut DMatrix<f64>) {
    for i in 0..matrix.nrows() {
        for j in 0..i {
            matrix[(j, i)] = matrix[(i, j)];
        }
    }
}

/// Drops the 1-based window `first..=last-1` from a mode-indexed vector;
/// used to cut rotations and translations out of the vibrational data.
fn excise<T>(values: Vec<T>, first: usize, last: usize) -> Vec<T> {
    values
        .into_iter()
        .enumerate()
        .filter(|(i, _)| *i < first.saturating_sub(1) || *i >= last)
        .map(|(_, value)| value)
        .collect()
}

fn all_dashes(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c == '-')
}
