//! End-to-end scans of synthetic GAMESS log fragments.
//!
//! Each fixture is a minimal but faithfully formatted slice of real program
//! output; column positions matter, since many triggers match at fixed
//! offsets.

use approx::assert_relative_eq;
use ccparse::data::{ShellType, Spin};
use ccparse::diagnostics::DiagnosticKind;
use ccparse::units::{BOHR_TO_ANGSTROM, DEBYE2_PER_AMU_ANGSTROM2_TO_KM_PER_MOL, HARTREE_TO_EV, HARTREE_TO_KCAL_PER_MOL};
use ccparse::{Gamess, ParseError, ParseOutput};
use std::io::Cursor;

fn parse(log: &str) -> ParseOutput {
    let _ = env_logger::builder().is_test(true).try_init();
    Gamess::parse(Cursor::new(log))
}

const WATER_SP: &str = r#"*         GAMESS VERSION =  1 MAY 2013 (R1)          *
 INPUT CARD> $CONTRL SCFTYP=RHF RUNTYP=ENERGY $END
 TOTAL NUMBER OF ATOMS                        =    3
 CHARGE OF MOLECULE        =    0
 SPIN MULTIPLICITY         =    1
 SCFTYP=RHF          RUNTYP=ENERGY      EXETYP=RUN
 ATOM      ATOMIC                      COORDINATES (BOHR)
           CHARGE         X                   Y                   Z
 O           8.0     0.0000000000        0.0000000000        0.2404365860
 H           1.0     0.0000000000        1.4325589977       -0.9617463440
 H           1.0     0.0000000000       -1.4325589977       -0.9617463440

          --------------------
          RHF SCF CALCULATION
          --------------------
     DENSITY MATRIX CONV=  2.00E-05
 ITER EX DEM     TOTAL ENERGY        E CHANGE  DENSITY CHANGE     DIIS ERROR
   1  0  0      -76.0265987166   -76.0265987166   0.475646900   0.000000000
   2  1  0      -76.0265987166     0.0000000000   0.000006900   0.000000000

 FINAL RHF ENERGY IS      -76.0265987166 AFTER   2 ITERATIONS
 EXECUTION OF GAMESS TERMINATED NORMALLY
"#;

#[test]
fn water_single_point_end_to_end() {
    let out = parse(WATER_SP);
    assert!(out.is_complete(), "failure: {:?}", out.failure);
    assert!(out.diagnostics.is_empty(), "diags: {:?}", out.diagnostics);

    assert!(out.data.metadata.success);
    assert_eq!(out.data.metadata.package, "GAMESS");
    assert_eq!(out.data.metadata.package_version.as_deref(), Some("2013.r1"));
    assert_eq!(out.data.metadata.methods, vec!["RHF"]);

    assert_eq!(out.data.natom, Some(3));
    assert_eq!(out.data.charge, Some(0));
    assert_eq!(out.data.mult, Some(1));
    assert_eq!(out.data.atomnos.as_deref(), Some(&[8u32, 1, 1][..]));

    // Input orientation is in bohr and comes out in Angstrom.
    assert_eq!(out.data.atomcoords.len(), 1);
    assert_relative_eq!(
        out.data.atomcoords[0][0][2],
        0.2404365860 * BOHR_TO_ANGSTROM,
        max_relative = 1e-12
    );
    assert_relative_eq!(
        out.data.atomcoords[0][1][1],
        1.4325589977 * BOHR_TO_ANGSTROM,
        max_relative = 1e-12
    );

    assert_eq!(out.data.scfenergies, vec![-76.0265987166]);
    assert_eq!(out.data.scftargets, vec![vec![2.0e-5]]);
    assert_eq!(out.data.scfvalues, vec![vec![0.475646900, 0.000006900]]);
}

#[test]
fn parsing_the_same_log_twice_is_deterministic() {
    let first = parse(WATER_SP);
    let second = parse(WATER_SP);
    assert_eq!(first.data, second.data);
    assert_eq!(first.diagnostics, second.diagnostics);
}

#[test]
fn result_schema_serializes_to_json() {
    let out = parse(WATER_SP);
    let json = serde_json::to_value(&out.data).unwrap();
    assert_eq!(json["natom"], 3);
    assert_eq!(json["metadata"]["package"], "GAMESS");
    assert_relative_eq!(
        json["scfenergies"][0].as_f64().unwrap(),
        -76.0265987166
    );
}

#[test]
fn standard_orientation_supersedes_input_orientation() {
    let log = r#" TOTAL NUMBER OF ATOMS                        =    3
 ATOM      ATOMIC                      COORDINATES (BOHR)
           CHARGE         X                   Y                   Z
 O           8.0     0.0000000000        0.0000000000        0.2404365860
 H           1.0     0.0000000000        1.4325589977       -0.9617463440
 H           1.0     0.0000000000       -1.4325589977       -0.9617463440

          MAXIMUM GRADIENT =  0.0531540    RMS GRADIENT = 0.0189223
 COORDINATES OF ALL ATOMS ARE (ANGS)
   ATOM   CHARGE       X              Y              Z
 ------------------------------------------------------------
 O           8.0   0.0000000000   0.0000000000   0.1272429741
 H           1.0   0.0000000000   0.7580661282  -0.5089718964
 H           1.0   0.0000000000  -0.7580661282  -0.5089718964

          MAXIMUM GRADIENT =  0.0000100    RMS GRADIENT = 0.0000050
      ***** EQUILIBRIUM GEOMETRY LOCATED *****
 COORDINATES OF ALL ATOMS ARE (ANGS)
   ATOM   CHARGE       X              Y              Z
 ------------------------------------------------------------
 O           8.0   0.0000000000   0.0000000000   0.1272000000
 H           1.0   0.0000000000   0.7580000000  -0.5089000000
 H           1.0   0.0000000000  -0.7580000000  -0.5089000000
"#;
    let out = parse(log);
    assert!(out.is_complete(), "failure: {:?}", out.failure);

    // The first standard orientation replaces the input orientation, and
    // the re-print of the converged geometry is not collected again.
    assert_eq!(out.data.atomcoords.len(), 1);
    assert_relative_eq!(out.data.atomcoords[0][0][2], 0.1272429741);
    assert_eq!(out.data.atomnos.as_deref(), Some(&[8u32, 1, 1][..]));

    assert_eq!(
        out.data.geovalues,
        vec![[0.0531540, 0.0189223], [0.0000100, 0.0000050]]
    );
    assert_eq!(out.data.optdone.as_deref(), Some(&[1usize][..]));
}

#[test]
fn moller_plesset_orders_are_kept_lowest_first() {
    let log = r#"          RESULTS OF MOLLER-PLESSET 2ND ORDER CORRECTION ARE
            E(SCF)=      -76.0098400398
            E(2)=          -0.2328511552
            E(MP2)=       -76.2426911950
          E(MP3)      =   -76.2470577390
          E(MP4-SDQ)  =   -76.2489999999
          DONE WITH MP2 ENERGY
"#;
    let out = parse(log);
    assert!(out.is_complete(), "failure: {:?}", out.failure);
    assert_eq!(
        out.data.mpenergies,
        vec![vec![-76.2426911950, -76.2470577390, -76.2489999999]]
    );
    assert_eq!(out.data.metadata.methods, vec!["MP2", "MP3", "MP4"]);
}

#[test]
fn coupled_cluster_keeps_the_highest_correction_printed() {
    let log = r#"             CCSD    ENERGY: -76.3377492341   CORR.E:  -0.2111504963
        CCSD[T] ENERGY: -76.3400000000   CORR.E:  -0.2134012622
        CCSD(T) ENERGY: -76.3410762356   CORR.E:  -0.2144775018
 T1 DIAGNOSTIC    =   0.01017364
"#;
    let out = parse(log);
    assert!(out.is_complete(), "failure: {:?}", out.failure);
    assert_eq!(out.data.ccenergies, vec![-76.3410762356]);
    assert_eq!(
        out.data.metadata.methods,
        vec!["CCSD", "CCSD[T]", "CCSD(T)"]
    );
    assert_relative_eq!(out.data.metadata.t1_diagnostic.unwrap(), 0.01017364);
}

#[test]
fn imaginary_mode_is_negated_and_pseudo_modes_are_cut() {
    let log = r#" TOTAL NUMBER OF ATOMS                        =    3
     NORMAL COORDINATE ANALYSIS IN THE HARMONIC APPROXIMATION
 MODES 2 TO 7 ARE TAKEN AS ROTATIONS AND TRANSLATIONS.

                            1           2           3           4           5
     FREQUENCY:       825.18 I      40.31       59.24       66.77      121.68
  IR INTENSITY:      1.00000     0.00000     0.00000     0.00000     0.00000

  1  OXYGEN      X      0.07049     0.00000     0.00000     0.00000     0.00000
                 Y      0.00000     0.00000     0.00000     0.00000     0.00000
                 Z      0.00000     0.00000     0.00000     0.00000     0.00000
  2  HYDROGEN    X     -0.55945     0.00000     0.00000     0.00000     0.00000
                 Y      0.00000     0.00000     0.00000     0.00000     0.00000
                 Z      0.00000     0.00000     0.00000     0.00000     0.00000
  3  HYDROGEN    X     -0.55945     0.00000     0.00000     0.00000     0.00000
                 Y      0.00000     0.00000     0.00000     0.00000     0.00000
                 Z      0.00000     0.00000     0.00000     0.00000     0.00000

 TRANS. SAYVETZ    X     0.00000
                   Y     0.00000
                   Z     0.00000

   ROT. SAYVETZ    X     0.00000
                   Y     0.00000
                   Z     0.00000



                            6           7           8           9
     FREQUENCY:       296.88     1638.46     3250.77     3352.07
  IR INTENSITY:      0.00000     0.12345     2.00000     3.00000

  1  OXYGEN      X      0.00000     0.06908     0.00000     0.04442
                 Y      0.00000     0.00000     0.00000     0.00000
                 Z      0.00000     0.00000     0.04228     0.00000
  2  HYDROGEN    X      0.00000    -0.54825     0.00000    -0.35253
                 Y      0.00000     0.00000     0.00000     0.00000
                 Z      0.00000     0.00000    -0.33554     0.00000
  3  HYDROGEN    X      0.00000    -0.54825     0.00000    -0.35253
                 Y      0.00000     0.00000     0.00000     0.00000
                 Z      0.00000     0.00000    -0.33554     0.00000

 TRANS. SAYVETZ    X     0.00000
                   Y     0.00000
                   Z     0.00000

   ROT. SAYVETZ    X     0.00000
                   Y     0.00000
                   Z     0.00000



 REFERENCE ON SAYVETZ CONDITIONS - A. SAYVETZ, J. CHEM. PHYS. 7 (1939) 383.
"#;
    let out = parse(log);
    assert!(out.is_complete(), "failure: {:?}", out.failure);

    // Nine modes, six of them rotations and translations: three survive,
    // and the I-flagged one comes out negative.
    assert_eq!(out.data.vibfreqs.len(), 3);
    assert_relative_eq!(out.data.vibfreqs[0], -825.18);
    assert_relative_eq!(out.data.vibfreqs[1], 3250.77);
    assert_relative_eq!(out.data.vibfreqs[2], 3352.07);
    assert!(out.data.vibfreqs[1] > 0.0 && out.data.vibfreqs[2] > 0.0);

    // Intensities convert from Debye^2/(amu Angstrom^2) to km/mol.
    assert_eq!(out.data.vibirs.len(), 3);
    assert_relative_eq!(
        out.data.vibirs[0],
        DEBYE2_PER_AMU_ANGSTROM2_TO_KM_PER_MOL,
        max_relative = 1e-12
    );
    assert_relative_eq!(
        out.data.vibirs[1],
        2.0 * DEBYE2_PER_AMU_ANGSTROM2_TO_KM_PER_MOL,
        max_relative = 1e-12
    );

    // Displacements follow the same excision, one [x, y, z] per atom.
    assert_eq!(out.data.vibdisps.len(), 3);
    assert_eq!(out.data.vibdisps[0].len(), 3);
    assert_relative_eq!(out.data.vibdisps[0][0][0], 0.07049);
    assert_relative_eq!(out.data.vibdisps[0][1][0], -0.55945);
    assert_relative_eq!(out.data.vibdisps[1][1][2], -0.33554);
}

#[test]
fn l_shells_split_into_s_and_p_entries() {
    let log = r#"     ATOMIC BASIS SET
 THE CONTRACTED PRIMITIVE FUNCTIONS HAVE BEEN UNNORMALIZED

  SHELL TYPE  PRIMITIVE        EXPONENT          CONTRACTION COEFFICIENT(S)

 C

      1   S       1            71.6168370    0.15432897

      2   L       2             2.9412494   -0.09996723     0.15591627

 TOTAL NUMBER OF BASIS SET SHELLS             =    3
"#;
    let out = parse(log);
    assert!(out.is_complete(), "failure: {:?}", out.failure);

    assert_eq!(out.data.gbasis.len(), 1);
    let shells = &out.data.gbasis[0];
    assert_eq!(shells.len(), 3);
    assert_eq!(shells[0].shell_type, ShellType::S);
    assert_relative_eq!(shells[0].primitives[0].0, 71.6168370);

    // The L row becomes one S and one P shell over the same exponent, with
    // the two coefficients routed to the right entries.
    assert_eq!(shells[1].shell_type, ShellType::S);
    assert_eq!(shells[2].shell_type, ShellType::P);
    assert_relative_eq!(shells[1].primitives[0].0, 2.9412494);
    assert_relative_eq!(shells[2].primitives[0].0, 2.9412494);
    assert_relative_eq!(shells[1].primitives[0].1, -0.09996723);
    assert_relative_eq!(shells[2].primitives[0].1, 0.15591627);
}

#[test]
fn cis_excitations_with_saps_hamiltonian() {
    let log = r#"        RESULTS FROM SPIN-ADAPTED ANTISYMMETRIZED PRODUCT (SAPS)
                     CI-SINGLES EXCITATION ENERGIES
 STATE       HARTREE        EV      KCAL/MOL       CM-1         NM
 ---------------------------------------------------------------------
  1A''   0.1677341781     4.5643    105.2548      36813.40     271.64

 EXCITED STATE   1  ENERGY=      0.1677341781  S =  0.0  SPACE SYM = A''

 ----------------------------------------------
 EXCITATIONS ARE FROM OCCUPIED TO VIRTUAL ORBITALS
      FROM        TO        COEFFICIENT
 ----------------------------------------------
         4         5        0.987654
 ----------------------------------------------
 TRANSITION FROM THE GROUND STATE TO EXCITED STATE   1

 STATE MULTIPLICITIES =  1  1
 STATE ENERGIES       =  -76.0265987166  -75.8588645385
 EXCITATION ENERGY    =  0.1677341781 HARTREE
                X           Y           Z          NORM
 TRANS. DIPOLE (A.U.)   0.00000     0.12000     0.00000
 TRANS. DIPOLE (DEBYE)  0.00000     0.30500     0.00000
    0.1677341781     4.5643     0.300000     0.043600
"#;
    let out = parse(log);
    assert!(out.is_complete(), "failure: {:?}", out.failure);

    assert_eq!(out.data.etenergies, vec![0.1677341781]);
    assert_eq!(out.data.etsyms, vec!["Singlet-A''"]);
    assert_eq!(out.data.etoscs, vec![0.043600]);

    assert_eq!(out.data.etsecs.len(), 1);
    let contrib = &out.data.etsecs[0][0];
    assert_eq!(contrib.from_mo, 3);
    assert_eq!(contrib.to_mo, 4);
    assert_eq!(contrib.from_spin, Spin::Alpha);
    assert_relative_eq!(contrib.coeff, 0.987654);
}

#[test]
fn tddft_states_cover_both_row_formats() {
    let log = r#"          -------------------
          SINGLET EXCITATIONS
          -------------------

 STATE #   1  ENERGY =    3.027228 EV
 OSCILLATOR STRENGTH =    0.010000
        SYMMETRY OF STATE =   A
                EXCITATION  DE-EXCITATION
     OCC     VIR        AMPLITUDE      AMPLITUDE
      I       A            X(I->A)        Y(I->A)
     ---------------------------------------------
       8       9         -0.929190       -0.021821

 STATE #   2  ENERGY =    4.100000 EV
 OSCILLATOR STRENGTH =    0.000000
     DRT   COEF        OCC      VIR
     ------------------------------
       8  -1.105383    8 ->   9

 ..... DONE WITH TD-DFT EXCITATION ENERGIES .....
"#;
    let out = parse(log);
    assert!(out.is_complete(), "failure: {:?}", out.failure);

    assert_eq!(out.data.etenergies.len(), 2);
    assert_relative_eq!(
        out.data.etenergies[0],
        3.027228 / HARTREE_TO_EV,
        max_relative = 1e-12
    );
    assert_eq!(out.data.etoscs, vec![0.010000, 0.000000]);
    assert_eq!(out.data.etsyms, vec!["A"]);

    // The 2012 layout lists occupied, virtual, amplitude; the 2007 layout
    // puts the amplitude second and marks the pair with an arrow. Both
    // must land on the same zero-based orbital pair.
    for contribs in &out.data.etsecs {
        assert_eq!(contribs[0].from_mo, 7);
        assert_eq!(contribs[0].to_mo, 8);
    }
    assert_relative_eq!(out.data.etsecs[0][0].coeff, -0.929190);
    assert_relative_eq!(out.data.etsecs[1][0].coeff, -1.105383);
}

#[test]
fn atom_index_wraparound_in_orbital_labels_is_rebias() {
    let log = r#" TOTAL NUMBER OF ATOMS                        =  101
 NUMBER OF CARTESIAN GAUSSIAN BASIS FUNCTIONS =    5
          ------------
          EIGENVECTORS
          ------------

                      1          2          3          4          5
                  -11.0303    -0.9517    -0.5401    -0.3501    -0.2922
                     A          A          A          A          B
    1  C 98  S    0.99925   -0.11734    0.00000    0.00000   -0.00671
    2  C 99  S    0.01000    0.90000    0.00000    0.00000    0.00000
    3  C  0  S    0.00000    0.00000    0.80000    0.00000    0.00000
    4  C  0  X    0.00000    0.00000    0.00000    0.70000    0.00000
    5  C  1  S    0.00000    0.00000    0.00000    0.00000    0.60000

 ...... END OF RHF CALCULATION ......
"#;
    let out = parse(log);
    assert!(out.is_complete(), "failure: {:?}", out.failure);

    // The printed atom number wraps past two digits: 98, 99, 0, 0, 1 are
    // really atoms 98, 99, 100, 100 and 101.
    assert_eq!(
        out.data.aonames,
        vec!["C98_S", "C99_S", "C100_S", "C100_X", "C101_S"]
    );
    assert_eq!(out.data.atombasis[97], vec![0]);
    assert_eq!(out.data.atombasis[98], vec![1]);
    assert_eq!(out.data.atombasis[99], vec![2, 3]);
    assert_eq!(out.data.atombasis[100], vec![4]);

    assert_eq!(out.data.nbasis, Some(5));
    assert_eq!(out.data.nmo, Some(5));
    assert_eq!(out.data.moenergies[0].len(), 5);
    assert_relative_eq!(out.data.moenergies[0][0], -11.0303);
    assert_eq!(out.data.mosyms[0], vec!["A", "A", "A", "A", "B"]);
    assert_eq!(out.data.mocoeffs[0].shape(), (5, 5));
    assert_relative_eq!(out.data.mocoeffs[0][(0, 0)], 0.99925);
    assert_relative_eq!(out.data.mocoeffs[0][(1, 0)], -0.11734);
    assert_relative_eq!(out.data.mocoeffs[0][(4, 4)], 0.60000);
}

#[test]
fn thermochemistry_converts_to_hartree_based_units() {
    let log = r#" FINAL RHF ENERGY IS      -76.0265987166 AFTER   2 ITERATIONS
      -------------------------------
      THERMOCHEMISTRY AT T=  298.15 K
      -------------------------------

 USING IDEAL GAS, RIGID ROTOR, HARMONIC NORMAL MODE APPROXIMATIONS.
 P=  1.01325E+05 PASCAL.
 ALL FREQUENCIES ARE SCALED BY   1.00000
 THE MOMENTS OF INERTIA ARE (IN AMU*BOHR**2)
      2.31564     4.28765     6.60329
 THE ROTATIONAL SYMMETRY NUMBER IS  2.0
 THE ROTATIONAL CONSTANTS ARE (IN GHZ)
    822.06060   443.98040   288.26504
 THE HARMONIC ZERO POINT ENERGY IS (SCALED BY   1.000)
         0.020711 HARTREE/MOLECULE     4545.875299 CM**-1/MOLECULE
               E         H         G         CV        CP        S
            KCAL/MOL  KCAL/MOL  KCAL/MOL CAL/MOL-K CAL/MOL-K CAL/MOL-K
 ELEC.      0.000     0.000     0.000     0.000     0.000     0.000
 TRANS.     0.889     1.481    -3.398     2.981     4.968    16.364
 ROT.       0.889     0.889    -2.407     2.981     2.981    11.057
 VIB.      13.018    13.018    12.998     0.112     0.112     0.067
 TOTAL     14.796    15.388     7.193     6.073     8.061    27.488
"#;
    let out = parse(log);
    assert!(out.is_complete(), "failure: {:?}", out.failure);

    assert_relative_eq!(out.data.temperature.unwrap(), 298.15);
    assert_relative_eq!(out.data.pressure.unwrap(), 1.0, max_relative = 1e-12);
    assert_eq!(
        out.data.rotconsts,
        vec![vec![822.06060, 443.98040, 288.26504]]
    );
    assert_relative_eq!(out.data.zpve.unwrap(), 0.020711);

    let electronic = -76.0265987166;
    assert_relative_eq!(
        out.data.enthalpy.unwrap(),
        electronic + 15.388 / HARTREE_TO_KCAL_PER_MOL,
        max_relative = 1e-12
    );
    assert_relative_eq!(
        out.data.freeenergy.unwrap(),
        electronic + 7.193 / HARTREE_TO_KCAL_PER_MOL,
        max_relative = 1e-12
    );
    assert_relative_eq!(
        out.data.entropy.unwrap(),
        27.488 / 1000.0 / HARTREE_TO_KCAL_PER_MOL,
        max_relative = 1e-12
    );
}

#[test]
fn conflicting_basis_counts_are_reported_and_last_wins() {
    let log = r#" NUMBER OF CARTESIAN GAUSSIAN BASIS FUNCTIONS =    5
 NUMBER OF CARTESIAN GAUSSIAN BASIS FUNCTIONS =    7
"#;
    let out = parse(log);
    assert!(out.is_complete(), "failure: {:?}", out.failure);
    assert_eq!(out.data.nbasis, Some(7));

    let conflicts: Vec<_> = out
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::InconsistentAttribute)
        .collect();
    assert_eq!(conflicts.len(), 1);
    assert!(conflicts[0].message.contains("nbasis"));
}

#[test]
fn scf_table_without_its_banner_needs_an_earlier_block() {
    // Continuation tables reuse the previous SCF block's convergence
    // target; a bare header with no block before it cannot be read and
    // the scan must stop rather than invent a target.
    let log = r#" CHARGE OF MOLECULE        =    0
 SPIN MULTIPLICITY         =    1
 ITER EX DEM     TOTAL ENERGY        E CHANGE  DENSITY CHANGE     DIIS ERROR
"#;
    let out = parse(log);
    assert!(!out.is_complete());
    match out.failure {
        Some(ParseError::MissingPrecondition { block, missing }) => {
            assert_eq!(block, "SCF continuation");
            assert_eq!(missing, "scftargets");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    // Everything extracted before the abort survives.
    assert_eq!(out.data.charge, Some(0));
    assert_eq!(out.data.mult, Some(1));
    assert!(out.data.scfvalues.is_empty());
}

#[test]
fn unreadable_energy_field_stops_the_scan_with_context() {
    let log = r#" CHARGE OF MOLECULE        =    0
 SPIN MULTIPLICITY         =    1
 FINAL RHF ENERGY IS      ***********  AFTER   2 ITERATIONS
"#;
    let out = parse(log);
    match out.failure {
        Some(ParseError::MalformedBlock { block, line, .. }) => {
            assert_eq!(block, "final energy");
            assert_eq!(line, 3);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(out.data.charge, Some(0));
    assert!(out.data.scfenergies.is_empty());
}

#[test]
fn echoed_input_cards_never_reach_later_triggers() {
    let log = r#" INPUT CARD> ! TOTAL NUMBER OF ATOMS = 99
 TOTAL NUMBER OF ATOMS                        =    3
"#;
    let out = parse(log);
    assert!(out.is_complete(), "failure: {:?}", out.failure);
    assert_eq!(out.data.natom, Some(3));
    assert!(out.diagnostics.is_empty());
}
