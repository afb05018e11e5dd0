//! demean::transform — the double-demeaning transformation.
//!
//! Purpose
//! -------
//! Implement the core construction of Giesselmann & Schmidt-Catran
//! (2022, Sociological Methods & Research 51(3), 1100–1127): demean the
//! two interacting variables *within units first*, then multiply the
//! demeaned series to form the interaction term, instead of multiplying
//! raw variables and relying on the fixed effects to absorb the bias.
//!
//! Key behaviors
//! -------------
//! - Augment a copy of the panel with six derived columns per (X, Z)
//!   pair: within-unit means (`mean_X`, `mean_Z`), within-unit
//!   deviations (`dm_X`, `dm_Z`), the raw interaction `int_X_Z = X·Z`,
//!   and the double-demeaned interaction `dd_int_X_Z = dm_X·dm_Z`.
//! - Centralize all derived-column naming — and the mapping between the
//!   standard and double-demeaned interaction *coefficients* — in
//!   [`InteractionNames`], the single source of truth used by the
//!   comparison table and the Hausman test alike.
//!
//! Invariants & assumptions
//! ------------------------
//! - For every unit u, the mean of `dm_X` (and `dm_Z`) over u's rows is
//!   zero to floating-point precision; tests enforce |mean| < 1e-9.
//! - `int_X_Z` and `dd_int_X_Z` are structurally different quantities;
//!   both are retained, and they coincide only in degenerate panels with
//!   no within-unit variation in X or Z.
//! - The transform is pure and deterministic: the input table is
//!   borrowed read-only and the augmented copy is returned.
//!
//! Conventions
//! -----------
//! - Within-unit means are recomputed on every call and never persisted
//!   beyond the returned table.
//!
//! Downstream usage
//! ----------------
//! - The estimator builds the standard specification on `int_X_Z` and
//!   the double-demeaned specification on `dd_int_X_Z`; X and Z
//!   themselves enter both specifications untransformed (the engine's
//!   within transformation handles the fixed effects).
//!
//! Testing notes
//! -------------
//! - Unit tests cover the zero-within-mean invariant on a seeded random
//!   panel, the worked two-period example from the reference
//!   methodology, non-identity of the two interaction columns, and
//!   purity of the transform.

use ndarray::Array1;

use crate::panel::data::{PanelData, PanelIndex};
use crate::panel::errors::PanelResult;

/// InteractionNames — derived-column and coefficient naming for one
/// (X, Z) interaction pair.
///
/// Purpose
/// -------
/// Hold every derived name the pipeline needs for one interaction pair,
/// so that the transformer, the model specifications, the comparison
/// table, and the Hausman test all agree on names by construction. The
/// original research code rewrote these names with string formatting in
/// several places with slightly different logic; this type is the single
/// replacement for all of them.
///
/// Fields
/// ------
/// - `x`, `z`: the raw interacting variable names.
/// - `mean_x`, `mean_z`: within-unit mean columns (`mean_X`).
/// - `dm_x`, `dm_z`: within-unit deviation columns (`dm_X`).
/// - `interaction`: raw product column/coefficient (`int_X_Z`).
/// - `dd_interaction`: double-demeaned product column/coefficient
///   (`dd_int_X_Z`).
///
/// Notes
/// -----
/// - `interaction` names the coefficient in the *standard* model and
///   `dd_interaction` the corresponding coefficient in the
///   *double-demeaned* model; the coefficient-pairing logic in
///   `estimation::compare` maps one to the other through this type.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionNames {
    pub x: String,
    pub z: String,
    pub mean_x: String,
    pub mean_z: String,
    pub dm_x: String,
    pub dm_z: String,
    pub interaction: String,
    pub dd_interaction: String,
}

impl InteractionNames {
    /// Derive all names for the interaction of `x` and `z`.
    pub fn new(x: &str, z: &str) -> InteractionNames {
        InteractionNames {
            x: x.to_string(),
            z: z.to_string(),
            mean_x: format!("mean_{x}"),
            mean_z: format!("mean_{z}"),
            dm_x: format!("dm_{x}"),
            dm_z: format!("dm_{z}"),
            interaction: format!("int_{x}_{z}"),
            dd_interaction: format!("dd_int_{x}_{z}"),
        }
    }
}

/// Create the double-demeaned interaction columns.
///
/// Parameters
/// ----------
/// - `data`: the panel table; borrowed read-only.
/// - `index`: validated grouping of `data` by unit.
/// - `names`: derived-column names for the (X, Z) pair, from
///   [`InteractionNames::new`].
///
/// Returns
/// -------
/// `PanelResult<PanelData>`
///   A copy of `data` augmented with the six derived columns, or a
///   typed-access error when X or Z is absent or not numeric.
///
/// Errors
/// ------
/// - `PanelError::ColumnNotFound` / `PanelError::NotNumeric`
///   X or Z is missing or has the wrong type.
///
/// Notes
/// -----
/// - Existing columns with the derived names are replaced, which makes
///   rerunning an analysis over the same table idempotent.
pub fn create_double_demeaned_interaction(
    data: &PanelData, index: &PanelIndex, names: &InteractionNames,
) -> PanelResult<PanelData> {
    let x = data.numeric(&names.x)?.clone();
    let z = data.numeric(&names.z)?.clone();

    let mean_x = within_unit_means(&x, index);
    let mean_z = within_unit_means(&z, index);
    let dm_x = &x - &mean_x;
    let dm_z = &z - &mean_z;
    let interaction = &x * &z;
    let dd_interaction = &dm_x * &dm_z;

    let mut augmented = data.clone();
    augmented.insert_numeric(&names.mean_x, mean_x)?;
    augmented.insert_numeric(&names.mean_z, mean_z)?;
    augmented.insert_numeric(&names.dm_x, dm_x)?;
    augmented.insert_numeric(&names.dm_z, dm_z)?;
    augmented.insert_numeric(&names.interaction, interaction)?;
    augmented.insert_numeric(&names.dd_interaction, dd_interaction)?;
    Ok(augmented)
}

/// Broadcast each unit's mean of `values` back onto that unit's rows.
fn within_unit_means(values: &Array1<f64>, index: &PanelIndex) -> Array1<f64> {
    let mut means = Array1::<f64>::zeros(values.len());
    for group in index.groups() {
        let sum: f64 = group.iter().map(|&row| values[row]).sum();
        let mean = sum / group.len() as f64;
        for &row in group {
            means[row] = mean;
        }
    }
    means
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::data::Column;
    use crate::panel::validation::validate_panel;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The zero-within-unit-mean invariant of the demeaned columns on a
    //   seeded random panel.
    // - The worked two-period example from the reference methodology.
    // - Non-identity of the raw and double-demeaned interaction columns.
    // - Purity of the transform (input unchanged) and derived naming.
    //
    // They intentionally DO NOT cover:
    // - Model estimation on the derived columns; that is exercised in
    //   estimation tests and the integration pipeline.
    // -------------------------------------------------------------------------

    fn build_panel(units: Vec<i64>, times: Vec<i64>, x: Vec<f64>, z: Vec<f64>) -> PanelData {
        PanelData::from_columns(vec![
            ("unit".to_string(), Column::Keys(units.into_iter().map(Some).collect())),
            ("time".to_string(), Column::Keys(times.into_iter().map(Some).collect())),
            ("x".to_string(), Column::Numeric(Array1::from(x))),
            ("z".to_string(), Column::Numeric(Array1::from(z))),
        ])
        .expect("columns share one length")
    }

    #[test]
    // Purpose
    // -------
    // Verify that on a randomly generated panel every unit's demeaned X
    // and Z average to zero within 1e-9.
    //
    // Given
    // -----
    // - 40 units with 2–6 periods each, X and Z drawn from seeded
    //   normal distributions.
    //
    // Expect
    // ------
    // - |mean(dm_x)| < 1e-9 and |mean(dm_z)| < 1e-9 within every unit.
    fn transform_demeaned_columns_have_zero_within_unit_mean() {
        // Arrange
        let mut rng = StdRng::seed_from_u64(42);
        let normal = Normal::new(0.0, 3.0).expect("valid parameters");
        let mut units = Vec::new();
        let mut times = Vec::new();
        let mut x = Vec::new();
        let mut z = Vec::new();
        for unit in 0..40_i64 {
            let periods = 2 + unit % 5;
            for t in 0..periods {
                units.push(unit);
                times.push(t);
                x.push(normal.sample(&mut rng) + unit as f64);
                z.push(normal.sample(&mut rng) - unit as f64);
            }
        }
        let data = build_panel(units, times, x, z);
        let (index, _) = validate_panel(&data, "unit", "time").expect("valid panel");
        let names = InteractionNames::new("x", "z");

        // Act
        let augmented =
            create_double_demeaned_interaction(&data, &index, &names).expect("x and z exist");

        // Assert
        let dm_x = augmented.numeric(&names.dm_x).expect("created");
        let dm_z = augmented.numeric(&names.dm_z).expect("created");
        for group in index.groups() {
            let mean_x: f64 =
                group.iter().map(|&row| dm_x[row]).sum::<f64>() / group.len() as f64;
            let mean_z: f64 =
                group.iter().map(|&row| dm_z[row]).sum::<f64>() / group.len() as f64;
            assert!(mean_x.abs() < 1e-9, "within-unit mean of dm_x was {mean_x}");
            assert!(mean_z.abs() < 1e-9, "within-unit mean of dm_z was {mean_z}");
        }
    }

    #[test]
    // Purpose
    // -------
    // Reproduce the worked example from the reference methodology.
    //
    // Given
    // -----
    // - Unit 1 with X = [1, 3] (mean 2) and Z = [2, 4] (mean 3); a
    //   second unit so the panel has more than one group.
    //
    // Expect
    // ------
    // - Demeaned X = [-1, 1], demeaned Z = [-1, 1], so the
    //   double-demeaned interaction is exactly [1, 1] for unit 1, while
    //   the raw interaction is [2, 12].
    fn transform_reproduces_worked_two_period_example() {
        // Arrange
        let data = build_panel(
            vec![1, 1, 2, 2],
            vec![1, 2, 1, 2],
            vec![1.0, 3.0, 2.0, 4.0],
            vec![2.0, 4.0, 1.0, 3.0],
        );
        let (index, _) = validate_panel(&data, "unit", "time").expect("valid panel");
        let names = InteractionNames::new("x", "z");

        // Act
        let augmented =
            create_double_demeaned_interaction(&data, &index, &names).expect("x and z exist");

        // Assert
        let dm_x = augmented.numeric(&names.dm_x).expect("created");
        let dm_z = augmented.numeric(&names.dm_z).expect("created");
        let dd = augmented.numeric(&names.dd_interaction).expect("created");
        let raw = augmented.numeric(&names.interaction).expect("created");
        assert_eq!(dm_x.slice(ndarray::s![0..2]).to_vec(), vec![-1.0, 1.0]);
        assert_eq!(dm_z.slice(ndarray::s![0..2]).to_vec(), vec![-1.0, 1.0]);
        assert_eq!(dd.slice(ndarray::s![0..2]).to_vec(), vec![1.0, 1.0]);
        assert_eq!(raw.slice(ndarray::s![0..2]).to_vec(), vec![2.0, 12.0]);
    }

    #[test]
    // Purpose
    // -------
    // Verify that the raw and double-demeaned interaction columns differ
    // whenever some unit has within-unit variation in both X and Z — a
    // broken transform that demeans nothing would make them identical.
    //
    // Given
    // -----
    // - The worked-example panel, where both units vary in X and Z.
    //
    // Expect
    // ------
    // - At least one row differs between `int_x_z` and `dd_int_x_z`.
    fn transform_interaction_columns_are_not_identical() {
        // Arrange
        let data = build_panel(
            vec![1, 1, 2, 2],
            vec![1, 2, 1, 2],
            vec![1.0, 3.0, 2.0, 4.0],
            vec![2.0, 4.0, 1.0, 3.0],
        );
        let (index, _) = validate_panel(&data, "unit", "time").expect("valid panel");
        let names = InteractionNames::new("x", "z");

        // Act
        let augmented =
            create_double_demeaned_interaction(&data, &index, &names).expect("x and z exist");

        // Assert
        let raw = augmented.numeric(&names.interaction).expect("created");
        let dd = augmented.numeric(&names.dd_interaction).expect("created");
        let differs = raw.iter().zip(dd.iter()).any(|(a, b)| (a - b).abs() > 1e-12);
        assert!(differs, "raw and double-demeaned interactions must not coincide");
    }

    #[test]
    // Purpose
    // -------
    // Verify the transform is pure: the input table is unchanged and the
    // augmented copy gains exactly the six derived columns.
    //
    // Given
    // -----
    // - The worked-example panel with 4 input columns.
    //
    // Expect
    // ------
    // - The input compares equal to a pristine clone; the output has
    //   4 + 6 columns with the names from `InteractionNames`.
    fn transform_is_pure_and_adds_six_columns() {
        // Arrange
        let data = build_panel(
            vec![1, 1, 2, 2],
            vec![1, 2, 1, 2],
            vec![1.0, 3.0, 2.0, 4.0],
            vec![2.0, 4.0, 1.0, 3.0],
        );
        let pristine = data.clone();
        let (index, _) = validate_panel(&data, "unit", "time").expect("valid panel");
        let names = InteractionNames::new("x", "z");

        // Act
        let augmented =
            create_double_demeaned_interaction(&data, &index, &names).expect("x and z exist");

        // Assert
        assert_eq!(data, pristine);
        assert_eq!(augmented.n_columns(), data.n_columns() + 6);
        for name in [
            &names.mean_x,
            &names.mean_z,
            &names.dm_x,
            &names.dm_z,
            &names.interaction,
            &names.dd_interaction,
        ] {
            assert!(augmented.contains(name), "expected derived column '{name}'");
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify the derived naming scheme itself.
    //
    // Given
    // -----
    // - Variables "inc" and "stringency".
    //
    // Expect
    // ------
    // - Names follow mean_/dm_/int_/dd_int_ conventions.
    fn interaction_names_follow_conventions() {
        // Arrange & Act
        let names = InteractionNames::new("inc", "stringency");

        // Assert
        assert_eq!(names.mean_x, "mean_inc");
        assert_eq!(names.dm_z, "dm_stringency");
        assert_eq!(names.interaction, "int_inc_stringency");
        assert_eq!(names.dd_interaction, "dd_int_inc_stringency");
    }
}
