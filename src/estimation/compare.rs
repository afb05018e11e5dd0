//! estimation::compare — two-model estimation and coefficient comparison.
//!
//! Purpose
//! -------
//! Fit the two competing specifications of the double-demeaning
//! methodology and line their coefficients up for comparison:
//!
//! ```text
//! standard:        Y ~ X + Z + int_X_Z    + W… + unit fixed effects
//! double-demeaned: Y ~ X + Z + dd_int_X_Z + W… + unit fixed effects
//! ```
//!
//! both with cluster-robust (by unit), debiased standard errors, after
//! filtering the control set through the within-unit variation check.
//!
//! Key behaviors
//! -------------
//! - Controls whose fraction of varying units falls below the threshold
//!   (5% in the pipeline) are *excluded from the specification*, not
//!   merely flagged: a control with no within-unit variation is
//!   collinear with the unit fixed effects. Exclusions are reported in
//!   the result and as `tracing::warn!` events.
//! - Y, X, and Z are never excluded; a low-variation warning is emitted
//!   for them below [`LOW_VARIATION_WARN`].
//! - [`coefficient_pairs`] is the one place that maps the standard
//!   model's coefficient names onto the double-demeaned model's
//!   (pairing `int_X_Z` with `dd_int_X_Z` and every other common name
//!   with itself, in the standard model's estimation order). Both the
//!   comparison table and the Hausman test consume this mapping.
//! - The comparison table lists the interaction pair last, after all
//!   other common coefficients, and its `difference` column is signed
//!   standard − double-demeaned.
//!
//! Invariants & assumptions
//! ------------------------
//! - Both fits share the same control set, so every kept control is a
//!   common coefficient by construction.
//!
//! Downstream usage
//! ----------------
//! - The analysis orchestrator calls [`estimate_fe_models`] once per
//!   analysis; the Hausman test reuses the [`CoefficientPair`] list from
//!   the returned [`ModelComparison`].
//!
//! Testing notes
//! -------------
//! - Unit tests cover control exclusion, pairing order and the
//!   interaction mapping, the table's ordering and difference sign, and
//!   propagation of engine failures.

use tracing::{info, warn};

use crate::demean::transform::InteractionNames;
use crate::estimation::engine::{Design, FitOptions, FixedEffectsEngine, ModelFit};
use crate::estimation::errors::EstimationResult;
use crate::panel::data::{PanelData, PanelIndex};
use crate::panel::variation::{check_within_unit_variation, VariationSummary};
use ndarray::{Array1, Array2};

/// Below this fraction of varying units, a *non-control* analysis
/// variable draws a warning (controls are excluded at the caller's
/// threshold instead).
pub const LOW_VARIATION_WARN: f64 = 0.10;

/// CoefficientPair — one aligned coefficient across the two models.
///
/// Fields
/// ------
/// - `label`: display name (the standard model's name).
/// - `standard_name`: coefficient name in the standard fit.
/// - `dd_name`: coefficient name in the double-demeaned fit — equal to
///   `standard_name` except for the interaction, where `int_X_Z` maps to
///   `dd_int_X_Z`.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientPair {
    pub label: String,
    pub standard_name: String,
    pub dd_name: String,
}

/// ComparisonRecord — one row of the coefficient comparison table.
///
/// Fields hold the standard-FE coefficient and standard error, the
/// double-demeaned coefficient and standard error, and the signed
/// difference (standard − double-demeaned).
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRecord {
    pub variable: String,
    pub standard_coef: f64,
    pub standard_se: f64,
    pub dd_coef: f64,
    pub dd_se: f64,
    pub difference: f64,
}

/// ModelComparison — both fits plus everything needed to compare them.
///
/// Fields
/// ------
/// - `standard`, `double_demeaned`: the two fits, opaque engine results.
/// - `pairs`: aligned coefficient names, in the standard model's
///   estimation order (the Hausman test consumes these).
/// - `table`: comparison records, interaction pair last.
/// - `kept_controls`, `excluded_controls`: the variation filter's
///   decision, in input order.
/// - `variation`: variation summaries for Y, X, Z, and every candidate
///   control, in that order.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelComparison {
    pub standard: ModelFit,
    pub double_demeaned: ModelFit,
    pub pairs: Vec<CoefficientPair>,
    pub table: Vec<ComparisonRecord>,
    pub kept_controls: Vec<String>,
    pub excluded_controls: Vec<String>,
    pub variation: Vec<VariationSummary>,
}

/// Fit the standard and double-demeaned specifications and compare them.
///
/// Parameters
/// ----------
/// - `data`: transformed panel (the derived interaction columns must
///   exist; see `demean::transform`).
/// - `index`: validated grouping of `data` by unit.
/// - `y_var`: dependent variable name.
/// - `names`: interaction naming for the (X, Z) pair.
/// - `w_vars`: candidate control variables, filtered here.
/// - `engine`: the fixed-effects regression capability.
/// - `variation_threshold`: minimum fraction of varying units a control
///   needs to stay in the specification (0.05 in the pipeline).
///
/// Returns
/// -------
/// `EstimationResult<ModelComparison>`
///   Both fits and the comparison artifacts, or the first error from
///   design assembly or the engine. Engine failures for either primary
///   fit are never swallowed.
///
/// Errors
/// ------
/// - `EstimationError::Panel`
///   A required column is absent or non-numeric after filtering.
/// - Engine variants (`Singular`, `TooFewClusters`, …) from either fit.
pub fn estimate_fe_models(
    data: &PanelData, index: &PanelIndex, y_var: &str, names: &InteractionNames,
    w_vars: &[String], engine: &dyn FixedEffectsEngine, variation_threshold: f64,
) -> EstimationResult<ModelComparison> {
    // Variation bookkeeping for the primary variables (never excluded).
    let mut variation = Vec::with_capacity(3 + w_vars.len());
    for var in [y_var, names.x.as_str(), names.z.as_str()] {
        let summary = check_within_unit_variation(data, index, var, variation_threshold)?;
        if summary.fraction_with_variation < LOW_VARIATION_WARN {
            warn!(
                variable = var,
                fraction = summary.fraction_with_variation,
                "limited within-unit variation"
            );
        }
        variation.push(summary);
    }

    // Controls below the threshold cannot be identified under fixed
    // effects; exclude them from the specification.
    let mut kept_controls = Vec::new();
    let mut excluded_controls = Vec::new();
    for w in w_vars {
        let summary = check_within_unit_variation(data, index, w, variation_threshold)?;
        if summary.meets_threshold {
            kept_controls.push(w.clone());
        } else {
            warn!(
                control = w.as_str(),
                fraction = summary.fraction_with_variation,
                "control excluded: insufficient within-unit variation for fixed effects"
            );
            excluded_controls.push(w.clone());
        }
        variation.push(summary);
    }
    if !excluded_controls.is_empty() {
        info!(excluded = ?excluded_controls, "controls dropped by the variation filter");
    }

    let mut standard_regressors: Vec<String> =
        vec![names.x.clone(), names.z.clone(), names.interaction.clone()];
    standard_regressors.extend(kept_controls.iter().cloned());
    let mut dd_regressors: Vec<String> =
        vec![names.x.clone(), names.z.clone(), names.dd_interaction.clone()];
    dd_regressors.extend(kept_controls.iter().cloned());

    let options = FitOptions::default();
    let standard = engine.fit(&build_design(data, y_var, &standard_regressors)?, index, &options)?;
    let double_demeaned =
        engine.fit(&build_design(data, y_var, &dd_regressors)?, index, &options)?;

    let pairs = coefficient_pairs(&standard, &double_demeaned, names);
    let table = comparison_table(&standard, &double_demeaned, &pairs, names);

    Ok(ModelComparison {
        standard,
        double_demeaned,
        pairs,
        table,
        kept_controls,
        excluded_controls,
        variation,
    })
}

/// Align coefficient names across the two fits.
///
/// Walks the standard model's names in estimation order, mapping the
/// interaction name to its double-demeaned counterpart and keeping every
/// other name present in both fits. This is the single mapping used by
/// the comparison table and the Hausman test; the original research code
/// duplicated this rewriting in two places.
pub fn coefficient_pairs(
    standard: &ModelFit, double_demeaned: &ModelFit, names: &InteractionNames,
) -> Vec<CoefficientPair> {
    let mut pairs = Vec::new();
    for name in standard.names() {
        if name == &names.interaction {
            if double_demeaned.position(&names.dd_interaction).is_some() {
                pairs.push(CoefficientPair {
                    label: name.clone(),
                    standard_name: name.clone(),
                    dd_name: names.dd_interaction.clone(),
                });
            }
        } else if double_demeaned.position(name).is_some() {
            pairs.push(CoefficientPair {
                label: name.clone(),
                standard_name: name.clone(),
                dd_name: name.clone(),
            });
        }
    }
    pairs
}

/// Build the comparison table, interaction pair last.
fn comparison_table(
    standard: &ModelFit, double_demeaned: &ModelFit, pairs: &[CoefficientPair],
    names: &InteractionNames,
) -> Vec<ComparisonRecord> {
    let mut ordered: Vec<&CoefficientPair> =
        pairs.iter().filter(|p| p.standard_name != names.interaction).collect();
    ordered.extend(pairs.iter().filter(|p| p.standard_name == names.interaction));

    ordered
        .into_iter()
        .filter_map(|pair| {
            let standard_coef = standard.coef(&pair.standard_name)?;
            let standard_se = standard.std_error(&pair.standard_name)?;
            let dd_coef = double_demeaned.coef(&pair.dd_name)?;
            let dd_se = double_demeaned.std_error(&pair.dd_name)?;
            Some(ComparisonRecord {
                variable: pair.label.clone(),
                standard_coef,
                standard_se,
                dd_coef,
                dd_se,
                difference: standard_coef - dd_coef,
            })
        })
        .collect()
}

/// Assemble a [`Design`] from named numeric columns.
fn build_design(
    data: &PanelData, response: &str, regressors: &[String],
) -> EstimationResult<Design> {
    let y = data.numeric(response)?.clone();
    let n = y.len();
    let k = regressors.len();
    let mut matrix = Array2::<f64>::zeros((n, k));
    for (j, name) in regressors.iter().enumerate() {
        let column: &Array1<f64> = data.numeric(name)?;
        for r in 0..n {
            matrix[[r, j]] = column[r];
        }
    }
    Ok(Design::new(y, matrix, regressors.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demean::transform::create_double_demeaned_interaction;
    use crate::estimation::engine::WithinEstimator;
    use crate::panel::data::Column;
    use crate::panel::validation::validate_panel;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Control exclusion below the variation threshold and its
    //   reporting.
    // - Pairing order, the interaction mapping, and the comparison
    //   table's ordering and difference sign.
    //
    // They intentionally DO NOT cover:
    // - Engine numerics (estimation::engine tests) or the Hausman test
    //   built on the pairs (statistical_tests tests).
    // -------------------------------------------------------------------------

    /// Deterministic panel with 5 units × 6 periods, a usable control
    /// "w_good", and a control "w_flat" that never varies within units.
    fn transformed_panel() -> (PanelData, PanelIndex, InteractionNames) {
        let mut units = Vec::new();
        let mut times = Vec::new();
        let mut x = Vec::new();
        let mut z = Vec::new();
        let mut w_good = Vec::new();
        let mut w_flat = Vec::new();
        let mut y = Vec::new();
        for u in 0..5_i64 {
            for t in 0..6_i64 {
                let (uf, tf) = (u as f64, t as f64);
                let xi = (1.1 * tf + 0.4 * uf).sin() + 0.5 * tf;
                let zi = (0.7 * tf - 0.9 * uf).cos() + 0.2 * tf * tf;
                let wg = (0.3 * tf + 1.7 * uf).sin();
                units.push(u);
                times.push(t);
                x.push(xi);
                z.push(zi);
                w_good.push(wg);
                w_flat.push(3.0 + uf);
                y.push(1.5 * xi - 0.8 * zi + 0.4 * xi * zi + 0.6 * wg + 5.0 * uf
                    + (2.3 * tf + uf).sin() * 0.1);
            }
        }
        let data = PanelData::from_columns(vec![
            ("unit".to_string(), Column::Keys(units.into_iter().map(Some).collect())),
            ("time".to_string(), Column::Keys(times.into_iter().map(Some).collect())),
            ("y".to_string(), Column::Numeric(Array1::from(y))),
            ("x".to_string(), Column::Numeric(Array1::from(x))),
            ("z".to_string(), Column::Numeric(Array1::from(z))),
            ("w_good".to_string(), Column::Numeric(Array1::from(w_good))),
            ("w_flat".to_string(), Column::Numeric(Array1::from(w_flat))),
        ])
        .expect("columns share one length");
        let (index, _) = validate_panel(&data, "unit", "time").expect("valid panel");
        let names = InteractionNames::new("x", "z");
        let transformed =
            create_double_demeaned_interaction(&data, &index, &names).expect("x and z exist");
        (transformed, index, names)
    }

    #[test]
    // Purpose
    // -------
    // Verify that a control with zero within-unit variation is excluded
    // from both specifications and reported, while a varying control is
    // kept.
    //
    // Given
    // -----
    // - Controls "w_good" (varies within units) and "w_flat" (constant
    //   within every unit).
    //
    // Expect
    // ------
    // - "w_flat" in `excluded_controls` and absent from both fits'
    //   names; "w_good" kept and present in both fits.
    fn estimate_fe_models_excludes_flat_controls() {
        // Arrange
        let (data, index, names) = transformed_panel();
        let w_vars = vec!["w_good".to_string(), "w_flat".to_string()];

        // Act
        let comparison = estimate_fe_models(
            &data,
            &index,
            "y",
            &names,
            &w_vars,
            &WithinEstimator,
            0.05,
        )
        .expect("well-posed models");

        // Assert
        assert_eq!(comparison.kept_controls, vec!["w_good".to_string()]);
        assert_eq!(comparison.excluded_controls, vec!["w_flat".to_string()]);
        assert!(comparison.standard.position("w_flat").is_none());
        assert!(comparison.double_demeaned.position("w_flat").is_none());
        assert!(comparison.standard.position("w_good").is_some());
        assert!(comparison.double_demeaned.position("w_good").is_some());
    }

    #[test]
    // Purpose
    // -------
    // Verify the coefficient pairing: estimation order preserved, the
    // interaction mapped across names, everything else mapped to itself.
    //
    // Given
    // -----
    // - The two fits from the deterministic panel with one kept control.
    //
    // Expect
    // ------
    // - Pairs are [x, z, int_x_z→dd_int_x_z, w_good] in that order.
    fn coefficient_pairs_map_interaction_and_preserve_order() {
        // Arrange
        let (data, index, names) = transformed_panel();
        let comparison = estimate_fe_models(
            &data,
            &index,
            "y",
            &names,
            &["w_good".to_string()],
            &WithinEstimator,
            0.05,
        )
        .expect("well-posed models");

        // Act
        let labels: Vec<&str> =
            comparison.pairs.iter().map(|p| p.label.as_str()).collect();

        // Assert
        assert_eq!(labels, vec!["x", "z", "int_x_z", "w_good"]);
        let interaction_pair = &comparison.pairs[2];
        assert_eq!(interaction_pair.standard_name, "int_x_z");
        assert_eq!(interaction_pair.dd_name, "dd_int_x_z");
        for pair in [&comparison.pairs[0], &comparison.pairs[1], &comparison.pairs[3]] {
            assert_eq!(pair.standard_name, pair.dd_name);
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify the comparison table: interaction row last, difference
    // signed standard − double-demeaned, rows consistent with the fits.
    //
    // Given
    // -----
    // - The comparison from the deterministic panel.
    //
    // Expect
    // ------
    // - Last row is the interaction; each row's difference equals the
    //   recomputed standard − DD coefficient difference.
    fn comparison_table_orders_interaction_last_with_signed_difference() {
        // Arrange
        let (data, index, names) = transformed_panel();
        let comparison = estimate_fe_models(
            &data,
            &index,
            "y",
            &names,
            &[],
            &WithinEstimator,
            0.05,
        )
        .expect("well-posed models");

        // Act
        let table = &comparison.table;

        // Assert
        assert_eq!(table.last().expect("non-empty table").variable, "int_x_z");
        for record in table {
            let standard = comparison
                .standard
                .coef(&record.variable)
                .expect("standard coefficient exists");
            let dd_name = if record.variable == names.interaction {
                names.dd_interaction.clone()
            } else {
                record.variable.clone()
            };
            let dd = comparison
                .double_demeaned
                .coef(&dd_name)
                .expect("double-demeaned coefficient exists");
            assert!((record.difference - (standard - dd)).abs() < 1e-12);
        }
    }
}
