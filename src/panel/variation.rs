//! panel::variation — within-unit variation statistics for panel variables.
//!
//! Purpose
//! -------
//! Measure, per variable, how many units show any within-unit variation
//! over time. A variable that is constant within every unit is perfectly
//! collinear with the unit fixed effects and cannot enter a fixed-effects
//! specification; the estimator uses these statistics to *exclude* such
//! controls rather than merely warn about them.
//!
//! Key behaviors
//! -------------
//! - A unit "has variation" in a variable iff it has more than one
//!   observation and a within-unit sample standard deviation strictly
//!   greater than [`VARIATION_EPS`].
//! - [`check_within_unit_variation`] reports counts, the fraction of
//!   units with variation, and whether that fraction meets the caller's
//!   threshold (default [`DEFAULT_VARIATION_THRESHOLD`], i.e. 5% of
//!   units).
//! - An absent variable is an `Err(ColumnNotFound)`: the checker reports
//!   the condition and the *caller* decides whether to escalate, matching
//!   the discriminated-result contract of the surrounding pipeline.
//!
//! Invariants & assumptions
//! ------------------------
//! - Standard deviations use the sample convention (n − 1 denominator);
//!   a single observation contributes a standard deviation of zero.
//! - Missing values are expected to have been removed by listwise
//!   deletion before the check; a remaining NaN propagates into that
//!   unit's standard deviation and the unit counts as having no
//!   variation.
//!
//! Downstream usage
//! ----------------
//! - `estimation::compare` filters control variables through this check
//!   (threshold 5%) and reports exclusions; the analysis orchestrator
//!   also records summaries for Y, X, and Z for diagnostics.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the between-only / within-everywhere extremes, the
//!   single-observation rule, the threshold boundary, and the decomposed
//!   standard deviations.

use tracing::debug;

use crate::panel::data::{PanelData, PanelIndex};
use crate::panel::errors::PanelResult;

/// Within-unit standard deviations at or below this value count as "no
/// variation"; guards against float noise presenting as variation.
pub const VARIATION_EPS: f64 = 1e-10;

/// Default minimum fraction of units that must show within-unit variation
/// for a variable to be considered usable under fixed effects.
pub const DEFAULT_VARIATION_THRESHOLD: f64 = 0.05;

/// VariationSummary — within-unit variation statistics for one variable.
///
/// Purpose
/// -------
/// Describe how a variable varies within and between units, and whether
/// it clears the threshold for inclusion in a fixed-effects
/// specification.
///
/// Fields
/// ------
/// - `variable`: the variable name the summary describes.
/// - `total_units`, `units_with_variation`, `units_without_variation`:
///   unit counts under the variation rule (> 1 observation and
///   within-unit std > [`VARIATION_EPS`]).
/// - `fraction_with_variation`: `units_with_variation / total_units`.
/// - `meets_threshold`, `threshold`: whether the fraction reaches the
///   threshold the check was run with.
/// - `overall_std`: sample standard deviation over all observations.
/// - `mean_within_std`: average of per-unit standard deviations.
/// - `between_std`: sample standard deviation of the unit means.
///
/// Invariants
/// ----------
/// - `units_with_variation + units_without_variation == total_units`.
/// - `fraction_with_variation` lies in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct VariationSummary {
    pub variable: String,
    pub total_units: usize,
    pub units_with_variation: usize,
    pub units_without_variation: usize,
    pub fraction_with_variation: f64,
    pub meets_threshold: bool,
    pub threshold: f64,
    pub overall_std: f64,
    pub mean_within_std: f64,
    pub between_std: f64,
}

/// Check within-unit variation for one variable.
///
/// Parameters
/// ----------
/// - `data`: the panel table.
/// - `index`: validated grouping of `data` by unit.
/// - `variable`: numeric column to check.
/// - `threshold`: minimum fraction of units that must show variation for
///   `meets_threshold` to hold; [`DEFAULT_VARIATION_THRESHOLD`] in the
///   pipeline.
///
/// Returns
/// -------
/// `PanelResult<VariationSummary>`
///   The statistics, or a typed-access error (`ColumnNotFound` /
///   `NotNumeric`) the caller decides how to escalate.
///
/// Notes
/// -----
/// - The threshold comparison is `fraction >= threshold`, so a variable
///   sitting exactly on the threshold is considered usable.
pub fn check_within_unit_variation(
    data: &PanelData, index: &PanelIndex, variable: &str, threshold: f64,
) -> PanelResult<VariationSummary> {
    let values = data.numeric(variable)?;

    let total_units = index.n_units();
    let mut units_with_variation = 0_usize;
    let mut within_stds: Vec<f64> = Vec::with_capacity(total_units);
    let mut unit_means: Vec<f64> = Vec::with_capacity(total_units);

    for group in index.groups() {
        let unit_values: Vec<f64> = group.iter().map(|&row| values[row]).collect();
        let mean = mean_of(&unit_values);
        let std = sample_std(&unit_values, mean);
        if group.len() > 1 && std > VARIATION_EPS {
            units_with_variation += 1;
        }
        within_stds.push(std);
        unit_means.push(mean);
    }

    let fraction_with_variation =
        if total_units > 0 { units_with_variation as f64 / total_units as f64 } else { 0.0 };
    let all: Vec<f64> = values.iter().copied().collect();
    let overall_mean = mean_of(&all);
    let between_mean = mean_of(&unit_means);

    let summary = VariationSummary {
        variable: variable.to_string(),
        total_units,
        units_with_variation,
        units_without_variation: total_units - units_with_variation,
        fraction_with_variation,
        meets_threshold: fraction_with_variation >= threshold,
        threshold,
        overall_std: sample_std(&all, overall_mean),
        mean_within_std: mean_of(&within_stds),
        between_std: sample_std(&unit_means, between_mean),
    };
    debug!(
        variable,
        units_with_variation,
        total_units,
        meets_threshold = summary.meets_threshold,
        "within-unit variation checked"
    );
    Ok(summary)
}

/// Arithmetic mean; zero for an empty slice.
#[inline]
fn mean_of(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1 denominator); zero when fewer than
/// two values.
#[inline]
fn sample_std(values: &[f64], mean: f64) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (ss / (n - 1) as f64).sqrt()
}
