//! demean::centering — grand-mean centering of analysis variables.
//!
//! Purpose
//! -------
//! Subtract the overall (grand) mean — not the within-unit mean — from
//! each named analysis variable before the double-demeaning
//! transformation. With unit fixed effects this is a pure location shift
//! and leaves every coefficient estimate unchanged; it is retained
//! because it matches the reference methodology and keeps intermediate
//! diagnostics comparable to the original research code.
//!
//! Key behaviors
//! -------------
//! - [`apply_grand_mean_centering`] returns a centered copy plus one
//!   [`CenteringRecord`] per variable (before/after means), the
//!   structured replacement for the original's printed narration.
//! - Means are computed over non-missing (non-NaN) observations; missing
//!   entries stay missing.
//!
//! Invariants & assumptions
//! ------------------------
//! - Centering is idempotent in effect: applying it twice perturbs the
//!   stored values only at floating-point noise level and leaves
//!   downstream fixed-effects coefficients unchanged. The invariance of
//!   coefficients is asserted end-to-end in the integration tests.
//!
//! Testing notes
//! -------------
//! - Unit tests check the after-mean is ~0, that missing values survive
//!   untouched, and that records carry the original means.

use tracing::debug;

use crate::panel::data::PanelData;
use crate::panel::errors::PanelResult;

/// CenteringRecord — before/after means for one centered variable.
#[derive(Debug, Clone, PartialEq)]
pub struct CenteringRecord {
    pub variable: String,
    pub mean_before: f64,
    pub mean_after: f64,
}

/// Center the named variables at their grand means.
///
/// Parameters
/// ----------
/// - `data`: the panel table; borrowed read-only.
/// - `vars`: numeric variable names to center (typically Y, X, Z, and
///   every control).
///
/// Returns
/// -------
/// `PanelResult<(PanelData, Vec<CenteringRecord>)>`
///   The centered copy and one record per variable, in input order, or a
///   typed-access error for an absent / non-numeric name.
///
/// Notes
/// -----
/// - A variable whose observations are all missing is left untouched and
///   recorded with NaN means.
pub fn apply_grand_mean_centering(
    data: &PanelData, vars: &[&str],
) -> PanelResult<(PanelData, Vec<CenteringRecord>)> {
    let mut centered = data.clone();
    let mut records = Vec::with_capacity(vars.len());

    for var in vars {
        let values = centered.numeric(var)?.clone();
        let mean_before = nan_mean(values.iter().copied());
        let shifted = values.mapv(|v| v - mean_before);
        let mean_after = nan_mean(shifted.iter().copied());
        centered.insert_numeric(var, shifted)?;
        debug!(variable = *var, mean_before, mean_after, "grand-mean centered");
        records.push(CenteringRecord {
            variable: var.to_string(),
            mean_before,
            mean_after,
        });
    }

    Ok((centered, records))
}

/// Mean over non-NaN values; NaN when every value is missing.
fn nan_mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0_usize;
    for v in values {
        if !v.is_nan() {
            sum += v;
            count += 1;
        }
    }
    if count == 0 { f64::NAN } else { sum / count as f64 }
}
