//! panel::validation — identifier validation and panel-structure summary.
//!
//! Purpose
//! -------
//! Check the caller-supplied unit and time identifier columns before any
//! statistical work: both must exist, be key columns, be complete, and
//! never repeat a (unit, time) pair. Alongside the validated grouping,
//! report the panel's structure (counts, periods per unit, balance) as a
//! value object instead of console output.
//!
//! Key behaviors
//! -------------
//! - [`validate_panel`] is read-only: it borrows the table and returns a
//!   [`PanelIndex`] plus a [`PanelSummary`]; the input is never mutated.
//! - Hard failures (missing column, missing identifier values, duplicated
//!   pair) surface as [`PanelError`]; soft conditions (units with a single
//!   observed period) are counted in the summary and emitted as a
//!   `tracing::warn!` event, never an error.
//! - Balance is the strict comparison of per-unit period *sets*;
//!   it is informational only and never blocks execution.
//! - [`filter_units_by_min_periods`] drops units observed fewer than a
//!   minimum number of periods (double demeaning needs T > 2 for proper
//!   identification) and reports what was dropped.
//!
//! Invariants & assumptions
//! ------------------------
//! - A [`PanelIndex`] is only ever constructed here (or in its own unit
//!   tests); downstream code may treat possession of one as proof of
//!   identifier validity.
//!
//! Conventions
//! -----------
//! - Identifier columns are `Column::Keys`; passing a numeric column as
//!   an identifier is a configuration error (`NotKeys`), not a coercion.
//!
//! Downstream usage
//! ----------------
//! - The analysis orchestrator calls [`validate_panel`] first and threads
//!   the returned index through the transformer, variation checker, and
//!   estimator.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the missing-column and missing-value rejection
//!   paths, balance reporting, the single-period soft path, and unit
//!   filtering arithmetic.

use tracing::{debug, warn};

use crate::panel::data::{PanelData, PanelIndex};
use crate::panel::errors::{PanelError, PanelResult};

/// PanelSummary — structure report for a validated panel.
///
/// Purpose
/// -------
/// Describe the shape of the panel (observations, units, periods,
/// balance) for diagnostics and reporting. Purely informational; nothing
/// in this struct ever blocks the pipeline.
///
/// Fields
/// ------
/// - `n_observations`, `n_units`, `n_periods`: table row count, distinct
///   unit count, distinct time-period count across the whole panel.
/// - `min_periods`, `max_periods`, `mean_periods`: distribution of
///   observed periods per unit.
/// - `single_period_units`: units with exactly one observation; fixed
///   effects cannot use them.
/// - `insufficient_units`: units with two or fewer periods; double
///   demeaning needs T > 2 for proper identification.
/// - `balanced`: whether every unit was observed in the same period set.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSummary {
    pub n_observations: usize,
    pub n_units: usize,
    pub n_periods: usize,
    pub min_periods: usize,
    pub max_periods: usize,
    pub mean_periods: f64,
    pub single_period_units: usize,
    pub insufficient_units: usize,
    pub balanced: bool,
}

/// UnitFilterSummary — record of what [`filter_units_by_min_periods`] dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitFilterSummary {
    pub min_periods: usize,
    pub units_dropped: usize,
    pub observations_dropped: usize,
}

/// Validate identifier columns and summarize the panel structure.
///
/// Parameters
/// ----------
/// - `data`: the panel table; borrowed read-only.
/// - `unit_var`, `time_var`: names of the identifier key columns.
///
/// Returns
/// -------
/// `PanelResult<(PanelIndex, PanelSummary)>`
///   The validated per-unit grouping plus the structure report.
///
/// Errors
/// ------
/// - `PanelError::ColumnNotFound` / `PanelError::NotKeys`
///   An identifier column is absent or has the wrong type
///   (configuration).
/// - `PanelError::MissingIdentifier`
///   An identifier column contains missing entries (data integrity).
/// - `PanelError::DuplicateObservation`
///   A (unit, time) pair repeats (data integrity).
/// - `PanelError::EmptyPanel`
///   The table has no rows.
///
/// Notes
/// -----
/// - Units with a single observed period are reported in the summary and
///   via a `tracing::warn!` event; they do not fail validation. The same
///   applies to unbalanced panels, which are fine for this analysis.
pub fn validate_panel(
    data: &PanelData, unit_var: &str, time_var: &str,
) -> PanelResult<(PanelIndex, PanelSummary)> {
    let units = complete_keys(data, unit_var)?;
    let times = complete_keys(data, time_var)?;

    let index = PanelIndex::new(&units, &times)?;
    let summary = summarize(&index, &times);

    if summary.single_period_units > 0 {
        warn!(
            units = summary.single_period_units,
            "units with only one observed period; fixed effects require repeated observations"
        );
    }
    debug!(
        n_observations = summary.n_observations,
        n_units = summary.n_units,
        balanced = summary.balanced,
        "panel validated"
    );

    Ok((index, summary))
}

/// Drop units observed fewer than `min_periods` times.
///
/// Parameters
/// ----------
/// - `data`: the panel table the index was built from.
/// - `index`: validated grouping of `data`.
/// - `min_periods`: minimum observed periods a unit must have to be
///   kept. Double demeaning needs T > 2, so 3 is the usual choice.
///
/// Returns
/// -------
/// `(PanelData, UnitFilterSummary)`
///   The filtered table (row order preserved) and a record of what was
///   dropped. The caller revalidates the filtered table to obtain a new
///   index.
pub fn filter_units_by_min_periods(
    data: &PanelData, index: &PanelIndex, min_periods: usize,
) -> (PanelData, UnitFilterSummary) {
    let mut rows: Vec<usize> = Vec::with_capacity(data.n_rows());
    let mut units_dropped = 0_usize;
    let mut observations_dropped = 0_usize;

    for group in index.groups() {
        if group.len() >= min_periods {
            rows.extend_from_slice(group);
        } else {
            units_dropped += 1;
            observations_dropped += group.len();
        }
    }
    rows.sort_unstable();

    let summary = UnitFilterSummary { min_periods, units_dropped, observations_dropped };
    debug!(
        min_periods,
        units_dropped, observations_dropped, "filtered units by observed periods"
    );
    (data.select_rows(&rows), summary)
}

/// Extract a complete key column, rejecting missing entries.
fn complete_keys(data: &PanelData, name: &str) -> PanelResult<Vec<i64>> {
    let raw = data.keys(name)?;
    let missing = raw.iter().filter(|k| k.is_none()).count();
    if missing > 0 {
        return Err(PanelError::MissingIdentifier { column: name.to_string(), count: missing });
    }
    Ok(raw.iter().map(|k| k.unwrap_or_default()).collect())
}

/// Build the structure report from a validated grouping.
fn summarize(index: &PanelIndex, times: &[i64]) -> PanelSummary {
    let periods = index.periods_per_unit();
    let n_units = index.n_units();
    let min_periods = periods.iter().copied().min().unwrap_or(0);
    let max_periods = periods.iter().copied().max().unwrap_or(0);
    let mean_periods = if n_units > 0 {
        periods.iter().sum::<usize>() as f64 / n_units as f64
    } else {
        0.0
    };

    let mut distinct_times: Vec<i64> = times.to_vec();
    distinct_times.sort_unstable();
    distinct_times.dedup();

    PanelSummary {
        n_observations: index.n_obs(),
        n_units,
        n_periods: distinct_times.len(),
        min_periods,
        max_periods,
        mean_periods,
        single_period_units: periods.iter().filter(|&&p| p == 1).count(),
        insufficient_units: periods.iter().filter(|&&p| p <= 2).count(),
        balanced: index.is_balanced(),
    }
}
