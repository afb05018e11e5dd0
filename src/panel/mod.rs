//! panel — typed panel tables, identifier validation, variation checks.
//!
//! Purpose
//! -------
//! Provide the data layer the statistical pipeline stands on: an
//! explicitly typed column table ([`PanelData`]), the validated per-unit
//! grouping ([`PanelIndex`]), panel-structure reporting
//! ([`PanelSummary`]), and the within-unit variation checker that decides
//! which variables can live inside a fixed-effects specification.
//!
//! Key behaviors
//! -------------
//! - Columns carry caller-declared semantic types (numeric / identifier
//!   keys / categorical); wrong-type use is a configuration error, and
//!   categorical columns are only ever encoded explicitly.
//! - [`validate_panel`](validation::validate_panel) checks identifier
//!   completeness and the at-most-once (unit, time) invariant, reports
//!   balance, and warns (never fails) on single-period units.
//! - [`check_within_unit_variation`](variation::check_within_unit_variation)
//!   computes per-unit variation statistics with the 1e-10 epsilon rule
//!   and a configurable unit-fraction threshold.
//!
//! Conventions
//! -----------
//! - All routines borrow the table read-only and return new values;
//!   nothing in this subtree mutates a caller's table.
//! - Hard failures use [`PanelError`] via [`PanelResult`]; soft
//!   conditions surface in summaries and `tracing` events.
//!
//! Downstream usage
//! ----------------
//! - Typical callers import the surface as:
//!
//!   ```rust
//!   use dd_ie::panel::{PanelData, Column, validate_panel};
//!   ```
//!
//!   and thread the returned [`PanelIndex`] through the demeaning and
//!   estimation stages.
//!
//! Testing notes
//! -------------
//! - Each file carries its own unit tests; the validator's rejection
//!   paths and the variation extremes are covered there, and the full
//!   pipeline is exercised in `tests/integration_dd_pipeline.rs`.

pub mod data;
pub mod errors;
pub mod validation;
pub mod variation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::data::{Column, PanelData, PanelIndex};
pub use self::errors::{PanelError, PanelResult};
pub use self::validation::{
    filter_units_by_min_periods, validate_panel, PanelSummary, UnitFilterSummary,
};
pub use self::variation::{
    check_within_unit_variation, VariationSummary, DEFAULT_VARIATION_THRESHOLD, VARIATION_EPS,
};
