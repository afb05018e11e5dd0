//! estimation — the fixed-effects engine seam and two-model comparison.
//!
//! Purpose
//! -------
//! Wrap everything between the transformed panel and the pair of fitted
//! models the Hausman test compares: the regression-engine interface
//! ([`FixedEffectsEngine`]), its built-in implementation
//! ([`WithinEstimator`]), control filtering through the within-unit
//! variation check, and the coefficient comparison artifacts.
//!
//! Key behaviors
//! -------------
//! - The statistical core talks to regression only through the trait, so
//!   demeaning, comparison, and the Hausman test are testable against a
//!   stub engine.
//! - Both primary fits fail fast via [`EstimationError`]; nothing at
//!   this layer degrades silently.
//! - Control variables below the variation threshold are excluded from
//!   the specification and reported, never silently kept.
//!
//! Downstream usage
//! ----------------
//! - Typical callers go through the analysis orchestrator; direct use
//!   looks like:
//!
//!   ```rust,ignore
//!   use dd_ie::estimation::{estimate_fe_models, WithinEstimator};
//!
//!   let comparison = estimate_fe_models(
//!       &transformed, &index, "y", &names, &controls, &WithinEstimator, 0.05,
//!   )?;
//!   ```
//!
//! Testing notes
//! -------------
//! - Engine numerics and error paths are unit-tested in `engine`;
//!   filtering, pairing, and table construction in `compare`; the
//!   stub-engine substitution is exercised in the crate-level
//!   integration tests.

pub mod compare;
pub mod engine;
pub mod errors;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::compare::{
    coefficient_pairs, estimate_fe_models, CoefficientPair, ComparisonRecord, ModelComparison,
    LOW_VARIATION_WARN,
};
pub use self::engine::{Design, FitOptions, FixedEffectsEngine, ModelFit, WithinEstimator};
pub use self::errors::{EstimationError, EstimationResult};
