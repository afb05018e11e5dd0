//! dd_ie — double-demeaned interaction effects for fixed-effects panels.
//!
//! Purpose
//! -------
//! Implement the double-demeaning correction for interaction terms in
//! fixed-effects panel regression, following Giesselmann & Schmidt-Catran
//! (2022, Sociological Methods & Research 51(3), 1100–1127): demean the
//! two interacting variables within units *before* multiplying them,
//! estimate both the conventional and the double-demeaned specification,
//! and test for systematic differences with a numerically robust Hausman
//! specification test.
//!
//! Key behaviors
//! -------------
//! - `panel`: typed panel tables, identifier validation, panel-structure
//!   summaries, and the within-unit variation check that gates control
//!   variables.
//! - `demean`: grand-mean centering and the double-demeaning transform,
//!   both pure functions over validated panels.
//! - `estimation`: the injected fixed-effects regression capability
//!   ([`FixedEffectsEngine`](estimation::FixedEffectsEngine)), a built-in
//!   within estimator with cluster-robust debiased covariance, and the
//!   two-model coefficient comparison.
//! - `statistical_tests`: the Hausman test, Option-valued by design so
//!   the primary comparison survives a failed diagnostic.
//! - `analysis`: the orchestrator binding a panel to caller-assigned
//!   variable roles and returning one
//!   [`AnalysisReport`](analysis::AnalysisReport).
//!
//! Invariants & assumptions
//! ------------------------
//! - All computation is single-threaded, synchronous, and in-memory;
//!   every stage reads and returns new tables rather than mutating the
//!   caller's data.
//! - Hard failures are typed per subtree (`PanelError`,
//!   `EstimationError`, `AnalysisError`); the Hausman test is the one
//!   deliberate soft-failure surface.
//! - Diagnostics are value objects plus `tracing` events; library code
//!   never writes to the console.
//!
//! Conventions
//! -----------
//! - Variable roles (dependent, interacting, control, identifier) are
//!   assigned by the caller, never inferred from data.
//! - Derived columns follow the `mean_X` / `dm_X` / `int_X_Z` /
//!   `dd_int_X_Z` naming centralized in
//!   [`InteractionNames`](demean::InteractionNames).
//!
//! Downstream usage
//! ----------------
//! - The typical flow:
//!
//!   ```rust,ignore
//!   use dd_ie::prelude::*;
//!
//!   let analysis = DoubleDemeanAnalysis::new(data, roles)?;
//!   let report = analysis.run(&WithinEstimator, &AnalysisOptions::default())?;
//!   if let Some(hausman) = &report.hausman {
//!       println!("{}: p = {:.4}", hausman.conclusion(), hausman.p_value());
//!   }
//!   ```
//!
//! Testing notes
//! -------------
//! - Each module carries unit tests next to the code it covers;
//!   `tests/integration_dd_pipeline.rs` exercises the full pipeline,
//!   centering invariance of fixed-effects coefficients, and engine
//!   substitution through a stub.

pub mod analysis;
pub mod demean;
pub mod estimation;
pub mod panel;
pub mod statistical_tests;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use dd_ie::prelude::*;
//
// to import the main analysis surface in a single line.

pub mod prelude {
    pub use crate::analysis::{
        AnalysisError, AnalysisOptions, AnalysisReport, AnalysisResult, DoubleDemeanAnalysis,
        VariableRoles,
    };
    pub use crate::demean::InteractionNames;
    pub use crate::estimation::{FixedEffectsEngine, ModelFit, WithinEstimator};
    pub use crate::panel::{Column, PanelData, PanelError};
    pub use crate::statistical_tests::{HausmanConclusion, HausmanOutcome};
}
