//! analysis — orchestration of the double-demeaning pipeline.
//!
//! Purpose
//! -------
//! Tie the subtrees together behind one entry point: bind a panel to its
//! caller-assigned variable roles, then run validation → optional
//! grand-mean centering → double-demeaning transformation → two-model
//! estimation → Hausman test, returning every artifact in a single
//! [`AnalysisReport`].
//!
//! Key behaviors
//! -------------
//! - One unified error type, [`AnalysisError`], wraps panel and
//!   estimation failures; the Hausman diagnostic stays Option-valued
//!   inside the report.
//! - Diagnostics are value objects and `tracing` events; the library
//!   never writes to the console.
//!
//! Downstream usage
//! ----------------
//! - The intended top-level flow:
//!
//!   ```rust,ignore
//!   use dd_ie::analysis::{AnalysisOptions, DoubleDemeanAnalysis, VariableRoles};
//!   use dd_ie::estimation::WithinEstimator;
//!
//!   let analysis = DoubleDemeanAnalysis::new(data, roles)?;
//!   let report = analysis.run(&WithinEstimator, &AnalysisOptions::default())?;
//!   ```
//!
//! Testing notes
//! -------------
//! - Construction-time role validation is unit-tested here; the full
//!   pipeline (including centering invariance and stub engines) runs in
//!   the crate-level integration tests.

pub mod double_demean;
pub mod errors;
pub mod report;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::double_demean::{AnalysisOptions, DoubleDemeanAnalysis, VariableRoles};
pub use self::errors::{AnalysisError, AnalysisResult};
pub use self::report::AnalysisReport;
