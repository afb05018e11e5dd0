//! analysis::report — the analysis result bundle.
//!
//! Purpose
//! -------
//! Define the value object the orchestrator returns: every artifact of a
//! completed double-demeaning analysis, from the panel-structure summary
//! through the fitted model comparison to the optional Hausman outcome.
//! These value objects are the structured replacement for the original
//! research code's console narration — callers render or log them as
//! they see fit; the library never prints.

use crate::demean::centering::CenteringRecord;
use crate::estimation::compare::ModelComparison;
use crate::panel::data::PanelData;
use crate::panel::validation::PanelSummary;
use crate::statistical_tests::hausman::HausmanOutcome;

/// AnalysisReport — everything a completed analysis produced.
///
/// Fields
/// ------
/// - `panel`: structure summary of the validated panel (after listwise
///   deletion over the analysis variables).
/// - `centering`: grand-mean centering records, empty when centering was
///   disabled.
/// - `comparison`: both fits, the aligned coefficient pairs, the
///   comparison table, and the variation filter's decisions.
/// - `hausman`: the specification test outcome; `None` when the test
///   was disabled or could not be computed (soft failure by design).
/// - `transformed`: the augmented panel the models were fitted on,
///   including the six derived interaction columns.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub panel: PanelSummary,
    pub centering: Vec<CenteringRecord>,
    pub comparison: ModelComparison,
    pub hausman: Option<HausmanOutcome>,
    pub transformed: PanelData,
}

impl AnalysisReport {
    /// The key finding: signed difference (standard − double-demeaned)
    /// between the two interaction coefficients, when both were
    /// estimated.
    pub fn interaction_difference(&self) -> Option<f64> {
        self.comparison
            .table
            .iter()
            .find(|record| record.variable.starts_with("int_"))
            .map(|record| record.difference)
    }
}
