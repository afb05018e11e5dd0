//! analysis::errors — unified error type for the analysis pipeline.
//!
//! Purpose
//! -------
//! Give the orchestrator one error kind that wraps both layers it drives:
//! panel validation/preparation failures and estimation failures. The
//! Hausman diagnostic never contributes a variant — it fails soft with
//! `None` by design.
//!
//! Conventions
//! -----------
//! - `From` impls let orchestrator code propagate subtree errors with
//!   `?`; `Display` delegates to the wrapped error so messages read the
//!   same at every level.

use crate::estimation::errors::EstimationError;
use crate::panel::errors::PanelError;

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// AnalysisError — any failure the analysis pipeline can surface.
///
/// Variants
/// --------
/// - `Panel(err)`
///   Configuration or data-integrity failure from the panel layer
///   (missing columns, missing identifiers, duplicated pairs).
/// - `Estimation(err)`
///   Engine failure from either primary model fit; never silently
///   swallowed.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    Panel(PanelError),
    Estimation(EstimationError),
}

impl std::error::Error for AnalysisError {}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::Panel(err) => write!(f, "{err}"),
            AnalysisError::Estimation(err) => write!(f, "{err}"),
        }
    }
}

impl From<PanelError> for AnalysisError {
    fn from(err: PanelError) -> AnalysisError {
        AnalysisError::Panel(err)
    }
}

impl From<EstimationError> for AnalysisError {
    fn from(err: EstimationError) -> AnalysisError {
        AnalysisError::Estimation(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover the From conversions and Display delegation.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that wrapped errors keep their message through Display.
    //
    // Given
    // -----
    // - A PanelError::ColumnNotFound("cases") and an
    //   EstimationError::TooFewClusters { found: 1 }.
    //
    // Expect
    // ------
    // - Each converted AnalysisError displays the inner payload.
    fn analysis_error_display_delegates_to_wrapped_error() {
        // Arrange
        let panel: AnalysisError = PanelError::ColumnNotFound("cases".to_string()).into();
        let estimation: AnalysisError = EstimationError::TooFewClusters { found: 1 }.into();

        // Act & Assert
        assert!(panel.to_string().contains("cases"));
        assert!(estimation.to_string().contains('1'));
    }
}
