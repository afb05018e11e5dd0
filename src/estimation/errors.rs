//! estimation::errors — error types for fixed-effects estimation.
//!
//! Purpose
//! -------
//! Define the single error kind the regression-engine boundary surfaces:
//! whatever numerical failure the engine hits internally (rank
//! deficiency, singular normal equations, degenerate degrees of freedom)
//! reaches the caller as one [`EstimationError`], never as an
//! engine-specific panic or foreign error type.
//!
//! Key behaviors
//! -------------
//! - Define [`EstimationResult`] and [`EstimationError`] as the result
//!   and error types for everything under `estimation`.
//! - Wrap panel-level failures encountered while assembling a design
//!   (missing columns after control filtering) via
//!   `From<PanelError>`, so `?` composes across the subtree boundary.
//!
//! Conventions
//! -----------
//! - Estimation failures are never silently swallowed: the two primary
//!   model fits fail fast. Graceful degradation is reserved for the
//!   Hausman diagnostic, which is Option-valued by design.
//!
//! Testing notes
//! -------------
//! - Unit tests verify payload embedding in `Display` messages and the
//!   `From<PanelError>` conversion.

use crate::panel::errors::PanelError;

pub type EstimationResult<T> = Result<T, EstimationError>;

/// EstimationError — failure conditions at the regression-engine boundary.
///
/// Variants
/// --------
/// - `Panel(err)`
///   A panel-level failure hit while assembling the design (absent or
///   non-numeric column, usually after control filtering).
/// - `Singular(detail)`
///   The normal equations are rank deficient; typically a regressor is
///   collinear with the unit fixed effects or with another regressor.
/// - `TooFewClusters { found }`
///   Cluster-robust covariance needs at least two clusters (units).
/// - `InsufficientObservations { nobs, nparams }`
///   No residual degrees of freedom: the effective parameter count
///   (regressors plus absorbed unit intercepts) reaches the sample size.
/// - `NonFinite(what)`
///   The engine produced a NaN or infinite coefficient, covariance
///   entry, or standard error.
///
/// Notes
/// -----
/// - Implements [`std::error::Error`] and [`std::fmt::Display`]; the
///   `From<PanelError>` conversion lets design assembly use `?`.
#[derive(Debug, Clone, PartialEq)]
pub enum EstimationError {
    Panel(PanelError),
    //------ Engine numerical failures ------
    Singular(String),
    TooFewClusters { found: usize },
    InsufficientObservations { nobs: usize, nparams: usize },
    NonFinite(String),
}

impl std::error::Error for EstimationError {}

impl std::fmt::Display for EstimationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EstimationError::Panel(err) => write!(f, "{err}"),
            EstimationError::Singular(detail) => {
                write!(f, "Design matrix is rank deficient: {detail}")
            }
            EstimationError::TooFewClusters { found } => {
                write!(
                    f,
                    "Cluster-robust standard errors require at least 2 clusters; found {found}."
                )
            }
            EstimationError::InsufficientObservations { nobs, nparams } => {
                write!(
                    f,
                    "Not enough observations: {nobs} rows for {nparams} effective parameters \
                     leaves no residual degrees of freedom."
                )
            }
            EstimationError::NonFinite(what) => {
                write!(f, "Estimation produced a non-finite value in {what}.")
            }
        }
    }
}

impl From<PanelError> for EstimationError {
    fn from(err: PanelError) -> EstimationError {
        EstimationError::Panel(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Payload embedding in `Display` messages.
    // - The From<PanelError> conversion used by design assembly.
    //
    // They intentionally DO NOT cover:
    // - The numerical conditions producing each variant; those are
    //   exercised in the engine tests.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that `TooFewClusters` embeds the cluster count.
    //
    // Given
    // -----
    // - A `TooFewClusters` error with found = 1.
    //
    // Expect
    // ------
    // - `format!("{err}")` contains "1".
    fn estimation_error_too_few_clusters_includes_count_in_display() {
        // Arrange
        let err = EstimationError::TooFewClusters { found: 1 };

        // Act
        let msg = err.to_string();

        // Assert
        assert!(msg.contains('1'), "Display should include cluster count.\nGot: {msg}");
    }

    #[test]
    // Purpose
    // -------
    // Verify that a panel failure converts into the estimation error
    // kind and keeps its message.
    //
    // Given
    // -----
    // - A `PanelError::ColumnNotFound("gdp")`.
    //
    // Expect
    // ------
    // - The converted `EstimationError` displays the same column name.
    fn estimation_error_wraps_panel_error_with_message() {
        // Arrange
        let panel_err = PanelError::ColumnNotFound("gdp".to_string());

        // Act
        let err: EstimationError = panel_err.into();

        // Assert
        assert!(matches!(err, EstimationError::Panel(_)));
        assert!(err.to_string().contains("gdp"));
    }
}
