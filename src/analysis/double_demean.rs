//! analysis::double_demean — the top-level analysis orchestrator.
//!
//! Purpose
//! -------
//! Drive the full double-demeaning analysis over a caller-supplied panel:
//! listwise deletion over the analysis variables, identifier validation,
//! optional grand-mean centering, the double-demeaning transformation,
//! estimation of the standard and double-demeaned specifications, and the
//! Hausman specification test.
//!
//! Key behaviors
//! -------------
//! - Variable roles are assigned by the caller through [`VariableRoles`];
//!   nothing is inferred from column names or types.
//! - [`DoubleDemeanAnalysis::new`] fails immediately when a role column
//!   is absent or has the wrong type — configuration errors never wait
//!   until estimation.
//! - [`DoubleDemeanAnalysis::run`] is pure with respect to the stored
//!   table: every stage reads and returns a new copy, so repeated runs
//!   (with different options or engines) are independent.
//! - The regression engine is injected; production callers pass
//!   [`WithinEstimator`](crate::estimation::engine::WithinEstimator),
//!   tests pass stubs.
//!
//! Invariants & assumptions
//! ------------------------
//! - The pipeline is single-threaded and synchronous; stages are plain
//!   function calls over in-memory tables and matrices.
//! - Grand-mean centering changes stored values but not fixed-effects
//!   coefficients; the integration tests assert this invariance.
//!
//! Conventions
//! -----------
//! - Fail fast for primary computation (validation, both model fits);
//!   degrade gracefully for the Hausman diagnostic, which is
//!   Option-valued in the report.
//!
//! Testing notes
//! -------------
//! - Unit tests cover role validation at construction and the option
//!   flags; the full pipeline, centering invariance, and stub-engine
//!   substitution are exercised in `tests/integration_dd_pipeline.rs`.

use tracing::info;

use crate::analysis::errors::AnalysisResult;
use crate::analysis::report::AnalysisReport;
use crate::demean::centering::apply_grand_mean_centering;
use crate::demean::transform::{create_double_demeaned_interaction, InteractionNames};
use crate::estimation::compare::estimate_fe_models;
use crate::estimation::engine::FixedEffectsEngine;
use crate::panel::data::PanelData;
use crate::panel::validation::validate_panel;
use crate::panel::variation::DEFAULT_VARIATION_THRESHOLD;
use crate::statistical_tests::hausman::perform_hausman_test;

/// VariableRoles — caller-assigned roles for the analysis columns.
///
/// Fields
/// ------
/// - `unit_var`, `time_var`: identifier (key) columns.
/// - `y_var`: dependent variable.
/// - `x_var`, `z_var`: the interacting variables.
/// - `w_vars`: control variables; may be empty. Controls are filtered by
///   the within-unit variation check before entering a specification.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableRoles {
    pub unit_var: String,
    pub time_var: String,
    pub y_var: String,
    pub x_var: String,
    pub z_var: String,
    pub w_vars: Vec<String>,
}

/// AnalysisOptions — policy switches for one analysis run.
///
/// Fields
/// ------
/// - `center_variables`: apply grand-mean centering to Y, X, Z, and all
///   controls before transformation (default true; a location shift that
///   leaves fixed-effects coefficients unchanged).
/// - `run_hausman`: run the specification test (default true).
/// - `variation_threshold`: minimum fraction of varying units a control
///   needs to stay in the specification (default 0.05).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisOptions {
    pub center_variables: bool,
    pub run_hausman: bool,
    pub variation_threshold: f64,
}

impl Default for AnalysisOptions {
    fn default() -> AnalysisOptions {
        AnalysisOptions {
            center_variables: true,
            run_hausman: true,
            variation_threshold: DEFAULT_VARIATION_THRESHOLD,
        }
    }
}

/// DoubleDemeanAnalysis — a configured analysis over one panel.
///
/// Purpose
/// -------
/// Bind a panel table to its variable roles, check the configuration up
/// front, and expose [`run`](DoubleDemeanAnalysis::run) to execute the
/// pipeline with a chosen engine and options.
///
/// Invariants
/// ----------
/// - After construction, every role column exists with the declared
///   type: identifiers are key columns, analysis variables are numeric.
///   (Categorical columns must be encoded before construction.)
#[derive(Debug, Clone)]
pub struct DoubleDemeanAnalysis {
    data: PanelData,
    roles: VariableRoles,
    names: InteractionNames,
}

impl DoubleDemeanAnalysis {
    /// Bind a panel to its variable roles.
    ///
    /// Parameters
    /// ----------
    /// - `data`: the panel table; stored by value, never mutated.
    /// - `roles`: caller-assigned column roles.
    ///
    /// Returns
    /// -------
    /// `AnalysisResult<DoubleDemeanAnalysis>`
    ///   The configured analysis, or a configuration error when a role
    ///   column is absent or has the wrong type.
    ///
    /// Errors
    /// ------
    /// - `AnalysisError::Panel`
    ///   `ColumnNotFound`, `NotKeys`, or `NotNumeric` for a role column.
    pub fn new(data: PanelData, roles: VariableRoles) -> AnalysisResult<DoubleDemeanAnalysis> {
        data.keys(&roles.unit_var)?;
        data.keys(&roles.time_var)?;
        for var in [&roles.y_var, &roles.x_var, &roles.z_var] {
            data.numeric(var)?;
        }
        for var in &roles.w_vars {
            data.numeric(var)?;
        }
        let names = InteractionNames::new(&roles.x_var, &roles.z_var);
        Ok(DoubleDemeanAnalysis { data, roles, names })
    }

    /// The roles this analysis was configured with.
    pub fn roles(&self) -> &VariableRoles {
        &self.roles
    }

    /// The derived interaction naming for (X, Z).
    pub fn interaction_names(&self) -> &InteractionNames {
        &self.names
    }

    /// Execute the full pipeline.
    ///
    /// Parameters
    /// ----------
    /// - `engine`: the fixed-effects regression capability.
    /// - `options`: policy switches; see [`AnalysisOptions`].
    ///
    /// Returns
    /// -------
    /// `AnalysisResult<AnalysisReport>`
    ///   The complete report, or the first hard failure from validation
    ///   or estimation. A Hausman failure is *not* a hard failure: the
    ///   report carries `hausman: None` and the comparison stands.
    ///
    /// Notes
    /// -----
    /// - Rows with a missing value in any analysis variable are removed
    ///   by listwise deletion before validation, so the models and the
    ///   panel summary describe the same sample.
    pub fn run(
        &self, engine: &dyn FixedEffectsEngine, options: &AnalysisOptions,
    ) -> AnalysisResult<AnalysisReport> {
        let analysis_vars: Vec<&str> = self.analysis_vars();
        let complete = self.data.drop_missing(&analysis_vars)?;

        let (index, panel) =
            validate_panel(&complete, &self.roles.unit_var, &self.roles.time_var)?;

        let (working, centering) = if options.center_variables {
            apply_grand_mean_centering(&complete, &analysis_vars)?
        } else {
            (complete, Vec::new())
        };

        let transformed = create_double_demeaned_interaction(&working, &index, &self.names)?;

        let comparison = estimate_fe_models(
            &transformed,
            &index,
            &self.roles.y_var,
            &self.names,
            &self.roles.w_vars,
            engine,
            options.variation_threshold,
        )?;

        let hausman = if options.run_hausman {
            perform_hausman_test(
                &comparison.standard,
                &comparison.double_demeaned,
                &comparison.pairs,
            )
        } else {
            None
        };

        info!(
            n_observations = panel.n_observations,
            n_units = panel.n_units,
            excluded_controls = comparison.excluded_controls.len(),
            hausman_computed = hausman.is_some(),
            "double-demeaning analysis complete"
        );
        Ok(AnalysisReport { panel, centering, comparison, hausman, transformed })
    }

    /// Y, X, Z, then the controls — the variables centering and listwise
    /// deletion operate on.
    fn analysis_vars(&self) -> Vec<&str> {
        let mut vars =
            vec![self.roles.y_var.as_str(), self.roles.x_var.as_str(), self.roles.z_var.as_str()];
        vars.extend(self.roles.w_vars.iter().map(|w| w.as_str()));
        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::errors::AnalysisError;
    use crate::panel::data::Column;
    use crate::panel::errors::PanelError;
    use ndarray::Array1;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Role validation at construction (absent and wrongly typed
    //   columns).
    // - Default option values.
    //
    // They intentionally DO NOT cover:
    // - The full pipeline, centering invariance, or engine substitution;
    //   those live in tests/integration_dd_pipeline.rs.
    // -------------------------------------------------------------------------

    fn roles() -> VariableRoles {
        VariableRoles {
            unit_var: "unit".to_string(),
            time_var: "time".to_string(),
            y_var: "y".to_string(),
            x_var: "x".to_string(),
            z_var: "z".to_string(),
            w_vars: Vec::new(),
        }
    }

    fn data_with(columns: Vec<(&str, Column)>) -> PanelData {
        PanelData::from_columns(
            columns.into_iter().map(|(n, c)| (n.to_string(), c)).collect(),
        )
        .expect("columns share one length")
    }

    #[test]
    // Purpose
    // -------
    // Verify that construction rejects an absent interacting variable
    // immediately, before any data work.
    //
    // Given
    // -----
    // - A table with unit, time, y — but no "x" or "z".
    //
    // Expect
    // ------
    // - `DoubleDemeanAnalysis::new` returns
    //   `AnalysisError::Panel(ColumnNotFound("x"))`.
    fn analysis_new_rejects_missing_interacting_variable() {
        // Arrange
        let data = data_with(vec![
            ("unit", Column::Keys(vec![Some(1), Some(1)])),
            ("time", Column::Keys(vec![Some(1), Some(2)])),
            ("y", Column::Numeric(Array1::from(vec![1.0, 2.0]))),
        ]);

        // Act
        let result = DoubleDemeanAnalysis::new(data, roles());

        // Assert
        assert_eq!(
            result.err(),
            Some(AnalysisError::Panel(PanelError::ColumnNotFound("x".to_string())))
        );
    }

    #[test]
    // Purpose
    // -------
    // Verify that an unencoded categorical column cannot take a numeric
    // role.
    //
    // Given
    // -----
    // - A table where "z" is categorical.
    //
    // Expect
    // ------
    // - Construction fails with `NotNumeric("z")`.
    fn analysis_new_rejects_unencoded_categorical_role() {
        // Arrange
        let data = data_with(vec![
            ("unit", Column::Keys(vec![Some(1), Some(1)])),
            ("time", Column::Keys(vec![Some(1), Some(2)])),
            ("y", Column::Numeric(Array1::from(vec![1.0, 2.0]))),
            ("x", Column::Numeric(Array1::from(vec![0.1, 0.2]))),
            ("z", Column::Categorical(vec!["low".to_string(), "high".to_string()])),
        ]);

        // Act
        let result = DoubleDemeanAnalysis::new(data, roles());

        // Assert
        assert_eq!(
            result.err(),
            Some(AnalysisError::Panel(PanelError::NotNumeric("z".to_string())))
        );
    }

    #[test]
    // Purpose
    // -------
    // Verify the documented option defaults.
    //
    // Given
    // -----
    // - `AnalysisOptions::default()`.
    //
    // Expect
    // ------
    // - Centering on, Hausman on, threshold 0.05.
    fn analysis_options_defaults_match_documentation() {
        // Arrange & Act
        let options = AnalysisOptions::default();

        // Assert
        assert!(options.center_variables);
        assert!(options.run_hausman);
        assert!((options.variation_threshold - 0.05).abs() < 1e-12);
    }
}
