//! estimation::engine — the fixed-effects regression capability.
//!
//! Purpose
//! -------
//! Define the regression-engine interface the statistical core depends
//! on, and provide the built-in implementation. The core never talks to
//! a concrete regression library directly: it hands a [`Design`] and the
//! validated [`PanelIndex`] to a [`FixedEffectsEngine`] and gets back an
//! opaque [`ModelFit`]. Tests substitute a stub engine through the same
//! trait.
//!
//! Key behaviors
//! -------------
//! - [`Design`] packages the dependent variable, the regressor matrix,
//!   and the regressor names; [`FitOptions`] selects unit fixed effects,
//!   clustering, and the small-sample (debiased) correction, all of
//!   which default to on.
//! - [`WithinEstimator`] implements the trait by the within
//!   transformation: demean Y and every regressor inside each unit,
//!   solve the normal equations by Cholesky, and compute cluster-robust
//!   (by unit) covariance via the sandwich estimator
//!
//!   ```text
//!   V  =  c · (XᵀX)⁻¹ ( Σ_g s_g s_gᵀ ) (XᵀX)⁻¹,
//!   s_g = X_gᵀ û_g,
//!   c   = G/(G−1) · (N−1)/(N−k_eff)   (debiased; 1 otherwise),
//!   ```
//!
//!   where `k_eff` counts the regressors plus the absorbed unit
//!   intercepts.
//! - Every engine-side numerical failure — rank deficiency, too few
//!   clusters, exhausted degrees of freedom, non-finite output — is
//!   surfaced as an [`EstimationError`] at this boundary.
//!
//! Invariants & assumptions
//! ------------------------
//! - The design's row count equals the index's observation count;
//!   mismatches are programmer errors and panic.
//! - [`ModelFit`] stores the covariance of the *reported* coefficients
//!   only; absorbed fixed effects have no rows in it.
//!
//! Conventions
//! -----------
//! - Rows index observations, columns index regressors.
//! - Coefficient lookup is by regressor name; `ModelFit` is otherwise
//!   opaque, matching the external-engine contract.
//!
//! Downstream usage
//! ----------------
//! - `estimation::compare` fits the standard and double-demeaned
//!   specifications through this interface; the Hausman test consumes
//!   the resulting [`ModelFit`] pairs.
//!
//! Testing notes
//! -------------
//! - Unit tests recover hand-computed within-OLS coefficients, exercise
//!   the singularity / cluster-count / degrees-of-freedom error paths,
//!   and check the no-entity-effects branch against plain OLS.

use nalgebra::{Cholesky, DMatrix, DVector};
use ndarray::{Array1, Array2};
use tracing::debug;

use crate::estimation::errors::{EstimationError, EstimationResult};
use crate::panel::data::PanelIndex;

/// Design — one regression specification handed to an engine.
///
/// Fields
/// ------
/// - `response`: dependent variable, length `n`.
/// - `regressors`: `n × k` matrix of exogenous regressors (the
///   interaction term included as an ordinary column).
/// - `names`: the `k` regressor names, aligned with the columns.
///
/// Invariants
/// ----------
/// - `regressors.nrows() == response.len()` and
///   `regressors.ncols() == names.len()`; [`Design::new`] panics on
///   violations, which are programmer errors upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct Design {
    pub response: Array1<f64>,
    pub regressors: Array2<f64>,
    pub names: Vec<String>,
}

impl Design {
    /// Package a specification, asserting shape consistency.
    ///
    /// Panics
    /// ------
    /// - Panics when the row or name counts disagree with the matrix
    ///   shape; design assembly in this crate derives all three from the
    ///   same table, so a mismatch is a bug, not bad data.
    pub fn new(response: Array1<f64>, regressors: Array2<f64>, names: Vec<String>) -> Design {
        assert_eq!(regressors.nrows(), response.len(), "design rows must match response length");
        assert_eq!(regressors.ncols(), names.len(), "design columns must match name count");
        Design { response, regressors, names }
    }

    /// Number of observations.
    pub fn n_obs(&self) -> usize {
        self.response.len()
    }

    /// Number of regressors.
    pub fn n_regressors(&self) -> usize {
        self.names.len()
    }
}

/// FitOptions — engine policy for one fit.
///
/// Purpose
/// -------
/// Make the external-engine contract explicit: unit (entity) fixed
/// effects, clustering by unit, and the finite-sample debiasing
/// adjustment. The pipeline always runs with all three enabled; the
/// flags exist so the contract is visible and testable, not because the
/// pipeline varies them.
///
/// Fields
/// ------
/// - `entity_effects`: absorb a fixed effect per unit via the within
///   transformation.
/// - `cluster_by_unit`: cluster-robust covariance grouped on the unit
///   identifier; classical (homoskedastic) covariance otherwise.
/// - `debiased`: apply `G/(G−1) · (N−1)/(N−k_eff)` to the clustered
///   covariance (and the `N−k_eff` denominator to the classical one).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitOptions {
    pub entity_effects: bool,
    pub cluster_by_unit: bool,
    pub debiased: bool,
}

impl Default for FitOptions {
    /// Entity effects on, clustering on, debiased on — the only
    /// configuration the double-demeaning pipeline uses.
    fn default() -> FitOptions {
        FitOptions { entity_effects: true, cluster_by_unit: true, debiased: true }
    }
}

/// ModelFit — opaque result of one fixed-effects fit.
///
/// Purpose
/// -------
/// Carry the coefficient vector and covariance matrix of one fitted
/// specification, indexed by regressor name. Downstream code reads
/// coefficients, standard errors, and covariance submatrices through
/// name-based lookups and never inspects engine internals.
///
/// Fields
/// ------
/// - `names`: regressor names in estimation order.
/// - `params`: coefficient vector aligned with `names`.
/// - `cov`: `k × k` covariance of `params`.
/// - `std_errors`: square roots of the covariance diagonal.
/// - `nobs`, `n_clusters`: sample and cluster counts for reporting.
///
/// Invariants
/// ----------
/// - All stored values are finite; [`ModelFit::new`] rejects NaN or
///   infinite entries with `EstimationError::NonFinite`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFit {
    names: Vec<String>,
    params: Array1<f64>,
    cov: Array2<f64>,
    std_errors: Array1<f64>,
    nobs: usize,
    n_clusters: usize,
}

impl ModelFit {
    /// Assemble a fit result, deriving standard errors and checking
    /// finiteness.
    ///
    /// Errors
    /// ------
    /// - `EstimationError::NonFinite`
    ///   A coefficient or covariance entry is NaN/infinite, or a
    ///   diagonal entry is negative enough to defeat the square root.
    pub fn new(
        names: Vec<String>, params: Array1<f64>, cov: Array2<f64>, nobs: usize, n_clusters: usize,
    ) -> EstimationResult<ModelFit> {
        if params.iter().any(|v| !v.is_finite()) {
            return Err(EstimationError::NonFinite("coefficients".to_string()));
        }
        if cov.iter().any(|v| !v.is_finite()) {
            return Err(EstimationError::NonFinite("covariance matrix".to_string()));
        }
        let std_errors: Array1<f64> = (0..names.len()).map(|i| cov[[i, i]].sqrt()).collect();
        if std_errors.iter().any(|v| !v.is_finite()) {
            return Err(EstimationError::NonFinite("standard errors".to_string()));
        }
        Ok(ModelFit { names, params, cov, std_errors, nobs, n_clusters })
    }

    /// Regressor names in estimation order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Position of a named coefficient, if present.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Coefficient by name.
    pub fn coef(&self, name: &str) -> Option<f64> {
        self.position(name).map(|i| self.params[i])
    }

    /// Standard error by name.
    pub fn std_error(&self, name: &str) -> Option<f64> {
        self.position(name).map(|i| self.std_errors[i])
    }

    /// Full coefficient vector.
    pub fn params(&self) -> &Array1<f64> {
        &self.params
    }

    /// Full covariance matrix.
    pub fn cov(&self) -> &Array2<f64> {
        &self.cov
    }

    /// Covariance submatrix for the given coefficient positions, in the
    /// given order.
    pub fn cov_submatrix(&self, positions: &[usize]) -> DMatrix<f64> {
        DMatrix::from_fn(positions.len(), positions.len(), |i, j| {
            self.cov[[positions[i], positions[j]]]
        })
    }

    /// Number of observations the fit used.
    pub fn nobs(&self) -> usize {
        self.nobs
    }

    /// Number of clusters behind the covariance (units; 0 when the
    /// covariance is classical).
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }
}

/// FixedEffectsEngine — the injected regression capability.
///
/// Purpose
/// -------
/// Decouple the statistical core (demeaning, comparison, Hausman test)
/// from any concrete regression implementation. Production code uses
/// [`WithinEstimator`]; tests provide stubs that return canned
/// [`ModelFit`] values through the same seam.
pub trait FixedEffectsEngine {
    /// Fit one specification.
    ///
    /// Parameters
    /// ----------
    /// - `design`: the specification to fit.
    /// - `index`: validated grouping of the design's rows by unit; used
    ///   for entity effects and clustering.
    /// - `options`: engine policy; see [`FitOptions`].
    ///
    /// Returns
    /// -------
    /// `EstimationResult<ModelFit>`
    ///   The fit, or an [`EstimationError`] wrapping the engine's
    ///   numerical failure.
    fn fit(
        &self, design: &Design, index: &PanelIndex, options: &FitOptions,
    ) -> EstimationResult<ModelFit>;
}

/// WithinEstimator — built-in fixed-effects engine.
///
/// Purpose
/// -------
/// Estimate linear fixed-effects models by the within transformation
/// with cluster-robust covariance, implementing the engine contract the
/// pipeline needs without an external regression library.
///
/// Notes
/// -----
/// - Absorbed unit intercepts are counted in the degrees-of-freedom
///   corrections but are not reported as coefficients.
#[derive(Debug, Clone, Copy, Default)]
pub struct WithinEstimator;

impl FixedEffectsEngine for WithinEstimator {
    fn fit(
        &self, design: &Design, index: &PanelIndex, options: &FitOptions,
    ) -> EstimationResult<ModelFit> {
        let n = design.n_obs();
        let k = design.n_regressors();
        assert_eq!(n, index.n_obs(), "design rows must match the panel index");

        let k_eff = k + if options.entity_effects { index.n_units() } else { 0 };
        if n <= k_eff {
            return Err(EstimationError::InsufficientObservations { nobs: n, nparams: k_eff });
        }

        let (y, x) = if options.entity_effects {
            within_transform(&design.response, &design.regressors, index)
        } else {
            (design.response.clone(), design.regressors.clone())
        };

        // Normal equations; Cholesky doubles as the rank check.
        let xtx = DMatrix::from_fn(k, k, |i, j| {
            (0..n).map(|r| x[[r, i]] * x[[r, j]]).sum::<f64>()
        });
        let xty = DVector::from_fn(k, |i, _| (0..n).map(|r| x[[r, i]] * y[r]).sum::<f64>());
        let chol = Cholesky::new(xtx).ok_or_else(|| {
            EstimationError::Singular(
                "normal equations are not positive definite (a regressor may be collinear \
                 with the unit fixed effects or another regressor)"
                    .to_string(),
            )
        })?;
        let beta = chol.solve(&xty);
        let xtx_inv = chol.inverse();

        let residuals: Vec<f64> = (0..n)
            .map(|r| y[r] - (0..k).map(|j| x[[r, j]] * beta[j]).sum::<f64>())
            .collect();

        let (cov, n_clusters) = if options.cluster_by_unit {
            let g = index.n_units();
            if g < 2 {
                return Err(EstimationError::TooFewClusters { found: g });
            }
            (clustered_covariance(&x, &residuals, &xtx_inv, index, k_eff, options.debiased), g)
        } else {
            (classical_covariance(&residuals, &xtx_inv, n, k_eff), 0)
        };

        let params: Array1<f64> = (0..k).map(|i| beta[i]).collect();
        let cov_nd = Array2::from_shape_fn((k, k), |(i, j)| cov[(i, j)]);
        debug!(nobs = n, regressors = k, clusters = n_clusters, "fixed-effects fit complete");
        ModelFit::new(design.names.clone(), params, cov_nd, n, n_clusters)
    }
}

/// Demean the response and every regressor column within each unit.
fn within_transform(
    y: &Array1<f64>, x: &Array2<f64>, index: &PanelIndex,
) -> (Array1<f64>, Array2<f64>) {
    let mut y_w = y.clone();
    let mut x_w = x.clone();
    let k = x.ncols();
    for group in index.groups() {
        let len = group.len() as f64;
        let y_mean: f64 = group.iter().map(|&r| y[r]).sum::<f64>() / len;
        for &r in group {
            y_w[r] -= y_mean;
        }
        for j in 0..k {
            let mean: f64 = group.iter().map(|&r| x[[r, j]]).sum::<f64>() / len;
            for &r in group {
                x_w[[r, j]] -= mean;
            }
        }
    }
    (y_w, x_w)
}

/// Cluster-robust sandwich covariance with optional debiasing.
fn clustered_covariance(
    x: &Array2<f64>, residuals: &[f64], xtx_inv: &DMatrix<f64>, index: &PanelIndex, k_eff: usize,
    debiased: bool,
) -> DMatrix<f64> {
    let k = x.ncols();
    let n = residuals.len();
    let g = index.n_units();

    let mut meat = DMatrix::<f64>::zeros(k, k);
    for group in index.groups() {
        let mut score = DVector::<f64>::zeros(k);
        for &r in group {
            for j in 0..k {
                score[j] += x[[r, j]] * residuals[r];
            }
        }
        meat += &score * score.transpose();
    }
    if debiased {
        let adjustment =
            (g as f64 / (g - 1) as f64) * ((n - 1) as f64 / (n - k_eff) as f64);
        meat *= adjustment;
    }
    xtx_inv * meat * xtx_inv
}

/// Classical homoskedastic covariance `s² (XᵀX)⁻¹` with the
/// degrees-of-freedom denominator `N − k_eff`.
fn classical_covariance(
    residuals: &[f64], xtx_inv: &DMatrix<f64>, n: usize, k_eff: usize,
) -> DMatrix<f64> {
    let ssr: f64 = residuals.iter().map(|e| e * e).sum();
    let s2 = ssr / (n - k_eff) as f64;
    xtx_inv * s2
}
