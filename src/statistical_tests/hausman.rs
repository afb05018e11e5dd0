//! statistical_tests::hausman — specification test for estimator bias.
//!
//! Purpose
//! -------
//! Implement the Hausman (1978) specification test comparing the
//! double-demeaned estimator (consistent under both hypotheses) with the
//! standard fixed-effects interaction estimator (efficient under the
//! null of no misspecification). A large statistic indicates systematic
//! differences — evidence that the standard interaction estimator is
//! biased by unobserved effect heterogeneity.
//!
//! ```text
//! H = (b − B)ᵀ [V(b) − V(B)]⁻¹ (b − B),   H ~ χ²(k) under H₀,
//! ```
//!
//! with `b` the double-demeaned and `B` the standard coefficient vector
//! over the k common coefficients.
//!
//! Key behaviors
//! -------------
//! - Align coefficients through the caller-supplied
//!   [`CoefficientPair`] list (the interaction coefficients carry
//!   different names in the two models; the pairing maps them).
//! - Check positive definiteness of the variance difference by symmetric
//!   eigendecomposition with the [`EIGEN_EPS`] floor; invert directly
//!   when it holds.
//! - When it does not hold — common in small samples or with collinear
//!   controls — fall back to a generalized inverse. Two numerically
//!   distinct strategies run: eigendecomposition with small-eigenvalue
//!   truncation at `max|λ|·k·ε`, and an SVD pseudo-inverse with the
//!   separate tolerance `maxσ·1e-10`. The finite, non-NaN result is
//!   preferred; a negative or implausibly large (> 100) choice triggers
//!   one final recomputation through a standard pseudo-inverse with
//!   relative tolerance 1e-10. Different numerical paths can behave
//!   inconsistently on near-singular matrices; this multi-strategy
//!   ladder is a first-class requirement, not an afterthought.
//! - Fail *soft*: zero common coefficients or an unusable statistic
//!   yield `None`, never an error or panic. The test is diagnostic, not
//!   load-bearing; the primary model comparison must remain usable when
//!   the test cannot be computed. This asymmetry with the fail-fast
//!   estimation layer is intentional.
//!
//! Invariants & assumptions
//! ------------------------
//! - The two fits share the common coefficients named by the pairs; the
//!   covariance submatrices are extracted in pair order so rows and
//!   columns align with the difference vector.
//! - Degrees of freedom equal the number of common coefficients.
//!
//! Conventions
//! -----------
//! - `diff = b_dd − b_std`: the consistent-under-both estimator minus
//!   the efficient-under-null one. The comparison *table* elsewhere
//!   reports standard − double-demeaned; the two signs intentionally
//!   differ, as in the reference methodology.
//! - p-value is the upper-tail χ²(k) survival probability; statistics at
//!   or below zero map to a p-value of 1.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the identical-fits case (statistic exactly 0,
//!   p-value 1), a deliberately singular variance difference (no panic,
//!   finite non-negative statistic, `positive_definite == false`), a
//!   well-posed positive-definite case against a hand-computed
//!   statistic, and the empty-pair `None`.

use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ChiSquared, ContinuousCDF};
use tracing::debug;

use crate::estimation::compare::CoefficientPair;
use crate::estimation::engine::ModelFit;

/// Eigenvalue floor for the positive-definiteness check: the variance
/// difference counts as positive definite only when every eigenvalue
/// exceeds this value.
pub const EIGEN_EPS: f64 = 1e-10;

/// Relative tolerance for the SVD-based pseudo-inverse strategies.
const SVD_RTOL: f64 = 1e-10;

/// A generalized-inverse statistic above this value (or below zero) is
/// treated as implausible and recomputed through the final fallback.
const PLAUSIBLE_MAX: f64 = 100.0;

/// Rejection threshold for the null of no systematic difference.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// HausmanConclusion — classification of the test outcome.
///
/// `SystematicBias` rejects the null at the 5% level (prefer the
/// double-demeaned estimator); `NoSystematicBias` fails to reject (both
/// estimators appear consistent, the standard one more efficient).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HausmanConclusion {
    SystematicBias,
    NoSystematicBias,
}

impl std::fmt::Display for HausmanConclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HausmanConclusion::SystematicBias => write!(f, "systematic bias detected"),
            HausmanConclusion::NoSystematicBias => write!(f, "no systematic bias"),
        }
    }
}

/// HausmanOutcome — result of one Hausman specification test.
///
/// Purpose
/// -------
/// Bundle the statistic, degrees of freedom, p-value, the
/// positive-definiteness flag for the variance difference, the
/// per-coefficient differences, and the classification.
///
/// Fields
/// ------
/// - `statistic`: the χ² test statistic (finite, possibly 0).
/// - `degrees_of_freedom`: number of common coefficients tested.
/// - `p_value`: upper-tail χ² survival probability, in [0, 1].
/// - `positive_definite`: whether `V(b) − V(B)` passed the eigenvalue
///   check; when false the statistic came from the generalized-inverse
///   ladder.
/// - `differences`: per-coefficient `b_dd − b_std`, labeled by the
///   standard model's names, in pair order.
/// - `conclusion`: the 5%-level classification.
#[derive(Debug, Clone, PartialEq)]
pub struct HausmanOutcome {
    statistic: f64,
    degrees_of_freedom: usize,
    p_value: f64,
    positive_definite: bool,
    differences: Vec<(String, f64)>,
    conclusion: HausmanConclusion,
}

impl HausmanOutcome {
    /// The χ² test statistic.
    pub fn statistic(&self) -> f64 {
        self.statistic
    }

    /// Degrees of freedom (number of common coefficients).
    pub fn degrees_of_freedom(&self) -> usize {
        self.degrees_of_freedom
    }

    /// Upper-tail χ² p-value of [`statistic`](Self::statistic).
    pub fn p_value(&self) -> f64 {
        self.p_value
    }

    /// Whether the variance difference was positive definite.
    pub fn positive_definite(&self) -> bool {
        self.positive_definite
    }

    /// Per-coefficient differences `b_dd − b_std`, in pair order.
    pub fn differences(&self) -> &[(String, f64)] {
        &self.differences
    }

    /// The 5%-level classification.
    pub fn conclusion(&self) -> HausmanConclusion {
        self.conclusion
    }
}

/// Run the Hausman test over the aligned common coefficients.
///
/// Parameters
/// ----------
/// - `standard`: the standard fixed-effects fit (efficient under H₀).
/// - `double_demeaned`: the double-demeaned fit (consistent under both
///   hypotheses).
/// - `pairs`: aligned coefficient names from
///   [`coefficient_pairs`](crate::estimation::compare::coefficient_pairs).
///
/// Returns
/// -------
/// `Option<HausmanOutcome>`
///   The test outcome, or `None` when there are no common coefficients,
///   a pair names a coefficient missing from either fit, or every
///   numerical strategy fails to produce a finite statistic. `None` is
///   the documented soft-failure convention of this diagnostic; callers
///   report the primary comparison regardless.
pub fn perform_hausman_test(
    standard: &ModelFit, double_demeaned: &ModelFit, pairs: &[CoefficientPair],
) -> Option<HausmanOutcome> {
    if pairs.is_empty() {
        debug!("hausman test skipped: no common coefficients");
        return None;
    }

    let std_positions: Vec<usize> =
        pairs.iter().map(|p| standard.position(&p.standard_name)).collect::<Option<_>>()?;
    let dd_positions: Vec<usize> =
        pairs.iter().map(|p| double_demeaned.position(&p.dd_name)).collect::<Option<_>>()?;

    let k = pairs.len();
    let b_std = DVector::from_fn(k, |i, _| standard.params()[std_positions[i]]);
    let b_dd = DVector::from_fn(k, |i, _| double_demeaned.params()[dd_positions[i]]);
    let v_std = standard.cov_submatrix(&std_positions);
    let v_dd = double_demeaned.cov_submatrix(&dd_positions);

    // b consistent under both hypotheses, B efficient under the null.
    let diff = &b_dd - &b_std;
    let v_diff = &v_dd - &v_std;

    let eigen = v_diff.clone().symmetric_eigen();
    let mut positive_definite = eigen.eigenvalues.iter().all(|&lambda| lambda > EIGEN_EPS);

    let mut statistic = f64::NAN;
    if positive_definite {
        match v_diff.clone().try_inverse() {
            Some(inverse) => statistic = quadratic_form(&diff, &inverse),
            None => positive_definite = false,
        }
    }
    if !positive_definite {
        let eigen_stat = eigen_truncated_statistic(&eigen.eigenvalues, &eigen.eigenvectors, &diff);
        statistic = if eigen_stat.is_finite() {
            eigen_stat
        } else {
            svd_statistic(&v_diff, &diff)
        };
        if statistic < 0.0 || statistic > PLAUSIBLE_MAX {
            statistic = pinv_statistic(&v_diff, &diff)?;
        }
    }
    if !statistic.is_finite() {
        debug!("hausman test skipped: no numerical strategy produced a finite statistic");
        return None;
    }

    let p_value = if statistic <= 0.0 {
        1.0
    } else {
        1.0 - ChiSquared::new(k as f64).ok()?.cdf(statistic)
    };
    let conclusion = if p_value < SIGNIFICANCE_LEVEL {
        HausmanConclusion::SystematicBias
    } else {
        HausmanConclusion::NoSystematicBias
    };
    let differences =
        pairs.iter().zip(diff.iter()).map(|(p, &d)| (p.label.clone(), d)).collect();

    debug!(
        statistic,
        degrees_of_freedom = k,
        p_value,
        positive_definite,
        "hausman test complete"
    );
    Some(HausmanOutcome {
        statistic,
        degrees_of_freedom: k,
        p_value,
        positive_definite,
        differences,
        conclusion,
    })
}

/// `dᵀ M d` for a square matrix M.
#[inline]
fn quadratic_form(d: &DVector<f64>, m: &DMatrix<f64>) -> f64 {
    d.dot(&(m * d))
}

/// Generalized-inverse statistic via eigendecomposition with
/// small-eigenvalue truncation.
///
/// Eigenvalues at or below `max|λ| · k · ε` are discarded; with no
/// retained eigenvalue the strategy is unusable and +∞ is returned so
/// the caller falls through to the SVD strategy. Projecting the
/// difference onto the retained eigenvectors gives
/// `Σ (qᵢᵀ d)² / λᵢ` without forming the inverse explicitly.
fn eigen_truncated_statistic(
    eigenvalues: &DVector<f64>, eigenvectors: &DMatrix<f64>, diff: &DVector<f64>,
) -> f64 {
    let k = eigenvalues.len();
    let max_abs = eigenvalues.iter().fold(0.0_f64, |acc, &l| acc.max(l.abs()));
    let tolerance = max_abs * k as f64 * f64::EPSILON;

    let mut statistic = 0.0;
    let mut retained = 0_usize;
    for (i, &lambda) in eigenvalues.iter().enumerate() {
        if lambda > tolerance {
            let projection = eigenvectors.column(i).dot(diff);
            statistic += projection * projection / lambda;
            retained += 1;
        }
    }
    if retained == 0 { f64::INFINITY } else { statistic }
}

/// Generalized-inverse statistic via SVD with the `maxσ · 1e-10`
/// tolerance; NaN when the decomposition does not expose its factors.
fn svd_statistic(v_diff: &DMatrix<f64>, diff: &DVector<f64>) -> f64 {
    let svd = v_diff.clone().svd(true, true);
    let (u, v_t) = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => (u, v_t),
        _ => return f64::NAN,
    };
    let max_sigma = svd.singular_values.iter().fold(0.0_f64, |acc, &s| acc.max(s));
    let tolerance = max_sigma * SVD_RTOL;

    let s_inv = DMatrix::from_fn(v_t.nrows(), u.ncols(), |i, j| {
        if i == j && svd.singular_values[i] > tolerance {
            1.0 / svd.singular_values[i]
        } else {
            0.0
        }
    });
    let ginv = v_t.transpose() * s_inv * u.transpose();
    quadratic_form(diff, &ginv)
}

/// Final fallback: a standard pseudo-inverse with relative tolerance
/// `1e-10`; `None` when nalgebra reports the decomposition failed.
fn pinv_statistic(v_diff: &DMatrix<f64>, diff: &DVector<f64>) -> Option<f64> {
    let max_sigma = {
        let svd = v_diff.clone().svd(false, false);
        svd.singular_values.iter().fold(0.0_f64, |acc, &s| acc.max(s))
    };
    let pinv = v_diff.clone().pseudo_inverse(max_sigma * SVD_RTOL).ok()?;
    Some(quadratic_form(diff, &pinv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demean::transform::InteractionNames;
    use crate::estimation::compare::coefficient_pairs;
    use ndarray::{arr2, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The identical-fits degenerate case (statistic exactly 0,
    //   p-value 1, not positive definite).
    // - A deliberately singular variance difference (no panic, finite
    //   non-negative statistic).
    // - A hand-computed positive-definite case, including the p-value.
    // - A large, significant difference and the empty-pair None.
    //
    // They intentionally DO NOT cover:
    // - Size or power of the test under resampling; those belong to
    //   simulation studies, not unit tests.
    // -------------------------------------------------------------------------

    fn fit(
        names: &[&str], params: ndarray::Array1<f64>, cov: ndarray::Array2<f64>,
    ) -> ModelFit {
        ModelFit::new(
            names.iter().map(|s| s.to_string()).collect(),
            params,
            cov,
            100,
            10,
        )
        .expect("finite stub fit")
    }

    fn interaction_pairs(standard: &ModelFit, dd: &ModelFit) -> Vec<CoefficientPair> {
        coefficient_pairs(standard, dd, &InteractionNames::new("x", "z"))
    }

    #[test]
    // Purpose
    // -------
    // Verify the degenerate case: bitwise-identical coefficient vectors
    // and covariance matrices yield a statistic of exactly 0 and a
    // p-value of 1 (no difference implies no rejection).
    //
    // Given
    // -----
    // - Two fits with identical params and covariances over
    //   [x, int_x_z] / [x, dd_int_x_z].
    //
    // Expect
    // ------
    // - statistic == 0.0 exactly, p_value == 1.0,
    //   positive_definite == false, conclusion NoSystematicBias.
    fn hausman_identical_fits_give_zero_statistic_and_unit_p_value() {
        // Arrange
        let params = array![1.25, -0.5];
        let cov = arr2(&[[0.04, 0.01], [0.01, 0.09]]);
        let standard = fit(&["x", "int_x_z"], params.clone(), cov.clone());
        let dd = fit(&["x", "dd_int_x_z"], params, cov);
        let pairs = interaction_pairs(&standard, &dd);

        // Act
        let outcome =
            perform_hausman_test(&standard, &dd, &pairs).expect("test should compute");

        // Assert
        assert_eq!(outcome.statistic(), 0.0);
        assert_eq!(outcome.p_value(), 1.0);
        assert!(!outcome.positive_definite());
        assert_eq!(outcome.conclusion(), HausmanConclusion::NoSystematicBias);
        assert_eq!(outcome.degrees_of_freedom(), 2);
    }

    #[test]
    // Purpose
    // -------
    // Verify graceful handling of a deliberately singular variance
    // difference: no panic, a finite non-negative statistic, and the
    // positive-definite flag cleared.
    //
    // Given
    // -----
    // - Fits whose covariance difference is the rank-one matrix
    //   [[2, 2], [2, 2]] (proportional variances).
    //
    // Expect
    // ------
    // - Some(outcome) with positive_definite == false and
    //   0 ≤ statistic < ∞.
    fn hausman_singular_variance_difference_does_not_raise() {
        // Arrange
        let standard =
            fit(&["x", "int_x_z"], array![1.0, 2.0], arr2(&[[1.0, 0.0], [0.0, 1.0]]));
        let dd = fit(
            &["x", "dd_int_x_z"],
            array![1.3, 2.4],
            arr2(&[[3.0, 2.0], [2.0, 3.0]]),
        );
        let pairs = interaction_pairs(&standard, &dd);

        // Act
        let outcome =
            perform_hausman_test(&standard, &dd, &pairs).expect("fallbacks should compute");

        // Assert
        assert!(!outcome.positive_definite());
        assert!(outcome.statistic().is_finite());
        assert!(outcome.statistic() >= 0.0);
        assert!((0.0..=1.0).contains(&outcome.p_value()));
    }

    #[test]
    // Purpose
    // -------
    // Verify the positive-definite path against a hand-computed
    // statistic and p-value.
    //
    // Given
    // -----
    // - diff = b_dd − b_std = [0.5, 0.5] and V_diff = 0.5·I, so
    //   H = 0.25/0.5 + 0.25/0.5 = 1 with 2 degrees of freedom and
    //   p = exp(−1/2) ≈ 0.6065.
    //
    // Expect
    // ------
    // - positive_definite == true, statistic ≈ 1, p ≈ 0.6065,
    //   NoSystematicBias, and differences labeled by standard names.
    fn hausman_positive_definite_path_matches_hand_computation() {
        // Arrange
        let standard =
            fit(&["x", "int_x_z"], array![1.0, 2.0], arr2(&[[0.5, 0.0], [0.0, 0.5]]));
        let dd = fit(
            &["x", "dd_int_x_z"],
            array![1.5, 2.5],
            arr2(&[[1.0, 0.0], [0.0, 1.0]]),
        );
        let pairs = interaction_pairs(&standard, &dd);

        // Act
        let outcome =
            perform_hausman_test(&standard, &dd, &pairs).expect("test should compute");

        // Assert
        assert!(outcome.positive_definite());
        assert!((outcome.statistic() - 1.0).abs() < 1e-12);
        assert!((outcome.p_value() - (-0.5_f64).exp()).abs() < 1e-9);
        assert_eq!(outcome.conclusion(), HausmanConclusion::NoSystematicBias);
        let labels: Vec<&str> =
            outcome.differences().iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(labels, vec!["x", "int_x_z"]);
        for (_, d) in outcome.differences() {
            assert!((d - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that a large coefficient discrepancy relative to the
    // variance difference rejects the null.
    //
    // Given
    // -----
    // - diff = [3, 3] with V_diff = 0.1·I, so H = 180 with 2 degrees of
    //   freedom.
    //
    // Expect
    // ------
    // - conclusion SystematicBias with p_value < 0.05.
    fn hausman_large_difference_detects_systematic_bias() {
        // Arrange
        let standard =
            fit(&["x", "int_x_z"], array![0.0, 0.0], arr2(&[[0.2, 0.0], [0.0, 0.2]]));
        let dd = fit(
            &["x", "dd_int_x_z"],
            array![3.0, 3.0],
            arr2(&[[0.3, 0.0], [0.0, 0.3]]),
        );
        let pairs = interaction_pairs(&standard, &dd);

        // Act
        let outcome =
            perform_hausman_test(&standard, &dd, &pairs).expect("test should compute");

        // Assert
        assert!(outcome.positive_definite());
        assert!(outcome.p_value() < SIGNIFICANCE_LEVEL);
        assert_eq!(outcome.conclusion(), HausmanConclusion::SystematicBias);
    }

    #[test]
    // Purpose
    // -------
    // Verify the soft failure: with zero common coefficients the test
    // returns None rather than erroring.
    //
    // Given
    // -----
    // - Fits with disjoint coefficient names.
    //
    // Expect
    // ------
    // - `perform_hausman_test` returns None.
    fn hausman_zero_common_coefficients_returns_none() {
        // Arrange
        let standard = fit(&["a"], array![1.0], arr2(&[[1.0]]));
        let dd = fit(&["b"], array![1.0], arr2(&[[1.0]]));
        let pairs = interaction_pairs(&standard, &dd);

        // Act
        let outcome = perform_hausman_test(&standard, &dd, &pairs);

        // Assert
        assert!(pairs.is_empty());
        assert!(outcome.is_none());
    }
}
