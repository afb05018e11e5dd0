//! statistical_tests — specification diagnostics for the model comparison.
//!
//! Purpose
//! -------
//! Collect the statistical tests run on top of the fitted model pair.
//! This subtree currently implements the Hausman specification test
//! comparing the standard and double-demeaned interaction estimators,
//! including the numerically robust generalized-inverse ladder for
//! non-positive-definite variance differences.
//!
//! Key behaviors
//! -------------
//! - Expose the test via
//!   [`perform_hausman_test`](hausman::perform_hausman_test) and its
//!   result value [`HausmanOutcome`](hausman::HausmanOutcome).
//! - Fail soft by convention: the test returns `Option`, never an error.
//!   The surrounding pipeline fails fast for the primary model fits and
//!   degrades gracefully for this diagnostic — a deliberate asymmetry,
//!   documented here so it is not "fixed" into an exception later. A
//!   `None` means the primary comparison stands but the auxiliary test
//!   could not be computed.
//!
//! Conventions
//! -----------
//! - Coefficient alignment between the two models comes from
//!   `estimation::compare::coefficient_pairs`; this subtree never
//!   rewrites coefficient names itself.
//!
//! Downstream usage
//! ----------------
//! - Typical use goes through the analysis orchestrator, which forwards
//!   the pairing it already built:
//!
//!   ```rust,ignore
//!   use dd_ie::statistical_tests::perform_hausman_test;
//!
//!   let outcome = perform_hausman_test(&comparison.standard,
//!       &comparison.double_demeaned, &comparison.pairs);
//!   ```
//!
//! Testing notes
//! -------------
//! - Unit tests in [`hausman`] cover the degenerate identical-fits case,
//!   singular variance differences, the positive-definite path against
//!   hand computations, and the empty-pair soft failure.

pub mod hausman;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::hausman::{
    perform_hausman_test, HausmanConclusion, HausmanOutcome, EIGEN_EPS, SIGNIFICANCE_LEVEL,
};
