//! demean — grand-mean centering and the double-demeaning transform.
//!
//! Purpose
//! -------
//! House the two data transformations that precede estimation: optional
//! grand-mean centering of the analysis variables, and the
//! double-demeaning construction that demeans the interacting variables
//! within units *before* forming their product.
//!
//! Key behaviors
//! -------------
//! - [`InteractionNames`](transform::InteractionNames) is the single
//!   source of truth for derived column names and for the mapping
//!   between the standard and double-demeaned interaction coefficients.
//! - Both transforms are pure: they borrow the input table and return an
//!   augmented or shifted copy together with diagnostic value objects.
//!
//! Downstream usage
//! ----------------
//! - The analysis orchestrator centers first (when enabled), then
//!   transforms, then hands the augmented table to the estimator.
//!
//! Testing notes
//! -------------
//! - The zero-within-mean invariant, the reference worked example, and
//!   centering behavior are unit-tested in the respective files;
//!   centering invariance of coefficients is asserted end-to-end in
//!   `tests/integration_dd_pipeline.rs`.

pub mod centering;
pub mod transform;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::centering::{apply_grand_mean_centering, CenteringRecord};
pub use self::transform::{create_double_demeaned_interaction, InteractionNames};
