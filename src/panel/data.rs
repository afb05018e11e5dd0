//! panel::data — typed column table and validated unit grouping.
//!
//! Purpose
//! -------
//! Define the in-memory panel representation used throughout the crate:
//! [`PanelData`], a column table whose columns are explicitly typed as
//! numeric variables, identifier keys, or unencoded categorical labels,
//! and [`PanelIndex`], the validated grouping of rows by unit that every
//! downstream stage consumes.
//!
//! Key behaviors
//! -------------
//! - Enforce an explicit schema at the boundary: numeric variables are
//!   `f64` arrays (NaN marks a missing value), identifiers are optional
//!   integer keys, and categorical columns must be *explicitly* encoded
//!   to numeric codes before entering any model. Requesting a column
//!   under the wrong type is a configuration error, never a coercion.
//! - Provide listwise deletion over named variables
//!   ([`PanelData::drop_missing`]) and row selection for unit filtering.
//! - Build per-unit row groups once, during validation, and thread them
//!   by reference so grouping work is never repeated downstream.
//!
//! Invariants & assumptions
//! ------------------------
//! - All columns of a `PanelData` share one length; construction and
//!   insertion reject ragged input.
//! - A `PanelIndex` only exists for key columns with no missing entries
//!   and no duplicated (unit, time) pair; holding one is proof the
//!   identifiers validated.
//! - Group order follows first appearance of each unit key in the table;
//!   row order within a group follows table order.
//!
//! Conventions
//! -----------
//! - Column lookup is linear over the (small) column list, which keeps
//!   column order deterministic for reports and tests.
//! - Categorical encoding maps levels to codes in sorted level order
//!   (`0.0, 1.0, …`), so the encoding is reproducible across runs.
//!
//! Downstream usage
//! ----------------
//! - The validator produces the `PanelIndex`; the transformer, variation
//!   checker, and estimator all take `(&PanelData, &PanelIndex)` pairs
//!   and return new tables rather than mutating their input.
//!
//! Testing notes
//! -------------
//! - Unit tests cover typed access (wrong-type and missing-column
//!   rejections), categorical encoding order, listwise deletion, and
//!   duplicate / grouping behavior of `PanelIndex`.

use ndarray::Array1;

use crate::panel::errors::{PanelError, PanelResult};

/// Column — one typed column of a panel table.
///
/// Purpose
/// -------
/// Carry the caller-declared semantic type of a column so that type
/// mismatches are rejected at the boundary instead of being coerced at
/// estimation time.
///
/// Variants
/// --------
/// - `Numeric(values)`
///   An analysis variable; `NaN` marks a missing observation.
/// - `Keys(values)`
///   An identifier column (unit or time); `None` marks a missing key.
/// - `Categorical(labels)`
///   String labels that must be encoded via
///   [`PanelData::encode_categorical`] before use as a variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Array1<f64>),
    Keys(Vec<Option<i64>>),
    Categorical(Vec<String>),
}

impl Column {
    /// Number of rows in this column.
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Keys(v) => v.len(),
            Column::Categorical(v) => v.len(),
        }
    }

    /// Whether this column has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// PanelData — an in-memory panel table with explicitly typed columns.
///
/// Purpose
/// -------
/// Hold the observations of a panel dataset as named, typed columns and
/// expose the typed accessors the rest of the crate builds on. The table
/// itself knows nothing about unit/time structure; that knowledge lives
/// in [`PanelIndex`], which is produced by validation.
///
/// Key behaviors
/// -------------
/// - Construction via [`PanelData::from_columns`] rejects ragged input.
/// - [`PanelData::numeric`] / [`PanelData::keys`] return typed views or a
///   configuration error; there is no silent cross-type coercion.
/// - [`PanelData::insert_numeric`] adds or replaces a derived column
///   (within-unit means, demeaned variables, interactions).
/// - [`PanelData::drop_missing`] performs listwise deletion over a set of
///   named numeric variables.
///
/// Invariants
/// ----------
/// - Every column has length [`PanelData::n_rows`].
/// - Column names are unique; inserting an existing name replaces the
///   column in place, preserving column order.
///
/// Performance
/// -----------
/// - Lookup is linear in the number of columns, which is small (tens at
///   most); rows are the large dimension and are never scanned by lookup.
///
/// Notes
/// -----
/// - Cloning a `PanelData` copies all column data; pipeline stages that
///   augment the table do so on an explicit copy to keep the caller's
///   table untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelData {
    columns: Vec<(String, Column)>,
    n_rows: usize,
}

impl PanelData {
    /// Build a panel table from named, typed columns.
    ///
    /// Parameters
    /// ----------
    /// - `columns`: `Vec<(String, Column)>`
    ///   Column names with their typed values, in display order. Must be
    ///   non-empty and share one length.
    ///
    /// Returns
    /// -------
    /// `PanelResult<PanelData>`
    ///   The table, or `PanelError::LengthMismatch` naming the first
    ///   column whose length differs from the first column's, or
    ///   `PanelError::EmptyPanel` when no columns are supplied.
    ///
    /// Errors
    /// ------
    /// - `PanelError::EmptyPanel`
    ///   No columns were supplied.
    /// - `PanelError::LengthMismatch`
    ///   A column's length differs from the table length.
    ///
    /// Notes
    /// -----
    /// - Duplicate names are not rejected here; later entries shadow
    ///   earlier ones on lookup. Callers are expected to supply unique
    ///   names, and the orchestrator's derived columns use reserved
    ///   prefixes (`mean_`, `dm_`, `int_`, `dd_int_`).
    pub fn from_columns(columns: Vec<(String, Column)>) -> PanelResult<PanelData> {
        let n_rows = match columns.first() {
            Some((_, col)) => col.len(),
            None => return Err(PanelError::EmptyPanel),
        };
        for (name, col) in &columns {
            if col.len() != n_rows {
                return Err(PanelError::LengthMismatch {
                    column: name.clone(),
                    expected: n_rows,
                    actual: col.len(),
                });
            }
        }
        Ok(PanelData { columns, n_rows })
    }

    /// Number of observations (rows).
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Column names in table order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Whether a column with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Untyped column lookup; later duplicates shadow earlier ones.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().rev().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    /// Typed access to a numeric column.
    ///
    /// Returns
    /// -------
    /// `PanelResult<&Array1<f64>>`
    ///   The values, or `ColumnNotFound` / `NotNumeric`. A categorical
    ///   column is *not* numeric until explicitly encoded.
    pub fn numeric(&self, name: &str) -> PanelResult<&Array1<f64>> {
        match self.column(name) {
            Some(Column::Numeric(values)) => Ok(values),
            Some(_) => Err(PanelError::NotNumeric(name.to_string())),
            None => Err(PanelError::ColumnNotFound(name.to_string())),
        }
    }

    /// Typed access to an identifier (key) column.
    ///
    /// Returns
    /// -------
    /// `PanelResult<&Vec<Option<i64>>>`
    ///   The keys, or `ColumnNotFound` / `NotKeys`.
    pub fn keys(&self, name: &str) -> PanelResult<&Vec<Option<i64>>> {
        match self.column(name) {
            Some(Column::Keys(values)) => Ok(values),
            Some(_) => Err(PanelError::NotKeys(name.to_string())),
            None => Err(PanelError::ColumnNotFound(name.to_string())),
        }
    }

    /// Add or replace a numeric column.
    ///
    /// Parameters
    /// ----------
    /// - `name`: column name; replaces in place when it already exists.
    /// - `values`: length must equal [`PanelData::n_rows`].
    ///
    /// Errors
    /// ------
    /// - `PanelError::LengthMismatch` when the length differs.
    pub fn insert_numeric(&mut self, name: &str, values: Array1<f64>) -> PanelResult<()> {
        if values.len() != self.n_rows {
            return Err(PanelError::LengthMismatch {
                column: name.to_string(),
                expected: self.n_rows,
                actual: values.len(),
            });
        }
        match self.columns.iter_mut().find(|(n, _)| n == name) {
            Some((_, col)) => *col = Column::Numeric(values),
            None => self.columns.push((name.to_string(), Column::Numeric(values))),
        }
        Ok(())
    }

    /// Encode a categorical column to numeric codes, in place.
    ///
    /// Levels are collected, sorted, and mapped to codes `0.0, 1.0, …` in
    /// sorted order, so the encoding is deterministic. The column's type
    /// changes from `Categorical` to `Numeric`; calling this on a column
    /// that is already numeric is an error, keeping every conversion an
    /// explicit, one-time decision of the caller.
    ///
    /// Errors
    /// ------
    /// - `PanelError::ColumnNotFound` when the column is absent.
    /// - `PanelError::NotCategorical` when the column is numeric or an
    ///   identifier (those are never encoded).
    pub fn encode_categorical(&mut self, name: &str) -> PanelResult<()> {
        let labels = match self.column(name) {
            Some(Column::Categorical(labels)) => labels.clone(),
            Some(_) => return Err(PanelError::NotCategorical(name.to_string())),
            None => return Err(PanelError::ColumnNotFound(name.to_string())),
        };
        let mut levels: Vec<&String> = labels.iter().collect();
        levels.sort();
        levels.dedup();
        let codes: Array1<f64> = labels
            .iter()
            .map(|label| {
                // Sorted-unique level list; position is the code.
                levels.binary_search(&label).map(|pos| pos as f64).unwrap_or(f64::NAN)
            })
            .collect();
        if let Some((_, col)) = self.columns.iter_mut().find(|(n, _)| n == name) {
            *col = Column::Numeric(codes);
        }
        Ok(())
    }

    /// Listwise deletion over named numeric variables.
    ///
    /// Parameters
    /// ----------
    /// - `vars`: numeric column names to scan; a row is dropped when any
    ///   of them is `NaN` in that row.
    ///
    /// Returns
    /// -------
    /// `PanelResult<PanelData>`
    ///   A new table containing only complete rows (all columns are
    ///   filtered, not just the scanned ones), or a typed-access error
    ///   for an absent / non-numeric name.
    pub fn drop_missing(&self, vars: &[&str]) -> PanelResult<PanelData> {
        let mut keep = vec![true; self.n_rows];
        for var in vars {
            let values = self.numeric(var)?;
            for (row, value) in values.iter().enumerate() {
                if value.is_nan() {
                    keep[row] = false;
                }
            }
        }
        let rows: Vec<usize> =
            keep.iter().enumerate().filter(|(_, k)| **k).map(|(row, _)| row).collect();
        Ok(self.select_rows(&rows))
    }

    /// New table containing the given rows, in the given order.
    ///
    /// Panics
    /// ------
    /// - Panics when a row index is out of bounds; callers construct row
    ///   lists from this table's own indices.
    pub fn select_rows(&self, rows: &[usize]) -> PanelData {
        let columns = self
            .columns
            .iter()
            .map(|(name, col)| {
                let filtered = match col {
                    Column::Numeric(v) => {
                        Column::Numeric(rows.iter().map(|&r| v[r]).collect::<Array1<f64>>())
                    }
                    Column::Keys(v) => Column::Keys(rows.iter().map(|&r| v[r]).collect()),
                    Column::Categorical(v) => {
                        Column::Categorical(rows.iter().map(|&r| v[r].clone()).collect())
                    }
                };
                (name.clone(), filtered)
            })
            .collect();
        PanelData { columns, n_rows: rows.len() }
    }
}

/// PanelIndex — validated grouping of panel rows by unit.
///
/// Purpose
/// -------
/// Record, once, which rows belong to which unit and which time periods
/// each unit was observed in. Produced only by
/// [`validate_panel`](crate::panel::validation::validate_panel); holding a
/// `PanelIndex` is proof that the identifier columns were complete and
/// that no (unit, time) pair repeats.
///
/// Fields
/// ------
/// - `groups`: per-unit row indices, units in first-appearance order,
///   rows in table order.
/// - `unit_keys`: the distinct unit identifiers aligned with `groups`.
/// - `times`: per-unit observed time keys aligned with `groups`.
///
/// Invariants
/// ----------
/// - `groups`, `unit_keys`, and `times` have equal length.
/// - The concatenation of `groups` is a permutation of `0..n_obs`.
/// - Within one group, `times` entries are pairwise distinct.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelIndex {
    groups: Vec<Vec<usize>>,
    unit_keys: Vec<i64>,
    times: Vec<Vec<i64>>,
    n_obs: usize,
}

impl PanelIndex {
    /// Group rows by unit key, rejecting duplicated (unit, time) pairs.
    ///
    /// Parameters
    /// ----------
    /// - `units`, `times`: complete key vectors of equal length (missing
    ///   keys are rejected upstream by the validator).
    ///
    /// Returns
    /// -------
    /// `PanelResult<PanelIndex>`
    ///   The grouping, or `PanelError::DuplicateObservation` naming the
    ///   first repeated pair, or `PanelError::EmptyPanel` for zero rows.
    ///
    /// Notes
    /// -----
    /// - Group order follows first appearance, so reports line up with
    ///   the caller's row order regardless of key values.
    pub fn new(units: &[i64], times: &[i64]) -> PanelResult<PanelIndex> {
        if units.is_empty() {
            return Err(PanelError::EmptyPanel);
        }
        let mut group_of_key: std::collections::HashMap<i64, usize> =
            std::collections::HashMap::new();
        let mut seen: std::collections::HashSet<(i64, i64)> = std::collections::HashSet::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut unit_keys: Vec<i64> = Vec::new();
        let mut group_times: Vec<Vec<i64>> = Vec::new();

        for (row, (&unit, &time)) in units.iter().zip(times.iter()).enumerate() {
            if !seen.insert((unit, time)) {
                return Err(PanelError::DuplicateObservation { unit, time });
            }
            let group = *group_of_key.entry(unit).or_insert_with(|| {
                groups.push(Vec::new());
                unit_keys.push(unit);
                group_times.push(Vec::new());
                groups.len() - 1
            });
            groups[group].push(row);
            group_times[group].push(time);
        }

        Ok(PanelIndex { groups, unit_keys, times: group_times, n_obs: units.len() })
    }

    /// Number of distinct units.
    pub fn n_units(&self) -> usize {
        self.groups.len()
    }

    /// Number of observations covered by the index.
    pub fn n_obs(&self) -> usize {
        self.n_obs
    }

    /// Per-unit row-index groups, units in first-appearance order.
    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    /// Distinct unit keys aligned with [`PanelIndex::groups`].
    pub fn unit_keys(&self) -> &[i64] {
        &self.unit_keys
    }

    /// Observed time keys of one unit, in table order.
    pub fn times_of(&self, group: usize) -> &[i64] {
        &self.times[group]
    }

    /// Observation counts per unit, aligned with [`PanelIndex::groups`].
    pub fn periods_per_unit(&self) -> Vec<usize> {
        self.groups.iter().map(|g| g.len()).collect()
    }

    /// Whether every unit was observed in an identical set of periods.
    ///
    /// This is the strict set comparison: equal observation counts with
    /// differing period sets still count as unbalanced.
    pub fn is_balanced(&self) -> bool {
        let mut reference: Vec<i64> = match self.times.first() {
            Some(t) => t.clone(),
            None => return true,
        };
        reference.sort_unstable();
        self.times.iter().all(|t| {
            let mut sorted = t.clone();
            sorted.sort_unstable();
            sorted == reference
        })
    }
}
