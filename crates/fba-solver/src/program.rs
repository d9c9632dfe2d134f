//! Backend-agnostic storage for one linear program.
//!
//! Backends keep their formulation in a [`LinearProgram`] and translate it into
//! the native solver representation at solve time. Cloning a backend therefore
//! clones plain vectors, which is what makes per-worker copies cheap and fully
//! independent.

use crate::{BoundKind, MatrixEntry, ObjectiveDirection, SolverError, SolverStatus, VariableKind};
use std::collections::BTreeMap;
use std::ops::Range;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Column {
    lower: f64,
    upper: f64,
    kind: BoundKind,
    cost: f64,
    integrality: VariableKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Row {
    lower: f64,
    upper: f64,
    kind: BoundKind,
}

/// Column-bound, row-bound and coefficient storage for one LP.
///
/// New variables start at `[0, +inf)` with a zero objective coefficient; new
/// constraints start free. Coefficients are stored per row keyed by column, so
/// repeated loads of the same position overwrite and exact zeros are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearProgram {
    columns: Vec<Column>,
    rows: Vec<Row>,
    row_entries: Vec<BTreeMap<usize, f64>>,
    direction: ObjectiveDirection,
}

impl LinearProgram {
    /// Create an empty program minimizing a zero objective.
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            row_entries: Vec::new(),
            direction: ObjectiveDirection::Minimize,
        }
    }

    /// Append `count` variables and return their index range.
    pub fn add_variables(&mut self, count: usize, integrality: VariableKind) -> Range<usize> {
        let start = self.columns.len();
        let column = Column {
            lower: 0.0,
            upper: f64::INFINITY,
            kind: BoundKind::Lower,
            cost: 0.0,
            integrality,
        };
        self.columns.extend(std::iter::repeat(column).take(count));
        start..self.columns.len()
    }

    /// Append `count` free constraints and return their index range.
    pub fn add_constraints(&mut self, count: usize) -> Range<usize> {
        let start = self.rows.len();
        let row = Row {
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
            kind: BoundKind::Free,
        };
        self.rows.extend(std::iter::repeat(row).take(count));
        self.row_entries
            .extend(std::iter::repeat_with(BTreeMap::new).take(count));
        start..self.rows.len()
    }

    /// Load sparse coefficients. All entries are validated before any is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry references a missing row or column, or if a
    /// value is not finite.
    pub fn load_sparse_matrix(&mut self, entries: &[MatrixEntry]) -> Result<(), SolverError> {
        for entry in entries {
            self.check_constraint(entry.row)?;
            self.check_variable(entry.col)?;
            if !entry.value.is_finite() {
                return Err(SolverError::InvalidCoefficient {
                    row: entry.row,
                    col: entry.col,
                });
            }
        }
        for entry in entries {
            let row = &mut self.row_entries[entry.row];
            if entry.value == 0.0 {
                row.remove(&entry.col);
            } else {
                row.insert(entry.col, entry.value);
            }
        }
        trace!(
            component = "program",
            operation = "load_sparse_matrix",
            status = "success",
            entries = entries.len(),
            nnz = self.num_nonzeros(),
            "Loaded sparse coefficients"
        );
        Ok(())
    }

    /// Set the bounds of one variable. The stored range is normalized by `kind`.
    pub fn set_variable_bounds(
        &mut self,
        index: usize,
        kind: BoundKind,
        lower: f64,
        upper: f64,
    ) -> Result<(), SolverError> {
        self.check_variable(index)?;
        validate_range(lower, upper)?;
        let (lower, upper) = kind.apply(lower, upper);
        let column = &mut self.columns[index];
        column.lower = lower;
        column.upper = upper;
        column.kind = kind;
        Ok(())
    }

    /// Set the bounds of one constraint. The stored range is normalized by `kind`.
    pub fn set_constraint_bounds(
        &mut self,
        index: usize,
        kind: BoundKind,
        lower: f64,
        upper: f64,
    ) -> Result<(), SolverError> {
        self.check_constraint(index)?;
        validate_range(lower, upper)?;
        let (lower, upper) = kind.apply(lower, upper);
        let row = &mut self.rows[index];
        row.lower = lower;
        row.upper = upper;
        row.kind = kind;
        Ok(())
    }

    pub fn set_objective_coefficient(
        &mut self,
        index: usize,
        value: f64,
    ) -> Result<(), SolverError> {
        self.check_variable(index)?;
        self.columns[index].cost = value;
        Ok(())
    }

    pub fn set_direction(&mut self, direction: ObjectiveDirection) {
        self.direction = direction;
    }

    pub fn direction(&self) -> ObjectiveDirection {
        self.direction
    }

    pub fn num_variables(&self) -> usize {
        self.columns.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.rows.len()
    }

    /// Number of stored nonzero coefficients.
    pub fn num_nonzeros(&self) -> usize {
        self.row_entries.iter().map(BTreeMap::len).sum()
    }

    /// `(lower, upper, kind)` of a variable.
    pub fn variable_bounds(&self, index: usize) -> Option<(f64, f64, BoundKind)> {
        self.columns.get(index).map(|c| (c.lower, c.upper, c.kind))
    }

    /// `(lower, upper, kind)` of a constraint.
    pub fn constraint_bounds(&self, index: usize) -> Option<(f64, f64, BoundKind)> {
        self.rows.get(index).map(|r| (r.lower, r.upper, r.kind))
    }

    pub fn objective_coefficient(&self, index: usize) -> Option<f64> {
        self.columns.get(index).map(|c| c.cost)
    }

    pub fn variable_kind(&self, index: usize) -> Option<VariableKind> {
        self.columns.get(index).map(|c| c.integrality)
    }

    /// Coefficient at `(row, col)`, zero when absent.
    pub fn coefficient(&self, row: usize, col: usize) -> f64 {
        self.row_entries
            .get(row)
            .and_then(|entries| entries.get(&col))
            .copied()
            .unwrap_or(0.0)
    }

    /// Nonzero `(column, value)` pairs of one row in column order.
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.row_entries
            .get(row)
            .into_iter()
            .flat_map(|entries| entries.iter().map(|(col, value)| (*col, *value)))
    }

    fn check_variable(&self, index: usize) -> Result<(), SolverError> {
        if index < self.columns.len() {
            Ok(())
        } else {
            Err(SolverError::InvalidVariableIndex {
                index,
                num_variables: self.columns.len(),
            })
        }
    }

    fn check_constraint(&self, index: usize) -> Result<(), SolverError> {
        if index < self.rows.len() {
            Ok(())
        } else {
            Err(SolverError::InvalidConstraintIndex {
                index,
                num_constraints: self.rows.len(),
            })
        }
    }
}

impl Default for LinearProgram {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_range(lower: f64, upper: f64) -> Result<(), SolverError> {
    if lower.is_nan() || upper.is_nan() || lower > upper {
        return Err(SolverError::InvalidBounds { lower, upper });
    }
    Ok(())
}

/// Result of the most recent solve held by a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub status: SolverStatus,
    pub objective_value: f64,
    pub primal_values: Vec<f64>,
}

impl SolveOutcome {
    /// State of a backend that has not been solved since its last formulation change.
    pub fn not_solved() -> Self {
        Self {
            status: SolverStatus::NotSolved,
            objective_value: f64::NAN,
            primal_values: Vec::new(),
        }
    }

    /// A finished solve without a usable solution.
    pub fn without_solution(status: SolverStatus) -> Self {
        Self {
            status,
            objective_value: f64::NAN,
            primal_values: Vec::new(),
        }
    }

    pub fn objective_value(&self) -> Option<f64> {
        if self.status.carries_solution() {
            Some(self.objective_value)
        } else {
            None
        }
    }

    pub fn primal(&self, index: usize) -> Option<f64> {
        if self.status.carries_solution() {
            self.primal_values.get(index).copied()
        } else {
            None
        }
    }
}
