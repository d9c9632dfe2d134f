//! Solver error types.

/// Error type for backend operations.
///
/// Non-optimal solve outcomes are reported as [`crate::SolverStatus`] values,
/// not as errors; this type covers malformed calls and library faults.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Variable (column) index does not exist.
    InvalidVariableIndex { index: usize, num_variables: usize },
    /// Constraint (row) index does not exist.
    InvalidConstraintIndex {
        index: usize,
        num_constraints: usize,
    },
    /// Lower bound above upper bound, or a NaN bound.
    InvalidBounds { lower: f64, upper: f64 },
    /// Matrix coefficient is not finite.
    InvalidCoefficient { row: usize, col: usize },
    /// Solver library is not available (e.g. not linked or failed to load).
    SolverNotAvailable(String),
    /// Internal solver error (license, numerics, library failure).
    InternalError(String),
}

impl SolverError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            SolverError::InvalidVariableIndex { .. } => "SOLVER_INVALID_VARIABLE",
            SolverError::InvalidConstraintIndex { .. } => "SOLVER_INVALID_CONSTRAINT",
            SolverError::InvalidBounds { .. } => "SOLVER_INVALID_BOUNDS",
            SolverError::InvalidCoefficient { .. } => "SOLVER_INVALID_COEFFICIENT",
            SolverError::SolverNotAvailable(_) => "SOLVER_NOT_AVAILABLE",
            SolverError::InternalError(_) => "SOLVER_INTERNAL",
        }
    }
}

impl std::fmt::Display for SolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverError::InvalidVariableIndex {
                index,
                num_variables,
            } => write!(
                f,
                "[{}] Variable index {} out of bounds (num_variables = {})",
                self.code(),
                index,
                num_variables
            ),
            SolverError::InvalidConstraintIndex {
                index,
                num_constraints,
            } => write!(
                f,
                "[{}] Constraint index {} out of bounds (num_constraints = {})",
                self.code(),
                index,
                num_constraints
            ),
            SolverError::InvalidBounds { lower, upper } => write!(
                f,
                "[{}] Bounds invalid: lower ({}) > upper ({})",
                self.code(),
                lower,
                upper
            ),
            SolverError::InvalidCoefficient { row, col } => write!(
                f,
                "[{}] Coefficient at ({}, {}) is not finite",
                self.code(),
                row,
                col
            ),
            SolverError::SolverNotAvailable(msg) => {
                write!(f, "[{}] Solver not available: {}", self.code(), msg)
            }
            SolverError::InternalError(msg) => {
                write!(f, "[{}] Solver internal error: {}", self.code(), msg)
            }
        }
    }
}

impl std::error::Error for SolverError {}
