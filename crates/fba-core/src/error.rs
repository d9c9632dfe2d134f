//! Model error types.

use fba_solver::SolverError;

/// Errors that can occur while building, mutating or running an FBA model.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// An input array does not have the length the model requires.
    LengthMismatch {
        field: &'static str,
        expected: usize,
        got: usize,
    },
    /// Lower bound above upper bound (or NaN) for a reaction.
    InvalidBounds {
        reaction: usize,
        lower: f64,
        upper: f64,
    },
    /// Reaction number outside `[1, num_reactions]`.
    ReactionOutOfRange {
        reaction: usize,
        num_reactions: usize,
    },
    /// Stoichiometric matrix is empty, ragged or holds non-finite values.
    InvalidMatrix { reason: String },
    /// No reaction with this name.
    UnknownReaction(String),
    /// Operation attempted before the problem was built.
    ModelNotInitialized,
    /// The backend library failed.
    SolverFault(SolverError),
    /// A solve panicked; the payload message when it was a string.
    SolvePanicked(String),
}

impl ModelError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            ModelError::LengthMismatch { .. } => "PARAMS_LENGTH_MISMATCH",
            ModelError::InvalidBounds { .. } => "PARAMS_INVALID_BOUNDS",
            ModelError::ReactionOutOfRange { .. } => "PARAMS_REACTION_OUT_OF_RANGE",
            ModelError::InvalidMatrix { .. } => "PARAMS_INVALID_MATRIX",
            ModelError::UnknownReaction(_) => "PARAMS_UNKNOWN_REACTION",
            ModelError::ModelNotInitialized => "MODEL_NOT_INITIALIZED",
            ModelError::SolverFault(_) => "SOLVER_FAULT",
            ModelError::SolvePanicked(_) => "SOLVE_PANICKED",
        }
    }

    /// Whether the error was caused by malformed caller input.
    pub fn is_params_error(&self) -> bool {
        matches!(
            self,
            ModelError::LengthMismatch { .. }
                | ModelError::InvalidBounds { .. }
                | ModelError::ReactionOutOfRange { .. }
                | ModelError::InvalidMatrix { .. }
                | ModelError::UnknownReaction(_)
        )
    }
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::LengthMismatch {
                field,
                expected,
                got,
            } => write!(
                f,
                "[{}] {} length must be {} (got {})",
                self.code(),
                field,
                expected,
                got
            ),
            ModelError::InvalidBounds {
                reaction,
                lower,
                upper,
            } => write!(
                f,
                "[{}] Reaction {} bounds invalid: lower ({}) > upper ({})",
                self.code(),
                reaction,
                lower,
                upper
            ),
            ModelError::ReactionOutOfRange {
                reaction,
                num_reactions,
            } => write!(
                f,
                "[{}] Reaction {} out of range [1, {}]",
                self.code(),
                reaction,
                num_reactions
            ),
            ModelError::InvalidMatrix { reason } => {
                write!(f, "[{}] Stoichiometric matrix invalid: {}", self.code(), reason)
            }
            ModelError::UnknownReaction(name) => {
                write!(f, "[{}] No reaction named '{}'", self.code(), name)
            }
            ModelError::ModelNotInitialized => {
                write!(f, "[{}] Model has not been built", self.code())
            }
            ModelError::SolverFault(err) => write!(f, "[{}] {}", self.code(), err),
            ModelError::SolvePanicked(message) => {
                write!(f, "[{}] Solve panicked: {}", self.code(), message)
            }
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::SolverFault(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SolverError> for ModelError {
    fn from(err: SolverError) -> Self {
        ModelError::SolverFault(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_bounds() {
        let err = ModelError::InvalidBounds {
            reaction: 2,
            lower: 3.0,
            upper: 1.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("PARAMS_INVALID_BOUNDS"));
        assert!(msg.contains("Reaction 2"));
        assert!(err.is_params_error());
    }

    #[test]
    fn test_error_display_length_mismatch() {
        let err = ModelError::LengthMismatch {
            field: "lower bounds",
            expected: 3,
            got: 2,
        };
        assert_eq!(
            err.to_string(),
            "[PARAMS_LENGTH_MISMATCH] lower bounds length must be 3 (got 2)"
        );
    }

    #[test]
    fn test_not_initialized_is_not_params_error() {
        let err = ModelError::ModelNotInitialized;
        assert!(!err.is_params_error());
        assert_eq!(err.code(), "MODEL_NOT_INITIALIZED");
    }

    #[test]
    fn test_panic_display() {
        let err = ModelError::SolvePanicked("bad source".to_string());
        assert_eq!(err.to_string(), "[SOLVE_PANICKED] Solve panicked: bad source");
        assert!(!err.is_params_error());
    }

    #[test]
    fn test_solver_fault_wraps_source() {
        use std::error::Error;

        let err: ModelError = SolverError::InternalError("numeric failure".to_string()).into();
        assert_eq!(err.code(), "SOLVER_FAULT");
        assert!(err.to_string().contains("numeric failure"));
        assert!(err.source().is_some());
    }
}
