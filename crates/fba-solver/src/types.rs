//! Shared formulation types passed across the backend boundary.

use serde::{Deserialize, Serialize};

/// Direction of the objective function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectiveDirection {
    /// Minimize the objective
    Minimize,
    /// Maximize the objective
    Maximize,
}

impl ObjectiveDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectiveDirection::Minimize => "min",
            ObjectiveDirection::Maximize => "max",
        }
    }
}

/// Integrality of a block of variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VariableKind {
    #[default]
    Continuous,
    Integer,
}

/// Shape of a `[lower, upper]` range as handed to the solver.
///
/// The kind is always derived from the values via [`BoundKind::derive`]; a
/// degenerate range is `Fixed`, finite ranges are `Double`, and half-open or
/// open ranges map to `Lower`, `Upper` or `Free`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundKind {
    /// No finite bound on either side.
    Free,
    /// Only the lower bound is finite.
    Lower,
    /// Only the upper bound is finite.
    Upper,
    /// Both bounds finite and distinct.
    Double,
    /// Lower equals upper.
    Fixed,
}

impl BoundKind {
    /// Derive the bound kind from a `[lower, upper]` pair.
    pub fn derive(lower: f64, upper: f64) -> Self {
        if lower == upper {
            return BoundKind::Fixed;
        }
        match (lower.is_finite(), upper.is_finite()) {
            (true, true) => BoundKind::Double,
            (true, false) => BoundKind::Lower,
            (false, true) => BoundKind::Upper,
            (false, false) => BoundKind::Free,
        }
    }

    /// Whether the range collapses to a single value.
    pub fn is_fixed(self) -> bool {
        matches!(self, BoundKind::Fixed)
    }

    /// Normalize a range according to this kind.
    ///
    /// Sides that the kind declares unbounded are widened to infinity and a
    /// fixed kind pins the upper side to the lower value.
    pub fn apply(self, lower: f64, upper: f64) -> (f64, f64) {
        match self {
            BoundKind::Free => (f64::NEG_INFINITY, f64::INFINITY),
            BoundKind::Lower => (lower, f64::INFINITY),
            BoundKind::Upper => (f64::NEG_INFINITY, upper),
            BoundKind::Double => (lower, upper),
            BoundKind::Fixed => (lower, lower),
        }
    }
}

/// One nonzero coefficient of a constraint matrix, `(row, column, value)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatrixEntry {
    pub row: usize,
    pub col: usize,
    pub value: f64,
}

impl MatrixEntry {
    pub fn new(row: usize, col: usize, value: f64) -> Self {
        Self { row, col, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_kind_derive() {
        assert_eq!(BoundKind::derive(2.0, 2.0), BoundKind::Fixed);
        assert_eq!(BoundKind::derive(0.0, 10.0), BoundKind::Double);
        assert_eq!(BoundKind::derive(0.0, f64::INFINITY), BoundKind::Lower);
        assert_eq!(BoundKind::derive(f64::NEG_INFINITY, 0.0), BoundKind::Upper);
        assert_eq!(
            BoundKind::derive(f64::NEG_INFINITY, f64::INFINITY),
            BoundKind::Free
        );
    }

    #[test]
    fn test_bound_kind_fixed_at_zero() {
        let kind = BoundKind::derive(0.0, 0.0);
        assert!(kind.is_fixed());
        assert_eq!(kind.apply(0.0, 0.0), (0.0, 0.0));
    }

    #[test]
    fn test_bound_kind_apply_widens_open_sides() {
        assert_eq!(
            BoundKind::Lower.apply(1.0, 5.0),
            (1.0, f64::INFINITY)
        );
        assert_eq!(
            BoundKind::Upper.apply(1.0, 5.0),
            (f64::NEG_INFINITY, 5.0)
        );
        assert_eq!(BoundKind::Fixed.apply(3.0, 7.0), (3.0, 3.0));
    }
}
