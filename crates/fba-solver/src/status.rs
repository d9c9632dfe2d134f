//! Outcome of a single LP solve.

use serde::{Deserialize, Serialize};

/// Status reported by a backend after `solve`.
///
/// Only `Optimal` counts as a successful FBA phase. Limit statuses may still
/// carry a primal point, which backends keep for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverStatus {
    Optimal,
    Infeasible,
    Unbounded,
    ReachedTimeLimit,
    ReachedIterationLimit,
    /// The formulation changed (or was never solved) since the last solve.
    NotSolved,
    Unknown,
}

impl SolverStatus {
    pub fn is_optimal(self) -> bool {
        self == SolverStatus::Optimal
    }

    /// True when the solve stopped on a time or iteration limit.
    pub fn is_limit(self) -> bool {
        matches!(
            self,
            SolverStatus::ReachedTimeLimit | SolverStatus::ReachedIterationLimit
        )
    }

    /// True when the backend holds a primal point for this status.
    pub fn carries_solution(self) -> bool {
        self.is_optimal() || self.is_limit()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SolverStatus::Optimal => "optimal",
            SolverStatus::Infeasible => "infeasible",
            SolverStatus::Unbounded => "unbounded",
            SolverStatus::ReachedTimeLimit => "time_limit",
            SolverStatus::ReachedIterationLimit => "iteration_limit",
            SolverStatus::NotSolved => "not_solved",
            SolverStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_optimal_is_success() {
        let statuses = [
            SolverStatus::Optimal,
            SolverStatus::Infeasible,
            SolverStatus::Unbounded,
            SolverStatus::ReachedTimeLimit,
            SolverStatus::ReachedIterationLimit,
            SolverStatus::NotSolved,
            SolverStatus::Unknown,
        ];
        let optimal: Vec<_> = statuses.iter().filter(|s| s.is_optimal()).collect();
        assert_eq!(optimal, vec![&SolverStatus::Optimal]);
    }

    #[test]
    fn test_limit_statuses_carry_solutions() {
        assert!(SolverStatus::ReachedTimeLimit.carries_solution());
        assert!(SolverStatus::ReachedIterationLimit.is_limit());
        assert!(SolverStatus::Optimal.carries_solution());
        assert!(!SolverStatus::Optimal.is_limit());
        assert!(!SolverStatus::Unbounded.carries_solution());
        assert!(!SolverStatus::NotSolved.carries_solution());
    }

    #[test]
    fn test_display_is_short_name() {
        assert_eq!(SolverStatus::ReachedIterationLimit.to_string(), "iteration_limit");
        assert_eq!(format!("{}", SolverStatus::Infeasible), "infeasible");
    }

    #[test]
    fn test_serde_uses_variant_names() {
        let json = serde_json::to_string(&SolverStatus::ReachedTimeLimit).unwrap();
        assert_eq!(json, "\"reached_time_limit\"");
        let back: SolverStatus = serde_json::from_str("\"not_solved\"").unwrap();
        assert_eq!(back, SolverStatus::NotSolved);
    }
}
