//! Per-run solve results.

use crate::ObjectiveStyle;
use fba_solver::SolverStatus;
use serde::{Deserialize, Serialize};

/// Objective value reported when a run produced no solution.
pub const FAILED_OBJECTIVE: f64 = f64::MIN;

/// LP instance whose solution a run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LpVariant {
    Standard,
    AbsoluteValue,
}

impl LpVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            LpVariant::Standard => "standard",
            LpVariant::AbsoluteValue => "absolute_value",
        }
    }
}

/// Outcome of one controller run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResult {
    /// Flux per reaction; all zero when the run failed.
    pub fluxes: Vec<f64>,
    /// Flux of the objective reaction in the authoritative LP.
    pub objective_value: f64,
    /// Raw objective of the last LP solved.
    pub lp_objective_value: f64,
    pub success: bool,
    pub status: SolverStatus,
    pub style: ObjectiveStyle,
    pub variant: LpVariant,
}

impl SolveResult {
    /// Result of a run that produced no usable solution.
    pub fn failed(
        num_reactions: usize,
        style: ObjectiveStyle,
        status: SolverStatus,
        variant: LpVariant,
    ) -> Self {
        Self {
            fluxes: vec![0.0; num_reactions],
            objective_value: FAILED_OBJECTIVE,
            lp_objective_value: FAILED_OBJECTIVE,
            success: false,
            status,
            style,
            variant,
        }
    }

    /// Flux of a 1-based reaction number.
    pub fn flux(&self, reaction: usize) -> Option<f64> {
        reaction
            .checked_sub(1)
            .and_then(|index| self.fluxes.get(index))
            .copied()
    }
}
