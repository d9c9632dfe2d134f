//! Status conversions for HiGHS integration.

use fba_solver::SolverStatus;
use highs::HighsModelStatus;

pub(crate) fn highs_to_solver_status(status: HighsModelStatus) -> SolverStatus {
    match status {
        HighsModelStatus::Optimal => SolverStatus::Optimal,
        HighsModelStatus::Infeasible => SolverStatus::Infeasible,
        HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => {
            SolverStatus::Unbounded
        }
        HighsModelStatus::ReachedTimeLimit => SolverStatus::ReachedTimeLimit,
        HighsModelStatus::ReachedIterationLimit => SolverStatus::ReachedIterationLimit,
        _ => SolverStatus::Unknown,
    }
}

pub(crate) fn has_solution(status: SolverStatus) -> bool {
    status.carries_solution()
}
