//! Backend capability trait.

use crate::{
    BoundKind, MatrixEntry, ObjectiveDirection, SolveMethod, SolverConfig, SolverError,
    SolverStatus, VariableKind,
};
use std::ops::Range;

/// Capability set the FBA engine consumes from an LP solver backend.
///
/// Implementations own one problem instance each. `Clone` must produce a deep,
/// independent copy of the formulation (the engine relies on this to give
/// every worker private solver state) and dropping a backend releases the
/// problem.
///
/// Bound setters receive the derived [`BoundKind`] alongside the values so
/// backends that distinguish fixed from ranged variables can forward it.
pub trait LpBackend: Clone + Send + std::fmt::Debug {
    /// Short backend identifier for logs and artifacts.
    fn name() -> &'static str;

    /// One-time, process-wide library setup. Called by [`crate::SolverRuntime::init`].
    fn initialize_process(_config: &SolverConfig) -> Result<(), SolverError> {
        Ok(())
    }

    /// Counterpart of [`LpBackend::initialize_process`], called once after all work drained.
    fn teardown_process() {}

    /// Create an empty problem configured with `config`.
    fn create_problem(config: &SolverConfig) -> Self;

    /// Append variables and return their index range.
    fn add_variables(&mut self, count: usize, kind: VariableKind) -> Range<usize>;

    /// Append constraints and return their index range.
    fn add_constraints(&mut self, count: usize) -> Range<usize>;

    /// Load nonzero coefficients.
    fn load_sparse_matrix(&mut self, entries: &[MatrixEntry]) -> Result<(), SolverError>;

    fn set_variable_bounds(
        &mut self,
        index: usize,
        kind: BoundKind,
        lower: f64,
        upper: f64,
    ) -> Result<(), SolverError>;

    fn set_constraint_bounds(
        &mut self,
        index: usize,
        kind: BoundKind,
        lower: f64,
        upper: f64,
    ) -> Result<(), SolverError>;

    fn set_objective_coefficient(&mut self, index: usize, value: f64) -> Result<(), SolverError>;

    fn set_objective_direction(&mut self, direction: ObjectiveDirection);

    /// Enable or disable presolve for subsequent solves.
    fn set_presolve(&mut self, enabled: bool);

    /// Solve the current formulation.
    ///
    /// Infeasible or unbounded problems are reported through the returned
    /// status; `Err` is reserved for library faults.
    fn solve(&mut self, method: SolveMethod) -> Result<SolverStatus, SolverError>;

    /// Status of the most recent solve.
    fn status(&self) -> SolverStatus;

    /// Objective value of the most recent solve, if it produced a solution.
    fn objective_value(&self) -> Option<f64>;

    /// Primal value of a variable in the most recent solve, if available.
    fn variable_primal(&self, index: usize) -> Option<f64>;

    fn num_variables(&self) -> usize;

    fn num_constraints(&self) -> usize;
}
