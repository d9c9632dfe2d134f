//! Pure-Rust simplex backend built on `microlp`.
//!
//! The formulation lives in a [`LinearProgram`]; each solve translates it into a
//! fresh `microlp::Problem`. microlp has no interior-point method and no
//! presolve, so `SolveMethod::Interior` runs simplex and presolve flags are
//! recorded but have no effect.

use fba_solver::{
    BoundKind, LinearProgram, LpBackend, MatrixEntry, ObjectiveDirection, SolveMethod,
    SolveOutcome, SolverConfig, SolverError, SolverStatus, VariableKind,
};
use microlp::{ComparisonOp, OptimizationDirection, Problem, Variable};
use std::ops::Range;
use std::time::Instant;
use tracing::{debug, trace, warn};

/// LP backend solving with microlp's dual simplex.
#[derive(Debug, Clone)]
pub struct MicrolpBackend {
    program: LinearProgram,
    presolve: bool,
    outcome: SolveOutcome,
}

impl MicrolpBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self {
            program: LinearProgram::new(),
            presolve: true,
            outcome: SolveOutcome::not_solved(),
        }
    }

    /// Access the stored formulation.
    pub fn program(&self) -> &LinearProgram {
        &self.program
    }

    fn invalidate(&mut self) {
        self.outcome = SolveOutcome::not_solved();
    }

    fn build_problem(&self) -> (Problem, Vec<Variable>) {
        let direction = match self.program.direction() {
            ObjectiveDirection::Minimize => OptimizationDirection::Minimize,
            ObjectiveDirection::Maximize => OptimizationDirection::Maximize,
        };
        let mut problem = Problem::new(direction);

        let mut vars = Vec::with_capacity(self.program.num_variables());
        for index in 0..self.program.num_variables() {
            let (lower, upper, _) = self
                .program
                .variable_bounds(index)
                .unwrap_or((0.0, f64::INFINITY, BoundKind::Lower));
            let cost = self.program.objective_coefficient(index).unwrap_or(0.0);
            let var = match self.program.variable_kind(index) {
                Some(VariableKind::Integer) => {
                    problem.add_integer_var(cost, (integer_bound(lower), integer_bound(upper)))
                }
                _ => problem.add_var(cost, (lower, upper)),
            };
            vars.push(var);
        }

        for row in 0..self.program.num_constraints() {
            let Some((lower, upper, kind)) = self.program.constraint_bounds(row) else {
                continue;
            };
            let terms: Vec<(Variable, f64)> = self
                .program
                .row_entries(row)
                .map(|(col, value)| (vars[col], value))
                .collect();
            match kind {
                BoundKind::Free => {}
                BoundKind::Fixed => problem.add_constraint(&terms, ComparisonOp::Eq, lower),
                BoundKind::Lower => problem.add_constraint(&terms, ComparisonOp::Ge, lower),
                BoundKind::Upper => problem.add_constraint(&terms, ComparisonOp::Le, upper),
                BoundKind::Double => {
                    problem.add_constraint(&terms, ComparisonOp::Ge, lower);
                    problem.add_constraint(&terms, ComparisonOp::Le, upper);
                }
            }
        }

        (problem, vars)
    }
}

impl Default for MicrolpBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LpBackend for MicrolpBackend {
    fn name() -> &'static str {
        "microlp"
    }

    fn create_problem(config: &SolverConfig) -> Self {
        let mut backend = Self::new();
        if let Some(presolve) = config.presolve {
            backend.presolve = presolve;
        }
        if config.time_limit.is_some() || config.threads.is_some() {
            debug!(
                component = "solver",
                operation = "create_problem",
                status = "success",
                backend = "microlp",
                "Time limit and thread options are not supported by microlp; ignoring"
            );
        }
        backend
    }

    fn add_variables(&mut self, count: usize, kind: VariableKind) -> Range<usize> {
        self.invalidate();
        self.program.add_variables(count, kind)
    }

    fn add_constraints(&mut self, count: usize) -> Range<usize> {
        self.invalidate();
        self.program.add_constraints(count)
    }

    fn load_sparse_matrix(&mut self, entries: &[MatrixEntry]) -> Result<(), SolverError> {
        self.invalidate();
        self.program.load_sparse_matrix(entries)
    }

    fn set_variable_bounds(
        &mut self,
        index: usize,
        kind: BoundKind,
        lower: f64,
        upper: f64,
    ) -> Result<(), SolverError> {
        self.invalidate();
        self.program.set_variable_bounds(index, kind, lower, upper)
    }

    fn set_constraint_bounds(
        &mut self,
        index: usize,
        kind: BoundKind,
        lower: f64,
        upper: f64,
    ) -> Result<(), SolverError> {
        self.invalidate();
        self.program.set_constraint_bounds(index, kind, lower, upper)
    }

    fn set_objective_coefficient(&mut self, index: usize, value: f64) -> Result<(), SolverError> {
        self.invalidate();
        self.program.set_objective_coefficient(index, value)
    }

    fn set_objective_direction(&mut self, direction: ObjectiveDirection) {
        self.invalidate();
        self.program.set_direction(direction);
    }

    fn set_presolve(&mut self, enabled: bool) {
        self.presolve = enabled;
    }

    fn solve(&mut self, method: SolveMethod) -> Result<SolverStatus, SolverError> {
        if method == SolveMethod::Interior {
            warn!(
                component = "solver",
                operation = "solve",
                status = "warn",
                backend = "microlp",
                "Interior point is not available in microlp; using simplex"
            );
        }
        let started = Instant::now();
        let (problem, vars) = self.build_problem();
        trace!(
            component = "solver",
            operation = "solve",
            status = "start",
            backend = "microlp",
            num_cols = self.program.num_variables(),
            num_rows = self.program.num_constraints(),
            nnz = self.program.num_nonzeros(),
            presolve = self.presolve,
            "Solving model"
        );

        let result = problem.solve();
        let outcome = match result {
            Ok(solution) => SolveOutcome {
                status: SolverStatus::Optimal,
                objective_value: solution.objective(),
                primal_values: vars.iter().map(|var| *solution.var_value(*var)).collect(),
            },
            Err(microlp::Error::Infeasible) => {
                SolveOutcome::without_solution(SolverStatus::Infeasible)
            }
            Err(microlp::Error::Unbounded) => {
                SolveOutcome::without_solution(SolverStatus::Unbounded)
            }
            Err(microlp::Error::InternalError(msg)) => {
                warn!(
                    component = "solver",
                    operation = "solve",
                    status = "error",
                    backend = "microlp",
                    error = %msg,
                    "microlp internal error"
                );
                self.outcome = SolveOutcome::without_solution(SolverStatus::Unknown);
                return Err(SolverError::InternalError(msg));
            }
        };

        let status = outcome.status;
        debug!(
            component = "solver",
            operation = "solve",
            status = "success",
            backend = "microlp",
            solver_status = %status,
            objective_value = outcome.objective_value,
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "microlp solve completed"
        );
        self.outcome = outcome;
        Ok(status)
    }

    fn status(&self) -> SolverStatus {
        self.outcome.status
    }

    fn objective_value(&self) -> Option<f64> {
        self.outcome.objective_value()
    }

    fn variable_primal(&self, index: usize) -> Option<f64> {
        self.outcome.primal(index)
    }

    fn num_variables(&self) -> usize {
        self.program.num_variables()
    }

    fn num_constraints(&self) -> usize {
        self.program.num_constraints()
    }
}

fn integer_bound(value: f64) -> i32 {
    if value.is_finite() {
        value.round() as i32
    } else if value > 0.0 {
        i32::MAX
    } else {
        i32::MIN
    }
}
