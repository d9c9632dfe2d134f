//! `LpBackend` implementation on top of the HiGHS solver.

use crate::ffi::{highs_version, iteration_count};
use crate::status::{has_solution, highs_to_solver_status};
use fba_solver::{
    BoundKind, LinearProgram, LpBackend, MatrixEntry, ObjectiveDirection, SolveMethod,
    SolveOutcome, SolverConfig, SolverError, SolverStatus, VariableKind,
};
use highs::{Col, Model, RowProblem, Sense as HighsSense};
use std::ops::Range;
use std::time::Instant;
use tracing::{debug, trace, warn};

/// LP backend solving with HiGHS (dual simplex or interior point).
#[derive(Debug, Clone)]
pub struct HighsBackend {
    program: LinearProgram,
    config: SolverConfig,
    outcome: SolveOutcome,
    iterations: u64,
}

impl HighsBackend {
    /// Create an empty backend with default options.
    pub fn new() -> Self {
        Self::with_config(SolverConfig::new())
    }

    /// Create an empty backend with the given options.
    pub fn with_config(config: SolverConfig) -> Self {
        debug!(
            component = "solver",
            operation = "create_problem",
            status = "success",
            backend = "highs",
            "Creating new HiGHS problem"
        );
        Self {
            program: LinearProgram::new(),
            config,
            outcome: SolveOutcome::not_solved(),
            iterations: 0,
        }
    }

    /// Access the stored formulation.
    pub fn program(&self) -> &LinearProgram {
        &self.program
    }

    fn invalidate(&mut self) {
        self.outcome = SolveOutcome::not_solved();
    }

    fn build_problem(&self) -> RowProblem {
        let mut problem = RowProblem::default();
        let mut cols: Vec<Col> = Vec::with_capacity(self.program.num_variables());
        for index in 0..self.program.num_variables() {
            let (lower, upper, _) = self
                .program
                .variable_bounds(index)
                .unwrap_or((0.0, f64::INFINITY, BoundKind::Lower));
            let cost = self.program.objective_coefficient(index).unwrap_or(0.0);
            let col = match self.program.variable_kind(index) {
                Some(VariableKind::Integer) => problem.add_integer_column(cost, lower..=upper),
                _ => problem.add_column(cost, lower..=upper),
            };
            cols.push(col);
        }

        for row in 0..self.program.num_constraints() {
            let Some((lower, upper, _)) = self.program.constraint_bounds(row) else {
                continue;
            };
            let factors: Vec<(Col, f64)> = self
                .program
                .row_entries(row)
                .map(|(col, value)| (cols[col], value))
                .collect();
            problem.add_row(lower..=upper, factors);
        }
        problem
    }

    fn apply_options(&self, model: &mut Model, method: SolveMethod) {
        let log_to_console = self.config.log_to_console.unwrap_or(false);
        if self.config.verbosity.unwrap_or(0) == 0 && !log_to_console {
            model.make_quiet();
        }
        if let Some(level) = self.config.verbosity {
            model.set_option("output_flag", level > 0);
        }
        if log_to_console {
            model.set_option("log_to_console", true);
            model.set_option("output_flag", true);
        }

        let solver = match method {
            SolveMethod::Simplex => "simplex",
            SolveMethod::Interior => "ipm",
        };
        model.set_option("solver", solver);

        if let Some(presolve) = self.config.presolve {
            model.set_option("presolve", if presolve { "on" } else { "off" });
        }
        if let Some(limit) = self.config.time_limit {
            model.set_option("time_limit", limit);
        }
        if let Some(threads) = self.config.threads {
            model.set_option("threads", threads as i32);
        }
        if let Some(tolerance) = self.config.tolerance {
            model.set_option("primal_feasibility_tolerance", tolerance);
            model.set_option("dual_feasibility_tolerance", tolerance);
        }
    }
}

impl Default for HighsBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LpBackend for HighsBackend {
    fn name() -> &'static str {
        "highs"
    }

    fn initialize_process(_config: &SolverConfig) -> Result<(), SolverError> {
        let version = highs_version().ok_or_else(|| {
            SolverError::SolverNotAvailable("HiGHS did not report a version".to_string())
        })?;
        debug!(
            component = "solver",
            operation = "init_process",
            status = "success",
            backend = "highs",
            solver_version = %version,
            "HiGHS library available"
        );
        Ok(())
    }

    fn teardown_process() {
        debug!(
            component = "solver",
            operation = "teardown_process",
            status = "success",
            backend = "highs",
            "HiGHS backend released"
        );
    }

    fn create_problem(config: &SolverConfig) -> Self {
        Self::with_config(config.clone())
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
        debug!(
            component = "solver",
            operation = "set_objective_direction",
            status = "success",
            direction = direction.as_str(),
            "Setting objective direction"
        );
        self.invalidate();
        self.program.set_direction(direction);
    }

    fn set_presolve(&mut self, enabled: bool) {
        self.config.presolve = Some(enabled);
    }

    fn solve(&mut self, method: SolveMethod) -> Result<SolverStatus, SolverError> {
        let started = Instant::now();
        trace!(
            component = "solver",
            operation = "solve",
            status = "start",
            backend = "highs",
            num_cols = self.program.num_variables(),
            num_rows = self.program.num_constraints(),
            nnz = self.program.num_nonzeros(),
            method = method.as_str(),
            "Solving model"
        );

        let sense = match self.program.direction() {
            ObjectiveDirection::Minimize => HighsSense::Minimise,
            ObjectiveDirection::Maximize => HighsSense::Maximise,
        };
        let mut model = self.build_problem().optimise(sense);
        self.apply_options(&mut model, method);

        let solved = match model.try_solve() {
            Ok(solved) => solved,
            Err(err) => {
                warn!(
                    component = "solver",
                    operation = "solve",
                    status = "error",
                    backend = "highs",
                    ?err,
                    "HiGHS run failed"
                );
                self.outcome = SolveOutcome::without_solution(SolverStatus::Unknown);
                self.iterations = 0;
                return Err(SolverError::InternalError(format!(
                    "HiGHS run failed: {err:?}"
                )));
            }
        };

        let status = highs_to_solver_status(solved.status());
        self.iterations = iteration_count(&solved);
        self.outcome = if has_solution(status) {
            SolveOutcome {
                status,
                objective_value: solved.objective_value(),
                primal_values: solved.get_solution().columns().to_vec(),
            }
        } else {
            SolveOutcome::without_solution(status)
        };

        debug!(
            component = "solver",
            operation = "solve",
            status = "success",
            backend = "highs",
            solver_status = %status,
            iterations = self.iterations,
            objective_value = self.outcome.objective_value,
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "HiGHS solve completed"
        );
        if status != SolverStatus::Optimal && has_solution(status) {
            warn!(
                component = "solver",
                operation = "solve",
                status = "warn",
                backend = "highs",
                solver_status = %status,
                "Solver hit limit but returning best solution found"
            );
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_problem_is_empty() {
        let lp = HighsBackend::create_problem(&SolverConfig::new());
        assert_eq!(lp.num_variables(), 0);
        assert_eq!(lp.num_constraints(), 0);
        assert_eq!(lp.status(), SolverStatus::NotSolved);
    }

    #[test]
    fn test_set_presolve_updates_config() {
        let mut lp = HighsBackend::new();
        lp.set_presolve(false);
        assert_eq!(lp.config.presolve, Some(false));
    }

    #[test]
    fn test_direction_change_invalidates_solution() {
        let mut lp = HighsBackend::new();
        lp.add_variables(1, VariableKind::Continuous);
        lp.outcome = SolveOutcome {
            status: SolverStatus::Optimal,
            objective_value: 1.0,
            primal_values: vec![1.0],
        };
        lp.set_objective_direction(ObjectiveDirection::Maximize);
        assert_eq!(lp.status(), SolverStatus::NotSolved);
        assert_eq!(lp.program().direction(), ObjectiveDirection::Maximize);
    }
}
