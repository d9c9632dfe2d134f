//! Multi-phase solve protocol over a [`StoichiometricProblem`].

use crate::error::ModelError;
use crate::problem::{ProblemOptions, StoichiometricProblem};
use crate::result::{LpVariant, SolveResult, FAILED_OBJECTIVE};
use crate::style::{ObjectiveStyle, Protocol};
use fba_solver::{LpBackend, ObjectiveDirection, SolveMethod, SolverConfig, SolverStatus};
use std::time::Instant;
use tracing::{debug, trace, warn};

/// FBA model: one stoichiometric problem plus the result of its latest run.
///
/// `run` takes `&mut self`, so a model is driven by one thread at a time.
/// Cloning yields an independent deep copy, including both LP instances.
#[derive(Debug, Clone)]
pub struct FbaModel<B: LpBackend> {
    config: SolverConfig,
    problem: Option<StoichiometricProblem<B>>,
    last: Option<SolveResult>,
}

impl<B: LpBackend> FbaModel<B> {
    /// Create a model with no problem built yet.
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            problem: None,
            last: None,
        }
    }

    /// Create a model and build its problem in one step.
    pub fn from_matrix(
        matrix: &[Vec<f64>],
        options: &ProblemOptions,
        config: SolverConfig,
    ) -> Result<Self, ModelError> {
        let mut model = Self::new(config);
        model.build(matrix, options)?;
        Ok(model)
    }

    /// Build (or rebuild) the problem, discarding any previous run.
    pub fn build(
        &mut self,
        matrix: &[Vec<f64>],
        options: &ProblemOptions,
    ) -> Result<(), ModelError> {
        let problem = StoichiometricProblem::build(matrix, options, &self.config)?;
        self.problem = Some(problem);
        self.last = None;
        Ok(())
    }

    pub fn is_built(&self) -> bool {
        self.problem.is_some()
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn problem(&self) -> Result<&StoichiometricProblem<B>, ModelError> {
        self.problem.as_ref().ok_or(ModelError::ModelNotInitialized)
    }

    pub fn problem_mut(&mut self) -> Result<&mut StoichiometricProblem<B>, ModelError> {
        self.problem.as_mut().ok_or(ModelError::ModelNotInitialized)
    }

    pub fn set_bounds(&mut self, lower: &[f64], upper: &[f64]) -> Result<(), ModelError> {
        self.problem_mut()?.set_bounds(lower, upper)
    }

    pub fn set_lower_bounds(&mut self, lower: &[f64]) -> Result<(), ModelError> {
        self.problem_mut()?.set_lower_bounds(lower)
    }

    pub fn set_upper_bounds(&mut self, upper: &[f64]) -> Result<(), ModelError> {
        self.problem_mut()?.set_upper_bounds(upper)
    }

    pub fn set_exchange_lower_bounds(&mut self, lower: &[f64]) -> Result<(), ModelError> {
        self.problem_mut()?.set_exchange_lower_bounds(lower)
    }

    pub fn set_exchange_upper_bounds(&mut self, upper: &[f64]) -> Result<(), ModelError> {
        self.problem_mut()?.set_exchange_upper_bounds(upper)
    }

    pub fn set_exchange_bounds(&mut self, lower: &[f64], upper: &[f64]) -> Result<(), ModelError> {
        self.problem_mut()?.set_exchange_bounds(lower, upper)
    }

    pub fn set_reaction_bounds(
        &mut self,
        reaction: usize,
        lower: f64,
        upper: f64,
    ) -> Result<(), ModelError> {
        self.problem_mut()?.set_reaction_bounds(reaction, lower, upper)
    }

    pub fn set_objective_reaction(&mut self, reaction: usize) -> Result<(), ModelError> {
        self.problem_mut()?.set_objective_reaction(reaction)
    }

    /// Run one solve with the given style and remember its result.
    ///
    /// Non-optimal solver statuses are reported through the returned result.
    ///
    /// # Errors
    ///
    /// `ModelNotInitialized` before `build`, `SolverFault` when the backend
    /// fails. Temporary bound fixes are undone in both cases, and a failed
    /// result is recorded for the accessors.
    pub fn run(&mut self, style: ObjectiveStyle) -> Result<SolveResult, ModelError> {
        let method = self.config.method_or_default();
        let presolve = self.config.presolve_or_default();
        let Some(problem) = self.problem.as_mut() else {
            warn!(
                component = "controller",
                operation = "run",
                status = "error",
                style = style.as_str(),
                "Run requested before the model was built"
            );
            return Err(ModelError::ModelNotInitialized);
        };

        let started = Instant::now();
        let num_reactions = problem.num_reactions();
        trace!(
            component = "controller",
            operation = "run",
            status = "start",
            style = style.as_str(),
            method = method.as_str(),
            "Starting run"
        );

        problem.lp_mut(LpVariant::Standard).set_presolve(presolve);
        problem.lp_mut(LpVariant::AbsoluteValue).set_presolve(presolve);

        let outcome = match style.protocol() {
            Protocol::ObjectiveOnly(direction) => solve_objective(problem, direction, method),
            Protocol::RawTotal(direction) => solve_raw_total(problem, direction, method),
            Protocol::Absolute { objective, total } => {
                solve_absolute(problem, objective, total, method)
            }
        };

        let result = match outcome {
            Ok(capture) => capture.into_result(style),
            Err(err) => {
                warn!(
                    component = "controller",
                    operation = "run",
                    status = "error",
                    style = style.as_str(),
                    error_code = err.code(),
                    error = %err,
                    "Run failed"
                );
                let variant = if style.uses_absolute_value() {
                    LpVariant::AbsoluteValue
                } else {
                    LpVariant::Standard
                };
                self.last = Some(SolveResult::failed(
                    num_reactions,
                    style,
                    SolverStatus::Unknown,
                    variant,
                ));
                return Err(err);
            }
        };

        let run_status = if result.success { "success" } else { "failed" };
        debug!(
            component = "controller",
            operation = "run",
            status = run_status,
            style = style.as_str(),
            solver_status = %result.status,
            variant = result.variant.as_str(),
            objective_value = result.objective_value,
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Run completed"
        );
        self.last = Some(result.clone());
        Ok(result)
    }

    /// Fluxes of the latest run; empty before the first run.
    pub fn fluxes(&self) -> &[f64] {
        match &self.last {
            Some(result) => &result.fluxes,
            None => &[],
        }
    }

    /// Fluxes of the exchange reactions in exchange-list order.
    pub fn exchange_fluxes(&self) -> Vec<f64> {
        let (Some(problem), Some(result)) = (&self.problem, &self.last) else {
            return Vec::new();
        };
        problem
            .exchange_indices()
            .iter()
            .map(|&index| result.fluxes.get(index).copied().unwrap_or(0.0))
            .collect()
    }

    /// Objective value of the latest run, `f64::MIN` when it failed or never ran.
    pub fn objective_value(&self) -> f64 {
        self.last
            .as_ref()
            .map_or(FAILED_OBJECTIVE, |result| result.objective_value)
    }

    pub fn run_succeeded(&self) -> bool {
        self.last.as_ref().is_some_and(|result| result.success)
    }

    pub fn last_result(&self) -> Option<&SolveResult> {
        self.last.as_ref()
    }

    /// LP instance the latest result was read from.
    pub fn authoritative_variant(&self) -> Option<LpVariant> {
        self.last.as_ref().map(|result| result.variant)
    }
}

/// Solution read out of one LP immediately after its solve.
struct Capture {
    status: SolverStatus,
    variant: LpVariant,
    num_reactions: usize,
    objective_index: usize,
    solution: Option<(Vec<f64>, f64)>,
}

impl Capture {
    fn read<B: LpBackend>(
        problem: &StoichiometricProblem<B>,
        variant: LpVariant,
        status: SolverStatus,
    ) -> Self {
        let num_reactions = problem.num_reactions();
        let lp = problem.lp(variant);
        let solution = if status.is_optimal() {
            let fluxes = (0..num_reactions)
                .map(|index| lp.variable_primal(index).unwrap_or(0.0))
                .collect();
            let lp_objective = lp.objective_value().unwrap_or(FAILED_OBJECTIVE);
            Some((fluxes, lp_objective))
        } else {
            None
        };
        Self {
            status,
            variant,
            num_reactions,
            objective_index: problem.objective_index(),
            solution,
        }
    }

    /// Objective reaction flux when the solve was optimal.
    fn objective_value(&self) -> Option<f64> {
        self.solution
            .as_ref()
            .map(|(fluxes, _)| fluxes[self.objective_index])
    }

    fn into_result(self, style: ObjectiveStyle) -> SolveResult {
        match self.solution {
            Some((fluxes, lp_objective_value)) => SolveResult {
                objective_value: fluxes[self.objective_index],
                fluxes,
                lp_objective_value,
                success: true,
                status: self.status,
                style,
                variant: self.variant,
            },
            None => SolveResult::failed(self.num_reactions, style, self.status, self.variant),
        }
    }
}

fn solve_objective<B: LpBackend>(
    problem: &mut StoichiometricProblem<B>,
    direction: ObjectiveDirection,
    method: SolveMethod,
) -> Result<Capture, ModelError> {
    problem.assert_single_objective()?;
    problem.set_standard_objective_direction(direction);
    let status = problem.lp_mut(LpVariant::Standard).solve(method)?;
    Ok(Capture::read(problem, LpVariant::Standard, status))
}

fn solve_raw_total<B: LpBackend>(
    problem: &mut StoichiometricProblem<B>,
    direction: ObjectiveDirection,
    method: SolveMethod,
) -> Result<Capture, ModelError> {
    let first = solve_objective(problem, ObjectiveDirection::Maximize, method)?;
    let Some(sol) = first.objective_value() else {
        return Ok(first);
    };

    problem.pin_objective(LpVariant::Standard, sol)?;
    let second = solve_total_phase(problem, direction, method);
    let restored = problem
        .restore_objective_bounds(LpVariant::Standard)
        .and_then(|()| problem.assert_single_objective());
    let capture = second?;
    restored?;
    Ok(capture)
}

fn solve_total_phase<B: LpBackend>(
    problem: &mut StoichiometricProblem<B>,
    direction: ObjectiveDirection,
    method: SolveMethod,
) -> Result<Capture, ModelError> {
    problem.set_uniform_objective(1.0)?;
    problem.set_standard_objective_direction(direction);
    let status = problem.lp_mut(LpVariant::Standard).solve(method)?;
    Ok(Capture::read(problem, LpVariant::Standard, status))
}

fn solve_absolute<B: LpBackend>(
    problem: &mut StoichiometricProblem<B>,
    objective: ObjectiveDirection,
    total: ObjectiveDirection,
    method: SolveMethod,
) -> Result<Capture, ModelError> {
    problem.set_absolute_value_objective_direction(total);
    problem.lp_mut(LpVariant::Standard).set_presolve(false);
    problem.lp_mut(LpVariant::AbsoluteValue).set_presolve(false);

    let first = solve_objective(problem, objective, method)?;
    let Some(sol) = first.objective_value() else {
        return Ok(first);
    };

    problem.pin_objective(LpVariant::AbsoluteValue, sol)?;
    let solved = problem.lp_mut(LpVariant::AbsoluteValue).solve(method);
    let second = solved.map(|status| Capture::read(problem, LpVariant::AbsoluteValue, status));
    let restored = problem.restore_objective_bounds(LpVariant::AbsoluteValue);
    let capture = second?;
    restored?;
    Ok(capture)
}
