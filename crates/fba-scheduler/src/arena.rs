//! Private per-worker copies of every model.

use crate::error::SchedulerError;
use crate::task::{CellOutcome, CellTask};
use fba_core::{
    adjusted_bounds, BoundSource, FbaModel, LpVariant, ModelError, ObjectiveStyle, SolveResult,
};
use fba_solver::{LpBackend, SolverStatus};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{trace, warn};

/// Exchange reactions and their base bounds, captured when the arena is built.
#[derive(Debug, Clone)]
struct ExchangeBase {
    reactions: Vec<usize>,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

/// Deep copies of all models owned by a single worker.
///
/// Base exchange bounds are read once at construction; every cell starts
/// from them, so adjustments never accumulate across cells. Clones share one
/// untouched copy of the models, used to reload a resident whose solve
/// panicked.
#[derive(Debug, Clone)]
pub struct WorkerArena<B: LpBackend> {
    models: Vec<FbaModel<B>>,
    bases: Vec<ExchangeBase>,
    pristine: Arc<Mutex<Vec<FbaModel<B>>>>,
}

impl<B: LpBackend> WorkerArena<B> {
    /// Clone `models` into a new arena.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::UnbuiltModel`] if any model has no problem.
    pub fn new(models: &[FbaModel<B>]) -> Result<Self, SchedulerError> {
        let mut bases = Vec::with_capacity(models.len());
        for (index, model) in models.iter().enumerate() {
            let problem = model
                .problem()
                .map_err(|_| SchedulerError::UnbuiltModel { model: index })?;
            bases.push(ExchangeBase {
                reactions: problem.exchange_reactions(),
                lower: problem.exchange_lower_bounds(),
                upper: problem.exchange_upper_bounds(),
            });
        }
        Ok(Self {
            models: models.to_vec(),
            bases,
            pristine: Arc::new(Mutex::new(models.to_vec())),
        })
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn model(&self, index: usize) -> Option<&FbaModel<B>> {
        self.models.get(index)
    }

    /// Apply the cell's bounds to every resident model and solve it.
    ///
    /// Failures, panics included, are reported per resident; the remaining
    /// residents still run.
    pub fn solve_cell(
        &mut self,
        task: &CellTask,
        source: &dyn BoundSource,
        style: ObjectiveStyle,
    ) -> Vec<CellOutcome> {
        let mut outcomes = Vec::with_capacity(task.residents.len());
        for &resident in &task.residents {
            let solved = panic::catch_unwind(AssertUnwindSafe(|| {
                self.solve_resident(task, resident, source, style)
            }));
            outcomes.push(match solved {
                Ok(outcome) => outcome,
                Err(payload) => self.recover(task, resident, style, payload.as_ref()),
            });
        }
        outcomes
    }

    /// Reload a resident after a panicked solve and report it as failed.
    fn recover(
        &mut self,
        task: &CellTask,
        resident: usize,
        style: ObjectiveStyle,
        payload: &(dyn Any + Send),
    ) -> CellOutcome {
        let message = payload
            .downcast_ref::<&str>()
            .map(|text| text.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        warn!(
            component = "scheduler",
            operation = "solve_cell",
            status = "error",
            cell = task.cell,
            model = resident,
            error_code = "SOLVE_PANICKED",
            panic = message.as_str(),
            "Resident panicked; reloading model"
        );

        let pristine = self
            .pristine
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(resident)
            .cloned();
        if let (Some(fresh), Some(slot)) = (pristine, self.models.get_mut(resident)) {
            *slot = fresh;
        }
        let num_reactions = self
            .models
            .get(resident)
            .and_then(|model| model.problem().ok())
            .map_or(0, |problem| problem.num_reactions());
        CellOutcome {
            cell: task.cell,
            model: resident,
            result: SolveResult::failed(
                num_reactions,
                style,
                SolverStatus::Unknown,
                failed_variant(style),
            ),
            error: Some(ModelError::SolvePanicked(message)),
        }
    }

    fn solve_resident(
        &mut self,
        task: &CellTask,
        resident: usize,
        source: &dyn BoundSource,
        style: ObjectiveStyle,
    ) -> CellOutcome {
        let (Some(model), Some(base)) = (self.models.get_mut(resident), self.bases.get(resident))
        else {
            warn!(
                component = "scheduler",
                operation = "solve_cell",
                status = "error",
                cell = task.cell,
                model = resident,
                "Cell references a model outside the arena"
            );
            return CellOutcome {
                cell: task.cell,
                model: resident,
                result: SolveResult::failed(
                    0,
                    style,
                    SolverStatus::NotSolved,
                    failed_variant(style),
                ),
                error: None,
            };
        };

        let (lower, upper) = adjusted_bounds(
            source,
            &base.reactions,
            &base.lower,
            &base.upper,
            &task.concentrations,
            task.time,
        );
        let solved = model
            .set_exchange_bounds(&lower, &upper)
            .and_then(|()| model.run(style));

        match solved {
            Ok(result) => {
                trace!(
                    component = "scheduler",
                    operation = "solve_cell",
                    status = "success",
                    cell = task.cell,
                    model = resident,
                    solver_status = %result.status,
                    objective_value = result.objective_value,
                    "Resident solved"
                );
                CellOutcome {
                    cell: task.cell,
                    model: resident,
                    result,
                    error: None,
                }
            }
            Err(err) => {
                warn!(
                    component = "scheduler",
                    operation = "solve_cell",
                    status = "error",
                    cell = task.cell,
                    model = resident,
                    error_code = err.code(),
                    error = %err,
                    "Resident failed; reporting zero flux"
                );
                let num_reactions = model
                    .problem()
                    .map(|problem| problem.num_reactions())
                    .unwrap_or(0);
                CellOutcome {
                    cell: task.cell,
                    model: resident,
                    result: SolveResult::failed(
                        num_reactions,
                        style,
                        SolverStatus::Unknown,
                        failed_variant(style),
                    ),
                    error: Some(err),
                }
            }
        }
    }
}

fn failed_variant(style: ObjectiveStyle) -> LpVariant {
    if style.uses_absolute_value() {
        LpVariant::AbsoluteValue
    } else {
        LpVariant::Standard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fba_core::{MichaelisMentenUptake, NoAdjustment, ProblemOptions, UptakeKinetics};
    use fba_microlp::MicrolpBackend;
    use fba_solver::SolverConfig;

    fn chain_model() -> FbaModel<MicrolpBackend> {
        let matrix = vec![vec![1.0, -1.0, 0.0], vec![0.0, 1.0, -1.0]];
        let mut model =
            FbaModel::from_matrix(&matrix, &ProblemOptions::default(), SolverConfig::new())
                .unwrap();
        model.set_bounds(&[0.0; 3], &[10.0; 3]).unwrap();
        model
    }

    #[test]
    fn test_arena_rejects_unbuilt_models() {
        let models = vec![chain_model(), FbaModel::new(SolverConfig::new())];
        let err = WorkerArena::new(&models).unwrap_err();
        assert_eq!(err, SchedulerError::UnbuiltModel { model: 1 });
    }

    #[test]
    fn test_arena_is_independent_of_source_models() {
        let mut models = vec![chain_model()];
        let mut arena = WorkerArena::new(&models).unwrap();
        models[0].set_upper_bounds(&[1.0; 3]).unwrap();

        let task = CellTask::new(0, vec![], vec![0]);
        let outcomes = arena.solve_cell(&task, &NoAdjustment, ObjectiveStyle::default());
        assert_eq!(outcomes.len(), 1);
        assert!((outcomes[0].result.objective_value - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_adjustments_start_from_base_every_cell() {
        let models = vec![chain_model()];
        let mut arena = WorkerArena::new(&models).unwrap();
        // Uptake on reaction 1 limited by the cap in the upper direction.
        struct CapUptake;
        impl BoundSource for CapUptake {
            fn bound_adjustment(&self, reaction: usize, c: &[f64], _: f64) -> (f64, f64) {
                if reaction == 1 {
                    (0.0, -c[0])
                } else {
                    (0.0, 0.0)
                }
            }
        }

        for _ in 0..3 {
            let task = CellTask::new(1, vec![4.0], vec![0]);
            let outcomes = arena.solve_cell(&task, &CapUptake, ObjectiveStyle::default());
            assert!((outcomes[0].result.objective_value - 6.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_michaelis_menten_source_applies_to_exchange_lower_bound() {
        let models = vec![chain_model()];
        let mut arena = WorkerArena::new(&models).unwrap();
        let source = MichaelisMentenUptake::new().with_reaction(
            1,
            UptakeKinetics {
                metabolite: 0,
                km: 1.0,
                vmax: 2.0,
            },
        );
        let task = CellTask::new(2, vec![1.0], vec![0]);
        let outcomes = arena.solve_cell(&task, &source, ObjectiveStyle::MinimizeObjectiveFlux);
        assert!(outcomes[0].result.success);
        // Reaction 1 lower bound is now -1, but the chain needs v1 = v3 >= 0.
        assert!(outcomes[0].result.objective_value.abs() < 1e-6);
        let problem = arena.model(0).unwrap().problem().unwrap();
        assert_eq!(problem.reaction_bounds(1).unwrap(), (-1.0, 10.0));
    }

    #[test]
    fn test_invalid_adjustment_reports_failure_and_continues() {
        struct Broken;
        impl BoundSource for Broken {
            fn bound_adjustment(&self, _: usize, _: &[f64], _: f64) -> (f64, f64) {
                (0.0, f64::NAN)
            }
        }

        let models = vec![chain_model(), chain_model()];
        let mut arena = WorkerArena::new(&models).unwrap();
        let task = CellTask::new(3, vec![], vec![0, 1, 7]);
        let outcomes = arena.solve_cell(&task, &Broken, ObjectiveStyle::default());
        assert_eq!(outcomes.len(), 3);
        for outcome in &outcomes[..2] {
            assert!(!outcome.result.success);
            assert_eq!(outcome.result.fluxes, vec![0.0; 3]);
            assert!(outcome.error.as_ref().unwrap().is_params_error());
        }
        assert_eq!(outcomes[2].result.status, SolverStatus::NotSolved);

        let outcomes = arena.solve_cell(&task, &NoAdjustment, ObjectiveStyle::default());
        assert!(outcomes[0].result.success);
    }

    #[test]
    fn test_task_time_reaches_source() {
        // Uptake cap on reaction 1 shrinks as time advances.
        struct Decay;
        impl BoundSource for Decay {
            fn bound_adjustment(&self, reaction: usize, _: &[f64], time: f64) -> (f64, f64) {
                if reaction == 1 {
                    (0.0, -time)
                } else {
                    (0.0, 0.0)
                }
            }
        }

        let mut arena = WorkerArena::new(&[chain_model()]).unwrap();
        let early = CellTask::new(0, vec![], vec![0]).with_time(1.0);
        let late = CellTask::new(0, vec![], vec![0]).with_time(7.5);
        let early = arena.solve_cell(&early, &Decay, ObjectiveStyle::default());
        let late = arena.solve_cell(&late, &Decay, ObjectiveStyle::default());
        assert!((early[0].result.objective_value - 9.0).abs() < 1e-6);
        assert!((late[0].result.objective_value - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_panicking_source_fails_only_that_resident() {
        struct Fragile;
        impl BoundSource for Fragile {
            fn bound_adjustment(&self, _: usize, c: &[f64], _: f64) -> (f64, f64) {
                if c.first().is_some_and(|&value| value > 10.0) {
                    panic!("concentration out of table");
                }
                (0.0, 0.0)
            }
        }

        let mut arena = WorkerArena::new(&[chain_model(), chain_model()]).unwrap();
        let task = CellTask::new(5, vec![13.0], vec![0, 1]);
        let outcomes = arena.solve_cell(&task, &Fragile, ObjectiveStyle::default());
        assert_eq!(outcomes.len(), 2);
        for outcome in &outcomes {
            assert!(!outcome.result.success);
            assert_eq!(outcome.result.fluxes, vec![0.0; 3]);
            assert_eq!(
                outcome.error,
                Some(ModelError::SolvePanicked("concentration out of table".to_string()))
            );
        }

        let task = CellTask::new(6, vec![1.0], vec![0, 1]);
        let outcomes = arena.solve_cell(&task, &Fragile, ObjectiveStyle::default());
        assert!(outcomes.iter().all(|outcome| outcome.result.success));
        assert!((outcomes[1].result.objective_value - 10.0).abs() < 1e-6);
    }
}
