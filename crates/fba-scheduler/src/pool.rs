//! Fixed-size worker pool that solves cells in parallel.

use crate::arena::WorkerArena;
use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::queue::WorkQueue;
use crate::task::{CellReport, CellTask, WorkerReport};
use fba_core::{BoundSource, FbaModel, ObjectiveStyle};
use fba_solver::{LpBackend, SolverRuntime};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, trace, warn};

/// What a pool handed back when it stopped.
#[derive(Debug, Clone, Default)]
pub struct PoolSummary {
    pub workers: Vec<WorkerReport>,
    /// Cell reports that had not been collected yet.
    pub reports: Vec<CellReport>,
    /// Cells still queued when the pool stopped.
    pub undispatched: Vec<CellTask>,
}

/// Worker pool over private model arenas.
///
/// The pool borrows the backend runtime, so the runtime cannot be torn down
/// while workers are alive. Each worker owns a deep copy of every model made
/// at start, pulls cells from a shared queue and sends one [`CellReport`]
/// per cell back to the pool.
pub struct CellPool<'rt, B: LpBackend + 'static> {
    config: SchedulerConfig,
    queue: Arc<WorkQueue<CellTask>>,
    shutdown: Arc<AtomicBool>,
    reports: Receiver<CellReport>,
    workers: Vec<(usize, JoinHandle<WorkerReport>)>,
    num_models: usize,
    rng: Option<ChaCha12Rng>,
    outstanding: usize,
    _runtime: PhantomData<&'rt SolverRuntime<B>>,
}

impl<'rt, B: LpBackend + 'static> CellPool<'rt, B> {
    /// Clone `models` into one arena per worker and start the workers.
    ///
    /// A panic while solving a resident fails that resident only; the worker
    /// reloads the model from the pool's pristine copy and keeps going.
    ///
    /// # Errors
    ///
    /// Fails when a model is unbuilt or a worker thread cannot be spawned;
    /// workers already started are stopped first.
    pub fn start(
        runtime: &'rt SolverRuntime<B>,
        models: &[FbaModel<B>],
        source: Arc<dyn BoundSource>,
        config: SchedulerConfig,
    ) -> Result<Self, SchedulerError> {
        let started = Instant::now();
        let template = WorkerArena::new(models)?;
        let queue = Arc::new(WorkQueue::new());
        let shutdown = Arc::new(AtomicBool::new(false));
        let (sender, reports) = mpsc::channel();
        let worker_count = config.workers.max(1);

        let mut workers = Vec::with_capacity(worker_count);
        for worker in 0..worker_count {
            let context = Worker {
                id: worker,
                arena: template.clone(),
                queue: Arc::clone(&queue),
                shutdown: Arc::clone(&shutdown),
                sender: sender.clone(),
                source: Arc::clone(&source),
                style: config.style,
            };
            let spawned = thread::Builder::new()
                .name(format!("fba-worker-{worker}"))
                .spawn(move || context.run());
            match spawned {
                Ok(handle) => workers.push((worker, handle)),
                Err(err) => {
                    warn!(
                        component = "scheduler",
                        operation = "start",
                        status = "error",
                        worker,
                        error = %err,
                        "Failed to spawn worker"
                    );
                    shutdown.store(true, Ordering::Release);
                    queue.close();
                    for (_, handle) in workers {
                        let _ = handle.join();
                    }
                    return Err(SchedulerError::SpawnFailed {
                        worker,
                        reason: err.to_string(),
                    });
                }
            }
        }
        drop(sender);

        debug!(
            component = "scheduler",
            operation = "start",
            status = "success",
            backend = runtime.backend_name(),
            workers = worker_count,
            models = models.len(),
            style = config.style.as_str(),
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Cell pool started"
        );

        let rng = config.seed.map(ChaCha12Rng::seed_from_u64);
        Ok(Self {
            config,
            queue,
            shutdown,
            reports,
            workers,
            num_models: models.len(),
            rng,
            outstanding: 0,
            _runtime: PhantomData,
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Cells submitted whose reports have not been collected.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Queue one cell.
    pub fn submit(&mut self, task: CellTask) -> Result<(), SchedulerError> {
        self.validate(&task)?;
        self.enqueue(task)
    }

    /// Queue a batch of cells, shuffled when the config carries a seed.
    ///
    /// The whole batch is validated before anything is queued.
    pub fn submit_all(&mut self, mut tasks: Vec<CellTask>) -> Result<usize, SchedulerError> {
        for task in &tasks {
            self.validate(task)?;
        }
        if let Some(rng) = self.rng.as_mut() {
            tasks.shuffle(rng);
        }
        let count = tasks.len();
        for task in tasks {
            self.enqueue(task)?;
        }
        Ok(count)
    }

    /// Block until the next cell report arrives.
    pub fn recv(&mut self) -> Result<CellReport, SchedulerError> {
        match self.reports.recv() {
            Ok(report) => {
                self.outstanding = self.outstanding.saturating_sub(1);
                Ok(report)
            }
            Err(_) => Err(SchedulerError::WorkersDisconnected {
                pending: self.outstanding,
            }),
        }
    }

    /// Submit `tasks` and wait for every outstanding cell to be reported.
    ///
    /// The pool stays running, so steps can be repeated. Each task carries
    /// its own simulation time.
    pub fn run_step(&mut self, tasks: Vec<CellTask>) -> Result<Vec<CellReport>, SchedulerError> {
        let started = Instant::now();
        let submitted = self.submit_all(tasks)?;
        let mut reports = Vec::with_capacity(self.outstanding);
        while self.outstanding > 0 {
            reports.push(self.recv()?);
        }
        debug!(
            component = "scheduler",
            operation = "run_step",
            status = "success",
            cells = submitted,
            reports = reports.len(),
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Step completed"
        );
        Ok(reports)
    }

    /// Close the queue, let workers drain it, then join them.
    pub fn finish(mut self) -> Result<PoolSummary, SchedulerError> {
        self.queue.close();
        let mut reports = Vec::with_capacity(self.outstanding);
        while self.outstanding > 0 {
            match self.recv() {
                Ok(report) => reports.push(report),
                Err(_) => break,
            }
        }
        let workers = self.join_workers()?;
        Ok(PoolSummary {
            workers,
            reports,
            undispatched: self.queue.drain(),
        })
    }

    /// Stop workers after their current cell and join them.
    ///
    /// Cells not yet picked up are returned in `undispatched`.
    pub fn shutdown(mut self) -> Result<PoolSummary, SchedulerError> {
        self.shutdown.store(true, Ordering::Release);
        self.queue.close();
        let workers = self.join_workers()?;
        let reports: Vec<CellReport> = self.reports.try_iter().collect();
        let undispatched = self.queue.drain();
        debug!(
            component = "scheduler",
            operation = "shutdown",
            status = "success",
            collected = reports.len(),
            undispatched = undispatched.len(),
            "Cell pool shut down"
        );
        self.outstanding = 0;
        Ok(PoolSummary {
            workers,
            reports,
            undispatched,
        })
    }

    fn validate(&self, task: &CellTask) -> Result<(), SchedulerError> {
        match task.residents.iter().find(|&&model| model >= self.num_models) {
            Some(&model) => Err(SchedulerError::UnknownResident {
                cell: task.cell,
                model,
            }),
            None => Ok(()),
        }
    }

    fn enqueue(&mut self, task: CellTask) -> Result<(), SchedulerError> {
        self.queue
            .push(task)
            .map_err(|_| SchedulerError::QueueClosed)?;
        self.outstanding += 1;
        Ok(())
    }

    fn join_workers(&mut self) -> Result<Vec<WorkerReport>, SchedulerError> {
        let mut reports = Vec::with_capacity(self.workers.len());
        let mut first_panic = None;
        for (worker, handle) in self.workers.drain(..) {
            match handle.join() {
                Ok(report) => reports.push(report),
                Err(_) => {
                    warn!(
                        component = "scheduler",
                        operation = "join",
                        status = "error",
                        worker,
                        "Worker panicked"
                    );
                    if first_panic.is_none() {
                        first_panic = Some(SchedulerError::WorkerPanicked { worker });
                    }
                }
            }
        }
        match first_panic {
            Some(err) => Err(err),
            None => Ok(reports),
        }
    }
}

impl<B: LpBackend + 'static> Drop for CellPool<'_, B> {
    fn drop(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        self.shutdown.store(true, Ordering::Release);
        self.queue.close();
        let _ = self.join_workers();
    }
}

struct Worker<B: LpBackend> {
    id: usize,
    arena: WorkerArena<B>,
    queue: Arc<WorkQueue<CellTask>>,
    shutdown: Arc<AtomicBool>,
    sender: Sender<CellReport>,
    source: Arc<dyn BoundSource>,
    style: ObjectiveStyle,
}

impl<B: LpBackend> Worker<B> {
    fn run(mut self) -> WorkerReport {
        let mut report = WorkerReport {
            worker: self.id,
            ..WorkerReport::default()
        };
        debug!(
            component = "scheduler",
            operation = "worker",
            status = "start",
            worker = self.id,
            models = self.arena.len(),
            "Worker started"
        );

        loop {
            if self.shutdown.load(Ordering::Acquire) {
                break;
            }
            let Some(task) = self.queue.pop() else {
                break;
            };
            if self.shutdown.load(Ordering::Acquire) {
                self.queue.requeue(task);
                break;
            }

            let started = Instant::now();
            let outcomes = self
                .arena
                .solve_cell(&task, self.source.as_ref(), self.style);
            report.cells += 1;
            report.solves += outcomes.len();
            report.faults += outcomes.iter().filter(|o| o.error.is_some()).count();
            let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
            trace!(
                component = "scheduler",
                operation = "cell",
                status = "success",
                worker = self.id,
                cell = task.cell,
                residents = outcomes.len(),
                duration_ms,
                "Cell solved"
            );

            let cell_report = CellReport {
                cell: task.cell,
                worker: self.id,
                outcomes,
                duration_ms,
            };
            if self.sender.send(cell_report).is_err() {
                warn!(
                    component = "scheduler",
                    operation = "worker",
                    status = "warn",
                    worker = self.id,
                    "Result receiver dropped; stopping"
                );
                break;
            }
        }

        debug!(
            component = "scheduler",
            operation = "worker",
            status = "stop",
            worker = self.id,
            cells = report.cells,
            faults = report.faults,
            "Worker stopped"
        );
        report
    }
}
