//! Parallel per-cell FBA scheduling.
//!
//! A [`CellPool`] owns a fixed set of worker threads. Each worker holds a
//! [`WorkerArena`] with private clones of every model, pulls [`CellTask`]s from
//! a shared [`WorkQueue`], applies the cell's exchange bounds through a
//! [`fba_core::BoundSource`], runs the configured objective style and sends a
//! [`CellReport`] back.

mod arena;
mod config;
mod error;
mod pool;
mod queue;
mod task;

pub use arena::WorkerArena;
pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use pool::{CellPool, PoolSummary};
pub use queue::WorkQueue;
pub use task::{CellOutcome, CellReport, CellTask, WorkerReport};
