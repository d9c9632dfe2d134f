//! Scheduler configuration.

use fba_core::ObjectiveStyle;
use serde::{Deserialize, Serialize};

/// Worker pool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Objective style every cell is solved with.
    pub style: ObjectiveStyle,
    /// Shuffle submitted cells with this seed; `None` keeps submission order.
    pub seed: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            style: ObjectiveStyle::default(),
            seed: None,
        }
    }
}

impl SchedulerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker count; zero falls back to the available CPUs.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = if workers == 0 {
            default_workers()
        } else {
            workers
        };
        self
    }

    pub fn with_style(mut self, style: ObjectiveStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

fn default_workers() -> usize {
    num_cpus::get().max(1)
}
