//! Scheduler error types.

/// Errors raised by the worker pool itself. Per-cell solve failures are
/// reported through [`crate::CellOutcome`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// A model handed to the pool has no problem built.
    UnbuiltModel { model: usize },
    /// A task names a model index the pool does not know.
    UnknownResident { cell: usize, model: usize },
    /// The queue no longer accepts work.
    QueueClosed,
    /// The OS refused to start a worker thread.
    SpawnFailed { worker: usize, reason: String },
    /// A worker thread panicked.
    WorkerPanicked { worker: usize },
    /// Every worker exited before the step finished.
    WorkersDisconnected { pending: usize },
}

impl SchedulerError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            SchedulerError::UnbuiltModel { .. } => "SCHEDULER_UNBUILT_MODEL",
            SchedulerError::UnknownResident { .. } => "SCHEDULER_UNKNOWN_RESIDENT",
            SchedulerError::QueueClosed => "SCHEDULER_QUEUE_CLOSED",
            SchedulerError::SpawnFailed { .. } => "SCHEDULER_SPAWN_FAILED",
            SchedulerError::WorkerPanicked { .. } => "SCHEDULER_WORKER_PANICKED",
            SchedulerError::WorkersDisconnected { .. } => "SCHEDULER_WORKERS_DISCONNECTED",
        }
    }
}

impl std::fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerError::UnbuiltModel { model } => {
                write!(f, "[{}] Model {} has not been built", self.code(), model)
            }
            SchedulerError::UnknownResident { cell, model } => write!(
                f,
                "[{}] Cell {} references unknown model {}",
                self.code(),
                cell,
                model
            ),
            SchedulerError::QueueClosed => write!(f, "[{}] Work queue is closed", self.code()),
            SchedulerError::SpawnFailed { worker, reason } => write!(
                f,
                "[{}] Failed to start worker {}: {}",
                self.code(),
                worker,
                reason
            ),
            SchedulerError::WorkerPanicked { worker } => {
                write!(f, "[{}] Worker {} panicked", self.code(), worker)
            }
            SchedulerError::WorkersDisconnected { pending } => write!(
                f,
                "[{}] Workers exited with {} cells outstanding",
                self.code(),
                pending
            ),
        }
    }
}

impl std::error::Error for SchedulerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchedulerError::UnknownResident { cell: 4, model: 9 };
        assert_eq!(
            err.to_string(),
            "[SCHEDULER_UNKNOWN_RESIDENT] Cell 4 references unknown model 9"
        );
    }
}
