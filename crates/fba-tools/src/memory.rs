//! Resident memory snapshots per benchmark stage.

use std::time::Instant;
use sysinfo::System;
use tracing::debug;

/// Memory state of the current process at one point in time.
#[derive(Debug, Clone)]
pub struct MemorySnapshot {
    /// Resident set size in bytes
    pub rss_bytes: u64,
    pub timestamp: Instant,
    /// Stage label, e.g. "build" or "step-3"
    pub stage: String,
}

/// Errors produced by memory instrumentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    ProcessNotFound { pid: u32 },
}

impl MemoryError {
    pub fn code(&self) -> &'static str {
        match self {
            MemoryError::ProcessNotFound { .. } => "TOOLS_PROCESS_NOT_FOUND",
        }
    }
}

impl std::fmt::Display for MemoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryError::ProcessNotFound { pid } => {
                write!(f, "[{}] Failed to locate process {}", self.code(), pid)
            }
        }
    }
}

impl std::error::Error for MemoryError {}

impl MemorySnapshot {
    /// Capture the current process RSS for a stage.
    ///
    /// # Errors
    ///
    /// Returns an error if the current process cannot be located.
    pub fn capture(stage: &str) -> Result<Self, MemoryError> {
        let pid = sysinfo::Pid::from(std::process::id() as usize);

        let mut sys = System::new();
        sys.refresh_processes_specifics(
            sysinfo::ProcessesToUpdate::Some(&[pid]),
            true,
            sysinfo::ProcessRefreshKind::nothing().with_memory(),
        );

        let process = sys.process(pid).ok_or(MemoryError::ProcessNotFound {
            pid: std::process::id(),
        })?;

        Ok(MemorySnapshot {
            rss_bytes: process.memory(),
            timestamp: Instant::now(),
            stage: stage.to_string(),
        })
    }

    /// RSS growth from `other` to `self` in bytes (negative when memory shrank).
    pub fn diff(&self, other: &Self) -> i64 {
        self.rss_bytes as i64 - other.rss_bytes as i64
    }
}

/// Ordered memory snapshots across the stages of one run.
#[derive(Debug)]
pub struct MemoryProbe {
    snapshots: Vec<MemorySnapshot>,
}

impl MemoryProbe {
    pub fn new() -> Self {
        MemoryProbe {
            snapshots: Vec::new(),
        }
    }

    /// Record a snapshot for a stage.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot could not be captured.
    pub fn record(&mut self, stage: &str) -> Result<(), MemoryError> {
        let snapshot = MemorySnapshot::capture(stage)?;
        debug!(
            component = "tools",
            operation = "memory_snapshot",
            status = "success",
            stage,
            rss_bytes = snapshot.rss_bytes,
            "Recorded memory snapshot"
        );
        self.snapshots.push(snapshot);
        Ok(())
    }

    pub fn snapshots(&self) -> &[MemorySnapshot] {
        &self.snapshots
    }

    /// Difference between the last two snapshots.
    pub fn last_diff(&self) -> Option<i64> {
        match self.snapshots.as_slice() {
            [.., prev, last] => Some(last.diff(prev)),
            _ => None,
        }
    }

    /// Highest RSS seen so far.
    pub fn peak_rss(&self) -> Option<u64> {
        self.snapshots.iter().map(|s| s.rss_bytes).max()
    }
}

impl Default for MemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}
