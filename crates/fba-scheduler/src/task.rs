//! Units of work and their results.

use fba_core::{ModelError, SolveResult};
use serde::{Deserialize, Serialize};

/// One spatial cell to solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellTask {
    /// Cell identifier, echoed in the report.
    pub cell: usize,
    /// Local media concentrations handed to the bound source.
    pub concentrations: Vec<f64>,
    /// Indices of the models living in this cell.
    pub residents: Vec<usize>,
    /// Simulation time handed to the bound source.
    #[serde(default)]
    pub time: f64,
}

impl CellTask {
    /// A cell at time zero.
    pub fn new(cell: usize, concentrations: Vec<f64>, residents: Vec<usize>) -> Self {
        Self {
            cell,
            concentrations,
            residents,
            time: 0.0,
        }
    }

    pub fn with_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }
}

/// Result of solving one resident model in one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellOutcome {
    pub cell: usize,
    pub model: usize,
    pub result: SolveResult,
    /// Set when the solve failed with an error rather than a solver status.
    pub error: Option<ModelError>,
}

/// Everything one worker produced for one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellReport {
    pub cell: usize,
    pub worker: usize,
    pub outcomes: Vec<CellOutcome>,
    pub duration_ms: f64,
}

/// Per-worker totals returned when the pool stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkerReport {
    pub worker: usize,
    pub cells: usize,
    pub solves: usize,
    pub faults: usize,
}
