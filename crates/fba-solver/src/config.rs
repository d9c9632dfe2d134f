//! Options shared by every LP instance of a model.

use serde::{Deserialize, Serialize};

/// Numerical method requested from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveMethod {
    #[default]
    Simplex,
    /// Interior point (HiGHS IPM). Backends without one fall back to simplex.
    Interior,
}

impl SolveMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            SolveMethod::Simplex => "simplex",
            SolveMethod::Interior => "interior",
        }
    }
}

/// Backend options for the Standard and Absolute-Value LPs of a model.
///
/// Unset fields leave the backend default in place, except `presolve`,
/// which the controller treats as on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    pub method: Option<SolveMethod>,
    /// Presolve at the start of every run; combined styles switch it off.
    pub presolve: Option<bool>,
    /// Seconds per solve.
    pub time_limit: Option<f64>,
    /// Threads one solve may use. Pools usually keep this at 1.
    pub threads: Option<u32>,
    /// Primal and dual feasibility tolerance.
    pub tolerance: Option<f64>,
    pub verbosity: Option<u32>,
    pub log_to_console: Option<bool>,
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: SolveMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_presolve(mut self, enabled: bool) -> Self {
        self.presolve = Some(enabled);
        self
    }

    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    pub fn with_threads(mut self, count: u32) -> Self {
        self.threads = Some(count);
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = Some(tol);
        self
    }

    pub fn with_verbosity(mut self, level: u32) -> Self {
        self.verbosity = Some(level);
        self
    }

    pub fn with_log_to_console(mut self, enabled: bool) -> Self {
        self.log_to_console = Some(enabled);
        self
    }

    pub fn method_or_default(&self) -> SolveMethod {
        self.method.unwrap_or_default()
    }

    /// Presolve setting applied at the start of each run.
    pub fn presolve_or_default(&self) -> bool {
        self.presolve.unwrap_or(true)
    }
}
