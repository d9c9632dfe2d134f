//! Objective styles selectable per run.

use fba_solver::ObjectiveDirection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Optimization goal combination used for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectiveStyle {
    #[default]
    MaximizeObjectiveFlux,
    MinimizeObjectiveFlux,
    MaximizeTotalFlux,
    MinimizeTotalFlux,
    MaxObjectiveMinTotal,
    MaxObjectiveMaxTotal,
    MinObjectiveMinTotal,
    MinObjectiveMaxTotal,
}

/// Which solve protocol a style dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Protocol {
    /// Single Standard LP solve.
    ObjectiveOnly(ObjectiveDirection),
    /// Maximize the objective, pin it, then optimize the raw flux sum.
    RawTotal(ObjectiveDirection),
    /// Optimize the objective on the Standard LP, then the absolute flux sum.
    Absolute {
        objective: ObjectiveDirection,
        total: ObjectiveDirection,
    },
}

impl ObjectiveStyle {
    pub const ALL: [ObjectiveStyle; 8] = [
        ObjectiveStyle::MaximizeObjectiveFlux,
        ObjectiveStyle::MinimizeObjectiveFlux,
        ObjectiveStyle::MaximizeTotalFlux,
        ObjectiveStyle::MinimizeTotalFlux,
        ObjectiveStyle::MaxObjectiveMinTotal,
        ObjectiveStyle::MaxObjectiveMaxTotal,
        ObjectiveStyle::MinObjectiveMinTotal,
        ObjectiveStyle::MinObjectiveMaxTotal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ObjectiveStyle::MaximizeObjectiveFlux => "MAXIMIZE_OBJECTIVE_FLUX",
            ObjectiveStyle::MinimizeObjectiveFlux => "MINIMIZE_OBJECTIVE_FLUX",
            ObjectiveStyle::MaximizeTotalFlux => "MAXIMIZE_TOTAL_FLUX",
            ObjectiveStyle::MinimizeTotalFlux => "MINIMIZE_TOTAL_FLUX",
            ObjectiveStyle::MaxObjectiveMinTotal => "MAX_OBJECTIVE_MIN_TOTAL",
            ObjectiveStyle::MaxObjectiveMaxTotal => "MAX_OBJECTIVE_MAX_TOTAL",
            ObjectiveStyle::MinObjectiveMinTotal => "MIN_OBJECTIVE_MIN_TOTAL",
            ObjectiveStyle::MinObjectiveMaxTotal => "MIN_OBJECTIVE_MAX_TOTAL",
        }
    }

    /// Whether the run ends on the Absolute-Value LP.
    pub fn uses_absolute_value(self) -> bool {
        matches!(self.protocol(), Protocol::Absolute { .. })
    }

    pub(crate) fn protocol(self) -> Protocol {
        use ObjectiveDirection::{Maximize, Minimize};
        match self {
            ObjectiveStyle::MaximizeObjectiveFlux => Protocol::ObjectiveOnly(Maximize),
            ObjectiveStyle::MinimizeObjectiveFlux => Protocol::ObjectiveOnly(Minimize),
            ObjectiveStyle::MaximizeTotalFlux => Protocol::RawTotal(Maximize),
            ObjectiveStyle::MinimizeTotalFlux => Protocol::RawTotal(Minimize),
            ObjectiveStyle::MaxObjectiveMinTotal => Protocol::Absolute {
                objective: Maximize,
                total: Minimize,
            },
            ObjectiveStyle::MaxObjectiveMaxTotal => Protocol::Absolute {
                objective: Maximize,
                total: Maximize,
            },
            ObjectiveStyle::MinObjectiveMinTotal => Protocol::Absolute {
                objective: Minimize,
                total: Minimize,
            },
            ObjectiveStyle::MinObjectiveMaxTotal => Protocol::Absolute {
                objective: Minimize,
                total: Maximize,
            },
        }
    }
}

impl fmt::Display for ObjectiveStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a style name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStyleError(pub String);

impl fmt::Display for ParseStyleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[PARAMS_UNKNOWN_STYLE] Unknown objective style '{}'", self.0)
    }
}

impl std::error::Error for ParseStyleError {}

impl FromStr for ObjectiveStyle {
    type Err = ParseStyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        ObjectiveStyle::ALL
            .into_iter()
            .find(|style| style.as_str() == normalized)
            .ok_or_else(|| ParseStyleError(s.to_string()))
    }
}
