//! Flux balance analysis on top of a pluggable LP backend.
//!
//! # Overview
//!
//! - [`StoichiometricProblem`]: Standard and Absolute-Value LP formulations of one model
//! - [`FbaModel`]: Multi-phase solve controller over a problem
//! - [`ObjectiveStyle`]: The eight supported optimization goals
//! - [`SolveResult`]: Fluxes and objective of one run
//! - [`BoundSource`]: Per-cell exchange bound adjustments
//! - [`ModelError`]: Error types for model construction and runs
//!
//! Reactions are addressed by 1-based reaction numbers in every API that takes
//! a single reaction. Bound arrays and flux vectors are plain slices ordered by
//! reaction (or by exchange list position for the exchange variants).
//!
//! # Example
//!
//! ```ignore
//! use fba_core::{FbaModel, ObjectiveStyle, ProblemOptions};
//! use fba_microlp::MicrolpBackend;
//! use fba_solver::SolverConfig;
//!
//! let matrix = vec![vec![1.0, -1.0, 0.0], vec![0.0, 1.0, -1.0]];
//! let mut model: FbaModel<MicrolpBackend> =
//!     FbaModel::from_matrix(&matrix, &ProblemOptions::default(), SolverConfig::new())?;
//! model.set_upper_bounds(&[10.0, 10.0, 10.0])?;
//! let result = model.run(ObjectiveStyle::MaximizeObjectiveFlux)?;
//! assert!(result.success);
//! ```

mod bounds;
mod controller;
mod error;
mod problem;
mod result;
mod style;

pub use bounds::{
    adjusted_bounds, BoundSource, MichaelisMentenUptake, NoAdjustment, UptakeKinetics,
};
pub use controller::FbaModel;
pub use error::ModelError;
pub use problem::{
    ProblemOptions, StoichiometricProblem, DEFAULT_LOWER_BOUND, DEFAULT_UPPER_BOUND,
};
pub use result::{LpVariant, SolveResult, FAILED_OBJECTIVE};
pub use style::{ObjectiveStyle, ParseStyleError};
