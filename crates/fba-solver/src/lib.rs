//! Shared LP backend abstractions for the FBA engine.
//!
//! This crate defines the capability set the engine consumes from an external
//! linear programming solver, along with the types every backend shares.
//!
//! # Overview
//!
//! - [`LpBackend`]: Trait implemented by solver backends (formulate, bound, solve, query)
//! - [`LinearProgram`]: Backend-agnostic mirror of one LP instance
//! - [`SolverConfig`]: Configuration options for solver behavior
//! - [`SolverStatus`]: Common status values across solvers
//! - [`SolverError`]: Error types for backend operations
//! - [`SolverRuntime`]: Process-wide init/teardown lifecycle

mod config;
mod error;
mod program;
mod runtime;
mod status;
mod traits;
mod types;

pub use config::{SolveMethod, SolverConfig};
pub use error::SolverError;
pub use program::{LinearProgram, SolveOutcome};
pub use runtime::SolverRuntime;
pub use status::SolverStatus;
pub use traits::LpBackend;
pub use types::{BoundKind, MatrixEntry, ObjectiveDirection, VariableKind};
