//! HiGHS backend for the FBA engine.
//!
//! The backend stores its formulation in a [`fba_solver::LinearProgram`] and
//! rebuilds a HiGHS `RowProblem` for every solve, so the HiGHS handle never
//! outlives a single solve and clones share nothing with the library.

pub mod backend;
pub mod ffi;
mod status;

pub use backend::HighsBackend;
pub use ffi::highs_version;
