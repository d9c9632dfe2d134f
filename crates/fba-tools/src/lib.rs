//! Instrumentation helpers for FBA benchmark runs.
//!
//! Tracks resident memory across the stages of a run (model build, pool
//! start, each simulation step) so benchmark artifacts can report growth.

pub mod memory;

pub use memory::{MemoryError, MemoryProbe, MemorySnapshot};
