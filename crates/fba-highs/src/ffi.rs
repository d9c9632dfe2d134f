//! Raw HiGHS C API access for information the safe wrapper does not expose.
//!
//! This module contains unsafe code for interacting with the C library.
#![allow(unsafe_code)]

use highs::SolvedModel;
use std::ffi::{CStr, CString};
use tracing::debug;

/// Return the HiGHS solver version string, if available.
pub fn highs_version() -> Option<String> {
    unsafe {
        let ptr = highs_sys::Highs_version();
        if ptr.is_null() {
            None
        } else {
            CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
        }
    }
}

/// Read a non-negative integer info value from a solved model.
pub(crate) fn int_info(solved: &SolvedModel, name: &str) -> Option<u64> {
    let c_name = CString::new(name).ok()?;
    let mut value: highs_sys::HighsInt = 0;
    let status = unsafe {
        highs_sys::Highs_getIntInfoValue(solved.as_ptr(), c_name.as_ptr(), &raw mut value)
    };
    if status != highs_sys::STATUS_OK {
        debug!(
            component = "solver",
            operation = "solve_info",
            info = name,
            status_code = status,
            "HiGHS info value not available"
        );
        return None;
    }
    if value < 0 {
        return None;
    }
    Some(value as u64)
}

/// Simplex plus barrier iterations of the latest solve.
pub(crate) fn iteration_count(solved: &SolvedModel) -> u64 {
    int_info(solved, "simplex_iteration_count").unwrap_or(0)
        + int_info(solved, "ipm_iteration_count").unwrap_or(0)
}
