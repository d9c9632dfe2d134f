//! Process-wide backend lifecycle.

use crate::{LpBackend, SolverConfig, SolverError};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Mutex;
use tracing::{debug, warn};

// Live runtimes per backend name; the library is set up on 0 -> 1 and torn down on 1 -> 0.
static LIVE_RUNTIMES: Mutex<BTreeMap<&'static str, usize>> = Mutex::new(BTreeMap::new());

/// Proof that a backend's process-wide initialization has run.
///
/// Create one with [`SolverRuntime::init`] before starting any worker and
/// release it with [`SolverRuntime::teardown`] once all work has drained.
/// Worker pools borrow the runtime, so it cannot be torn down while they run.
/// Several runtimes for the same backend may coexist; the library is torn
/// down when the last one is released.
#[derive(Debug)]
pub struct SolverRuntime<B: LpBackend> {
    config: SolverConfig,
    released: bool,
    _backend: PhantomData<fn() -> B>,
}

impl<B: LpBackend> SolverRuntime<B> {
    /// Run the backend's one-time initialization if no runtime is live yet.
    ///
    /// # Errors
    ///
    /// Propagates the backend's initialization failure.
    pub fn init(config: SolverConfig) -> Result<Self, SolverError> {
        let mut live = lock_live();
        let count = live.entry(B::name()).or_insert(0);
        if *count == 0 {
            B::initialize_process(&config)?;
            debug!(
                component = "runtime",
                operation = "init",
                status = "success",
                backend = B::name(),
                "Initialized solver backend"
            );
        }
        *count += 1;
        Ok(Self {
            config,
            released: false,
            _backend: PhantomData,
        })
    }

    /// Configuration the runtime was initialized with.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Backend name.
    pub fn backend_name(&self) -> &'static str {
        B::name()
    }

    /// Release this runtime, tearing the backend down if it was the last one.
    pub fn teardown(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let mut live = lock_live();
        let Some(count) = live.get_mut(B::name()) else {
            warn!(
                component = "runtime",
                operation = "teardown",
                status = "warn",
                backend = B::name(),
                "Runtime released without a live registration"
            );
            return;
        };
        *count = count.saturating_sub(1);
        if *count == 0 {
            live.remove(B::name());
            B::teardown_process();
            debug!(
                component = "runtime",
                operation = "teardown",
                status = "success",
                backend = B::name(),
                "Tore down solver backend"
            );
        }
    }
}

impl<B: LpBackend> Drop for SolverRuntime<B> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Number of live runtimes for a backend name.
#[cfg(test)]
pub(crate) fn live_count(name: &str) -> usize {
    lock_live().get(name).copied().unwrap_or(0)
}

fn lock_live() -> std::sync::MutexGuard<'static, BTreeMap<&'static str, usize>> {
    match LIVE_RUNTIMES.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
