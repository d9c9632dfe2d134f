//! Environment-driven adjustments of exchange reaction bounds.

use std::collections::BTreeMap;

/// Source of per-cell bound adjustments for exchange reactions.
///
/// `reaction` is the 1-based reaction number. `concentrations` holds the
/// local media concentrations of the cell being solved, in whatever metabolite
/// order the driver uses. The returned pair `(lower_delta, upper_delta)` is
/// added to the reaction's base bounds.
pub trait BoundSource: Send + Sync {
    fn bound_adjustment(&self, reaction: usize, concentrations: &[f64], time: f64) -> (f64, f64);
}

/// Leaves every bound at its base value.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAdjustment;

impl BoundSource for NoAdjustment {
    fn bound_adjustment(
        &self,
        _reaction: usize,
        _concentrations: &[f64],
        _time: f64,
    ) -> (f64, f64) {
        (0.0, 0.0)
    }
}

/// Saturating uptake kinetics for one exchange reaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UptakeKinetics {
    /// Position of the exchanged metabolite in the concentration slice.
    pub metabolite: usize,
    pub km: f64,
    pub vmax: f64,
}

/// Michaelis-Menten uptake: lowers an exchange reaction's lower bound by
/// `vmax * c / (km + c)` where `c` is the local concentration.
///
/// Reactions without registered kinetics, and concentrations that are
/// missing, non-finite or non-positive, receive no adjustment.
#[derive(Debug, Clone, Default)]
pub struct MichaelisMentenUptake {
    kinetics: BTreeMap<usize, UptakeKinetics>,
}

impl MichaelisMentenUptake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register kinetics for a 1-based reaction number.
    pub fn with_reaction(mut self, reaction: usize, kinetics: UptakeKinetics) -> Self {
        self.kinetics.insert(reaction, kinetics);
        self
    }

    pub fn kinetics(&self, reaction: usize) -> Option<&UptakeKinetics> {
        self.kinetics.get(&reaction)
    }

    fn uptake_rate(kinetics: &UptakeKinetics, concentration: f64) -> f64 {
        let denominator = kinetics.km + concentration;
        if denominator <= 0.0 {
            return 0.0;
        }
        kinetics.vmax * concentration / denominator
    }
}

impl BoundSource for MichaelisMentenUptake {
    fn bound_adjustment(&self, reaction: usize, concentrations: &[f64], _time: f64) -> (f64, f64) {
        let Some(kinetics) = self.kinetics.get(&reaction) else {
            return (0.0, 0.0);
        };
        match concentrations.get(kinetics.metabolite) {
            Some(&c) if c.is_finite() && c > 0.0 => (-Self::uptake_rate(kinetics, c), 0.0),
            _ => (0.0, 0.0),
        }
    }
}

/// Base bounds plus adjustment for each listed reaction.
///
/// `reactions`, `base_lower` and `base_upper` are parallel. A pair whose
/// adjusted lower side overshoots the upper side collapses onto the upper
/// bound, so the result always satisfies `lower <= upper`.
pub fn adjusted_bounds(
    source: &dyn BoundSource,
    reactions: &[usize],
    base_lower: &[f64],
    base_upper: &[f64],
    concentrations: &[f64],
    time: f64,
) -> (Vec<f64>, Vec<f64>) {
    let mut lower = Vec::with_capacity(reactions.len());
    let mut upper = Vec::with_capacity(reactions.len());
    for ((&reaction, &lo), &up) in reactions.iter().zip(base_lower).zip(base_upper) {
        let (lower_delta, upper_delta) = source.bound_adjustment(reaction, concentrations, time);
        let new_upper = up + upper_delta;
        let new_lower = (lo + lower_delta).min(new_upper);
        lower.push(new_lower);
        upper.push(new_upper);
    }
    (lower, upper)
}
