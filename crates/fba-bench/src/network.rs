//! Synthetic pathway models used as benchmark workloads.

use fba_core::{FbaModel, ModelError, ProblemOptions};
use fba_solver::{LpBackend, SolverConfig};
use rand::Rng;
use rand_chacha::ChaCha12Rng;

/// Reaction number of the uptake exchange in every generated pathway.
pub const UPTAKE_REACTION: usize = 1;

/// Shape of one generated pathway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathwayShape {
    /// Internal metabolites along the main chain (at least 2).
    pub metabolites: usize,
    /// Extra shortcut reactions between non-adjacent chain metabolites.
    pub bypasses: usize,
}

impl PathwayShape {
    pub fn num_reactions(&self) -> usize {
        self.metabolites + 1 + self.bypasses
    }

    /// Reaction number of the secretion exchange, used as the objective.
    pub fn secretion_reaction(&self) -> usize {
        self.metabolites + 1
    }
}

/// Build the stoichiometric matrix of a linear pathway.
///
/// Reaction 1 exchanges the first metabolite (negative flux is uptake),
/// reactions 2..=m convert each metabolite into the next, reaction m+1
/// secretes the last one, and the remaining columns are random shortcuts.
/// Only the two exchanges have a single nonzero, so they are the detected
/// exchange reactions.
pub fn pathway_matrix(shape: PathwayShape, rng: &mut ChaCha12Rng) -> Vec<Vec<f64>> {
    let m = shape.metabolites.max(2);
    let bypasses = if m < 3 { 0 } else { shape.bypasses };
    let n = m + 1 + bypasses;
    let mut matrix = vec![vec![0.0; n]; m];

    matrix[0][0] = -1.0;
    for step in 1..m {
        matrix[step - 1][step] = -1.0;
        matrix[step][step] = 1.0;
    }
    matrix[m - 1][m] = -1.0;

    for column in (m + 1)..n {
        let from = rng.gen_range(0..m - 2);
        let to = rng.gen_range(from + 2..m);
        matrix[from][column] = -1.0;
        matrix[to][column] = 1.0;
    }
    matrix
}

/// Build `count` pathway models that share a chain length but differ in
/// their shortcuts.
///
/// Uptake starts closed (`[0, 0]`) so only the bound source can open it.
pub fn build_models<B: LpBackend>(
    count: usize,
    metabolites: usize,
    max_bypasses: usize,
    config: &SolverConfig,
    rng: &mut ChaCha12Rng,
) -> Result<Vec<FbaModel<B>>, ModelError> {
    let mut models = Vec::with_capacity(count);
    for _ in 0..count {
        let shape = PathwayShape {
            metabolites,
            bypasses: rng.gen_range(0..=max_bypasses),
        };
        let matrix = pathway_matrix(shape, rng);
        let mut model = FbaModel::from_matrix(&matrix, &ProblemOptions::default(), config.clone())?;
        model.set_reaction_bounds(UPTAKE_REACTION, 0.0, 0.0)?;
        model.set_objective_reaction(shape.secretion_reaction())?;
        models.push(model);
    }
    Ok(models)
}
