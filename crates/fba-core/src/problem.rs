//! Construction and mutation of the two LP formulations of a stoichiometric model.
//!
//! A [`StoichiometricProblem`] owns two backend instances built from the same
//! `M x N` matrix (rows are metabolites, columns are reactions):
//!
//! - the *Standard* LP: `N` flux columns and `M` mass-balance rows fixed at 0;
//! - the *Absolute-Value* LP: `N` flux columns followed by `N` dummy columns,
//!   the same `M` mass-balance rows, then `N` rows `v_i - d_i <= 0` and `N` rows
//!   `-v_i - d_i <= 0`, minimizing `Σ d_i`.
//!
//! Every flux bound write goes to both instances so they always agree.

use crate::error::ModelError;
use crate::result::LpVariant;
use fba_solver::{
    BoundKind, LpBackend, MatrixEntry, ObjectiveDirection, SolverConfig, SolverError,
    VariableKind,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, warn};

pub const DEFAULT_LOWER_BOUND: f64 = 0.0;
pub const DEFAULT_UPPER_BOUND: f64 = 1000.0;

/// Optional metadata and initial bounds for [`StoichiometricProblem::build`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemOptions {
    /// One name per reaction; defaults to `R1..RN`.
    pub reaction_names: Option<Vec<String>>,
    /// One name per metabolite; defaults to `M1..MM`.
    pub metabolite_names: Option<Vec<String>>,
    /// 1-based reaction numbers of the exchange reactions. When absent, every
    /// reaction with exactly one nonzero coefficient is an exchange reaction.
    pub exchange_reactions: Option<Vec<usize>>,
    pub default_lower: f64,
    pub default_upper: f64,
}

impl Default for ProblemOptions {
    fn default() -> Self {
        Self {
            reaction_names: None,
            metabolite_names: None,
            exchange_reactions: None,
            default_lower: DEFAULT_LOWER_BOUND,
            default_upper: DEFAULT_UPPER_BOUND,
        }
    }
}

impl ProblemOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reaction_names<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.reaction_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_metabolite_names<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.metabolite_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_exchange_reactions(mut self, reactions: Vec<usize>) -> Self {
        self.exchange_reactions = Some(reactions);
        self
    }

    pub fn with_default_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.default_lower = lower;
        self.default_upper = upper;
        self
    }
}

/// Both LP formulations of one stoichiometric model plus its bound state.
#[derive(Debug, Clone)]
pub struct StoichiometricProblem<B: LpBackend> {
    num_metabolites: usize,
    num_reactions: usize,
    reaction_names: Vec<String>,
    metabolite_names: Vec<String>,
    reaction_lookup: BTreeMap<String, usize>,
    exchange: Vec<usize>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    objective: usize,
    standard_objective_direction: ObjectiveDirection,
    absolute_value_objective_direction: ObjectiveDirection,
    standard: B,
    absolute: B,
}

impl<B: LpBackend> StoichiometricProblem<B> {
    /// Validate `matrix` and materialize both LP instances.
    ///
    /// Only nonzero coefficients reach the backend. Reaction 1 is the
    /// initial objective reaction.
    ///
    /// # Errors
    ///
    /// Returns a params error for an empty, ragged or non-finite matrix, for
    /// name lists of the wrong length, for out-of-range exchange reactions and
    /// for invalid default bounds.
    pub fn build(
        matrix: &[Vec<f64>],
        options: &ProblemOptions,
        config: &SolverConfig,
    ) -> Result<Self, ModelError> {
        let started = Instant::now();
        let (num_metabolites, num_reactions) = validate_matrix(matrix)?;
        validate_pair(0, options.default_lower, options.default_upper)?;

        let reaction_names = resolve_names(
            options.reaction_names.as_deref(),
            num_reactions,
            "reaction names",
            'R',
        )?;
        let metabolite_names = resolve_names(
            options.metabolite_names.as_deref(),
            num_metabolites,
            "metabolite names",
            'M',
        )?;
        let mut reaction_lookup = BTreeMap::new();
        for (index, name) in reaction_names.iter().enumerate() {
            reaction_lookup.entry(name.clone()).or_insert(index);
        }

        let exchange = match &options.exchange_reactions {
            Some(reactions) => reactions
                .iter()
                .map(|&reaction| reaction_to_index(reaction, num_reactions))
                .collect::<Result<Vec<_>, _>>()?,
            None => detect_exchange_reactions(matrix, num_reactions),
        };

        let lower = vec![options.default_lower; num_reactions];
        let upper = vec![options.default_upper; num_reactions];

        let standard = build_standard::<B>(matrix, num_metabolites, num_reactions, config)?;
        let absolute = build_absolute::<B>(matrix, num_metabolites, num_reactions, config)?;

        let mut problem = Self {
            num_metabolites,
            num_reactions,
            reaction_names,
            metabolite_names,
            reaction_lookup,
            exchange,
            lower,
            upper,
            objective: 0,
            standard_objective_direction: ObjectiveDirection::Maximize,
            absolute_value_objective_direction: ObjectiveDirection::Minimize,
            standard,
            absolute,
        };
        for index in 0..num_reactions {
            problem.write_flux_bounds(index, options.default_lower, options.default_upper)?;
        }
        problem.assert_single_objective()?;
        problem
            .standard
            .set_objective_direction(problem.standard_objective_direction);
        problem
            .absolute
            .set_objective_direction(problem.absolute_value_objective_direction);

        debug!(
            component = "model",
            operation = "build",
            status = "success",
            num_metabolites,
            num_reactions,
            num_exchange = problem.exchange.len(),
            standard_rows = problem.standard.num_constraints(),
            absolute_rows = problem.absolute.num_constraints(),
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Built stoichiometric problem"
        );
        Ok(problem)
    }

    pub fn num_metabolites(&self) -> usize {
        self.num_metabolites
    }

    pub fn num_reactions(&self) -> usize {
        self.num_reactions
    }

    pub fn reaction_names(&self) -> &[String] {
        &self.reaction_names
    }

    pub fn metabolite_names(&self) -> &[String] {
        &self.metabolite_names
    }

    /// 1-based reaction number of a named reaction.
    pub fn reaction_index(&self, name: &str) -> Result<usize, ModelError> {
        self.reaction_lookup
            .get(name)
            .map(|index| index + 1)
            .ok_or_else(|| ModelError::UnknownReaction(name.to_string()))
    }

    /// 1-based reaction numbers of the exchange reactions.
    pub fn exchange_reactions(&self) -> Vec<usize> {
        self.exchange.iter().map(|index| index + 1).collect()
    }

    pub(crate) fn exchange_indices(&self) -> &[usize] {
        &self.exchange
    }

    pub fn lower_bounds(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper_bounds(&self) -> &[f64] {
        &self.upper
    }

    pub fn exchange_lower_bounds(&self) -> Vec<f64> {
        self.exchange.iter().map(|&index| self.lower[index]).collect()
    }

    pub fn exchange_upper_bounds(&self) -> Vec<f64> {
        self.exchange.iter().map(|&index| self.upper[index]).collect()
    }

    /// Current `(lower, upper)` of a 1-based reaction number.
    pub fn reaction_bounds(&self, reaction: usize) -> Result<(f64, f64), ModelError> {
        let index = reaction_to_index(reaction, self.num_reactions)?;
        Ok((self.lower[index], self.upper[index]))
    }

    /// Replace every reaction's bounds.
    pub fn set_bounds(&mut self, lower: &[f64], upper: &[f64]) -> Result<(), ModelError> {
        check_length("lower bounds", self.num_reactions, lower.len())?;
        check_length("upper bounds", self.num_reactions, upper.len())?;
        let indices: Vec<usize> = (0..self.num_reactions).collect();
        self.write_validated(&indices, lower, upper)
    }

    /// Replace every reaction's lower bound, keeping the upper bounds.
    pub fn set_lower_bounds(&mut self, lower: &[f64]) -> Result<(), ModelError> {
        check_length("lower bounds", self.num_reactions, lower.len())?;
        let indices: Vec<usize> = (0..self.num_reactions).collect();
        let upper = self.upper.clone();
        self.write_validated(&indices, lower, &upper)
    }

    /// Replace every reaction's upper bound, keeping the lower bounds.
    pub fn set_upper_bounds(&mut self, upper: &[f64]) -> Result<(), ModelError> {
        check_length("upper bounds", self.num_reactions, upper.len())?;
        let indices: Vec<usize> = (0..self.num_reactions).collect();
        let lower = self.lower.clone();
        self.write_validated(&indices, &lower, upper)
    }

    /// Lower bounds for the exchange reactions, in exchange-list order.
    pub fn set_exchange_lower_bounds(&mut self, lower: &[f64]) -> Result<(), ModelError> {
        check_length("exchange lower bounds", self.exchange.len(), lower.len())?;
        let indices = self.exchange.clone();
        let upper = self.exchange_upper_bounds();
        self.write_validated(&indices, lower, &upper)
    }

    /// Upper bounds for the exchange reactions, in exchange-list order.
    pub fn set_exchange_upper_bounds(&mut self, upper: &[f64]) -> Result<(), ModelError> {
        check_length("exchange upper bounds", self.exchange.len(), upper.len())?;
        let indices = self.exchange.clone();
        let lower = self.exchange_lower_bounds();
        self.write_validated(&indices, &lower, upper)
    }

    /// Both sides of every exchange reaction in one validated write.
    pub fn set_exchange_bounds(&mut self, lower: &[f64], upper: &[f64]) -> Result<(), ModelError> {
        check_length("exchange lower bounds", self.exchange.len(), lower.len())?;
        check_length("exchange upper bounds", self.exchange.len(), upper.len())?;
        let indices = self.exchange.clone();
        self.write_validated(&indices, lower, upper)
    }

    pub fn set_reaction_bounds(
        &mut self,
        reaction: usize,
        lower: f64,
        upper: f64,
    ) -> Result<(), ModelError> {
        let index = reaction_to_index(reaction, self.num_reactions)?;
        self.write_validated(&[index], &[lower], &[upper])
    }

    /// Make a 1-based reaction the sole objective term of the Standard LP.
    pub fn set_objective_reaction(&mut self, reaction: usize) -> Result<(), ModelError> {
        let index = reaction_to_index(reaction, self.num_reactions)?;
        self.objective = index;
        self.assert_single_objective()?;
        debug!(
            component = "model",
            operation = "set_objective_reaction",
            status = "success",
            reaction,
            "Objective reaction updated"
        );
        Ok(())
    }

    /// 1-based number of the objective reaction.
    pub fn objective_reaction(&self) -> usize {
        self.objective + 1
    }

    pub(crate) fn objective_index(&self) -> usize {
        self.objective
    }

    pub fn standard_objective_direction(&self) -> ObjectiveDirection {
        self.standard_objective_direction
    }

    pub fn absolute_value_objective_direction(&self) -> ObjectiveDirection {
        self.absolute_value_objective_direction
    }

    pub(crate) fn set_standard_objective_direction(&mut self, direction: ObjectiveDirection) {
        self.standard_objective_direction = direction;
        self.standard.set_objective_direction(direction);
    }

    pub(crate) fn set_absolute_value_objective_direction(&mut self, direction: ObjectiveDirection) {
        self.absolute_value_objective_direction = direction;
        self.absolute.set_objective_direction(direction);
    }

    /// Backend instance of one formulation.
    pub fn lp(&self, variant: LpVariant) -> &B {
        match variant {
            LpVariant::Standard => &self.standard,
            LpVariant::AbsoluteValue => &self.absolute,
        }
    }

    pub(crate) fn lp_mut(&mut self, variant: LpVariant) -> &mut B {
        match variant {
            LpVariant::Standard => &mut self.standard,
            LpVariant::AbsoluteValue => &mut self.absolute,
        }
    }

    /// Rewrite the Standard LP objective as coefficient 1 on the objective
    /// reaction and 0 everywhere else.
    pub(crate) fn assert_single_objective(&mut self) -> Result<(), SolverError> {
        for index in 0..self.num_reactions {
            let value = if index == self.objective { 1.0 } else { 0.0 };
            self.standard.set_objective_coefficient(index, value)?;
        }
        Ok(())
    }

    /// Give every flux the same objective coefficient in the Standard LP.
    pub(crate) fn set_uniform_objective(&mut self, value: f64) -> Result<(), SolverError> {
        for index in 0..self.num_reactions {
            self.standard.set_objective_coefficient(index, value)?;
        }
        Ok(())
    }

    /// Fix the objective reaction's flux to `value` in one formulation only.
    pub(crate) fn pin_objective(
        &mut self,
        variant: LpVariant,
        value: f64,
    ) -> Result<(), SolverError> {
        let index = self.objective;
        self.lp_mut(variant)
            .set_variable_bounds(index, BoundKind::Fixed, value, value)
    }

    /// Write the objective reaction's current bounds back into one formulation.
    pub(crate) fn restore_objective_bounds(
        &mut self,
        variant: LpVariant,
    ) -> Result<(), SolverError> {
        let index = self.objective;
        let (lower, upper) = (self.lower[index], self.upper[index]);
        let kind = BoundKind::derive(lower, upper);
        self.lp_mut(variant)
            .set_variable_bounds(index, kind, lower, upper)
    }

    fn write_validated(
        &mut self,
        indices: &[usize],
        lower: &[f64],
        upper: &[f64],
    ) -> Result<(), ModelError> {
        for ((&index, &lo), &up) in indices.iter().zip(lower).zip(upper) {
            if let Err(err) = validate_pair(index + 1, lo, up) {
                warn!(
                    component = "model",
                    operation = "set_bounds",
                    status = "error",
                    error_code = err.code(),
                    reaction = index + 1,
                    lower = lo,
                    upper = up,
                    "Rejected bound update"
                );
                return Err(err);
            }
        }
        for ((&index, &lo), &up) in indices.iter().zip(lower).zip(upper) {
            self.write_flux_bounds(index, lo, up)?;
        }
        Ok(())
    }

    fn write_flux_bounds(
        &mut self,
        index: usize,
        lower: f64,
        upper: f64,
    ) -> Result<(), ModelError> {
        let kind = BoundKind::derive(lower, upper);
        self.standard.set_variable_bounds(index, kind, lower, upper)?;
        self.absolute.set_variable_bounds(index, kind, lower, upper)?;
        self.lower[index] = lower;
        self.upper[index] = upper;
        Ok(())
    }
}

fn build_standard<B: LpBackend>(
    matrix: &[Vec<f64>],
    num_metabolites: usize,
    num_reactions: usize,
    config: &SolverConfig,
) -> Result<B, SolverError> {
    let mut lp = B::create_problem(config);
    lp.add_variables(num_reactions, VariableKind::Continuous);
    lp.add_constraints(num_metabolites);

    let mut entries = Vec::new();
    push_stoichiometry(&mut entries, matrix);
    lp.load_sparse_matrix(&entries)?;

    for row in 0..num_metabolites {
        lp.set_constraint_bounds(row, BoundKind::Fixed, 0.0, 0.0)?;
    }
    Ok(lp)
}

fn build_absolute<B: LpBackend>(
    matrix: &[Vec<f64>],
    num_metabolites: usize,
    num_reactions: usize,
    config: &SolverConfig,
) -> Result<B, SolverError> {
    let (m, n) = (num_metabolites, num_reactions);
    let mut lp = B::create_problem(config);
    lp.add_variables(2 * n, VariableKind::Continuous);
    lp.add_constraints(m + 2 * n);

    let mut entries = Vec::with_capacity(4 * n);
    push_stoichiometry(&mut entries, matrix);
    // Mass-balance rows carry nothing on the dummy columns.
    for j in 0..n {
        entries.push(MatrixEntry::new(m + j, j, 1.0));
        entries.push(MatrixEntry::new(m + j, n + j, -1.0));
        entries.push(MatrixEntry::new(m + n + j, j, -1.0));
        entries.push(MatrixEntry::new(m + n + j, n + j, -1.0));
    }
    lp.load_sparse_matrix(&entries)?;

    for row in 0..m {
        lp.set_constraint_bounds(row, BoundKind::Fixed, 0.0, 0.0)?;
    }
    for row in m..m + 2 * n {
        lp.set_constraint_bounds(row, BoundKind::Upper, f64::NEG_INFINITY, 0.0)?;
    }
    for dummy in n..2 * n {
        lp.set_variable_bounds(dummy, BoundKind::Lower, 0.0, f64::INFINITY)?;
        lp.set_objective_coefficient(dummy, 1.0)?;
    }
    Ok(lp)
}

fn push_stoichiometry(entries: &mut Vec<MatrixEntry>, matrix: &[Vec<f64>]) {
    for (row, coefficients) in matrix.iter().enumerate() {
        for (col, &value) in coefficients.iter().enumerate() {
            if value != 0.0 {
                entries.push(MatrixEntry::new(row, col, value));
            }
        }
    }
}

fn validate_matrix(matrix: &[Vec<f64>]) -> Result<(usize, usize), ModelError> {
    let num_metabolites = matrix.len();
    let num_reactions = matrix.first().map_or(0, Vec::len);
    if num_metabolites == 0 || num_reactions == 0 {
        return Err(ModelError::InvalidMatrix {
            reason: format!("matrix is empty ({num_metabolites} x {num_reactions})"),
        });
    }
    for (row, coefficients) in matrix.iter().enumerate() {
        if coefficients.len() != num_reactions {
            return Err(ModelError::InvalidMatrix {
                reason: format!(
                    "row {} has {} columns, expected {}",
                    row + 1,
                    coefficients.len(),
                    num_reactions
                ),
            });
        }
        if let Some(col) = coefficients.iter().position(|value| !value.is_finite()) {
            return Err(ModelError::InvalidMatrix {
                reason: format!("non-finite coefficient at ({}, {})", row + 1, col + 1),
            });
        }
    }
    Ok((num_metabolites, num_reactions))
}

fn detect_exchange_reactions(matrix: &[Vec<f64>], num_reactions: usize) -> Vec<usize> {
    (0..num_reactions)
        .filter(|&col| matrix.iter().filter(|row| row[col] != 0.0).count() == 1)
        .collect()
}

fn resolve_names(
    names: Option<&[String]>,
    expected: usize,
    field: &'static str,
    prefix: char,
) -> Result<Vec<String>, ModelError> {
    match names {
        Some(names) => {
            check_length(field, expected, names.len())?;
            Ok(names.to_vec())
        }
        None => Ok((1..=expected).map(|i| format!("{prefix}{i}")).collect()),
    }
}

fn check_length(field: &'static str, expected: usize, got: usize) -> Result<(), ModelError> {
    if expected != got {
        return Err(ModelError::LengthMismatch {
            field,
            expected,
            got,
        });
    }
    Ok(())
}

fn validate_pair(reaction: usize, lower: f64, upper: f64) -> Result<(), ModelError> {
    let valid = !lower.is_nan()
        && !upper.is_nan()
        && lower <= upper
        && lower != f64::INFINITY
        && upper != f64::NEG_INFINITY;
    if valid {
        Ok(())
    } else {
        Err(ModelError::InvalidBounds {
            reaction,
            lower,
            upper,
        })
    }
}

fn reaction_to_index(reaction: usize, num_reactions: usize) -> Result<usize, ModelError> {
    if reaction == 0 || reaction > num_reactions {
        return Err(ModelError::ReactionOutOfRange {
            reaction,
            num_reactions,
        });
    }
    Ok(reaction - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fba_microlp::MicrolpBackend;
    use fba_solver::SolveMethod;

    type Problem = StoichiometricProblem<MicrolpBackend>;

    fn chain() -> Vec<Vec<f64>> {
        vec![vec![1.0, -1.0, 0.0], vec![0.0, 1.0, -1.0]]
    }

    fn build(matrix: &[Vec<f64>]) -> Problem {
        Problem::build(matrix, &ProblemOptions::default(), &SolverConfig::new()).unwrap()
    }

    #[test]
    fn test_build_dimensions() {
        let problem = build(&chain());
        assert_eq!(problem.num_metabolites(), 2);
        assert_eq!(problem.num_reactions(), 3);
        assert_eq!(problem.lp(LpVariant::Standard).num_variables(), 3);
        assert_eq!(problem.lp(LpVariant::Standard).num_constraints(), 2);
        assert_eq!(problem.lp(LpVariant::AbsoluteValue).num_variables(), 6);
        assert_eq!(problem.lp(LpVariant::AbsoluteValue).num_constraints(), 8);
    }

    #[test]
    fn test_build_skips_zero_coefficients() {
        let problem = build(&chain());
        // 4 stoichiometric nonzeros, plus 4 per reaction in the absolute LP.
        assert_eq!(problem.lp(LpVariant::Standard).program().num_nonzeros(), 4);
        assert_eq!(
            problem.lp(LpVariant::AbsoluteValue).program().num_nonzeros(),
            4 + 4 * 3
        );
    }

    #[test]
    fn test_absolute_value_rows_couple_flux_and_dummy() {
        let problem = build(&chain());
        let program = problem.lp(LpVariant::AbsoluteValue).program();
        let (m, n) = (2, 3);
        for j in 0..n {
            assert_eq!(program.coefficient(m + j, j), 1.0);
            assert_eq!(program.coefficient(m + j, n + j), -1.0);
            assert_eq!(program.coefficient(m + n + j, j), -1.0);
            assert_eq!(program.coefficient(m + n + j, n + j), -1.0);
            assert_eq!(program.objective_coefficient(n + j), Some(1.0));
            assert_eq!(program.objective_coefficient(j), Some(0.0));
            assert_eq!(
                program.variable_bounds(n + j),
                Some((0.0, f64::INFINITY, BoundKind::Lower))
            );
        }
        for i in 0..m {
            for j in n..2 * n {
                assert_eq!(program.coefficient(i, j), 0.0);
            }
            assert_eq!(
                program.constraint_bounds(i),
                Some((0.0, 0.0, BoundKind::Fixed))
            );
        }
        assert_eq!(
            program.constraint_bounds(m),
            Some((f64::NEG_INFINITY, 0.0, BoundKind::Upper))
        );
    }

    #[test]
    fn test_dummies_match_absolute_flux_at_optimum() {
        let mut problem = build(&chain());
        problem
            .set_bounds(&[-5.0, -5.0, -5.0], &[5.0, 5.0, 5.0])
            .unwrap();
        problem.set_absolute_value_objective_direction(ObjectiveDirection::Minimize);
        problem.pin_objective(LpVariant::AbsoluteValue, -3.0).unwrap();

        let lp = problem.lp_mut(LpVariant::AbsoluteValue);
        let status = lp.solve(SolveMethod::Simplex).unwrap();
        assert!(status.is_optimal());

        let n = 3;
        let lp = problem.lp(LpVariant::AbsoluteValue);
        for i in 0..n {
            let flux = lp.variable_primal(i).unwrap();
            let dummy = lp.variable_primal(n + i).unwrap();
            assert!((flux + 3.0).abs() < 1e-6, "v{} = {flux}", i + 1);
            assert!(dummy >= flux.abs() - 1e-9);
            assert!((dummy - flux.abs()).abs() < 1e-6, "d{} = {dummy}", i + 1);
        }
        assert!((lp.objective_value().unwrap() - 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_build_sets_default_bounds_and_objective() {
        let problem = build(&chain());
        assert_eq!(problem.lower_bounds(), &[0.0, 0.0, 0.0]);
        assert_eq!(problem.upper_bounds(), &[1000.0, 1000.0, 1000.0]);
        assert_eq!(problem.objective_reaction(), 1);
        let program = problem.lp(LpVariant::Standard).program();
        assert_eq!(program.objective_coefficient(0), Some(1.0));
        assert_eq!(program.objective_coefficient(1), Some(0.0));
        assert_eq!(program.direction(), ObjectiveDirection::Maximize);
    }

    #[test]
    fn test_build_rejects_bad_matrices() {
        let config = SolverConfig::new();
        let options = ProblemOptions::default();
        let empty: Vec<Vec<f64>> = Vec::new();
        let ragged = vec![vec![1.0, 0.0], vec![1.0]];
        let nan = vec![vec![1.0, f64::NAN]];
        for matrix in [empty, ragged, nan] {
            let err = Problem::build(&matrix, &options, &config).unwrap_err();
            assert_eq!(err.code(), "PARAMS_INVALID_MATRIX");
        }
    }

    #[test]
    fn test_exchange_reactions_detected_from_single_entry_columns() {
        let problem = build(&chain());
        assert_eq!(problem.exchange_reactions(), vec![1, 3]);
    }

    #[test]
    fn test_explicit_exchange_list_validated() {
        let options = ProblemOptions::new().with_exchange_reactions(vec![4]);
        let err = Problem::build(&chain(), &options, &SolverConfig::new()).unwrap_err();
        assert_eq!(err.code(), "PARAMS_REACTION_OUT_OF_RANGE");
    }

    #[test]
    fn test_reaction_names_lookup() {
        let options = ProblemOptions::new().with_reaction_names(["EX_glc", "PGI", "EX_out"]);
        let problem = Problem::build(&chain(), &options, &SolverConfig::new()).unwrap();
        assert_eq!(problem.reaction_index("PGI").unwrap(), 2);
        assert!(matches!(
            problem.reaction_index("missing"),
            Err(ModelError::UnknownReaction(_))
        ));

        let default_names = build(&chain());
        assert_eq!(default_names.reaction_names()[2], "R3");
        assert_eq!(default_names.metabolite_names()[0], "M1");
    }

    #[test]
    fn test_set_bounds_writes_both_formulations() {
        let mut problem = build(&chain());
        problem
            .set_bounds(&[-5.0, -5.0, 2.0], &[5.0, 5.0, 2.0])
            .unwrap();
        for variant in [LpVariant::Standard, LpVariant::AbsoluteValue] {
            let program = problem.lp(variant).program();
            assert_eq!(
                program.variable_bounds(0),
                Some((-5.0, 5.0, BoundKind::Double))
            );
            assert_eq!(program.variable_bounds(2), Some((2.0, 2.0, BoundKind::Fixed)));
        }
    }

    #[test]
    fn test_infinite_bounds_derive_open_kinds() {
        let mut problem = build(&chain());
        problem
            .set_reaction_bounds(2, f64::NEG_INFINITY, f64::INFINITY)
            .unwrap();
        assert_eq!(
            problem.lp(LpVariant::Standard).program().variable_bounds(1),
            Some((f64::NEG_INFINITY, f64::INFINITY, BoundKind::Free))
        );
    }

    #[test]
    fn test_rejected_update_leaves_bounds_unchanged() {
        let mut problem = build(&chain());
        let err = problem
            .set_bounds(&[0.0, 3.0, 0.0], &[1.0, 1.0, 1.0])
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::InvalidBounds {
                reaction: 2,
                lower: 3.0,
                upper: 1.0
            }
        );
        assert_eq!(problem.upper_bounds(), &[1000.0, 1000.0, 1000.0]);

        let err = problem.set_lower_bounds(&[0.0, 0.0]).unwrap_err();
        assert_eq!(err.code(), "PARAMS_LENGTH_MISMATCH");
    }

    #[test]
    fn test_lower_only_update_checked_against_current_upper() {
        let mut problem = build(&chain());
        problem.set_upper_bounds(&[10.0, 10.0, 10.0]).unwrap();
        assert!(problem.set_lower_bounds(&[0.0, 11.0, 0.0]).is_err());
        problem.set_lower_bounds(&[-10.0, 0.0, 10.0]).unwrap();
        assert_eq!(problem.reaction_bounds(3).unwrap(), (10.0, 10.0));
    }

    #[test]
    fn test_exchange_bounds_follow_exchange_order() {
        let mut problem = build(&chain());
        problem.set_exchange_lower_bounds(&[-7.0, -3.0]).unwrap();
        problem.set_exchange_upper_bounds(&[7.0, 3.0]).unwrap();
        assert_eq!(problem.exchange_lower_bounds(), vec![-7.0, -3.0]);
        assert_eq!(problem.lower_bounds(), &[-7.0, 0.0, -3.0]);
        assert_eq!(problem.upper_bounds(), &[7.0, 1000.0, 3.0]);
        assert!(problem.set_exchange_bounds(&[1.0], &[2.0]).is_err());
    }

    #[test]
    fn test_set_objective_reaction_is_one_based() {
        let mut problem = build(&chain());
        problem.set_objective_reaction(3).unwrap();
        let program = problem.lp(LpVariant::Standard).program();
        assert_eq!(program.objective_coefficient(0), Some(0.0));
        assert_eq!(program.objective_coefficient(2), Some(1.0));
        assert!(problem.set_objective_reaction(0).is_err());
        assert!(problem.set_objective_reaction(4).is_err());
        assert_eq!(problem.objective_reaction(), 3);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = build(&chain());
        let copy = original.clone();
        original.set_reaction_bounds(1, 1.0, 2.0).unwrap();
        assert_eq!(copy.reaction_bounds(1).unwrap(), (0.0, 1000.0));
        assert_eq!(
            copy.lp(LpVariant::Standard).program().variable_bounds(0),
            Some((0.0, 1000.0, BoundKind::Double))
        );
    }
}
