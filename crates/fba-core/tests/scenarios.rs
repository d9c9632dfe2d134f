#![allow(clippy::float_cmp)]

use fba_core::{FbaModel, LpVariant, ObjectiveStyle, ProblemOptions};
use fba_microlp::MicrolpBackend;
use fba_solver::{BoundKind, SolverConfig, SolverStatus};

const TOL: f64 = 1e-6;

type Model = FbaModel<MicrolpBackend>;

/// Uptake -> A -> B -> secretion.
fn chain() -> Vec<Vec<f64>> {
    vec![vec![1.0, -1.0, 0.0], vec![0.0, 1.0, -1.0]]
}

/// Uptake of A (R1), two parallel A -> B conversions (R2, R3), secretion of
/// B (R4) and a B -> A return (R5) that closes a cycle.
fn cycle_network() -> Vec<Vec<f64>> {
    vec![
        vec![1.0, -1.0, -1.0, 0.0, 1.0],
        vec![0.0, 1.0, 1.0, -1.0, -1.0],
    ]
}

fn model(matrix: &[Vec<f64>]) -> Model {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
    FbaModel::from_matrix(matrix, &ProblemOptions::default(), SolverConfig::new()).unwrap()
}

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < TOL, "expected {expected:?}, got {actual:?}");
    }
}

#[test]
fn test_chain_maximize_objective_flux() {
    let mut model = model(&chain());
    model.set_bounds(&[0.0; 3], &[10.0; 3]).unwrap();
    model.set_objective_reaction(3).unwrap();

    let result = model.run(ObjectiveStyle::MaximizeObjectiveFlux).unwrap();

    assert!(result.success);
    assert_eq!(result.status, SolverStatus::Optimal);
    assert_eq!(result.variant, LpVariant::Standard);
    assert_close(&result.fluxes, &[10.0, 10.0, 10.0]);
    assert!((result.objective_value - 10.0).abs() < TOL);
    assert!(model.run_succeeded());
    assert_close(model.fluxes(), &[10.0, 10.0, 10.0]);
}

#[test]
fn test_chain_max_objective_min_total() {
    let mut model = model(&chain());
    model.set_bounds(&[-5.0; 3], &[5.0; 3]).unwrap();
    model.set_objective_reaction(1).unwrap();

    let result = model.run(ObjectiveStyle::MaxObjectiveMinTotal).unwrap();

    assert!(result.success);
    assert_eq!(result.variant, LpVariant::AbsoluteValue);
    assert!((result.objective_value - 5.0).abs() < TOL);
    assert_close(&result.fluxes, &[5.0, 5.0, 5.0]);
    assert!((result.lp_objective_value - 15.0).abs() < TOL);
    assert_eq!(model.authoritative_variant(), Some(LpVariant::AbsoluteValue));
}

#[test]
fn test_minimize_objective_flux() {
    let mut model = model(&chain());
    model.set_bounds(&[2.0, 0.0, 0.0], &[10.0; 3]).unwrap();
    let result = model.run(ObjectiveStyle::MinimizeObjectiveFlux).unwrap();
    assert!(result.success);
    assert!((result.objective_value - 2.0).abs() < TOL);
}

#[test]
fn test_raw_total_flux_keeps_objective_and_restores_bounds() {
    let mut model = model(&cycle_network());
    model.set_bounds(&[0.0; 5], &[10.0; 5]).unwrap();
    model.set_objective_reaction(4).unwrap();

    let max_total = model.run(ObjectiveStyle::MaximizeTotalFlux).unwrap();
    assert!(max_total.success);
    assert!((max_total.objective_value - 10.0).abs() < TOL);
    let total: f64 = max_total.fluxes.iter().sum();
    assert!((total - 50.0).abs() < TOL);
    assert!((max_total.lp_objective_value - 50.0).abs() < TOL);

    let min_total = model.run(ObjectiveStyle::MinimizeTotalFlux).unwrap();
    assert!(min_total.success);
    assert!((min_total.objective_value - 10.0).abs() < TOL);
    let total: f64 = min_total.fluxes.iter().sum();
    assert!((total - 30.0).abs() < TOL);

    let problem = model.problem().unwrap();
    assert_eq!(problem.reaction_bounds(4).unwrap(), (0.0, 10.0));
    let program = problem.lp(LpVariant::Standard).program();
    assert_eq!(
        program.variable_bounds(3),
        Some((0.0, 10.0, BoundKind::Double))
    );
    for index in 0..5 {
        let expected = if index == 3 { 1.0 } else { 0.0 };
        assert_eq!(program.objective_coefficient(index), Some(expected));
    }
}

#[test]
fn test_total_flux_restores_fixed_bounds_as_fixed() {
    let mut model = model(&chain());
    model.set_bounds(&[4.0, 0.0, 0.0], &[4.0, 10.0, 10.0]).unwrap();
    let result = model.run(ObjectiveStyle::MaximizeTotalFlux).unwrap();
    assert!(result.success);
    let program = model.problem().unwrap().lp(LpVariant::Standard).program();
    assert_eq!(program.variable_bounds(0), Some((4.0, 4.0, BoundKind::Fixed)));
}

#[test]
fn test_min_total_absolute_flux_equals_dummy_sum() {
    let mut model = model(&cycle_network());
    model.set_bounds(&[-10.0; 5], &[10.0; 5]).unwrap();
    model.set_objective_reaction(4).unwrap();

    let result = model.run(ObjectiveStyle::MaxObjectiveMinTotal).unwrap();
    assert!(result.success);
    assert!((result.objective_value - 10.0).abs() < TOL);
    let absolute_sum: f64 = result.fluxes.iter().map(|v| v.abs()).sum();
    // At the optimum every dummy equals |v|, so the LP objective is Σ|v|.
    assert!((result.lp_objective_value - absolute_sum).abs() < TOL);
    assert!((absolute_sum - 30.0).abs() < TOL);

    let problem = model.problem().unwrap();
    let program = problem.lp(LpVariant::AbsoluteValue).program();
    assert_eq!(
        program.variable_bounds(3),
        Some((-10.0, 10.0, BoundKind::Double))
    );
}

#[test]
fn test_two_phase_styles_keep_objective_flux() {
    for style in [
        ObjectiveStyle::MaxObjectiveMinTotal,
        ObjectiveStyle::MinObjectiveMinTotal,
        ObjectiveStyle::MaximizeTotalFlux,
        ObjectiveStyle::MinimizeTotalFlux,
    ] {
        let mut model = model(&cycle_network());
        model.set_bounds(&[1.0; 5], &[10.0; 5]).unwrap();
        model.set_objective_reaction(4).unwrap();

        let single = if matches!(style, ObjectiveStyle::MinObjectiveMinTotal) {
            model.run(ObjectiveStyle::MinimizeObjectiveFlux).unwrap()
        } else {
            model.run(ObjectiveStyle::MaximizeObjectiveFlux).unwrap()
        };
        let result = model.run(style).unwrap();
        assert!(result.success, "{style} failed");
        assert!(
            (result.objective_value - single.objective_value).abs() < TOL,
            "{style}: {} vs {}",
            result.objective_value,
            single.objective_value
        );
    }
}

#[test]
fn test_repeated_runs_are_idempotent() {
    let mut model = model(&cycle_network());
    model.set_bounds(&[0.0; 5], &[10.0; 5]).unwrap();
    for style in ObjectiveStyle::ALL {
        if style == ObjectiveStyle::MaxObjectiveMaxTotal
            || style == ObjectiveStyle::MinObjectiveMaxTotal
        {
            continue;
        }
        let first = model.run(style).unwrap();
        let second = model.run(style).unwrap();
        assert_eq!(first.success, second.success);
        assert!((first.objective_value - second.objective_value).abs() < TOL);
        assert_close(&first.fluxes, &second.fluxes);
    }
}

#[test]
fn test_max_total_absolute_is_unbounded() {
    let mut model = model(&chain());
    model.set_bounds(&[0.0; 3], &[10.0; 3]).unwrap();
    let result = model.run(ObjectiveStyle::MaxObjectiveMaxTotal).unwrap();
    assert!(!result.success);
    assert_eq!(result.status, SolverStatus::Unbounded);
    assert_eq!(result.fluxes, vec![0.0; 3]);
    assert_eq!(result.objective_value, f64::MIN);
    assert_eq!(model.objective_value(), f64::MIN);
}

#[test]
fn test_infeasible_bounds_report_failure() {
    let mut model = model(&chain());
    model.set_bounds(&[5.0, 0.0, 0.0], &[10.0, 10.0, 1.0]).unwrap();
    let result = model.run(ObjectiveStyle::MaximizeObjectiveFlux).unwrap();
    assert_eq!(result.status, SolverStatus::Infeasible);
    assert!(!model.run_succeeded());
    assert_eq!(model.fluxes(), &[0.0, 0.0, 0.0]);
}

#[test]
fn test_bounds_round_trip_and_rejection() {
    let mut model = model(&chain());
    let lower = [-1.0, -2.0, -3.0];
    let upper = [1.0, 2.0, 3.0];
    model.set_bounds(&lower, &upper).unwrap();
    let problem = model.problem().unwrap();
    assert_eq!(problem.lower_bounds(), &lower);
    assert_eq!(problem.upper_bounds(), &upper);

    let err = model.set_upper_bounds(&[1.0, -5.0, 3.0]).unwrap_err();
    assert!(err.is_params_error());
    let problem = model.problem().unwrap();
    assert_eq!(problem.upper_bounds(), &upper);
}

#[test]
fn test_exchange_bounds_drive_uptake() {
    let mut model = model(&chain());
    model.set_reaction_bounds(2, -1000.0, 1000.0).unwrap();
    model.set_exchange_bounds(&[0.0, 0.0], &[3.0, 1000.0]).unwrap();
    model.set_objective_reaction(3).unwrap();

    let result = model.run(ObjectiveStyle::MaximizeObjectiveFlux).unwrap();
    assert!((result.objective_value - 3.0).abs() < TOL);
    assert_close(&model.exchange_fluxes(), &[3.0, 3.0]);
}

#[test]
fn test_clone_runs_independently() {
    let mut original = model(&chain());
    original.set_bounds(&[0.0; 3], &[10.0; 3]).unwrap();
    let mut copy = original.clone();
    copy.set_upper_bounds(&[2.0; 3]).unwrap();

    let a = original.run(ObjectiveStyle::MaximizeObjectiveFlux).unwrap();
    let b = copy.run(ObjectiveStyle::MaximizeObjectiveFlux).unwrap();
    assert!((a.objective_value - 10.0).abs() < TOL);
    assert!((b.objective_value - 2.0).abs() < TOL);
}
