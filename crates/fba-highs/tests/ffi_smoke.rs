use fba_highs::{highs_version, HighsBackend};
use fba_solver::{
    BoundKind, LpBackend, MatrixEntry, ObjectiveDirection, SolveMethod, SolverConfig,
    SolverStatus, VariableKind,
};

#[test]
fn test_highs_version_is_reported() {
    let version = highs_version().expect("HiGHS did not report a version");
    assert!(!version.is_empty());
}

#[test]
fn test_minimize_simple() {
    // Initialize tracing for diagnostics
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    // minimize x subject to x >= 1
    let mut lp = HighsBackend::create_problem(&SolverConfig::new());
    lp.add_variables(1, VariableKind::Continuous);
    lp.set_variable_bounds(0, BoundKind::Lower, 1.0, f64::INFINITY)
        .unwrap();
    lp.set_objective_coefficient(0, 1.0).unwrap();
    lp.set_objective_direction(ObjectiveDirection::Minimize);

    let status = lp.solve(SolveMethod::Simplex).unwrap();

    assert_eq!(status, SolverStatus::Optimal);
    let x = lp.variable_primal(0).expect("missing primal value");
    assert!((x - 1.0).abs() < 1e-6, "expected x ~ 1.0, got {x}");
    assert!(lp.objective_value().is_some());
}

#[test]
fn test_row_bounds() {
    // maximize x + 2y subject to x + y <= 4, x, y in [0, 3]
    let mut lp = HighsBackend::new();
    lp.add_variables(2, VariableKind::Continuous);
    lp.add_constraints(1);
    lp.load_sparse_matrix(&[MatrixEntry::new(0, 0, 1.0), MatrixEntry::new(0, 1, 1.0)])
        .unwrap();
    lp.set_constraint_bounds(0, BoundKind::Upper, f64::NEG_INFINITY, 4.0)
        .unwrap();
    for col in 0..2 {
        lp.set_variable_bounds(col, BoundKind::Double, 0.0, 3.0)
            .unwrap();
    }
    lp.set_objective_coefficient(0, 1.0).unwrap();
    lp.set_objective_coefficient(1, 2.0).unwrap();
    lp.set_objective_direction(ObjectiveDirection::Maximize);

    assert_eq!(lp.solve(SolveMethod::Simplex).unwrap(), SolverStatus::Optimal);
    let objective = lp.objective_value().unwrap();
    assert!((objective - 7.0).abs() < 1e-6);
}

#[test]
fn test_infeasible_is_a_status() {
    let mut lp = HighsBackend::with_config(SolverConfig::new().with_presolve(false));
    lp.add_variables(1, VariableKind::Continuous);
    lp.add_constraints(1);
    lp.load_sparse_matrix(&[MatrixEntry::new(0, 0, 1.0)])
        .unwrap();
    lp.set_constraint_bounds(0, BoundKind::Fixed, 5.0, 5.0)
        .unwrap();
    lp.set_variable_bounds(0, BoundKind::Double, 0.0, 1.0)
        .unwrap();

    let status = lp.solve(SolveMethod::Simplex).unwrap();
    assert_eq!(status, SolverStatus::Infeasible);
    assert_eq!(lp.objective_value(), None);
    assert_eq!(lp.variable_primal(0), None);
}
