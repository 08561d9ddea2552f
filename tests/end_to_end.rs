//! End-to-end scenarios exercising presolve and the full tabu-search
//! controller through the public API, mirroring the documented scenarios
//! a solve must handle.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use tabumilp::Status;
use tabumilp::controller::{Controller, ControllerOptions};
use tabumilp::incumbent::IncumbentHolder;
use tabumilp::model::{ConstraintSense as CS, ModelStore};
use tabumilp::neighborhood::{BinaryFlipGenerator, NeighbourhoodDispatcher, SelectionMoveGenerator};
use tabumilp::presolve::Presolver;
use tabumilp::tabu_search::{TabuSearch, TabuSearchOptions};

fn run_search(store: &mut ModelStore, dispatcher: NeighbourhoodDispatcher) -> (IncumbentHolder, Status) {
    let options = TabuSearchOptions {
        max_time: Some(Duration::from_millis(200)),
        max_iterations: Some(2_000),
        ..Default::default()
    };
    let mut search = TabuSearch::new(dispatcher, store.variables.len(), options, 0.1);
    let mut controller = Controller::new(ControllerOptions::default(), store.constraints.len(), 3);
    let mut incumbents = IncumbentHolder::new();
    let cancel = Arc::new(AtomicBool::new(false));
    let report = controller.run(store, &mut search, &mut incumbents, &cancel);
    (incumbents, report.status)
}

#[test]
fn trivial_singleton_is_fixed_by_presolve_alone() {
    let mut store = ModelStore::new(true);
    let x = store.create_variable("x", 0, 10);
    let expr = store.create_expression(vec![(x, 3.0)], 1.0);
    store.create_constraint("singleton", expr, CS::Eq, 7.0);
    store.set_objective(vec![(x, 1.0)], 0.0);

    let report = Presolver::new(6).run(&mut store).unwrap();
    assert!(report.rounds >= 1);
    assert_eq!(store.variables[x.0].value, 2);
    assert!(store.variables[x.0].fixed);
    assert_eq!(store.enabled_constraint_count(), 0);
    assert!(store.is_feasible());
}

#[test]
fn pure_binary_set_partitioning_finds_the_optimum() {
    let mut store = ModelStore::new(true);
    let x0 = store.create_variable("x0", 0, 1);
    let x1 = store.create_variable("x1", 0, 1);
    let x2 = store.create_variable("x2", 0, 1);
    let expr = store.create_expression(vec![(x0, 1.0), (x1, 1.0), (x2, 1.0)], 0.0);
    store.create_constraint("partition", expr, CS::Eq, 1.0);
    store.set_objective(vec![(x0, 2.0), (x1, 1.0), (x2, 3.0)], 0.0);

    // Start from a feasible point so the selection generator has a
    // selection group to swap within.
    store.set_variable_value(x0, 1);
    store.set_variable_value(x1, 0);
    store.set_variable_value(x2, 0);

    let dispatcher = NeighbourhoodDispatcher::new(vec![Box::new(BinaryFlipGenerator::new()), Box::new(SelectionMoveGenerator::new())]);

    let (incumbents, _status) = run_search(&mut store, dispatcher);

    let feasible = incumbents.feasible.expect("expected a feasible incumbent");
    assert!((feasible.objective - 1.0).abs() < 1e-9, "expected optimum 1.0, got {}", feasible.objective);
}

#[test]
fn infeasible_fixed_values_are_caught_before_search_starts() {
    let mut store = ModelStore::new(true);
    let x = store.create_variable("x", 0, 0);
    let expr = store.create_expression(vec![(x, 1.0)], 0.0);
    store.create_constraint("unsatisfiable", expr, CS::Ge, 5.0);
    store.set_objective(vec![(x, 1.0)], 0.0);

    let err = Presolver::new(6).run(&mut store).unwrap_err();
    assert_eq!(err.status_label(), Status::Infeasible.pb_label());
}
