//! # Scenarios that require a look inside the crate.
//!
//! Most of these solve the model from `sample`, whose optimum is known.
use crate::algorithm::{solve_blocks, solve_mip};
use crate::algorithm::branch_and_price::BranchAndPriceEngine;
use crate::algorithm::branch_and_price::monitor::{NodeEvent, NoOpMonitor, SearchMonitor};
use crate::data::linear_program::elements::{ConstraintType, Objective, VariableType};
use crate::data::linear_program::model::{Bounds, SparseColumns, SparseModel};
use crate::data::linear_program::partition::{BlockFinding, BlockPartition};
use crate::data::linear_program::solution::{SolutionReport, SolveStatus, Termination};
use crate::settings::Settings;


fn assert_optimal_sample(report: &SolutionReport) {
    assert_eq!(report.status(), SolveStatus::Optimal);
    assert!((report.objective_value() - 3_f64).abs() < 1e-6);
    assert!(report.bound_gap() < 1e-5);

    let model = sample::model();
    let x = report.primal();
    assert_eq!(x.len(), 6);
    assert!(x.iter().all(|&v| v.abs() < 1e-9 || (v - 1_f64).abs() < 1e-9));
    assert!((0..model.nr_rows()).all(|i| model.is_row_satisfied(i, x, 1e-6)));
}

#[test]
fn explicit_blocks() {
    let model = sample::model();
    let finding = BlockFinding::Explicit(sample::partition(&model));
    let report = solve_blocks(&model, &finding, &Settings::default()).unwrap();
    assert_optimal_sample(&report);
}

#[test]
fn heuristic_blocks() {
    let model = sample::model();
    let finding = BlockFinding::Heuristic { target_blocks: 2 };
    assert_eq!(finding.resolve(&model).unwrap(), sample::partition(&model));

    let report = solve_blocks(&model, &finding, &Settings::default()).unwrap();
    assert_optimal_sample(&report);
}

#[test]
fn monolithic() {
    let model = sample::model();
    let report = solve_mip(&model, &Settings::default());
    assert_optimal_sample(&report);
    assert_eq!(report.termination(), Termination::Completed);
}

#[test]
fn relaxed_blocks() {
    let model = sample::model();
    let settings = Settings::default().with_block_integrality(false);
    let finding = BlockFinding::Explicit(sample::partition(&model));
    let report = solve_blocks(&model, &finding, &settings).unwrap();
    assert_optimal_sample(&report);
}

#[test]
fn root_infeasible() {
    // Each block can contribute at most 2 to the covering row
    let model = sample::model();
    let mut rhs = (0..model.nr_rows()).map(|i| model.rhs(i)).collect::<Vec<_>>();
    rhs[0] = 5_f64;
    let infeasible = rebuild(&model, rhs);

    let engine = BranchAndPriceEngine::new(&infeasible, sample::partition(&infeasible), Settings::default())
        .unwrap();
    let report = engine.solve(&mut NoOpMonitor);
    assert_eq!(report.status(), SolveStatus::Infeasible);
    assert!(!report.has_solution());
    assert!(engine.incumbent().snapshot().is_none());
}

#[test]
fn deterministic() {
    let model = sample::model();
    let solve = || {
        BranchAndPriceEngine::new(&model, sample::partition(&model), Settings::default())
            .unwrap()
            .solve(&mut NoOpMonitor)
    };
    let first = solve();
    let second = solve();

    assert_eq!(first.status(), second.status());
    assert_eq!(first.objective_value(), second.objective_value());
    assert_eq!(first.primal(), second.primal());
    assert_eq!(first.statistics().nodes_processed, second.statistics().nodes_processed);
}

#[test]
fn bounds_never_improve_on_parent() {
    #[derive(Default)]
    struct Bounds(Vec<NodeEvent>);

    impl SearchMonitor for Bounds {
        fn on_node_processed(&mut self, event: &NodeEvent) {
            self.0.push(*event);
        }
    }

    let model = sample::model();
    let engine = BranchAndPriceEngine::new(&model, sample::partition(&model), Settings::default()).unwrap();
    let mut recorded = Bounds::default();
    let report = engine.solve(&mut recorded);

    assert_eq!(report.status(), SolveStatus::Optimal);
    assert!(!recorded.0.is_empty());
    for event in recorded.0.iter().filter(|event| !event.bound.is_nan()) {
        // Minimization: a child bound is at least the bound of its parent
        assert!(event.bound >= event.parent_bound - 1e-9);
    }
}

#[test]
fn linking_row_in_one_block() {
    // A row in block 0 that only touches block 1 is allowed
    let model = sample::model();
    let partition = BlockPartition::from_explicit(&model, vec![0, 0, 1, 2, 2], vec![1, 1, 1, 2, 2, 2])
        .unwrap();
    assert_eq!(partition.linking_rows(), vec![0, 1]);

    let report = solve_blocks(&model, &BlockFinding::Explicit(partition), &Settings::default()).unwrap();
    assert_optimal_sample(&report);
}

#[test]
fn maximize_knapsack() {
    // maximize 5 x1 + 4 x2 + 3 x3 s.t. 2 x1 + 3 x2 + x3 <= 5, 4 x1 + x2 + 2 x3 <= 11, x integer in [0, 3]
    let model = SparseModel::build(
        2, 3,
        Objective::Maximize,
        vec![5_f64, 4_f64, 3_f64],
        vec![5_f64, 11_f64],
        vec![ConstraintType::LessEqual; 2],
        SparseColumns::new(
            vec![0, 2, 4, 6],
            vec![0, 1, 0, 1, 0, 1],
            vec![2_f64, 4_f64, 3_f64, 1_f64, 1_f64, 2_f64],
        ),
        Bounds { lower: vec![0_f64; 3], upper: vec![3_f64; 3] },
        vec![VariableType::Integer; 3],
    ).unwrap();

    let report = solve_mip(&model, &Settings::default());
    assert_eq!(report.status(), SolveStatus::Optimal);
    // x = (1, 0, 3) gives 14, (2, 0, 1) gives 13
    assert!((report.objective_value() - 14_f64).abs() < 1e-6);
    assert!(report.best_bound() >= report.objective_value() - 1e-6);
}

fn rebuild(model: &SparseModel, rhs: Vec<f64>) -> SparseModel {
    let mut column_start = vec![0];
    let mut row_index = Vec::new();
    let mut value = Vec::new();
    for j in 0..model.nr_columns() {
        for (i, v) in model.column(j) {
            row_index.push(i);
            value.push(v);
        }
        column_start.push(row_index.len());
    }

    SparseModel::build(
        model.nr_rows(), model.nr_columns(),
        model.direction(),
        model.objective().to_vec(),
        rhs,
        (0..model.nr_rows()).map(|i| model.constraint_type(i)).collect(),
        SparseColumns::new(column_start, row_index, value),
        Bounds {
            lower: (0..model.nr_columns()).map(|j| model.lower_bound(j)).collect(),
            upper: (0..model.nr_columns()).map(|j| model.upper_bound(j)).collect(),
        },
        (0..model.nr_columns()).map(|j| model.variable_type(j)).collect(),
    ).unwrap()
}

#[test]
fn gap_left_by_loose_tolerance() {
    // maximize 10 x1 + 7 x2 + 3 x3 s.t. 4 x1 + 3 x2 + 2 x3 <= 7.5, each column in its own block
    let model = SparseModel::build(
        1, 3,
        Objective::Maximize,
        vec![10_f64, 7_f64, 3_f64],
        vec![7.5],
        vec![ConstraintType::LessEqual],
        SparseColumns::new(vec![0, 1, 2, 3], vec![0, 0, 0], vec![4_f64, 3_f64, 2_f64]),
        Bounds { lower: vec![0_f64; 3], upper: vec![1_f64; 3] },
        vec![VariableType::Binary; 3],
    ).unwrap();
    let partition = BlockPartition::from_explicit(&model, vec![0], vec![1, 2, 3]).unwrap();
    let settings = Settings::default().with_block_integrality(false).with_gap_tolerance(0.5);

    let report = solve_blocks(&model, &BlockFinding::Explicit(partition), &settings).unwrap();
    assert_eq!(report.status(), SolveStatus::Optimal);
    assert_eq!(report.termination(), Termination::GapClosed);
    assert!(model.is_row_satisfied(0, report.primal(), 1e-9));
    assert!(report.bound_gap() > 0_f64);
    assert_eq!(report.bound_gap(), (report.objective_value() - report.best_bound()).abs());
}
