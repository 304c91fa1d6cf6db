use std::time::Duration;

use relp_bnp::algorithm::{solve_blocks, solve_mip, solve_relaxation};
use relp_bnp::algorithm::branch_and_price::BranchAndPriceEngine;
use relp_bnp::algorithm::branch_and_price::monitor::{CompositeMonitor, LogMonitor, NodeEvent, SearchMonitor};
use relp_bnp::algorithm::interrupt::StopFlag;
use relp_bnp::data::linear_program::elements::{ConstraintType, Objective, VariableType};
use relp_bnp::data::linear_program::model::{Bounds, SparseColumns, SparseModel};
use relp_bnp::data::linear_program::partition::{BlockFinding, BlockPartition};
use relp_bnp::data::linear_program::solution::{SolveStatus, Termination};
use relp_bnp::error::Error;
use relp_bnp::settings::Settings;

use crate::from_dense_rows;

/// Two blocks of three binary columns with a covering row, optimum 3.
fn covering() -> SparseModel {
    from_dense_rows(
        Objective::Minimize,
        vec![1_f64; 6],
        &[
            (vec![1_f64; 6], ConstraintType::GreaterEqual, 3_f64),
            (vec![1_f64, 1_f64, 0_f64, 0_f64, 0_f64, 0_f64], ConstraintType::LessEqual, 1_f64),
            (vec![0_f64, 1_f64, 1_f64, 0_f64, 0_f64, 0_f64], ConstraintType::LessEqual, 1_f64),
            (vec![0_f64, 0_f64, 0_f64, 1_f64, 1_f64, 1_f64], ConstraintType::LessEqual, 2_f64),
            (vec![0_f64, 0_f64, 0_f64, 1_f64, 0_f64, 1_f64], ConstraintType::LessEqual, 1_f64),
        ],
        Bounds { lower: vec![0_f64; 6], upper: vec![1_f64; 6] },
        vec![VariableType::Binary; 6],
    )
}

#[test]
fn relaxation() {
    // maximize 3 x + 2 y s.t. x + y <= 4, x + 3 y <= 6, x <= 3
    let model = from_dense_rows(
        Objective::Maximize,
        vec![3_f64, 2_f64],
        &[
            (vec![1_f64, 1_f64], ConstraintType::LessEqual, 4_f64),
            (vec![1_f64, 3_f64], ConstraintType::LessEqual, 6_f64),
        ],
        Bounds { lower: vec![0_f64; 2], upper: vec![3_f64, f64::INFINITY] },
        vec![VariableType::Continuous; 2],
    );

    let report = solve_relaxation(&model, &Settings::default());
    assert_eq!(report.status(), SolveStatus::Optimal);
    assert!((report.objective_value() - 11_f64).abs() < 1e-9);
    assert!((report.primal()[0] - 3_f64).abs() < 1e-9);
    assert!((report.primal()[1] - 1_f64).abs() < 1e-9);
}

#[test]
fn equality_rows_and_free_columns() {
    let constraint_types = ['E', 'G', 'E', 'G'].into_iter()
        .map(ConstraintType::try_from)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let model = SparseModel::build(
        4, 4,
        Objective::try_from(1).unwrap(),
        vec![1_f64; 4],
        vec![20_f64, 20_f64, 40_f64, 10_f64],
        constraint_types,
        SparseColumns::new(
            vec![0, 2, 5, 7, 9],
            vec![0, 2, 1, 2, 3, 2, 3, 0, 1],
            vec![3_f64, 4_f64, 6_f64, 5_f64, 7_f64, 8_f64, 1_f64, 2_f64, 9_f64],
        ),
        Bounds {
            lower: vec![2_f64, 1_f64, f64::NEG_INFINITY, f64::NEG_INFINITY],
            upper: vec![5_f64, f64::INFINITY, 10_f64, f64::INFINITY],
        },
        vec![VariableType::Continuous; 4],
    ).unwrap();

    let report = solve_relaxation(&model, &Settings::default());
    assert_eq!(report.status(), SolveStatus::Optimal);
    assert!((report.objective_value() - 10.44118).abs() < 1e-4);
    let expected = [5_f64, 1.17647, 1.76471, 2.5];
    for (value, expected) in report.primal().iter().zip(expected) {
        assert!((value - expected).abs() < 1e-4, "{} != {}", value, expected);
    }
}

#[test]
fn unbounded() {
    let model = from_dense_rows(
        Objective::Maximize,
        vec![1_f64, 1_f64],
        &[(vec![1_f64, -1_f64], ConstraintType::LessEqual, 1_f64)],
        Bounds::nonnegative(2),
        vec![VariableType::Integer; 2],
    );

    assert_eq!(solve_relaxation(&model, &Settings::default()).status(), SolveStatus::Unbounded);
    let report = solve_mip(&model, &Settings::default());
    assert_eq!(report.status(), SolveStatus::Unbounded);
    assert_eq!(report.termination(), Termination::Unbounded);
}

#[test]
fn relaxation_is_a_bound() {
    let model = covering();
    let relaxed = solve_relaxation(&model, &Settings::default());
    let integral = solve_mip(&model, &Settings::default());

    assert_eq!(relaxed.status(), SolveStatus::Optimal);
    assert_eq!(integral.status(), SolveStatus::Optimal);
    assert!(relaxed.objective_value() <= integral.objective_value() + 1e-9);
    assert!((integral.objective_value() - 3_f64).abs() < 1e-6);
}

#[test]
fn blocks() {
    let model = covering();
    let settings = Settings::default().with_log_frequency(1);
    for finding in [
        BlockFinding::Heuristic { target_blocks: 2 },
        BlockFinding::Heuristic { target_blocks: 1 },
        BlockFinding::Explicit(BlockPartition::single_block(&model)),
    ] {
        let report = solve_blocks(&model, &finding, &settings).unwrap();
        assert_eq!(report.status(), SolveStatus::Optimal);
        assert!((report.objective_value() - 3_f64).abs() < 1e-6);
        assert_eq!(report.primal().len(), 6);
    }
}

#[test]
fn invalid_partition() {
    let model = covering();
    let finding = BlockFinding::Heuristic { target_blocks: 0 };
    assert!(matches!(solve_blocks(&model, &finding, &Settings::default()), Err(Error::InvalidPartition(_))));

    // Row 1 references column 1, which is in block 2
    let result = BlockPartition::from_explicit(&model, vec![0, 1, 2, 2, 2], vec![1, 2, 2, 2, 2, 2]);
    assert!(matches!(result, Err(Error::InvalidPartition(_))));
}

#[test]
fn time_limit() {
    let model = covering();
    let settings = Settings::default().with_time_limit(Duration::ZERO);
    let report = solve_mip(&model, &settings);

    assert_eq!(report.termination(), Termination::TimeLimit);
    assert_eq!(report.status(), SolveStatus::IterationLimit);
    assert!(!report.has_solution());
}

/// Raises a stop flag once a number of nodes was processed.
struct StopAfter {
    flag: StopFlag,
    remaining: usize,
}

impl SearchMonitor for StopAfter {
    fn on_node_processed(&mut self, _event: &NodeEvent) {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.flag.raise();
        }
    }
}

#[test]
fn interrupted() {
    let model = covering();
    let partition = BlockPartition::from_heuristic(&model, 2).unwrap();
    let engine = BranchAndPriceEngine::new(&model, partition, Settings::default()).unwrap();
    let mut stop = StopAfter { flag: engine.stop_flag(), remaining: 1 };
    let mut log = LogMonitor::new(1);
    let report = engine.solve(&mut CompositeMonitor::new().with(&mut stop).with(&mut log));

    assert_eq!(report.termination(), Termination::Interrupted);
    assert_eq!(report.statistics().nodes_processed, 1);
    assert!(report.best_bound() <= 3_f64 + 1e-6);
}
