//! Property-based tests: models keep what they were built from, partitions found by the heuristic
//! are valid, and the solve routes agree with enumeration on small binary programs.
use proptest::prelude::*;

use relp_bnp::algorithm::{solve_blocks, solve_mip};
use relp_bnp::data::linear_program::elements::{ConstraintType, Objective, VariableType};
use relp_bnp::data::linear_program::model::{Bounds, SparseModel};
use relp_bnp::data::linear_program::partition::{BlockFinding, BlockPartition, LINKING_BLOCK};
use relp_bnp::data::linear_program::solution::SolveStatus;
use relp_bnp::settings::Settings;

use crate::from_dense_rows;

/// A packing program: maximize over binary columns with nonnegative `<=` rows.
fn packing(costs: Vec<u8>, rows: Vec<(Vec<u8>, u8)>) -> SparseModel {
    let nr_columns = costs.len();
    let rows = rows.into_iter()
        .map(|(coefficients, rhs)| {
            let coefficients = coefficients.into_iter().take(nr_columns).map(f64::from).collect();
            (coefficients, ConstraintType::LessEqual, f64::from(rhs))
        })
        .collect::<Vec<_>>();

    from_dense_rows(
        Objective::Maximize,
        costs.into_iter().map(f64::from).collect(),
        &rows,
        Bounds { lower: vec![0_f64; nr_columns], upper: vec![1_f64; nr_columns] },
        vec![VariableType::Binary; nr_columns],
    )
}

/// Best objective value over all binary vectors.
fn enumerate(model: &SparseModel) -> f64 {
    let n = model.nr_columns();
    (0..1_u32 << n)
        .map(|mask| (0..n).map(|j| f64::from((mask >> j) & 1)).collect::<Vec<_>>())
        .filter(|x| (0..model.nr_rows()).all(|i| model.is_row_satisfied(i, x, 1e-9)))
        .map(|x| model.objective_value(&x))
        .fold(f64::NEG_INFINITY, f64::max)
}

fn packing_strategy() -> impl Strategy<Value = SparseModel> {
    (1_usize..=6).prop_flat_map(|n| {
        (
            prop::collection::vec(0_u8..6, n),
            prop::collection::vec((prop::collection::vec(0_u8..4, n), 1_u8..7), 1..=4),
        )
            .prop_map(|(costs, rows)| packing(costs, rows))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn build_round_trips(
        (coefficients, nr_columns) in (1_usize..6, 1_usize..6).prop_flat_map(|(m, n)| {
            (prop::collection::vec(prop::collection::vec(-3_i8..4, n), m), Just(n))
        }),
        maximize in any::<bool>(),
    ) {
        let direction = if maximize { Objective::Maximize } else { Objective::Minimize };
        let types = [ConstraintType::LessEqual, ConstraintType::GreaterEqual, ConstraintType::Equal];
        let rows = coefficients.iter()
            .enumerate()
            .map(|(i, row)| (row.iter().map(|&v| f64::from(v)).collect::<Vec<_>>(), types[i % 3], i as f64))
            .collect::<Vec<_>>();
        let objective = (0..nr_columns).map(|j| j as f64 - 2_f64).collect::<Vec<_>>();
        let lower = (0..nr_columns).map(|j| -(j as f64)).collect::<Vec<_>>();
        let upper = (0..nr_columns).map(|j| if j % 2 == 0 { f64::INFINITY } else { j as f64 }).collect::<Vec<_>>();

        let model = from_dense_rows(
            direction,
            objective.clone(),
            &rows,
            Bounds { lower: lower.clone(), upper: upper.clone() },
            vec![VariableType::Integer; nr_columns],
        );

        prop_assert_eq!(model.nr_rows(), rows.len());
        prop_assert_eq!(model.nr_columns(), nr_columns);
        prop_assert_eq!(model.direction(), direction);
        prop_assert_eq!(model.objective(), objective.as_slice());
        for (i, (row, constraint_type, rhs)) in rows.iter().enumerate() {
            prop_assert_eq!(model.constraint_type(i), *constraint_type);
            prop_assert_eq!(model.rhs(i), *rhs);
            for (j, &value) in row.iter().enumerate() {
                prop_assert_eq!(model.coefficient(i, j), value);
            }
        }
        for j in 0..nr_columns {
            prop_assert_eq!(model.lower_bound(j), lower[j]);
            prop_assert_eq!(model.upper_bound(j), upper[j]);
            prop_assert_eq!(model.variable_type(j), VariableType::Integer);
        }
        let nr_non_zeros = coefficients.iter().flatten().filter(|&&v| v != 0).count();
        prop_assert_eq!(model.nr_non_zeros(), nr_non_zeros);
    }

    #[test]
    fn heuristic_partition_is_valid(model in packing_strategy(), target in 1_usize..4) {
        let partition = BlockPartition::from_heuristic(&model, target).unwrap();
        prop_assert!(partition.check_fits(&model).is_ok());
        prop_assert!(partition.nr_blocks() >= 1);
        prop_assert!(partition.nr_blocks() <= target.max(1));
        for j in 0..model.nr_columns() {
            prop_assert_ne!(partition.block_of_column(j), LINKING_BLOCK);
        }
        for i in 0..model.nr_rows() {
            let block = partition.block_of_row(i);
            if block != LINKING_BLOCK {
                for &j in model.row_columns(i) {
                    prop_assert_eq!(partition.block_of_column(j), block);
                }
            }
        }

        // Same model, same partition
        prop_assert_eq!(BlockPartition::from_heuristic(&model, target).unwrap(), partition);
    }

    #[test]
    fn branch_and_bound_matches_enumeration(model in packing_strategy()) {
        let expected = enumerate(&model);
        let report = solve_mip(&model, &Settings::default());
        prop_assert_eq!(report.status(), SolveStatus::Optimal);
        prop_assert!((report.objective_value() - expected).abs() < 1e-6);
    }

    #[test]
    fn branch_and_price_matches_enumeration(model in packing_strategy(), target in 1_usize..4) {
        let expected = enumerate(&model);
        let report = solve_blocks(&model, &BlockFinding::Heuristic { target_blocks: target }, &Settings::default())
            .unwrap();
        prop_assert_eq!(report.status(), SolveStatus::Optimal);
        prop_assert!((report.objective_value() - expected).abs() < 1e-6);
        for i in 0..model.nr_rows() {
            prop_assert!(model.is_row_satisfied(i, report.primal(), 1e-6));
        }
    }
}
