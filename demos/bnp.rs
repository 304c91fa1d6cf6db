//! # Branch-and-price on two blocks
//!
//! Two independent sets of binary columns, each with its own packing rows, must together cover at
//! least three units. The partition is found by the heuristic and the search is stopped from
//! another thread if it takes too long.
use std::thread;
use std::time::Duration;

use relp_bnp::algorithm::branch_and_price::BranchAndPriceEngine;
use relp_bnp::algorithm::branch_and_price::monitor::LogMonitor;
use relp_bnp::algorithm::interrupt::StopFlag;
use relp_bnp::data::linear_program::elements::{ConstraintType, Objective, VariableType};
use relp_bnp::data::linear_program::model::{Bounds, SparseColumns, SparseModel};
use relp_bnp::data::linear_program::partition::BlockPartition;
use relp_bnp::error::Result;
use relp_bnp::settings::Settings;

fn main() -> Result<()> {
    env_logger::init();

    let rows: [&[usize]; 5] = [&[0, 1, 2, 3, 4, 5], &[0, 1], &[1, 2], &[3, 4, 5], &[3, 5]];
    let mut row_index = Vec::new();
    let mut column_start = vec![0];
    for j in 0..6 {
        row_index.extend(rows.iter().enumerate().filter(|(_, row)| row.contains(&j)).map(|(i, _)| i));
        column_start.push(row_index.len());
    }
    let nnz = row_index.len();

    let model = SparseModel::build(
        5, 6,
        Objective::Minimize,
        vec![1_f64; 6],
        vec![3_f64, 1_f64, 1_f64, 2_f64, 1_f64],
        vec![
            ConstraintType::GreaterEqual,
            ConstraintType::LessEqual,
            ConstraintType::LessEqual,
            ConstraintType::LessEqual,
            ConstraintType::LessEqual,
        ],
        SparseColumns::new(column_start, row_index, vec![1_f64; nnz]),
        Bounds { lower: vec![0_f64; 6], upper: vec![1_f64; 6] },
        vec![VariableType::Binary; 6],
    )?;

    let partition = BlockPartition::from_heuristic(&model, 2)?;
    println!("{} blocks, linking rows {:?}", partition.nr_blocks(), partition.linking_rows());
    println!("Row blocks: {:?}", partition.row_blocks());
    println!("Column blocks: {:?}", partition.column_blocks());

    let stop = StopFlag::new();
    let engine = BranchAndPriceEngine::new(&model, partition, Settings::default().with_log_frequency(1))?
        .with_stop_flag(stop.clone());
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(10));
        stop.raise();
    });

    let report = engine.solve(&mut LogMonitor::new(1));
    println!("{}", report);
    println!("x = {:?}", report.primal());

    Ok(())
}
