//! # A binary program, solved as a whole
//!
//! minimize x1 + x2 + x3 + x4 + x5 + x6
//! s.t.     x1 + x2 + x3 + x4 + x5 + x6 >= 3
//!          x1 + x2                     <= 1
//!               x2 + x3                <= 1
//!                         x4 + x5 + x6 <= 2
//!                         x4      + x6 <= 1
//!          x binary
//!
//! Every improved solution is printed while the search runs.
use relp_bnp::algorithm::branch_and_price::BranchAndPriceEngine;
use relp_bnp::algorithm::branch_and_price::monitor::{CompositeMonitor, LogMonitor, SearchMonitor};
use relp_bnp::data::linear_program::elements::{ConstraintType, Objective, VariableType};
use relp_bnp::data::linear_program::model::{Bounds, SparseColumns, SparseModel};
use relp_bnp::data::linear_program::partition::BlockPartition;
use relp_bnp::error::Result;
use relp_bnp::settings::Settings;

/// Prints each new incumbent with the types of its variables.
struct IncumbentPrinter {
    variable_types: Vec<VariableType>,
    improvements: u64,
}

impl SearchMonitor for IncumbentPrinter {
    fn on_incumbent_improved(&mut self, objective: f64, primal: &[f64]) {
        self.improvements += 1;
        println!("Incumbent {}: objective {}", self.improvements, objective);
        for (value, variable_type) in primal.iter().zip(&self.variable_types) {
            println!("{:.5} {}", value, variable_type);
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let constraint_types = ['G', 'L', 'L', 'L', 'L'].into_iter()
        .map(ConstraintType::try_from)
        .collect::<Result<Vec<_>>>()?;
    let variable_types = ['B'; 6].into_iter()
        .map(VariableType::try_from)
        .collect::<Result<Vec<_>>>()?;

    println!("Loading LP data..");
    let model = SparseModel::build(
        5, 6,
        Objective::try_from(1)?,
        vec![1_f64; 6],
        vec![3_f64, 1_f64, 1_f64, 2_f64, 1_f64],
        constraint_types,
        SparseColumns::new(
            vec![0, 2, 5, 7, 10, 12, 15],
            vec![0, 1, 0, 1, 2, 0, 2, 0, 3, 4, 0, 3, 0, 3, 4],
            vec![1_f64; 15],
        ),
        Bounds { lower: vec![0_f64; 6], upper: vec![1_f64; 6] },
        variable_types.clone(),
    )?;

    println!("Solving the model..");
    let settings = Settings::default().with_log_frequency(1);
    let engine = BranchAndPriceEngine::new(&model, BlockPartition::single_block(&model), settings)?;
    let mut printer = IncumbentPrinter { variable_types, improvements: 0 };
    let mut log = LogMonitor::new(1);
    let report = engine.solve(&mut CompositeMonitor::new().with(&mut printer).with(&mut log));

    if !report.has_solution() {
        println!("{}", report);
        return Ok(());
    }
    println!("Objective is: {:.5}", report.objective_value());
    println!();
    println!("Primal solution is:");
    for (j, value) in report.primal().iter().enumerate() {
        println!("{:.5} {}", value, model.variable_type(j));
    }

    Ok(())
}
