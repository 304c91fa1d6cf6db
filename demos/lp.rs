//! # A linear program with mixed row types and free variables
//!
//! minimize x1 + x2 + x3 + x4
//! s.t.     3 x1                +   2 x4  = 20
//!                 6 x2         +   9 x4 >= 20
//!          4 x1 + 5 x2 + 8 x3            = 40
//!                 7 x2 +   x3           >= 10
//!
//!          2 <= x1 <= 5, 1 <= x2, x3 <= 10, x4 free
use relp_bnp::algorithm::solve_relaxation;
use relp_bnp::data::linear_program::elements::{ConstraintType, Objective, VariableType};
use relp_bnp::data::linear_program::model::{Bounds, SparseColumns, SparseModel};
use relp_bnp::error::Result;
use relp_bnp::settings::Settings;

fn main() -> Result<()> {
    env_logger::init();

    let constraint_types = ['E', 'G', 'E', 'G'].into_iter()
        .map(ConstraintType::try_from)
        .collect::<Result<Vec<_>>>()?;

    println!("Loading LP data...");
    let model = SparseModel::build(
        4, 4,
        Objective::try_from(1)?,
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
    )?;

    println!("Solving the model...");
    let report = solve_relaxation(&model, &Settings::default());
    if !report.has_solution() {
        println!("{}", report);
        return Ok(());
    }

    println!("Objective is: {:.5}", report.objective_value());
    println!("Primal solution is:");
    for (j, value) in report.primal().iter().enumerate() {
        println!("{:.5} {}", value, model.variable_type(j));
    }

    Ok(())
}
