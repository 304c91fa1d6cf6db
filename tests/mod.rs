//! # Integration tests
//!
//! Integration tests completely external from the crate. All code written in this module could be
//! written by an external user of the crate.

mod properties;
mod solve;

use relp_bnp::data::linear_program::elements::{ConstraintType, Objective, VariableType};
use relp_bnp::data::linear_program::model::{Bounds, SparseColumns, SparseModel};

/// Build a model from dense rows, leaving out the zero coefficients.
pub fn from_dense_rows(
    direction: Objective,
    objective: Vec<f64>,
    rows: &[(Vec<f64>, ConstraintType, f64)],
    bounds: Bounds,
    variable_types: Vec<VariableType>,
) -> SparseModel {
    let nr_columns = objective.len();
    let mut column_start = vec![0];
    let mut row_index = Vec::new();
    let mut value = Vec::new();
    for j in 0..nr_columns {
        for (i, (coefficients, _, _)) in rows.iter().enumerate() {
            if coefficients[j] != 0_f64 {
                row_index.push(i);
                value.push(coefficients[j]);
            }
        }
        column_start.push(row_index.len());
    }

    SparseModel::build(
        rows.len(), nr_columns,
        direction,
        objective,
        rows.iter().map(|&(_, _, rhs)| rhs).collect(),
        rows.iter().map(|&(_, constraint_type, _)| constraint_type).collect(),
        SparseColumns::new(column_start, row_index, value),
        bounds,
        variable_types,
    ).unwrap()
}
