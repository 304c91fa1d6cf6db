//! # Sparse models
//!
//! A `SparseModel` is a validated, immutable linear or mixed integer program. It is loaded with the
//! usual bulk-load convention of column-compressed coefficients, row types, right hand sides,
//! variable bounds and variable types. Once built it is only read: solving never changes it, and
//! changing the problem means building a new instance.
use std::fmt;

use enum_map::EnumMap;
use itertools::Itertools;

use crate::data::linear_algebra::matrix::{ColumnMajor, MajorIter, RowMajor};
use crate::data::linear_algebra::SparseTuple;
use crate::data::linear_program::elements::{ConstraintType, Objective, VariableType};
use crate::error::{Error, Result};

/// Column-compressed coefficients as handed in by a caller.
///
/// Column `j` occupies positions `column_start[j]` up to `column_start[j + 1]` of `row_index` and
/// `value`. When `column_length` is given, column `j` only occupies the first `column_length[j]` of
/// those positions, and the remainder is ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseColumns {
    /// Offsets of the columns, `nr_columns + 1` values.
    pub column_start: Vec<usize>,
    /// Optional number of used positions per column.
    pub column_length: Option<Vec<usize>>,
    /// Row index of each value.
    pub row_index: Vec<usize>,
    /// The coefficients.
    pub value: Vec<f64>,
}

impl SparseColumns {
    /// Columns without gaps between them.
    pub fn new(column_start: Vec<usize>, row_index: Vec<usize>, value: Vec<f64>) -> Self {
        Self { column_start, column_length: None, row_index, value }
    }

    /// Columns that may have unused positions after them.
    pub fn with_lengths(
        column_start: Vec<usize>,
        column_length: Vec<usize>,
        row_index: Vec<usize>,
        value: Vec<f64>,
    ) -> Self {
        Self { column_start, column_length: Some(column_length), row_index, value }
    }
}

/// Lower and upper bounds of all variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    #[allow(missing_docs)]
    pub lower: Vec<f64>,
    #[allow(missing_docs)]
    pub upper: Vec<f64>,
}

impl Bounds {
    /// Every variable nonnegative and without upper bound.
    pub fn nonnegative(nr_columns: usize) -> Self {
        Self { lower: vec![0_f64; nr_columns], upper: vec![f64::INFINITY; nr_columns] }
    }
}

/// A constrained optimization problem with a sparse constraint matrix.
///
/// Rows are constraints `a_i x (type_i) b_i`, columns are variables with bounds and a type.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseModel {
    direction: Objective,
    objective: Vec<f64>,
    objective_constant: f64,

    constraints: ColumnMajor,
    /// Derived from `constraints` once, used to iterate over rows.
    rows: RowMajor,
    constraint_types: Vec<ConstraintType>,
    rhs: Vec<f64>,

    lower: Vec<f64>,
    upper: Vec<f64>,
    variable_types: Vec<VariableType>,
}

impl SparseModel {
    /// Validate and store a model.
    ///
    /// # Arguments
    ///
    /// * `nr_rows`: Number of constraints.
    /// * `nr_columns`: Number of variables.
    /// * `direction`: Whether to minimize or maximize.
    /// * `objective`: Dense cost vector of length `nr_columns`.
    /// * `rhs`: Right hand side of each constraint.
    /// * `constraint_types`: Type of each constraint.
    /// * `columns`: The constraint coefficients, column compressed.
    /// * `bounds`: Lower and upper bounds, infinite values are allowed for absent bounds.
    /// * `variable_types`: Type of each variable.
    ///
    /// # Return value
    ///
    /// The model, or `Error::MalformedModel` describing the first inconsistency found.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        nr_rows: usize,
        nr_columns: usize,
        direction: Objective,
        objective: Vec<f64>,
        rhs: Vec<f64>,
        constraint_types: Vec<ConstraintType>,
        columns: SparseColumns,
        bounds: Bounds,
        variable_types: Vec<VariableType>,
    ) -> Result<Self> {
        check_length("objective", objective.len(), nr_columns)?;
        check_length("right hand side", rhs.len(), nr_rows)?;
        check_length("constraint types", constraint_types.len(), nr_rows)?;
        check_length("lower bounds", bounds.lower.len(), nr_columns)?;
        check_length("upper bounds", bounds.upper.len(), nr_columns)?;
        check_length("variable types", variable_types.len(), nr_columns)?;

        if let Some(j) = objective.iter().position(|c| !c.is_finite()) {
            return Err(malformed(format!("objective coefficient of column {} is not finite", j)));
        }
        if let Some(i) = rhs.iter().position(|b| !b.is_finite()) {
            return Err(malformed(format!("right hand side of row {} is not finite", i)));
        }
        check_bounds(&bounds)?;

        let constraints = compress_columns(nr_rows, nr_columns, columns)?;
        let rows = constraints.transpose();

        Ok(Self {
            direction,
            objective,
            objective_constant: 0_f64,
            constraints,
            rows,
            constraint_types,
            rhs,
            lower: bounds.lower,
            upper: bounds.upper,
            variable_types,
        })
    }

    /// Add a constant term to the objective function.
    #[must_use]
    pub fn with_objective_constant(mut self, constant: f64) -> Self {
        debug_assert!(constant.is_finite());

        self.objective_constant = constant;
        self
    }

    /// Number of constraints.
    pub fn nr_rows(&self) -> usize {
        self.rhs.len()
    }

    /// Number of variables.
    pub fn nr_columns(&self) -> usize {
        self.objective.len()
    }

    /// Number of stored constraint coefficients.
    pub fn nr_non_zeros(&self) -> usize {
        self.constraints.nr_non_zeros()
    }

    #[allow(missing_docs)]
    pub fn direction(&self) -> Objective {
        self.direction
    }

    /// The dense cost vector.
    pub fn objective(&self) -> &[f64] {
        &self.objective
    }

    /// Cost of variable `j`.
    pub fn objective_coefficient(&self, j: usize) -> f64 {
        self.objective[j]
    }

    #[allow(missing_docs)]
    pub fn objective_constant(&self) -> f64 {
        self.objective_constant
    }

    /// Objective value of a dense solution vector, including the constant.
    pub fn objective_value(&self, x: &[f64]) -> f64 {
        debug_assert_eq!(x.len(), self.nr_columns());

        self.objective_constant + self.objective.iter().zip(x).map(|(c, v)| c * v).sum::<f64>()
    }

    /// Right hand side of row `i`.
    pub fn rhs(&self, i: usize) -> f64 {
        self.rhs[i]
    }

    /// Type of row `i`.
    pub fn constraint_type(&self, i: usize) -> ConstraintType {
        self.constraint_types[i]
    }

    /// Lower bound of variable `j` as given.
    pub fn lower_bound(&self, j: usize) -> f64 {
        self.lower[j]
    }

    /// Upper bound of variable `j` as given.
    pub fn upper_bound(&self, j: usize) -> f64 {
        self.upper[j]
    }

    /// Bounds of variable `j` that the solvers should use.
    ///
    /// Binary variables are restricted to `[0, 1]` on top of their given bounds.
    pub fn effective_bounds(&self, j: usize) -> (f64, f64) {
        match self.variable_types[j] {
            VariableType::Binary => (self.lower[j].max(0_f64), self.upper[j].min(1_f64)),
            VariableType::Continuous | VariableType::Integer => (self.lower[j], self.upper[j]),
        }
    }

    /// Type of variable `j`.
    pub fn variable_type(&self, j: usize) -> VariableType {
        self.variable_types[j]
    }

    /// Coefficient of variable `j` in row `i`, zero when not stored.
    pub fn coefficient(&self, i: usize, j: usize) -> f64 {
        debug_assert!(i < self.nr_rows());
        debug_assert!(j < self.nr_columns());

        self.constraints.get(i, j)
    }

    /// All `(row, value)` tuples of column `j`, sorted by row.
    pub fn column(&self, j: usize) -> MajorIter<'_> {
        self.constraints.column(j)
    }

    /// All `(column, value)` tuples of row `i`, sorted by column.
    pub fn row(&self, i: usize) -> MajorIter<'_> {
        self.rows.row(i)
    }

    /// Column indices of the variables appearing in row `i`.
    pub fn row_columns(&self, i: usize) -> &[usize] {
        self.rows.row_columns(i)
    }

    /// The constraint matrix in column-major order.
    pub fn constraints(&self) -> &ColumnMajor {
        &self.constraints
    }

    /// Value of `a_i x` for a dense vector `x`.
    pub fn row_activity(&self, i: usize, x: &[f64]) -> f64 {
        self.rows.row_activity(i, x)
    }

    /// Whether row `i` holds for `x`, up to an absolute `tolerance`.
    pub fn is_row_satisfied(&self, i: usize, x: &[f64], tolerance: f64) -> bool {
        self.constraint_types[i].is_satisfied(self.row_activity(i, x), self.rhs[i], tolerance)
    }

    /// Number of variables of type `Binary` or `Integer`.
    pub fn nr_integer_variables(&self) -> usize {
        self.variable_types.iter().filter(|t| t.is_integer()).count()
    }

    /// Number of variables of type `Continuous`.
    pub fn nr_continuous_variables(&self) -> usize {
        self.nr_columns() - self.nr_integer_variables()
    }

    /// Number of rows of each constraint type.
    pub fn constraint_type_counts(&self) -> EnumMap<ConstraintType, usize> {
        let mut counts = EnumMap::default();
        for &constraint_type in &self.constraint_types {
            counts[constraint_type] += 1;
        }
        counts
    }
}

impl fmt::Display for SparseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts = self.constraint_type_counts();
        writeln!(f, "{:?} with {} rows ({} <=, {} >=, {} =) and {} columns ({} integer), {} nonzeros",
            self.direction,
            self.nr_rows(),
            counts[ConstraintType::LessEqual],
            counts[ConstraintType::GreaterEqual],
            counts[ConstraintType::Equal],
            self.nr_columns(),
            self.nr_integer_variables(),
            self.nr_non_zeros(),
        )
    }
}

fn malformed(message: String) -> Error {
    Error::MalformedModel(message)
}

fn check_length(name: &str, actual: usize, expected: usize) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(malformed(format!("{} has length {}, expected {}", name, actual, expected)))
    }
}

fn check_bounds(bounds: &Bounds) -> Result<()> {
    for (j, (&lower, &upper)) in bounds.lower.iter().zip(&bounds.upper).enumerate() {
        if lower.is_nan() || upper.is_nan() {
            return Err(malformed(format!("bound of column {} is not a number", j)));
        }
        if lower == f64::INFINITY || upper == f64::NEG_INFINITY {
            return Err(malformed(format!("column {} has bounds [{}, {}]", j, lower, upper)));
        }
        if lower > upper {
            return Err(malformed(format!("column {} has lower bound {} above upper bound {}", j, lower, upper)));
        }
    }

    Ok(())
}

/// Check the offsets and indices of the input columns, and compact them.
///
/// Rows are sorted within each column, duplicate rows are rejected.
fn compress_columns(nr_rows: usize, nr_columns: usize, columns: SparseColumns) -> Result<ColumnMajor> {
    let SparseColumns { column_start, column_length, row_index, value } = columns;

    check_length("column offsets", column_start.len(), nr_columns + 1)?;
    if row_index.len() != value.len() {
        return Err(malformed(format!(
            "{} row indices for {} coefficient values", row_index.len(), value.len(),
        )));
    }
    if column_start[0] != 0 {
        return Err(malformed(format!("first column offset is {}, expected 0", column_start[0])));
    }
    if let Some((j, _)) = column_start.iter().tuple_windows().find_position(|(start, end)| start > end) {
        return Err(malformed(format!("column offsets are not monotonic at column {}", j)));
    }
    if column_start[nr_columns] != value.len() {
        return Err(malformed(format!(
            "last column offset is {}, but there are {} coefficients", column_start[nr_columns], value.len(),
        )));
    }
    if let Some(lengths) = &column_length {
        check_length("column lengths", lengths.len(), nr_columns)?;
    }

    let mut compressed = Vec::with_capacity(nr_columns);
    for j in 0..nr_columns {
        let start = column_start[j];
        let end = match &column_length {
            Some(lengths) => match start.checked_add(lengths[j]) {
                Some(end) if end <= column_start[j + 1] => end,
                _ => return Err(malformed(format!(
                    "column {} has length {}, but only {} positions", j, lengths[j], column_start[j + 1] - start,
                ))),
            },
            None => column_start[j + 1],
        };

        let mut column: Vec<SparseTuple<f64>> = Vec::with_capacity(end - start);
        for position in start..end {
            let (i, v) = (row_index[position], value[position]);
            if i >= nr_rows {
                return Err(malformed(format!("row index {} in column {} is out of range", i, j)));
            }
            if !v.is_finite() {
                return Err(malformed(format!("coefficient of row {} in column {} is not finite", i, j)));
            }
            column.push((i, v));
        }
        column.sort_by_key(|&(i, _)| i);
        if let Some(((i, _), _)) = column.iter().tuple_windows().find(|((a, _), (b, _))| a == b) {
            return Err(malformed(format!("row {} appears twice in column {}", i, j)));
        }

        compressed.push(column);
    }

    Ok(ColumnMajor::from_columns(compressed, nr_rows))
}
