//! # Dense tableau with bounded variables
//!
//! Every row `i` of a `LinearProgram` gets a slack `s_i` and an artificial `r_i`:
//!
//! `a_i x + s_i + sigma_i r_i = b_i`
//!
//! The slack bounds encode the constraint type (`[0, inf)` for `<=`, `(-inf, 0]` for `>=` and
//! `[0, 0]` for `=`), and `sigma_i` is the sign of the residual `b_i - a_i x` at the initial values
//! of the structural variables. The artificials form the initial basis at nonnegative values.
//!
//! Columns are laid out as all structural variables, then all slacks, then all artificials. The
//! tableau stores `B^-1 A` and `B^-1 b` explicitly; nonbasic variables sit at one of their bounds,
//! or at zero when they are free.
use std::fmt;
use std::ops::Range;

use cumsum::cumsum_array_owned;
use enum_map::{Enum, EnumMap, enum_map};

use crate::algorithm::simplex::LinearProgram;
use crate::data::linear_algebra::EPSILON;
use crate::data::linear_program::elements::{BoundDirection, ConstraintType};

/// Pivots smaller than this in absolute value are rejected.
const PIVOT_TOLERANCE: f64 = 1e-9;
/// Relative costs smaller than this in absolute value are treated as zero.
const COST_TOLERANCE: f64 = 1e-9;
/// Artificials are only pivoted out of the basis on a value at least this large.
const DRIVE_OUT_TOLERANCE: f64 = 1e-7;

/// The groups of columns in the tableau.
#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnType {
    Structural,
    Slack,
    Artificial,
}

/// Result of a ratio test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Step {
    /// The entering variable reaches its opposite bound before any basic variable hits a bound.
    Flip { length: f64 },
    /// The basic variable of `row` leaves the basis at the indicated bound.
    Pivot { row: usize, length: f64, leaving_to: BoundDirection },
    /// Nothing limits the step.
    Unbounded,
}

impl Step {
    /// Distance the entering variable moves.
    pub(crate) fn length(&self) -> f64 {
        match *self {
            Step::Flip { length } | Step::Pivot { length, .. } => length,
            Step::Unbounded => f64::INFINITY,
        }
    }
}

pub(crate) struct Tableau {
    /// `B^-1 A`, one dense row per constraint.
    rows: Vec<Vec<f64>>,
    /// `B^-1 b`.
    rhs: Vec<f64>,
    /// Column that is basic in each row.
    basis: Vec<usize>,
    /// Row in which a column is basic, if any.
    basis_row: Vec<Option<usize>>,
    values: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    column_group_end: EnumMap<ColumnType, usize>,
}

impl Tableau {
    /// Create a tableau with the artificial variables as the basis.
    pub(crate) fn new(problem: &LinearProgram) -> Self {
        let nr_rows = problem.nr_rows();
        let nr_structural = problem.nr_columns();

        let cumulative = cumsum_array_owned([nr_structural, nr_rows, nr_rows]);
        let column_group_end = enum_map! {
            ColumnType::Structural => cumulative[0],
            ColumnType::Slack      => cumulative[1],
            ColumnType::Artificial => cumulative[2],
        };
        let nr_columns = column_group_end[ColumnType::Artificial];

        let mut lower = vec![0_f64; nr_columns];
        let mut upper = vec![0_f64; nr_columns];
        let mut values = vec![0_f64; nr_columns];
        for j in 0..nr_structural {
            lower[j] = problem.lower[j];
            upper[j] = problem.upper[j];
            values[j] = initial_value(lower[j], upper[j]);
        }

        let mut rows = vec![vec![0_f64; nr_columns]; nr_rows];
        let mut residual = problem.rhs.clone();
        for (j, column) in problem.columns.iter().enumerate() {
            for &(i, value) in column {
                rows[i][j] = value;
                residual[i] -= value * values[j];
            }
        }

        let slack_start = column_group_end[ColumnType::Structural];
        let artificial_start = column_group_end[ColumnType::Slack];
        let mut rhs = Vec::with_capacity(nr_rows);
        let mut basis = Vec::with_capacity(nr_rows);
        let mut basis_row = vec![None; nr_columns];
        for (i, row) in rows.iter_mut().enumerate() {
            let slack = slack_start + i;
            row[slack] = 1_f64;
            (lower[slack], upper[slack]) = match problem.constraint_types[i] {
                ConstraintType::LessEqual => (0_f64, f64::INFINITY),
                ConstraintType::GreaterEqual => (f64::NEG_INFINITY, 0_f64),
                ConstraintType::Equal => (0_f64, 0_f64),
            };

            let sign = if residual[i] < 0_f64 { -1_f64 } else { 1_f64 };
            for value in row.iter_mut() {
                *value *= sign;
            }
            rhs.push(sign * problem.rhs[i]);

            let artificial = artificial_start + i;
            row[artificial] = 1_f64;
            (lower[artificial], upper[artificial]) = (0_f64, f64::INFINITY);
            values[artificial] = residual[i].abs();
            basis.push(artificial);
            basis_row[artificial] = Some(i);
        }

        Self { rows, rhs, basis, basis_row, values, lower, upper, column_group_end }
    }

    /// Costs of the first phase: the sum of the artificial variables.
    pub(crate) fn phase_one_cost(&self) -> Vec<f64> {
        let mut cost = vec![0_f64; self.nr_columns()];
        for j in self.group(ColumnType::Artificial) {
            cost[j] = 1_f64;
        }
        cost
    }

    /// Extend costs of the structural variables with zeros for the slacks and artificials.
    pub(crate) fn extend_cost(&self, structural: impl IntoIterator<Item=f64>) -> Vec<f64> {
        let mut cost = structural.into_iter().collect::<Vec<_>>();
        debug_assert_eq!(cost.len(), self.column_group_end[ColumnType::Structural]);
        cost.resize(self.nr_columns(), 0_f64);
        cost
    }

    /// Relative cost of every column, zero for basic columns.
    pub(crate) fn relative_costs(&self, cost: &[f64]) -> Vec<f64> {
        debug_assert_eq!(cost.len(), self.nr_columns());

        let mut relative = cost.to_vec();
        for (row, &basic) in self.rows.iter().zip(&self.basis) {
            let basic_cost = cost[basic];
            if basic_cost != 0_f64 {
                for (relative_cost, value) in relative.iter_mut().zip(row) {
                    *relative_cost -= basic_cost * value;
                }
            }
        }
        for &basic in &self.basis {
            relative[basic] = 0_f64;
        }

        relative
    }

    /// Whether moving nonbasic column `j` improves an objective in which it has relative cost
    /// `relative_cost`.
    pub(crate) fn is_profitable(&self, j: usize, relative_cost: f64) -> bool {
        if self.is_in_basis(j) || self.upper[j] - self.lower[j] <= EPSILON {
            return false;
        }

        let value = self.values[j];
        (relative_cost < -COST_TOLERANCE && value < self.upper[j] - EPSILON)
            || (relative_cost > COST_TOLERANCE && value > self.lower[j] + EPSILON)
    }

    /// Ratio test for nonbasic column `j` moving towards its `towards` bound.
    ///
    /// # Arguments
    ///
    /// * `lowest_index_leaving`: Break ties between leaving candidates by the lowest column index,
    /// instead of by the largest pivot.
    pub(crate) fn select_primal_step(
        &self,
        j: usize,
        towards: BoundDirection,
        lowest_index_leaving: bool,
    ) -> Step {
        debug_assert!(!self.is_in_basis(j));

        let sign = direction_sign(towards);
        let mut length = match towards {
            BoundDirection::Upper => self.upper[j] - self.values[j],
            BoundDirection::Lower => self.values[j] - self.lower[j],
        };
        let mut leaving: Option<(usize, BoundDirection, f64)> = None;

        for (i, row) in self.rows.iter().enumerate() {
            // The basic variable of this row changes by `-alpha` per unit step
            let alpha = sign * row[j];
            if alpha.abs() <= PIVOT_TOLERANCE {
                continue;
            }

            let basic = self.basis[i];
            let (limit, bound) = if alpha > 0_f64 {
                ((self.values[basic] - self.lower[basic]) / alpha, BoundDirection::Lower)
            } else {
                ((self.upper[basic] - self.values[basic]) / -alpha, BoundDirection::Upper)
            };
            if !limit.is_finite() {
                continue;
            }
            let limit = limit.max(0_f64);

            let replace = if limit < length - EPSILON {
                true
            } else if limit <= length + EPSILON {
                match leaving {
                    // On a tie with the bound of the entering variable, flipping is cheaper
                    None => false,
                    Some((row, _, existing_alpha)) => if lowest_index_leaving {
                        basic < self.basis[row]
                    } else {
                        alpha.abs() > existing_alpha.abs()
                    },
                }
            } else {
                false
            };

            if replace {
                length = length.min(limit);
                leaving = Some((i, bound, alpha));
            }
        }

        match leaving {
            _ if length.is_infinite() || length.is_nan() => Step::Unbounded,
            None => Step::Flip { length },
            Some((row, leaving_to, _)) => Step::Pivot { row, length, leaving_to },
        }
    }

    /// Move nonbasic column `j` according to a step computed by `select_primal_step`.
    ///
    /// # Return value
    ///
    /// An error message if the pivot was numerically unacceptable.
    pub(crate) fn take_step(
        &mut self,
        j: usize,
        towards: BoundDirection,
        step: Step,
    ) -> Result<(), String> {
        let delta = direction_sign(towards) * step.length();
        if !delta.is_finite() {
            return Err(format!("step of length {delta} for column {j}"));
        }

        self.values[j] += delta;
        for (row, &basic) in self.rows.iter().zip(&self.basis) {
            self.values[basic] -= delta * row[j];
        }

        match step {
            Step::Flip { .. } => {
                self.values[j] = self.bound(j, towards);
                Ok(())
            },
            Step::Pivot { row, leaving_to, .. } => {
                let leaving = self.basis[row];
                self.values[leaving] = self.bound(leaving, leaving_to);
                self.pivot(row, j)
            },
            Step::Unbounded => Err(format!("unbounded step for column {j}")),
        }
    }

    /// Bring column `j` into the basis in row `r`.
    fn pivot(&mut self, r: usize, j: usize) -> Result<(), String> {
        let pivot_value = self.rows[r][j];
        if !pivot_value.is_finite() || pivot_value.abs() < PIVOT_TOLERANCE {
            return Err(format!("unstable pivot {pivot_value:e} in row {r}, column {j}"));
        }

        let pivot_row = self.rows[r].iter().map(|value| value / pivot_value).collect::<Vec<_>>();
        let pivot_rhs = self.rhs[r] / pivot_value;
        for (i, (row, rhs)) in self.rows.iter_mut().zip(self.rhs.iter_mut()).enumerate() {
            let factor = row[j];
            if i == r || factor == 0_f64 {
                continue;
            }

            for (value, pivot_row_value) in row.iter_mut().zip(&pivot_row) {
                *value -= factor * pivot_row_value;
            }
            row[j] = 0_f64;
            *rhs -= factor * pivot_rhs;
        }
        self.rows[r] = pivot_row;
        self.rows[r][j] = 1_f64;
        self.rhs[r] = pivot_rhs;

        let leaving = self.basis[r];
        self.basis_row[leaving] = None;
        self.basis[r] = j;
        self.basis_row[j] = Some(r);

        Ok(())
    }

    /// Prepare for the second phase, once the first phase reached a zero objective.
    ///
    /// Artificial variables that are still basic are exchanged with a non artificial column where
    /// possible. Rows in which that fails are redundant; their artificial stays basic. All
    /// artificial variables are then fixed at zero.
    pub(crate) fn fix_artificials(&mut self) -> Result<(), String> {
        let artificial_start = self.column_group_end[ColumnType::Slack];
        for r in 0..self.nr_rows() {
            if self.basis[r] < artificial_start {
                continue;
            }

            let candidate = (0..artificial_start)
                .filter(|&k| !self.is_in_basis(k))
                .filter(|&k| self.rows[r][k].abs() > DRIVE_OUT_TOLERANCE)
                .max_by(|&a, &b| self.rows[r][a].abs().total_cmp(&self.rows[r][b].abs()));
            if let Some(entering) = candidate {
                let leaving = self.basis[r];
                self.values[leaving] = 0_f64;
                self.pivot(r, entering)?;
            }
        }

        for j in self.group(ColumnType::Artificial) {
            self.lower[j] = 0_f64;
            self.upper[j] = 0_f64;
            if !self.is_in_basis(j) {
                self.values[j] = 0_f64;
            }
        }
        self.recompute_basic_values();

        Ok(())
    }

    /// Recompute the values of the basic variables from `B^-1 b` and the nonbasic values.
    ///
    /// Removes the drift that accumulates when values are only updated incrementally.
    pub(crate) fn recompute_basic_values(&mut self) {
        for (r, row) in self.rows.iter().enumerate() {
            let basic = self.basis[r];
            let nonbasic_activity = row.iter()
                .zip(&self.values)
                .enumerate()
                .filter(|&(k, _)| self.basis_row[k].is_none())
                .map(|(_, (coefficient, value))| coefficient * value)
                .sum::<f64>();
            self.values[basic] = self.rhs[r] - nonbasic_activity;
        }
    }

    /// Objective value of the current solution under `cost`.
    pub(crate) fn objective_value(&self, cost: &[f64]) -> f64 {
        cost.iter().zip(&self.values).map(|(c, x)| c * x).sum()
    }

    /// Values of the structural variables.
    pub(crate) fn structural_values(&self) -> Vec<f64> {
        self.values[self.group(ColumnType::Structural)].to_vec()
    }

    pub(crate) fn is_in_basis(&self, j: usize) -> bool {
        self.basis_row[j].is_some()
    }

    pub(crate) fn nr_rows(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn nr_columns(&self) -> usize {
        self.column_group_end[ColumnType::Artificial]
    }

    fn group(&self, column_type: ColumnType) -> Range<usize> {
        let start = match column_type {
            ColumnType::Structural => 0,
            ColumnType::Slack => self.column_group_end[ColumnType::Structural],
            ColumnType::Artificial => self.column_group_end[ColumnType::Slack],
        };
        start..self.column_group_end[column_type]
    }

    fn bound(&self, j: usize, direction: BoundDirection) -> f64 {
        match direction {
            BoundDirection::Lower => self.lower[j],
            BoundDirection::Upper => self.upper[j],
        }
    }
}

/// Starting value of a nonbasic variable.
fn initial_value(lower: f64, upper: f64) -> f64 {
    if lower.is_finite() {
        lower
    } else if upper.is_finite() {
        upper
    } else {
        0_f64
    }
}

fn direction_sign(direction: BoundDirection) -> f64 {
    match direction {
        BoundDirection::Lower => -1_f64,
        BoundDirection::Upper => 1_f64,
    }
}

impl fmt::Debug for Tableau {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tableau with {} rows and {} columns", self.nr_rows(), self.nr_columns())?;
        write!(f, "{:>6}", "")?;
        for j in 0..self.nr_columns() {
            write!(f, "{:>10}", j)?;
        }
        writeln!(f, "{:>12}", "rhs")?;
        for (r, row) in self.rows.iter().enumerate() {
            write!(f, "{:>6}", self.basis[r])?;
            for value in row {
                write!(f, "{:>10.4}", value)?;
            }
            writeln!(f, "{:>12.4}", self.rhs[r])?;
        }
        write!(f, "{:>6}", "x")?;
        for value in &self.values {
            write!(f, "{:>10.4}", value)?;
        }
        writeln!(f)
    }
}
