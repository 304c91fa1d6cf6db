//! # The Simplex algorithm
//!
//! A two phase primal simplex method for linear programs with bounded variables. The first phase
//! minimizes the sum of artificial variables to find a basic feasible solution; the second phase
//! optimizes the actual objective while the artificial variables are fixed at zero.
//!
//! The most profitable column enters the basis until a run of degenerate pivots is observed. From
//! then on, Bland's rule is used, which can not cycle.
use log::{debug, trace, warn};

use crate::algorithm::OptimizationResult;
use crate::algorithm::simplex::pivot_rule::{FirstProfitable, MostProfitable, PivotRule};
use crate::algorithm::simplex::tableau::{Step, Tableau};
use crate::data::linear_algebra::{EPSILON, SparseTuple};
use crate::data::linear_program::elements::{BoundDirection, ConstraintType, Objective};
use crate::settings::Settings;

pub(crate) mod pivot_rule;
pub(crate) mod tableau;

/// Number of consecutive degenerate pivots after which the pivot rule changes to Bland's rule.
const DEGENERATE_PIVOT_LIMIT: u64 = 50;

/// A linear program in the form consumed by the simplex method.
///
/// Rows are indexed locally: the row indices in `columns` refer to positions in `rhs` and
/// `constraint_types`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearProgram {
    /// Minimize or maximize.
    pub direction: Objective,
    /// Objective coefficient of each column.
    pub cost: Vec<f64>,
    /// `(row, value)` tuples of each column.
    pub columns: Vec<Vec<SparseTuple<f64>>>,
    #[allow(missing_docs)]
    pub constraint_types: Vec<ConstraintType>,
    #[allow(missing_docs)]
    pub rhs: Vec<f64>,
    /// Lower bound of each column, may be `-inf`.
    pub lower: Vec<f64>,
    /// Upper bound of each column, may be `inf`.
    pub upper: Vec<f64>,
}

impl LinearProgram {
    #[allow(missing_docs)]
    pub fn nr_rows(&self) -> usize {
        self.rhs.len()
    }

    #[allow(missing_docs)]
    pub fn nr_columns(&self) -> usize {
        self.columns.len()
    }

    /// Objective value of `x`.
    pub fn objective_value(&self, x: &[f64]) -> f64 {
        self.cost.iter().zip(x).map(|(c, v)| c * v).sum()
    }

    /// Whether `x` satisfies all rows and bounds, up to a tolerance that is scaled with the size of
    /// the values involved.
    pub fn is_feasible(&self, x: &[f64], tolerance: f64) -> bool {
        debug_assert_eq!(x.len(), self.nr_columns());

        let within_bounds = x.iter().enumerate().all(|(j, &value)| {
            value.is_finite()
                && value >= self.lower[j] - tolerance * (1_f64 + self.lower[j].abs())
                && value <= self.upper[j] + tolerance * (1_f64 + self.upper[j].abs())
        });
        if !within_bounds {
            return false;
        }

        let mut activity = vec![0_f64; self.nr_rows()];
        let mut magnitude = vec![0_f64; self.nr_rows()];
        for (column, &value) in self.columns.iter().zip(x) {
            for &(i, coefficient) in column {
                activity[i] += coefficient * value;
                magnitude[i] += (coefficient * value).abs();
            }
        }

        (0..self.nr_rows()).all(|i| {
            let scale = 1_f64 + self.rhs[i].abs().max(magnitude[i]);
            self.constraint_types[i].is_satisfied(activity[i], self.rhs[i], tolerance * scale)
        })
    }
}

/// Outcome of the simplex method, with the amount of work it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Solved {
    #[allow(missing_docs)]
    pub result: OptimizationResult,
    /// Simplex iterations over both phases.
    pub iterations: u64,
}

/// Solve a linear program with the two phase simplex method.
///
/// # Arguments
///
/// * `problem`: Linear program with consistent dimensions.
/// * `settings`: The iteration limit and feasibility tolerance are used.
///
/// # Return value
///
/// The optimization result. Numerical trouble is reported in the result, never by panicking.
pub fn solve(problem: &LinearProgram, settings: &Settings) -> Solved {
    debug_assert_eq!(problem.cost.len(), problem.nr_columns());
    debug_assert_eq!(problem.lower.len(), problem.nr_columns());
    debug_assert_eq!(problem.upper.len(), problem.nr_columns());
    debug_assert_eq!(problem.constraint_types.len(), problem.nr_rows());
    debug_assert!(problem.columns.iter().flatten().all(|&(i, _)| i < problem.nr_rows()));

    let mut budget = Budget { limit: settings.simplex_iteration_limit, used: 0 };
    let result = two_phase(problem, settings, &mut budget);

    match &result {
        OptimizationResult::NumericalFailure(reason) => warn!(
            "Simplex failed on a problem with {} rows and {} columns: {}",
            problem.nr_rows(), problem.nr_columns(), reason,
        ),
        other => debug!(
            "Simplex finished after {} iterations ({} rows, {} columns): {}",
            budget.used, problem.nr_rows(), problem.nr_columns(), other,
        ),
    }

    Solved { result, iterations: budget.used }
}

fn two_phase(problem: &LinearProgram, settings: &Settings, budget: &mut Budget) -> OptimizationResult {
    let mut tableau = Tableau::new(problem);

    let phase_one_cost = tableau.phase_one_cost();
    match optimize(&mut tableau, &phase_one_cost, budget) {
        PhaseResult::Optimal => {},
        PhaseResult::Unbounded => return OptimizationResult::NumericalFailure(
            "the sum of the artificial variables is unbounded".to_string(),
        ),
        PhaseResult::IterationLimit => return OptimizationResult::IterationLimit,
        PhaseResult::NumericalFailure(reason) => return OptimizationResult::NumericalFailure(reason),
    }

    tableau.recompute_basic_values();
    let infeasibility = tableau.objective_value(&phase_one_cost);
    let rhs_norm = problem.rhs.iter().fold(0_f64, |norm, b| norm.max(b.abs()));
    trace!("Phase one ended with infeasibility {infeasibility:e}");
    if infeasibility.is_nan() {
        return OptimizationResult::NumericalFailure("infeasibility is not a number".to_string());
    }
    if infeasibility > settings.feasibility_tolerance * (1_f64 + rhs_norm) {
        return OptimizationResult::Infeasible;
    }

    if let Err(reason) = tableau.fix_artificials() {
        return OptimizationResult::NumericalFailure(reason);
    }

    // Maximization is minimization of the negated costs
    let sense = problem.direction.sense();
    let cost = tableau.extend_cost(problem.cost.iter().map(|c| sense * c));
    match optimize(&mut tableau, &cost, budget) {
        PhaseResult::Optimal => {
            tableau.recompute_basic_values();
            trace!("{:?}", tableau);

            let x = tableau.structural_values();
            if problem.is_feasible(&x, settings.feasibility_tolerance) {
                let objective = problem.objective_value(&x);
                OptimizationResult::FiniteOptimum { x, objective }
            } else {
                OptimizationResult::NumericalFailure(
                    "the final solution violates the constraints".to_string(),
                )
            }
        },
        PhaseResult::Unbounded => OptimizationResult::Unbounded,
        PhaseResult::IterationLimit => OptimizationResult::IterationLimit,
        PhaseResult::NumericalFailure(reason) => OptimizationResult::NumericalFailure(reason),
    }
}

/// Iterations that may still be spent on one linear program.
struct Budget {
    limit: u64,
    used: u64,
}

/// How a single phase ended.
#[derive(Debug, PartialEq)]
enum PhaseResult {
    Optimal,
    Unbounded,
    IterationLimit,
    NumericalFailure(String),
}

/// How a run of a single pivot rule ended.
enum RunResult {
    Done(PhaseResult),
    /// Too many consecutive degenerate pivots.
    Stalled,
}

/// Optimize with the most profitable rule, falling back to Bland's rule when stalling.
fn optimize(tableau: &mut Tableau, cost: &[f64], budget: &mut Budget) -> PhaseResult {
    match primal::<MostProfitable>(tableau, cost, budget, Some(DEGENERATE_PIVOT_LIMIT)) {
        RunResult::Done(result) => result,
        RunResult::Stalled => {
            trace!("Switching to Bland's rule after {} degenerate pivots", DEGENERATE_PIVOT_LIMIT);
            match primal::<FirstProfitable>(tableau, cost, budget, None) {
                RunResult::Done(result) => result,
                RunResult::Stalled => PhaseResult::NumericalFailure("stalling under Bland's rule".to_string()),
            }
        },
    }
}

/// Reoptimize a tableau with the primal simplex method.
///
/// # Arguments
///
/// * `tableau`: Tableau in a basic feasible solution state.
/// * `cost`: Cost of every column of the tableau.
/// * `stall_limit`: Give up after this many consecutive degenerate pivots.
fn primal<PR: PivotRule>(
    tableau: &mut Tableau,
    cost: &[f64],
    budget: &mut Budget,
    stall_limit: Option<u64>,
) -> RunResult {
    let mut rule = PR::new();
    let mut degenerate = 0;

    loop {
        let relative_costs = tableau.relative_costs(cost);
        if relative_costs.iter().any(|cost| !cost.is_finite()) {
            break RunResult::Done(PhaseResult::NumericalFailure("relative cost is not finite".to_string()));
        }

        let Some((column, relative_cost)) = rule.select_primal_pivot_column(tableau, &relative_costs) else {
            break RunResult::Done(PhaseResult::Optimal);
        };
        if budget.used >= budget.limit {
            break RunResult::Done(PhaseResult::IterationLimit);
        }
        budget.used += 1;

        let towards = if relative_cost < 0_f64 { BoundDirection::Upper } else { BoundDirection::Lower };
        let step = tableau.select_primal_step(column, towards, PR::LOWEST_INDEX_LEAVING);
        if step == Step::Unbounded {
            break RunResult::Done(PhaseResult::Unbounded);
        }
        if let Err(reason) = tableau.take_step(column, towards, step) {
            break RunResult::Done(PhaseResult::NumericalFailure(reason));
        }

        if step.length() <= EPSILON {
            degenerate += 1;
            if stall_limit.is_some_and(|limit| degenerate >= limit) {
                break RunResult::Stalled;
            }
        } else {
            degenerate = 0;
        }
    }
}

#[cfg(test)]
mod test {
    use crate::algorithm::OptimizationResult;
    use crate::algorithm::simplex::{LinearProgram, solve};
    use crate::data::linear_program::elements::{ConstraintType, Objective};
    use crate::settings::Settings;

    fn assert_optimum(problem: &LinearProgram, expected_x: &[f64], expected_objective: f64) {
        match solve(problem, &Settings::default()).result {
            OptimizationResult::FiniteOptimum { x, objective } => {
                assert!((objective - expected_objective).abs() < 1e-9, "{objective} != {expected_objective}");
                for (value, expected) in x.iter().zip(expected_x) {
                    assert!((value - expected).abs() < 1e-9, "{x:?} != {expected_x:?}");
                }
            },
            other => panic!("expected an optimum, got {other:?}"),
        }
    }

    #[test]
    fn maximize() {
        // max 3x + 2y, x + y <= 4, x + 3y <= 6, x <= 3
        let problem = LinearProgram {
            direction: Objective::Maximize,
            cost: vec![3_f64, 2_f64],
            columns: vec![vec![(0, 1_f64), (1, 1_f64)], vec![(0, 1_f64), (1, 3_f64)]],
            constraint_types: vec![ConstraintType::LessEqual; 2],
            rhs: vec![4_f64, 6_f64],
            lower: vec![0_f64; 2],
            upper: vec![3_f64, f64::INFINITY],
        };
        assert_optimum(&problem, &[3_f64, 1_f64], 11_f64);
    }

    #[test]
    fn phase_one() {
        // min x + y, x + y >= 2, x - y = 0
        let problem = LinearProgram {
            direction: Objective::Minimize,
            cost: vec![1_f64, 1_f64],
            columns: vec![vec![(0, 1_f64), (1, 1_f64)], vec![(0, 1_f64), (1, -1_f64)]],
            constraint_types: vec![ConstraintType::GreaterEqual, ConstraintType::Equal],
            rhs: vec![2_f64, 0_f64],
            lower: vec![0_f64; 2],
            upper: vec![f64::INFINITY; 2],
        };
        assert_optimum(&problem, &[1_f64, 1_f64], 2_f64);
    }

    #[test]
    fn free_and_negative_bounds() {
        // min x, x >= -5 as a row, x free
        let problem = LinearProgram {
            direction: Objective::Minimize,
            cost: vec![1_f64, 0_f64],
            columns: vec![vec![(0, 1_f64)], vec![]],
            constraint_types: vec![ConstraintType::GreaterEqual],
            rhs: vec![-5_f64],
            lower: vec![f64::NEG_INFINITY, -2_f64],
            upper: vec![f64::INFINITY, -1_f64],
        };
        assert_optimum(&problem, &[-5_f64, -2_f64], -5_f64);
    }

    #[test]
    fn redundant_rows() {
        // min -x - y, x + y = 1 twice
        let problem = LinearProgram {
            direction: Objective::Minimize,
            cost: vec![-1_f64, -2_f64],
            columns: vec![vec![(0, 1_f64), (1, 1_f64)], vec![(0, 1_f64), (1, 1_f64)]],
            constraint_types: vec![ConstraintType::Equal; 2],
            rhs: vec![1_f64; 2],
            lower: vec![0_f64; 2],
            upper: vec![f64::INFINITY; 2],
        };
        assert_optimum(&problem, &[0_f64, 1_f64], -2_f64);
    }

    #[test]
    fn infeasible() {
        // x + y <= 1, x + y >= 3
        let problem = LinearProgram {
            direction: Objective::Minimize,
            cost: vec![1_f64, 1_f64],
            columns: vec![vec![(0, 1_f64), (1, 1_f64)], vec![(0, 1_f64), (1, 1_f64)]],
            constraint_types: vec![ConstraintType::LessEqual, ConstraintType::GreaterEqual],
            rhs: vec![1_f64, 3_f64],
            lower: vec![0_f64; 2],
            upper: vec![f64::INFINITY; 2],
        };
        assert_eq!(solve(&problem, &Settings::default()).result, OptimizationResult::Infeasible);
    }

    #[test]
    fn unbounded() {
        // max x, x - y <= 1
        let problem = LinearProgram {
            direction: Objective::Maximize,
            cost: vec![1_f64, 0_f64],
            columns: vec![vec![(0, 1_f64)], vec![(0, -1_f64)]],
            constraint_types: vec![ConstraintType::LessEqual],
            rhs: vec![1_f64],
            lower: vec![0_f64; 2],
            upper: vec![f64::INFINITY; 2],
        };
        assert_eq!(solve(&problem, &Settings::default()).result, OptimizationResult::Unbounded);
    }

    #[test]
    fn iteration_limit() {
        let problem = LinearProgram {
            direction: Objective::Minimize,
            cost: vec![1_f64],
            columns: vec![vec![(0, 1_f64)]],
            constraint_types: vec![ConstraintType::GreaterEqual],
            rhs: vec![1_f64],
            lower: vec![0_f64],
            upper: vec![f64::INFINITY],
        };
        let solved = solve(&problem, &Settings::default().with_simplex_iteration_limit(0));
        assert_eq!(solved.result, OptimizationResult::IterationLimit);
        assert_eq!(solved.iterations, 0);
    }

    #[test]
    fn no_rows() {
        let problem = LinearProgram {
            direction: Objective::Maximize,
            cost: vec![2_f64, -1_f64],
            columns: vec![vec![], vec![]],
            constraint_types: vec![],
            rhs: vec![],
            lower: vec![0_f64, 1_f64],
            upper: vec![4_f64, 3_f64],
        };
        assert_optimum(&problem, &[4_f64, 1_f64], 7_f64);
    }
}
