//! # Subproblems
//!
//! A subproblem is a selection of rows and columns of a model, with the column bounds of a search
//! node. Its linear relaxation is solved with the simplex method. When integrality is enforced, a
//! depth first branch-and-bound runs on top of that relaxation.
use index_utils::remove_sparse_indices;
use log::{debug, trace};

use crate::algorithm::OptimizationResult;
use crate::algorithm::interrupt::Interrupt;
use crate::algorithm::simplex::{self, LinearProgram};
use crate::data::linear_algebra::SparseTuple;
use crate::data::linear_program::model::{Bounds, SparseModel};
use crate::data::linear_program::partition::BlockPartition;
use crate::settings::Settings;

/// How solving a subproblem ended.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalStatus {
    /// The subproblem was solved to optimality.
    Optimal,
    /// No solution satisfies the rows and bounds, or the integrality restrictions.
    Infeasible,
    /// The linear relaxation has no finite optimum.
    UnboundedRelaxation,
    /// The simplex iteration limit or the local node limit was reached.
    IterationLimit,
    /// The stop flag was raised or the deadline passed.
    Interrupted,
    /// The simplex method failed numerically.
    Error(String),
}

/// Result of solving a subproblem.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalResult {
    #[allow(missing_docs)]
    pub status: LocalStatus,
    /// Objective value of `primal`, without the objective constant of the model. `NaN` unless
    /// optimal.
    pub objective: f64,
    /// Value of each column of the subproblem, indexed by the columns of the model.
    pub primal: Vec<SparseTuple<f64>>,
    /// Whether all integer columns have an integral value in `primal`.
    pub is_integer_feasible: bool,
    /// Simplex iterations over all linear programs that were solved.
    pub iterations: u64,
    /// Nodes of the local branch-and-bound, one when only the relaxation was solved.
    pub nodes: u64,
}

impl LocalResult {
    fn without_solution(status: LocalStatus, iterations: u64, nodes: u64) -> Self {
        Self { status, objective: f64::NAN, primal: Vec::new(), is_integer_feasible: false, iterations, nodes }
    }
}

/// Solves the blocks of a model, or the model as a whole.
///
/// Solving doesn't change any state: the result only depends on the arguments (and on whether the
/// interrupt fires).
pub struct SubproblemSolver<'a> {
    settings: &'a Settings,
    interrupt: &'a Interrupt,
}

impl<'a> SubproblemSolver<'a> {
    #[allow(missing_docs)]
    pub fn new(settings: &'a Settings, interrupt: &'a Interrupt) -> Self {
        Self { settings, interrupt }
    }

    /// Solve the subproblem of one block.
    ///
    /// # Arguments
    ///
    /// * `partition`: Partition that fits `model`.
    /// * `block_id`: Block to solve, between `1` and the number of blocks.
    /// * `fixed_bounds`: Bounds of all columns of the model; only the columns of the block are read.
    /// * `integer_relaxed`: Solve only the linear relaxation.
    ///
    /// # Return value
    ///
    /// Result with the values of the columns of the block. Rows of other blocks and linking rows
    /// are not taken into account.
    pub fn solve(
        &self,
        model: &SparseModel,
        partition: &BlockPartition,
        block_id: usize,
        fixed_bounds: &Bounds,
        integer_relaxed: bool,
    ) -> LocalResult {
        debug_assert!(block_id >= 1 && block_id <= partition.nr_blocks());

        let rows = partition.rows_of_block(block_id);
        let columns = partition.columns_of_block(block_id);
        let result = self.solve_restricted(model, &rows, &columns, fixed_bounds, integer_relaxed);
        debug!(
            "Block {} ({} rows, {} columns): {:?} with objective {}",
            block_id, rows.len(), columns.len(), result.status, result.objective,
        );

        result
    }

    /// Solve the model with all of its rows and columns.
    ///
    /// # Arguments
    ///
    /// * `fixed_bounds`: Bounds of all columns of the model.
    /// * `integer_relaxed`: Solve only the linear relaxation.
    pub fn solve_monolithic(
        &self,
        model: &SparseModel,
        fixed_bounds: &Bounds,
        integer_relaxed: bool,
    ) -> LocalResult {
        let rows = (0..model.nr_rows()).collect::<Vec<_>>();
        let columns = (0..model.nr_columns()).collect::<Vec<_>>();
        let result = self.solve_restricted(model, &rows, &columns, fixed_bounds, integer_relaxed);
        debug!("Monolithic solve: {:?} with objective {}", result.status, result.objective);

        result
    }

    fn solve_restricted(
        &self,
        model: &SparseModel,
        rows: &[usize],
        columns: &[usize],
        fixed_bounds: &Bounds,
        integer_relaxed: bool,
    ) -> LocalResult {
        debug_assert!(rows.is_sorted());
        debug_assert_eq!(fixed_bounds.lower.len(), model.nr_columns());
        debug_assert_eq!(fixed_bounds.upper.len(), model.nr_columns());

        let integer = columns.iter()
            .map(|&j| !integer_relaxed && model.variable_type(j).is_integer())
            .collect::<Vec<_>>();

        let mut lower = Vec::with_capacity(columns.len());
        let mut upper = Vec::with_capacity(columns.len());
        for (&j, &is_integer) in columns.iter().zip(&integer) {
            let (mut l, mut u) = (fixed_bounds.lower[j], fixed_bounds.upper[j]);
            if is_integer {
                l = (l - self.settings.integer_tolerance).ceil();
                u = (u + self.settings.integer_tolerance).floor();
            }
            if l > u + self.settings.feasibility_tolerance {
                trace!("Column {} has an empty domain [{}, {}]", j, l, u);
                return LocalResult::without_solution(LocalStatus::Infeasible, 0, 0);
            }
            lower.push(l);
            upper.push(u.max(l));
        }

        let problem = extract(model, rows, columns, lower, upper);
        let (status, incumbent, iterations, nodes) = if integer.iter().any(|&is_integer| is_integer) {
            self.branch_and_bound(problem, &integer)
        } else {
            self.relaxation(&problem)
        };

        match incumbent {
            Some((objective, x)) if status == LocalStatus::Optimal => LocalResult {
                status,
                objective,
                is_integer_feasible: columns.iter()
                    .zip(&x)
                    .all(|(&j, &value)| !model.variable_type(j).is_integer() || self.settings.is_integral(value)),
                primal: columns.iter().copied().zip(x).collect(),
                iterations,
                nodes,
            },
            _ => LocalResult::without_solution(status, iterations, nodes),
        }
    }

    fn relaxation(&self, problem: &LinearProgram) -> (LocalStatus, Option<(f64, Vec<f64>)>, u64, u64) {
        if self.interrupt.check().is_some() {
            return (LocalStatus::Interrupted, None, 0, 0);
        }

        let solved = simplex::solve(problem, self.settings);
        let (status, incumbent) = match solved.result {
            OptimizationResult::FiniteOptimum { x, objective } => (LocalStatus::Optimal, Some((objective, x))),
            other => (status_without_optimum(other), None),
        };

        (status, incumbent, solved.iterations, 1)
    }

    /// Depth first branch-and-bound with an explicit stack of nodes.
    ///
    /// Each node is a set of column bounds. The most fractional integer column is branched on; the
    /// child closest to the value of that column is explored first.
    fn branch_and_bound(
        &self,
        mut problem: LinearProgram,
        integer: &[bool],
    ) -> (LocalStatus, Option<(f64, Vec<f64>)>, u64, u64) {
        let direction = problem.direction;
        let mut stack = vec![(problem.lower.clone(), problem.upper.clone())];
        let mut incumbent: Option<(f64, Vec<f64>)> = None;
        let mut iterations = 0;
        let mut nodes = 0;

        while let Some((lower, upper)) = stack.pop() {
            if self.interrupt.check().is_some() {
                return (LocalStatus::Interrupted, incumbent, iterations, nodes);
            }
            if nodes >= self.settings.local_node_limit {
                return (LocalStatus::IterationLimit, incumbent, iterations, nodes);
            }
            nodes += 1;

            problem.lower = lower;
            problem.upper = upper;
            let solved = simplex::solve(&problem, self.settings);
            iterations += solved.iterations;

            let (objective, mut x) = match solved.result {
                OptimizationResult::FiniteOptimum { x, objective } => (objective, x),
                OptimizationResult::Infeasible => continue,
                other => return (status_without_optimum(other), incumbent, iterations, nodes),
            };
            if let Some((best, _)) = &incumbent {
                if !direction.is_better(objective, *best) {
                    trace!("Local node {} pruned with bound {}", nodes, objective);
                    continue;
                }
            }

            match most_fractional(&x, integer, self.settings.integer_tolerance) {
                None => {
                    for (value, _) in x.iter_mut().zip(integer).filter(|(_, is_integer)| **is_integer) {
                        *value = value.round();
                    }
                    let objective = problem.objective_value(&x);
                    trace!("Local node {} gives incumbent {}", nodes, objective);
                    incumbent = Some((objective, x));
                },
                Some(j) => {
                    let value = x[j];
                    let mut down = (problem.lower.clone(), problem.upper.clone());
                    down.1[j] = value.floor();
                    let mut up = (problem.lower.clone(), problem.upper.clone());
                    up.0[j] = value.ceil();

                    // The last one pushed is explored first
                    if value - value.floor() < 0.5 {
                        stack.push(up);
                        stack.push(down);
                    } else {
                        stack.push(down);
                        stack.push(up);
                    }
                },
            }
        }

        let status = if incumbent.is_some() { LocalStatus::Optimal } else { LocalStatus::Infeasible };
        (status, incumbent, iterations, nodes)
    }
}

/// Linear program of the given rows and columns of a model.
///
/// Rows are renumbered in the order given; rows that are not selected are dropped from the columns.
fn extract(
    model: &SparseModel,
    rows: &[usize],
    columns: &[usize],
    lower: Vec<f64>,
    upper: Vec<f64>,
) -> LinearProgram {
    let mut selected = vec![false; model.nr_rows()];
    for &i in rows {
        selected[i] = true;
    }
    let excluded = (0..model.nr_rows()).filter(|&i| !selected[i]).collect::<Vec<_>>();

    LinearProgram {
        direction: model.direction(),
        cost: columns.iter().map(|&j| model.objective_coefficient(j)).collect(),
        columns: columns.iter()
            .map(|&j| {
                let mut column = model.column(j).collect::<Vec<_>>();
                remove_sparse_indices(&mut column, &excluded);
                column
            })
            .collect(),
        constraint_types: rows.iter().map(|&i| model.constraint_type(i)).collect(),
        rhs: rows.iter().map(|&i| model.rhs(i)).collect(),
        lower,
        upper,
    }
}

/// Index of the integer column whose value is furthest from an integer, if any is fractional.
///
/// Ties are broken by the lowest index.
fn most_fractional(x: &[f64], integer: &[bool], tolerance: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (j, (&value, _)) in x.iter().zip(integer).enumerate().filter(|(_, (_, is_integer))| **is_integer) {
        let fractionality = (value - value.floor()).min(value.ceil() - value);
        if fractionality > tolerance && best.is_none_or(|(_, existing)| fractionality > existing) {
            best = Some((j, fractionality));
        }
    }

    best.map(|(j, _)| j)
}

fn status_without_optimum(result: OptimizationResult) -> LocalStatus {
    match result {
        OptimizationResult::Infeasible => LocalStatus::Infeasible,
        OptimizationResult::Unbounded => LocalStatus::UnboundedRelaxation,
        OptimizationResult::IterationLimit => LocalStatus::IterationLimit,
        OptimizationResult::NumericalFailure(reason) => LocalStatus::Error(reason),
        OptimizationResult::FiniteOptimum { .. } => LocalStatus::Error("unexpected optimum".to_string()),
    }
}
