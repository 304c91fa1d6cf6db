//! # Algorithms
//!
//! Linear programs are solved with the simplex method, mixed integer programs with branch-and-bound
//! on top of it, and block structured models with branch-and-price over their blocks.
use std::fmt;
use std::time::Instant;

use crate::algorithm::branch_and_price::BranchAndPriceEngine;
use crate::algorithm::branch_and_price::monitor::LogMonitor;
use crate::algorithm::interrupt::{Interrupt, StopFlag};
use crate::algorithm::subproblem::{LocalStatus, SubproblemSolver};
use crate::data::linear_program::model::{Bounds, SparseModel};
use crate::data::linear_program::partition::{BlockFinding, BlockPartition};
use crate::data::linear_program::solution::{SearchStatistics, SolutionReport, SolveStatus, Termination};
use crate::error::Result;
use crate::settings::Settings;

pub mod branch_and_price;
pub mod interrupt;
pub mod simplex;
pub mod subproblem;

/// A linear program is either infeasible, unbounded or has a finite optimum.
///
/// This is determined as the result of an algorithm, which may also give up.
#[derive(Debug, Clone, PartialEq)]
pub enum OptimizationResult {
    #[allow(missing_docs)]
    Infeasible,
    /// An optimal solution with its objective value.
    FiniteOptimum {
        #[allow(missing_docs)]
        x: Vec<f64>,
        #[allow(missing_docs)]
        objective: f64,
    },
    #[allow(missing_docs)]
    Unbounded,
    /// The iteration limit was reached first.
    IterationLimit,
    /// The computation became numerically unreliable.
    NumericalFailure(String),
}

impl fmt::Display for OptimizationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizationResult::Infeasible => f.write_str("infeasible"),
            OptimizationResult::FiniteOptimum { objective, .. } => write!(f, "optimum {objective}"),
            OptimizationResult::Unbounded => f.write_str("unbounded"),
            OptimizationResult::IterationLimit => f.write_str("iteration limit"),
            OptimizationResult::NumericalFailure(reason) => write!(f, "numerical failure: {reason}"),
        }
    }
}

/// Solve the linear relaxation of a model, ignoring integrality.
///
/// All rows are solved together, like in `solve_mip`, but without branching.
pub fn solve_relaxation(model: &SparseModel, settings: &Settings) -> SolutionReport {
    let start = Instant::now();
    let interrupt = Interrupt::new(StopFlag::new(), settings.time_limit);
    let (lower, upper) = (0..model.nr_columns()).map(|j| model.effective_bounds(j)).unzip();
    let result = SubproblemSolver::new(settings, &interrupt)
        .solve_monolithic(model, &Bounds { lower, upper }, true);

    let statistics = SearchStatistics {
        nodes_processed: result.nodes,
        subproblem_solves: 1,
        simplex_iterations: result.iterations,
        elapsed: start.elapsed(),
        ..SearchStatistics::default()
    };
    let direction = model.direction();
    let (status, termination, best_bound) = match &result.status {
        LocalStatus::Optimal => {
            let mut x = vec![0_f64; model.nr_columns()];
            for &(j, value) in &result.primal {
                x[j] = value;
            }
            let objective = model.objective_value(&x);
            return SolutionReport::new(
                SolveStatus::Optimal, Termination::Completed, Some((objective, x)), objective, statistics,
            );
        },
        LocalStatus::Infeasible => (SolveStatus::Infeasible, Termination::RootInfeasible, direction.worst_value()),
        LocalStatus::UnboundedRelaxation => (SolveStatus::Unbounded, Termination::Unbounded, -direction.worst_value()),
        LocalStatus::IterationLimit => (SolveStatus::IterationLimit, Termination::IterationLimit, -direction.worst_value()),
        LocalStatus::Interrupted => (SolveStatus::IterationLimit, Termination::TimeLimit, -direction.worst_value()),
        LocalStatus::Error(reason) => return SolutionReport::new(
            SolveStatus::Error, Termination::NumericalFailure, None, -direction.worst_value(), statistics,
        ).with_reason(reason.clone()),
    };

    SolutionReport::new(status, termination, None, best_bound, statistics)
}

/// Solve a mixed integer program as a whole, with branch-and-bound.
///
/// The search has a single block, which is solved with local branch-and-bound at the root.
pub fn solve_mip(model: &SparseModel, settings: &Settings) -> SolutionReport {
    BranchAndPriceEngine::with_checked_partition(model, BlockPartition::single_block(model), settings.clone())
        .solve(&mut LogMonitor::new(settings.log_frequency))
}

/// Solve a block structured model with branch-and-price.
///
/// # Return value
///
/// A report, or `Error::InvalidPartition` if the partition can't be found or doesn't fit the
/// model.
pub fn solve_blocks(
    model: &SparseModel,
    finding: &BlockFinding,
    settings: &Settings,
) -> Result<SolutionReport> {
    let partition = finding.resolve(model)?;
    let engine = BranchAndPriceEngine::new(model, partition, settings.clone())?;

    Ok(engine.solve(&mut LogMonitor::new(settings.log_frequency)))
}
