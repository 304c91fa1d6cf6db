//! # Branch-and-price
//!
//! Best first search over the domains of the integer columns of a block structured model. At every
//! node, the blocks are solved independently with the domains of that node; together they give a
//! bound on the objective of the node, because only the linking rows are relaxed. If the combined
//! solution violates a linking row or is fractional, the node is branched on; otherwise it is a
//! feasible solution.
//!
//! The search moves through the states of `SearchState`, and reports each transition to a
//! `SearchMonitor`.
use std::time::Instant;

use log::{debug, trace, warn};

use crate::algorithm::branch_and_price::incumbent::SharedIncumbent;
use crate::algorithm::branch_and_price::monitor::{NodeEvent, NodeOutcome, SearchMonitor};
use crate::algorithm::branch_and_price::node::{BoundChange, Node};
use crate::algorithm::branch_and_price::queue::NodeQueue;
use crate::algorithm::interrupt::{Interrupt, Reason, StopFlag};
use crate::algorithm::subproblem::{LocalResult, LocalStatus, SubproblemSolver};
use crate::data::linear_program::elements::BoundDirection;
use crate::data::linear_program::model::SparseModel;
use crate::data::linear_program::partition::BlockPartition;
use crate::data::linear_program::solution::{SearchStatistics, SolutionReport, SolveStatus, Termination};
use crate::error::Result;
use crate::settings::Settings;

pub mod incumbent;
pub mod monitor;
pub mod node;
pub mod queue;

/// States of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchState {
    /// Checking the input and creating the root node.
    Initializing,
    /// Solving the blocks of the root node.
    RootRelaxation,
    /// Solving the blocks of a node other than the root.
    NodeProcessing,
    /// Adding the children of a node to the queue.
    Branching,
    /// A node gave a solution that satisfies all rows.
    Feasible,
    /// A node was discarded because it has no solution.
    PrunedInfeasible,
    /// The search is over.
    Terminated,
}

/// Solves a model with branch-and-price over the blocks of a partition.
pub struct BranchAndPriceEngine<'a> {
    model: &'a SparseModel,
    partition: BlockPartition,
    settings: Settings,
    stop: StopFlag,
    incumbent: SharedIncumbent,
}

impl<'a> BranchAndPriceEngine<'a> {
    /// Create an engine.
    ///
    /// # Return value
    ///
    /// The engine, or `Error::InvalidPartition` if the partition doesn't fit the model.
    pub fn new(model: &'a SparseModel, partition: BlockPartition, settings: Settings) -> Result<Self> {
        partition.check_fits(model)?;
        Ok(Self::with_checked_partition(model, partition, settings))
    }

    /// Create an engine with a partition that is known to fit the model.
    pub(crate) fn with_checked_partition(
        model: &'a SparseModel,
        partition: BlockPartition,
        settings: Settings,
    ) -> Self {
        debug_assert!(partition.check_fits(model).is_ok());

        Self {
            model,
            partition,
            settings,
            stop: StopFlag::new(),
            incumbent: SharedIncumbent::new(model.direction()),
        }
    }

    /// Use a stop flag that is also held by the caller.
    #[must_use]
    pub fn with_stop_flag(mut self, stop: StopFlag) -> Self {
        self.stop = stop;
        self
    }

    /// A handle to the stop flag of this engine; raising it ends a running search.
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// The best solution found so far.
    ///
    /// A second search with the same engine starts from this incumbent.
    pub fn incumbent(&self) -> &SharedIncumbent {
        &self.incumbent
    }

    #[allow(missing_docs)]
    pub fn partition(&self) -> &BlockPartition {
        &self.partition
    }

    /// Run the search.
    ///
    /// # Arguments
    ///
    /// * `monitor`: Receives every state transition, processed node and improved incumbent.
    pub fn solve(&self, monitor: &mut dyn SearchMonitor) -> SolutionReport {
        let start = Instant::now();
        let interrupt = Interrupt::new(self.stop.clone(), self.settings.time_limit);
        let mut search = Search {
            engine: self,
            solver: SubproblemSolver::new(&self.settings, &interrupt),
            interrupt: &interrupt,
            queue: NodeQueue::new(self.model.direction()),
            statistics: SearchStatistics::default(),
            next_id: 1,
            aborted_bound: None,
            monitor,
        };

        search.run(start)
    }
}

/// Why the main loop ended.
#[derive(Debug)]
enum Stop {
    Completed,
    GapClosed,
    RootInfeasible,
    Unbounded,
    /// A node, time, iteration or interrupt limit.
    Limit(Termination),
    Failed(String),
}

/// State of a single run of the search.
struct Search<'e, 'a, 'm> {
    engine: &'e BranchAndPriceEngine<'a>,
    solver: SubproblemSolver<'e>,
    interrupt: &'e Interrupt,
    queue: NodeQueue,
    statistics: SearchStatistics,
    next_id: u64,
    /// Parent bound of a node whose processing was cut short.
    aborted_bound: Option<f64>,
    monitor: &'m mut dyn SearchMonitor,
}

impl Search<'_, '_, '_> {
    fn run(&mut self, start: Instant) -> SolutionReport {
        let engine = self.engine;
        let model = engine.model;
        let settings = &engine.settings;
        let direction = model.direction();

        self.transition(SearchState::Initializing);
        self.monitor.on_enter_search(model.nr_rows(), model.nr_columns(), engine.partition.nr_blocks());
        self.queue.push(Node::root(model, -direction.worst_value(), settings.integer_tolerance));

        let stop = loop {
            if let Some(reason) = self.interrupt.check() {
                break Stop::Limit(termination_of(reason));
            }
            if let (Some(incumbent), Some(bound)) = (self.engine.incumbent.objective(), self.queue.best_bound()) {
                if settings.is_gap_closed(incumbent, bound) {
                    break Stop::GapClosed;
                }
            }
            if self.statistics.nodes_processed >= settings.node_limit && !self.queue.is_empty() {
                break Stop::Limit(Termination::NodeLimit);
            }
            let Some(node) = self.queue.pop() else {
                break Stop::Completed;
            };

            if let Some(incumbent) = self.engine.incumbent.objective() {
                if !direction.is_better(node.parent_bound, incumbent) {
                    trace!("Node {} discarded before processing", node.id);
                    self.statistics.nodes_pruned += 1;
                    continue;
                }
            }

            self.statistics.nodes_processed += 1;
            self.transition(if node.is_root() { SearchState::RootRelaxation } else { SearchState::NodeProcessing });
            if let Some(stop) = self.process(node) {
                break stop;
            }
        };

        self.transition(SearchState::Terminated);
        self.statistics.elapsed = start.elapsed();
        debug!("{} nodes created, {} left open", self.queue.total_added(), self.queue.len());
        let report = self.report(stop);
        self.monitor.on_exit_search(&report);

        report
    }

    /// Solve the blocks of a node and decide what to do with it.
    ///
    /// # Return value
    ///
    /// Why the search should stop, if it should.
    fn process(&mut self, node: Node) -> Option<Stop> {
        let engine = self.engine;
        let model = engine.model;
        let partition = &engine.partition;
        let settings = &engine.settings;
        let direction = model.direction();

        let mut primal = vec![0_f64; model.nr_columns()];
        let mut bound = model.objective_constant();
        for block in 1..=partition.nr_blocks() {
            let result = self.solver.solve(model, partition, block, &node.bounds, !settings.block_integrality);
            self.count(&result);
            match result.status {
                LocalStatus::Optimal => {
                    bound += result.objective;
                    for (j, value) in result.primal {
                        primal[j] = value;
                    }
                },
                LocalStatus::Infeasible => return self.prune_infeasible(&node),
                other => return Some(self.abort(&node, other)),
            }
        }
        let bound = self.check_monotone(&node, bound);

        if let Some(incumbent) = self.engine.incumbent.objective() {
            if !direction.is_better(bound, incumbent) {
                self.statistics.nodes_pruned += 1;
                self.finish(&node, bound, NodeOutcome::PrunedByBound);
                return None;
            }
        }

        if let Some((low, high)) = self.select_branch(&node, &primal) {
            self.transition(SearchState::Branching);
            for change in [low, high] {
                let child = node.child(self.next_id, &change, bound);
                self.next_id += 1;
                self.queue.push(child);
            }
            self.finish(&node, bound, NodeOutcome::Branched);
            return None;
        }

        let violated = partition.linking_rows()
            .into_iter()
            .find(|&i| !model.is_row_satisfied(i, &primal, settings.feasibility_tolerance));
        let (objective, primal) = match violated {
            Some(i) => {
                debug!("Linking row {} is violated without a column to branch on, solving node {} as a whole", i, node.id);
                let result = self.solver.solve_monolithic(model, &node.bounds, false);
                self.count(&result);
                match result.status {
                    LocalStatus::Optimal => {
                        let mut x = vec![0_f64; model.nr_columns()];
                        for (j, value) in result.primal {
                            x[j] = value;
                        }
                        (model.objective_value(&x), x)
                    },
                    LocalStatus::Infeasible => return self.prune_infeasible(&node),
                    other => return Some(self.abort(&node, other)),
                }
            },
            None => (model.objective_value(&primal), primal),
        };

        self.transition(SearchState::Feasible);
        let outcome = if self.engine.incumbent.try_install(objective, &primal) {
            self.statistics.incumbent_updates += 1;
            self.monitor.on_incumbent_improved(objective, &primal);
            let pruned = self.queue.prune(objective);
            self.statistics.nodes_pruned += pruned as u64;
            NodeOutcome::Improved
        } else {
            NodeOutcome::Feasible
        };
        self.finish(&node, bound, outcome);

        None
    }

    /// Decide how to branch, if the combined solution of the blocks asks for it.
    ///
    /// The first violated linking row is branched on by splitting the domain of its first integer
    /// column that has more than one value. Otherwise, the most fractional integer column is
    /// branched on.
    fn select_branch(&self, node: &Node, primal: &[f64]) -> Option<(BoundChange, BoundChange)> {
        let model = self.engine.model;
        let settings = &self.engine.settings;
        let bounds = &node.bounds;

        for i in self.engine.partition.linking_rows() {
            if model.is_row_satisfied(i, primal, settings.feasibility_tolerance) {
                continue;
            }

            let split = model.row_columns(i).iter()
                .filter(|&&j| model.variable_type(j).is_integer())
                .find_map(|&j| BoundChange::split(j, bounds.lower[j], bounds.upper[j], primal[j]));
            if let Some((low, high)) = split {
                debug!(
                    "Node {}: linking row {} is violated, splitting column {} into [{}, {}] and [{}, {}]",
                    node.id, i, low.column, low.lower, low.upper, high.lower, high.upper,
                );
                return Some((low, high));
            }
        }

        let mut most_fractional: Option<(usize, f64)> = None;
        for (j, &value) in primal.iter().enumerate() {
            if !model.variable_type(j).is_integer() || settings.is_integral(value) {
                continue;
            }
            let fractionality = (value - value.floor()).min(value.ceil() - value);
            if most_fractional.is_none_or(|(_, existing)| fractionality > existing) {
                most_fractional = Some((j, fractionality));
            }
        }

        most_fractional.map(|(j, _)| {
            let value = primal[j];
            debug!("Node {}: column {} is fractional at {}", node.id, j, value);
            (
                BoundChange::around(j, bounds.lower[j], bounds.upper[j], value, BoundDirection::Upper),
                BoundChange::around(j, bounds.lower[j], bounds.upper[j], value, BoundDirection::Lower),
            )
        })
    }

    /// A child can't have a better bound than its parent; numerical noise is clipped.
    fn check_monotone(&self, node: &Node, bound: f64) -> f64 {
        if self.engine.model.direction().is_better(bound, node.parent_bound) {
            warn!("Node {} has bound {} which is better than its parent bound {}", node.id, bound, node.parent_bound);
            node.parent_bound
        } else {
            bound
        }
    }

    fn prune_infeasible(&mut self, node: &Node) -> Option<Stop> {
        self.transition(SearchState::PrunedInfeasible);
        self.statistics.nodes_pruned += 1;
        self.finish(node, f64::NAN, NodeOutcome::PrunedInfeasible);

        node.is_root().then_some(Stop::RootInfeasible)
    }

    fn abort(&mut self, node: &Node, status: LocalStatus) -> Stop {
        self.aborted_bound = Some(node.parent_bound);
        self.finish(node, f64::NAN, NodeOutcome::Aborted);

        match status {
            LocalStatus::UnboundedRelaxation => Stop::Unbounded,
            LocalStatus::IterationLimit => Stop::Limit(Termination::IterationLimit),
            LocalStatus::Interrupted => Stop::Limit(
                self.interrupt.check().map_or(Termination::Interrupted, termination_of),
            ),
            LocalStatus::Error(reason) => Stop::Failed(reason),
            LocalStatus::Optimal | LocalStatus::Infeasible => Stop::Failed(format!("unexpected status {:?}", status)),
        }
    }

    fn count(&mut self, result: &LocalResult) {
        self.statistics.subproblem_solves += 1;
        self.statistics.simplex_iterations += result.iterations;
    }

    fn finish(&mut self, node: &Node, bound: f64, outcome: NodeOutcome) {
        let event = NodeEvent {
            node_id: node.id,
            depth: node.depth,
            bound,
            parent_bound: node.parent_bound,
            outcome,
            open_nodes: self.queue.len(),
            incumbent: self.engine.incumbent.objective(),
        };
        self.monitor.on_node_processed(&event);
    }

    fn transition(&mut self, state: SearchState) {
        trace!("Entering state {:?}", state);
        self.monitor.on_state_change(state);
    }

    fn report(&self, stop: Stop) -> SolutionReport {
        let direction = self.engine.model.direction();
        let incumbent = self.engine.incumbent.snapshot();

        let (status, termination) = match (&stop, &incumbent) {
            (Stop::Completed, Some(_)) => (SolveStatus::Optimal, Termination::Completed),
            (Stop::Completed, None) => (SolveStatus::Infeasible, Termination::Completed),
            (Stop::GapClosed, _) => (SolveStatus::Optimal, Termination::GapClosed),
            (Stop::RootInfeasible, _) => (SolveStatus::Infeasible, Termination::RootInfeasible),
            (Stop::Unbounded, _) => (SolveStatus::Unbounded, Termination::Unbounded),
            (Stop::Limit(termination), Some(_)) => (SolveStatus::Feasible, *termination),
            (Stop::Limit(termination), None) => (SolveStatus::IterationLimit, *termination),
            (Stop::Failed(_), _) => (SolveStatus::Error, Termination::NumericalFailure),
        };

        let best_bound = match (&stop, &incumbent) {
            (Stop::Completed, Some(incumbent)) => incumbent.objective,
            (Stop::Completed | Stop::RootInfeasible, _) => direction.worst_value(),
            (Stop::Unbounded, _) => -direction.worst_value(),
            _ => {
                let sense = direction.sense();
                [self.queue.best_bound(), self.aborted_bound, incumbent.as_ref().map(|best| best.objective)]
                    .into_iter()
                    .flatten()
                    .min_by(|a, b| (sense * a).total_cmp(&(sense * b)))
                    .unwrap_or(-direction.worst_value())
            },
        };

        let report = SolutionReport::new(
            status,
            termination,
            incumbent.map(|best| (best.objective, best.primal)),
            best_bound,
            self.statistics,
        );
        match stop {
            Stop::Failed(reason) => report.with_reason(reason),
            _ => report,
        }
    }
}

fn termination_of(reason: Reason) -> Termination {
    match reason {
        Reason::Stopped => Termination::Interrupted,
        Reason::Deadline => Termination::TimeLimit,
    }
}
