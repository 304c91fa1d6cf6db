//! # Search monitors
//!
//! Observers of a branch-and-price search. The engine calls them synchronously at its state
//! transitions; they can't influence the search.
use log::{debug, info};

use crate::algorithm::branch_and_price::SearchState;
use crate::data::linear_program::solution::SolutionReport;

/// What happened to a processed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeOutcome {
    /// Children were added to the queue.
    Branched,
    /// The node gave a feasible solution that improved the incumbent.
    Improved,
    /// The node gave a feasible solution that did not improve the incumbent.
    Feasible,
    /// The bound of the node can't improve the incumbent.
    PrunedByBound,
    /// A block, or the node as a whole, has no feasible solution.
    PrunedInfeasible,
    /// The search stopped while processing the node.
    Aborted,
}

/// Summary of a processed node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeEvent {
    #[allow(missing_docs)]
    pub node_id: u64,
    #[allow(missing_docs)]
    pub depth: u32,
    /// Bound computed for the node, `NaN` if it couldn't be computed.
    pub bound: f64,
    /// Bound of the parent when the node was created.
    pub parent_bound: f64,
    #[allow(missing_docs)]
    pub outcome: NodeOutcome,
    /// Number of nodes in the queue after processing.
    pub open_nodes: usize,
    /// Incumbent objective after processing, if any.
    pub incumbent: Option<f64>,
}

/// Observer of a search.
///
/// All methods do nothing by default.
pub trait SearchMonitor {
    /// The search starts.
    fn on_enter_search(&mut self, _nr_rows: usize, _nr_columns: usize, _nr_blocks: usize) {}

    /// The search moves to another state.
    fn on_state_change(&mut self, _state: SearchState) {}

    /// A node was taken from the queue and processed.
    fn on_node_processed(&mut self, _event: &NodeEvent) {}

    /// A strictly better solution was found.
    fn on_incumbent_improved(&mut self, _objective: f64, _primal: &[f64]) {}

    /// The search terminated.
    fn on_exit_search(&mut self, _report: &SolutionReport) {}
}

/// A monitor that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpMonitor;

impl SearchMonitor for NoOpMonitor {}

/// Writes the progress of the search to the `log` facade.
#[derive(Debug, Clone)]
pub struct LogMonitor {
    frequency: u64,
    nodes: u64,
}

impl LogMonitor {
    /// Log a progress line every `frequency` nodes.
    pub fn new(frequency: u64) -> Self {
        Self { frequency: frequency.max(1), nodes: 0 }
    }
}

impl SearchMonitor for LogMonitor {
    fn on_enter_search(&mut self, nr_rows: usize, nr_columns: usize, nr_blocks: usize) {
        info!("Starting search on {} rows and {} columns in {} blocks", nr_rows, nr_columns, nr_blocks);
    }

    fn on_state_change(&mut self, state: SearchState) {
        debug!("State: {:?}", state);
    }

    fn on_node_processed(&mut self, event: &NodeEvent) {
        self.nodes += 1;
        debug!(
            "Node {} at depth {}: {:?}, bound {} (parent {})",
            event.node_id, event.depth, event.outcome, event.bound, event.parent_bound,
        );
        if self.nodes % self.frequency == 0 {
            info!(
                "{:>8} nodes, {:>6} open, incumbent {}",
                self.nodes,
                event.open_nodes,
                event.incumbent.map_or_else(|| "-".to_string(), |objective| format!("{objective:.6}")),
            );
        }
    }

    fn on_incumbent_improved(&mut self, objective: f64, _primal: &[f64]) {
        info!("New incumbent with objective {:.6}", objective);
    }

    fn on_exit_search(&mut self, report: &SolutionReport) {
        info!(
            "Search ended: {:?} ({:?}) after {} nodes, objective {}, bound {}",
            report.status(),
            report.termination(),
            report.statistics().nodes_processed,
            report.objective_value(),
            report.best_bound(),
        );
    }
}

/// Forwards every call to several monitors, in order.
#[derive(Default)]
pub struct CompositeMonitor<'a> {
    monitors: Vec<&'a mut dyn SearchMonitor>,
}

impl<'a> CompositeMonitor<'a> {
    #[allow(missing_docs)]
    pub fn new() -> Self {
        Self { monitors: Vec::new() }
    }

    /// Add a monitor to the end.
    #[must_use]
    pub fn with(mut self, monitor: &'a mut dyn SearchMonitor) -> Self {
        self.monitors.push(monitor);
        self
    }
}

impl SearchMonitor for CompositeMonitor<'_> {
    fn on_enter_search(&mut self, nr_rows: usize, nr_columns: usize, nr_blocks: usize) {
        for monitor in &mut self.monitors {
            monitor.on_enter_search(nr_rows, nr_columns, nr_blocks);
        }
    }

    fn on_state_change(&mut self, state: SearchState) {
        for monitor in &mut self.monitors {
            monitor.on_state_change(state);
        }
    }

    fn on_node_processed(&mut self, event: &NodeEvent) {
        for monitor in &mut self.monitors {
            monitor.on_node_processed(event);
        }
    }

    fn on_incumbent_improved(&mut self, objective: f64, primal: &[f64]) {
        for monitor in &mut self.monitors {
            monitor.on_incumbent_improved(objective, primal);
        }
    }

    fn on_exit_search(&mut self, report: &SolutionReport) {
        for monitor in &mut self.monitors {
            monitor.on_exit_search(report);
        }
    }
}
