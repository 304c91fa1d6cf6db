//! # Representation of solve results
//!
//! Once a search terminates, its outcome is collected in a `SolutionReport`: the final status, the
//! best solution found (indexed like the columns of the model, whatever blocks they were
//! solved in) and how far that solution might still be from optimal.
use std::fmt;
use std::time::Duration;

/// Final status of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolveStatus {
    /// The incumbent is proven optimal (within the gap tolerance).
    Optimal,
    /// An incumbent was found, but the search stopped before proving optimality.
    Feasible,
    /// No solution satisfies all constraints.
    Infeasible,
    /// The objective can be improved without bound.
    Unbounded,
    /// The solver ran into a numerical failure, see `SolutionReport::reason`.
    Error,
    /// A limit was reached before any solution was found.
    IterationLimit,
}

/// Why the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    /// All nodes were processed.
    Completed,
    /// The gap between the incumbent and the best bound became small enough.
    GapClosed,
    #[allow(missing_docs)]
    NodeLimit,
    #[allow(missing_docs)]
    TimeLimit,
    /// A subproblem reached the simplex iteration limit or the local node limit.
    IterationLimit,
    /// The stop flag was raised by the caller.
    Interrupted,
    /// The relaxation of the root node has no feasible solution.
    RootInfeasible,
    /// A relaxation has no finite optimum.
    Unbounded,
    /// A subproblem could not be solved reliably.
    NumericalFailure,
}

/// Counters collected during a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchStatistics {
    /// Nodes taken from the queue and solved.
    pub nodes_processed: u64,
    /// Nodes discarded because they were infeasible or could not improve the incumbent.
    pub nodes_pruned: u64,
    /// Number of times a better incumbent was installed.
    pub incumbent_updates: u64,
    /// Subproblem solves, counting every block of every node.
    pub subproblem_solves: u64,
    /// Simplex iterations over all linear programs.
    pub simplex_iterations: u64,
    /// Wall clock time of the search.
    pub elapsed: Duration,
}

/// Outcome of a solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionReport {
    status: SolveStatus,
    termination: Termination,
    /// Objective of the incumbent, including the constant term. `NaN` without incumbent.
    objective_value: f64,
    /// Values of the incumbent per column of the model, empty without incumbent.
    primal: Vec<f64>,
    has_solution: bool,
    /// Best bound on the optimal objective value that is still valid.
    best_bound: f64,
    reason: Option<String>,
    statistics: SearchStatistics,
}

impl SolutionReport {
    /// Assemble a report.
    ///
    /// # Arguments
    ///
    /// * `incumbent`: Objective value and values of all columns of the best solution, if any.
    /// * `best_bound`: Proven bound on the optimal value.
    pub fn new(
        status: SolveStatus,
        termination: Termination,
        incumbent: Option<(f64, Vec<f64>)>,
        best_bound: f64,
        statistics: SearchStatistics,
    ) -> Self {
        let has_solution = incumbent.is_some();
        let (objective_value, primal) = incumbent.unwrap_or((f64::NAN, Vec::new()));
        Self { status, termination, objective_value, primal, has_solution, best_bound, reason: None, statistics }
    }

    /// Attach a diagnostic message, used for the `Error` status.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[allow(missing_docs)]
    pub fn status(&self) -> SolveStatus {
        self.status
    }

    #[allow(missing_docs)]
    pub fn termination(&self) -> Termination {
        self.termination
    }

    /// Objective value of the best solution, `NaN` if there is none.
    pub fn objective_value(&self) -> f64 {
        self.objective_value
    }

    /// Best solution found, indexed by the columns of the model. Empty if there is none.
    pub fn primal(&self) -> &[f64] {
        &self.primal
    }

    /// Whether a solution is available.
    pub fn has_solution(&self) -> bool {
        self.has_solution
    }

    #[allow(missing_docs)]
    pub fn best_bound(&self) -> f64 {
        self.best_bound
    }

    /// Distance between the objective of the solution and the best bound.
    ///
    /// Zero when the search completed, infinite when there is no solution. A search that stopped
    /// because the gap closed reports the gap that remained.
    pub fn bound_gap(&self) -> f64 {
        if self.has_solution() {
            (self.objective_value - self.best_bound).abs()
        } else {
            f64::INFINITY
        }
    }

    /// Diagnostic message, if any.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    #[allow(missing_docs)]
    pub fn statistics(&self) -> &SearchStatistics {
        &self.statistics
    }
}

impl fmt::Display for SolutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Status: {:?} ({:?})", self.status, self.termination)?;
        if let Some(reason) = &self.reason {
            writeln!(f, "Reason: {}", reason)?;
        }
        if !self.has_solution() {
            return writeln!(f, "No solution available.");
        }

        writeln!(f, "Objective is: {:.5}", self.objective_value)?;
        writeln!(f, "Bound gap: {:.5}", self.bound_gap())?;
        writeln!(f, "Primal solution is:")?;
        for value in &self.primal {
            writeln!(f, "{:.5}", value)?;
        }
        Ok(())
    }
}
