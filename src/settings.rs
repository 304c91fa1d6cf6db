//! # Solver settings
//!
//! Limits and tolerances shared by the simplex method, the local branch-and-bound and the
//! branch-and-price search.
use std::time::Duration;

/// Settings of a solve.
///
/// Start from `Settings::default()` and adjust with the `with_*` methods.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Maximum number of nodes the branch-and-price search takes from its queue.
    pub node_limit: u64,
    /// Wall clock limit of the whole solve (`None` is unlimited).
    pub time_limit: Option<Duration>,
    /// Maximum number of simplex iterations for a single linear program, both phases together.
    pub simplex_iteration_limit: u64,
    /// Maximum number of nodes of one local branch-and-bound.
    pub local_node_limit: u64,

    /// Relative optimality gap: stop when `|incumbent - bound| <= gap_tolerance * max(1, |incumbent|)`.
    pub gap_tolerance: f64,
    /// Absolute optimality gap.
    pub absolute_gap_tolerance: f64,
    /// A value is integral if it is within this distance of an integer.
    pub integer_tolerance: f64,
    /// Allowed violation of constraints and bounds.
    pub feasibility_tolerance: f64,

    /// Solve the blocks of a node with local branch-and-bound, instead of only their relaxation.
    pub block_integrality: bool,
    /// Log progress every this many nodes.
    pub log_frequency: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            node_limit: 100_000,
            time_limit: None,
            simplex_iteration_limit: 50_000,
            local_node_limit: 100_000,

            gap_tolerance: 1e-6,
            absolute_gap_tolerance: 1e-9,
            integer_tolerance: 1e-6,
            feasibility_tolerance: 1e-7,

            block_integrality: true,
            log_frequency: 100,
        }
    }
}

impl Settings {
    #[allow(missing_docs)]
    #[must_use]
    pub fn with_node_limit(mut self, nodes: u64) -> Self {
        self.node_limit = nodes;
        self
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn with_simplex_iteration_limit(mut self, iterations: u64) -> Self {
        self.simplex_iteration_limit = iterations;
        self
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn with_local_node_limit(mut self, nodes: u64) -> Self {
        self.local_node_limit = nodes;
        self
    }

    /// Set the relative optimality gap.
    #[must_use]
    pub fn with_gap_tolerance(mut self, tolerance: f64) -> Self {
        self.gap_tolerance = tolerance;
        self
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn with_absolute_gap_tolerance(mut self, tolerance: f64) -> Self {
        self.absolute_gap_tolerance = tolerance;
        self
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn with_integer_tolerance(mut self, tolerance: f64) -> Self {
        self.integer_tolerance = tolerance;
        self
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn with_feasibility_tolerance(mut self, tolerance: f64) -> Self {
        self.feasibility_tolerance = tolerance;
        self
    }

    /// Solve only the relaxations of the blocks when `false`.
    #[must_use]
    pub fn with_block_integrality(mut self, integral: bool) -> Self {
        self.block_integrality = integral;
        self
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn with_log_frequency(mut self, nodes: u64) -> Self {
        self.log_frequency = nodes.max(1);
        self
    }

    /// Whether `value` is within the integer tolerance of an integer.
    pub fn is_integral(&self, value: f64) -> bool {
        (value - value.round()).abs() <= self.integer_tolerance
    }

    /// Whether the gap between `incumbent` and `bound` is small enough to stop.
    pub fn is_gap_closed(&self, incumbent: f64, bound: f64) -> bool {
        let gap = (incumbent - bound).abs();
        gap <= self.absolute_gap_tolerance || gap <= self.gap_tolerance * incumbent.abs().max(1_f64)
    }
}
