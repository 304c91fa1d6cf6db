//! # Search nodes
//!
//! A node of the branch-and-price tree is a set of column domains: the bounds of the model,
//! tightened by the branching decisions on the path from the root.
use crate::data::linear_program::elements::BoundDirection;
use crate::data::linear_program::model::{Bounds, SparseModel};

/// A node in the search tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Unique identifier, in order of creation.
    pub id: u64,
    /// Identifier of the node this one was branched from, `None` for the root.
    pub parent: Option<u64>,
    /// Number of branching decisions from the root.
    pub depth: u32,
    /// Domain of every column of the model.
    pub bounds: Bounds,
    /// Bound of the parent, which is also a bound on the objective of this node.
    pub parent_bound: f64,
}

impl Node {
    /// The root node: the bounds of the model, with integer domains rounded inwards.
    ///
    /// # Arguments
    ///
    /// * `bound`: Trivial bound on the objective, infinitely good.
    /// * `integer_tolerance`: Bounds of integer columns this close to an integer are rounded to it.
    pub fn root(model: &SparseModel, bound: f64, integer_tolerance: f64) -> Self {
        let (lower, upper) = (0..model.nr_columns())
            .map(|j| {
                let (lower, upper) = model.effective_bounds(j);
                if model.variable_type(j).is_integer() {
                    ((lower - integer_tolerance).ceil(), (upper + integer_tolerance).floor())
                } else {
                    (lower, upper)
                }
            })
            .unzip();

        Self { id: 0, parent: None, depth: 0, bounds: Bounds { lower, upper }, parent_bound: bound }
    }

    /// Create a child with a tightened domain for one column.
    ///
    /// # Arguments
    ///
    /// * `id`: Identifier of the new node.
    /// * `bound`: Bound of this node, which becomes the parent bound of the child.
    pub fn child(&self, id: u64, change: &BoundChange, bound: f64) -> Self {
        let mut bounds = self.bounds.clone();
        bounds.lower[change.column] = change.lower;
        bounds.upper[change.column] = change.upper;

        Self { id, parent: Some(self.id), depth: self.depth + 1, bounds, parent_bound: bound }
    }

    #[allow(missing_docs)]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// New domain of a column in a child node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundChange {
    #[allow(missing_docs)]
    pub column: usize,
    #[allow(missing_docs)]
    pub lower: f64,
    #[allow(missing_docs)]
    pub upper: f64,
}

impl BoundChange {
    /// Restrict a domain `[lower, upper]` to values on one side of `value`.
    ///
    /// The `Upper` side restricts the upper bound to `floor(value)`; the `Lower` side restricts the
    /// lower bound to `ceil(value)`.
    pub fn around(column: usize, lower: f64, upper: f64, value: f64, side: BoundDirection) -> Self {
        match side {
            BoundDirection::Upper => Self { column, lower, upper: value.floor() },
            BoundDirection::Lower => Self { column, lower: value.ceil(), upper },
        }
    }

    /// Split the integral domain `[lower, upper]` of a column into two nonempty parts.
    ///
    /// A finite domain is split in the middle. When one of the bounds is infinite, the domain is
    /// split at the current integral value of the column instead.
    ///
    /// # Return value
    ///
    /// The lower and upper part, or `None` if the domain contains a single value.
    pub fn split(column: usize, lower: f64, upper: f64, value: f64) -> Option<(Self, Self)> {
        if upper - lower < 1_f64 {
            return None;
        }

        let (low_end, high_start) = match (lower.is_finite(), upper.is_finite()) {
            (true, true) => {
                let middle = ((lower + upper) / 2_f64).floor();
                (middle, middle + 1_f64)
            },
            (_, false) => {
                let value = value.round().max(lower);
                (value, value + 1_f64)
            },
            (false, true) => {
                let value = value.round().min(upper);
                (value - 1_f64, value)
            },
        };

        Some((
            Self { column, lower, upper: low_end },
            Self { column, lower: high_start, upper },
        ))
    }
}
