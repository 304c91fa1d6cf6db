//! # Node queue
//!
//! Open nodes are explored best bound first. Nodes with equal bounds are explored in the order in
//! which they were added, so that a search is reproducible.
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::algorithm::branch_and_price::node::Node;
use crate::data::linear_program::elements::Objective;

/// Entry in the node queue.
struct QueuedNode {
    /// Bound multiplied with the sense of the objective: lower is better.
    key: f64,
    /// Position in insertion order.
    sequence: u64,
    node: Node,
}

impl PartialEq for QueuedNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedNode {}

impl PartialOrd for QueuedNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // The heap pops the maximum, which should be the lowest key, and then the oldest node
        other.key.total_cmp(&self.key)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Priority queue of open nodes.
pub struct NodeQueue {
    direction: Objective,
    heap: BinaryHeap<QueuedNode>,
    nodes_added: u64,
}

impl NodeQueue {
    #[allow(missing_docs)]
    pub fn new(direction: Objective) -> Self {
        Self { direction, heap: BinaryHeap::new(), nodes_added: 0 }
    }

    /// Add a node; its parent bound determines its priority.
    pub fn push(&mut self, node: Node) {
        let key = self.direction.sense() * node.parent_bound;
        self.heap.push(QueuedNode { key, sequence: self.nodes_added, node });
        self.nodes_added += 1;
    }

    /// Take the node with the best bound.
    pub fn pop(&mut self) -> Option<Node> {
        self.heap.pop().map(|queued| queued.node)
    }

    /// Best bound over all open nodes, `None` if there are none.
    pub fn best_bound(&self) -> Option<f64> {
        self.heap.peek().map(|queued| queued.node.parent_bound)
    }

    /// Remove all nodes whose bound is not better than `incumbent`.
    ///
    /// # Return value
    ///
    /// The number of nodes removed.
    pub fn prune(&mut self, incumbent: f64) -> usize {
        let before = self.heap.len();
        let direction = self.direction;
        self.heap.retain(|queued| direction.is_better(queued.node.parent_bound, incumbent));

        before - self.heap.len()
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Total number of nodes ever added.
    pub fn total_added(&self) -> u64 {
        self.nodes_added
    }
}
