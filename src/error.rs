use thiserror::Error;

use crate::position::NodeId;

/// A broken structural invariant, reported by [`BTree::validate`](crate::BTree::validate).
///
/// A tree only built through the public API never produces one of these; the check
/// exists for tests and for debugging custom comparators that are not total orders.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Error)]
pub enum ValidationError {
    /// The recorded key count differs from the number of keys reachable from the root.
    #[error("tree records {recorded} keys but {counted} are reachable")]
    SizeMismatch { recorded: usize, counted: usize },
    /// Keys within a node are out of order.
    #[error("keys of node {node} are out of order at slot {slot}")]
    Unsorted { node: NodeId, slot: usize },
    /// A non-root node holds too few keys, or any node holds too many.
    #[error("node {node} holds {keys} keys, outside {min}..={max}")]
    Occupancy { node: NodeId, keys: usize, min: usize, max: usize },
    /// An internal node does not have exactly one more child than keys.
    #[error("internal node {node} has {keys} keys and {children} children")]
    ChildCount { node: NodeId, keys: usize, children: usize },
    /// Leaves sit at different depths.
    #[error("leaf {node} is at depth {depth}, expected {expected}")]
    LeafDepth { node: NodeId, depth: usize, expected: usize },
    /// A child does not point back at the node that lists it.
    #[error("child {node} does not point back at its parent")]
    ParentLink { node: NodeId },
    /// A subtree holds keys on the wrong side of a separator.
    #[error("separator {slot} of node {node} does not bound its children")]
    Separator { node: NodeId, slot: usize },
    /// A node's recorded subtree size is wrong.
    #[error("node {node} records a subtree of {recorded} keys but holds {counted}")]
    SubtreeSize { node: NodeId, recorded: usize, counted: usize },
    /// The root has a parent link.
    #[error("root {node} has a parent link")]
    RootHasParent { node: NodeId },
}
