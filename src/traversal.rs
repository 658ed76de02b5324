//! Lazy walks over the node graph of a [`BTree`](crate::BTree).
//!
//! Every walk yields one [`TraversalContext`] per stored key. Walks borrow the tree,
//! hold their own explicit stack or queue, and stop as soon as the caller stops
//! pulling from them; calling the walk method again starts over from the root.

mod in_order;
mod node_wise;

use core::fmt;

use smallvec::SmallVec;

use crate::position::{NodeId, Position};
use crate::raw::arena::Arena;
use crate::raw::handle::Handle;
use crate::raw::node::Node;

pub use in_order::InOrder;
pub use node_wise::{DepthOrder, LevelOrder, PreOrder};

/// Order in which [`BTree::walk`](crate::BTree::walk) visits keys.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Strategy {
    /// Left subtree, key, right subtree: ascending key order.
    #[default]
    InOrder,
    /// All keys of a node, then its subtrees left to right.
    PreOrder,
    /// Breadth first, one level after another.
    LevelOrder,
    /// Depth first from an explicit stack; the rightmost subtree is explored first.
    DepthOrder,
}

/// Where a visited key sits in the tree.
#[derive(Debug)]
pub struct TraversalContext<'a, K> {
    /// Node holding the key.
    pub node: NodeId,
    pub key: &'a K,
    /// Depth of the node; the root is level 0.
    pub level: usize,
    /// Slot of the key within its node.
    pub index: usize,
    /// Keys held by the siblings left of this node under the same parent.
    pub loop_base: usize,
    /// This node's child slot in its parent; 0 for the root.
    pub parent_index: usize,
    /// Absolute in-order rank of the key.
    pub rank: usize,
    pub level_changed: bool,
    pub node_changed: bool,
    /// Set when this key's node hangs from a different parent slot than the previous key's.
    pub parent_index_changed: bool,
}

impl<K> Clone for TraversalContext<'_, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for TraversalContext<'_, K> {}

impl<K> TraversalContext<'_, K> {
    /// Position of the visited key, usable with [`BTree::get`](crate::BTree::get).
    #[must_use]
    pub fn position(&self) -> Position {
        Position {
            node: self.node,
            slot: self.index,
        }
    }
}

/// Where a node sits; everything a walk needs to describe the node's keys.
#[derive(Clone, Copy, Debug)]
struct NodeFrame {
    handle: Handle,
    level: usize,
    parent_index: usize,
    loop_base: usize,
    /// Number of keys ordered before this subtree.
    rank_base: usize,
}

impl NodeFrame {
    fn root(handle: Handle) -> Self {
        Self {
            handle,
            level: 0,
            parent_index: 0,
            loop_base: 0,
            rank_base: 0,
        }
    }

    /// Frame of every child of `node`, left to right.
    fn children<K, const ORDER: usize>(&self, node: &Node<K, ORDER>, nodes: &Arena<Node<K, ORDER>>) -> SmallVec<[Self; ORDER]> {
        let mut loop_base = 0;
        let mut rank_base = self.rank_base;
        let level = self.level + 1;
        node.children()
            .iter()
            .enumerate()
            .map(|(i, &handle)| {
                let child = nodes.get(handle);
                let frame = Self {
                    handle,
                    level,
                    parent_index: i,
                    loop_base,
                    rank_base,
                };
                loop_base += child.payload_count();
                rank_base += child.size() + 1;
                frame
            })
            .collect()
    }

    /// Frame of child `index` of `node`.
    fn child<K, const ORDER: usize>(&self, node: &Node<K, ORDER>, nodes: &Arena<Node<K, ORDER>>, index: usize) -> Option<Self> {
        let handle = node.child(index)?;
        let preceding = &node.children()[..index];
        Some(Self {
            handle,
            level: self.level + 1,
            parent_index: index,
            loop_base: preceding.iter().map(|&h| nodes.get(h).payload_count()).sum(),
            rank_base: self.rank_base + index + preceding.iter().map(|&h| nodes.get(h).size()).sum::<usize>(),
        })
    }

    /// In-order rank of the key at `slot` of `node`.
    fn rank_of<K, const ORDER: usize>(&self, node: &Node<K, ORDER>, nodes: &Arena<Node<K, ORDER>>, slot: usize) -> usize {
        self.rank_base + slot + node.children().iter().take(slot + 1).map(|&h| nodes.get(h).size()).sum::<usize>()
    }
}

/// Remembers the previously yielded key to compute the change flags.
#[derive(Clone, Debug, Default)]
struct Boundaries {
    previous: Option<(usize, NodeId, usize)>,
}

impl Boundaries {
    fn context<'a, K>(&mut self, frame: &NodeFrame, key: &'a K, index: usize, rank: usize) -> TraversalContext<'a, K> {
        let node = NodeId(frame.handle);
        let (level_changed, node_changed, parent_index_changed) = match self.previous {
            None => (true, true, true),
            Some((level, previous, parent_index)) => (
                level != frame.level,
                previous != node,
                level != frame.level || parent_index != frame.parent_index,
            ),
        };
        self.previous = Some((frame.level, node, frame.parent_index));
        TraversalContext {
            node,
            key,
            level: frame.level,
            index,
            loop_base: frame.loop_base,
            parent_index: frame.parent_index,
            rank,
            level_changed,
            node_changed,
            parent_index_changed,
        }
    }
}

/// A walk of any [`Strategy`], as returned by [`BTree::walk`](crate::BTree::walk).
pub enum Walk<'a, K, const ORDER: usize> {
    InOrder(InOrder<'a, K, ORDER>),
    PreOrder(PreOrder<'a, K, ORDER>),
    LevelOrder(LevelOrder<'a, K, ORDER>),
    DepthOrder(DepthOrder<'a, K, ORDER>),
}

impl<'a, K, const ORDER: usize> Walk<'a, K, ORDER> {
    pub(crate) fn new(nodes: &'a Arena<Node<K, ORDER>>, root: Option<Handle>, strategy: Strategy) -> Self {
        match strategy {
            Strategy::InOrder => Self::InOrder(InOrder::new(nodes, root)),
            Strategy::PreOrder => Self::PreOrder(PreOrder::new(nodes, root)),
            Strategy::LevelOrder => Self::LevelOrder(LevelOrder::new(nodes, root)),
            Strategy::DepthOrder => Self::DepthOrder(DepthOrder::new(nodes, root)),
        }
    }
}

impl<'a, K, const ORDER: usize> Iterator for Walk<'a, K, ORDER> {
    type Item = TraversalContext<'a, K>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::InOrder(walk) => walk.next(),
            Self::PreOrder(walk) => walk.next(),
            Self::LevelOrder(walk) => walk.next(),
            Self::DepthOrder(walk) => walk.next(),
        }
    }
}

impl<K, const ORDER: usize> core::iter::FusedIterator for Walk<'_, K, ORDER> {}

impl<K, const ORDER: usize> fmt::Debug for Walk<'_, K, ORDER> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strategy = match self {
            Self::InOrder(_) => Strategy::InOrder,
            Self::PreOrder(_) => Strategy::PreOrder,
            Self::LevelOrder(_) => Strategy::LevelOrder,
            Self::DepthOrder(_) => Strategy::DepthOrder,
        };
        f.debug_tuple("Walk").field(&strategy).finish()
    }
}
