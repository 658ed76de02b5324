use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::iter::FusedIterator;

use super::{Boundaries, NodeFrame, TraversalContext};
use crate::raw::arena::Arena;
use crate::raw::handle::Handle;
use crate::raw::node::Node;

/// Pending nodes of a walk that yields all keys of one node before moving on.
trait Frontier: Default {
    /// Whether children are handed over right to left.
    const REVERSED: bool;

    fn put(&mut self, frame: NodeFrame);
    fn take(&mut self) -> Option<NodeFrame>;
}

#[derive(Default)]
struct PreOrderStack(Vec<NodeFrame>);

impl Frontier for PreOrderStack {
    const REVERSED: bool = true;

    fn put(&mut self, frame: NodeFrame) {
        self.0.push(frame);
    }

    fn take(&mut self) -> Option<NodeFrame> {
        self.0.pop()
    }
}

#[derive(Default)]
struct DepthStack(Vec<NodeFrame>);

impl Frontier for DepthStack {
    const REVERSED: bool = false;

    fn put(&mut self, frame: NodeFrame) {
        self.0.push(frame);
    }

    fn take(&mut self) -> Option<NodeFrame> {
        self.0.pop()
    }
}

#[derive(Default)]
struct LevelQueue(VecDeque<NodeFrame>);

impl Frontier for LevelQueue {
    const REVERSED: bool = false;

    fn put(&mut self, frame: NodeFrame) {
        self.0.push_back(frame);
    }

    fn take(&mut self) -> Option<NodeFrame> {
        self.0.pop_front()
    }
}

struct NodeWise<'a, K, F, const ORDER: usize> {
    nodes: &'a Arena<Node<K, ORDER>>,
    frontier: F,
    current: Option<(NodeFrame, usize)>,
    boundaries: Boundaries,
}

impl<'a, K, F: Frontier, const ORDER: usize> NodeWise<'a, K, F, ORDER> {
    fn new(nodes: &'a Arena<Node<K, ORDER>>, root: Option<Handle>) -> Self {
        let mut frontier = F::default();
        if let Some(root) = root {
            frontier.put(NodeFrame::root(root));
        }
        Self {
            nodes,
            frontier,
            current: None,
            boundaries: Boundaries::default(),
        }
    }

    fn next_context(&mut self) -> Option<TraversalContext<'a, K>> {
        loop {
            if let Some((frame, slot)) = &mut self.current {
                let node = self.nodes.get(frame.handle);
                if let Some(key) = node.key(*slot) {
                    let index = *slot;
                    *slot += 1;
                    let rank = frame.rank_of(node, self.nodes, index);
                    return Some(self.boundaries.context(frame, key, index, rank));
                }
                self.current = None;
            }

            let frame = self.frontier.take()?;
            let node = self.nodes.get(frame.handle);
            let children = frame.children(node, self.nodes);
            if F::REVERSED {
                children.into_iter().rev().for_each(|child| self.frontier.put(child));
            } else {
                children.into_iter().for_each(|child| self.frontier.put(child));
            }
            self.current = Some((frame, 0));
        }
    }
}

macro_rules! node_wise_walk {
    ($(#[$doc:meta])* $name:ident, $frontier:ty) => {
        $(#[$doc])*
        pub struct $name<'a, K, const ORDER: usize>(NodeWise<'a, K, $frontier, ORDER>);

        impl<'a, K, const ORDER: usize> $name<'a, K, ORDER> {
            pub(crate) fn new(nodes: &'a Arena<Node<K, ORDER>>, root: Option<Handle>) -> Self {
                Self(NodeWise::new(nodes, root))
            }
        }

        impl<'a, K, const ORDER: usize> Iterator for $name<'a, K, ORDER> {
            type Item = TraversalContext<'a, K>;

            fn next(&mut self) -> Option<Self::Item> {
                self.0.next_context()
            }
        }

        impl<K, const ORDER: usize> FusedIterator for $name<'_, K, ORDER> {}
    };
}

node_wise_walk!(
    /// Node-first walk: every key of a node, then its subtrees from left to right.
    PreOrder,
    PreOrderStack
);
node_wise_walk!(
    /// Depth-first walk from a LIFO stack that receives children in natural order, so the
    /// rightmost subtree of every node is explored first.
    DepthOrder,
    DepthStack
);
node_wise_walk!(
    /// Breadth-first walk from a FIFO queue: level 0, then level 1, and so on, each level
    /// left to right.
    LevelOrder,
    LevelQueue
);
