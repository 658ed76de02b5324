use alloc::vec::Vec;
use core::iter::FusedIterator;

use super::{Boundaries, NodeFrame, TraversalContext};
use crate::raw::arena::Arena;
use crate::raw::handle::Handle;
use crate::raw::node::Node;

/// Ascending walk: left subtree, key, right subtree.
///
/// Ranks come from a running counter, so the `n`-th context always has `rank == n`.
pub struct InOrder<'a, K, const ORDER: usize> {
    nodes: &'a Arena<Node<K, ORDER>>,
    // Path from the root to the current node, with the next slot to yield in each.
    stack: Vec<(NodeFrame, usize)>,
    rank: usize,
    boundaries: Boundaries,
}

impl<'a, K, const ORDER: usize> InOrder<'a, K, ORDER> {
    pub(crate) fn new(nodes: &'a Arena<Node<K, ORDER>>, root: Option<Handle>) -> Self {
        let mut walk = Self {
            nodes,
            stack: Vec::new(),
            rank: 0,
            boundaries: Boundaries::default(),
        };
        if let Some(root) = root {
            walk.descend(NodeFrame::root(root));
        }
        walk
    }

    /// Pushes `frame` and its chain of leftmost descendants.
    fn descend(&mut self, mut frame: NodeFrame) {
        loop {
            let node = self.nodes.get(frame.handle);
            let next = frame.child(node, self.nodes, 0);
            self.stack.push((frame, 0));
            match next {
                Some(child) => frame = child,
                None => return,
            }
        }
    }
}

impl<'a, K, const ORDER: usize> Iterator for InOrder<'a, K, ORDER> {
    type Item = TraversalContext<'a, K>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (frame, slot) = self.stack.last_mut()?;
            let frame = *frame;
            let index = *slot;
            let node = self.nodes.get(frame.handle);
            let Some(key) = node.key(index) else {
                self.stack.pop();
                continue;
            };
            *slot += 1;

            let context = self.boundaries.context(&frame, key, index, self.rank);
            self.rank += 1;
            if let Some(child) = frame.child(node, self.nodes, index + 1) {
                self.descend(child);
            }
            return Some(context);
        }
    }
}

impl<K, const ORDER: usize> FusedIterator for InOrder<'_, K, ORDER> {}
