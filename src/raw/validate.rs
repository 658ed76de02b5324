use core::cmp::Ordering;

use super::handle::Handle;
use super::node::Node;
use super::raw_btree::RawBTree;
use crate::comparator::Comparator;
use crate::error::ValidationError;
use crate::position::NodeId;

/// Facts gathered bottom-up about one subtree.
struct Summary<'a, K> {
    size: usize,
    first: Option<&'a K>,
    last: Option<&'a K>,
}

impl<K, C: Comparator<K>, const ORDER: usize> RawBTree<K, C, ORDER> {
    /// Checks every structural invariant, stopping at the first violation.
    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        let Some(root) = self.root() else {
            return if self.len() == 0 {
                Ok(())
            } else {
                Err(ValidationError::SizeMismatch { recorded: self.len(), counted: 0 })
            };
        };
        if self.node(root).parent().is_some() {
            return Err(ValidationError::RootHasParent { node: NodeId(root) });
        }
        let mut leaf_depth = None;
        let summary = self.validate_node(root, None, 0, &mut leaf_depth)?;
        if summary.size != self.len() {
            return Err(ValidationError::SizeMismatch { recorded: self.len(), counted: summary.size });
        }
        Ok(())
    }

    fn validate_node(
        &self,
        handle: Handle,
        parent: Option<Handle>,
        depth: usize,
        leaf_depth: &mut Option<usize>,
    ) -> Result<Summary<'_, K>, ValidationError> {
        let node = self.node(handle);
        let id = NodeId(handle);
        if node.parent() != parent {
            return Err(ValidationError::ParentLink { node: id });
        }

        let keys = node.payload_count();
        let min = if parent.is_none() { 0 } else { Node::<K, ORDER>::MIN_KEYS };
        let max = Node::<K, ORDER>::MAX_KEYS;
        // An empty root is only legal as a leaf.
        let root_too_small = parent.is_none() && keys == 0 && !node.is_leaf();
        if keys < min || keys > max || root_too_small {
            return Err(ValidationError::Occupancy { node: id, keys, min, max });
        }
        for (slot, pair) in node.keys().windows(2).enumerate() {
            if self.comparator().compare(&pair[0], &pair[1]) == Ordering::Greater {
                return Err(ValidationError::Unsorted { node: id, slot: slot + 1 });
            }
        }

        let mut size = keys;
        if node.is_leaf() {
            match *leaf_depth {
                None => *leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    return Err(ValidationError::LeafDepth { node: id, depth, expected });
                }
                Some(_) => {}
            }
        } else {
            if node.children().len() != keys + 1 {
                return Err(ValidationError::ChildCount { node: id, keys, children: node.children().len() });
            }
            for (i, &child) in node.children().iter().enumerate() {
                let summary = self.validate_node(child, Some(handle), depth + 1, leaf_depth)?;
                let below = i.checked_sub(1).and_then(|s| node.key(s));
                let above = node.key(i);
                if let (Some(bound), Some(first)) = (below, summary.first)
                    && self.comparator().compare(bound, first) == Ordering::Greater
                {
                    return Err(ValidationError::Separator { node: id, slot: i - 1 });
                }
                if let (Some(bound), Some(last)) = (above, summary.last)
                    && self.comparator().compare(last, bound) == Ordering::Greater
                {
                    return Err(ValidationError::Separator { node: id, slot: i });
                }
                size += summary.size;
            }
        }

        if node.size() != size {
            return Err(ValidationError::SubtreeSize { node: id, recorded: node.size(), counted: size });
        }
        let first = node.child(0).map_or(node.key(0), |c| self.leftmost_key(c));
        let last = node.children().last().map_or(node.keys().last(), |&c| self.rightmost_key(c));
        Ok(Summary { size, first, last })
    }

    fn leftmost_key(&self, handle: Handle) -> Option<&K> {
        self.node(self.leftmost_leaf(handle)).key(0)
    }

    fn rightmost_key(&self, handle: Handle) -> Option<&K> {
        self.node(self.rightmost_leaf(handle)).keys().last()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use crate::comparator::NaturalOrder;
    use crate::error::ValidationError;
    use crate::raw::raw_btree::RawBTree;

    #[test]
    fn fresh_and_emptied_trees_are_valid() {
        let mut tree: RawBTree<u8, NaturalOrder, 4> = RawBTree::new(NaturalOrder);
        assert_eq!(tree.validate(), Ok(()));
        tree.insert(1);
        tree.pop_first();
        assert_eq!(tree.validate(), Ok(()));
    }

    #[test]
    fn inconsistent_comparator_is_caught() {
        use core::cell::Cell;

        // Keys are placed under one order and checked under the reverse.
        let flipped = Cell::new(false);
        let order = |a: &u32, b: &u32| if flipped.get() { b.cmp(a) } else { a.cmp(b) };
        let mut tree: RawBTree<u32, _, 5> = RawBTree::new(order);
        for k in [5, 1, 9, 3] {
            tree.insert(k);
        }
        assert_eq!(tree.validate(), Ok(()));
        flipped.set(true);
        assert!(matches!(tree.validate(), Err(ValidationError::Unsorted { slot: 1, .. })));
    }
}
