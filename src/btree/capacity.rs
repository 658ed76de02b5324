use super::BTree;
use crate::comparator::NaturalOrder;
use crate::raw::raw_btree::RawBTree;

impl<K> BTree<K> {
    /// Creates an empty tree whose node storage has room for at least `nodes` nodes.
    ///
    /// # Examples
    ///
    /// ```
    /// use rankbtree::BTree;
    ///
    /// let tree: BTree<i32> = BTree::with_capacity(16);
    /// assert!(tree.is_empty());
    /// assert!(tree.capacity() >= 16);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(nodes) for memory allocation.
    #[must_use]
    pub fn with_capacity(nodes: usize) -> Self {
        Self::with_capacity_and_comparator(nodes, NaturalOrder)
    }
}

impl<K, C, const ORDER: usize> BTree<K, C, ORDER> {
    /// Creates an empty tree ordered by `comparator` with room for at least `nodes` nodes.
    #[must_use]
    pub fn with_capacity_and_comparator(nodes: usize, comparator: C) -> Self {
        Self::from_raw(RawBTree::with_capacity(nodes, comparator))
    }

    /// Number of nodes the tree can hold without reallocating its node storage.
    ///
    /// A node holds up to `ORDER - 1` keys, so this is not a key count.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// Number of nodes currently in use.
    ///
    /// # Examples
    ///
    /// ```
    /// use rankbtree::BTree;
    ///
    /// let mut tree: BTree<u32> = (0..5).collect();
    /// assert_eq!(tree.node_count(), 3);
    /// tree.remove(&0);
    /// assert_eq!(tree.node_count(), 1);
    /// ```
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.raw.node_count()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use crate::{BTree, ReverseOrder};

    #[test]
    fn preallocated_nodes_are_not_keys() {
        let mut tree: BTree<u32, ReverseOrder, 4> = BTree::with_capacity_and_comparator(8, ReverseOrder);
        assert!(tree.capacity() >= 8);
        tree.extend(0..10);
        assert_eq!(tree.first(), Some(&9));
        assert!(tree.capacity() >= tree.node_count());
    }
}
