use core::ops::Index;

use super::BTree;
use crate::comparator::Comparator;
use crate::order_statistic::Rank;
use crate::position::Position;

impl<K, C, const ORDER: usize> BTree<K, C, ORDER> {
    /// Returns the position of the `rank`-th smallest key.
    ///
    /// The rank is zero-based. Returns `None` if `rank >= self.len()`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use rankbtree::BTree;
    ///
    /// let tree = BTree::from([30, 10, 20]);
    /// let position = tree.find_by_index(1).unwrap();
    /// assert_eq!(tree.get(position), Some(&20));
    /// assert!(tree.find_by_index(3).is_none());
    /// ```
    #[must_use]
    pub fn find_by_index(&self, rank: usize) -> Option<Position> {
        self.raw.select(rank).map(Position::from_pair)
    }

    /// Returns the `rank`-th smallest key.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use rankbtree::BTree;
    ///
    /// let tree = BTree::from([10, 20, 30]);
    /// assert_eq!(tree.get_by_rank(1), Some(&20));
    /// assert!(tree.get_by_rank(3).is_none());
    /// ```
    #[must_use]
    pub fn get_by_rank(&self, rank: usize) -> Option<&K> {
        let (handle, slot) = self.raw.select(rank)?;
        self.raw.key_at(handle, slot)
    }
}

impl<K, C: Comparator<K>, const ORDER: usize> BTree<K, C, ORDER> {
    /// Returns the zero-based rank of the first key equal to `key`, or `None` if no key
    /// is equal.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use rankbtree::BTree;
    ///
    /// let tree = BTree::from([10, 20, 20, 30]);
    /// assert_eq!(tree.rank_of(&20), Some(1));
    /// assert_eq!(tree.rank_of(&30), Some(3));
    /// assert_eq!(tree.rank_of(&15), None);
    /// ```
    #[must_use]
    pub fn rank_of(&self, key: &K) -> Option<usize> {
        let rank = self.raw.lower_bound_rank(key);
        let found = self.get_by_rank(rank)?;
        (self.raw.comparator().compare(found, key).is_eq()).then_some(rank)
    }
}

/// Indexes into the tree by rank.
///
/// # Panics
///
/// Panics if `rank` is out of bounds.
///
/// # Examples
///
/// ```
/// use rankbtree::{BTree, Rank};
///
/// let tree = BTree::from([10, 20, 30]);
/// assert_eq!(tree[Rank(1)], 20);
/// ```
impl<K, C, const ORDER: usize> Index<Rank> for BTree<K, C, ORDER> {
    type Output = K;

    fn index(&self, rank: Rank) -> &K {
        self.get_by_rank(rank.0).expect("rank out of bounds")
    }
}
