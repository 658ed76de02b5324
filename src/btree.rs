use core::cmp::Ordering;
use core::fmt;
use core::iter::FusedIterator;

use crate::comparator::{Comparator, NaturalOrder};
use crate::error::ValidationError;
use crate::position::{Cursor, NodeId, NodeRef, Position};
use crate::raw::node::Node;
use crate::raw::raw_btree::RawBTree;
use crate::traversal::{DepthOrder, InOrder, LevelOrder, PreOrder, Strategy, Walk};

mod capacity;
mod hooks;
mod order_statistic;

use hooks::Hooks;

/// An ordered multiset of keys stored in a B-tree of branching factor `ORDER`.
///
/// Every node holds at most `ORDER - 1` keys and every node other than the root at
/// least `ORDER.div_ceil(2) - 1`. All leaves sit at the same depth. Keys are ordered by
/// the comparator `C`, which defaults to the key type's [`Ord`] implementation.
///
/// Equal keys may be stored more than once. Their relative order is deterministic for
/// a given history of insertions and removals but otherwise unspecified.
///
/// Each node also records how many keys its subtree holds, which makes rank queries
/// ([`find_by_index`](Self::find_by_index), [`rank_of`](Self::rank_of)) logarithmic.
///
/// It is a logic error for a key to be modified in such a way that its ordering
/// relative to any other key changes while it is in the tree. This is normally only
/// possible through [`Cell`], [`RefCell`], global state, I/O, or a comparator that is
/// not a total order. The behavior resulting from such a logic error is not specified
/// (but [`validate`](Self::validate) will usually report it) and does not result in
/// undefined behavior.
///
/// [`Cell`]: core::cell::Cell
/// [`RefCell`]: core::cell::RefCell
///
/// # Examples
///
/// ```
/// use rankbtree::BTree;
///
/// let mut tree = BTree::new();
/// for key in [9, 11, 2, 7, 3] {
///     tree.insert(key);
/// }
///
/// // The fifth key overflowed the root leaf and split it.
/// assert_eq!(tree.height(), 2);
/// assert_eq!(tree.to_vec(), [2, 3, 7, 9, 11]);
///
/// assert_eq!(tree.get_by_rank(2), Some(&7));
/// assert_eq!(tree.remove(&7), Some(7));
/// assert!(!tree.exists(&7));
/// assert_eq!(tree.len(), 4);
/// ```
///
/// A different branching factor is chosen through the type:
///
/// ```
/// use rankbtree::{BTree, NaturalOrder};
///
/// let tree: BTree<u32, NaturalOrder, 3> = (0..100).collect();
/// assert_eq!(tree.max_keys(), 2);
/// assert!(tree.validate().is_ok());
/// ```
pub struct BTree<K, C = NaturalOrder, const ORDER: usize = 5> {
    raw: RawBTree<K, C, ORDER>,
    hooks: Hooks<K, C, ORDER>,
}

/// An iterator over the keys of a [`BTree`] in ascending order.
///
/// This `struct` is created by the [`iter`] method on [`BTree`].
///
/// [`iter`]: BTree::iter
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K, const ORDER: usize> {
    inner: InOrder<'a, K, ORDER>,
    remaining: usize,
}

impl<K> BTree<K> {
    /// Makes a new, empty `BTree` with the natural key order and `ORDER = 5`.
    ///
    /// Does not allocate anything on its own.
    ///
    /// # Examples
    ///
    /// ```
    /// use rankbtree::BTree;
    ///
    /// let mut tree = BTree::new();
    /// tree.insert(1);
    /// assert_eq!(tree.len(), 1);
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<K, C, const ORDER: usize> BTree<K, C, ORDER> {
    /// Makes a new, empty `BTree` ordered by `comparator`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rankbtree::{BTree, ReverseOrder};
    ///
    /// let mut tree: BTree<i32, _> = BTree::with_comparator(ReverseOrder);
    /// tree.extend([1, 3, 2]);
    /// assert_eq!(tree.first(), Some(&3));
    /// ```
    #[must_use]
    pub const fn with_comparator(comparator: C) -> Self {
        Self {
            raw: RawBTree::new(comparator),
            hooks: Hooks::new(),
        }
    }

    pub(crate) fn from_raw(raw: RawBTree<K, C, ORDER>) -> Self {
        Self { raw, hooks: Hooks::new() }
    }

    /// Returns the comparator ordering this tree.
    pub const fn comparator(&self) -> &C {
        self.raw.comparator()
    }

    /// The branching factor: most children an internal node may have.
    #[must_use]
    pub const fn order(&self) -> usize {
        ORDER
    }

    /// Fewest keys a node other than the root may hold.
    #[must_use]
    pub const fn min_keys(&self) -> usize {
        Node::<K, ORDER>::MIN_KEYS
    }

    /// Most keys any node may hold.
    #[must_use]
    pub const fn max_keys(&self) -> usize {
        Node::<K, ORDER>::MAX_KEYS
    }

    /// Returns the number of keys in the tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use rankbtree::BTree;
    ///
    /// let mut tree = BTree::new();
    /// assert_eq!(tree.len(), 0);
    /// tree.insert(1);
    /// tree.insert(1);
    /// assert_eq!(tree.len(), 2);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Same as [`len`](Self::len).
    #[must_use]
    pub const fn size(&self) -> usize {
        self.raw.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.len() == 0
    }

    /// Number of levels between the root and the leaves, both included.
    ///
    /// An empty tree that never held a key has height 0; a lone root leaf has height 1.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Removes every key and frees every node. Hooks stay registered and the
    /// after-change hook fires.
    pub fn clear(&mut self) {
        self.raw.clear();
        self.after_change();
    }

    /// Returns the key at `position`, or `None` if the position no longer names a key.
    ///
    /// # Examples
    ///
    /// ```
    /// use rankbtree::BTree;
    ///
    /// let mut tree = BTree::new();
    /// let position = tree.insert("a");
    /// assert_eq!(tree.get(position), Some(&"a"));
    /// ```
    #[must_use]
    pub fn get(&self, position: Position) -> Option<&K> {
        self.raw.key_at(position.handle(), position.slot())
    }

    /// Position of the key that follows the one at `position` in sorted order.
    ///
    /// Returns `None` for the last key and for positions that no longer name a key.
    ///
    /// # Examples
    ///
    /// ```
    /// use rankbtree::BTree;
    ///
    /// let tree = BTree::from([10, 20, 30]);
    /// let next = tree.next_payload(tree.find(&20).unwrap()).unwrap();
    /// assert_eq!(tree.get(next), Some(&30));
    /// assert!(tree.next_payload(next).is_none());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn next_payload(&self, position: Position) -> Option<Position> {
        self.get(position)?;
        self.raw.successor(position.handle(), position.slot()).map(Position::from_pair)
    }

    /// Position of the key that precedes the one at `position` in sorted order.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn prev_payload(&self, position: Position) -> Option<Position> {
        self.get(position)?;
        self.raw.predecessor(position.handle(), position.slot()).map(Position::from_pair)
    }

    /// Returns the smallest key.
    #[must_use]
    pub fn first(&self) -> Option<&K> {
        let (handle, slot) = self.raw.first_position()?;
        self.raw.key_at(handle, slot)
    }

    /// Returns the largest key.
    #[must_use]
    pub fn last(&self) -> Option<&K> {
        let (handle, slot) = self.raw.last_position()?;
        self.raw.key_at(handle, slot)
    }

    /// Removes and returns the smallest key.
    ///
    /// # Examples
    ///
    /// ```
    /// use rankbtree::BTree;
    ///
    /// let mut tree = BTree::from([2, 1]);
    /// assert_eq!(tree.pop_first(), Some(1));
    /// assert_eq!(tree.pop_first(), Some(2));
    /// assert_eq!(tree.pop_first(), None);
    /// ```
    pub fn pop_first(&mut self) -> Option<K> {
        let removed = self.raw.pop_first()?;
        self.after_remove(&removed);
        Some(removed)
    }

    /// Removes and returns the largest key.
    pub fn pop_last(&mut self) -> Option<K> {
        let removed = self.raw.pop_last()?;
        self.after_remove(&removed);
        Some(removed)
    }

    /// Removes the key at `position`.
    ///
    /// Returns `None`, leaving the tree untouched, when the position no longer names a key.
    ///
    /// # Examples
    ///
    /// ```
    /// use rankbtree::BTree;
    ///
    /// let mut tree = BTree::from([1, 2, 3]);
    /// let position = tree.find(&2).unwrap();
    /// assert_eq!(tree.remove_by_position(position), Some(2));
    /// assert_eq!(tree.to_vec(), [1, 3]);
    /// ```
    pub fn remove_by_position(&mut self, position: Position) -> Option<K> {
        let removed = self.raw.remove_position(position.handle(), position.slot())?;
        self.after_remove(&removed);
        Some(removed)
    }

    /// A cursor starting at `position`, or `None` if the position no longer names a key.
    #[must_use]
    pub fn cursor(&self, position: Position) -> Option<Cursor<'_, K, C, ORDER>> {
        Cursor::new(&self.raw, position)
    }

    /// A view of the node `id`, or `None` if no such node is alive.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_, K, C, ORDER>> {
        NodeRef::new(&self.raw, id.0)
    }

    /// A view of the root node; `None` before the first insertion.
    ///
    /// # Examples
    ///
    /// ```
    /// use rankbtree::BTree;
    ///
    /// let tree: BTree<u32> = (0..5).collect();
    /// let root = tree.root().unwrap();
    /// assert_eq!(root.keys(), &[2]);
    /// assert_eq!(root.children().map(|c| c.payload_count()).collect::<Vec<_>>(), [2, 2]);
    /// ```
    #[must_use]
    pub fn root(&self) -> Option<NodeRef<'_, K, C, ORDER>> {
        NodeRef::new(&self.raw, self.raw.root()?)
    }

    /// Gets an iterator over the keys in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use rankbtree::BTree;
    ///
    /// let tree = BTree::from([3, 1, 2]);
    /// let mut iter = tree.iter();
    /// assert_eq!(iter.next(), Some(&1));
    /// assert_eq!(iter.len(), 2);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, ORDER> {
        Iter {
            inner: self.in_order(),
            remaining: self.len(),
        }
    }

    /// Walks every key with the given strategy.
    ///
    /// # Examples
    ///
    /// ```
    /// use rankbtree::{BTree, Strategy};
    ///
    /// let tree = BTree::from([9, 11, 2, 7, 3]);
    /// let levels: Vec<_> = tree.walk(Strategy::LevelOrder).map(|c| (*c.key, c.level)).collect();
    /// assert_eq!(levels, [(7, 0), (2, 1), (3, 1), (9, 1), (11, 1)]);
    /// ```
    pub fn walk(&self, strategy: Strategy) -> Walk<'_, K, ORDER> {
        Walk::new(self.raw.nodes(), self.raw.root(), strategy)
    }

    /// Ascending walk. Context `n` always carries `rank == n`.
    pub fn in_order(&self) -> InOrder<'_, K, ORDER> {
        InOrder::new(self.raw.nodes(), self.raw.root())
    }

    /// Node-first walk: the keys of a node, then each subtree left to right.
    pub fn pre_order(&self) -> PreOrder<'_, K, ORDER> {
        PreOrder::new(self.raw.nodes(), self.raw.root())
    }

    /// Breadth-first walk, level by level.
    pub fn level_order(&self) -> LevelOrder<'_, K, ORDER> {
        LevelOrder::new(self.raw.nodes(), self.raw.root())
    }

    /// Depth-first walk from an explicit stack, rightmost subtree first.
    pub fn depth_order(&self) -> DepthOrder<'_, K, ORDER> {
        DepthOrder::new(self.raw.nodes(), self.raw.root())
    }
}

impl<K, C: Comparator<K>, const ORDER: usize> BTree<K, C, ORDER> {
    /// Inserts `key` and returns where it was stored.
    ///
    /// Equal keys are kept side by side; inserting one never replaces another. The
    /// after-insert hook fires, then the after-change hook.
    ///
    /// # Examples
    ///
    /// ```
    /// use rankbtree::BTree;
    ///
    /// let mut tree = BTree::new();
    /// tree.insert(5);
    /// let position = tree.insert(5);
    /// assert_eq!(tree.get(position), Some(&5));
    /// assert_eq!(tree.len(), 2);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn insert(&mut self, key: K) -> Position {
        let position = Position::from_pair(self.raw.insert(key));
        self.after_insert(position);
        position
    }

    /// Removes one key equal to `key` and returns it.
    ///
    /// Returns `None`, leaving the tree untouched, when no key is equal. On success the
    /// after-remove hook fires, then the after-change hook.
    ///
    /// # Examples
    ///
    /// ```
    /// use rankbtree::BTree;
    ///
    /// let mut tree = BTree::from([1, 2]);
    /// assert_eq!(tree.remove(&1), Some(1));
    /// assert_eq!(tree.remove(&1), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn remove(&mut self, key: &K) -> Option<K> {
        let removed = self.raw.remove(key)?;
        self.after_remove(&removed);
        Some(removed)
    }

    /// Position of a key equal to `key`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn find(&self, key: &K) -> Option<Position> {
        self.raw.search(key).map(Position::from_pair)
    }

    /// Returns `true` if the tree holds a key equal to `key`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.raw.search(key).is_some()
    }

    /// Returns `true` if the tree holds a key equal to `key`, found by walking the keys
    /// in ascending order and stopping at the first one greater than `key`.
    ///
    /// Gives the same answer as [`contains`](Self::contains).
    ///
    /// # Complexity
    ///
    /// O(n)
    #[must_use]
    pub fn exists(&self, key: &K) -> bool {
        let cmp = self.raw.comparator();
        self.iter()
            .map(|k| cmp.compare(k, key))
            .take_while(|&ordering| ordering != Ordering::Greater)
            .any(|ordering| ordering == Ordering::Equal)
    }

    /// Checks every structural invariant of the tree.
    ///
    /// Trees built through this API are always valid. A failure points at a comparator
    /// that is not a total order or at keys mutated while stored.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.raw.validate()
    }
}

impl<K: Clone, C, const ORDER: usize> BTree<K, C, ORDER> {
    /// Copies the keys out in ascending order.
    #[must_use]
    pub fn to_vec(&self) -> alloc::vec::Vec<K> {
        self.iter().cloned().collect()
    }
}

impl<K, C: Default, const ORDER: usize> Default for BTree<K, C, ORDER> {
    /// Creates an empty `BTree`.
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<K: Clone, C: Clone, const ORDER: usize> Clone for BTree<K, C, ORDER> {
    /// Copies keys, structure and comparator. Hooks are not carried over.
    fn clone(&self) -> Self {
        Self::from_raw(self.raw.clone())
    }
}

impl<K: fmt::Debug, C, const ORDER: usize> fmt::Debug for BTree<K, C, ORDER> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, C: Comparator<K>, const ORDER: usize> Extend<K> for BTree<K, C, ORDER> {
    #[inline]
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        iter.into_iter().for_each(|key| {
            self.insert(key);
        });
    }
}

impl<'a, K: Copy + 'a, C: Comparator<K>, const ORDER: usize> Extend<&'a K> for BTree<K, C, ORDER> {
    fn extend<I: IntoIterator<Item = &'a K>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<K, C: Comparator<K> + Default, const ORDER: usize> FromIterator<K> for BTree<K, C, ORDER> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tree = Self::default();
        tree.extend(iter);
        tree
    }
}

impl<K: Ord, const N: usize> From<[K; N]> for BTree<K> {
    /// Converts a `[K; N]` into a `BTree<K>`.
    ///
    /// ```
    /// use rankbtree::BTree;
    ///
    /// let tree1 = BTree::from([1, 2, 3, 4]);
    /// let tree2: BTree<_> = [1, 2, 3, 4].into();
    /// assert_eq!(tree1.to_vec(), tree2.to_vec());
    /// ```
    fn from(arr: [K; N]) -> Self {
        arr.into_iter().collect()
    }
}

impl<'a, K, C, const ORDER: usize> IntoIterator for &'a BTree<K, C, ORDER> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K, ORDER>;

    fn into_iter(self) -> Iter<'a, K, ORDER> {
        self.iter()
    }
}

impl<'a, K, const ORDER: usize> Iterator for Iter<'a, K, ORDER> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        let context = self.inner.next()?;
        self.remaining -= 1;
        Some(context.key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, const ORDER: usize> ExactSizeIterator for Iter<'_, K, ORDER> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, const ORDER: usize> FusedIterator for Iter<'_, K, ORDER> {}

impl<K: fmt::Debug, const ORDER: usize> fmt::Debug for Iter<'_, K, ORDER> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter").field("remaining", &self.remaining).finish_non_exhaustive()
    }
}
