/// A zero-based rank into the sorted order of a [`BTree`](crate::BTree).
///
/// # Examples
///
/// ```
/// use rankbtree::{BTree, Rank};
///
/// let tree = BTree::from(["b", "a", "c"]);
/// assert_eq!(tree[Rank(0)], "a");
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Rank(pub usize);
