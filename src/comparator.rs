use core::cmp::Ordering;

/// A total order over `K`, owned by a [`BTree`](crate::BTree).
///
/// Every closure `Fn(&K, &K) -> Ordering` is a comparator, so ad-hoc orders need no
/// new type:
///
/// ```
/// use rankbtree::BTree;
///
/// let mut by_len: BTree<&str, _> = BTree::with_comparator(|a: &&str, b: &&str| a.len().cmp(&b.len()));
/// by_len.extend(["ccc", "a", "bb"]);
/// assert_eq!(by_len.to_vec(), ["a", "bb", "ccc"]);
/// ```
pub trait Comparator<K: ?Sized> {
    /// Compares two keys.
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// The key type's own [`Ord`] implementation. This is the default comparator.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct NaturalOrder;

/// The reverse of the key type's [`Ord`] implementation.
///
/// ```
/// use rankbtree::{BTree, ReverseOrder};
///
/// let mut tree: BTree<i32, ReverseOrder> = BTree::with_comparator(ReverseOrder);
/// tree.extend([1, 3, 2]);
/// assert_eq!(tree.to_vec(), [3, 2, 1]);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct ReverseOrder;

impl<K: ?Sized + Ord> Comparator<K> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

impl<K: ?Sized + Ord> Comparator<K> for ReverseOrder {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        b.cmp(a)
    }
}

impl<K: ?Sized, F> Comparator<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self(a, b)
    }
}
