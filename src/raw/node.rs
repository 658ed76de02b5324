use core::cmp::Ordering;

use smallvec::SmallVec;

use super::handle::Handle;
use crate::comparator::Comparator;

/// Key storage of a node. Holds one key beyond `ORDER - 1` while a split is pending.
pub(crate) type Keys<K, const ORDER: usize> = SmallVec<[K; ORDER]>;
/// Child storage of a node. Spills to the heap only while an internal split is pending.
pub(crate) type Children<const ORDER: usize> = SmallVec<[Handle; ORDER]>;

/// A B-tree node: up to `ORDER - 1` keys, up to `ORDER` children.
///
/// A node without children is a leaf. For internal nodes `children.len() == keys.len() + 1`
/// and `keys[i]` separates `children[i]` (keys not greater) from `children[i + 1]`
/// (keys not less).
#[derive(Clone)]
pub(crate) struct Node<K, const ORDER: usize> {
    // Non-owning back-reference; `None` only for the root.
    parent: Option<Handle>,
    // Number of keys stored in the subtree rooted here.
    size: usize,
    keys: Keys<K, ORDER>,
    children: Children<ORDER>,
}

impl<K, const ORDER: usize> Node<K, ORDER> {
    /// Most keys a settled node may hold.
    pub(crate) const MAX_KEYS: usize = ORDER - 1;
    /// Fewest keys a non-root node may hold.
    pub(crate) const MIN_KEYS: usize = ORDER.div_ceil(2) - 1;
    /// Slot promoted out of an overfull node. For even orders the right half keeps the
    /// extra key, for odd orders both halves are equal.
    pub(crate) const MEDIAN: usize = (ORDER - 1) / 2;

    pub(crate) fn new_leaf(parent: Option<Handle>) -> Self {
        Self {
            parent,
            size: 0,
            keys: SmallVec::new(),
            children: SmallVec::new(),
        }
    }

    /// Builds a node from parts; `size` must already account for the whole subtree.
    pub(crate) fn from_parts(parent: Option<Handle>, size: usize, keys: Keys<K, ORDER>, children: Children<ORDER>) -> Self {
        Self {
            parent,
            size,
            keys,
            children,
        }
    }

    /// Consumes the node, returning its keys, children and subtree size.
    pub(crate) fn into_parts(self) -> (Keys<K, ORDER>, Children<ORDER>, usize) {
        (self.keys, self.children, self.size)
    }

    #[inline]
    pub(crate) fn payload_count(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub(crate) fn is_overfull(&self) -> bool {
        self.keys.len() > Self::MAX_KEYS
    }

    /// True when the node can give a key to a sibling and stay at or above the minimum.
    pub(crate) fn can_lend(&self) -> bool {
        self.keys.len() > Self::MIN_KEYS
    }

    pub(crate) fn parent(&self) -> Option<Handle> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Handle>) {
        self.parent = parent;
    }

    pub(crate) fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn set_size(&mut self, size: usize) {
        self.size = size;
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> Option<&K> {
        self.keys.get(index)
    }

    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    /// Overwrites the key at `index`, returning the previous one.
    /// Out-of-range indices leave the node untouched and hand `key` back as `Err`.
    pub(crate) fn set_key(&mut self, index: usize, key: K) -> Result<K, K> {
        match self.keys.get_mut(index) {
            Some(slot) => Ok(core::mem::replace(slot, key)),
            None => Err(key),
        }
    }

    #[inline]
    pub(crate) fn child(&self, index: usize) -> Option<Handle> {
        self.children.get(index).copied()
    }

    pub(crate) fn children(&self) -> &[Handle] {
        &self.children
    }

    /// Position of `child` among this node's children.
    pub(crate) fn child_slot_of(&self, child: Handle) -> Option<usize> {
        self.children.iter().position(|&c| c == child)
    }

    /// Smallest slot whose key is not less than `key`; `payload_count()` when every key is less.
    ///
    /// Used both as the insertion point and as the child to descend into.
    #[inline]
    pub(crate) fn first_slot_for<C: Comparator<K>>(&self, key: &K, cmp: &C) -> usize {
        self.keys.partition_point(|k| cmp.compare(k, key) == Ordering::Less)
    }

    pub(crate) fn insert_key(&mut self, index: usize, key: K) {
        self.keys.insert(index, key);
    }

    pub(crate) fn remove_key(&mut self, index: usize) -> K {
        self.keys.remove(index)
    }

    pub(crate) fn push_key(&mut self, key: K) {
        self.keys.push(key);
    }

    pub(crate) fn pop_key(&mut self) -> Option<K> {
        self.keys.pop()
    }

    pub(crate) fn insert_child(&mut self, index: usize, child: Handle) {
        self.children.insert(index, child);
    }

    pub(crate) fn remove_child(&mut self, index: usize) -> Handle {
        self.children.remove(index)
    }

    pub(crate) fn push_child(&mut self, child: Handle) {
        self.children.push(child);
    }

    pub(crate) fn pop_child(&mut self) -> Option<Handle> {
        self.children.pop()
    }

    /// Appends the keys and children of an absorbed right sibling.
    pub(crate) fn absorb(&mut self, keys: Keys<K, ORDER>, children: Children<ORDER>) {
        self.keys.extend(keys);
        self.children.extend(children);
    }

    /// Cuts an overfull node at [`Self::MEDIAN`].
    ///
    /// This node keeps keys `[0, MEDIAN)` and children `[0, MEDIAN]`; the median key and
    /// the right half (keys after the median, remaining children) are returned.
    /// Subtree sizes are left to the caller.
    pub(crate) fn split_off(&mut self) -> (K, Keys<K, ORDER>, Children<ORDER>) {
        let mid = Self::MEDIAN;
        let right_keys: Keys<K, ORDER> = self.keys.drain(mid + 1..).collect();
        let right_children: Children<ORDER> =
            if self.is_leaf() { SmallVec::new() } else { self.children.drain(mid + 1..).collect() };
        let median = self.keys.pop().expect("`Node::split_off()` - node has no median key!");
        (median, right_keys, right_children)
    }
}
