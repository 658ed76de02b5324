use core::fmt;

use crate::comparator::Comparator;
use crate::raw::handle::Handle;
use crate::raw::node::Node;
use crate::raw::raw_btree::RawBTree;

/// Identifies one node of a [`BTree`](crate::BTree).
///
/// Node identifiers are recycled: once a node is merged away or the root collapses,
/// its identifier may later name a different node.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) Handle);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0.to_index())
    }
}

/// A `(node, slot)` locator for one stored key.
///
/// Positions are plain values and do not borrow the tree. Any insertion or removal may
/// move keys between nodes, after which an old position is stale: looking it up yields
/// `None` or a different key, never a panic.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Position {
    pub(crate) node: NodeId,
    pub(crate) slot: usize,
}

impl Position {
    pub(crate) const fn new(handle: Handle, slot: usize) -> Self {
        Self { node: NodeId(handle), slot }
    }

    pub(crate) const fn from_pair((handle, slot): (Handle, usize)) -> Self {
        Self::new(handle, slot)
    }

    pub(crate) const fn handle(self) -> Handle {
        self.node.0
    }

    /// The node holding the key.
    #[must_use]
    pub const fn node(self) -> NodeId {
        self.node
    }

    /// The key's slot within its node.
    #[must_use]
    pub const fn slot(self) -> usize {
        self.slot
    }
}

/// A read-only view of one node.
pub struct NodeRef<'a, K, C, const ORDER: usize> {
    tree: &'a RawBTree<K, C, ORDER>,
    handle: Handle,
    node: &'a Node<K, ORDER>,
}

impl<K, C, const ORDER: usize> Clone for NodeRef<'_, K, C, ORDER> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, C, const ORDER: usize> Copy for NodeRef<'_, K, C, ORDER> {}

impl<'a, K, C, const ORDER: usize> NodeRef<'a, K, C, ORDER> {
    pub(crate) fn new(tree: &'a RawBTree<K, C, ORDER>, handle: Handle) -> Option<Self> {
        let node = tree.try_node(handle)?;
        Some(Self { tree, handle, node })
    }

    fn related(&self, handle: Handle) -> Self {
        Self {
            tree: self.tree,
            handle,
            node: self.tree.node(handle),
        }
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        NodeId(self.handle)
    }

    /// Number of keys held by this node.
    #[must_use]
    pub fn payload_count(&self) -> usize {
        self.node.payload_count()
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.node.is_leaf()
    }

    /// Number of keys in the subtree rooted at this node.
    #[must_use]
    pub fn subtree_len(&self) -> usize {
        self.node.size()
    }

    /// Key at `index`, or `None` past the last occupied slot.
    #[must_use]
    pub fn key(&self, index: usize) -> Option<&'a K> {
        self.node.key(index)
    }

    #[must_use]
    pub fn keys(&self) -> &'a [K] {
        self.node.keys()
    }

    /// Child at `index`, or `None` for leaves and out-of-range indices.
    #[must_use]
    pub fn child(&self, index: usize) -> Option<Self> {
        self.node.child(index).map(|h| self.related(h))
    }

    pub fn children(&self) -> impl ExactSizeIterator<Item = NodeRef<'a, K, C, ORDER>> {
        self.node.children().iter().map(|&h| self.related(h))
    }

    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.node.parent().map(|h| self.related(h))
    }

    /// Position of the key at `slot`, if that slot is occupied.
    #[must_use]
    pub fn position(&self, slot: usize) -> Option<Position> {
        (slot < self.payload_count()).then_some(Position::new(self.handle, slot))
    }
}

impl<'a, K, C: Comparator<K>, const ORDER: usize> NodeRef<'a, K, C, ORDER> {
    /// Smallest slot whose key is not less than `key`; `payload_count()` when all keys are less.
    #[must_use]
    pub fn first_slot_for(&self, key: &K) -> usize {
        self.node.first_slot_for(key, self.tree.comparator())
    }
}

impl<K: fmt::Debug, C, const ORDER: usize> fmt::Debug for NodeRef<'_, K, C, ORDER> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id())
            .field("keys", &self.keys())
            .field("children", &self.node.children().len())
            .finish()
    }
}

/// A movable position inside a borrowed tree.
///
/// Every move returns whether it happened; a move that would leave the tree keeps the
/// cursor where it was.
///
/// ```
/// use rankbtree::BTree;
///
/// let tree: BTree<u32> = (1..=20).collect();
/// let mut cursor = tree.cursor(tree.find(&10).unwrap()).unwrap();
/// assert!(cursor.successor());
/// assert_eq!(*cursor.key(), 11);
/// assert!(cursor.predecessor() && cursor.predecessor());
/// assert_eq!(*cursor.key(), 9);
/// ```
pub struct Cursor<'a, K, C, const ORDER: usize> {
    tree: &'a RawBTree<K, C, ORDER>,
    handle: Handle,
    slot: usize,
}

impl<K, C, const ORDER: usize> Clone for Cursor<'_, K, C, ORDER> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

impl<'a, K, C, const ORDER: usize> Cursor<'a, K, C, ORDER> {
    pub(crate) fn new(tree: &'a RawBTree<K, C, ORDER>, position: Position) -> Option<Self> {
        tree.key_at(position.handle(), position.slot)?;
        Some(Self {
            tree,
            handle: position.handle(),
            slot: position.slot,
        })
    }

    #[must_use]
    pub fn position(&self) -> Position {
        Position::new(self.handle, self.slot)
    }

    #[must_use]
    pub fn key(&self) -> &'a K {
        self.tree.key_at(self.handle, self.slot).expect("`Cursor::key()` - cursor left its node!")
    }

    /// The node the cursor is in.
    #[must_use]
    pub fn node(&self) -> NodeRef<'a, K, C, ORDER> {
        NodeRef {
            tree: self.tree,
            handle: self.handle,
            node: self.tree.node(self.handle),
        }
    }

    /// Absolute in-order rank of the current key.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.tree.rank_at(self.handle, self.slot)
    }

    fn jump(&mut self, target: Option<(Handle, usize)>) -> bool {
        match target {
            Some((handle, slot)) => {
                self.handle = handle;
                self.slot = slot;
                true
            }
            None => false,
        }
    }

    /// Moves to the next key in sorted order.
    pub fn successor(&mut self) -> bool {
        let next = self.tree.successor(self.handle, self.slot);
        self.jump(next)
    }

    /// Moves to the previous key in sorted order.
    pub fn predecessor(&mut self) -> bool {
        let previous = self.tree.predecessor(self.handle, self.slot);
        self.jump(previous)
    }

    /// Descends into the child left of the current key, landing on its first slot.
    pub fn advance_to_first_child(&mut self) -> bool {
        let child = self.tree.node(self.handle).child(self.slot);
        self.jump(child.map(|h| (h, 0)))
    }

    /// Descends into the child right of the current key, landing on its last slot.
    pub fn advance_to_last_child(&mut self) -> bool {
        let child = self.tree.node(self.handle).child(self.slot + 1);
        let target = child.map(|h| (h, self.tree.node(h).payload_count() - 1));
        self.jump(target)
    }
}

impl<K: fmt::Debug, C, const ORDER: usize> fmt::Debug for Cursor<'_, K, C, ORDER> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor").field("position", &self.position()).field("key", self.key()).finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use crate::{BTree, NaturalOrder};
    use alloc::format;
    use alloc::vec::Vec;

    #[test]
    fn node_ids_display_their_slot() {
        let tree: BTree<u8> = [1, 2, 3].into();
        let root = tree.root().unwrap();
        assert_eq!(format!("{}", root.id()), "#0");
        assert_eq!(root.keys(), &[1, 2, 3]);
    }

    #[test]
    fn child_descent_lands_on_outer_slots() {
        let mut tree: BTree<u32, NaturalOrder, 3> = BTree::default();
        tree.extend(0..15);
        let root = tree.root().unwrap();
        let position = root.position(0).unwrap();
        let mut cursor = tree.cursor(position).unwrap();
        let root_key = *cursor.key();

        let mut left = cursor.clone();
        assert!(left.advance_to_first_child());
        assert_eq!(left.position().slot(), 0);
        assert!(*left.key() < root_key);

        assert!(cursor.advance_to_last_child());
        let child = cursor.node();
        assert_eq!(cursor.position().slot(), child.payload_count() - 1);
        assert!(*cursor.key() > root_key);

        while !cursor.node().is_leaf() {
            assert!(cursor.advance_to_last_child());
        }
        let before = cursor.position();
        assert!(!cursor.advance_to_first_child());
        assert!(!cursor.advance_to_last_child());
        assert_eq!(cursor.position(), before);
    }

    #[test]
    fn cursor_walks_every_key_once() {
        let tree: BTree<u32> = (0..100).rev().collect();
        let mut cursor = tree.cursor(tree.find_by_index(0).unwrap()).unwrap();
        let mut seen = Vec::new();
        loop {
            assert_eq!(cursor.rank(), seen.len());
            seen.push(*cursor.key());
            if !cursor.successor() {
                break;
            }
        }
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
        assert!(!cursor.successor());
        assert_eq!(*cursor.key(), 99);
    }

    #[test]
    fn parent_links_are_visible() {
        let mut tree: BTree<u32, NaturalOrder, 4> = BTree::default();
        tree.extend(0..40);
        let root = tree.root().unwrap();
        assert!(root.parent().is_none());
        for child in root.children() {
            assert_eq!(child.parent().map(|p| p.id()), Some(root.id()));
        }
        assert_eq!(root.subtree_len(), 40);
        assert_eq!(root.first_slot_for(&u32::MAX), root.payload_count());
    }
}
