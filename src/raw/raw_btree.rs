use core::cmp::Ordering;

use log::{debug, trace};
use smallvec::smallvec;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{Children, Node};
use crate::comparator::Comparator;

/// The B-tree behind [`BTree`](crate::BTree).
///
/// All nodes live in one arena; the tree owns the root handle, each node lists its
/// children and keeps a non-owning parent handle that is rewritten whenever a subtree
/// changes owner (split, merge, rotation, root collapse).
#[derive(Clone)]
pub(crate) struct RawBTree<K, C, const ORDER: usize> {
    /// Arena storing all tree nodes.
    nodes: Arena<Node<K, ORDER>>,
    /// Root node. Allocated on first insertion and kept (possibly empty) afterwards.
    root: Option<Handle>,
    /// Total number of keys in the tree.
    len: usize,
    cmp: C,
}

impl<K, C, const ORDER: usize> RawBTree<K, C, ORDER> {
    const VALID_ORDER: () = assert!(ORDER >= 3, "a B-tree needs `ORDER >= 3`");

    pub(crate) const fn new(cmp: C) -> Self {
        let () = Self::VALID_ORDER;
        Self {
            nodes: Arena::new(),
            root: None,
            len: 0,
            cmp,
        }
    }

    /// Creates a tree whose arena has room for `nodes` nodes.
    pub(crate) fn with_capacity(nodes: usize, cmp: C) -> Self {
        let () = Self::VALID_ORDER;
        Self {
            nodes: Arena::with_capacity(nodes),
            root: None,
            len: 0,
            cmp,
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    pub(crate) const fn comparator(&self) -> &C {
        &self.cmp
    }

    pub(crate) fn root(&self) -> Option<Handle> {
        self.root
    }

    pub(crate) fn nodes(&self) -> &Arena<Node<K, ORDER>> {
        &self.nodes
    }

    pub(crate) fn node(&self, handle: Handle) -> &Node<K, ORDER> {
        self.nodes.get(handle)
    }

    pub(crate) fn try_node(&self, handle: Handle) -> Option<&Node<K, ORDER>> {
        self.nodes.try_get(handle)
    }

    /// Number of live nodes.
    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.len = 0;
    }

    /// Levels from the root down to the leaves; zero before the first insertion.
    pub(crate) fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.root;
        while let Some(handle) = current {
            height += 1;
            current = self.nodes.get(handle).child(0);
        }
        height
    }

    /// Key at a position, `None` when the position does not address a live slot.
    pub(crate) fn key_at(&self, handle: Handle, slot: usize) -> Option<&K> {
        self.nodes.try_get(handle)?.key(slot)
    }

    fn size_of(&self, handle: Handle) -> usize {
        self.nodes.get(handle).size()
    }

    /// Slot of `child` in its parent's child list.
    pub(crate) fn child_slot(&self, parent: Handle, child: Handle) -> usize {
        self.nodes.get(parent).child_slot_of(child).expect("`RawBTree::child_slot()` - stale parent link!")
    }

    pub(crate) fn leftmost_leaf(&self, mut handle: Handle) -> Handle {
        while let Some(child) = self.nodes.get(handle).child(0) {
            handle = child;
        }
        handle
    }

    pub(crate) fn rightmost_leaf(&self, mut handle: Handle) -> Handle {
        loop {
            let node = self.nodes.get(handle);
            match node.children().last() {
                Some(&child) => handle = child,
                None => return handle,
            }
        }
    }

    pub(crate) fn first_position(&self) -> Option<(Handle, usize)> {
        let leaf = self.leftmost_leaf(self.root?);
        (self.nodes.get(leaf).payload_count() > 0).then_some((leaf, 0))
    }

    pub(crate) fn last_position(&self) -> Option<(Handle, usize)> {
        let leaf = self.rightmost_leaf(self.root?);
        self.nodes.get(leaf).payload_count().checked_sub(1).map(|slot| (leaf, slot))
    }

    /// Position of the in-order successor of `(handle, slot)`.
    pub(crate) fn successor(&self, handle: Handle, slot: usize) -> Option<(Handle, usize)> {
        let node = self.nodes.get(handle);
        if let Some(right) = node.child(slot + 1) {
            return Some((self.leftmost_leaf(right), 0));
        }
        if slot + 1 < node.payload_count() {
            return Some((handle, slot + 1));
        }
        let mut current = handle;
        while let Some(parent) = self.nodes.get(current).parent() {
            let index = self.child_slot(parent, current);
            if index < self.nodes.get(parent).payload_count() {
                return Some((parent, index));
            }
            current = parent;
        }
        None
    }

    /// Position of the in-order predecessor of `(handle, slot)`.
    pub(crate) fn predecessor(&self, handle: Handle, slot: usize) -> Option<(Handle, usize)> {
        let node = self.nodes.get(handle);
        if let Some(left) = node.child(slot) {
            let leaf = self.rightmost_leaf(left);
            return Some((leaf, self.nodes.get(leaf).payload_count() - 1));
        }
        if slot > 0 {
            return Some((handle, slot - 1));
        }
        let mut current = handle;
        while let Some(parent) = self.nodes.get(current).parent() {
            let index = self.child_slot(parent, current);
            if index > 0 {
                return Some((parent, index - 1));
            }
            current = parent;
        }
        None
    }

    /// Absolute in-order rank of the key at `(handle, slot)`.
    pub(crate) fn rank_at(&self, handle: Handle, slot: usize) -> usize {
        let node = self.nodes.get(handle);
        let mut rank = slot + node.children().iter().take(slot + 1).map(|&c| self.size_of(c)).sum::<usize>();
        let mut current = handle;
        while let Some(parent) = self.nodes.get(current).parent() {
            let index = self.child_slot(parent, current);
            let parent_node = self.nodes.get(parent);
            rank += index + parent_node.children()[..index].iter().map(|&c| self.size_of(c)).sum::<usize>();
            current = parent;
        }
        rank
    }

    /// Position of the `rank`-th smallest key, descending by subtree sizes.
    pub(crate) fn select(&self, rank: usize) -> Option<(Handle, usize)> {
        if rank >= self.len {
            return None;
        }
        let mut current = self.root?;
        let mut remaining = rank;
        loop {
            let node = self.nodes.get(current);
            if node.is_leaf() {
                return (remaining < node.payload_count()).then_some((current, remaining));
            }
            let mut next = None;
            for (i, &child) in node.children().iter().enumerate() {
                let child_size = self.size_of(child);
                if remaining < child_size {
                    next = Some(child);
                    break;
                }
                remaining -= child_size;
                if i < node.payload_count() {
                    if remaining == 0 {
                        return Some((current, i));
                    }
                    remaining -= 1;
                }
            }
            debug_assert!(next.is_some(), "`RawBTree::select()` - subtree sizes do not cover rank {rank}");
            current = next?;
        }
    }

    /// Adds one key to the recorded size of `handle` and all its ancestors.
    fn grow_sizes(&mut self, handle: Handle) {
        let mut current = Some(handle);
        while let Some(h) = current {
            let node = self.nodes.get_mut(h);
            node.set_size(node.size() + 1);
            current = node.parent();
        }
    }

    /// Removes one key from the recorded size of `handle` and all its ancestors.
    fn shrink_sizes(&mut self, handle: Handle) {
        let mut current = Some(handle);
        while let Some(h) = current {
            let node = self.nodes.get_mut(h);
            node.set_size(node.size() - 1);
            current = node.parent();
        }
    }

    /// Points every child of `handle` back at it and recomputes its subtree size.
    fn adopt_children(&mut self, handle: Handle) -> usize {
        let children: Children<ORDER> = self.nodes.get(handle).children().iter().copied().collect();
        let mut size = self.nodes.get(handle).payload_count();
        for child in children {
            let child_node = self.nodes.get_mut(child);
            child_node.set_parent(Some(handle));
            size += child_node.size();
        }
        self.nodes.get_mut(handle).set_size(size);
        size
    }

    /// Splits the overfull node `current`, promoting its median into the parent and
    /// repeating upward while parents overflow. A split without a parent grows a new root.
    ///
    /// `tracked` is a position inside `current` that is followed through the splits.
    fn split(&mut self, mut current: Handle, mut tracked: (Handle, usize)) -> (Handle, usize) {
        let mid = Node::<K, ORDER>::MEDIAN;
        loop {
            let (median, right_keys, right_children, total, parent) = {
                let node = self.nodes.get_mut(current);
                let total = node.size();
                let (median, keys, children) = node.split_off();
                (median, keys, children, total, node.parent())
            };
            let right = self.nodes.alloc(Node::from_parts(parent, 0, right_keys, right_children));
            let right_size = self.adopt_children(right);
            self.nodes.get_mut(current).set_size(total - right_size - 1);

            let (parent, slot) = match parent {
                Some(parent) => {
                    let slot = self.child_slot(parent, current);
                    let parent_node = self.nodes.get_mut(parent);
                    parent_node.insert_key(slot, median);
                    parent_node.insert_child(slot + 1, right);
                    (parent, slot)
                }
                None => {
                    let root = self.nodes.alloc(Node::from_parts(None, total, smallvec![median], smallvec![current, right]));
                    self.nodes.get_mut(current).set_parent(Some(root));
                    self.nodes.get_mut(right).set_parent(Some(root));
                    self.root = Some(root);
                    debug!("split {current:?} grew a new root {root:?}");
                    (root, 0)
                }
            };
            trace!("split {current:?} at slot {mid}: right sibling {right:?} under {parent:?}");

            if tracked.0 == current {
                tracked = match tracked.1.cmp(&mid) {
                    Ordering::Less => tracked,
                    Ordering::Equal => (parent, slot),
                    Ordering::Greater => (right, tracked.1 - mid - 1),
                };
            }

            if !self.nodes.get(parent).is_overfull() {
                return tracked;
            }
            current = parent;
        }
    }

    /// Removes the key at a leaf-or-internal position and restores all invariants.
    fn remove_at(&mut self, mut current: Handle, mut slot: usize) -> K {
        loop {
            let node = self.nodes.get(current);
            if node.is_leaf() {
                let removed = self.nodes.get_mut(current).remove_key(slot);
                self.finish_removal(current);
                return removed;
            }

            let left = node.children()[slot];
            let right = node.children()[slot + 1];
            let left_count = self.nodes.get(left).payload_count();
            let right_count = self.nodes.get(right).payload_count();

            if left_count > Node::<K, ORDER>::MIN_KEYS {
                return self.replace_from_predecessor(current, slot, left);
            }
            if right_count > Node::<K, ORDER>::MIN_KEYS {
                let leaf = self.leftmost_leaf(right);
                let successor = self.nodes.get_mut(leaf).remove_key(0);
                let removed = self.replace_key(current, slot, successor);
                trace!("replaced internal key {current:?}[{slot}] with successor from {leaf:?}");
                self.finish_removal(leaf);
                return removed;
            }
            if left_count + 1 + right_count > Node::<K, ORDER>::MAX_KEYS {
                // Odd orders: two minimal children plus the separator do not fit one node.
                return self.replace_from_predecessor(current, slot, left);
            }

            trace!("merging around internal key {current:?}[{slot}] before removal");
            self.merge(current, slot);
            self.fill(current);
            current = left;
            slot = left_count;
        }
    }

    fn replace_from_predecessor(&mut self, current: Handle, slot: usize, left: Handle) -> K {
        let leaf = self.rightmost_leaf(left);
        let predecessor = self.nodes.get_mut(leaf).pop_key().expect("`RawBTree::remove_at()` - empty donor leaf!");
        let removed = self.replace_key(current, slot, predecessor);
        trace!("replaced internal key {current:?}[{slot}] with predecessor from {leaf:?}");
        self.finish_removal(leaf);
        removed
    }

    fn replace_key(&mut self, handle: Handle, slot: usize, key: K) -> K {
        match self.nodes.get_mut(handle).set_key(slot, key) {
            Ok(previous) => previous,
            Err(_) => panic!("`RawBTree::replace_key()` - slot {slot} is out of range!"),
        }
    }

    /// Bookkeeping after a key left `leaf`: sizes, length, underflow repair.
    fn finish_removal(&mut self, leaf: Handle) {
        self.shrink_sizes(leaf);
        self.len -= 1;
        self.fill(leaf);
    }

    /// Restores minimum occupancy of `current`, walking upward while merges cascade.
    ///
    /// Borrows from the left sibling first, then the right sibling, and merges with a
    /// neighbour (left when there is one) otherwise. An empty internal root is replaced
    /// by its only child.
    fn fill(&mut self, mut current: Handle) {
        loop {
            let node = self.nodes.get(current);
            let count = node.payload_count();
            let Some(parent) = node.parent() else {
                if count == 0
                    && let Some(child) = node.child(0)
                {
                    self.nodes.free(current);
                    self.nodes.get_mut(child).set_parent(None);
                    self.root = Some(child);
                    debug!("root {current:?} collapsed into {child:?}");
                }
                return;
            };
            if count >= Node::<K, ORDER>::MIN_KEYS {
                return;
            }

            let slot = self.child_slot(parent, current);
            let parent_node = self.nodes.get(parent);
            let parent_count = parent_node.payload_count();
            let left = slot.checked_sub(1).map(|i| parent_node.children()[i]);
            let right = parent_node.child(slot + 1);

            if let Some(left) = left
                && self.nodes.get(left).can_lend()
            {
                self.rotate_from_left(parent, slot - 1);
                return;
            }
            if let Some(right) = right
                && self.nodes.get(right).can_lend()
            {
                self.rotate_from_right(parent, slot);
                return;
            }

            if left.is_some() {
                self.merge(parent, slot - 1);
            } else {
                debug_assert!(slot < parent_count, "`RawBTree::fill()` - node {current:?} has no sibling");
                self.merge(parent, slot);
            }
            current = parent;
        }
    }

    /// Moves the last key of `children[slot]` up into the parent and the parent's separator
    /// down to the front of `children[slot + 1]`, carrying the donor's last child along.
    fn rotate_from_left(&mut self, parent: Handle, slot: usize) {
        let (donor, receiver) = {
            let node = self.nodes.get(parent);
            (node.children()[slot], node.children()[slot + 1])
        };
        let (key, child) = {
            let node = self.nodes.get_mut(donor);
            let key = node.pop_key().expect("`RawBTree::rotate_from_left()` - donor is empty!");
            (key, node.pop_child())
        };
        let moved = child.map_or(0, |c| self.size_of(c));
        let separator = self.replace_key(parent, slot, key);

        let node = self.nodes.get_mut(receiver);
        node.insert_key(0, separator);
        if let Some(child) = child {
            node.insert_child(0, child);
        }
        node.set_size(node.size() + 1 + moved);
        let node = self.nodes.get_mut(donor);
        node.set_size(node.size() - 1 - moved);
        if let Some(child) = child {
            self.nodes.get_mut(child).set_parent(Some(receiver));
        }
        debug!("rotated a key from {donor:?} through {parent:?}[{slot}] into {receiver:?}");
    }

    /// Mirror of [`Self::rotate_from_left`]: `children[slot + 1]` donates its first key
    /// and first child to `children[slot]`.
    fn rotate_from_right(&mut self, parent: Handle, slot: usize) {
        let (receiver, donor) = {
            let node = self.nodes.get(parent);
            (node.children()[slot], node.children()[slot + 1])
        };
        let (key, child) = {
            let node = self.nodes.get_mut(donor);
            let key = node.remove_key(0);
            let child = if node.is_leaf() { None } else { Some(node.remove_child(0)) };
            (key, child)
        };
        let moved = child.map_or(0, |c| self.size_of(c));
        let separator = self.replace_key(parent, slot, key);

        let node = self.nodes.get_mut(receiver);
        node.push_key(separator);
        if let Some(child) = child {
            node.push_child(child);
        }
        node.set_size(node.size() + 1 + moved);
        let node = self.nodes.get_mut(donor);
        node.set_size(node.size() - 1 - moved);
        if let Some(child) = child {
            self.nodes.get_mut(child).set_parent(Some(receiver));
        }
        debug!("rotated a key from {donor:?} through {parent:?}[{slot}] into {receiver:?}");
    }

    /// Pulls separator `slot` of `parent` down into `children[slot]` and absorbs
    /// `children[slot + 1]`, freeing it. The parent's subtree size is unchanged.
    fn merge(&mut self, parent: Handle, slot: usize) {
        let (separator, left, right) = {
            let node = self.nodes.get_mut(parent);
            let separator = node.remove_key(slot);
            let right = node.remove_child(slot + 1);
            (separator, node.children()[slot], right)
        };
        let (keys, children, right_size) = self.nodes.take(right).into_parts();
        for &child in &children {
            self.nodes.get_mut(child).set_parent(Some(left));
        }
        let node = self.nodes.get_mut(left);
        node.push_key(separator);
        node.absorb(keys, children);
        node.set_size(node.size() + 1 + right_size);
        debug!("merged {right:?} into {left:?} under {parent:?}[{slot}]");
    }

    /// Removes the key at a position. Returns `None` when the position is not live.
    pub(crate) fn remove_position(&mut self, handle: Handle, slot: usize) -> Option<K> {
        self.key_at(handle, slot)?;
        Some(self.remove_at(handle, slot))
    }

    pub(crate) fn pop_first(&mut self) -> Option<K> {
        let (handle, slot) = self.first_position()?;
        Some(self.remove_at(handle, slot))
    }

    pub(crate) fn pop_last(&mut self) -> Option<K> {
        let (handle, slot) = self.last_position()?;
        Some(self.remove_at(handle, slot))
    }
}

impl<K, C: Comparator<K>, const ORDER: usize> RawBTree<K, C, ORDER> {
    /// Finds a stored key equal to `key`.
    pub(crate) fn search(&self, key: &K) -> Option<(Handle, usize)> {
        let mut current = self.root?;
        loop {
            let node = self.nodes.get(current);
            let slot = node.first_slot_for(key, &self.cmp);
            if let Some(found) = node.key(slot)
                && self.cmp.compare(found, key) == Ordering::Equal
            {
                return Some((current, slot));
            }
            current = node.child(slot)?;
        }
    }

    /// Number of stored keys strictly less than `key`.
    pub(crate) fn lower_bound_rank(&self, key: &K) -> usize {
        let Some(mut current) = self.root else {
            return 0;
        };
        let mut rank = 0;
        loop {
            let node = self.nodes.get(current);
            let slot = node.first_slot_for(key, &self.cmp);
            rank += slot;
            match node.child(slot) {
                Some(child) => {
                    rank += node.children()[..slot].iter().map(|&c| self.size_of(c)).sum::<usize>();
                    current = child;
                }
                None => return rank,
            }
        }
    }

    /// Inserts `key`, returning where it ended up after any splits.
    ///
    /// Equal keys are allowed; the new key descends through the lower-bound slot of each
    /// node, so it lands before the equal keys of the leaf it reaches.
    pub(crate) fn insert(&mut self, key: K) -> (Handle, usize) {
        let Some(root) = self.root else {
            let mut leaf = Node::new_leaf(None);
            leaf.push_key(key);
            leaf.set_size(1);
            let handle = self.nodes.alloc(leaf);
            self.root = Some(handle);
            self.len = 1;
            trace!("first key planted in new root {handle:?}");
            return (handle, 0);
        };

        let mut current = root;
        let slot = loop {
            let node = self.nodes.get(current);
            let slot = node.first_slot_for(&key, &self.cmp);
            match node.child(slot) {
                Some(child) => current = child,
                None => break slot,
            }
        };
        trace!("inserting into leaf {current:?} at slot {slot}");

        self.nodes.get_mut(current).insert_key(slot, key);
        self.grow_sizes(current);
        self.len += 1;

        if self.nodes.get(current).is_overfull() {
            self.split(current, (current, slot))
        } else {
            (current, slot)
        }
    }

    /// Removes one stored key equal to `key`.
    pub(crate) fn remove(&mut self, key: &K) -> Option<K> {
        let (handle, slot) = self.search(key)?;
        Some(self.remove_at(handle, slot))
    }
}
