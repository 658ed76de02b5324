use alloc::boxed::Box;

use super::BTree;
use crate::position::Position;

type KeyHook<K, C, const ORDER: usize> = Box<dyn FnMut(&BTree<K, C, ORDER>, &K)>;
type TreeHook<K, C, const ORDER: usize> = Box<dyn FnMut(&BTree<K, C, ORDER>)>;

/// Callbacks fired after the tree has settled from a mutation.
pub(super) struct Hooks<K, C, const ORDER: usize> {
    after_insert: Option<KeyHook<K, C, ORDER>>,
    after_remove: Option<KeyHook<K, C, ORDER>>,
    after_change: Option<TreeHook<K, C, ORDER>>,
}

impl<K, C, const ORDER: usize> Hooks<K, C, ORDER> {
    pub(super) const fn new() -> Self {
        Self {
            after_insert: None,
            after_remove: None,
            after_change: None,
        }
    }
}

impl<K, C, const ORDER: usize> BTree<K, C, ORDER> {
    /// Registers a callback run after every insertion with the tree and the inserted key,
    /// replacing any previous one.
    ///
    /// The callback sees the tree in its final, valid state. It only gets shared access,
    /// so it cannot mutate the tree it observes.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::cell::RefCell;
    /// use std::rc::Rc;
    ///
    /// use rankbtree::BTree;
    ///
    /// let seen = Rc::new(RefCell::new(Vec::new()));
    /// let log = Rc::clone(&seen);
    ///
    /// let mut tree: BTree<i32> = BTree::new();
    /// tree.on_insert(move |tree, key| log.borrow_mut().push((*key, tree.len())));
    /// tree.insert(7);
    /// tree.insert(3);
    /// assert_eq!(*seen.borrow(), [(7, 1), (3, 2)]);
    /// ```
    pub fn on_insert<F>(&mut self, hook: F)
    where
        F: FnMut(&Self, &K) + 'static,
    {
        self.hooks.after_insert = Some(Box::new(hook));
    }

    /// Registers a callback run after every successful removal with the tree and the
    /// removed key, replacing any previous one.
    pub fn on_remove<F>(&mut self, hook: F)
    where
        F: FnMut(&Self, &K) + 'static,
    {
        self.hooks.after_remove = Some(Box::new(hook));
    }

    /// Registers a callback run after every mutation, after the insert or remove
    /// callback, replacing any previous one.
    pub fn on_change<F>(&mut self, hook: F)
    where
        F: FnMut(&Self) + 'static,
    {
        self.hooks.after_change = Some(Box::new(hook));
    }

    /// Unregisters all callbacks.
    pub fn clear_hooks(&mut self) {
        self.hooks = Hooks::new();
    }

    // Each hook is taken out for the duration of its call so it can borrow the tree.

    pub(super) fn after_insert(&mut self, position: Position) {
        if let Some(mut hook) = self.hooks.after_insert.take() {
            if let Some(key) = self.raw.key_at(position.handle(), position.slot()) {
                hook(&*self, key);
            }
            self.hooks.after_insert = Some(hook);
        }
        self.after_change();
    }

    pub(super) fn after_remove(&mut self, key: &K) {
        if let Some(mut hook) = self.hooks.after_remove.take() {
            hook(&*self, key);
            self.hooks.after_remove = Some(hook);
        }
        self.after_change();
    }

    pub(super) fn after_change(&mut self) {
        if let Some(mut hook) = self.hooks.after_change.take() {
            hook(&*self);
            self.hooks.after_change = Some(hook);
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use crate::BTree;

    #[derive(Debug, PartialEq)]
    enum Event {
        Inserted(u32),
        Removed(u32),
        Changed(usize),
    }

    fn recorded_tree() -> (BTree<u32>, Rc<RefCell<Vec<Event>>>) {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut tree = BTree::new();
        let log = Rc::clone(&events);
        tree.on_insert(move |_, key| log.borrow_mut().push(Event::Inserted(*key)));
        let log = Rc::clone(&events);
        tree.on_remove(move |_, key| log.borrow_mut().push(Event::Removed(*key)));
        let log = Rc::clone(&events);
        tree.on_change(move |tree| log.borrow_mut().push(Event::Changed(tree.len())));
        (tree, events)
    }

    #[test]
    fn hooks_fire_in_order() {
        let (mut tree, events) = recorded_tree();
        tree.insert(4);
        tree.insert(8);
        assert_eq!(tree.remove(&4), Some(4));
        assert_eq!(
            *events.borrow(),
            [
                Event::Inserted(4),
                Event::Changed(1),
                Event::Inserted(8),
                Event::Changed(2),
                Event::Removed(4),
                Event::Changed(1)
            ]
        );
    }

    #[test]
    fn missing_key_fires_nothing() {
        let (mut tree, events) = recorded_tree();
        assert_eq!(tree.remove(&1), None);
        assert_eq!(tree.pop_last(), None);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn hooks_see_a_valid_tree() {
        let checks = Rc::new(RefCell::new(0usize));
        let counter = Rc::clone(&checks);
        let mut tree: BTree<u32> = BTree::new();
        tree.on_change(move |tree| {
            assert_eq!(tree.validate(), Ok(()));
            *counter.borrow_mut() += 1;
        });
        tree.extend(0..64);
        for k in (0..64).step_by(3) {
            tree.remove(&k);
        }
        assert_eq!(*checks.borrow(), 64 + 22);
    }

    #[test]
    fn cleared_and_cloned_trees_drop_hooks() {
        let (mut tree, events) = recorded_tree();
        tree.insert(1);
        let mut copy = tree.clone();
        copy.insert(2);
        tree.clear_hooks();
        tree.insert(3);
        assert_eq!(*events.borrow(), [Event::Inserted(1), Event::Changed(1)]);
    }
}
