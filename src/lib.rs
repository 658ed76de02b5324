//! An order-statistic B-tree with positions, cursors and pluggable traversals.
//!
//! [`BTree`] stores keys in a classic B-tree of configurable branching factor (keys in
//! every node, not only in leaves) and adds:
//!
//! - [`find_by_index`](BTree::find_by_index) / [`get_by_rank`](BTree::get_by_rank) - the
//!   key at a given sorted position, in O(log n)
//! - [`rank_of`](BTree::rank_of) - the sorted position of a key, in O(log n)
//! - [`Position`]s and [`Cursor`]s - `(node, slot)` locators that step to neighbouring
//!   keys or descend into child nodes
//! - Four lazy walks ([`Strategy`]) reporting where every key sits: depth, slot,
//!   sibling offset, parent slot and absolute rank
//! - Lifecycle hooks run after insertions, removals and every other change
//! - An opt-in [`validate`](BTree::validate) pass over all structural invariants
//!
//! # Example
//!
//! ```
//! use rankbtree::{BTree, Rank, Strategy};
//!
//! let mut tree = BTree::new();
//! tree.extend([9, 11, 2, 7, 3, 5, 13, 17, 19]);
//! assert_eq!(tree.height(), 2);
//!
//! assert_eq!(tree.remove(&13), Some(13));
//! assert_eq!(tree.len(), 8);
//! assert_eq!(tree.to_vec(), [2, 3, 5, 7, 9, 11, 17, 19]);
//! assert!(tree.validate().is_ok());
//!
//! // Order statistics.
//! assert_eq!(tree[Rank(3)], 7);
//! assert_eq!(tree.rank_of(&17), Some(6));
//!
//! // The root is visited first in a level-order walk.
//! let first = tree.walk(Strategy::LevelOrder).next().unwrap();
//! assert_eq!((first.level, first.rank), (0, 2));
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - only requires `alloc`
//! - **Arena storage** - nodes live in one slab addressed by small handles; parent
//!   links are plain handles rewritten on every split, merge and rotation
//! - **Logging** - structural events go to the [`log`] facade at `debug`/`trace` level

#![no_std]
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod btree;
mod comparator;
mod error;
mod order_statistic;
mod position;
mod raw;
pub mod traversal;

pub use btree::{BTree, Iter};
pub use comparator::{Comparator, NaturalOrder, ReverseOrder};
pub use error::ValidationError;
pub use order_statistic::Rank;
pub use position::{Cursor, NodeId, NodeRef, Position};
pub use traversal::{Strategy, TraversalContext};
