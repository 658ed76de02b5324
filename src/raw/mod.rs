pub(crate) mod arena;
pub(crate) mod handle;
pub(crate) mod node;
pub(crate) mod raw_btree;
mod validate;
