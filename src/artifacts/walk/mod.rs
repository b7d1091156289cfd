//! Multi-tree traversal
//!
//! The pieces that let several path-sorted trees be walked in lock-step:
//!
//! - `path_order`: the canonical entry comparator everything relies on
//! - `entry`: walk entries and composite rows
//! - `source`: one-level-at-a-time suppliers (stored tree, entry list,
//!   staged index, working directory)
//! - `cursor`: per-tree position over a materialized level
//! - `synced_walk`: N-cursor lock-step traversal
//! - `conflict_walk`: the same walk with directory/file-conflict folding

pub mod conflict_walk;
pub mod cursor;
pub mod entry;
pub mod path_order;
pub mod source;
pub mod synced_walk;
