//! Staged index
//!
//! A flat, path-sorted view of tracked entries. Stage 0 holds merged
//! content; stages 1/2/3 hold the base/ours/theirs versions of a
//! conflicted path. The walk layer exposes the stage-0 entries as one of
//! its cursor sources; conflicted merge outcomes can be projected into
//! stage entries for callers that keep an index.

pub mod index_entry;

pub use index_entry::{StageEntry, StagedIndex};
