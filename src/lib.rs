//! graft - a three-way tree and text merge engine
//!
//! Given a common ancestor tree and two divergent trees, `graft` computes
//! a single merged tree, flags irreconcilable differences as conflicts,
//! and renders content conflicts with the usual markers.
//!
//! Two layers do the work. A structural layer walks any number of
//! path-sorted trees in lock-step ([`artifacts::walk`]), detecting when a
//! file on one side faces a directory on another. A textual layer diffs a
//! base line sequence against each side and fuses the edit scripts into
//! annotated chunks ([`artifacts::merge`]). Both are orchestrated by
//! [`TreeMerger`], which reads and writes content through an
//! [`ObjectStore`] and nothing else.
//!
//! ```rust,ignore
//! let merger = TreeMerger::new(&store);
//! match merger.merge(&base_tree, &ours_tree, &theirs_tree)? {
//!     MergeReport::Merged(tree_id) => println!("merged into {}", tree_id),
//!     MergeReport::Conflicted(paths) => {
//!         for (path, outcome) in &paths {
//!             eprintln!("conflict at {}", path);
//!         }
//!     }
//! }
//! ```

pub mod areas;
pub mod artifacts;

pub use areas::database::Database;
pub use areas::store::{MemoryStore, ObjectStore};
pub use areas::workspace::Workspace;
pub use artifacts::merge::algorithm::{
    ConflictState, MergeChunk, MergeResult, merge_sequences,
};
pub use artifacts::merge::formatter::{format_merge_result, merged_bytes};
pub use artifacts::merge::line_diff::{IgnoreWhitespace, LineComparator, StrictEq};
pub use artifacts::merge::outcome::{ConflictKind, PathConflict, TreeMergeOutcome};
pub use artifacts::merge::sequence::LineSequence;
pub use artifacts::merge::tree_merger::{MergeReport, TreeMerger};
pub use artifacts::objects::entry_mode::EntryMode;
pub use artifacts::objects::object_id::ObjectId;
pub use artifacts::walk::conflict_walk::ConflictAwareTreeWalk;
pub use artifacts::walk::synced_walk::SyncedTreeWalk;
