use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;
use derive_new::new;

/// One entry of a loaded tree level, as seen by a cursor
///
/// `oid` is `None` when the source cannot vouch for the entry's content
/// (a working-directory source without a computed hash, or a synthesized
/// directory entry of a staged index). Every equality test in the merge
/// layer treats a missing id as content-unequal.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct WalkEntry {
    pub name: String,
    pub mode: EntryMode,
    pub oid: Option<ObjectId>,
}

/// One tree's contribution to a walk row
///
/// `mode` is `Missing` (and `oid` is `None`) when the tree has no entry at
/// the row's path.
#[derive(Debug, Clone, PartialEq, Eq, Default, new)]
pub struct RowSide {
    pub mode: EntryMode,
    pub oid: Option<ObjectId>,
}

impl RowSide {
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn is_missing(&self) -> bool {
        self.mode.is_missing()
    }
}

/// One composite row of a synchronized walk: a distinct path and what each
/// input tree has there
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkRow {
    /// Slash-joined path from the walk root
    pub path: String,
    /// Last path component
    pub name: String,
    /// Per-input-tree entry, indexed like the walk's cursor list
    pub sides: Vec<RowSide>,
    /// True when this row, or a row above it, mixes a tree with a
    /// non-tree entry at the same name (directory/file conflict)
    pub is_directory_file_conflict: bool,
}

impl WalkRow {
    /// True when at least one side offers a subtree to descend into
    pub fn has_subtree(&self) -> bool {
        self.sides.iter().any(|side| side.mode.is_tree())
    }
}
