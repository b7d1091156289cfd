//! Per-path merge outcomes
//!
//! The tree merger classifies every walked path as resolved or
//! conflicting. Conflicts carry the surviving base/ours/theirs versions
//! (the "stages"), the kinds of disagreement, and - for content
//! conflicts - the full chunk-level merge result, so callers can report
//! or format conflicts without re-parsing marker text.

use crate::artifacts::merge::algorithm::MergeResult;
use crate::artifacts::merge::formatter::format_merge_result;
use crate::artifacts::merge::sequence::LineSequence;
use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;
use bitflags::bitflags;
use std::io::Write;

bitflags! {
    /// Ways a single path can disagree across the three sides
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ConflictKind: u32 {
        /// Divergent textual edits to the same region
        const CONTENT = 0b00001;
        /// File mode changed differently on both sides
        const MODE = 0b00010;
        /// One side deleted what the other modified
        const DELETE_MODIFY = 0b00100;
        /// A file faces a directory of the same name
        const DIRECTORY_FILE = 0b01000;
        /// Symlink or gitlink disagreement - no textual semantics
        const UNMERGEABLE = 0b10000;
    }
}

/// Sentinel closing each row of the conflict table
pub const CONFLICT_ROW_END: i64 = -1;

/// Side index into conflict stages: base, ours, theirs
pub const STAGE_BASE: usize = 0;
pub const STAGE_OURS: usize = 1;
pub const STAGE_THEIRS: usize = 2;

/// The textual half of a content conflict
///
/// Owns the line sequences the chunk ranges point into, so a conflict
/// can be formatted long after the merge walk moved on.
#[derive(Debug, Clone)]
pub struct ContentConflict {
    pub result: MergeResult,
    /// base, ours, theirs
    pub sequences: Vec<LineSequence>,
}

impl ContentConflict {
    /// Render the conflict with markers, labeling sides by `side_names`
    pub fn format<W: Write>(&self, side_names: &[&str], out: &mut W) -> anyhow::Result<()> {
        let sequences: Vec<&LineSequence> = self.sequences.iter().collect();
        format_merge_result(&self.result, &sequences, side_names, out)
    }
}

/// One conflicting path
#[derive(Debug, Clone)]
pub struct PathConflict {
    /// Surviving versions, indexed base/ours/theirs; `None` where a side
    /// has no leaf at this path (deleted, or a directory instead)
    pub stages: [Option<(EntryMode, Option<ObjectId>)>; 3],
    pub kinds: ConflictKind,
    /// Present for content conflicts only
    pub content: Option<ContentConflict>,
}

impl PathConflict {
    /// The conflict table: one row per conflict, line begin/end offsets
    /// per sequence, closed by `CONFLICT_ROW_END`
    ///
    /// This is the chunk aggregation one level up: enough to report
    /// which lines clash in which version without touching marker text.
    pub fn conflict_table(&self) -> Vec<Vec<i64>> {
        let Some(content) = &self.content else {
            return Vec::new();
        };

        content
            .result
            .conflict_regions()
            .iter()
            .map(|region| {
                let mut row = Vec::with_capacity(region.begins.len() * 2 + 1);
                for (begin, end) in region.begins.iter().zip(&region.ends) {
                    row.push(*begin as i64);
                    row.push(*end as i64);
                }
                row.push(CONFLICT_ROW_END);
                row
            })
            .collect()
    }
}

/// Final classification of one walked path
#[derive(Debug, Clone)]
pub enum TreeMergeOutcome {
    /// One mode/id pair chosen; `Missing` means the path is gone
    Resolved { mode: EntryMode, oid: ObjectId },
    Conflicted(PathConflict),
}

impl TreeMergeOutcome {
    pub fn is_conflict(&self) -> bool {
        matches!(self, TreeMergeOutcome::Conflicted(_))
    }

    pub fn conflict(&self) -> Option<&PathConflict> {
        match self {
            TreeMergeOutcome::Conflicted(conflict) => Some(conflict),
            TreeMergeOutcome::Resolved { .. } => None,
        }
    }
}
