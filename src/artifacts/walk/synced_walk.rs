//! Synchronized multi-tree walk
//!
//! Advances N cursors in lock-step and yields one composite row per
//! distinct path: the minimal current path under canonical order, with a
//! `Missing` placeholder for every tree that lacks it. A subtree counts
//! as one logical entry; the caller descends explicitly with
//! `enter_subtree`, which pushes a fresh cursor set onto an explicit
//! stack (no call-stack recursion), and the walk resumes one level above
//! when that set is exhausted.
//!
//! Directory/file-conflict detection is layered on top by
//! `ConflictAwareTreeWalk`; the plain walk never looks ahead and never
//! flags rows.

use crate::artifacts::walk::cursor::Cursor;
use crate::artifacts::walk::entry::{RowSide, WalkEntry, WalkRow};
use crate::artifacts::walk::path_order;
use crate::artifacts::walk::source::TreeSource;
use anyhow::Context;
use std::cmp::Ordering;

/// How one cursor contributes to the row being assembled
enum Contribution {
    /// No entry at the row's path
    Absent,
    /// The cursor's current entry matches the row's path
    Current,
    /// A pending subtree folded in by lookahead, at this level index
    Folded(usize),
}

struct Frame<'s> {
    cursors: Vec<Cursor<'s>>,
    /// Slash-joined prefix of this level; empty at the root
    path_prefix: String,
    /// True when this level sits beneath a directory/file-conflict row
    beneath_df_conflict: bool,
}

struct PendingRow {
    path: String,
    /// Per-cursor entry that produced the row, for `enter_subtree`
    entries: Vec<Option<WalkEntry>>,
    is_directory_file_conflict: bool,
}

/// Lock-step walk over N cursors
pub struct SyncedTreeWalk<'s> {
    frames: Vec<Frame<'s>>,
    pending: Option<PendingRow>,
    detect_df_conflicts: bool,
}

impl<'s> SyncedTreeWalk<'s> {
    /// Open a walk over the root levels of the given sources
    pub fn from_sources(sources: &[&'s dyn TreeSource]) -> anyhow::Result<Self> {
        Self::with_df_detection(sources, false)
    }

    pub(super) fn with_df_detection(
        sources: &[&'s dyn TreeSource],
        detect_df_conflicts: bool,
    ) -> anyhow::Result<Self> {
        if sources.is_empty() {
            anyhow::bail!("a walk needs at least one tree");
        }

        let cursors = sources
            .iter()
            .map(|source| Cursor::from_root(*source))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(SyncedTreeWalk {
            frames: vec![Frame {
                cursors,
                path_prefix: String::new(),
                beneath_df_conflict: false,
            }],
            pending: None,
            detect_df_conflicts,
        })
    }

    /// Number of trees walked in lock-step
    pub fn tree_count(&self) -> usize {
        self.frames[0].cursors.len()
    }

    /// Yield the next composite row, or `None` when every cursor at
    /// every level is exhausted
    pub fn next_row(&mut self) -> anyhow::Result<Option<WalkRow>> {
        loop {
            let Some(frame) = self.frames.last_mut() else {
                return Ok(None);
            };

            if frame.cursors.iter().all(Cursor::eof) {
                if self.frames.len() == 1 {
                    return Ok(None);
                }
                // subtree exhausted: resume at the level above
                self.frames.pop();
                continue;
            }

            return Ok(Some(self.assemble_row()));
        }
    }

    fn assemble_row(&mut self) -> WalkRow {
        let detect_df = self.detect_df_conflicts;
        let frame = self.frames.last_mut().expect("non-empty frame stack");

        // the row's path is the minimum over all current entries; when a
        // file and a tree carry the same name, the file representative
        // wins so the row lands at the name's earliest sort position
        let mut min_index: Option<usize> = None;
        for (index, cursor) in frame.cursors.iter().enumerate() {
            let Some(entry) = cursor.current() else {
                continue;
            };
            match min_index {
                None => min_index = Some(index),
                Some(best) => {
                    let best_entry = frame.cursors[best].current().expect("non-eof cursor");
                    let order = path_order::compare(
                        entry.name.as_bytes(),
                        entry.mode,
                        best_entry.name.as_bytes(),
                        best_entry.mode,
                    );
                    if order == Ordering::Less
                        || (order == Ordering::Equal
                            && best_entry.mode.is_tree()
                            && !entry.mode.is_tree())
                    {
                        min_index = Some(index);
                    }
                }
            }
        }

        let min_index = min_index.expect("at least one non-eof cursor");
        let (min_name, min_mode) = {
            let entry = frame.cursors[min_index].current().expect("non-eof cursor");
            (entry.name.clone(), entry.mode)
        };

        let mut contributions: Vec<Contribution> = frame
            .cursors
            .iter()
            .map(|cursor| match cursor.current() {
                Some(entry)
                    if path_order::compare(
                        entry.name.as_bytes(),
                        entry.mode,
                        min_name.as_bytes(),
                        min_mode,
                    ) == Ordering::Equal =>
                {
                    Contribution::Current
                }
                _ => Contribution::Absent,
            })
            .collect();

        // lookahead: a flat file here may face a subtree of the same
        // name sitting later in another cursor's sort order
        let row_has_flat_entry = frame
            .cursors
            .iter()
            .zip(&contributions)
            .any(|(cursor, contribution)| {
                matches!(contribution, Contribution::Current)
                    && cursor.current().is_some_and(|entry| !entry.mode.is_tree())
            });

        if detect_df && row_has_flat_entry {
            for (cursor, contribution) in frame.cursors.iter().zip(contributions.iter_mut()) {
                if matches!(contribution, Contribution::Absent)
                    && let Some(index) = cursor.find_pending_subtree(&min_name)
                {
                    *contribution = Contribution::Folded(index);
                }
            }
        }

        let mut sides = Vec::with_capacity(frame.cursors.len());
        let mut row_entries = Vec::with_capacity(frame.cursors.len());
        for (cursor, contribution) in frame.cursors.iter_mut().zip(&contributions) {
            match contribution {
                Contribution::Absent => {
                    sides.push(RowSide::missing());
                    row_entries.push(None);
                }
                Contribution::Current => {
                    let entry = cursor.current().expect("matched cursor").clone();
                    sides.push(RowSide::new(entry.mode, entry.oid.clone()));
                    row_entries.push(Some(entry));
                    cursor.advance();
                }
                Contribution::Folded(index) => {
                    let entry = cursor.entry_at(*index).clone();
                    sides.push(RowSide::new(entry.mode, entry.oid.clone()));
                    row_entries.push(Some(entry));
                    cursor.fold(*index);
                }
            }
        }

        let mixes_tree_and_flat = sides.iter().any(|side| side.mode.is_tree())
            && sides
                .iter()
                .any(|side| !side.mode.is_tree() && !side.is_missing());
        let is_directory_file_conflict =
            detect_df && (mixes_tree_and_flat || frame.beneath_df_conflict);

        let path = format!("{}{}", frame.path_prefix, min_name);
        self.pending = Some(PendingRow {
            path: path.clone(),
            entries: row_entries,
            is_directory_file_conflict,
        });

        WalkRow {
            path,
            name: min_name,
            sides,
            is_directory_file_conflict,
        }
    }

    /// Descend into the subtree(s) of the row just yielded
    ///
    /// Cursors whose side of the row is not a tree contribute an empty
    /// cursor below: every path under the prefix reports them `Missing`.
    pub fn enter_subtree(&mut self) -> anyhow::Result<()> {
        let pending = self
            .pending
            .take()
            .context("no current row to descend into")?;

        let frame = self.frames.last().expect("non-empty frame stack");
        let mut children = Vec::with_capacity(frame.cursors.len());
        for (cursor, entry) in frame.cursors.iter().zip(&pending.entries) {
            match entry {
                Some(entry) if entry.mode.is_tree() => {
                    children.push(cursor.enter_subtree(entry)?);
                }
                _ => children.push(Cursor::empty()),
            }
        }

        self.frames.push(Frame {
            cursors: children,
            path_prefix: format!("{}/", pending.path),
            beneath_df_conflict: pending.is_directory_file_conflict,
        });

        Ok(())
    }

    /// Current depth of the walk (0 at the root level)
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::entry_mode::EntryMode;
    use crate::artifacts::walk::source::{ListEntry, ListSource};
    use pretty_assertions::assert_eq;

    fn walk_all(walk: &mut SyncedTreeWalk<'_>) -> Vec<(String, Vec<EntryMode>)> {
        let mut rows = Vec::new();
        while let Some(row) = walk.next_row().expect("walk step") {
            let modes = row.sides.iter().map(|side| side.mode).collect();
            let descend = row.has_subtree();
            rows.push((row.path, modes));
            if descend {
                walk.enter_subtree().expect("descend");
            }
        }
        rows
    }

    #[test]
    fn walks_two_trees_in_lock_step() {
        let left = ListSource::new(vec![
            ListEntry::file("a", None),
            ListEntry::file("b", None),
        ]);
        let right = ListSource::new(vec![
            ListEntry::file("b", None),
            ListEntry::file("c", None),
        ]);

        let mut walk = SyncedTreeWalk::from_sources(&[&left, &right]).expect("walk");
        let rows = walk_all(&mut walk);

        assert_eq!(
            rows,
            vec![
                (
                    "a".to_string(),
                    vec![EntryMode::Regular, EntryMode::Missing]
                ),
                (
                    "b".to_string(),
                    vec![EntryMode::Regular, EntryMode::Regular]
                ),
                (
                    "c".to_string(),
                    vec![EntryMode::Missing, EntryMode::Regular]
                ),
            ]
        );
    }

    #[test]
    fn descends_into_matched_subtrees() {
        let left = ListSource::new(vec![ListEntry::dir(
            "dir",
            vec![ListEntry::file("x", None)],
        )]);
        let right = ListSource::new(vec![ListEntry::dir(
            "dir",
            vec![ListEntry::file("y", None)],
        )]);

        let mut walk = SyncedTreeWalk::from_sources(&[&left, &right]).expect("walk");
        let rows = walk_all(&mut walk);

        assert_eq!(
            rows,
            vec![
                ("dir".to_string(), vec![EntryMode::Tree, EntryMode::Tree]),
                (
                    "dir/x".to_string(),
                    vec![EntryMode::Regular, EntryMode::Missing]
                ),
                (
                    "dir/y".to_string(),
                    vec![EntryMode::Missing, EntryMode::Regular]
                ),
            ]
        );
    }

    #[test]
    fn skipping_a_subtree_advances_past_its_span() {
        let left = ListSource::new(vec![
            ListEntry::dir("dir", vec![ListEntry::file("x", None)]),
            ListEntry::file("z", None),
        ]);

        let mut walk = SyncedTreeWalk::from_sources(&[&left]).expect("walk");
        let mut paths = Vec::new();
        while let Some(row) = walk.next_row().expect("walk step") {
            // never descend
            paths.push(row.path);
        }

        assert_eq!(paths, vec!["dir".to_string(), "z".to_string()]);
    }
}
