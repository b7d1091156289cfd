//! Conflict-aware walk
//!
//! Same lock-step traversal as `SyncedTreeWalk`, plus directory/file
//! conflict handling: when one tree has a flat file where another has a
//! subtree of the same name, the two are folded into a single combined
//! row flagged `is_directory_file_conflict`, even though the subtree may
//! sit later in its own tree's sort order. Descending into such a row
//! presents the file-holding trees as `Missing` underneath, and the
//! folded subtree is never reported again on its own.

use crate::artifacts::walk::entry::WalkRow;
use crate::artifacts::walk::source::TreeSource;
use crate::artifacts::walk::synced_walk::SyncedTreeWalk;

/// Macro for debug logging, enabled with the `debug_walk` feature flag
macro_rules! debug_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "debug_walk")]
        {
            eprintln!($($arg)*);
        }
    };
}

/// Lock-step walk with directory/file-conflict detection
pub struct ConflictAwareTreeWalk<'s> {
    inner: SyncedTreeWalk<'s>,
}

impl<'s> ConflictAwareTreeWalk<'s> {
    /// Open a conflict-aware walk over the root levels of the sources
    pub fn from_sources(sources: &[&'s dyn TreeSource]) -> anyhow::Result<Self> {
        Ok(ConflictAwareTreeWalk {
            inner: SyncedTreeWalk::with_df_detection(sources, true)?,
        })
    }

    pub fn tree_count(&self) -> usize {
        self.inner.tree_count()
    }

    pub fn depth(&self) -> usize {
        self.inner.depth()
    }

    /// Yield the next composite row, or `None` at the end of the walk
    pub fn next_row(&mut self) -> anyhow::Result<Option<WalkRow>> {
        let row = self.inner.next_row()?;

        debug_log!(
            "row {:?}",
            row.as_ref().map(|row| (
                &row.path,
                row.is_directory_file_conflict,
                row.sides.iter().map(|side| side.mode).collect::<Vec<_>>(),
            ))
        );

        Ok(row)
    }

    /// Descend into the subtree(s) of the row just yielded
    pub fn enter_subtree(&mut self) -> anyhow::Result<()> {
        debug_log!("descending at depth {}", self.inner.depth());
        self.inner.enter_subtree()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::entry_mode::EntryMode;
    use crate::artifacts::walk::source::{ListEntry, ListSource};
    use pretty_assertions::assert_eq;

    #[derive(Debug, PartialEq)]
    struct RowView {
        path: String,
        modes: Vec<EntryMode>,
        df: bool,
    }

    fn view(row: &WalkRow) -> RowView {
        RowView {
            path: row.path.clone(),
            modes: row.sides.iter().map(|side| side.mode).collect(),
            df: row.is_directory_file_conflict,
        }
    }

    #[test]
    fn folds_a_file_against_a_later_subtree() {
        // tree0 has flat file "a"; tree1 has only "a/b". In tree1's sort
        // order the subtree "a" comes after "a.txt", behind tree0's flat
        // "a".
        let tree0 = ListSource::new(vec![
            ListEntry::file("a", None),
            ListEntry::file("a.txt", None),
        ]);
        let tree1 = ListSource::new(vec![
            ListEntry::file("a.txt", None),
            ListEntry::dir("a", vec![ListEntry::file("b", None)]),
        ]);

        let mut walk = ConflictAwareTreeWalk::from_sources(&[&tree0, &tree1]).expect("walk");
        let mut rows = Vec::new();

        // row 1: combined file/subtree row for "a"
        let row = walk.next_row().expect("step").expect("row");
        rows.push(view(&row));
        walk.enter_subtree().expect("descend");

        // row 2: "a/b" with tree0 missing
        let row = walk.next_row().expect("step").expect("row");
        rows.push(view(&row));

        // remaining rows: siblings after "a", unflagged
        while let Some(row) = walk.next_row().expect("step") {
            rows.push(view(&row));
        }

        assert_eq!(
            rows,
            vec![
                RowView {
                    path: "a".to_string(),
                    modes: vec![EntryMode::Regular, EntryMode::Tree],
                    df: true,
                },
                RowView {
                    path: "a/b".to_string(),
                    modes: vec![EntryMode::Missing, EntryMode::Regular],
                    df: true,
                },
                RowView {
                    path: "a.txt".to_string(),
                    modes: vec![EntryMode::Regular, EntryMode::Regular],
                    df: false,
                },
            ]
        );
    }

    #[test]
    fn folded_subtree_is_not_reported_again_without_descent() {
        let tree0 = ListSource::new(vec![ListEntry::file("a", None)]);
        let tree1 = ListSource::new(vec![
            ListEntry::file("a.txt", None),
            ListEntry::dir("a", vec![ListEntry::file("b", None)]),
        ]);

        let mut walk = ConflictAwareTreeWalk::from_sources(&[&tree0, &tree1]).expect("walk");
        let mut paths = Vec::new();
        while let Some(row) = walk.next_row().expect("step") {
            // never descend: the folded subtree must not resurface
            paths.push((row.path, row.is_directory_file_conflict));
        }

        assert_eq!(
            paths,
            vec![("a".to_string(), true), ("a.txt".to_string(), false)]
        );
    }

    #[test]
    fn same_position_mixed_modes_flag_without_lookahead() {
        let tree0 = ListSource::new(vec![ListEntry::file("a", None)]);
        let tree1 = ListSource::new(vec![ListEntry::dir("a", vec![ListEntry::file("b", None)])]);

        let mut walk = ConflictAwareTreeWalk::from_sources(&[&tree0, &tree1]).expect("walk");
        let row = walk.next_row().expect("step").expect("row");

        assert!(row.is_directory_file_conflict);
        assert_eq!(row.sides[0].mode, EntryMode::Regular);
        assert_eq!(row.sides[1].mode, EntryMode::Tree);
    }

    #[test]
    fn tree_on_both_sides_missing_in_third_is_not_flagged() {
        let base = ListSource::new(Vec::new());
        let ours = ListSource::new(vec![ListEntry::dir("d", vec![ListEntry::file("x", None)])]);
        let theirs = ListSource::new(vec![ListEntry::dir("d", vec![ListEntry::file("x", None)])]);

        let mut walk =
            ConflictAwareTreeWalk::from_sources(&[&base, &ours, &theirs]).expect("walk");
        let row = walk.next_row().expect("step").expect("row");

        assert_eq!(row.path, "d");
        assert!(!row.is_directory_file_conflict);
    }
}
