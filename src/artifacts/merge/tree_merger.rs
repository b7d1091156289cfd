//! Three-way tree merge orchestration
//!
//! Walks base/ours/theirs through the conflict-aware walk and decides
//! every path:
//!
//! 1. sides agree -> take ours
//! 2. only theirs changed -> take theirs
//! 3. only ours changed -> take ours
//! 4. subtree rows recurse; a flat entry facing a directory stays a
//!    conflict at the parent path even when everything below merges
//! 5. three disagreeing files go through the line merge; the result is
//!    either new merged content or a content conflict with the full
//!    chunk list attached
//!
//! Conflicts never abort the walk - every path is visited so the caller
//! gets one complete report. Corruption and store failures propagate
//! immediately. A new tree is written only when nothing conflicted.

use crate::areas::store::ObjectStore;
use crate::artifacts::merge::algorithm::merge_sequences;
use crate::artifacts::merge::formatter::merged_bytes;
use crate::artifacts::merge::line_diff::StrictEq;
use crate::artifacts::merge::outcome::{
    ConflictKind, ContentConflict, PathConflict, TreeMergeOutcome,
};
use crate::artifacts::merge::sequence::LineSequence;
use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::TreeEntry;
use crate::artifacts::walk::conflict_walk::ConflictAwareTreeWalk;
use crate::artifacts::walk::entry::{RowSide, WalkRow};
use crate::artifacts::walk::path_order;
use crate::artifacts::walk::source::StoredTreeSource;
use anyhow::Context;
use bytes::Bytes;
use std::collections::BTreeMap;

/// Result of a whole-tree merge
#[derive(Debug)]
pub enum MergeReport {
    /// Clean merge; the id of the newly written tree
    Merged(ObjectId),
    /// At least one path conflicted; no tree was written
    Conflicted(BTreeMap<String, TreeMergeOutcome>),
}

impl MergeReport {
    pub fn is_clean(&self) -> bool {
        matches!(self, MergeReport::Merged(_))
    }
}

/// Three-way merger over stored trees
pub struct TreeMerger<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> TreeMerger<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        TreeMerger { store }
    }

    /// Merge `ours` and `theirs` against their common ancestor `base`
    pub fn merge(
        &self,
        base: &ObjectId,
        ours: &ObjectId,
        theirs: &ObjectId,
    ) -> anyhow::Result<MergeReport> {
        let base_source = StoredTreeSource::new(self.store, base.clone());
        let ours_source = StoredTreeSource::new(self.store, ours.clone());
        let theirs_source = StoredTreeSource::new(self.store, theirs.clone());

        let mut walk =
            ConflictAwareTreeWalk::from_sources(&[&base_source, &ours_source, &theirs_source])?;

        let mut conflicts: BTreeMap<String, TreeMergeOutcome> = BTreeMap::new();
        let mut builder = TreeBuilder::default();

        while let Some(row) = walk.next_row()? {
            self.decide_row(&row, &mut walk, &mut builder, &mut conflicts)?;
        }

        if conflicts.is_empty() {
            Ok(MergeReport::Merged(builder.write_root(self.store)?))
        } else {
            Ok(MergeReport::Conflicted(conflicts))
        }
    }

    fn decide_row(
        &self,
        row: &WalkRow,
        walk: &mut ConflictAwareTreeWalk<'_>,
        builder: &mut TreeBuilder,
        conflicts: &mut BTreeMap<String, TreeMergeOutcome>,
    ) -> anyhow::Result<()> {
        let [base, ours, theirs] = row.sides.as_slice() else {
            anyhow::bail!("a three-way merge walks exactly three trees");
        };

        // rules 1-3: at most one side moved away from the base
        if sides_equal(ours, theirs) || sides_equal(base, theirs) {
            take(builder, &row.path, ours);
            return Ok(());
        }
        if sides_equal(base, ours) {
            take(builder, &row.path, theirs);
            return Ok(());
        }

        if row.has_subtree() {
            let flat_sides = [base, ours, theirs]
                .map(|side| (!side.mode.is_tree() && !side.is_missing()).then(|| side.clone()));

            if flat_sides.iter().any(Option::is_some) {
                // a leaf faces a directory: the identity of the path
                // itself is unresolved, whatever happens below
                let stages = flat_sides.map(|side| side.map(|side| (side.mode, side.oid)));
                conflicts.insert(
                    row.path.clone(),
                    TreeMergeOutcome::Conflicted(PathConflict {
                        stages,
                        kinds: ConflictKind::DIRECTORY_FILE,
                        content: None,
                    }),
                );
            }

            walk.enter_subtree()?;
            return Ok(());
        }

        // all flat, nothing equal: a leaf-level disagreement
        if ours.is_missing() || theirs.is_missing() {
            conflicts.insert(
                row.path.clone(),
                TreeMergeOutcome::Conflicted(PathConflict {
                    stages: stages_of(base, ours, theirs),
                    kinds: ConflictKind::DELETE_MODIFY,
                    content: None,
                }),
            );
            return Ok(());
        }

        if !ours.mode.is_file()
            || !theirs.mode.is_file()
            || !(base.is_missing() || base.mode.is_file())
        {
            // symlinks and gitlinks have no line semantics
            conflicts.insert(
                row.path.clone(),
                TreeMergeOutcome::Conflicted(PathConflict {
                    stages: stages_of(base, ours, theirs),
                    kinds: ConflictKind::UNMERGEABLE,
                    content: None,
                }),
            );
            return Ok(());
        }

        let Some(merged_mode) = resolve_mode(base, ours, theirs) else {
            conflicts.insert(
                row.path.clone(),
                TreeMergeOutcome::Conflicted(PathConflict {
                    stages: stages_of(base, ours, theirs),
                    kinds: ConflictKind::MODE,
                    content: None,
                }),
            );
            return Ok(());
        };

        match self.merge_content(&row.path, base, ours, theirs)? {
            ContentMerge::Clean(content) => {
                let oid = self.store.write_blob(content)?;
                builder.insert(&row.path, merged_mode, oid);
            }
            ContentMerge::Conflicting(content) => {
                conflicts.insert(
                    row.path.clone(),
                    TreeMergeOutcome::Conflicted(PathConflict {
                        stages: stages_of(base, ours, theirs),
                        kinds: ConflictKind::CONTENT,
                        content: Some(content),
                    }),
                );
            }
        }

        Ok(())
    }

    fn merge_content(
        &self,
        path: &str,
        base: &RowSide,
        ours: &RowSide,
        theirs: &RowSide,
    ) -> anyhow::Result<ContentMerge> {
        let base_text = if base.is_missing() {
            Bytes::new()
        } else {
            self.read_side(path, base)?
        };
        let ours_text = self.read_side(path, ours)?;
        let theirs_text = self.read_side(path, theirs)?;

        let sequences = vec![
            LineSequence::from_bytes(base_text),
            LineSequence::from_bytes(ours_text),
            LineSequence::from_bytes(theirs_text),
        ];

        let lines: Vec<Vec<&[u8]>> = sequences.iter().map(LineSequence::lines).collect();
        let slices: Vec<&[&[u8]]> = lines.iter().map(Vec::as_slice).collect();
        let result = merge_sequences(&slices, &StrictEq)?;

        if result.contains_conflicts() {
            Ok(ContentMerge::Conflicting(ContentConflict {
                result,
                sequences,
            }))
        } else {
            let refs: Vec<&LineSequence> = sequences.iter().collect();
            Ok(ContentMerge::Clean(merged_bytes(&result, &refs)?))
        }
    }

    fn read_side(&self, path: &str, side: &RowSide) -> anyhow::Result<Bytes> {
        let oid = side
            .oid
            .as_ref()
            .with_context(|| format!("no content id for {:?}", path))?;

        Ok(self
            .store
            .read_blob(oid)
            .with_context(|| format!("while merging {:?}", path))?
            .into_content())
    }
}

enum ContentMerge {
    Clean(Bytes),
    Conflicting(ContentConflict),
}

fn sides_equal(a: &RowSide, b: &RowSide) -> bool {
    if a.mode != b.mode {
        return false;
    }

    match (&a.oid, &b.oid) {
        // both absent entries are equal; entries without content proof
        // are never equal to anything
        (None, None) => a.is_missing(),
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn take(builder: &mut TreeBuilder, path: &str, side: &RowSide) {
    if side.is_missing() {
        return;
    }
    if let Some(oid) = &side.oid {
        builder.insert(path, side.mode, oid.clone());
    }
}

fn stages_of(base: &RowSide, ours: &RowSide, theirs: &RowSide) -> [Option<(EntryMode, Option<ObjectId>)>; 3] {
    [base, ours, theirs]
        .map(|side| (!side.is_missing()).then(|| (side.mode, side.oid.clone())))
}

/// One side changed the mode, or nobody did; both changing it apart is a
/// conflict
fn resolve_mode(base: &RowSide, ours: &RowSide, theirs: &RowSide) -> Option<EntryMode> {
    if ours.mode == theirs.mode {
        Some(ours.mode)
    } else if base.mode == ours.mode {
        Some(theirs.mode)
    } else if base.mode == theirs.mode {
        Some(ours.mode)
    } else {
        None
    }
}

/// Accumulates resolved entries and writes the merged tree bottom-up
#[derive(Debug, Default)]
struct TreeBuilder {
    entries: BTreeMap<String, BuilderNode>,
}

#[derive(Debug)]
enum BuilderNode {
    Leaf { mode: EntryMode, oid: ObjectId },
    Subtree(TreeBuilder),
}

impl TreeBuilder {
    fn insert(&mut self, path: &str, mode: EntryMode, oid: ObjectId) {
        match path.split_once('/') {
            None => {
                self.entries
                    .insert(path.to_string(), BuilderNode::Leaf { mode, oid });
            }
            Some((dir, rest)) => {
                let node = self
                    .entries
                    .entry(dir.to_string())
                    .or_insert_with(|| BuilderNode::Subtree(TreeBuilder::default()));
                if let BuilderNode::Subtree(subtree) = node {
                    subtree.insert(rest, mode, oid);
                }
            }
        }
    }

    /// Write the root tree; an entirely empty merge result is still a
    /// valid (empty) tree
    fn write_root(self, store: &dyn ObjectStore) -> anyhow::Result<ObjectId> {
        match self.write(store)? {
            Some(oid) => Ok(oid),
            None => store.write_tree(Vec::new()),
        }
    }

    /// Post-order write; empty subtrees are dropped rather than written
    fn write(self, store: &dyn ObjectStore) -> anyhow::Result<Option<ObjectId>> {
        let mut entries = Vec::new();

        for (name, node) in self.entries {
            match node {
                BuilderNode::Leaf { mode, oid } => entries.push(TreeEntry::new(name, mode, oid)),
                BuilderNode::Subtree(subtree) => {
                    if let Some(oid) = subtree.write(store)? {
                        entries.push(TreeEntry::new(name, EntryMode::Tree, oid));
                    }
                }
            }
        }

        if entries.is_empty() {
            return Ok(None);
        }

        entries.sort_by(|a, b| {
            path_order::compare(a.name.as_bytes(), a.mode, b.name.as_bytes(), b.mode)
        });

        Ok(Some(store.write_tree(entries)?))
    }
}
