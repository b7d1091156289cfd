use crate::artifacts::merge::outcome::TreeMergeOutcome;
use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;
use derive_new::new;

/// One staged entry: a path at a merge stage
///
/// Stage 0 is merged content; stages 1/2/3 are the base/ours/theirs
/// versions of a conflicted path. A path is either at stage 0 or at
/// stages 1-3, never both.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct StageEntry {
    /// Slash-joined path relative to the tree root
    pub path: String,
    pub mode: EntryMode,
    pub oid: ObjectId,
    pub stage: u8,
}

/// Flat, path-sorted staged index
///
/// Entries are kept in raw byte order of their full paths (stage as a
/// tiebreak), which is exactly the order a level-by-level walk visits
/// them in when directories are synthesized at their `/`-implied
/// positions.
#[derive(Debug, Clone, Default)]
pub struct StagedIndex {
    entries: Vec<StageEntry>,
}

impl StagedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from entries, sorting and rejecting duplicates
    pub fn from_entries(mut entries: Vec<StageEntry>) -> anyhow::Result<Self> {
        entries.sort_by(|a, b| {
            a.path
                .as_bytes()
                .cmp(b.path.as_bytes())
                .then(a.stage.cmp(&b.stage))
        });

        for pair in entries.windows(2) {
            if pair[0].path == pair[1].path && pair[0].stage == pair[1].stage {
                anyhow::bail!(
                    "duplicate index entry: {:?} at stage {}",
                    pair[1].path,
                    pair[1].stage
                );
            }
        }

        Ok(StagedIndex { entries })
    }

    pub fn entries(&self) -> &[StageEntry] {
        &self.entries
    }

    /// The merged (stage 0) entries, i.e. what a cursor source walks
    pub fn stage0_entries(&self) -> impl Iterator<Item = &StageEntry> {
        self.entries.iter().filter(|entry| entry.stage == 0)
    }

    /// True when any path sits at a conflict stage
    pub fn has_conflicts(&self) -> bool {
        self.entries.iter().any(|entry| entry.stage != 0)
    }

    /// Replace a path's entries with the projection of a merge outcome
    ///
    /// A resolved outcome lands at stage 0; a conflicted one drops the
    /// stage-0 entry and records the surviving base/ours/theirs versions
    /// at stages 1/2/3.
    pub fn record_outcome(&mut self, path: &str, outcome: &TreeMergeOutcome) {
        self.entries.retain(|entry| entry.path != path);

        match outcome {
            TreeMergeOutcome::Resolved { mode, oid } => {
                if !mode.is_missing() {
                    self.push_sorted(StageEntry::new(path.to_string(), *mode, oid.clone(), 0));
                }
            }
            TreeMergeOutcome::Conflicted(conflict) => {
                for (index, stage_entry) in conflict.stages.iter().enumerate() {
                    if let Some((mode, Some(oid))) = stage_entry {
                        self.push_sorted(StageEntry::new(
                            path.to_string(),
                            *mode,
                            oid.clone(),
                            index as u8 + 1,
                        ));
                    }
                }
            }
        }
    }

    fn push_sorted(&mut self, entry: StageEntry) {
        let at = self.entries.partition_point(|existing| {
            existing
                .path
                .as_bytes()
                .cmp(entry.path.as_bytes())
                .then(existing.stage.cmp(&entry.stage))
                .is_lt()
        });
        self.entries.insert(at, entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn oid(fill: char) -> ObjectId {
        ObjectId::try_parse(fill.to_string().repeat(40)).expect("valid oid")
    }

    #[test]
    fn sorts_by_path_bytes_then_stage() {
        let index = StagedIndex::from_entries(vec![
            StageEntry::new("b".to_string(), EntryMode::Regular, oid('1'), 0),
            StageEntry::new("a/x".to_string(), EntryMode::Regular, oid('2'), 0),
            StageEntry::new("a.txt".to_string(), EntryMode::Regular, oid('3'), 0),
        ])
        .expect("index");

        let paths: Vec<&str> = index.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["a.txt", "a/x", "b"]);
    }

    #[test]
    fn projects_outcomes_into_stages() {
        use crate::artifacts::merge::outcome::{ConflictKind, PathConflict, TreeMergeOutcome};

        let mut index = StagedIndex::from_entries(vec![StageEntry::new(
            "f".to_string(),
            EntryMode::Regular,
            oid('1'),
            0,
        )])
        .expect("index");

        // a conflict replaces the merged entry with stages 1-3
        index.record_outcome(
            "f",
            &TreeMergeOutcome::Conflicted(PathConflict {
                stages: [
                    Some((EntryMode::Regular, Some(oid('1')))),
                    Some((EntryMode::Regular, Some(oid('2')))),
                    Some((EntryMode::Regular, Some(oid('3')))),
                ],
                kinds: ConflictKind::CONTENT,
                content: None,
            }),
        );

        assert!(index.has_conflicts());
        let stages: Vec<u8> = index.entries().iter().map(|entry| entry.stage).collect();
        assert_eq!(stages, vec![1, 2, 3]);

        // resolving again returns the path to stage 0
        index.record_outcome(
            "f",
            &TreeMergeOutcome::Resolved {
                mode: EntryMode::Regular,
                oid: oid('4'),
            },
        );

        assert!(!index.has_conflicts());
        assert_eq!(index.entries().len(), 1);
        assert_eq!(index.entries()[0].oid, oid('4'));
    }

    #[test]
    fn rejects_duplicate_path_and_stage() {
        let result = StagedIndex::from_entries(vec![
            StageEntry::new("a".to_string(), EntryMode::Regular, oid('1'), 0),
            StageEntry::new("a".to_string(), EntryMode::Executable, oid('2'), 0),
        ]);

        assert!(result.is_err());
    }
}
