//! Tree sources
//!
//! A `TreeSource` hands the walk one directory level at a time. Four
//! sources cover the inputs a merge can see: stored trees, an in-memory
//! entry list, the staged index, and the working directory. The walk's
//! cursor layer is identical across all of them.

use crate::areas::store::ObjectStore;
use crate::areas::workspace::Workspace;
use crate::artifacts::index::StagedIndex;
use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::walk::entry::WalkEntry;
use anyhow::Context;
use derive_new::new;

/// Supplier of tree levels for a cursor
///
/// Every returned level must already be in canonical path order; the
/// cursor validates that once per level and treats a violation as
/// corruption of the source.
pub trait TreeSource {
    /// Entries of the root level
    fn root_entries(&self) -> anyhow::Result<Vec<WalkEntry>>;

    /// Entries of the subtree behind `entry`, whose slash-joined path
    /// from the walk root is `path`
    fn subtree_entries(&self, entry: &WalkEntry, path: &str) -> anyhow::Result<Vec<WalkEntry>>;
}

/// Source with no entries at all
///
/// Stands in for a tree that lacks a whole subtree during a walk.
#[derive(Debug, Default)]
pub struct EmptySource;

impl TreeSource for EmptySource {
    fn root_entries(&self) -> anyhow::Result<Vec<WalkEntry>> {
        Ok(Vec::new())
    }

    fn subtree_entries(&self, _entry: &WalkEntry, _path: &str) -> anyhow::Result<Vec<WalkEntry>> {
        Ok(Vec::new())
    }
}

/// Source reading stored tree objects through an object store
#[derive(new)]
pub struct StoredTreeSource<'a> {
    store: &'a dyn ObjectStore,
    root: ObjectId,
}

impl StoredTreeSource<'_> {
    fn load_level(&self, oid: &ObjectId) -> anyhow::Result<Vec<WalkEntry>> {
        let tree = self.store.read_tree(oid)?;

        Ok(tree
            .into_entries()
            .into_iter()
            .map(|entry| WalkEntry::new(entry.name, entry.mode, Some(entry.oid)))
            .collect())
    }
}

impl TreeSource for StoredTreeSource<'_> {
    fn root_entries(&self) -> anyhow::Result<Vec<WalkEntry>> {
        self.load_level(&self.root)
    }

    fn subtree_entries(&self, entry: &WalkEntry, path: &str) -> anyhow::Result<Vec<WalkEntry>> {
        let oid = entry
            .oid
            .as_ref()
            .with_context(|| format!("missing tree id for {:?}", path))?;

        self.load_level(oid)
            .with_context(|| format!("while reading subtree {:?}", path))
    }
}

/// One node of an in-memory entry list
#[derive(Debug, Clone, new)]
pub struct ListEntry {
    pub name: String,
    pub mode: EntryMode,
    pub oid: Option<ObjectId>,
    pub children: Vec<ListEntry>,
}

impl ListEntry {
    pub fn file(name: &str, oid: Option<ObjectId>) -> Self {
        Self::new(name.to_string(), EntryMode::Regular, oid, Vec::new())
    }

    pub fn dir(name: &str, children: Vec<ListEntry>) -> Self {
        Self::new(name.to_string(), EntryMode::Tree, None, children)
    }
}

/// Source over an in-memory nested entry list
///
/// Levels are handed out exactly as given; ordering mistakes surface as
/// corruption in the cursor, which is what the corruption tests rely on.
#[derive(Debug, new)]
pub struct ListSource {
    root: Vec<ListEntry>,
}

impl ListSource {
    fn level_at(&self, path: &str) -> anyhow::Result<&[ListEntry]> {
        let mut level = self.root.as_slice();

        for component in path.split('/') {
            let node = level
                .iter()
                .find(|entry| entry.name == component && entry.mode.is_tree())
                .with_context(|| format!("no subtree {:?} under {:?}", component, path))?;
            level = node.children.as_slice();
        }

        Ok(level)
    }

    fn to_walk_entries(level: &[ListEntry]) -> Vec<WalkEntry> {
        level
            .iter()
            .map(|entry| WalkEntry::new(entry.name.clone(), entry.mode, entry.oid.clone()))
            .collect()
    }
}

impl TreeSource for ListSource {
    fn root_entries(&self) -> anyhow::Result<Vec<WalkEntry>> {
        Ok(Self::to_walk_entries(&self.root))
    }

    fn subtree_entries(&self, _entry: &WalkEntry, path: &str) -> anyhow::Result<Vec<WalkEntry>> {
        Ok(Self::to_walk_entries(self.level_at(path)?))
    }
}

/// Source over the stage-0 entries of a staged index
///
/// The index is flat; directory entries are synthesized from path
/// prefixes. A synthesized directory carries no object id - its tree has
/// not been written anywhere.
#[derive(Debug, new)]
pub struct IndexSource<'a> {
    index: &'a StagedIndex,
}

impl IndexSource<'_> {
    fn level(&self, prefix: &str) -> Vec<WalkEntry> {
        let mut entries: Vec<WalkEntry> = Vec::new();

        for staged in self.index.stage0_entries() {
            let Some(rest) = staged.path.strip_prefix(prefix) else {
                continue;
            };

            match rest.split_once('/') {
                None => {
                    entries.push(WalkEntry::new(
                        rest.to_string(),
                        staged.mode,
                        Some(staged.oid.clone()),
                    ));
                }
                Some((dir, _)) => {
                    // flat byte order keeps a directory's entries
                    // contiguous, so one look at the last synthesized
                    // entry suffices for dedup
                    let already_there = entries
                        .last()
                        .is_some_and(|last| last.name == dir && last.mode.is_tree());
                    if !already_there {
                        entries.push(WalkEntry::new(dir.to_string(), EntryMode::Tree, None));
                    }
                }
            }
        }

        entries
    }
}

impl TreeSource for IndexSource<'_> {
    fn root_entries(&self) -> anyhow::Result<Vec<WalkEntry>> {
        Ok(self.level(""))
    }

    fn subtree_entries(&self, _entry: &WalkEntry, path: &str) -> anyhow::Result<Vec<WalkEntry>> {
        Ok(self.level(&format!("{}/", path)))
    }
}

/// Source over a working directory
///
/// Entries come back without content ids; the merge layer treats them as
/// modified unless an id is supplied some other way.
#[derive(Debug, new)]
pub struct WorkdirSource<'a> {
    workspace: &'a Workspace,
}

impl TreeSource for WorkdirSource<'_> {
    fn root_entries(&self) -> anyhow::Result<Vec<WalkEntry>> {
        self.workspace.list_level("")
    }

    fn subtree_entries(&self, _entry: &WalkEntry, path: &str) -> anyhow::Result<Vec<WalkEntry>> {
        self.workspace.list_level(path)
    }
}
