use bytes::Bytes;
use graft::artifacts::objects::tree::TreeEntry;
use graft::artifacts::walk::path_order;
use graft::{EntryMode, MemoryStore, ObjectId, ObjectStore};
use std::collections::BTreeMap;

/// One file of a fixture tree: path, mode, content
///
/// Gitlink entries get a fabricated id (their target commit never lives
/// in the object store); everything else stores its content as a blob.
pub struct FileSpec {
    pub path: String,
    pub mode: EntryMode,
    pub content: String,
}

impl FileSpec {
    pub fn file(path: &str, content: &str) -> Self {
        FileSpec {
            path: path.to_string(),
            mode: EntryMode::Regular,
            content: content.to_string(),
        }
    }

    pub fn executable(path: &str, content: &str) -> Self {
        FileSpec {
            path: path.to_string(),
            mode: EntryMode::Executable,
            content: content.to_string(),
        }
    }

    pub fn symlink(path: &str, target: &str) -> Self {
        FileSpec {
            path: path.to_string(),
            mode: EntryMode::Symlink,
            content: target.to_string(),
        }
    }

    pub fn gitlink(path: &str, oid_fill: char) -> Self {
        FileSpec {
            path: path.to_string(),
            mode: EntryMode::GitLink,
            content: oid_fill.to_string(),
        }
    }
}

#[derive(Default)]
struct Node {
    leaves: Vec<(String, EntryMode, ObjectId)>,
    dirs: BTreeMap<String, Node>,
}

impl Node {
    fn insert(&mut self, path: &str, mode: EntryMode, oid: ObjectId) {
        match path.split_once('/') {
            None => self.leaves.push((path.to_string(), mode, oid)),
            Some((dir, rest)) => self
                .dirs
                .entry(dir.to_string())
                .or_default()
                .insert(rest, mode, oid),
        }
    }

    fn write(self, store: &MemoryStore) -> ObjectId {
        let mut entries: Vec<TreeEntry> = self
            .leaves
            .into_iter()
            .map(|(name, mode, oid)| TreeEntry::new(name, mode, oid))
            .collect();

        for (name, node) in self.dirs {
            let oid = node.write(store);
            entries.push(TreeEntry::new(name, EntryMode::Tree, oid));
        }

        entries.sort_by(|a, b| {
            path_order::compare(a.name.as_bytes(), a.mode, b.name.as_bytes(), b.mode)
        });

        store.write_tree(entries).expect("write fixture tree")
    }
}

/// Write a whole fixture tree into the store and return its id
pub fn write_tree(store: &MemoryStore, files: &[FileSpec]) -> ObjectId {
    let mut root = Node::default();

    for spec in files {
        let oid = match spec.mode {
            EntryMode::GitLink => {
                ObjectId::try_parse(spec.content.repeat(40)).expect("gitlink id")
            }
            _ => store
                .write_blob(Bytes::copy_from_slice(spec.content.as_bytes()))
                .expect("write fixture blob"),
        };
        root.insert(&spec.path, spec.mode, oid);
    }

    root.write(store)
}

/// Read back the content of a blob at `path` inside a stored tree
pub fn read_file(store: &MemoryStore, tree: &ObjectId, path: &str) -> Option<String> {
    let mut oid = tree.clone();

    let mut components = path.split('/').peekable();
    while let Some(component) = components.next() {
        let level = store.read_tree(&oid).expect("read tree level");
        let entry = level
            .entries()
            .iter()
            .find(|entry| entry.name == component)?
            .clone();

        if components.peek().is_none() {
            if entry.mode == EntryMode::Tree {
                return None;
            }
            let blob = store.read_blob(&entry.oid).expect("read blob");
            return Some(String::from_utf8(blob.content().to_vec()).expect("utf8 blob"));
        }

        if entry.mode != EntryMode::Tree {
            return None;
        }
        oid = entry.oid;
    }

    None
}

/// Find the entry id for `path` inside a stored tree
pub fn entry_oid(store: &MemoryStore, tree: &ObjectId, path: &str) -> Option<ObjectId> {
    let mut oid = tree.clone();

    let mut components = path.split('/').peekable();
    while let Some(component) = components.next() {
        let level = store.read_tree(&oid).expect("read tree level");
        let entry = level
            .entries()
            .iter()
            .find(|entry| entry.name == component)?
            .clone();

        if components.peek().is_none() {
            return Some(entry.oid);
        }
        if entry.mode != EntryMode::Tree {
            return None;
        }
        oid = entry.oid;
    }

    None
}
