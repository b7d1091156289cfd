//! Object store contract
//!
//! The merge engine reads blob and tree content by id and writes merged
//! blobs and trees back out, nothing more. Both the loose-object
//! `Database` and the test-oriented `MemoryStore` implement this trait;
//! the engine does not care which one it is handed.

use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::{Tree, TreeEntry};
use anyhow::Context;
use bytes::Bytes;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Cursor;

/// Read/write access to an object database
///
/// `write_tree` requires its entries to already be in canonical path
/// order; emitting them in order is the caller's job, not the store's.
/// Implementations must be safe for any number of concurrent readers;
/// writes are serialized by the caller (one writer per merge operation).
pub trait ObjectStore {
    /// Read a serialized object (header included) by id
    ///
    /// Fails when no object with this id exists.
    fn read(&self, oid: &ObjectId) -> anyhow::Result<Bytes>;

    /// Write blob content, returning its id
    fn write_blob(&self, content: Bytes) -> anyhow::Result<ObjectId>;

    /// Write one tree level, returning its id
    fn write_tree(&self, entries: Vec<TreeEntry>) -> anyhow::Result<ObjectId>;

    /// Read and parse a blob object
    fn read_blob(&self, oid: &ObjectId) -> anyhow::Result<Blob> {
        let (object_type, reader) = self.read_typed(oid)?;
        match object_type {
            ObjectType::Blob => Blob::deserialize(reader),
            other => Err(anyhow::anyhow!("object {} is a {}, not a blob", oid, other)),
        }
    }

    /// Read and parse one tree level
    fn read_tree(&self, oid: &ObjectId) -> anyhow::Result<Tree> {
        let (object_type, reader) = self.read_typed(oid)?;
        match object_type {
            ObjectType::Tree => {
                Tree::deserialize(reader).with_context(|| format!("in tree object {}", oid))
            }
            other => Err(anyhow::anyhow!("object {} is a {}, not a tree", oid, other)),
        }
    }

    /// Read an object and split off its type header
    fn read_typed(&self, oid: &ObjectId) -> anyhow::Result<(ObjectType, Cursor<Bytes>)> {
        let content = self.read(oid)?;
        let mut reader = Cursor::new(content);
        let object_type = ObjectType::parse_object_type(&mut reader)
            .with_context(|| format!("malformed header in object {}", oid))?;

        Ok((object_type, reader))
    }
}

/// In-memory object store
///
/// Backs the test suites and any embedding caller that wants a scratch
/// store. Single-threaded by design, like the engine itself.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RefCell<HashMap<ObjectId, Bytes>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.borrow().is_empty()
    }

    fn store_object(&self, object: &impl Object) -> anyhow::Result<ObjectId> {
        let oid = object.object_id()?;
        let content = object.serialize()?;
        self.objects.borrow_mut().insert(oid.clone(), content);

        Ok(oid)
    }
}

impl ObjectStore for MemoryStore {
    fn read(&self, oid: &ObjectId) -> anyhow::Result<Bytes> {
        self.objects
            .borrow()
            .get(oid)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("object not found: {}", oid))
    }

    fn write_blob(&self, content: Bytes) -> anyhow::Result<ObjectId> {
        self.store_object(&Blob::new(content))
    }

    fn write_tree(&self, entries: Vec<TreeEntry>) -> anyhow::Result<ObjectId> {
        self.store_object(&Tree::from_entries(entries)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::entry_mode::EntryMode;
    use pretty_assertions::assert_eq;

    #[test]
    fn blob_round_trip() {
        let store = MemoryStore::new();
        let oid = store.write_blob(Bytes::from_static(b"hello\n")).expect("write");

        let blob = store.read_blob(&oid).expect("read");
        assert_eq!(blob.content().as_ref(), b"hello\n");
    }

    #[test]
    fn tree_round_trip() {
        let store = MemoryStore::new();
        let blob_oid = store.write_blob(Bytes::from_static(b"x")).expect("write blob");

        let tree_oid = store
            .write_tree(vec![TreeEntry::new(
                "file.txt".to_string(),
                EntryMode::Regular,
                blob_oid.clone(),
            )])
            .expect("write tree");

        let tree = store.read_tree(&tree_oid).expect("read tree");
        assert_eq!(tree.entries().len(), 1);
        assert_eq!(tree.entries()[0].oid, blob_oid);
    }

    #[test]
    fn read_of_unknown_id_fails() {
        let store = MemoryStore::new();
        let oid = ObjectId::try_parse("f".repeat(40)).expect("valid oid");

        assert!(store.read(&oid).is_err());
    }
}
