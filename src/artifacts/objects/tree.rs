//! Tree object
//!
//! A tree is one directory level: an ordered list of named entries, each a
//! blob or a nested tree. The merge engine reads and writes trees one level
//! at a time; nesting is handled by the walk layer.
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`
//! Each entry: `<mode> <name>\0<20-byte-sha1>`
//!
//! Entries must already be in canonical path order (see
//! `walk::path_order`); deserialization treats a violation, or the same
//! name appearing twice, as corruption of the source tree.

use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::walk::path_order;
use anyhow::Context;
use bytes::Bytes;
use derive_new::new;
use std::cmp::Ordering;
use std::io::{BufRead, Write};

/// One named entry of a tree level
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct TreeEntry {
    pub name: String,
    pub mode: EntryMode,
    pub oid: ObjectId,
}

/// One directory level of a stored tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Build a tree level from entries, validating canonical order
    ///
    /// Fails when entries are out of path order or a name repeats - the
    /// same corruption classes `deserialize` rejects.
    pub fn from_entries(entries: Vec<TreeEntry>) -> anyhow::Result<Self> {
        validate_entry_order(&entries)?;
        Ok(Tree { entries })
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<TreeEntry> {
        self.entries
    }
}

fn validate_entry_order(entries: &[TreeEntry]) -> anyhow::Result<()> {
    for pair in entries.windows(2) {
        let order = path_order::compare(
            pair[0].name.as_bytes(),
            pair[0].mode,
            pair[1].name.as_bytes(),
            pair[1].mode,
        );
        match order {
            Ordering::Less => {}
            Ordering::Equal => {
                anyhow::bail!("corrupt tree: duplicate entry name {:?}", pair[1].name)
            }
            Ordering::Greater => {
                anyhow::bail!(
                    "corrupt tree: entry {:?} sorts before its predecessor {:?}",
                    pair[1].name,
                    pair[0].name
                )
            }
        }
    }

    Ok(())
}

impl Packable for Tree {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut content_bytes = Vec::new();
        for entry in &self.entries {
            let header = format!("{:o} {}", entry.mode.as_u32(), entry.name);
            content_bytes.write_all(header.as_bytes())?;
            content_bytes.push(0);
            entry.oid.write_raw_to(&mut content_bytes)?;
        }

        let mut tree_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), content_bytes.len());
        tree_bytes.write_all(header.as_bytes())?;
        tree_bytes.write_all(&content_bytes)?;

        Ok(Bytes::from(tree_bytes))
    }
}

impl Unpackable for Tree {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let mut entries = Vec::new();
        let mut reader = reader;

        // Reuse scratch buffers to reduce allocs
        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            // Read "mode " (space-delimited)
            let n = reader.read_until(b' ', &mut mode_bytes)?;
            if n == 0 {
                break; // clean EOF: no more entries
            }
            // Must end with ' ' or it's malformed
            if *mode_bytes.last().unwrap() != b' ' {
                return Err(anyhow::anyhow!("unexpected EOF in mode"));
            }
            mode_bytes.pop(); // drop the space

            let mode_str = std::str::from_utf8(&mode_bytes)?;
            let mode = EntryMode::from_octal_str(mode_str)?;

            // Read "name\0"
            name_bytes.clear();
            let n = reader.read_until(b'\0', &mut name_bytes)?;
            if n == 0 || *name_bytes.last().unwrap() != b'\0' {
                return Err(anyhow::anyhow!("unexpected EOF in name"));
            }
            name_bytes.pop(); // drop NUL
            let name = std::str::from_utf8(&name_bytes)?.to_owned();

            // Read object id
            let oid =
                ObjectId::read_raw_from(&mut reader).context("unexpected EOF in object id")?;

            entries.push(TreeEntry::new(name, mode, oid));
        }

        validate_entry_order(&entries)?;

        Ok(Tree { entries })
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }
}
