//! Per-tree cursor
//!
//! A cursor materializes one directory level of its source and moves over
//! it by entry count. A whole subtree is one logical entry: advancing past
//! a tree entry skips its span; descending is a separate, explicit
//! `enter_subtree` producing a child cursor with its own owned path
//! buffer.
//!
//! The `folded` markers carry the directory/file-conflict lookahead state:
//! an entry folded into an earlier combined row is skipped when the cursor
//! reaches it naturally, so a subtree is never reported twice.

use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::walk::entry::WalkEntry;
use crate::artifacts::walk::path_order;
use crate::artifacts::walk::source::{EmptySource, TreeSource};
use anyhow::Context;
use std::cmp::Ordering;

static EMPTY_SOURCE: EmptySource = EmptySource;

pub struct Cursor<'s> {
    source: &'s dyn TreeSource,
    /// Slash-joined prefix of this level; empty at the root, otherwise
    /// ends with `/`
    path_prefix: String,
    entries: Vec<WalkEntry>,
    folded: Vec<bool>,
    pos: usize,
}

impl<'s> Cursor<'s> {
    /// Open a cursor over the root level of a source
    pub fn from_root(source: &'s dyn TreeSource) -> anyhow::Result<Self> {
        let entries = source.root_entries()?;
        Self::with_entries(source, String::new(), entries)
    }

    /// A cursor over nothing, standing in for an absent subtree
    pub fn empty() -> Self {
        Cursor {
            source: &EMPTY_SOURCE,
            path_prefix: String::new(),
            entries: Vec::new(),
            folded: Vec::new(),
            pos: 0,
        }
    }

    fn with_entries(
        source: &'s dyn TreeSource,
        path_prefix: String,
        entries: Vec<WalkEntry>,
    ) -> anyhow::Result<Self> {
        validate_level(&entries)
            .with_context(|| format!("corrupt tree level at {:?}", path_prefix))?;

        let folded = vec![false; entries.len()];
        Ok(Cursor {
            source,
            path_prefix,
            entries,
            folded,
            pos: 0,
        })
    }

    pub fn eof(&self) -> bool {
        self.pos >= self.entries.len()
    }

    pub fn current(&self) -> Option<&WalkEntry> {
        self.entries.get(self.pos)
    }

    /// Step past the current logical entry (subtree spans included)
    pub fn advance(&mut self) {
        if self.pos < self.entries.len() {
            self.pos += 1;
        }
        self.skip_folded();
    }

    /// Reposition forward by an entry count
    pub fn move_forward(&mut self, count: usize) {
        self.pos = (self.pos + count).min(self.entries.len());
        self.skip_folded();
    }

    /// Reposition backward by an entry count
    pub fn move_back(&mut self, count: usize) -> anyhow::Result<()> {
        self.pos = self
            .pos
            .checked_sub(count)
            .context("cannot move back past the start of the level")?;

        Ok(())
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn level_len(&self) -> usize {
        self.entries.len()
    }

    /// Entry `offset` steps ahead of the current one, folded or not
    pub fn peek(&self, offset: usize) -> Option<&WalkEntry> {
        self.entries.get(self.pos + offset)
    }

    pub fn entry_at(&self, index: usize) -> &WalkEntry {
        &self.entries[index]
    }

    /// Look ahead for a pending subtree named `name`
    ///
    /// The scan is bounded by canonical order: it stops at the first
    /// entry sorting after the position a tree named `name` would
    /// occupy, so only the entries that can legally sit between a flat
    /// file `name` and a subtree `name` are ever inspected.
    pub fn find_pending_subtree(&self, name: &str) -> Option<usize> {
        for index in self.pos..self.entries.len() {
            if self.folded[index] {
                continue;
            }

            let entry = &self.entries[index];
            let order = path_order::compare(
                entry.name.as_bytes(),
                entry.mode,
                name.as_bytes(),
                EntryMode::Tree,
            );
            match order {
                Ordering::Less => continue,
                Ordering::Equal => return entry.mode.is_tree().then_some(index),
                Ordering::Greater => return None,
            }
        }

        None
    }

    /// Mark a pending entry as consumed by a combined row
    pub fn fold(&mut self, index: usize) {
        self.folded[index] = true;
        self.skip_folded();
    }

    /// Open the child cursor for a subtree entry of this level
    pub fn enter_subtree(&self, entry: &WalkEntry) -> anyhow::Result<Cursor<'s>> {
        let path = self.full_path(&entry.name);
        let entries = self.source.subtree_entries(entry, &path)?;

        Self::with_entries(self.source, format!("{}/", path), entries)
    }

    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    /// Slash-joined path of an entry name at this level
    pub fn full_path(&self, name: &str) -> String {
        format!("{}{}", self.path_prefix, name)
    }

    fn skip_folded(&mut self) {
        while self.pos < self.entries.len() && self.folded[self.pos] {
            self.pos += 1;
        }
    }
}

fn validate_level(entries: &[WalkEntry]) -> anyhow::Result<()> {
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
                anyhow::bail!("duplicate entry name {:?}", pair[1].name)
            }
            Ordering::Greater => {
                anyhow::bail!(
                    "entry {:?} sorts before its predecessor {:?}",
                    pair[1].name,
                    pair[0].name
                )
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::walk::source::{ListEntry, ListSource};
    use pretty_assertions::assert_eq;

    fn source() -> ListSource {
        ListSource::new(vec![
            ListEntry::file("a.txt", None),
            ListEntry::dir("a", vec![ListEntry::file("inner", None)]),
            ListEntry::file("b", None),
        ])
    }

    #[test]
    fn advances_over_a_level() {
        let source = source();
        let mut cursor = Cursor::from_root(&source).expect("cursor");

        assert_eq!(cursor.current().map(|e| e.name.as_str()), Some("a.txt"));
        cursor.advance();
        assert_eq!(cursor.current().map(|e| e.name.as_str()), Some("a"));
        cursor.advance();
        cursor.advance();
        assert!(cursor.eof());
    }

    #[test]
    fn enters_subtrees_with_grown_path() {
        let source = source();
        let mut cursor = Cursor::from_root(&source).expect("cursor");
        cursor.advance();

        let entry = cursor.current().expect("tree entry").clone();
        let child = cursor.enter_subtree(&entry).expect("child cursor");

        assert_eq!(child.path_prefix(), "a/");
        assert_eq!(child.current().map(|e| e.name.as_str()), Some("inner"));
    }

    #[test]
    fn folded_entries_are_skipped() {
        let source = source();
        let mut cursor = Cursor::from_root(&source).expect("cursor");

        let pending = cursor.find_pending_subtree("a").expect("pending subtree");
        cursor.fold(pending);

        cursor.advance();
        assert_eq!(cursor.current().map(|e| e.name.as_str()), Some("b"));
    }

    #[test]
    fn lookahead_is_bounded() {
        let source = ListSource::new(vec![
            ListEntry::file("a.txt", None),
            ListEntry::file("a0", None),
            ListEntry::dir("b", Vec::new()),
        ]);
        let cursor = Cursor::from_root(&source).expect("cursor");

        // "a0" sorts after the position tree "a" would occupy
        assert_eq!(cursor.find_pending_subtree("a"), None);
    }

    #[test]
    fn repositions_by_entry_count() {
        let source = source();
        let mut cursor = Cursor::from_root(&source).expect("cursor");

        assert_eq!(cursor.peek(1).map(|e| e.name.as_str()), Some("a"));
        cursor.move_forward(2);
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.current().map(|e| e.name.as_str()), Some("b"));

        cursor.move_back(2).expect("back inside the level");
        assert_eq!(cursor.current().map(|e| e.name.as_str()), Some("a.txt"));
        assert!(cursor.move_back(1).is_err());

        cursor.move_forward(cursor.level_len());
        assert!(cursor.eof());
    }

    #[test]
    fn rejects_misordered_levels() {
        let source = ListSource::new(vec![ListEntry::file("b", None), ListEntry::file("a", None)]);

        assert!(Cursor::from_root(&source).is_err());
    }
}
