use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::walk::entry::WalkEntry;
use crate::artifacts::walk::path_order;
use anyhow::Context;
use bytes::Bytes;
use is_executable::IsExecutable;
use std::path::{Path, PathBuf};

const IGNORED_NAMES: [&str; 2] = [".git", ".graft"];

/// Working directory reader
///
/// Supplies one directory level at a time to the workdir cursor source.
/// Entries come back without content ids - the filesystem cannot vouch
/// for content, so the merge layer treats them as changed unless proven
/// otherwise.
#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// List one directory level, in canonical path order
    ///
    /// `rel` is the slash-joined path of the directory relative to the
    /// workspace root; empty for the root itself.
    pub fn list_level(&self, rel: &str) -> anyhow::Result<Vec<WalkEntry>> {
        let dir_path = self.join(rel);

        if !dir_path.is_dir() {
            anyhow::bail!("not a directory: {:?}", dir_path);
        }

        let mut entries = Vec::new();
        for dir_entry in std::fs::read_dir(&dir_path)
            .with_context(|| format!("Unable to list directory {:?}", dir_path))?
        {
            let dir_entry = dir_entry?;
            let name = dir_entry
                .file_name()
                .into_string()
                .map_err(|name| anyhow::anyhow!("non-UTF-8 file name: {:?}", name))?;

            if IGNORED_NAMES.contains(&name.as_str()) {
                continue;
            }

            let mode = Self::entry_mode(&dir_entry.path())?;
            entries.push(WalkEntry::new(name, mode, None));
        }

        entries.sort_by(|a, b| {
            path_order::compare(a.name.as_bytes(), a.mode, b.name.as_bytes(), b.mode)
        });

        Ok(entries)
    }

    pub fn read_file(&self, rel: &str) -> anyhow::Result<Bytes> {
        let file_path = self.join(rel);
        let content = std::fs::read(&file_path)
            .with_context(|| format!("Unable to read file {:?}", file_path))?;

        Ok(content.into())
    }

    fn entry_mode(path: &Path) -> anyhow::Result<EntryMode> {
        let metadata = std::fs::symlink_metadata(path)
            .with_context(|| format!("Unable to stat {:?}", path))?;

        let mode = if metadata.is_symlink() {
            EntryMode::Symlink
        } else if metadata.is_dir() {
            EntryMode::Tree
        } else if path.is_executable() {
            EntryMode::Executable
        } else {
            EntryMode::Regular
        };

        Ok(mode)
    }

    fn join(&self, rel: &str) -> PathBuf {
        if rel.is_empty() {
            self.path.to_path_buf()
        } else {
            self.path.join(rel)
        }
    }
}
