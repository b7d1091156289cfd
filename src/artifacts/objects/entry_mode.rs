/// Mode tag for one tree entry
///
/// `Missing` is the placeholder a walk row carries when a tree lacks the
/// path; it has no octal form and never appears in a serialized tree.
#[derive(Debug, Clone, Copy, Eq, Ord, Default, PartialEq, PartialOrd, Hash)]
pub enum EntryMode {
    #[default]
    Missing,
    Regular,
    Executable,
    Symlink,
    GitLink,
    Tree,
}

impl EntryMode {
    pub fn as_str(&self) -> &str {
        match self {
            EntryMode::Regular => "100644",
            EntryMode::Executable => "100755",
            EntryMode::Symlink => "120000",
            EntryMode::GitLink => "160000",
            EntryMode::Tree => "40000",
            EntryMode::Missing => "0",
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            EntryMode::Regular => 0o100644,
            EntryMode::Executable => 0o100755,
            EntryMode::Symlink => 0o120000,
            EntryMode::GitLink => 0o160000,
            EntryMode::Tree => 0o40000,
            EntryMode::Missing => 0,
        }
    }

    pub fn from_octal_str(value: &str) -> anyhow::Result<Self> {
        match value {
            "100644" => Ok(EntryMode::Regular),
            "100755" => Ok(EntryMode::Executable),
            "120000" => Ok(EntryMode::Symlink),
            "160000" => Ok(EntryMode::GitLink),
            "40000" | "040000" => Ok(EntryMode::Tree),
            _ => Err(anyhow::anyhow!("Invalid entry mode: {}", value)),
        }
    }

    /// The byte implied past the end of an entry's name for sort purposes
    ///
    /// Tree entries order as if their name ended with `/`, everything else
    /// as if it ended with NUL. See `walk::path_order`.
    pub fn sort_suffix(&self) -> u8 {
        match self {
            EntryMode::Tree => b'/',
            _ => 0,
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, EntryMode::Tree)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, EntryMode::Missing)
    }

    /// Regular or executable file, i.e. content with line semantics
    pub fn is_file(&self) -> bool {
        matches!(self, EntryMode::Regular | EntryMode::Executable)
    }
}

impl TryFrom<u32> for EntryMode {
    type Error = anyhow::Error;

    fn try_from(mode: u32) -> anyhow::Result<Self> {
        match mode {
            0o100644 => Ok(EntryMode::Regular),
            0o100755 => Ok(EntryMode::Executable),
            0o120000 => Ok(EntryMode::Symlink),
            0o160000 => Ok(EntryMode::GitLink),
            0o40000 => Ok(EntryMode::Tree),
            _ => Err(anyhow::anyhow!("Invalid entry mode: {:o}", mode)),
        }
    }
}

impl From<EntryMode> for u32 {
    fn from(mode: EntryMode) -> Self {
        mode.as_u32()
    }
}
