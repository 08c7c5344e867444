//! Common types shared by the walker, classifier and pipeline.

use std::path::PathBuf;

/// What kind of filesystem object an entry is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    /// Symbolic link, with its target as stored in the link.
    Symlink(PathBuf),
    /// Sockets, FIFOs, device nodes. These cannot be archived.
    Other,
}

/// Metadata for a single file or directory discovered under the scanned root.
#[derive(Debug, Clone)]
pub struct FilesystemEntry {
    pub absolute_path: PathBuf,
    /// Path relative to the scanned root, never empty.
    pub path: PathBuf,
    pub kind: EntryKind,
    pub size: u64,
    pub permissions: u32,
    pub modified_time: u64, // Unix timestamp
    pub uid: u64,
    pub gid: u64,
}

impl FilesystemEntry {
    /// The relative path as a `/`-separated archive name.
    ///
    /// Returns `None` when a component is not valid UTF-8.
    pub fn archive_name(&self) -> Option<String> {
        let mut name = String::new();
        for component in self.path.components() {
            if !name.is_empty() {
                name.push('/');
            }
            name.push_str(component.as_os_str().to_str()?);
        }
        Some(name)
    }
}
