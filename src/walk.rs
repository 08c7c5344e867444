//! Directory walker.
//!
//! Produces every descendant of a root directory, parents before children,
//! siblings in file-name order. The root itself is never yielded.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::common::{EntryKind, FilesystemEntry};
use crate::error::{Result, StreamError};
use crate::fsx;

/// Lazy traversal of a directory tree. Not restartable.
pub struct Walker {
    root: PathBuf,
    inner: walkdir::IntoIter,
}

/// Starts a traversal of `root`.
///
/// Fails up front if `root` is missing or is not a directory; later
/// filesystem errors surface as `Err` items from the iterator.
pub fn walk(root: &Path) -> Result<Walker> {
    let md = fs::metadata(root).map_err(|e| StreamError::Walk { path: root.to_path_buf(), source: e })?;
    if !md.is_dir() {
        return Err(StreamError::Walk {
            path: root.to_path_buf(),
            source: io::Error::new(io::ErrorKind::Other, "not a directory"),
        });
    }

    let inner = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();
    Ok(Walker { root: root.to_path_buf(), inner })
}

impl Walker {
    fn to_entry(&self, dent: walkdir::DirEntry) -> Result<FilesystemEntry> {
        let absolute_path = dent.path().to_path_buf();
        let walk_err = |source: io::Error| StreamError::Walk { path: absolute_path.clone(), source };

        let md = dent.metadata().map_err(|e| walk_err(e.into()))?;
        let relative = absolute_path
            .strip_prefix(&self.root)
            .map_err(|_| walk_err(io::Error::new(io::ErrorKind::Other, "entry escapes the scanned root")))?
            .to_path_buf();

        let file_type = dent.file_type();
        let kind = if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else if file_type.is_symlink() {
            EntryKind::Symlink(fs::read_link(&absolute_path).map_err(walk_err)?)
        } else {
            EntryKind::Other
        };
        let (uid, gid) = fsx::owner_ids(&md);

        Ok(FilesystemEntry {
            size: if kind == EntryKind::File { md.len() } else { 0 },
            permissions: fsx::unix_mode(&md),
            modified_time: fsx::mtime_secs(&md),
            absolute_path,
            path: relative,
            kind,
            uid,
            gid,
        })
    }
}

impl Iterator for Walker {
    type Item = Result<FilesystemEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = match self.inner.next()? {
            Ok(dent) => self.to_entry(dent),
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());
                Err(StreamError::Walk { path, source: e.into() })
            }
        };
        Some(item)
    }
}
