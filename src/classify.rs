//! Entry classification and header construction.
//!
//! Decides, for each walked entry, what goes into the archive: a bare
//! directory or symlink header, a file copied verbatim, or an xz file whose
//! uncompressed size is resolved up front and whose body comes from `xz -d`.

use std::path::PathBuf;

use tracing::warn;

use crate::archive::{ArchiveHeader, HeaderKind};
use crate::common::{EntryKind, FilesystemEntry};
use crate::error::{Result, StreamError};
use crate::source::{ByteSource, FileSource};
use crate::xz::{self, XzTool};

/// How an entry's body is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Directories and symlinks.
    None,
    /// Raw bytes of the file at this path.
    Passthrough(PathBuf),
    /// Output of `xz -d` on the file at this path.
    Decompress(PathBuf),
}

/// A classified entry: its header plus where its body comes from.
#[derive(Debug, Clone)]
pub struct EntryPlan {
    pub header: ArchiveHeader,
    pub body: Body,
}

impl EntryPlan {
    /// Opens the body source, if the entry has one.
    pub fn open_source(&self, xz: &XzTool) -> Result<Option<Box<dyn ByteSource>>> {
        Ok(match &self.body {
            Body::None => None,
            Body::Passthrough(path) => Some(Box::new(FileSource::open(path)?)),
            Body::Decompress(path) => Some(Box::new(xz.decompress(path)?)),
        })
    }

    pub fn is_decompressed(&self) -> bool {
        matches!(self.body, Body::Decompress(_))
    }
}

/// Classifies `entry` and builds its header.
///
/// For xz files this runs `xz -l` to learn the uncompressed size, so it must
/// complete before anything for this entry reaches the archive.
///
/// `a.xz` is archived as `a`. When a plain `a` sits next to it both entries
/// keep that name and an extractor will overwrite one with the other; this
/// is logged as a warning, not rejected.
pub fn classify(entry: &FilesystemEntry, xz: &XzTool) -> Result<EntryPlan> {
    let name = entry
        .archive_name()
        .ok_or_else(|| StreamError::header(&entry.absolute_path, "path is not valid UTF-8"))?;

    let header = |name: String, size: u64, kind: HeaderKind| ArchiveHeader {
        name,
        size,
        kind,
        mode: entry.permissions,
        mtime: entry.modified_time,
        uid: entry.uid,
        gid: entry.gid,
    };

    let plan = match &entry.kind {
        EntryKind::Directory => EntryPlan {
            header: header(format!("{name}/"), 0, HeaderKind::Directory),
            body: Body::None,
        },
        EntryKind::Symlink(target) => {
            let target = target
                .to_str()
                .ok_or_else(|| StreamError::header(&entry.absolute_path, "link target is not valid UTF-8"))?;
            EntryPlan {
                header: header(name, 0, HeaderKind::Symlink(target.to_string())),
                body: Body::None,
            }
        }
        EntryKind::File if xz::has_xz_suffix(&name) => {
            let stripped = decompressed_name(&name)
                .ok_or_else(|| StreamError::header(&entry.absolute_path, "name is empty once the .xz suffix is removed"))?;
            let plain = entry.absolute_path.with_extension("");
            if plain.symlink_metadata().is_ok() {
                warn!(
                    path = %entry.absolute_path.display(),
                    name = %stripped,
                    "decompressed name collides with a sibling entry"
                );
            }
            let size = xz.uncompressed_size(&entry.absolute_path)?;
            EntryPlan {
                header: header(stripped, size, HeaderKind::Regular),
                body: Body::Decompress(entry.absolute_path.clone()),
            }
        }
        EntryKind::File => EntryPlan {
            header: header(name, entry.size, HeaderKind::Regular),
            body: Body::Passthrough(entry.absolute_path.clone()),
        },
        EntryKind::Other => {
            return Err(StreamError::header(&entry.absolute_path, "unsupported file type (socket, fifo or device)"));
        }
    };
    Ok(plan)
}

/// Drops the `.xz` suffix, refusing names that would end up empty or
/// designate a directory (`sub/.xz`).
fn decompressed_name(name: &str) -> Option<String> {
    let stripped = &name[..name.len() - xz::XZ_SUFFIX.len()];
    if stripped.is_empty() || stripped.ends_with('/') {
        None
    } else {
        Some(stripped.to_string())
    }
}
