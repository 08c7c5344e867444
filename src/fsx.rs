//! Cross-platform metadata helpers.
//!
//! On Unix the permission bits, owner ids and modification time are read
//! straight from the inode. Elsewhere we fall back to conventional defaults
//! so that archives built on any host still extract with sane modes.

use std::fs::Metadata;
use std::time::UNIX_EPOCH;

/// Default mode for regular files when the platform has no permission bits.
#[cfg(not(unix))]
const FALLBACK_FILE_MODE: u32 = 0o644;
/// Default mode for directories when the platform has no permission bits.
#[cfg(not(unix))]
const FALLBACK_DIR_MODE: u32 = 0o755;

#[cfg(unix)]
/// POSIX permission bits (including setuid/setgid/sticky).
pub fn unix_mode(md: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    md.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
/// Synthesized permission bits: read-only files lose their write bits.
pub fn unix_mode(md: &Metadata) -> u32 {
    let base = if md.is_dir() { FALLBACK_DIR_MODE } else { FALLBACK_FILE_MODE };
    if md.permissions().readonly() {
        base & !0o222
    } else {
        base
    }
}

#[cfg(unix)]
/// Owner uid/gid of the entry.
pub fn owner_ids(md: &Metadata) -> (u64, u64) {
    use std::os::unix::fs::MetadataExt;
    (u64::from(md.uid()), u64::from(md.gid()))
}

#[cfg(not(unix))]
/// No ownership information off Unix: root-owned, like most tar producers.
pub fn owner_ids(_md: &Metadata) -> (u64, u64) {
    (0, 0)
}

/// Modification time as whole seconds since the Unix epoch.
///
/// Timestamps before the epoch, or platforms that cannot report one, are
/// clamped to 0 since tar's mtime field is unsigned.
pub fn mtime_secs(md: &Metadata) -> u64 {
    md.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn mtime_of_fresh_file_is_recent() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("f");
        fs::write(&p, b"x").unwrap();
        let md = fs::metadata(&p).unwrap();
        assert!(mtime_secs(&md) > 1_500_000_000);
    }

    #[cfg(unix)]
    #[test]
    fn unix_mode_strips_file_type_bits() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("f");
        fs::write(&p, b"x").unwrap();
        fs::set_permissions(&p, fs::Permissions::from_mode(0o640)).unwrap();
        let md = fs::metadata(&p).unwrap();
        assert_eq!(unix_mode(&md), 0o640);
    }
}
