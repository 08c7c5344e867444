//! Shared helpers for the integration tests.
#![allow(dead_code)]

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use tar::EntryType;

/// One entry read back from an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadEntry {
    pub name: String,
    pub kind: EntryType,
    pub size: u64,
    pub body: Vec<u8>,
}

/// Reads every entry of a (possibly truncated) tar stream.
pub fn read_archive(bytes: &[u8]) -> Vec<ReadEntry> {
    let mut archive = tar::Archive::new(Cursor::new(bytes));
    let mut out = Vec::new();
    for e in archive.entries().expect("archive entries") {
        let mut e = e.expect("archive entry");
        let mut body = Vec::new();
        e.read_to_end(&mut body).expect("entry body");
        out.push(ReadEntry {
            name: e.path().expect("entry path").to_string_lossy().into_owned(),
            kind: e.header().entry_type(),
            size: e.header().size().expect("entry size"),
            body,
        });
    }
    out
}

/// Whether a real `xz` binary is on PATH.
pub fn xz_available() -> bool {
    Command::new("xz").arg("--version").output().map(|o| o.status.success()).unwrap_or(false)
}

/// Writes `data` xz-compressed to `path`.
pub fn write_xz(path: &Path, data: &[u8]) {
    let file = fs::File::create(path).expect("create xz file");
    let mut enc = xz2::write::XzEncoder::new(file, 6);
    enc.write_all(data).expect("compress");
    enc.finish().expect("finish xz stream");
}

/// The tree from the reference scenario: `sub/`, `sub/file.txt` and `blob.xz`.
pub fn reference_tree(root: &Path) {
    fs::create_dir(root.join("sub")).unwrap();
    fs::write(root.join("sub/file.txt"), b"abc").unwrap();
    write_xz(&root.join("blob.xz"), &[b'a'; 100]);
}

/// Installs an executable shell script standing in for `xz`.
///
/// `list` and `decompress` are the shell bodies run for `-l --robot -- FILE`
/// (`$4` is the file) and `-d -c --threads N -- FILE` (`$4` is N, `$6` the
/// file). Invocations without the `--` before the file exit with 65.
#[cfg(unix)]
pub fn fake_xz(dir: &Path, list: &str, decompress: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-xz");
    let body = format!(
        "#!/bin/sh\ncase \"$1\" in\n  --version) exit 0 ;;\n  -l) [ \"$3\" = -- ] || exit 65; {list} ;;\n  -d) [ \"$5\" = -- ] || exit 65; {decompress} ;;\n  *) exit 64 ;;\nesac\n"
    );
    fs::write(&script, body).unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    // another test thread may still hold the file open across a fork; wait until exec works
    for _ in 0..100 {
        match Command::new(&script).arg("--version").status() {
            Err(e) if e.raw_os_error() == Some(26) => std::thread::sleep(std::time::Duration::from_millis(10)),
            _ => break,
        }
    }
    script
}

/// Listing body reporting the file's real length: identity "compression".
pub const LIST_REAL_SIZE: &str =
    "printf 'name\\t%s\\nfile\\t1\\t1\\t10\\t%s\\t0.5\\tCRC64\\t0\\n' \"$4\" \"$(wc -c < \"$4\" | tr -d ' ')\"";

/// Decompression body that copies the file unchanged.
pub const DECOMPRESS_CAT: &str = "cat \"$6\"";
