//! End-to-end archives built with the real `xz` binary. Each test returns
//! early when `xz` is not installed.

mod common;

use common::{read_archive, reference_tree, write_xz, xz_available};
use std::fs;
use streamtar::pipeline::{build_archive, ArchiveOptions};
use streamtar::xz::XzTool;
use tar::EntryType;
use tempfile::tempdir;

fn options() -> ArchiveOptions {
    ArchiveOptions { xz: XzTool::new("xz", 2) }
}

#[test]
fn reference_scenario() {
    if !xz_available() {
        eprintln!("skipping: xz not installed");
        return;
    }
    let root = tempdir().unwrap();
    reference_tree(root.path());

    let (out, stats) = build_archive(root.path(), Vec::new(), "memory", &options()).unwrap();
    let entries = read_archive(&out);
    let summary: Vec<_> = entries.iter().map(|e| (e.name.as_str(), e.kind, e.size)).collect();
    assert_eq!(
        summary,
        [
            ("blob", EntryType::Regular, 100),
            ("sub/", EntryType::Directory, 0),
            ("sub/file.txt", EntryType::Regular, 3),
        ]
    );
    assert_eq!(entries[0].body, vec![b'a'; 100]);
    assert_eq!(entries[2].body, b"abc");
    assert_eq!((stats.decompressed_files, stats.passthrough_files, stats.directories), (1, 1, 1));
}

#[test]
fn large_compressed_file_spans_many_chunks() {
    if !xz_available() {
        eprintln!("skipping: xz not installed");
        return;
    }
    let root = tempdir().unwrap();
    let data: Vec<u8> = (0..3_000_000u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8).collect();
    write_xz(&root.path().join("noise.bin.xz"), &data);

    let (out, _) = build_archive(root.path(), Vec::new(), "memory", &options()).unwrap();
    let entries = read_archive(&out);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "noise.bin");
    assert_eq!(entries[0].size, data.len() as u64);
    assert!(entries[0].body == data);
}

#[test]
fn repeated_runs_are_byte_identical() {
    if !xz_available() {
        eprintln!("skipping: xz not installed");
        return;
    }
    let root = tempdir().unwrap();
    reference_tree(root.path());
    fs::create_dir_all(root.path().join("deep/er/still")).unwrap();
    fs::write(root.path().join("deep/er/still/x.txt"), b"x").unwrap();

    let (first, _) = build_archive(root.path(), Vec::new(), "memory", &options()).unwrap();
    let (second, _) = build_archive(root.path(), Vec::new(), "memory", &options()).unwrap();
    assert!(first == second);
}

#[test]
fn no_entry_leaks_the_root_prefix() {
    if !xz_available() {
        eprintln!("skipping: xz not installed");
        return;
    }
    let root = tempdir().unwrap();
    reference_tree(root.path());
    let prefix = root.path().to_string_lossy().trim_start_matches('/').to_string();

    let (out, _) = build_archive(root.path(), Vec::new(), "memory", &options()).unwrap();
    for e in read_archive(&out) {
        assert!(!e.name.starts_with('/'), "absolute name {}", e.name);
        assert!(!e.name.contains(&prefix), "root prefix in {}", e.name);
    }
}
