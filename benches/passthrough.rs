//! Throughput of pass-through archiving (no decompression involved).
//!
//! Run with:
//!     cargo bench --bench passthrough

use std::fs;
use std::io;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use streamtar::pipeline::{build_archive, ArchiveOptions};
use streamtar::xz::XzTool;

const FILES: usize = 64;
const FILE_SIZE: usize = 256 * 1024;

fn passthrough(c: &mut Criterion) {
    let root = tempfile::tempdir().expect("tempdir");
    for i in 0..FILES {
        let dir = root.path().join(format!("d{}", i % 8));
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join(format!("f{i}.bin")), vec![i as u8; FILE_SIZE]).expect("write");
    }
    let options = ArchiveOptions { xz: XzTool::new("xz", 1) };

    let mut group = c.benchmark_group("passthrough");
    group.throughput(Throughput::Bytes((FILES * FILE_SIZE) as u64));
    group.bench_function("16MiB_tree_to_sink", |b| {
        b.iter(|| build_archive(root.path(), io::sink(), "sink", &options).expect("archive"))
    });
    group.finish();
}

criterion_group!(benches, passthrough);
criterion_main!(benches);
