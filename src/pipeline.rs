//! The archive-building pipeline.
//!
//! Walker → classifier → byte source → archive writer, one entry at a time on
//! the calling thread. Tar frames cannot interleave, so at most one body
//! source (and so at most one `xz` process) is alive at any moment.

use std::io::Write;
use std::path::Path;

use tracing::{debug, info};

use crate::archive::ArchiveWriter;
use crate::classify::{classify, EntryPlan};
use crate::common::FilesystemEntry;
use crate::error::Result;
use crate::progress::RunStats;
use crate::source::ByteSource;
use crate::walk::walk;
use crate::xz::XzTool;

/// Size of the copy buffer between a body source and the archive.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Settings for one archive run, resolved by the caller.
#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    /// The `xz` binary and its decompression thread hint.
    pub xz: XzTool,
}

/// Streams the tree under `root` into `sink` as a tar archive.
///
/// `target` names the sink in diagnostics. On success the archive has been
/// terminated and flushed and the sink is handed back. On failure the sink
/// holds whatever was written so far, without an end-of-archive marker.
pub fn build_archive<W: Write>(
    root: &Path,
    sink: W,
    target: &str,
    options: &ArchiveOptions,
) -> Result<(W, RunStats)> {
    info!("Processing directory: {}", root.display());
    info!(
        "Using {} xz threads (customize using XZ_NUM_THREADS environment variable)",
        options.xz.threads()
    );

    let mut writer = ArchiveWriter::new(sink, target);
    let mut stats = RunStats::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    for entry in walk(root)? {
        let entry = entry?;
        let (plan, body_len) = write_entry(&mut writer, &entry, &options.xz, &mut buf)?;
        stats.record(&plan, body_len);
    }

    // two trailer blocks
    let archive_bytes = writer.bytes_written() + 1024;
    let sink = writer.finish()?;
    stats.finish(archive_bytes);
    info!("Archive complete: {}", stats);
    Ok((sink, stats))
}

/// Writes one entry: classify, header, body, padding.
///
/// Returns the plan that was executed and the number of body bytes written.
pub fn write_entry<W: Write>(
    writer: &mut ArchiveWriter<W>,
    entry: &FilesystemEntry,
    xz: &XzTool,
    buf: &mut [u8],
) -> Result<(EntryPlan, u64)> {
    info!("{}", entry.path.display());

    let plan = classify(entry, xz)?;
    if plan.is_decompressed() {
        info!("  - uncompressed size: {}", plan.header.size);
    }

    writer.write_header(&plan.header)?;
    if let Some(mut source) = plan.open_source(xz)? {
        stream_body(writer, source.as_mut(), buf)?;
        // a failed decompressor explains a short body better than the count does
        source.finish()?;
    }
    let body_len = writer.finish_entry()?;
    debug!(name = %plan.header.name, body_len, "entry done");
    Ok((plan, body_len))
}

fn stream_body<W: Write>(writer: &mut ArchiveWriter<W>, source: &mut dyn ByteSource, buf: &mut [u8]) -> Result<()> {
    loop {
        let n = source.next_chunk(buf)?;
        if n == 0 {
            return Ok(());
        }
        writer.write_body(&buf[..n])?;
    }
}
