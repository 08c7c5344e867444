//! Run statistics for archive creation.
//!
//! The pipeline is single-threaded, so this is a plain accumulator rather than
//! a shared tracker; it is logged once the archive is closed.

use std::fmt;
use std::time::{Duration, Instant};

use crate::archive::HeaderKind;
use crate::classify::{Body, EntryPlan};

/// Counters for one archive run.
#[derive(Debug, Clone)]
pub struct RunStats {
    pub directories: u64,
    pub symlinks: u64,
    pub passthrough_files: u64,
    pub decompressed_files: u64,
    /// Body bytes written, excluding tar framing.
    pub body_bytes: u64,
    /// Everything handed to the sink, framing and trailer included.
    pub archive_bytes: u64,
    started: Instant,
    elapsed: Option<Duration>,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            directories: 0,
            symlinks: 0,
            passthrough_files: 0,
            decompressed_files: 0,
            body_bytes: 0,
            archive_bytes: 0,
            started: Instant::now(),
            elapsed: None,
        }
    }

    /// Records a completed entry with `body_len` body bytes.
    pub fn record(&mut self, plan: &EntryPlan, body_len: u64) {
        match (&plan.header.kind, &plan.body) {
            (HeaderKind::Directory, _) => self.directories += 1,
            (HeaderKind::Symlink(_), _) => self.symlinks += 1,
            (_, Body::Decompress(_)) => self.decompressed_files += 1,
            _ => self.passthrough_files += 1,
        }
        self.body_bytes += body_len;
    }

    pub fn entries(&self) -> u64 {
        self.directories + self.symlinks + self.passthrough_files + self.decompressed_files
    }

    /// Freezes the elapsed time and records the final archive length.
    pub fn finish(&mut self, archive_bytes: u64) {
        self.archive_bytes = archive_bytes;
        self.elapsed = Some(self.started.elapsed());
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed.unwrap_or_else(|| self.started.elapsed())
    }

    /// Body throughput in MiB/s.
    pub fn speed_mibps(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.body_bytes as f64 / (1024.0 * 1024.0) / secs
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entries ({} dirs, {} files, {} decompressed, {} symlinks), {} body bytes, {} archive bytes in {:.1}s ({:.1} MiB/s)",
            self.entries(),
            self.directories,
            self.passthrough_files,
            self.decompressed_files,
            self.symlinks,
            self.body_bytes,
            self.archive_bytes,
            self.elapsed().as_secs_f32(),
            self.speed_mibps(),
        )
    }
}
