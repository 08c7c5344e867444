//! Integration with the external `xz` binary.
//!
//! Two invocations are used:
//!
//! - `xz -l --robot -- FILE` to learn the uncompressed size of a file before its
//!   tar header is written. The robot format is tab separated; the summary
//!   record starts with `file` and its fifth field is the uncompressed size.
//! - `xz -d -c --threads N -- FILE` to stream the uncompressed bytes, consumed
//!   through [`crate::source::ProcessOutputSource`].
//!
//! The `--` keeps a path such as `-data/b.xz` from being read as options.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{Result, SizeQueryFailure, StreamError};
use crate::source::ProcessOutputSource;

/// File name suffix identifying xz-compressed files (matched case-insensitively).
pub const XZ_SUFFIX: &str = ".xz";

/// Index of the uncompressed size in the robot `file` record.
const UNCOMPRESSED_SIZE_FIELD: usize = 4;

/// Whether `name` carries the xz suffix, ignoring ASCII case.
pub fn has_xz_suffix(name: &str) -> bool {
    let n = name.len();
    n >= XZ_SUFFIX.len()
        && name.is_char_boundary(n - XZ_SUFFIX.len())
        && name[n - XZ_SUFFIX.len()..].eq_ignore_ascii_case(XZ_SUFFIX)
}

/// Parses the output of `xz -l --robot` for a single file.
pub fn parse_robot_listing(output: &str) -> std::result::Result<u64, SizeQueryFailure> {
    let line = output
        .lines()
        .find(|l| l.split('\t').next() == Some("file"))
        .ok_or(SizeQueryFailure::NoSummary)?;

    let fields: Vec<&str> = line.split('\t').collect();
    let raw = fields.get(UNCOMPRESSED_SIZE_FIELD).ok_or(SizeQueryFailure::TooFewFields {
        found: fields.len(),
        expected: UNCOMPRESSED_SIZE_FIELD + 1,
    })?;
    let raw = raw.trim();
    raw.parse::<u64>().map_err(|_| SizeQueryFailure::BadSize(raw.to_string()))
}

/// Handle on the `xz` executable plus the parallelism hint for decompression.
#[derive(Debug, Clone)]
pub struct XzTool {
    program: PathBuf,
    threads: usize,
}

impl XzTool {
    pub fn new(program: impl Into<PathBuf>, threads: usize) -> Self {
        Self { program: program.into(), threads: threads.max(1) }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    fn list_command(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-l").arg("--robot").arg("--").arg(path);
        cmd
    }

    fn decompress_command(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-d").arg("-c").arg("--threads").arg(self.threads.to_string()).arg("--").arg(path);
        cmd
    }

    /// Asks `xz` for the uncompressed size of `path` without decompressing it.
    pub fn uncompressed_size(&self, path: &Path) -> Result<u64> {
        let fail = |reason| StreamError::SizeResolution { path: path.to_path_buf(), reason };

        let output = self
            .list_command(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| fail(SizeQueryFailure::Launch(e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(fail(SizeQueryFailure::ToolFailed { status: output.status, stderr }));
        }

        let size = parse_robot_listing(&String::from_utf8_lossy(&output.stdout)).map_err(fail)?;
        debug!(path = %path.display(), size, "resolved uncompressed size");
        Ok(size)
    }

    /// Spawns the decompressor for `path`, its stdout becoming the body source.
    pub fn decompress(&self, path: &Path) -> Result<ProcessOutputSource> {
        debug!(path = %path.display(), threads = self.threads, "spawning decompressor");
        ProcessOutputSource::spawn(self.decompress_command(path), path)
    }
}
