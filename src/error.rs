use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// The primary error type for all operations in the `streamtar` crate.
///
/// Every variant is fatal: the pipeline stops at the first error and the
/// caller reports it once, tagged with [`StreamError::tag`].
#[derive(Debug, Error)]
pub enum StreamError {
    /// The directory tree could not be traversed.
    #[error("cannot walk '{}': {source}", .path.display())]
    Walk { path: PathBuf, source: std::io::Error },

    /// No valid archive header can be derived for this entry.
    #[error("cannot build header for '{}': {reason}", .path.display())]
    Header { path: PathBuf, reason: String },

    /// The uncompressed size of an xz file could not be determined.
    #[error("cannot resolve uncompressed size of '{}': {reason}", .path.display())]
    SizeResolution { path: PathBuf, reason: SizeQueryFailure },

    /// The decompression process failed.
    #[error("decompression of '{}' failed: {reason}", .path.display())]
    Subprocess { path: PathBuf, reason: ProcessFailure },

    /// A pass-through file could not be opened or read.
    #[error("cannot read '{}': {source}", .path.display())]
    Source { path: PathBuf, source: std::io::Error },

    /// The output sink rejected a write, or the writer was driven out of order.
    #[error("write to {target} failed: {source}")]
    Write { target: String, source: std::io::Error },

    /// The body streamed for an entry disagrees with its declared size.
    #[error("entry '{name}' declared {declared} bytes but {actual} were streamed")]
    SizeMismatch { name: String, declared: u64, actual: u64 },
}

/// Why `xz -l --robot` did not yield an uncompressed size.
#[derive(Debug, Error)]
pub enum SizeQueryFailure {
    #[error("failed to launch listing tool: {0}")]
    Launch(#[source] std::io::Error),
    #[error("listing tool exited with {status}: {stderr}")]
    ToolFailed { status: ExitStatus, stderr: String },
    #[error("no summary line in listing output")]
    NoSummary,
    #[error("summary line has {found} fields, expected at least {expected}")]
    TooFewFields { found: usize, expected: usize },
    #[error("size field '{0}' is not a non-negative integer")]
    BadSize(String),
}

/// Why a decompression process did not deliver its output.
#[derive(Debug, Error)]
pub enum ProcessFailure {
    #[error("failed to launch decompressor: {0}")]
    Launch(#[source] std::io::Error),
    #[error("failed to read decompressor output: {0}")]
    Read(#[source] std::io::Error),
    #[error("decompressor exited with {0}")]
    Exit(ExitStatus),
}

impl StreamError {
    /// Stable short tag identifying the failure site, for log correlation.
    pub fn tag(&self) -> &'static str {
        match self {
            StreamError::Walk { .. } => "E-WALK",
            StreamError::Header { .. } => "E-HEADER",
            StreamError::SizeResolution { .. } => "E-XZSIZE",
            StreamError::Subprocess { .. } => "E-XZPROC",
            StreamError::Source { .. } => "E-SOURCE",
            StreamError::Write { .. } => "E-WRITE",
            StreamError::SizeMismatch { .. } => "E-SIZE",
        }
    }

    pub(crate) fn header(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        StreamError::Header { path: path.into(), reason: reason.into() }
    }

    pub(crate) fn write(target: impl Into<String>, source: std::io::Error) -> Self {
        StreamError::Write { target: target.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, StreamError>;
