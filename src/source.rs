//! Byte sources for entry bodies.
//!
//! The pipeline streams every body through [`ByteSource`] without knowing
//! whether the bytes come from a file on disk or from a running decompressor.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use tracing::warn;

use crate::error::{ProcessFailure, Result, StreamError};

/// A producer of body bytes, drained chunk by chunk.
pub trait ByteSource {
    /// Fills `buf` with the next chunk. `Ok(0)` means the source is exhausted.
    fn next_chunk(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Releases the source once drained, reporting failures only visible at
    /// the end (e.g. a decompressor's exit status).
    fn finish(self: Box<Self>) -> Result<()>;
}

/// Raw bytes of a regular file.
pub struct FileSource {
    path: PathBuf,
    file: File,
}

impl FileSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| StreamError::Source { path: path.to_path_buf(), source: e })?;
        Ok(Self { path: path.to_path_buf(), file })
    }
}

impl ByteSource for FileSource {
    fn next_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            match self.file.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(StreamError::Source { path: self.path.clone(), source: e }),
            }
        }
    }

    fn finish(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

/// Standard output of an external process.
///
/// Dropping the source before [`ByteSource::finish`] kills and reaps the
/// process, so an aborted run never leaves a decompressor behind.
pub struct ProcessOutputSource {
    path: PathBuf,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
}

impl ProcessOutputSource {
    /// Spawns `cmd` with a piped stdout and an inherited stderr.
    ///
    /// `path` names the input being processed, for diagnostics.
    pub fn spawn(mut cmd: Command, path: &Path) -> Result<Self> {
        let fail = |reason| StreamError::Subprocess { path: path.to_path_buf(), reason };

        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| fail(ProcessFailure::Launch(e)))?;
        let stdout = child.stdout.take();
        if stdout.is_none() {
            let _ = child.kill();
            let _ = child.wait();
            return Err(fail(ProcessFailure::Launch(io::Error::new(io::ErrorKind::Other, "stdout was not captured"))));
        }

        Ok(Self { path: path.to_path_buf(), child: Some(child), stdout })
    }

    fn fail(&self, reason: ProcessFailure) -> StreamError {
        StreamError::Subprocess { path: self.path.clone(), reason }
    }
}

impl ByteSource for ProcessOutputSource {
    fn next_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(0);
        };
        loop {
            match stdout.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(StreamError::Subprocess { path: self.path.clone(), reason: ProcessFailure::Read(e) });
                }
            }
        }
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        // close our end first so a process still writing sees EPIPE instead of blocking
        drop(self.stdout.take());
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child.wait().map_err(|e| self.fail(ProcessFailure::Read(e)))?;
        if status.success() {
            Ok(())
        } else {
            Err(self.fail(ProcessFailure::Exit(status)))
        }
    }
}

impl Drop for ProcessOutputSource {
    fn drop(&mut self) {
        drop(self.stdout.take());
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                warn!(path = %self.path.display(), error = %e, "could not kill decompressor");
            }
            let _ = child.wait();
        }
    }
}
