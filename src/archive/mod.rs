//! # Streaming tar writer
//!
//! This module frames entries into a tar stream: a 512-byte header block, the
//! body bytes, then zero padding up to the next block boundary. The archive
//! ends with two zero blocks.
//!
//! Headers are encoded with the `tar` crate in GNU flavour, which gives us
//! base-256 size fields for bodies above 8 GiB. Names and link targets that do
//! not fit the 100-byte fields are preceded by GNU long-name/long-link records.
//!
//! The writer never seeks: a header's size must be known before the header is
//! written, and the writer checks that exactly that many body bytes follow.

use std::io::Write;

use tar::{EntryType, Header};

use crate::error::{Result, StreamError};

/// Tar block size.
pub const BLOCK_SIZE: u64 = 512;

/// Width of the name and linkname fields in a tar header.
const NAME_FIELD_LEN: usize = 100;

/// Path used by GNU tar for long-name and long-link records.
const GNU_LONG_LINK_PATH: &[u8] = b"././@LongLink";

const ZERO_BLOCK: [u8; BLOCK_SIZE as usize] = [0u8; BLOCK_SIZE as usize];

/// The type-specific part of an archive header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderKind {
    Directory,
    Regular,
    /// Symbolic link with its target.
    Symlink(String),
}

/// Everything needed to emit one tar header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveHeader {
    /// Entry name; directories end with `/`.
    pub name: String,
    /// Number of body bytes that will follow. Always 0 for directories and symlinks.
    pub size: u64,
    pub kind: HeaderKind,
    pub mode: u32,
    pub mtime: u64,
    pub uid: u64,
    pub gid: u64,
}

/// Body currently being streamed.
struct PendingBody {
    name: String,
    declared: u64,
    written: u64,
}

/// A sequential tar writer over any sink.
///
/// Per entry the calls must be `write_header`, any number of `write_body`,
/// then `finish_entry`. Calls out of that order are rejected.
pub struct ArchiveWriter<W: Write> {
    inner: W,
    /// Human-readable sink name for diagnostics ("stdout", a file path, ...).
    target: String,
    pending: Option<PendingBody>,
    bytes_written: u64,
}

impl<W: Write> ArchiveWriter<W> {
    pub fn new(inner: W, target: impl Into<String>) -> Self {
        Self { inner, target: target.into(), pending: None, bytes_written: 0 }
    }

    /// Total bytes handed to the sink so far, framing included.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Writes the header block(s) for `header`. Its `size` is final.
    pub fn write_header(&mut self, header: &ArchiveHeader) -> Result<()> {
        self.ensure_idle("write_header")?;

        let mut block = Header::new_gnu();
        let name = header.name.as_bytes();
        if name.len() > NAME_FIELD_LEN {
            self.write_long_record(EntryType::GNULongName, name)?;
        }
        copy_truncated(&mut block.as_old_mut().name, name);

        let size = match &header.kind {
            HeaderKind::Directory => {
                block.set_entry_type(EntryType::Directory);
                0
            }
            HeaderKind::Regular => {
                block.set_entry_type(EntryType::Regular);
                header.size
            }
            HeaderKind::Symlink(target) => {
                block.set_entry_type(EntryType::Symlink);
                let target = target.as_bytes();
                if target.len() > NAME_FIELD_LEN {
                    self.write_long_record(EntryType::GNULongLink, target)?;
                }
                copy_truncated(&mut block.as_old_mut().linkname, target);
                0
            }
        };
        block.set_size(size);
        block.set_mode(header.mode);
        block.set_mtime(header.mtime);
        block.set_uid(header.uid);
        block.set_gid(header.gid);
        block.set_cksum();

        self.emit(block.as_bytes())?;
        self.pending = Some(PendingBody { name: header.name.clone(), declared: size, written: 0 });
        Ok(())
    }

    /// Appends body bytes to the current entry.
    ///
    /// Fails before writing anything if `buf` would overrun the declared size.
    pub fn write_body(&mut self, buf: &[u8]) -> Result<()> {
        let pending = self.pending.as_mut().ok_or_else(|| out_of_order(&self.target, "write_body"))?;

        let after = pending.written + buf.len() as u64;
        if after > pending.declared {
            return Err(StreamError::SizeMismatch {
                name: pending.name.clone(),
                declared: pending.declared,
                actual: after,
            });
        }

        self.inner.write_all(buf).map_err(|e| StreamError::write(self.target.clone(), e))?;
        pending.written = after;
        self.bytes_written += buf.len() as u64;
        Ok(())
    }

    /// Closes the current entry: checks the byte count and pads to the block
    /// boundary. Returns the body length.
    pub fn finish_entry(&mut self) -> Result<u64> {
        let pending = self.pending.take().ok_or_else(|| out_of_order(&self.target, "finish_entry"))?;
        if pending.written != pending.declared {
            return Err(StreamError::SizeMismatch {
                name: pending.name,
                declared: pending.declared,
                actual: pending.written,
            });
        }
        self.pad(pending.written)?;
        Ok(pending.written)
    }

    /// Writes the end-of-archive marker, flushes, and returns the sink.
    pub fn finish(mut self) -> Result<W> {
        self.ensure_idle("finish")?;
        self.emit(&ZERO_BLOCK)?;
        self.emit(&ZERO_BLOCK)?;
        self.inner.flush().map_err(|e| StreamError::write(self.target.clone(), e))?;
        Ok(self.inner)
    }

    /// Emits a GNU `L`/`K` record carrying `value` NUL-terminated.
    fn write_long_record(&mut self, kind: EntryType, value: &[u8]) -> Result<()> {
        let mut block = Header::new_gnu();
        copy_truncated(&mut block.as_old_mut().name, GNU_LONG_LINK_PATH);
        block.set_entry_type(kind);
        block.set_mode(0o644);
        block.set_mtime(0);
        block.set_uid(0);
        block.set_gid(0);
        let len = value.len() as u64 + 1;
        block.set_size(len);
        block.set_cksum();

        self.emit(block.as_bytes())?;
        self.emit(value)?;
        self.emit(&[0])?;
        self.pad(len)
    }

    fn pad(&mut self, body_len: u64) -> Result<()> {
        let rem = body_len % BLOCK_SIZE;
        if rem == 0 {
            return Ok(());
        }
        self.emit(&ZERO_BLOCK[..(BLOCK_SIZE - rem) as usize])
    }

    fn emit(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes).map_err(|e| StreamError::write(self.target.clone(), e))?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    fn ensure_idle(&self, op: &str) -> Result<()> {
        match &self.pending {
            None => Ok(()),
            Some(p) => Err(StreamError::write(
                self.target.clone(),
                std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("{op} called while entry '{}' is still open", p.name),
                ),
            )),
        }
    }
}

fn copy_truncated(field: &mut [u8; NAME_FIELD_LEN], value: &[u8]) {
    let n = value.len().min(NAME_FIELD_LEN);
    field.fill(0);
    field[..n].copy_from_slice(&value[..n]);
}

fn out_of_order(target: &str, op: &str) -> StreamError {
    StreamError::write(
        target.to_string(),
        std::io::Error::new(std::io::ErrorKind::Other, format!("{op} called with no open entry")),
    )
}
