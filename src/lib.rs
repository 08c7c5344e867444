//! # streamtar
//!
//! Streams a directory tree into a tar archive, decompressing `.xz` files on
//! the fly so the archive holds their original bytes. Nothing decompressed is
//! ever written to disk.
//!
//! ## Key Modules
//!
//! - [`walk`]: ordered, lazy directory traversal.
//! - [`classify`]: decides per entry between pass-through and decompression and builds its header.
//! - [`xz`]: the external `xz` tool (size listing and decompression).
//! - [`source`]: the [`source::ByteSource`] contract over files and process output.
//! - [`archive`]: the sequential tar writer.
//! - [`pipeline`]: drives the above for a whole tree.
//!
//! ## Examples
//!
//! ```no_run
//! use streamtar::pipeline::{build_archive, ArchiveOptions};
//! use streamtar::xz::XzTool;
//!
//! let options = ArchiveOptions { xz: XzTool::new("xz", 4) };
//! let file = std::fs::File::create("data.tar")?;
//! let (_file, stats) = build_archive("dataset".as_ref(), file, "data.tar", &options)?;
//! eprintln!("{stats}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod archive;
pub mod classify;
pub mod cli;
pub mod common;
pub mod error;
pub use error::StreamError;

pub mod pipeline;
pub mod progress;
pub mod source;
pub mod walk;
pub mod xz;

// Cross-platform metadata helpers
pub mod fsx;
