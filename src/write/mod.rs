//! Archive writing API.
//!
//! Entries are added through [`ZipArchive`](crate::ZipArchive) in write,
//! exclusive or append mode. Small payloads go through
//! [`write_bytes`](crate::ZipArchive::write_bytes); large ones are streamed
//! through the [`EntryWriter`] returned by
//! [`start_entry`](crate::ZipArchive::start_entry).
//!
//! # Example
//!
//! ```rust,no_run
//! use std::io::Write;
//! use zipcore::{ArchiveOptions, CompressionMethod, Entry, ZipArchive};
//!
//! let mut archive = ZipArchive::create_path("archive.zip")?
//!     .with_options(ArchiveOptions::new().compression(CompressionMethod::Deflated));
//!
//! archive.write_bytes("hello.txt", b"Hello, world!")?;
//!
//! let mut writer = archive.start_entry(Entry::new("big.log"), false)?;
//! for i in 0..1000 {
//!     writeln!(writer, "line {i}")?;
//! }
//! writer.finish()?;
//!
//! archive.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod header_encode;
pub(crate) mod options;
mod stream;

pub(crate) use header_encode::initial_flags;
pub use options::ArchiveOptions;
pub use stream::EntryWriter;
