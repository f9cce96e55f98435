//! Archive reading API.
//!
//! Entries are opened as [`EntryReader`] streams through
//! [`ZipArchive::by_name`](crate::ZipArchive::by_name) and friends, or
//! written to disk with the extraction methods.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::io::BufRead;
//! use zipcore::{ExtractOptions, ZipArchive};
//!
//! let archive = ZipArchive::open_path("archive.zip")?;
//!
//! for entry in archive.entries() {
//!     println!("{}: {} bytes", entry.name, entry.uncompressed_size);
//! }
//!
//! let reader = archive.by_name("notes.txt")?;
//! for line in reader.lines() {
//!     println!("{}", line?);
//! }
//!
//! let result = archive.extract_all("output_dir", &ExtractOptions::default())?;
//! assert!(result.is_ok());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod entry;
mod extract;
mod metadata;
mod options;
mod path_safety;
mod stream;

pub use entry::Entry;
pub use extract::ExtractResult;
pub use options::{ExtractOptions, PreserveMetadata};
pub use stream::EntryReader;
