//! # zipcore
//!
//! A pure-Rust library for reading, writing and appending ZIP archives.
//!
//! The crate implements the PKWARE APPNOTE layout including ZIP64 sizes
//! and offsets, stored/deflate/bzip2/LZMA compression, legacy ZipCrypto
//! decryption, data descriptors for non-seekable output and CRC-32
//! verification of every entry.
//!
//! ## Quick Start
//!
//! ### Reading an Archive
//!
//! ```rust,no_run
//! use std::io::Read;
//! use zipcore::{Result, ZipArchive};
//!
//! fn main() -> Result<()> {
//!     let archive = ZipArchive::open_path("archive.zip")?;
//!
//!     for entry in archive.entries() {
//!         println!("{}: {} bytes", entry.name, entry.uncompressed_size);
//!     }
//!
//!     let mut text = String::new();
//!     archive
//!         .by_name("readme.txt")?
//!         .read_to_string(&mut text)
//!         .map_err(zipcore::Error::from_io)?;
//!     Ok(())
//! }
//! ```
//!
//! ### Creating an Archive
//!
//! ```rust,no_run
//! use zipcore::{ArchiveOptions, CompressionMethod, Result, ZipArchive};
//!
//! fn main() -> Result<()> {
//!     let mut archive = ZipArchive::create_path("new.zip")?
//!         .with_options(ArchiveOptions::new().compression(CompressionMethod::Deflated));
//!
//!     archive.write_bytes("hello.txt", b"Hello, World!")?;
//!     archive.write_path("Cargo.toml", None)?;
//!     archive.mkdir("empty")?;
//!     archive.close()
//! }
//! ```
//!
//! ### Appending
//!
//! ```rust,no_run
//! use zipcore::{Result, ZipArchive};
//!
//! fn main() -> Result<()> {
//!     let mut archive = ZipArchive::append_path("existing.zip")?;
//!     archive.write_bytes("later.txt", b"added later")?;
//!     archive.close()
//! }
//! ```
//!
//! ### Password-Protected Entries
//!
//! Entries encrypted with ZipCrypto can be read; writing encrypted entries
//! is not supported.
//!
//! ```rust,no_run
//! use zipcore::{Error, ZipArchive};
//!
//! let mut archive = ZipArchive::open_path("secret.zip")?;
//! archive.set_password("hunter2");
//! match archive.read("secret.txt") {
//!     Ok(data) => println!("{} bytes", data.len()),
//!     Err(Error::WrongPassword { entry_name }) => eprintln!("bad password for {entry_name}"),
//!     Err(e) => return Err(e),
//! }
//! # Ok::<(), Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `deflate` | Yes | Deflate compression (method 8) |
//! | `bzip2` | Yes | BZip2 compression (method 12) |
//! | `lzma` | Yes | LZMA compression (method 14) |
//!
//! Entries using a method whose feature is disabled fail with
//! [`Error::UnsupportedMethod`].
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`]. Entry streams implement the
//! `std::io` traits; use [`Error::from_io`] to get the crate error back
//! from the [`std::io::Error`] they return.
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

/// Default buffer size for read operations (8 KiB).
pub(crate) const READ_BUFFER_SIZE: usize = 8192;

pub mod archive;
pub mod checksum;
pub mod codec;
pub mod crypto;
pub mod error;
pub mod format;
mod handle;
pub mod read;
pub mod storage;
pub mod timestamp;
pub mod write;

pub use archive::{Mode, ZipArchive};
pub use codec::CompressionMethod;
pub use crypto::Password;
pub use error::{Error, Result};
pub use format::detect::{is_zip_archive, is_zip_path};
pub use read::{Entry, EntryReader, ExtractOptions, ExtractResult, PreserveMetadata};
pub use timestamp::DosDateTime;
pub use write::{ArchiveOptions, EntryWriter};
