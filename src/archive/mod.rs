//! The [`ZipArchive`] type and its open modes.
//!
//! An archive owns its storage through a shared handle. Entry readers keep
//! weak references to that handle, so they can be used from other threads
//! and fail cleanly once the archive is closed. Writing goes through a
//! single [`EntryWriter`](crate::EntryWriter) at a time.
//!
//! The methods are spread over submodules by concern: [`open`] holds the
//! constructors, [`query`] lookups and listing, [`read`] entry streams,
//! [`add`] the write operations and [`close`] the end records.

mod add;
mod close;
mod open;
mod query;
mod read;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::crypto::Password;
use crate::handle::SharedHandle;
use crate::read::Entry;
use crate::storage::Storage;
use crate::write::ArchiveOptions;
use crate::{Error, Result};

/// The mode an archive was opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Read an existing archive.
    Read,
    /// Create a new archive, replacing existing content.
    Write,
    /// Add entries to an existing archive (or to any file).
    Append,
    /// Create a new archive; the file must not exist.
    Exclusive,
}

impl Mode {
    /// Returns true for the modes that accept new entries.
    pub fn is_writable(self) -> bool {
        !matches!(self, Mode::Read)
    }

    /// The single-letter mode name.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Read => "r",
            Mode::Write => "w",
            Mode::Append => "a",
            Mode::Exclusive => "x",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ZIP archive opened for reading, writing or appending.
///
/// The storage type `S` records what the archive can do:
///
/// | Constructor | Storage | Mode |
/// |-------------|---------|------|
/// | [`open`](Self::open), [`open_path`](Self::open_path) | [`Source`](crate::storage::Source) | read |
/// | [`create`](Self::create), [`create_path`](Self::create_path) | [`Sink`](crate::storage::Sink) | write |
/// | [`create_new_path`](Self::create_new_path) | [`Sink`](crate::storage::Sink) | exclusive |
/// | [`create_streaming`](Self::create_streaming) | [`Stream`](crate::storage::Stream) | write, non-seekable |
/// | [`append`](Self::append), [`append_path`](Self::append_path) | [`Duplex`](crate::storage::Duplex) | append |
///
/// Archives in write, exclusive or append mode must be closed to write
/// the central directory. [`close`](Self::close) reports errors;
/// dropping the archive closes it and only logs them.
pub struct ZipArchive<S: Storage> {
    pub(crate) handle: Option<Arc<SharedHandle<S>>>,
    pub(crate) mode: Mode,
    pub(crate) entries: Vec<Entry>,
    pub(crate) name_index: HashMap<String, usize>,
    pub(crate) options: ArchiveOptions,
    pub(crate) comment: Vec<u8>,
    pub(crate) password: Option<Password>,
    pub(crate) start_dir: u64,
    pub(crate) modified: bool,
}

impl<S: Storage> fmt::Debug for ZipArchive<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZipArchive")
            .field("mode", &self.mode)
            .field("entries", &self.entries.len())
            .field("closed", &self.handle.is_none())
            .field("start_dir", &self.start_dir)
            .finish_non_exhaustive()
    }
}

impl<S: Storage> ZipArchive<S> {
    pub(crate) fn from_parts(
        storage: S,
        mode: Mode,
        entries: Vec<Entry>,
        comment: Vec<u8>,
        start_dir: u64,
        modified: bool,
    ) -> Self {
        let name_index = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.name.clone(), i))
            .collect();
        Self {
            handle: Some(Arc::new(SharedHandle::new(storage))),
            mode,
            entries,
            name_index,
            options: ArchiveOptions::default(),
            comment,
            password: None,
            start_dir,
            modified,
        }
    }

    /// Replaces the write options.
    pub fn with_options(mut self, options: ArchiveOptions) -> Self {
        self.options = options;
        self
    }

    /// The write options.
    pub fn options(&self) -> &ArchiveOptions {
        &self.options
    }

    /// Sets the default password for encrypted entries.
    pub fn set_password(&mut self, password: impl Into<Password>) {
        self.password = Some(password.into());
    }

    pub(crate) fn handle(&self) -> Result<&Arc<SharedHandle<S>>> {
        self.handle.as_ref().ok_or(Error::Closed)
    }

    pub(crate) fn require_mode(&self, operation: &'static str, allowed: bool) -> Result<()> {
        if allowed {
            Ok(())
        } else {
            Err(Error::InvalidMode {
                operation,
                mode: self.mode,
            })
        }
    }

    /// Appends a finished entry; the last entry with a given name wins
    /// lookups.
    pub(crate) fn record_entry(&mut self, entry: Entry) {
        self.name_index.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
        self.modified = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::Read.to_string(), "r");
        assert_eq!(Mode::Write.to_string(), "w");
        assert_eq!(Mode::Append.to_string(), "a");
        assert_eq!(Mode::Exclusive.to_string(), "x");
    }

    #[test]
    fn test_mode_writable() {
        assert!(!Mode::Read.is_writable());
        assert!(Mode::Write.is_writable());
        assert!(Mode::Append.is_writable());
        assert!(Mode::Exclusive.is_writable());
    }
}
