//! Adding entries.

use std::fs::File;
use std::io::{self, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;

use super::ZipArchive;
use crate::codec::CompressionMethod;
use crate::format::{DOS_DIRECTORY_ATTR, ZIP_FILECOUNT_LIMIT, ZIP64_LIMIT, flags, needs_zip64};
use crate::handle::SharedHandle;
use crate::read::Entry;
use crate::storage::Storage;
use crate::timestamp::DosDateTime;
use crate::write::{EntryWriter, initial_flags};
use crate::{Error, Result};

/// Default `external_attr` for files added by name: `-rw-------`.
const DEFAULT_FILE_ATTR: u32 = 0o600 << 16;

/// Default `external_attr` for directories added by name.
const DEFAULT_DIR_ATTR: u32 = (0o40775 << 16) | DOS_DIRECTORY_ATTR;

/// Compressed data may be slightly larger than its input.
fn may_need_zip64(size: u64) -> bool {
    size as f64 * 1.05 >= ZIP64_LIMIT as f64
}

impl<S: Storage> ZipArchive<S> {
    /// The handle, if the archive is open in a writable mode and no entry
    /// writer is active.
    fn write_handle(&self, operation: &'static str) -> Result<Arc<SharedHandle<S>>> {
        let handle = Arc::clone(self.handle()?);
        self.require_mode(operation, self.mode.is_writable())?;
        if handle.is_writing() {
            return Err(Error::ConcurrencyViolation(
                "can't write to the archive while another entry writer is open",
            ));
        }
        Ok(handle)
    }

    /// Checks an entry about to be written at `start_dir`.
    fn write_check(&self, entry: &Entry) -> Result<()> {
        if self.name_index.contains_key(&entry.name) {
            log::warn!("Duplicate name: {:?}", entry.name);
        }
        entry.compression()?.ensure_supported()?;
        if !self.options.allow_zip64 {
            let requires = if self.entries.len() as u64 + 1 >= ZIP_FILECOUNT_LIMIT {
                Some("Files count")
            } else if needs_zip64(entry.uncompressed_size) {
                Some("Filesize")
            } else if needs_zip64(entry.header_offset) {
                Some("Zipfile size")
            } else {
                None
            };
            if let Some(what) = requires {
                return Err(Error::LargeArchive(format!(
                    "{what} would require ZIP64 extensions"
                )));
            }
        }
        Ok(())
    }

    /// Starts a new entry and returns a writer for its data.
    ///
    /// The entry's flags are reset; CRC and sizes are filled in when the
    /// writer finishes. Set [`Entry::with_size_hint`] for data that may
    /// exceed 4 GiB, or pass `force_zip64`, so the local header reserves
    /// room for 64-bit sizes.
    ///
    /// # Errors
    ///
    /// - [`Error::Closed`] after [`close`](Self::close).
    /// - [`Error::InvalidMode`] in read mode.
    /// - [`Error::ConcurrencyViolation`] if another writer is still open.
    /// - [`Error::LargeArchive`] if ZIP64 is needed or forced but disabled.
    /// - [`Error::UnsupportedMethod`] for methods not compiled in.
    pub fn start_entry(&mut self, mut entry: Entry, force_zip64: bool) -> Result<EntryWriter<'_, S>> {
        let handle = self.write_handle("write")?;
        if force_zip64 && !self.options.allow_zip64 {
            return Err(Error::LargeArchive(
                "force_zip64 is set, but allow_zip64 was disabled".into(),
            ));
        }

        let method = entry.compression()?;
        entry.raw_name = entry.name.clone();
        entry.crc32 = 0;
        entry.compressed_size = 0;
        entry.flags = initial_flags(method, S::SEEKABLE);
        if entry.external_attr == 0 {
            entry.external_attr = DEFAULT_FILE_ATTR;
        }

        let wants_zip64 = force_zip64 || may_need_zip64(entry.uncompressed_size);
        if wants_zip64 && !self.options.allow_zip64 {
            return Err(Error::LargeArchive(
                "Filesize would require ZIP64 extensions".into(),
            ));
        }

        entry.header_offset = self.start_dir;
        self.write_check(&entry)?;
        EntryWriter::begin(self, handle, entry, wants_zip64)
    }

    /// Adds an entry named `name` with the given contents.
    ///
    /// The entry gets the current time and the archive's compression
    /// settings. Names ending in `/` become directories.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::io::Cursor;
    /// use zipcore::ZipArchive;
    ///
    /// let mut archive = ZipArchive::create(Cursor::new(Vec::new()))?;
    /// archive.write_bytes("a.txt", b"hello")?;
    /// let bytes = archive.finish()?.into_inner();
    ///
    /// let archive = ZipArchive::open(Cursor::new(bytes))?;
    /// assert_eq!(archive.read("a.txt")?, b"hello");
    /// # Ok::<(), zipcore::Error>(())
    /// ```
    pub fn write_bytes(&mut self, name: &str, data: &[u8]) -> Result<()> {
        let mut entry = Entry::new(name)
            .with_timestamp(DosDateTime::now())
            .with_method(self.options.compression);
        entry.compress_level = self.options.level;
        entry.external_attr = if entry.is_dir() {
            DEFAULT_DIR_ATTR
        } else {
            DEFAULT_FILE_ATTR
        };
        self.write_entry_bytes(entry, data)
    }

    /// Adds `entry` with the given contents, keeping its metadata.
    pub fn write_entry_bytes(&mut self, mut entry: Entry, data: &[u8]) -> Result<()> {
        entry.uncompressed_size = data.len() as u64;
        let mut writer = self.start_entry(entry, false)?;
        writer.write_all(data).map_err(Error::from_io)?;
        writer.finish()
    }

    /// Adds a file or directory from the filesystem.
    ///
    /// `arcname` defaults to `path`. Drive letters, leading separators and
    /// `.` components are removed, and `..` components are resolved or
    /// dropped (see [`Entry::from_path`]). The modification time and mode are
    /// taken from the file; see
    /// [`ArchiveOptions::strict_timestamps`](crate::ArchiveOptions::strict_timestamps)
    /// for times outside 1980..=2107.
    pub fn write_path(&mut self, path: impl AsRef<Path>, arcname: Option<&str>) -> Result<()> {
        let path = path.as_ref();
        let mut entry = Entry::from_path(path, arcname, self.options.strict_timestamps)?;
        if entry.is_dir() {
            return self.mkdir_entry(entry);
        }
        entry.method = self.options.compression.id();
        entry.compress_level = self.options.level;

        let mut file = File::open(path)?;
        let mut writer = self.start_entry(entry, false)?;
        io::copy(&mut file, &mut writer).map_err(Error::from_io)?;
        writer.finish()
    }

    /// Adds a directory entry with mode `0o777`.
    pub fn mkdir(&mut self, name: &str) -> Result<()> {
        self.mkdir_with_mode(name, 0o777)
    }

    /// Adds a directory entry with the given Unix permission bits.
    pub fn mkdir_with_mode(&mut self, name: &str, mode: u32) -> Result<()> {
        let mut name = name.to_string();
        if !name.ends_with('/') {
            name.push('/');
        }
        let attr = (((0o40000 | mode) & 0xFFFF) << 16) | DOS_DIRECTORY_ATTR;
        let entry = Entry::new(name)
            .with_timestamp(DosDateTime::now())
            .with_external_attr(attr);
        self.mkdir_entry(entry)
    }

    /// Adds a prepared directory entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the entry name does not end
    /// with `/`.
    pub fn mkdir_entry(&mut self, mut entry: Entry) -> Result<()> {
        let handle = self.write_handle("mkdir")?;
        if !entry.is_dir() {
            return Err(Error::InvalidArgument(
                "the given entry does not describe a directory".into(),
            ));
        }

        entry.raw_name = entry.name.clone();
        entry.crc32 = 0;
        entry.compressed_size = 0;
        entry.uncompressed_size = 0;
        if entry.method == CompressionMethod::Lzma.id() {
            entry.flags |= flags::COMPRESS_OPTION_1;
        }
        entry.header_offset = self.start_dir;
        self.write_check(&entry)?;

        let header = entry.local_header(false)?;
        let offset = entry.header_offset;
        let end = handle.with_storage(|storage| {
            if S::SEEKABLE {
                storage.seek(SeekFrom::Start(offset))?;
            }
            storage.write_all(&header)?;
            Ok(storage.position()?)
        })?;
        self.start_dir = end;
        self.record_entry(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zip64_estimate() {
        assert!(!may_need_zip64(0));
        assert!(!may_need_zip64(4_000_000_000));
        assert!(may_need_zip64(4_100_000_000));
    }

    #[test]
    fn test_default_attrs() {
        assert_eq!(DEFAULT_FILE_ATTR >> 16, 0o600);
        assert_eq!(DEFAULT_DIR_ATTR & DOS_DIRECTORY_ATTR, DOS_DIRECTORY_ATTR);
        assert_eq!(DEFAULT_DIR_ATTR >> 16, 0o40775);
    }
}
