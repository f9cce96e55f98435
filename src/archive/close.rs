//! Writing the central directory and releasing the storage.

use std::io::SeekFrom;

use super::{Mode, ZipArchive};
use crate::format::records::{EndOfCentralDirectory, Zip64EndOfCentralDirectory, Zip64Locator};
use crate::format::{SENTINEL_16, SENTINEL_32, ZIP_FILECOUNT_LIMIT, needs_zip64, version};
use crate::storage::Storage;
use crate::{Error, Result};

impl<S: Storage> ZipArchive<S> {
    /// Encodes the central directory and end records at `start_dir`.
    fn write_end_record(&mut self) -> Result<()> {
        let handle = self.handle()?;
        let start = self.start_dir;

        let mut directory = Vec::new();
        for entry in &self.entries {
            directory.extend(entry.central_record()?);
        }
        let count = self.entries.len() as u64;
        let size = directory.len() as u64;

        let requires_zip64 = if count >= ZIP_FILECOUNT_LIMIT {
            Some("Files count")
        } else if needs_zip64(start) {
            Some("Central directory offset")
        } else if needs_zip64(size) {
            Some("Central directory size")
        } else {
            None
        };

        let mut tail = Vec::new();
        if let Some(what) = requires_zip64 {
            if !self.options.allow_zip64 {
                return Err(Error::LargeArchive(format!(
                    "{what} would require ZIP64 extensions"
                )));
            }
            log::debug!(
                "writing ZIP64 end records ({what}): {count} entries, directory at {start:#x}"
            );
            Zip64EndOfCentralDirectory {
                record_size: Zip64EndOfCentralDirectory::RECORD_SIZE,
                create_version: version::ZIP64,
                extract_version: version::ZIP64,
                disk_number: 0,
                disk_start: 0,
                entries_this_disk: count,
                entries_total: count,
                directory_size: size,
                directory_offset: start,
            }
            .write_to(&mut tail);
            Zip64Locator {
                disk_number: 0,
                eocd_offset: start + size,
                total_disks: 1,
            }
            .write_to(&mut tail);
        }

        let count16 = count.min(SENTINEL_16 as u64) as u16;
        EndOfCentralDirectory {
            disk_number: 0,
            disk_start: 0,
            entries_this_disk: count16,
            entries_total: count16,
            directory_size: size.min(SENTINEL_32 as u64) as u32,
            directory_offset: start.min(SENTINEL_32 as u64) as u32,
            comment_len: self.comment.len() as u16,
        }
        .write_to(&mut tail);
        tail.extend_from_slice(&self.comment);

        let truncate = self.mode == Mode::Append;
        handle.with_storage(|storage| {
            if S::SEEKABLE {
                storage.seek(SeekFrom::Start(start))?;
            }
            storage.write_all(&directory)?;
            storage.write_all(&tail)?;
            if truncate {
                storage.truncate()?;
            }
            storage.flush()?;
            Ok(())
        })?;
        self.modified = false;
        Ok(())
    }

    /// Writes pending end records and takes the storage out of the handle.
    ///
    /// Returns `None` if the archive was already closed. The storage is
    /// released even when writing the end records fails.
    fn shutdown(&mut self) -> Result<Option<S>> {
        let Some(handle) = self.handle.as_ref() else {
            return Ok(None);
        };
        if handle.is_writing() {
            return Err(Error::ConcurrencyViolation(
                "can't close the archive while an entry writer is open",
            ));
        }
        let written = if self.mode.is_writable() && self.modified {
            self.write_end_record()
        } else {
            Ok(())
        };
        let storage = match self.handle.take() {
            Some(handle) => handle.take_storage(),
            None => Err(Error::Closed),
        };
        written?;
        storage.map(Some)
    }

    /// Closes the archive.
    ///
    /// In write, exclusive and append modes the central directory and end
    /// records are written first. Closing twice is a no-op. Entry readers
    /// still alive fail with [`Error::Closed`] afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LargeArchive`] if the directory needs ZIP64 but it
    /// is disabled, or an I/O error from the storage.
    pub fn close(&mut self) -> Result<()> {
        self.shutdown().map(drop)
    }

    /// Closes the archive and returns the underlying reader or writer.
    ///
    /// # Errors
    ///
    /// As [`close`](Self::close); also [`Error::Closed`] if the archive
    /// was already closed.
    pub fn finish(mut self) -> Result<S::Inner> {
        match self.shutdown()? {
            Some(storage) => Ok(storage.into_inner()),
            None => Err(Error::Closed),
        }
    }
}

impl<S: Storage> Drop for ZipArchive<S> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::error!("failed to close zip archive: {e}");
        }
    }
}
