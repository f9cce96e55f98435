//! Streaming writer for a single entry.

use std::io::{self, SeekFrom, Write};
use std::sync::Arc;

use crate::checksum::Crc32;
use crate::codec::Compressor;
use crate::format::needs_zip64;
use crate::format::records::DataDescriptor;
use crate::handle::SharedHandle;
use crate::storage::Storage;
use crate::{Entry, Error, Result, ZipArchive};

/// Writes the data of one entry.
///
/// Created by [`ZipArchive::start_entry`]. Data passed to [`Write::write`]
/// is checksummed, compressed and appended to the archive. The entry is
/// completed by [`finish`](Self::finish), or on drop (errors during drop
/// are logged).
///
/// Completing the entry writes a data descriptor for non-seekable storage,
/// or seeks back and rewrites the local header with the final CRC and
/// sizes otherwise. Only then is the entry added to the archive.
///
/// The writer mutably borrows the archive, so no other write can start
/// while it is open. Entry readers opened earlier fail with
/// [`Error::ConcurrencyViolation`] until the writer is finished.
pub struct EntryWriter<'a, S: Storage> {
    archive: &'a mut ZipArchive<S>,
    handle: Arc<SharedHandle<S>>,
    entry: Entry,
    compressor: Option<Compressor>,
    crc: Crc32,
    zip64: bool,
    uncompressed: u64,
    compressed: u64,
    finished: bool,
}

impl<S: Storage> std::fmt::Debug for EntryWriter<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryWriter")
            .field("name", &self.entry.name)
            .field("zip64", &self.zip64)
            .field("bytes_written", &self.uncompressed)
            .finish_non_exhaustive()
    }
}

impl<'a, S: Storage> EntryWriter<'a, S> {
    /// Writes the local header at the archive's `start_dir` and marks the
    /// handle as writing.
    pub(crate) fn begin(
        archive: &'a mut ZipArchive<S>,
        handle: Arc<SharedHandle<S>>,
        mut entry: Entry,
        zip64: bool,
    ) -> Result<Self> {
        let compressor = Compressor::new(entry.compression()?, entry.compress_level)?;
        let header = entry.local_header(zip64)?;
        let offset = entry.header_offset;
        handle.with_storage(|storage| {
            if S::SEEKABLE {
                storage.seek(SeekFrom::Start(offset))?;
            }
            storage.write_all(&header)?;
            Ok(())
        })?;
        handle.set_writing(true);
        log::trace!(
            "started entry '{}' at {offset:#x} (zip64: {zip64})",
            entry.name
        );

        Ok(Self {
            archive,
            handle,
            entry,
            compressor: Some(compressor),
            crc: Crc32::new(),
            zip64,
            uncompressed: 0,
            compressed: 0,
            finished: false,
        })
    }

    /// The entry being written.
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// Number of uncompressed bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.uncompressed
    }

    /// Completes the entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LargeArchive`] if the entry was started without
    /// ZIP64 and its sizes exceed the 32-bit limits, or an I/O error from
    /// the storage.
    pub fn finish(mut self) -> Result<()> {
        self.finalize()
    }

    fn append(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        self.handle
            .with_storage(|storage| Ok(storage.write_all(data)?))?;
        self.compressed += data.len() as u64;
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        let result = self.complete();
        self.handle.set_writing(false);
        result
    }

    fn complete(&mut self) -> Result<()> {
        let compressor = self.compressor.take().ok_or(Error::Closed)?;
        let tail = compressor.flush()?;
        self.append(&tail)?;

        self.entry.crc32 = self.crc.finalize();
        self.entry.compressed_size = self.compressed;
        self.entry.uncompressed_size = self.uncompressed;

        if !self.zip64 {
            if needs_zip64(self.uncompressed) {
                return Err(Error::LargeArchive(
                    "File size too large, try using force_zip64".into(),
                ));
            }
            if needs_zip64(self.compressed) {
                return Err(Error::LargeArchive(
                    "Compressed size too large, try using force_zip64".into(),
                ));
            }
        }

        let end = if self.entry.has_data_descriptor() {
            let mut descriptor = Vec::with_capacity(DataDescriptor::encoded_len(self.zip64));
            DataDescriptor {
                crc32: self.entry.crc32,
                compressed_size: self.compressed,
                uncompressed_size: self.uncompressed,
            }
            .write_to(&mut descriptor, self.zip64);
            self.handle.with_storage(|storage| {
                storage.write_all(&descriptor)?;
                Ok(storage.position()?)
            })?
        } else {
            let header = self.entry.local_header(self.zip64)?;
            let offset = self.entry.header_offset;
            self.handle.with_storage(|storage| {
                let end = storage.position()?;
                storage.seek(SeekFrom::Start(offset))?;
                storage.write_all(&header)?;
                storage.seek(SeekFrom::Start(end))?;
                Ok(end)
            })?
        };

        log::trace!(
            "finished entry '{}': {} -> {} bytes, crc {:#010x}",
            self.entry.name,
            self.uncompressed,
            self.compressed,
            self.entry.crc32
        );
        self.archive.start_dir = end;
        self.archive.record_entry(self.entry.clone());
        Ok(())
    }
}

impl<S: Storage> Write for EntryWriter<'_, S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let compressor = self
            .compressor
            .as_mut()
            .ok_or_else(|| Error::Closed.into_io())?;
        let out = compressor.compress(buf).map_err(Error::into_io)?;
        self.uncompressed += buf.len() as u64;
        self.crc.update(buf);
        self.append(&out).map_err(Error::into_io)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.handle
            .with_storage(|storage| Ok(storage.flush()?))
            .map_err(Error::into_io)
    }
}

impl<S: Storage> Drop for EntryWriter<'_, S> {
    fn drop(&mut self) {
        if let Err(e) = self.finalize() {
            log::error!("failed to finish entry '{}': {}", self.entry.name, e);
        }
    }
}
