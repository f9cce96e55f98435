//! Streaming reader for a single entry.

use std::io::{self, BufRead, Read, Seek, SeekFrom};
use std::sync::{Arc, Weak};

use crate::READ_BUFFER_SIZE;
use crate::checksum::Crc32;
use crate::codec::{EntryDecoder, build_decoder};
use crate::crypto::{self, Password, ZipCryptoReader};
use crate::format::flags;
use crate::format::names::decode_name;
use crate::format::records::LocalFileHeader;
use crate::handle::{HandleView, SharedHandle};
use crate::storage::Storage;
use crate::{Entry, Error, Result};

/// Raw entry bytes, decrypted if needed.
enum EntrySource<S> {
    Plain(HandleView<S>),
    Encrypted(ZipCryptoReader<HandleView<S>>),
}

impl<S: Storage> Read for EntrySource<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            EntrySource::Plain(r) => r.read(buf),
            EntrySource::Encrypted(r) => r.read(buf),
        }
    }
}

/// A sticky failure reported again on every later read.
#[derive(Debug, Clone)]
enum Failure {
    Crc { expected: u32, actual: u32 },
    Data(String),
}

/// Reads the decompressed contents of one entry.
///
/// Implements [`Read`], [`BufRead`] and [`Seek`]. The CRC-32 is checked
/// when the last byte has been decoded, before that final chunk is handed
/// out; a mismatch fails the read with [`Error::CrcMismatch`] and every
/// read after it fails the same way.
///
/// The reader keeps only a weak reference to the archive storage. Reading
/// after the archive has been closed fails with [`Error::Closed`], and
/// reading while an entry writer is open fails with
/// [`Error::ConcurrencyViolation`].
///
/// Errors surface as [`io::Error`]; use [`Error::from_io`] to recover the
/// crate error.
pub struct EntryReader<S: Storage> {
    entry: Entry,
    handle: Weak<SharedHandle<S>>,
    password: Option<Password>,
    decoder: EntryDecoder<EntrySource<S>>,
    buffer: Box<[u8]>,
    start: usize,
    end: usize,
    remaining: u64,
    delivered: u64,
    crc: Crc32,
    verified: bool,
    failure: Option<Failure>,
}

impl<S: Storage> std::fmt::Debug for EntryReader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryReader")
            .field("name", &self.entry.name)
            .field("position", &self.delivered)
            .field("size", &self.entry.uncompressed_size)
            .finish_non_exhaustive()
    }
}

fn truncated_header(offset: u64) -> impl FnOnce(Error) -> Error {
    move |e| match e {
        Error::Io(io) if io.kind() == io::ErrorKind::UnexpectedEof => {
            Error::corrupt_header(offset, "truncated file header")
        }
        other => other,
    }
}

impl<S: Storage> EntryReader<S> {
    /// Validates the local header and sets up the decoding chain.
    pub(crate) fn open(
        handle: &Arc<SharedHandle<S>>,
        entry: &Entry,
        password: Option<Password>,
    ) -> Result<Self> {
        let decoder = Self::build_chain(handle, entry, password.as_ref())?;
        Ok(Self {
            entry: entry.clone(),
            handle: Arc::downgrade(handle),
            password,
            decoder,
            buffer: vec![0u8; READ_BUFFER_SIZE].into_boxed_slice(),
            start: 0,
            end: 0,
            remaining: entry.uncompressed_size,
            delivered: 0,
            crc: Crc32::new(),
            verified: false,
            failure: None,
        })
    }

    fn build_chain(
        handle: &Arc<SharedHandle<S>>,
        entry: &Entry,
        password: Option<&Password>,
    ) -> Result<EntryDecoder<EntrySource<S>>> {
        let offset = entry.header_offset;
        let mut fixed = [0u8; LocalFileHeader::SIZE];
        handle
            .read_exact_at(offset, &mut fixed)
            .map_err(truncated_header(offset))?;
        let header = LocalFileHeader::parse(&fixed, offset)?;

        let name_offset = offset + LocalFileHeader::SIZE as u64;
        let mut name = vec![0u8; header.name_len as usize];
        handle
            .read_exact_at(name_offset, &mut name)
            .map_err(truncated_header(offset))?;

        if entry.flags & flags::PATCHED_DATA != 0 {
            return Err(Error::UnsupportedFeature {
                feature: "compressed patched data (flag bit 5)",
            });
        }
        if entry.flags & flags::STRONG_ENCRYPTION != 0 {
            return Err(Error::UnsupportedFeature {
                feature: "strong encryption (flag bit 6)",
            });
        }

        let local_name = decode_name(&name, header.flags);
        if local_name != entry.raw_name {
            return Err(Error::corrupt_header(
                offset,
                format!(
                    "file name in directory {:?} and header {:?} differ",
                    entry.raw_name, local_name
                ),
            ));
        }

        let method = entry.compression()?;
        method.ensure_supported()?;

        let mut data_offset = offset + header.total_len();
        let mut compressed = entry.compressed_size;
        let source = if entry.is_encrypted() {
            let Some(password) = password.filter(|p| !p.is_empty()) else {
                return Err(Error::PasswordRequired {
                    entry_name: entry.name.clone(),
                });
            };
            let view = HandleView::new(Arc::downgrade(handle), data_offset, compressed);
            let (reader, check) = ZipCryptoReader::new(view, password.as_bytes()).map_err(|e| {
                match Error::from_io(e) {
                    Error::Io(io) if io.kind() == io::ErrorKind::UnexpectedEof => {
                        Error::corrupt_data(&entry.name, "truncated encryption header")
                    }
                    other => other,
                }
            })?;
            let (time, _) = entry.modified.to_dos();
            if check != crypto::check_byte(entry.flags, entry.crc32, time) {
                return Err(Error::WrongPassword {
                    entry_name: entry.name.clone(),
                });
            }
            let header_len = crypto::HEADER_SIZE as u64;
            data_offset += header_len;
            compressed = compressed.saturating_sub(header_len);
            EntrySource::Encrypted(reader)
        } else {
            EntrySource::Plain(HandleView::new(
                Arc::downgrade(handle),
                data_offset,
                compressed,
            ))
        };
        log::trace!(
            "opening '{}' ({method}) at data offset {data_offset:#x}",
            entry.name
        );

        build_decoder(
            source,
            method,
            entry.flags,
            compressed,
            entry.uncompressed_size,
        )
        .map_err(|e| match e {
            Error::InvalidFormat(reason) => Error::corrupt_data(&entry.name, reason),
            other => other,
        })
    }

    /// The entry being read.
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// Returns up to `n` bytes without consuming them.
    ///
    /// Fewer bytes are returned at the end of the entry or when the
    /// internal buffer holds less.
    pub fn peek(&mut self, n: usize) -> io::Result<&[u8]> {
        let available = self.fill_buf()?;
        Ok(&available[..available.len().min(n)])
    }

    fn fail(&self, failure: &Failure) -> io::Error {
        let err = match failure {
            Failure::Crc { expected, actual } => Error::CrcMismatch {
                entry_name: self.entry.name.clone(),
                expected: *expected,
                actual: *actual,
            },
            Failure::Data(reason) => Error::corrupt_data(&self.entry.name, reason.clone()),
        };
        err.into_io()
    }

    fn verify(&mut self) -> io::Result<()> {
        self.verified = true;
        let actual = self.crc.finalize();
        if actual != self.entry.crc32 {
            let failure = Failure::Crc {
                expected: self.entry.crc32,
                actual,
            };
            let err = self.fail(&failure);
            self.failure = Some(failure);
            return Err(err);
        }
        Ok(())
    }

    /// Decodes the next chunk into the buffer.
    fn refill(&mut self) -> io::Result<()> {
        self.start = 0;
        self.end = 0;
        while self.remaining > 0 {
            let want = self.remaining.min(self.buffer.len() as u64) as usize;
            let n = match self.decoder.read(&mut self.buffer[..want]) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.decode_error(e)),
            };
            if n == 0 {
                let failure = Failure::Data(format!(
                    "{} stream ended {} bytes early",
                    self.decoder.method(),
                    self.remaining
                ));
                let err = self.fail(&failure);
                self.failure = Some(failure);
                return Err(err);
            }
            self.crc.update(&self.buffer[..n]);
            self.remaining -= n as u64;
            self.end = n;
            break;
        }
        if self.remaining == 0 && !self.verified {
            if let Err(e) = self.finish_stream() {
                if self.failure.is_some() {
                    self.end = 0;
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Runs once the declared size has been decoded: the compressed stream
    /// must end here and the CRC must match.
    fn finish_stream(&mut self) -> io::Result<()> {
        loop {
            match self.decoder.ensure_end() {
                Ok(()) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.decode_error(e)),
            }
        }
        self.verify()
    }

    fn decode_error(&mut self, e: io::Error) -> io::Error {
        match Error::from_io(e) {
            Error::Io(io) => {
                let failure = Failure::Data(io.to_string());
                let err = self.fail(&failure);
                self.failure = Some(failure);
                err
            }
            crate_error => crate_error.into_io(),
        }
    }

    /// Restarts decoding from the beginning of the entry.
    fn rewind(&mut self) -> io::Result<()> {
        let handle = self.handle.upgrade().ok_or_else(|| Error::Closed.into_io())?;
        self.decoder = Self::build_chain(&handle, &self.entry, self.password.as_ref())
            .map_err(Error::into_io)?;
        self.start = 0;
        self.end = 0;
        self.remaining = self.entry.uncompressed_size;
        self.delivered = 0;
        self.crc.reset();
        self.verified = false;
        self.failure = None;
        Ok(())
    }
}

impl<S: Storage> Read for EntryReader<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl<S: Storage> BufRead for EntryReader<S> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if let Some(failure) = self.failure.clone() {
            return Err(self.fail(&failure));
        }
        if self.start == self.end && (self.remaining > 0 || !self.verified) {
            self.refill()?;
        }
        Ok(&self.buffer[self.start..self.end])
    }

    fn consume(&mut self, amt: usize) {
        let amt = amt.min(self.end - self.start);
        self.start += amt;
        self.delivered += amt as u64;
    }
}

impl<S: Storage> Seek for EntryReader<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let size = self.entry.uncompressed_size;
        let target = match pos {
            SeekFrom::Start(p) => p as i128,
            SeekFrom::Current(d) => self.delivered as i128 + d as i128,
            SeekFrom::End(d) => size as i128 + d as i128,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek to a negative position",
            ));
        }
        let target = (target as u64).min(size);

        if target < self.delivered {
            let buffered_from = self.delivered - self.start as u64;
            if target >= buffered_from && self.failure.is_none() {
                self.start = (target - buffered_from) as usize;
                self.delivered = target;
                return Ok(target);
            }
            self.rewind()?;
        }
        while self.delivered < target {
            let available = self.fill_buf()?.len();
            if available == 0 {
                break;
            }
            let step = available.min((target - self.delivered) as usize);
            self.consume(step);
        }
        Ok(self.delivered)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.delivered)
    }
}
