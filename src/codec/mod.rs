//! Compression codecs for ZIP entries.
//!
//! Decoding is pull-based: an [`EntryDecoder`] wraps the raw entry bytes
//! and produces plaintext through [`Read`]. Encoding is push-based: a
//! compressor accepts plaintext chunks and hands back whatever
//! compressed bytes are ready, so the entry writer can count and store
//! them as they are produced.

#[cfg(feature = "lzma")]
pub mod lzma;

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

use crate::{Error, Result};

#[cfg(feature = "lzma")]
pub use lzma::{LzmaDecoder, LzmaEncoder, LzmaEncoderOptions};

/// Default deflate level.
const DEFLATE_DEFAULT_LEVEL: u32 = 6;

/// Default bzip2 level (900k blocks).
const BZIP2_DEFAULT_LEVEL: u32 = 9;

/// Method IDs stored in ZIP headers.
pub mod method {
    /// Stored (no compression).
    pub const STORE: u16 = 0;
    /// Deflate compression.
    pub const DEFLATE: u16 = 8;
    /// BZip2 compression.
    pub const BZIP2: u16 = 12;
    /// LZMA compression.
    pub const LZMA: u16 = 14;

    /// Returns a human-readable name for a method ID.
    pub fn name(id: u16) -> &'static str {
        match id {
            STORE => "Stored",
            DEFLATE => "Deflate",
            BZIP2 => "BZip2",
            LZMA => "LZMA",
            _ => "Unknown",
        }
    }
}

/// Compression methods this crate can read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionMethod {
    /// No compression.
    #[default]
    Stored,
    /// Raw deflate.
    Deflated,
    /// BZip2.
    Bzip2,
    /// LZMA with the ZIP-specific 4-byte header.
    Lzma,
}

impl CompressionMethod {
    /// The method ID written to headers.
    pub fn id(self) -> u16 {
        match self {
            CompressionMethod::Stored => method::STORE,
            CompressionMethod::Deflated => method::DEFLATE,
            CompressionMethod::Bzip2 => method::BZIP2,
            CompressionMethod::Lzma => method::LZMA,
        }
    }

    /// Maps a header method ID to a known method.
    ///
    /// Unknown IDs fail with [`Error::UnsupportedMethod`].
    pub fn from_id(id: u16) -> Result<Self> {
        match id {
            method::STORE => Ok(CompressionMethod::Stored),
            method::DEFLATE => Ok(CompressionMethod::Deflated),
            method::BZIP2 => Ok(CompressionMethod::Bzip2),
            method::LZMA => Ok(CompressionMethod::Lzma),
            _ => Err(Error::UnsupportedMethod { method_id: id }),
        }
    }

    /// Returns `true` if the codec was compiled into this build.
    pub fn is_supported(self) -> bool {
        match self {
            CompressionMethod::Stored => true,
            CompressionMethod::Deflated => cfg!(feature = "deflate"),
            CompressionMethod::Bzip2 => cfg!(feature = "bzip2"),
            CompressionMethod::Lzma => cfg!(feature = "lzma"),
        }
    }

    /// Minimum "version needed to extract" for entries using this method.
    pub fn min_version(self) -> u16 {
        use crate::format::version;
        match self {
            CompressionMethod::Stored | CompressionMethod::Deflated => version::DEFAULT,
            CompressionMethod::Bzip2 => version::BZIP2,
            CompressionMethod::Lzma => version::LZMA,
        }
    }

    /// Fails with [`Error::UnsupportedMethod`] if the codec is not built in.
    pub fn ensure_supported(self) -> Result<()> {
        if self.is_supported() {
            Ok(())
        } else {
            Err(Error::UnsupportedMethod {
                method_id: self.id(),
            })
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(method::name(self.id()))
    }
}

/// Pull-based decoder over the raw bytes of one entry.
pub enum EntryDecoder<R: Read> {
    /// Stored data, bounded to the compressed size.
    Stored(io::Take<R>),
    /// Raw deflate.
    #[cfg(feature = "deflate")]
    Deflated(flate2::bufread::DeflateDecoder<io::BufReader<R>>),
    /// BZip2.
    #[cfg(feature = "bzip2")]
    Bzip2(bzip2::read::BzDecoder<R>),
    /// LZMA.
    #[cfg(feature = "lzma")]
    Lzma(LzmaDecoder<R>),
}

impl<R: Read> fmt::Debug for EntryDecoder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntryDecoder").field(&self.method()).finish()
    }
}

impl<R: Read> Read for EntryDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            EntryDecoder::Stored(d) => d.read(buf),
            #[cfg(feature = "deflate")]
            EntryDecoder::Deflated(d) => d.read(buf),
            #[cfg(feature = "bzip2")]
            EntryDecoder::Bzip2(d) => d.read(buf),
            #[cfg(feature = "lzma")]
            EntryDecoder::Lzma(d) => d.read(buf),
        }
    }
}

impl<R: Read> EntryDecoder<R> {
    /// The method this decoder handles.
    pub fn method(&self) -> CompressionMethod {
        match self {
            EntryDecoder::Stored(_) => CompressionMethod::Stored,
            #[cfg(feature = "deflate")]
            EntryDecoder::Deflated(_) => CompressionMethod::Deflated,
            #[cfg(feature = "bzip2")]
            EntryDecoder::Bzip2(_) => CompressionMethod::Bzip2,
            #[cfg(feature = "lzma")]
            EntryDecoder::Lzma(_) => CompressionMethod::Lzma,
        }
    }

    /// Whether the compressed stream carries its own end marker.
    fn self_terminating(&self) -> bool {
        match self {
            EntryDecoder::Stored(_) => false,
            #[cfg(feature = "deflate")]
            EntryDecoder::Deflated(_) => true,
            #[cfg(feature = "bzip2")]
            EntryDecoder::Bzip2(_) => true,
            #[cfg(feature = "lzma")]
            EntryDecoder::Lzma(d) => d.has_end_marker(),
        }
    }

    /// Checks that a self-terminating stream ends where the declared
    /// uncompressed size does.
    ///
    /// Call once the declared size has been produced. Output past that
    /// point, or a stream that fails to reach its end marker, is an
    /// [`io::ErrorKind::InvalidData`] error.
    pub fn ensure_end(&mut self) -> io::Result<()> {
        if !self.self_terminating() {
            return Ok(());
        }
        let mut extra = [0u8; 1];
        loop {
            match self.read(&mut extra) {
                Ok(0) => return Ok(()),
                Ok(_) => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("{} stream continues past the declared size", self.method()),
                    ));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Builds the decoder for one entry.
///
/// `input` must already be limited to the entry's compressed bytes.
/// `flags` are the entry's general purpose flags; LZMA uses bit 1 to tell
/// whether the stream ends with an end marker.
pub(crate) fn build_decoder<R: Read>(
    input: R,
    method: CompressionMethod,
    flags: u16,
    compressed_size: u64,
    uncompressed_size: u64,
) -> Result<EntryDecoder<R>> {
    method.ensure_supported()?;
    #[allow(unused_variables)]
    let eos_marker = flags & crate::format::flags::COMPRESS_OPTION_1 != 0;
    match method {
        CompressionMethod::Stored => Ok(EntryDecoder::Stored(input.take(compressed_size))),

        #[cfg(feature = "deflate")]
        CompressionMethod::Deflated => {
            let buf_reader = io::BufReader::with_capacity(crate::READ_BUFFER_SIZE, input);
            Ok(EntryDecoder::Deflated(flate2::bufread::DeflateDecoder::new(
                buf_reader,
            )))
        }

        #[cfg(feature = "bzip2")]
        CompressionMethod::Bzip2 => Ok(EntryDecoder::Bzip2(bzip2::read::BzDecoder::new(
            input,
        ))),

        #[cfg(feature = "lzma")]
        CompressionMethod::Lzma => {
            let size = if eos_marker {
                None
            } else {
                Some(uncompressed_size)
            };
            Ok(EntryDecoder::Lzma(LzmaDecoder::from_zip_stream(input, size)?))
        }

        #[allow(unreachable_patterns)]
        other => Err(Error::UnsupportedMethod {
            method_id: other.id(),
        }),
    }
}

/// A growable buffer shared between an encoder and its owner.
///
/// The encoder writes into it; the owner drains it after every call.
#[derive(Debug, Clone, Default)]
pub(crate) struct SpillBuffer(Arc<Mutex<Vec<u8>>>);

impl SpillBuffer {
    fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *crate::handle::lock_or_recover(&self.0))
    }
}

impl Write for SpillBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        crate::handle::lock_or_recover(&self.0).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Push-based compressor for one entry.
pub(crate) enum Compressor {
    /// Stored data passes through.
    Stored,
    /// Raw deflate.
    #[cfg(feature = "deflate")]
    Deflated(flate2::write::DeflateEncoder<SpillBuffer>, SpillBuffer),
    /// BZip2.
    #[cfg(feature = "bzip2")]
    Bzip2(bzip2::write::BzEncoder<SpillBuffer>, SpillBuffer),
    /// LZMA, preceded by its ZIP header.
    #[cfg(feature = "lzma")]
    Lzma(LzmaEncoder<SpillBuffer>, SpillBuffer),
}

impl fmt::Debug for Compressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Compressor").field(&self.method()).finish()
    }
}

fn encode_error(method: CompressionMethod, e: io::Error) -> Error {
    Error::InvalidFormat(format!("{method} compression failed: {e}"))
}

impl Compressor {
    /// Creates a compressor. `level` of `None` uses the codec default.
    pub fn new(method: CompressionMethod, level: Option<u32>) -> Result<Self> {
        method.ensure_supported()?;
        #[allow(unused_variables)]
        let spill = SpillBuffer::default();
        match method {
            CompressionMethod::Stored => Ok(Compressor::Stored),

            #[cfg(feature = "deflate")]
            CompressionMethod::Deflated => {
                let level = level.unwrap_or(DEFLATE_DEFAULT_LEVEL).min(9);
                let level = flate2::Compression::new(level);
                Ok(Compressor::Deflated(
                    flate2::write::DeflateEncoder::new(spill.clone(), level),
                    spill,
                ))
            }

            #[cfg(feature = "bzip2")]
            CompressionMethod::Bzip2 => {
                let level = level.unwrap_or(BZIP2_DEFAULT_LEVEL).clamp(1, 9);
                let level = bzip2::Compression::new(level);
                Ok(Compressor::Bzip2(
                    bzip2::write::BzEncoder::new(spill.clone(), level),
                    spill,
                ))
            }

            #[cfg(feature = "lzma")]
            CompressionMethod::Lzma => {
                let opts = level
                    .map(LzmaEncoderOptions::with_preset)
                    .unwrap_or_default();
                let encoder = LzmaEncoder::new(spill.clone(), &opts)?;
                Ok(Compressor::Lzma(encoder, spill))
            }

            #[allow(unreachable_patterns)]
            other => Err(Error::UnsupportedMethod {
                method_id: other.id(),
            }),
        }
    }

    /// The method this compressor produces.
    pub fn method(&self) -> CompressionMethod {
        match self {
            Compressor::Stored => CompressionMethod::Stored,
            #[cfg(feature = "deflate")]
            Compressor::Deflated(..) => CompressionMethod::Deflated,
            #[cfg(feature = "bzip2")]
            Compressor::Bzip2(..) => CompressionMethod::Bzip2,
            #[cfg(feature = "lzma")]
            Compressor::Lzma(..) => CompressionMethod::Lzma,
        }
    }

    /// Compresses `data`, returning the compressed bytes produced so far.
    pub fn compress(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        let method = self.method();
        match self {
            Compressor::Stored => Ok(data.to_vec()),
            #[cfg(feature = "deflate")]
            Compressor::Deflated(enc, spill) => {
                enc.write_all(data).map_err(|e| encode_error(method, e))?;
                Ok(spill.take())
            }
            #[cfg(feature = "bzip2")]
            Compressor::Bzip2(enc, spill) => {
                enc.write_all(data).map_err(|e| encode_error(method, e))?;
                Ok(spill.take())
            }
            #[cfg(feature = "lzma")]
            Compressor::Lzma(enc, spill) => {
                enc.write_all(data).map_err(|e| encode_error(method, e))?;
                Ok(spill.take())
            }
        }
    }

    /// Finishes the stream and returns the remaining compressed bytes.
    pub fn flush(self) -> Result<Vec<u8>> {
        let method = self.method();
        match self {
            Compressor::Stored => Ok(Vec::new()),
            #[cfg(feature = "deflate")]
            Compressor::Deflated(enc, spill) => {
                enc.finish().map_err(|e| encode_error(method, e))?;
                Ok(spill.take())
            }
            #[cfg(feature = "bzip2")]
            Compressor::Bzip2(enc, spill) => {
                enc.finish().map_err(|e| encode_error(method, e))?;
                Ok(spill.take())
            }
            #[cfg(feature = "lzma")]
            Compressor::Lzma(enc, spill) => {
                enc.try_finish().map_err(|e| encode_error(method, e))?;
                Ok(spill.take())
            }
        }
    }
}
