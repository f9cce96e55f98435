//! LZMA codec with the ZIP framing.
//!
//! ZIP stores LZMA data behind a small header: two version bytes, the
//! length of the properties (always 5) and the properties themselves
//! (one byte of lc/lp/pb followed by the dictionary size).

use std::io::{self, Read, Write};

use crate::{Error, Result};



/// Version bytes written in front of the properties.
const ZIP_LZMA_VERSION: [u8; 2] = [9, 4];

/// Length of the LZMA properties block.
const PROPS_SIZE: usize = 5;

/// LZMA decoder.
pub struct LzmaDecoder<R> {
    inner: lzma_rust2::LzmaReader<R>,
    end_marker: bool,
}

impl<R> std::fmt::Debug for LzmaDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LzmaDecoder")
            .field("end_marker", &self.end_marker)
            .finish_non_exhaustive()
    }
}

impl<R: Read> LzmaDecoder<R> {
    /// Creates a new LZMA decoder from raw properties.
    ///
    /// # Arguments
    ///
    /// * `input` - The compressed data source
    /// * `properties` - LZMA properties (5 bytes: 1 byte props + 4 byte dict size)
    /// * `uncompressed_size` - Expected uncompressed size, `None` if the
    ///   stream is terminated by an end marker
    pub fn new(input: R, properties: &[u8], uncompressed_size: Option<u64>) -> Result<Self> {
        let Some(props) = properties.get(..PROPS_SIZE) else {
            return Err(Error::InvalidFormat(
                "LZMA properties too short (need 5 bytes)".into(),
            ));
        };

        let props_byte = props[0];
        let dict_size = u32::from_le_bytes([props[1], props[2], props[3], props[4]]);

        let reader = lzma_rust2::LzmaReader::new_with_props(
            input,
            uncompressed_size.unwrap_or(u64::MAX),
            props_byte,
            dict_size,
            None,
        )
        .map_err(|e| Error::InvalidFormat(format!("invalid LZMA stream: {e}")))?;

        Ok(Self {
            inner: reader,
            end_marker: uncompressed_size.is_none(),
        })
    }

    /// Whether the stream is terminated by an end marker rather than by
    /// its size.
    pub fn has_end_marker(&self) -> bool {
        self.end_marker
    }

    /// Creates a decoder for a ZIP entry, consuming the ZIP LZMA header
    /// from `input` first.
    pub fn from_zip_stream(mut input: R, uncompressed_size: Option<u64>) -> Result<Self> {
        let mut header = [0u8; 4];
        input.read_exact(&mut header).map_err(truncated)?;
        let props_size = u16::from_le_bytes([header[2], header[3]]) as usize;
        if props_size != PROPS_SIZE {
            return Err(Error::InvalidFormat(format!(
                "unsupported LZMA properties size {props_size}"
            )));
        }
        let mut props = [0u8; PROPS_SIZE];
        input.read_exact(&mut props).map_err(truncated)?;
        Self::new(input, &props, uncompressed_size)
    }
}

fn truncated(e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        Error::InvalidFormat("truncated LZMA header".into())
    } else {
        Error::from_io(e)
    }
}

impl<R: Read> Read for LzmaDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

/// LZMA encoder options.
///
/// The archive compression level (0-9) selects the preset.
#[derive(Debug, Clone)]
pub struct LzmaEncoderOptions {
    /// Compression preset level (0-9, default 6).
    pub preset: u32,
}

impl Default for LzmaEncoderOptions {
    fn default() -> Self {
        Self { preset: 6 }
    }
}

impl LzmaEncoderOptions {
    /// Creates options with the given preset level.
    pub fn with_preset(preset: u32) -> Self {
        Self {
            preset: preset.min(9),
        }
    }

    fn to_lzma_options(&self) -> lzma_rust2::LzmaOptions {
        lzma_rust2::LzmaOptions::with_preset(self.preset)
    }

    /// Returns LZMA properties (5 bytes: props byte + dict size).
    pub fn properties(&self) -> Vec<u8> {
        let opts = self.to_lzma_options();
        let mut props = vec![opts.get_props()];
        props.extend_from_slice(&opts.dict_size.to_le_bytes());
        props
    }

    /// The ZIP LZMA header: version, properties length and properties.
    pub fn zip_header(&self) -> Vec<u8> {
        let mut header = ZIP_LZMA_VERSION.to_vec();
        header.extend_from_slice(&(PROPS_SIZE as u16).to_le_bytes());
        header.extend(self.properties());
        header
    }
}

/// LZMA encoder.
///
/// Writes the ZIP LZMA header, then a raw LZMA stream terminated by an
/// end marker.
pub struct LzmaEncoder<W: Write> {
    inner: lzma_rust2::LzmaWriter<W>,
}

impl<W: Write> std::fmt::Debug for LzmaEncoder<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LzmaEncoder").finish_non_exhaustive()
    }
}

impl<W: Write> LzmaEncoder<W> {
    /// Creates a new LZMA encoder and writes the ZIP LZMA header.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be written or the encoder
    /// cannot be initialized.
    pub fn new(mut output: W, options: &LzmaEncoderOptions) -> Result<Self> {
        output.write_all(&options.zip_header())?;
        let lzma_opts = options.to_lzma_options();
        let writer = lzma_rust2::LzmaWriter::new_no_header(output, &lzma_opts, true)
            .map_err(|e| Error::InvalidFormat(format!("LZMA encoder setup failed: {e}")))?;

        Ok(Self { inner: writer })
    }

    /// Finishes encoding, writing the end marker.
    pub fn try_finish(self) -> io::Result<()> {
        self.inner
            .finish()
            .map_err(|e| io::Error::other(e.to_string()))?;
        Ok(())
    }
}

impl<W: Write> Write for LzmaEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
