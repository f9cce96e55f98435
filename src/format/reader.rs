//! Low-level little-endian field access for ZIP record parsing.

use crate::{Error, Result};

/// A forward-only cursor over an in-memory record.
///
/// Every read is bounds checked; running past the end yields
/// [`Error::CorruptHeader`] tagged with the absolute offset of the record.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    base_offset: u64,
}

impl<'a> ByteReader<'a> {
    /// Creates a reader over `data`, which starts at `base_offset` in the storage.
    pub fn new(data: &'a [u8], base_offset: u64) -> Self {
        Self {
            data,
            pos: 0,
            base_offset,
        }
    }

    /// Number of bytes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Absolute storage offset of the next byte.
    pub fn offset(&self) -> u64 {
        self.base_offset + self.pos as u64
    }

    /// Takes the next `len` bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::corrupt_header(
                self.offset(),
                format!("truncated record: need {} bytes, {} left", len, self.remaining()),
            ));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Reads a byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.array::<1>()?[0])
    }

    /// Reads a little-endian u16.
    pub fn read_u16_le(&mut self) -> Result<u16> {
        self.array().map(u16::from_le_bytes)
    }

    /// Reads a little-endian u32.
    pub fn read_u32_le(&mut self) -> Result<u32> {
        self.array().map(u32::from_le_bytes)
    }

    /// Reads a little-endian u64.
    pub fn read_u64_le(&mut self) -> Result<u64> {
        self.array().map(u64::from_le_bytes)
    }

    /// Reads a u32 signature and checks it against `expected`.
    pub fn expect_signature(&mut self, expected: u32, record: &str) -> Result<()> {
        let offset = self.offset();
        let found = self.read_u32_le()?;
        if found != expected {
            return Err(Error::corrupt_header(
                offset,
                format!("bad magic number for {record}: {found:#010x}"),
            ));
        }
        Ok(())
    }
}

/// Appends little-endian fields to a record buffer.
pub trait PutLe {
    /// Appends a little-endian u16.
    fn put_u16_le(&mut self, value: u16);
    /// Appends a little-endian u32.
    fn put_u32_le(&mut self, value: u32);
    /// Appends a little-endian u64.
    fn put_u64_le(&mut self, value: u64);
}

impl PutLe for Vec<u8> {
    fn put_u16_le(&mut self, value: u16) {
        self.extend_from_slice(&value.to_le_bytes());
    }

    fn put_u32_le(&mut self, value: u32) {
        self.extend_from_slice(&value.to_le_bytes());
    }

    fn put_u64_le(&mut self, value: u64) {
        self.extend_from_slice(&value.to_le_bytes());
    }
}
