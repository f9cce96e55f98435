//! Extra-field chains.
//!
//! An extra field is a sequence of `(id: u16, len: u16, data[len])`
//! records. Only the ZIP64 record (id `0x0001`) is interpreted; all other
//! records are carried through untouched.

use super::SENTINEL_32;
use super::reader::{ByteReader, PutLe};
use crate::{Error, Result};

/// Header id of the ZIP64 extended information record.
pub const ZIP64_EXTRA_ID: u16 = 0x0001;

/// Iterator over the `(id, data)` records of an extra field.
///
/// Stops at the first record whose declared length overruns the chain and
/// reports it through [`ExtraRecords::overrun`].
#[derive(Debug, Clone)]
pub struct ExtraRecords<'a> {
    data: &'a [u8],
    overrun: Option<(u16, u16)>,
}

impl<'a> ExtraRecords<'a> {
    /// Iterates the records of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            overrun: None,
        }
    }

    /// The `(id, len)` of a record that ran past the end of the chain.
    pub fn overrun(&self) -> Option<(u16, u16)> {
        self.overrun
    }

    /// Bytes not consumed by complete records.
    pub fn rest(&self) -> &'a [u8] {
        self.data
    }
}

impl<'a> Iterator for ExtraRecords<'a> {
    type Item = (u16, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.len() < 4 || self.overrun.is_some() {
            return None;
        }
        let id = u16::from_le_bytes([self.data[0], self.data[1]]);
        let len = u16::from_le_bytes([self.data[2], self.data[3]]);
        let end = 4 + len as usize;
        if end > self.data.len() {
            self.overrun = Some((id, len));
            return None;
        }
        let body = &self.data[4..end];
        self.data = &self.data[end..];
        Some((id, body))
    }
}

/// Removes every record whose id is in `ids`.
///
/// Trailing bytes that do not form a complete record are kept as they are.
pub fn strip(extra: &[u8], ids: &[u16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(extra.len());
    let mut records = ExtraRecords::new(extra);
    for (id, body) in records.by_ref() {
        if ids.contains(&id) {
            continue;
        }
        out.put_u16_le(id);
        out.put_u16_le(body.len() as u16);
        out.extend_from_slice(body);
    }
    out.extend_from_slice(records.rest());
    out
}

/// 64-bit values resolved from a central directory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zip64Fields {
    /// Uncompressed size.
    pub uncompressed_size: u64,
    /// Compressed size.
    pub compressed_size: u64,
    /// Offset of the local header.
    pub header_offset: u64,
}

impl Zip64Fields {
    /// Replaces every sentinel field with the value from the ZIP64 extra
    /// record in `extra`.
    ///
    /// Values appear in the record in the fixed order uncompressed size,
    /// compressed size, header offset, each only if its 32-bit field holds
    /// the sentinel. `offset` locates the owning record for error reports.
    pub fn resolve(mut self, extra: &[u8], offset: u64) -> Result<Self> {
        let mut records = ExtraRecords::new(extra);
        for (id, body) in records.by_ref() {
            if id != ZIP64_EXTRA_ID {
                continue;
            }
            let mut r = ByteReader::new(body, offset);
            let missing = |field: &str| {
                Error::corrupt_header(
                    offset,
                    format!("corrupt zip64 extra field: {field} not found"),
                )
            };
            if self.uncompressed_size == SENTINEL_32 as u64 {
                self.uncompressed_size = r.read_u64_le().map_err(|_| missing("file size"))?;
            }
            if self.compressed_size == SENTINEL_32 as u64 {
                self.compressed_size = r.read_u64_le().map_err(|_| missing("compress size"))?;
            }
            if self.header_offset == SENTINEL_32 as u64 {
                self.header_offset = r.read_u64_le().map_err(|_| missing("header offset"))?;
            }
        }
        if let Some((id, len)) = records.overrun() {
            return Err(Error::corrupt_header(
                offset,
                format!("corrupt extra field {id:04x} (size={len})"),
            ));
        }
        Ok(self)
    }
}

/// Encodes a ZIP64 extra record holding `values` in order.
pub fn encode_zip64(values: &[u64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + 8 * values.len());
    out.put_u16_le(ZIP64_EXTRA_ID);
    out.put_u16_le((8 * values.len()) as u16);
    for value in values {
        out.put_u64_le(*value);
    }
    out
}
