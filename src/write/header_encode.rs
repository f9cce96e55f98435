//! Header encoding for entries being written.

use crate::codec::CompressionMethod;
use crate::format::extra::{self, ZIP64_EXTRA_ID};
use crate::format::names::encode_name;
use crate::format::records::{CentralDirectoryHeader, LocalFileHeader};
use crate::format::{SENTINEL_32, flags, needs_zip64, version};
use crate::read::Entry;
use crate::{Error, Result};

/// Lowest "version needed to extract" for the entry's method, raised to
/// `floor`.
fn min_version(entry: &Entry, floor: u16) -> u16 {
    let method = CompressionMethod::from_id(entry.method)
        .map(CompressionMethod::min_version)
        .unwrap_or(version::DEFAULT);
    method.max(floor)
}

fn clamp_u32(value: u64) -> u32 {
    if needs_zip64(value) {
        SENTINEL_32
    } else {
        value as u32
    }
}

fn u16_len(len: usize, what: &str) -> Result<u16> {
    u16::try_from(len).map_err(|_| Error::InvalidArgument(format!("{what} is too long")))
}

impl Entry {
    /// Encodes the local file header followed by name and extra field.
    ///
    /// With a data descriptor, CRC and sizes are written as zero. With
    /// `zip64`, a ZIP64 extra record carries both sizes and the fixed
    /// fields hold the sentinel. Raises `extract_version` and
    /// `create_version` to what the header requires.
    pub(crate) fn local_header(&mut self, zip64: bool) -> Result<Vec<u8>> {
        let (crc32, mut compressed, mut uncompressed) = if self.has_data_descriptor() {
            (0, 0, 0)
        } else {
            (self.crc32, self.compressed_size, self.uncompressed_size)
        };

        let mut extra_field = extra::strip(&self.extra, &[ZIP64_EXTRA_ID]);
        let mut floor = 0;
        if zip64 {
            extra_field.extend(extra::encode_zip64(&[uncompressed, compressed]));
            compressed = SENTINEL_32 as u64;
            uncompressed = SENTINEL_32 as u64;
            floor = version::ZIP64;
        } else if needs_zip64(compressed) || needs_zip64(uncompressed) {
            return Err(Error::LargeArchive(
                "Filesize would require ZIP64 extensions".into(),
            ));
        }

        let min = min_version(self, floor);
        self.extract_version = self.extract_version.max(min);
        self.create_version = self.create_version.max(min.min(u8::MAX as u16) as u8);

        let (name, name_flags) = encode_name(&self.name);
        let (time, date) = self.modified.to_dos();
        let header = LocalFileHeader {
            version_needed: self.extract_version,
            flags: self.flags | name_flags,
            method: self.method,
            time,
            date,
            crc32,
            compressed_size: compressed as u32,
            uncompressed_size: uncompressed as u32,
            name_len: u16_len(name.len(), "entry name")?,
            extra_len: u16_len(extra_field.len(), "extra field")?,
        };
        let mut out = Vec::with_capacity(header.total_len() as usize);
        header.write_to(&mut out);
        out.extend_from_slice(&name);
        out.extend_from_slice(&extra_field);
        Ok(out)
    }

    /// Encodes the central directory record.
    ///
    /// Values that do not fit 32 bits move into a ZIP64 extra record placed
    /// before the user's extra data.
    pub(crate) fn central_record(&self) -> Result<Vec<u8>> {
        let mut zip64_values = Vec::new();
        if needs_zip64(self.uncompressed_size) || needs_zip64(self.compressed_size) {
            zip64_values.push(self.uncompressed_size);
            zip64_values.push(self.compressed_size);
        }
        if needs_zip64(self.header_offset) {
            zip64_values.push(self.header_offset);
        }

        let user_extra = extra::strip(&self.extra, &[ZIP64_EXTRA_ID]);
        let (extra_field, floor) = if zip64_values.is_empty() {
            (user_extra, 0)
        } else {
            let mut field = extra::encode_zip64(&zip64_values);
            field.extend(user_extra);
            (field, version::ZIP64)
        };

        let min = min_version(self, floor);
        let (name, name_flags) = encode_name(&self.name);
        let (time, date) = self.modified.to_dos();
        let sizes_zip64 = zip64_values.len() >= 2;
        let header = CentralDirectoryHeader {
            create_version: self.create_version.max(min.min(u8::MAX as u16) as u8),
            create_system: self.create_system,
            extract_version: self.extract_version.max(min),
            flags: self.flags | name_flags,
            method: self.method,
            time,
            date,
            crc32: self.crc32,
            compressed_size: if sizes_zip64 {
                SENTINEL_32
            } else {
                clamp_u32(self.compressed_size)
            },
            uncompressed_size: if sizes_zip64 {
                SENTINEL_32
            } else {
                clamp_u32(self.uncompressed_size)
            },
            name_len: u16_len(name.len(), "entry name")?,
            extra_len: u16_len(extra_field.len(), "extra field")?,
            comment_len: u16_len(self.comment.len(), "entry comment")?,
            disk_start: 0,
            internal_attr: self.internal_attr,
            external_attr: self.external_attr,
            header_offset: clamp_u32(self.header_offset),
        };
        let mut out = Vec::with_capacity(CentralDirectoryHeader::SIZE + header.tail_len());
        header.write_to(&mut out);
        out.extend_from_slice(&name);
        out.extend_from_slice(&extra_field);
        out.extend_from_slice(&self.comment);
        Ok(out)
    }

    /// Whether the local header written for this entry used ZIP64 fields.
    pub(crate) fn local_header_is_zip64(local_extra: &[u8], header: &LocalFileHeader) -> bool {
        header.compressed_size == SENTINEL_32
            || header.uncompressed_size == SENTINEL_32
            || extra::ExtraRecords::new(local_extra).any(|(id, _)| id == ZIP64_EXTRA_ID)
    }
}

/// Flags reset at the start of every entry.
pub(crate) fn initial_flags(method: CompressionMethod, seekable: bool) -> u16 {
    let mut bits = 0;
    if method == CompressionMethod::Lzma {
        bits |= flags::COMPRESS_OPTION_1;
    }
    if !seekable {
        bits |= flags::DATA_DESCRIPTOR;
    }
    bits
}
