//! Fixed-size ZIP records.
//!
//! Each record knows its signature and size, parses itself from a byte
//! slice with bounds and magic checks, and appends its little-endian
//! encoding to a buffer. Variable-length tails (names, extra fields,
//! comments) are handled by the caller.

use super::reader::{ByteReader, PutLe};
use crate::Result;

/// Local file header, written immediately before each entry's data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalFileHeader {
    /// Version needed to extract.
    pub version_needed: u16,
    /// General purpose flags.
    pub flags: u16,
    /// Compression method id.
    pub method: u16,
    /// MS-DOS time.
    pub time: u16,
    /// MS-DOS date.
    pub date: u16,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Compressed size, or the ZIP64 sentinel.
    pub compressed_size: u32,
    /// Uncompressed size, or the ZIP64 sentinel.
    pub uncompressed_size: u32,
    /// Length of the name that follows.
    pub name_len: u16,
    /// Length of the extra field that follows the name.
    pub extra_len: u16,
}

impl LocalFileHeader {
    /// `PK\x03\x04`
    pub const SIGNATURE: u32 = 0x0403_4b50;
    /// Encoded size without name and extra field.
    pub const SIZE: usize = 30;

    /// Parses a header from the start of `data`.
    pub fn parse(data: &[u8], offset: u64) -> Result<Self> {
        let mut r = ByteReader::new(data, offset);
        r.expect_signature(Self::SIGNATURE, "file header")?;
        Ok(Self {
            version_needed: r.read_u16_le()?,
            flags: r.read_u16_le()?,
            method: r.read_u16_le()?,
            time: r.read_u16_le()?,
            date: r.read_u16_le()?,
            crc32: r.read_u32_le()?,
            compressed_size: r.read_u32_le()?,
            uncompressed_size: r.read_u32_le()?,
            name_len: r.read_u16_le()?,
            extra_len: r.read_u16_le()?,
        })
    }

    /// Appends the encoded header.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.put_u32_le(Self::SIGNATURE);
        out.put_u16_le(self.version_needed);
        out.put_u16_le(self.flags);
        out.put_u16_le(self.method);
        out.put_u16_le(self.time);
        out.put_u16_le(self.date);
        out.put_u32_le(self.crc32);
        out.put_u32_le(self.compressed_size);
        out.put_u32_le(self.uncompressed_size);
        out.put_u16_le(self.name_len);
        out.put_u16_le(self.extra_len);
    }

    /// Total header length including name and extra field.
    pub fn total_len(&self) -> u64 {
        Self::SIZE as u64 + self.name_len as u64 + self.extra_len as u64
    }
}

/// Central directory file header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CentralDirectoryHeader {
    /// Version made by (low byte).
    pub create_version: u8,
    /// Host system (high byte of "version made by").
    pub create_system: u8,
    /// Version needed to extract.
    pub extract_version: u16,
    /// General purpose flags.
    pub flags: u16,
    /// Compression method id.
    pub method: u16,
    /// MS-DOS time.
    pub time: u16,
    /// MS-DOS date.
    pub date: u16,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Compressed size, or the ZIP64 sentinel.
    pub compressed_size: u32,
    /// Uncompressed size, or the ZIP64 sentinel.
    pub uncompressed_size: u32,
    /// Length of the name.
    pub name_len: u16,
    /// Length of the extra field.
    pub extra_len: u16,
    /// Length of the entry comment.
    pub comment_len: u16,
    /// Disk number where the entry starts.
    pub disk_start: u16,
    /// Internal attributes.
    pub internal_attr: u16,
    /// External attributes.
    pub external_attr: u32,
    /// Offset of the local header, or the ZIP64 sentinel.
    pub header_offset: u32,
}

impl CentralDirectoryHeader {
    /// `PK\x01\x02`
    pub const SIGNATURE: u32 = 0x0201_4b50;
    /// Encoded size without name, extra field and comment.
    pub const SIZE: usize = 46;

    /// Parses a header from the start of `data`.
    pub fn parse(data: &[u8], offset: u64) -> Result<Self> {
        let mut r = ByteReader::new(data, offset);
        r.expect_signature(Self::SIGNATURE, "central directory")?;
        Ok(Self {
            create_version: r.read_u8()?,
            create_system: r.read_u8()?,
            extract_version: r.read_u16_le()?,
            flags: r.read_u16_le()?,
            method: r.read_u16_le()?,
            time: r.read_u16_le()?,
            date: r.read_u16_le()?,
            crc32: r.read_u32_le()?,
            compressed_size: r.read_u32_le()?,
            uncompressed_size: r.read_u32_le()?,
            name_len: r.read_u16_le()?,
            extra_len: r.read_u16_le()?,
            comment_len: r.read_u16_le()?,
            disk_start: r.read_u16_le()?,
            internal_attr: r.read_u16_le()?,
            external_attr: r.read_u32_le()?,
            header_offset: r.read_u32_le()?,
        })
    }

    /// Appends the encoded header.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.put_u32_le(Self::SIGNATURE);
        out.push(self.create_version);
        out.push(self.create_system);
        out.put_u16_le(self.extract_version);
        out.put_u16_le(self.flags);
        out.put_u16_le(self.method);
        out.put_u16_le(self.time);
        out.put_u16_le(self.date);
        out.put_u32_le(self.crc32);
        out.put_u32_le(self.compressed_size);
        out.put_u32_le(self.uncompressed_size);
        out.put_u16_le(self.name_len);
        out.put_u16_le(self.extra_len);
        out.put_u16_le(self.comment_len);
        out.put_u16_le(self.disk_start);
        out.put_u16_le(self.internal_attr);
        out.put_u32_le(self.external_attr);
        out.put_u32_le(self.header_offset);
    }

    /// Length of the variable tail (name, extra field, comment).
    pub fn tail_len(&self) -> usize {
        self.name_len as usize + self.extra_len as usize + self.comment_len as usize
    }
}

/// End of central directory record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    /// Number of this disk.
    pub disk_number: u16,
    /// Disk where the central directory starts.
    pub disk_start: u16,
    /// Entries on this disk.
    pub entries_this_disk: u16,
    /// Total entries.
    pub entries_total: u16,
    /// Size of the central directory.
    pub directory_size: u32,
    /// Offset of the central directory.
    pub directory_offset: u32,
    /// Length of the archive comment that follows.
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    /// `PK\x05\x06`
    pub const SIGNATURE: u32 = 0x0605_4b50;
    /// Encoded size without the comment.
    pub const SIZE: usize = 22;

    /// Parses a record from the start of `data`.
    pub fn parse(data: &[u8], offset: u64) -> Result<Self> {
        let mut r = ByteReader::new(data, offset);
        r.expect_signature(Self::SIGNATURE, "end of central directory")?;
        Ok(Self {
            disk_number: r.read_u16_le()?,
            disk_start: r.read_u16_le()?,
            entries_this_disk: r.read_u16_le()?,
            entries_total: r.read_u16_le()?,
            directory_size: r.read_u32_le()?,
            directory_offset: r.read_u32_le()?,
            comment_len: r.read_u16_le()?,
        })
    }

    /// Appends the encoded record.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.put_u32_le(Self::SIGNATURE);
        out.put_u16_le(self.disk_number);
        out.put_u16_le(self.disk_start);
        out.put_u16_le(self.entries_this_disk);
        out.put_u16_le(self.entries_total);
        out.put_u32_le(self.directory_size);
        out.put_u32_le(self.directory_offset);
        out.put_u16_le(self.comment_len);
    }
}

/// ZIP64 end of central directory record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Zip64EndOfCentralDirectory {
    /// Size of the remaining record (44 without extensible data).
    pub record_size: u64,
    /// Version made by.
    pub create_version: u16,
    /// Version needed to extract.
    pub extract_version: u16,
    /// Number of this disk.
    pub disk_number: u32,
    /// Disk where the central directory starts.
    pub disk_start: u32,
    /// Entries on this disk.
    pub entries_this_disk: u64,
    /// Total entries.
    pub entries_total: u64,
    /// Size of the central directory.
    pub directory_size: u64,
    /// Offset of the central directory.
    pub directory_offset: u64,
}

impl Zip64EndOfCentralDirectory {
    /// `PK\x06\x06`
    pub const SIGNATURE: u32 = 0x0606_4b50;
    /// Encoded size.
    pub const SIZE: usize = 56;
    /// Value of `record_size` for a record without extensible data.
    pub const RECORD_SIZE: u64 = 44;

    /// Parses a record from the start of `data`.
    pub fn parse(data: &[u8], offset: u64) -> Result<Self> {
        let mut r = ByteReader::new(data, offset);
        r.expect_signature(Self::SIGNATURE, "zip64 end of central directory")?;
        Ok(Self {
            record_size: r.read_u64_le()?,
            create_version: r.read_u16_le()?,
            extract_version: r.read_u16_le()?,
            disk_number: r.read_u32_le()?,
            disk_start: r.read_u32_le()?,
            entries_this_disk: r.read_u64_le()?,
            entries_total: r.read_u64_le()?,
            directory_size: r.read_u64_le()?,
            directory_offset: r.read_u64_le()?,
        })
    }

    /// Appends the encoded record.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.put_u32_le(Self::SIGNATURE);
        out.put_u64_le(self.record_size);
        out.put_u16_le(self.create_version);
        out.put_u16_le(self.extract_version);
        out.put_u32_le(self.disk_number);
        out.put_u32_le(self.disk_start);
        out.put_u64_le(self.entries_this_disk);
        out.put_u64_le(self.entries_total);
        out.put_u64_le(self.directory_size);
        out.put_u64_le(self.directory_offset);
    }
}

/// ZIP64 end of central directory locator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Zip64Locator {
    /// Disk holding the ZIP64 end record.
    pub disk_number: u32,
    /// Offset of the ZIP64 end record.
    pub eocd_offset: u64,
    /// Total number of disks.
    pub total_disks: u32,
}

impl Zip64Locator {
    /// `PK\x06\x07`
    pub const SIGNATURE: u32 = 0x0706_4b50;
    /// Encoded size.
    pub const SIZE: usize = 20;

    /// Parses a locator from the start of `data`.
    pub fn parse(data: &[u8], offset: u64) -> Result<Self> {
        let mut r = ByteReader::new(data, offset);
        r.expect_signature(Self::SIGNATURE, "zip64 locator")?;
        Ok(Self {
            disk_number: r.read_u32_le()?,
            eocd_offset: r.read_u64_le()?,
            total_disks: r.read_u32_le()?,
        })
    }

    /// Appends the encoded locator.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.put_u32_le(Self::SIGNATURE);
        out.put_u32_le(self.disk_number);
        out.put_u64_le(self.eocd_offset);
        out.put_u32_le(self.total_disks);
    }
}

/// Trailing data descriptor written after entries with flag bit 3.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataDescriptor {
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Compressed size.
    pub compressed_size: u64,
    /// Uncompressed size.
    pub uncompressed_size: u64,
}

impl DataDescriptor {
    /// `PK\x07\x08`
    pub const SIGNATURE: u32 = 0x0807_4b50;

    /// Encoded length including the signature.
    pub const fn encoded_len(zip64: bool) -> usize {
        if zip64 { 24 } else { 16 }
    }

    /// Parses a descriptor. The leading signature is optional.
    ///
    /// `zip64` selects 8-byte size fields.
    pub fn parse(data: &[u8], offset: u64, zip64: bool) -> Result<Self> {
        let mut r = ByteReader::new(data, offset);
        let first = r.read_u32_le()?;
        let crc32 = if first == Self::SIGNATURE {
            r.read_u32_le()?
        } else {
            first
        };
        let (compressed_size, uncompressed_size) = if zip64 {
            (r.read_u64_le()?, r.read_u64_le()?)
        } else {
            (r.read_u32_le()? as u64, r.read_u32_le()? as u64)
        };
        Ok(Self {
            crc32,
            compressed_size,
            uncompressed_size,
        })
    }

    /// Appends the descriptor with its signature.
    ///
    /// Without `zip64` the sizes must already fit 32 bits.
    pub fn write_to(&self, out: &mut Vec<u8>, zip64: bool) {
        out.put_u32_le(Self::SIGNATURE);
        out.put_u32_le(self.crc32);
        if zip64 {
            out.put_u64_le(self.compressed_size);
            out.put_u64_le(self.uncompressed_size);
        } else {
            out.put_u32_le(self.compressed_size as u32);
            out.put_u32_le(self.uncompressed_size as u32);
        }
    }
}
