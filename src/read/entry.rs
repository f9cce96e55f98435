//! Per-entry metadata.

use std::path::Path;

use crate::codec::CompressionMethod;
use crate::format::extra::Zip64Fields;
use crate::format::names::{decode_name, normalize};
use crate::format::records::CentralDirectoryHeader;
use crate::format::{DOS_DIRECTORY_ATTR, flags, host, version};
use crate::timestamp::DosDateTime;
use crate::{Error, Result};

/// An entry in a ZIP archive.
///
/// Values read from the central directory are kept as stored, with ZIP64
/// extensions already applied. Entries built for writing start from
/// [`Entry::new`] or [`Entry::from_path`] and are completed by the writer.
///
/// This struct is marked `#[non_exhaustive]` to allow adding new fields
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Entry {
    /// Normalized name used for lookups. Directories end with `/`.
    pub name: String,
    /// Name as decoded from the central directory, before normalization.
    ///
    /// The local header must carry the same name.
    pub raw_name: String,
    /// Modification time.
    pub modified: DosDateTime,
    /// Compression method ID.
    pub method: u16,
    /// General purpose flags.
    pub flags: u16,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Compressed size in bytes (including any encryption header).
    pub compressed_size: u64,
    /// Uncompressed size in bytes.
    pub uncompressed_size: u64,
    /// Absolute offset of the local header.
    pub header_offset: u64,
    /// External attributes; the high 16 bits hold the Unix mode.
    pub external_attr: u32,
    /// Internal attributes.
    pub internal_attr: u16,
    /// Extra field as stored (may include a ZIP64 record).
    pub extra: Vec<u8>,
    /// Entry comment.
    pub comment: Vec<u8>,
    /// "Version made by", low byte.
    pub create_version: u8,
    /// Host system that created the entry.
    pub create_system: u8,
    /// "Version needed to extract".
    pub extract_version: u16,
    /// Disk number where the entry starts.
    pub volume: u16,
    /// Compression level requested for writing, `None` for the codec default.
    pub compress_level: Option<u32>,
}

impl Entry {
    /// Creates an entry named `name` with default metadata.
    ///
    /// The timestamp defaults to 1980-01-01 00:00:00 and the method to
    /// stored. The name is normalized: it is cut at the first NUL, uses `/`
    /// as separator and has no leading slash.
    pub fn new(name: impl AsRef<str>) -> Self {
        let name = normalize(name.as_ref());
        Self {
            raw_name: name.clone(),
            name,
            modified: DosDateTime::MIN,
            method: CompressionMethod::Stored.id(),
            flags: 0,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            header_offset: 0,
            external_attr: 0,
            internal_attr: 0,
            extra: Vec::new(),
            comment: Vec::new(),
            create_version: version::DEFAULT as u8,
            create_system: host::current(),
            extract_version: version::DEFAULT,
            volume: 0,
            compress_level: None,
        }
    }

    /// Sets the modification time.
    pub fn with_timestamp(mut self, modified: DosDateTime) -> Self {
        self.modified = modified;
        self
    }

    /// Sets the compression method.
    pub fn with_method(mut self, method: CompressionMethod) -> Self {
        self.method = method.id();
        self
    }

    /// Sets the compression level.
    pub fn with_level(mut self, level: u32) -> Self {
        self.compress_level = Some(level);
        self
    }

    /// Sets the external attributes.
    pub fn with_external_attr(mut self, attr: u32) -> Self {
        self.external_attr = attr;
        self
    }

    /// Sets the entry comment.
    pub fn with_comment(mut self, comment: impl Into<Vec<u8>>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Sets the extra field.
    pub fn with_extra(mut self, extra: impl Into<Vec<u8>>) -> Self {
        self.extra = extra.into();
        self
    }

    /// Declares the expected uncompressed size.
    ///
    /// The writer uses the hint to decide up front whether the entry needs
    /// ZIP64 headers.
    pub fn with_size_hint(mut self, size: u64) -> Self {
        self.uncompressed_size = size;
        self
    }

    /// Builds an entry describing a filesystem object.
    ///
    /// `arcname` defaults to `path`. Drive letters, leading separators and
    /// `.` components are dropped. `..` removes the preceding component and
    /// is dropped when there is none, so the name never climbs above the
    /// archive root. Directories get a trailing `/` and the DOS directory
    /// attribute. With `strict_timestamps` unset, modification times
    /// outside 1980..=2107 are clamped.
    pub fn from_path(
        path: impl AsRef<Path>,
        arcname: Option<&str>,
        strict_timestamps: bool,
    ) -> Result<Self> {
        let path = path.as_ref();
        let meta = std::fs::metadata(path)?;
        let is_dir = meta.is_dir();
        let modified = DosDateTime::from_system_time(meta.modified()?, strict_timestamps)?;

        let source = match arcname {
            Some(name) => name.to_string(),
            None => path.to_string_lossy().into_owned(),
        };
        let mut name = normalize_arcname(&source);
        if is_dir {
            name.push('/');
        }

        let mut entry = Entry::new(name).with_timestamp(modified);
        entry.external_attr = (file_mode(&meta) & 0xFFFF) << 16;
        if is_dir {
            entry.uncompressed_size = 0;
            entry.external_attr |= DOS_DIRECTORY_ATTR;
        } else {
            entry.uncompressed_size = meta.len();
        }
        Ok(entry)
    }

    /// Parses one central directory record from the start of `data`.
    ///
    /// Returns the entry and the number of bytes consumed. `offset` is the
    /// absolute position of the record; `concat` is the number of bytes
    /// prepended to the archive and is added to the header offset.
    pub(crate) fn parse_central(data: &[u8], offset: u64, concat: i64) -> Result<(Self, usize)> {
        let header = CentralDirectoryHeader::parse(data, offset)?;
        let total = CentralDirectoryHeader::SIZE + header.tail_len();
        let tail = data
            .get(CentralDirectoryHeader::SIZE..total)
            .ok_or_else(|| Error::corrupt_header(offset, "truncated central directory"))?;
        let name_end = header.name_len as usize;
        let extra_end = name_end + header.extra_len as usize;
        let name_bytes = &tail[..name_end];
        let extra = &tail[name_end..extra_end];
        let comment = &tail[extra_end..];

        let raw_name = decode_name(name_bytes, header.flags);
        let name = normalize(&raw_name);

        let fields = Zip64Fields {
            uncompressed_size: header.uncompressed_size as u64,
            compressed_size: header.compressed_size as u64,
            header_offset: header.header_offset as u64,
        }
        .resolve(extra, offset)?;

        let header_offset = u64::try_from(fields.header_offset as i128 + concat as i128)
            .map_err(|_| Error::corrupt_header(offset, "bad local header offset"))?;

        if header.extract_version > version::MAX_EXTRACT {
            return Err(Error::UnsupportedVersion {
                entry_name: name,
                version: header.extract_version,
            });
        }

        let entry = Self {
            name,
            raw_name,
            modified: DosDateTime::from_dos(header.time, header.date),
            method: header.method,
            flags: header.flags,
            crc32: header.crc32,
            compressed_size: fields.compressed_size,
            uncompressed_size: fields.uncompressed_size,
            header_offset,
            external_attr: header.external_attr,
            internal_attr: header.internal_attr,
            extra: extra.to_vec(),
            comment: comment.to_vec(),
            create_version: header.create_version,
            create_system: header.create_system,
            extract_version: header.extract_version,
            volume: header.disk_start,
            compress_level: None,
        };
        Ok((entry, total))
    }

    /// Returns true if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }

    /// Returns true if the entry data is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.flags & flags::ENCRYPTED != 0
    }

    /// Returns true if CRC and sizes follow the data in a data descriptor.
    pub fn has_data_descriptor(&self) -> bool {
        self.flags & flags::DATA_DESCRIPTOR != 0
    }

    /// Returns the compression method.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMethod`] for method IDs this crate
    /// does not know.
    pub fn compression(&self) -> Result<CompressionMethod> {
        CompressionMethod::from_id(self.method)
    }

    /// Returns the Unix mode stored in the high bits of the external
    /// attributes, if any.
    pub fn unix_mode(&self) -> Option<u32> {
        match self.external_attr >> 16 {
            0 => None,
            mode => Some(mode),
        }
    }
}

/// Normalizes an archive name derived from a filesystem path.
fn normalize_arcname(name: &str) -> String {
    let without_drive = if cfg!(windows) {
        strip_drive(name)
    } else {
        name
    };
    let mut parts: Vec<&str> = Vec::new();
    for part in without_drive.split(|c: char| c == '/' || (cfg!(windows) && c == '\\')) {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

fn strip_drive(name: &str) -> &str {
    let bytes = name.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        &name[2..]
    } else {
        name
    }
}

#[cfg(unix)]
fn file_mode(meta: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode()
}

#[cfg(not(unix))]
fn file_mode(meta: &std::fs::Metadata) -> u32 {
    let base = if meta.is_dir() { 0o040755 } else { 0o100644 };
    if meta.permissions().readonly() {
        base & !0o222
    } else {
        base
    }
}
