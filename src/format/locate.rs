//! Locating the central directory from the end of the storage.

use std::io::{Read, Seek, SeekFrom};

use super::records::{EndOfCentralDirectory, Zip64EndOfCentralDirectory, Zip64Locator};
use crate::{Error, Result};

/// Longest comment an end record can carry.
const MAX_COMMENT: u64 = 0xFFFF;

/// The end-of-archive information needed to read the central directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndRecord {
    /// Absolute offset of the (32-bit) end of central directory record.
    pub eocd_offset: u64,
    /// Total number of entries.
    pub entries_total: u64,
    /// Size of the central directory in bytes.
    pub directory_size: u64,
    /// Central directory offset as recorded, relative to the archive start.
    pub directory_offset: u64,
    /// Archive comment.
    pub comment: Vec<u8>,
    /// Whether the values came from a ZIP64 end record.
    pub zip64: bool,
}

impl EndRecord {
    /// Number of bytes prepended to the archive (for example a
    /// self-extractor stub). May be negative for inconsistent archives.
    pub fn concat(&self) -> i64 {
        let mut concat = self.eocd_offset as i128
            - self.directory_size as i128
            - self.directory_offset as i128;
        if self.zip64 {
            concat -= (Zip64EndOfCentralDirectory::SIZE + Zip64Locator::SIZE) as i128;
        }
        concat.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }

    /// Absolute offset of the first central directory record.
    pub fn start_dir(&self) -> Result<u64> {
        let start = self.directory_offset as i128 + self.concat() as i128;
        u64::try_from(start)
            .map_err(|_| Error::InvalidFormat("bad offset for central directory".into()))
    }
}

fn read_at<R: Read + Seek>(reader: &mut R, offset: u64, len: usize) -> Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(offset))?;
    let mut buf = Vec::with_capacity(len);
    reader.by_ref().take(len as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Finds and decodes the end of central directory record.
///
/// The common case of an archive without a comment is checked first; then
/// the last 64 KiB plus one record are searched backwards for the
/// signature. Fails with [`Error::InvalidFormat`] when no record exists.
pub fn find_end_record<R: Read + Seek>(reader: &mut R) -> Result<EndRecord> {
    let file_len = reader.seek(SeekFrom::End(0))?;
    let eocd_size = EndOfCentralDirectory::SIZE as u64;
    if file_len < eocd_size {
        return Err(Error::InvalidFormat("file is not a zip file".into()));
    }

    let tail_offset = file_len - eocd_size;
    let tail = read_at(reader, tail_offset, EndOfCentralDirectory::SIZE)?;
    if tail.len() == EndOfCentralDirectory::SIZE && tail[20..22] == [0, 0] {
        if let Ok(eocd) = EndOfCentralDirectory::parse(&tail, tail_offset) {
            return with_zip64(reader, eocd, tail_offset, Vec::new());
        }
    }

    let search_start = file_len.saturating_sub(MAX_COMMENT + 1 + eocd_size);
    let window = read_at(reader, search_start, (file_len - search_start) as usize)?;
    let signature = EndOfCentralDirectory::SIGNATURE.to_le_bytes();
    let Some(pos) = window.windows(4).rposition(|w| w == signature) else {
        return Err(Error::InvalidFormat("file is not a zip file".into()));
    };
    let record = &window[pos..];
    if record.len() < EndOfCentralDirectory::SIZE {
        return Err(Error::InvalidFormat("file is not a zip file".into()));
    }
    let eocd_offset = search_start + pos as u64;
    let eocd = EndOfCentralDirectory::parse(record, eocd_offset)?;
    let comment_start = EndOfCentralDirectory::SIZE;
    let comment_end = (comment_start + eocd.comment_len as usize).min(record.len());
    let comment = record[comment_start..comment_end].to_vec();
    with_zip64(reader, eocd, eocd_offset, comment)
}

/// Upgrades the 32-bit end record with a ZIP64 end record when a locator
/// precedes it. Without a locator the 32-bit values are used as-is.
fn with_zip64<R: Read + Seek>(
    reader: &mut R,
    eocd: EndOfCentralDirectory,
    eocd_offset: u64,
    comment: Vec<u8>,
) -> Result<EndRecord> {
    let mut end = EndRecord {
        eocd_offset,
        entries_total: eocd.entries_total as u64,
        directory_size: eocd.directory_size as u64,
        directory_offset: eocd.directory_offset as u64,
        comment,
        zip64: false,
    };

    let Some(locator_offset) = eocd_offset.checked_sub(Zip64Locator::SIZE as u64) else {
        return Ok(end);
    };
    let data = read_at(reader, locator_offset, Zip64Locator::SIZE)?;
    let Ok(locator) = Zip64Locator::parse(&data, locator_offset) else {
        return Ok(end);
    };
    if locator.disk_number != 0 || locator.total_disks > 1 {
        return Err(Error::UnsupportedFeature {
            feature: "zip files that span multiple disks",
        });
    }

    let Some(record_offset) =
        locator_offset.checked_sub(Zip64EndOfCentralDirectory::SIZE as u64)
    else {
        return Ok(end);
    };
    let data = read_at(reader, record_offset, Zip64EndOfCentralDirectory::SIZE)?;
    let Ok(record) = Zip64EndOfCentralDirectory::parse(&data, record_offset) else {
        return Ok(end);
    };
    log::debug!("using zip64 end record at {record_offset:#x}");
    end.entries_total = record.entries_total;
    end.directory_size = record.directory_size;
    end.directory_offset = record.directory_offset;
    end.zip64 = true;
    Ok(end)
}

/// Reads the raw central directory described by `end`.
///
/// Returns the bytes and the absolute offset they start at.
pub fn read_directory<R: Read + Seek>(reader: &mut R, end: &EndRecord) -> Result<(Vec<u8>, u64)> {
    let start_dir = end.start_dir()?;
    let size = usize::try_from(end.directory_size)
        .map_err(|_| Error::InvalidFormat("central directory too large".into()))?;
    let data = read_at(reader, start_dir, size)?;
    if data.len() != size {
        return Err(Error::corrupt_header(start_dir, "truncated central directory"));
    }
    Ok((data, start_dir))
}
