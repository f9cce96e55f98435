//! Lookup and listing.

use std::io::{self, Write};

use super::{Mode, ZipArchive};
use crate::format::ZIP_MAX_COMMENT;
use crate::format::records::{DataDescriptor, LocalFileHeader};
use crate::read::Entry;
use crate::storage::Storage;
use crate::{Error, Result};

impl<S: Storage> ZipArchive<S> {
    /// Entry names in archive order, duplicates included.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// All entries in archive order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Looks up an entry by name. With duplicates, the last one wins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] if no entry has this name.
    pub fn entry(&self, name: &str) -> Result<&Entry> {
        self.name_index
            .get(name)
            .and_then(|&i| self.entries.get(i))
            .ok_or_else(|| Error::EntryNotFound {
                path: name.to_string(),
            })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The archive comment.
    pub fn comment(&self) -> &[u8] {
        &self.comment
    }

    /// Replaces the archive comment.
    ///
    /// Comments longer than 65535 bytes are truncated with a warning. The
    /// comment is written on close in write, exclusive and append modes.
    pub fn set_comment(&mut self, comment: impl Into<Vec<u8>>) {
        let mut comment = comment.into();
        if comment.len() > ZIP_MAX_COMMENT {
            log::warn!(
                "Archive comment is too long; truncating to {} bytes",
                ZIP_MAX_COMMENT
            );
            comment.truncate(ZIP_MAX_COMMENT);
        }
        self.comment = comment;
        self.modified = true;
    }

    /// The mode the archive was opened with.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns true once the archive has been closed.
    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    /// Prints a table of contents.
    ///
    /// ```text
    /// File Name                                             Modified             Size
    /// a.txt                                          2024-05-01 12:30:00            5
    /// ```
    pub fn print_dir<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{:<46} {:>19} {:>12}", "File Name", "Modified    ", "Size")?;
        for entry in &self.entries {
            let t = &entry.modified;
            writeln!(
                out,
                "{:<46} {}-{:02}-{:02} {:02}:{:02}:{:02} {:>12}",
                entry.name,
                t.year(),
                t.month(),
                t.day(),
                t.hour(),
                t.minute(),
                t.second(),
                entry.uncompressed_size
            )?;
        }
        Ok(())
    }

    /// Reads the data descriptor that follows an entry with flag bit 3.
    ///
    /// Returns `None` for entries without one. The descriptor width follows
    /// the entry's local header: 8-byte sizes when it uses ZIP64.
    pub fn data_descriptor(&self, name: &str) -> Result<Option<DataDescriptor>> {
        let entry = self.entry(name)?;
        if !entry.has_data_descriptor() {
            return Ok(None);
        }
        let handle = self.handle()?;
        self.require_mode("data_descriptor", S::READABLE)?;

        let offset = entry.header_offset;
        let mut fixed = [0u8; LocalFileHeader::SIZE];
        handle.read_exact_at(offset, &mut fixed)?;
        let header = LocalFileHeader::parse(&fixed, offset)?;
        let mut extra = vec![0u8; header.extra_len as usize];
        let extra_offset = offset + LocalFileHeader::SIZE as u64 + header.name_len as u64;
        handle.read_exact_at(extra_offset, &mut extra)?;
        let zip64 = Entry::local_header_is_zip64(&extra, &header);

        let at = offset + header.total_len() + entry.compressed_size;
        let mut buf = vec![0u8; DataDescriptor::encoded_len(zip64)];
        let mut filled = 0;
        while filled < buf.len() {
            let n = handle.read_at(at + filled as u64, &mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        DataDescriptor::parse(&buf[..filled], at, zip64).map(Some)
    }
}
