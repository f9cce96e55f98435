//! Cheap ZIP detection.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use super::locate::find_end_record;
use super::records::CentralDirectoryHeader;

/// Returns true if `reader` holds a ZIP archive.
///
/// Looks for an end of central directory record and, unless the archive
/// is empty, checks that a central directory record starts where it
/// points. The stream position is restored. I/O errors count as "no".
///
/// # Example
///
/// ```rust
/// use std::io::Cursor;
/// use zipcore::is_zip_archive;
///
/// assert!(!is_zip_archive(&mut Cursor::new(b"plain text".to_vec())));
/// ```
pub fn is_zip_archive<R: Read + Seek>(reader: &mut R) -> bool {
    let Ok(start_pos) = reader.stream_position() else {
        return false;
    };
    let found = check(reader);
    let restored = reader.seek(SeekFrom::Start(start_pos)).is_ok();
    found && restored
}

fn check<R: Read + Seek>(reader: &mut R) -> bool {
    let Ok(end) = find_end_record(reader) else {
        return false;
    };
    if end.entries_total == 0 && end.directory_size == 0 {
        return true;
    }
    let Ok(start_dir) = end.start_dir() else {
        return false;
    };
    let mut magic = [0u8; 4];
    reader.seek(SeekFrom::Start(start_dir)).is_ok()
        && reader.read_exact(&mut magic).is_ok()
        && u32::from_le_bytes(magic) == CentralDirectoryHeader::SIGNATURE
}

/// Returns true if the file at `path` holds a ZIP archive.
pub fn is_zip_path(path: impl AsRef<Path>) -> bool {
    match File::open(path.as_ref()) {
        Ok(file) => is_zip_archive(&mut BufReader::new(file)),
        Err(_) => false,
    }
}
