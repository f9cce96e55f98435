//! Archive constructors.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::{Mode, ZipArchive};
use crate::format::locate::{find_end_record, read_directory};
use crate::read::Entry;
use crate::storage::{Duplex, Sink, Source, Storage, StorageReader, Stream, Truncate};
use crate::Result;

/// The parsed central directory.
struct Directory {
    entries: Vec<Entry>,
    comment: Vec<u8>,
    start_dir: u64,
}

/// Locates and parses the central directory.
fn scan<S: Storage>(storage: &mut S) -> Result<Directory> {
    let mut reader = StorageReader(storage);
    let end = find_end_record(&mut reader)?;
    let (data, start_dir) = read_directory(&mut reader, &end)?;
    let concat = end.concat();

    let mut entries = Vec::with_capacity(end.entries_total.min(1 << 16) as usize);
    let mut pos = 0;
    while pos < data.len() {
        let (entry, used) = Entry::parse_central(&data[pos..], start_dir + pos as u64, concat)?;
        entries.push(entry);
        pos += used;
    }

    log::debug!(
        "central directory at {start_dir:#x}: {} entries, zip64: {}, prefix: {concat} bytes",
        entries.len(),
        end.zip64
    );
    Ok(Directory {
        entries,
        comment: end.comment,
        start_dir,
    })
}

impl<R: Read + Seek> ZipArchive<Source<R>> {
    /// Opens an archive for reading.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`](crate::Error::InvalidFormat) if no
    /// end of central directory record is found,
    /// [`Error::CorruptHeader`](crate::Error::CorruptHeader) for damaged
    /// directory records and
    /// [`Error::UnsupportedFeature`](crate::Error::UnsupportedFeature) for
    /// multi-disk archives.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use std::fs::File;
    /// use zipcore::ZipArchive;
    ///
    /// let archive = ZipArchive::open(File::open("archive.zip")?)?;
    /// for name in archive.names() {
    ///     println!("{name}");
    /// }
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(reader: R) -> Result<Self> {
        let mut storage = Source::new(reader);
        let dir = scan(&mut storage)?;
        Ok(Self::from_parts(
            storage,
            Mode::Read,
            dir.entries,
            dir.comment,
            dir.start_dir,
            false,
        ))
    }
}

impl ZipArchive<Source<BufReader<File>>> {
    /// Opens the archive at `path` for reading.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::open(BufReader::new(file))
    }
}

impl<W: Write + Seek> ZipArchive<Sink<W>> {
    /// Creates an archive that writes to `writer`.
    ///
    /// The archive starts at the writer's current position.
    pub fn create(writer: W) -> Result<Self> {
        Self::create_with_mode(writer, Mode::Write)
    }

    fn create_with_mode(writer: W, mode: Mode) -> Result<Self> {
        let mut storage = Sink::new(writer);
        let start_dir = storage.position()?;
        Ok(Self::from_parts(
            storage,
            mode,
            Vec::new(),
            Vec::new(),
            start_dir,
            true,
        ))
    }
}

impl ZipArchive<Sink<BufWriter<File>>> {
    /// Creates (or truncates) the file at `path` and writes an archive to it.
    pub fn create_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        Self::create(BufWriter::new(file))
    }

    /// Creates a new archive file; fails if `path` already exists.
    pub fn create_new_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create_new(path.as_ref())?;
        Self::create_with_mode(BufWriter::new(file), Mode::Exclusive)
    }
}

impl<W: Write> ZipArchive<Stream<W>> {
    /// Creates an archive on a sink that cannot seek, such as a pipe.
    ///
    /// Every entry carries a data descriptor since its header cannot be
    /// rewritten.
    pub fn create_streaming(writer: W) -> Self {
        Self::from_parts(
            Stream::new(writer),
            Mode::Write,
            Vec::new(),
            Vec::new(),
            0,
            true,
        )
    }
}

impl<F: Read + Write + Seek + Truncate> ZipArchive<Duplex<F>> {
    /// Opens `file` for appending entries.
    ///
    /// New entries are written over the old central directory, which is
    /// rewritten on close. If `file` holds no archive, the new archive is
    /// appended after its contents (a warning is logged when it is not
    /// empty); this is how self-extracting archives are built.
    ///
    /// # Errors
    ///
    /// Errors other than a malformed archive, such as I/O failures or
    /// unsupported features, are returned.
    pub fn append(file: F) -> Result<Self> {
        let mut storage = Duplex::new(file);
        match scan(&mut storage) {
            Ok(dir) => {
                storage.seek(SeekFrom::Start(dir.start_dir))?;
                Ok(Self::from_parts(
                    storage,
                    Mode::Append,
                    dir.entries,
                    dir.comment,
                    dir.start_dir,
                    false,
                ))
            }
            Err(e) if e.is_bad_format() => {
                let end = storage.seek(SeekFrom::End(0))?;
                if end > 0 {
                    log::warn!(
                        "appending to a file that is not a zip archive ({e}); \
                         keeping its {end} bytes as a prefix"
                    );
                }
                Ok(Self::from_parts(
                    storage,
                    Mode::Append,
                    Vec::new(),
                    Vec::new(),
                    end,
                    true,
                ))
            }
            Err(e) => Err(e),
        }
    }
}

impl ZipArchive<Duplex<File>> {
    /// Opens the file at `path` for appending, creating it if missing.
    pub fn append_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;
        Self::append(file)
    }
}
