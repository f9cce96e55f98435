//! Byte storage behind an archive.
//!
//! An archive is generic over a [`Storage`], which describes what the
//! underlying stream can do. Adapters cover the four ways an archive is
//! opened:
//!
//! | Adapter | Wraps | Mode |
//! |---------|-------|------|
//! | [`Source`] | `Read + Seek` | read |
//! | [`Sink`] | `Write + Seek` | write, exclusive |
//! | [`Stream`] | `Write` only | write (entries get data descriptors) |
//! | [`Duplex`] | `Read + Write + Seek + Truncate` | append |
//!
//! Operations a stream cannot perform fail with
//! [`io::ErrorKind::Unsupported`].

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

/// Byte sources that can back a readable archive.
pub trait ByteSource: Read + Seek {}

impl<T: Read + Seek> ByteSource for T {}

/// Byte sinks that can receive an archive.
pub trait ByteSink: Write {}

impl<T: Write> ByteSink for T {}

/// Streams that can be cut at a given length.
///
/// Append mode truncates the stream after the rewritten central directory
/// so stale bytes from the previous directory do not linger.
pub trait Truncate {
    /// Sets the stream length to `len`.
    fn truncate_at(&mut self, len: u64) -> io::Result<()>;
}

impl Truncate for File {
    fn truncate_at(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

impl Truncate for Cursor<Vec<u8>> {
    fn truncate_at(&mut self, len: u64) -> io::Result<()> {
        self.get_mut().truncate(len as usize);
        Ok(())
    }
}

impl Truncate for Cursor<&mut Vec<u8>> {
    fn truncate_at(&mut self, len: u64) -> io::Result<()> {
        self.get_mut().truncate(len as usize);
        Ok(())
    }
}

impl<T: Truncate + ?Sized> Truncate for &mut T {
    fn truncate_at(&mut self, len: u64) -> io::Result<()> {
        (**self).truncate_at(len)
    }
}

fn unsupported(what: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("underlying stream does not support {what}"),
    )
}

/// The capabilities an archive needs from its underlying stream.
pub trait Storage {
    /// The wrapped stream, returned when the archive is finished.
    type Inner;

    /// Whether entries can be read back.
    const READABLE: bool;

    /// Whether the stream supports seeking.
    const SEEKABLE: bool;

    /// Reads at the current position.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Writes all of `buf` at the current position.
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Moves the current position.
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64>;

    /// Returns the current position.
    fn position(&mut self) -> io::Result<u64>;

    /// Flushes buffered writes.
    fn flush(&mut self) -> io::Result<()>;

    /// Cuts the stream at the current position.
    fn truncate(&mut self) -> io::Result<()>;

    /// Unwraps the stream.
    fn into_inner(self) -> Self::Inner;
}

/// A read-only seekable source.
#[derive(Debug)]
pub struct Source<R>(R);

impl<R: ByteSource> Source<R> {
    /// Wraps a reader.
    pub fn new(inner: R) -> Self {
        Self(inner)
    }
}

impl<R: ByteSource> Storage for Source<R> {
    type Inner = R;
    const READABLE: bool = true;
    const SEEKABLE: bool = true;

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }

    fn write_all(&mut self, _buf: &[u8]) -> io::Result<()> {
        Err(unsupported("writing"))
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.0.seek(pos)
    }

    fn position(&mut self) -> io::Result<u64> {
        self.0.stream_position()
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn truncate(&mut self) -> io::Result<()> {
        Err(unsupported("truncation"))
    }

    fn into_inner(self) -> R {
        self.0
    }
}

/// A write-only seekable sink.
#[derive(Debug)]
pub struct Sink<W>(W);

impl<W: Write + Seek> Sink<W> {
    /// Wraps a writer.
    pub fn new(inner: W) -> Self {
        Self(inner)
    }
}

impl<W: Write + Seek> Storage for Sink<W> {
    type Inner = W;
    const READABLE: bool = false;
    const SEEKABLE: bool = true;

    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(unsupported("reading"))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.0.write_all(buf)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.0.seek(pos)
    }

    fn position(&mut self) -> io::Result<u64> {
        self.0.stream_position()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }

    fn truncate(&mut self) -> io::Result<()> {
        Err(unsupported("truncation"))
    }

    fn into_inner(self) -> W {
        self.0
    }
}

/// A forward-only sink such as a pipe or socket.
///
/// The position is counted from zero as bytes are written.
#[derive(Debug)]
pub struct Stream<W> {
    inner: W,
    position: u64,
}

impl<W: ByteSink> Stream<W> {
    /// Wraps a writer.
    pub fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }
}

impl<W: ByteSink> Storage for Stream<W> {
    type Inner = W;
    const READABLE: bool = false;
    const SEEKABLE: bool = false;

    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(unsupported("reading"))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.write_all(buf)?;
        self.position += buf.len() as u64;
        Ok(())
    }

    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(unsupported("seeking"))
    }

    fn position(&mut self) -> io::Result<u64> {
        Ok(self.position)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    fn truncate(&mut self) -> io::Result<()> {
        Err(unsupported("truncation"))
    }

    fn into_inner(self) -> W {
        self.inner
    }
}

/// A read/write stream used for appending to an existing archive.
#[derive(Debug)]
pub struct Duplex<F>(F);

impl<F: Read + Write + Seek + Truncate> Duplex<F> {
    /// Wraps a read/write stream.
    pub fn new(inner: F) -> Self {
        Self(inner)
    }
}

impl<F: Read + Write + Seek + Truncate> Storage for Duplex<F> {
    type Inner = F;
    const READABLE: bool = true;
    const SEEKABLE: bool = true;

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.0.write_all(buf)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.0.seek(pos)
    }

    fn position(&mut self) -> io::Result<u64> {
        self.0.stream_position()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }

    fn truncate(&mut self) -> io::Result<()> {
        let len = self.0.stream_position()?;
        self.0.truncate_at(len)
    }

    fn into_inner(self) -> F {
        self.0
    }
}

/// Borrows a storage as a plain `Read + Seek` stream.
pub(crate) struct StorageReader<'a, S>(pub(crate) &'a mut S);

impl<S: Storage> Read for StorageReader<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<S: Storage> Seek for StorageReader<'_, S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.0.seek(pos)
    }
}
