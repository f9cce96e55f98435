//! The storage handle shared by an archive and its entry streams.
//!
//! All positioned I/O goes through one mutex so readers on different
//! threads never observe each other's seeks. The handle also records
//! whether an entry writer is open; reads are refused while it is.

use std::io::{self, Read, SeekFrom};
use std::sync::{Mutex, MutexGuard, Weak};

use crate::storage::Storage;
use crate::{Error, Result};

/// Acquires a mutex lock, recovering from poisoned state if necessary.
///
/// Every critical section leaves the protected value consistent between
/// statements, so a panic elsewhere does not invalidate it.
pub(crate) fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        log::warn!("archive handle mutex was poisoned, recovering");
        poisoned.into_inner()
    })
}

struct HandleState<S> {
    storage: Option<S>,
    writing: bool,
}

impl<S> HandleState<S> {
    fn storage(&mut self) -> Result<&mut S> {
        self.storage.as_mut().ok_or(Error::Closed)
    }
}

/// Storage plus the single-writer flag, behind a mutex.
pub(crate) struct SharedHandle<S> {
    state: Mutex<HandleState<S>>,
}

impl<S> std::fmt::Debug for SharedHandle<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedHandle")
            .field("writing", &lock_or_recover(&self.state).writing)
            .finish_non_exhaustive()
    }
}

impl<S: Storage> SharedHandle<S> {
    pub(crate) fn new(storage: S) -> Self {
        Self {
            state: Mutex::new(HandleState {
                storage: Some(storage),
                writing: false,
            }),
        }
    }

    /// Reads at an absolute offset.
    pub(crate) fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let mut state = lock_or_recover(&self.state);
        if state.writing {
            return Err(Error::ConcurrencyViolation(
                "can't read from the archive while an entry writer is open",
            ));
        }
        let storage = state.storage()?;
        storage.seek(SeekFrom::Start(offset))?;
        Ok(storage.read(buf)?)
    }

    /// Fills `buf` from an absolute offset.
    pub(crate) fn read_exact_at(&self, mut offset: u64, mut buf: &mut [u8]) -> Result<()> {
        while !buf.is_empty() {
            let n = self.read_at(offset, buf)?;
            if n == 0 {
                return Err(Error::Io(io::ErrorKind::UnexpectedEof.into()));
            }
            offset += n as u64;
            buf = &mut buf[n..];
        }
        Ok(())
    }

    /// Runs `f` with exclusive access to the storage.
    pub(crate) fn with_storage<T>(&self, f: impl FnOnce(&mut S) -> Result<T>) -> Result<T> {
        let mut state = lock_or_recover(&self.state);
        f(state.storage()?)
    }

    pub(crate) fn set_writing(&self, writing: bool) {
        lock_or_recover(&self.state).writing = writing;
    }

    pub(crate) fn is_writing(&self) -> bool {
        lock_or_recover(&self.state).writing
    }

    /// Takes the storage out; every later access fails with [`Error::Closed`].
    pub(crate) fn take_storage(&self) -> Result<S> {
        lock_or_recover(&self.state).storage.take().ok_or(Error::Closed)
    }
}

/// A bounded window onto the shared storage.
///
/// Holds a weak reference; reading after the archive has been closed
/// fails with [`Error::Closed`].
pub(crate) struct HandleView<S> {
    handle: Weak<SharedHandle<S>>,
    offset: u64,
    remaining: u64,
}

impl<S: Storage> HandleView<S> {
    pub(crate) fn new(handle: Weak<SharedHandle<S>>, offset: u64, len: u64) -> Self {
        Self {
            handle,
            offset,
            remaining: len,
        }
    }
}

impl<S: Storage> Read for HandleView<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let handle = self.handle.upgrade().ok_or_else(|| Error::Closed.into_io())?;
        let len = self.remaining.min(buf.len() as u64) as usize;
        let n = handle
            .read_at(self.offset, &mut buf[..len])
            .map_err(Error::into_io)?;
        self.offset += n as u64;
        self.remaining -= n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Source;
    use std::io::Cursor;
    use std::sync::Arc;

    fn handle(data: &[u8]) -> Arc<SharedHandle<Source<Cursor<Vec<u8>>>>> {
        Arc::new(SharedHandle::new(Source::new(Cursor::new(data.to_vec()))))
    }

    #[test]
    fn test_read_exact_at() {
        let h = handle(b"0123456789");
        let mut buf = [0u8; 3];
        h.read_exact_at(4, &mut buf).unwrap();
        assert_eq!(&buf, b"456");
        let mut past_end = [0u8; 4];
        assert!(h.read_exact_at(8, &mut past_end).is_err());
    }

    #[test]
    fn test_reads_refused_while_writing() {
        let h = handle(b"abc");
        h.set_writing(true);
        assert!(h.is_writing());
        let mut buf = [0u8; 1];
        assert!(matches!(
            h.read_at(0, &mut buf),
            Err(Error::ConcurrencyViolation(_))
        ));
        h.set_writing(false);
        assert_eq!(h.read_at(0, &mut buf).unwrap(), 1);
    }

    #[test]
    fn test_view_is_bounded() {
        let h = handle(b"0123456789");
        let mut view = HandleView::new(Arc::downgrade(&h), 2, 5);
        let mut out = Vec::new();
        view.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"23456");
    }

    #[test]
    fn test_take_storage_closes_handle() {
        let h = handle(b"abc");
        let mut view = HandleView::new(Arc::downgrade(&h), 0, 3);
        assert!(h.take_storage().is_ok());
        assert!(matches!(h.take_storage(), Err(Error::Closed)));
        let err = view.read(&mut [0u8; 2]).unwrap_err();
        assert!(matches!(Error::from_io(err), Error::Closed));
    }

    #[test]
    fn test_view_after_close() {
        let h = handle(b"0123456789");
        let mut view = HandleView::new(Arc::downgrade(&h), 0, 5);
        drop(h);
        let err = view.read(&mut [0u8; 4]).unwrap_err();
        assert!(matches!(Error::from_io(err), Error::Closed));
    }
}
