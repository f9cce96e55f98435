//! Opening entry streams.

use std::io::{self, Read};
use std::sync::Arc;

use super::ZipArchive;
use crate::crypto::Password;
use crate::handle::SharedHandle;
use crate::read::{Entry, EntryReader};
use crate::storage::Storage;
use crate::{Error, Result};

impl<S: Storage> ZipArchive<S> {
    fn readable(&self, operation: &'static str) -> Result<&Arc<SharedHandle<S>>> {
        let handle = self.handle()?;
        self.require_mode(operation, S::READABLE)?;
        Ok(handle)
    }

    /// Opens the named entry for reading.
    ///
    /// Uses the password set with [`set_password`](Self::set_password) for
    /// encrypted entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] for unknown names, plus the errors
    /// of [`by_entry_with_password`](Self::by_entry_with_password).
    pub fn by_name(&self, name: &str) -> Result<EntryReader<S>> {
        self.by_name_with_password(name, None)
    }

    /// Opens the named entry with an explicit password.
    pub fn by_name_with_password(
        &self,
        name: &str,
        password: Option<&[u8]>,
    ) -> Result<EntryReader<S>> {
        let entry = self.entry(name)?;
        self.by_entry_with_password(entry, password)
    }

    /// Opens an entry for reading.
    pub fn by_entry(&self, entry: &Entry) -> Result<EntryReader<S>> {
        self.by_entry_with_password(entry, None)
    }

    /// Opens an entry with an explicit password, falling back to the
    /// archive password when `password` is `None`.
    ///
    /// # Errors
    ///
    /// - [`Error::Closed`] after [`close`](Self::close).
    /// - [`Error::InvalidMode`] if the storage cannot be read.
    /// - [`Error::ConcurrencyViolation`] while an entry writer is open.
    /// - [`Error::CorruptHeader`] for a bad local header or a name that
    ///   differs from the central directory.
    /// - [`Error::PasswordRequired`] / [`Error::WrongPassword`] for
    ///   encrypted entries.
    /// - [`Error::UnsupportedMethod`] / [`Error::UnsupportedFeature`].
    pub fn by_entry_with_password(
        &self,
        entry: &Entry,
        password: Option<&[u8]>,
    ) -> Result<EntryReader<S>> {
        let handle = self.readable("read")?;
        let password = match password {
            Some(bytes) => Some(Password::new(bytes)),
            None => self.password.clone(),
        };
        EntryReader::open(handle, entry, password)
    }

    /// Reads the whole named entry into memory.
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let mut reader = self.by_name(name)?;
        let capacity = reader.entry().uncompressed_size.min(1 << 20) as usize;
        let mut data = Vec::with_capacity(capacity);
        reader.read_to_end(&mut data).map_err(Error::from_io)?;
        Ok(data)
    }

    /// Decodes every entry and checks its CRC.
    ///
    /// Returns the name of the first entry whose headers or data are
    /// corrupt, or `None` if all entries are intact.
    ///
    /// # Errors
    ///
    /// Errors that are not about corrupt content, such as a missing
    /// password or an unsupported method, are returned.
    pub fn test(&self) -> Result<Option<String>> {
        for entry in &self.entries {
            let result = self.by_entry(entry).and_then(|mut reader| {
                io::copy(&mut reader, &mut io::sink()).map_err(Error::from_io)
            });
            match result {
                Ok(_) => {}
                Err(e) if e.is_bad_format() || e.is_corruption() => {
                    log::debug!("entry '{}' failed verification: {e}", entry.name);
                    return Ok(Some(entry.name.clone()));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}
