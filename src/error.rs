//! Error types for ZIP archive operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when working with ZIP archives, along with a convenient
//! [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`:
//!
//! ```rust,no_run
//! use zipcore::{Error, ZipArchive};
//!
//! fn read_readme(path: &str) -> zipcore::Result<Vec<u8>> {
//!     let archive = ZipArchive::open_path(path)?;
//!     match archive.read("README") {
//!         Ok(data) => Ok(data),
//!         Err(Error::EntryNotFound { .. }) => Ok(Vec::new()),
//!         Err(e @ Error::CrcMismatch { .. }) => {
//!             eprintln!("archive is damaged: {}", e);
//!             Err(e)
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! ```
//!
//! # Errors inside `std::io` traits
//!
//! [`EntryReader`](crate::EntryReader) and [`EntryWriter`](crate::EntryWriter)
//! implement `Read` and `Write`, so their failures surface as [`std::io::Error`].
//! The crate error is preserved as the inner error and can be recovered with
//! [`Error::from_io`].

use std::io;

use crate::archive::Mode;

/// Helper struct for formatting CrcMismatch error messages.
struct CrcMismatchDisplay<'a> {
    entry_name: &'a str,
    expected: u32,
    actual: u32,
}

impl std::fmt::Display for CrcMismatchDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CRC mismatch for entry '{}': expected {:#010x}, got {:#010x}",
            self.entry_name, self.expected, self.actual
        )
    }
}

/// The main error type for ZIP archive operations.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | I/O | [`Io`][Self::Io] | Storage operations |
/// | Format | [`InvalidFormat`][Self::InvalidFormat], [`CorruptHeader`][Self::CorruptHeader], [`CorruptData`][Self::CorruptData] | Damaged or foreign data |
/// | Compatibility | [`UnsupportedMethod`][Self::UnsupportedMethod], [`UnsupportedFeature`][Self::UnsupportedFeature], [`UnsupportedVersion`][Self::UnsupportedVersion] | Features outside this crate |
/// | Integrity | [`CrcMismatch`][Self::CrcMismatch] | Data corruption |
/// | Encryption | [`WrongPassword`][Self::WrongPassword], [`PasswordRequired`][Self::PasswordRequired] | ZipCrypto entries |
/// | Limits | [`LargeArchive`][Self::LargeArchive] | ZIP64 needed but disallowed |
/// | Usage | [`ConcurrencyViolation`][Self::ConcurrencyViolation], [`InvalidMode`][Self::InvalidMode], [`Closed`][Self::Closed] | API misuse |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred in the underlying storage or the filesystem.
    ///
    /// ```rust
    /// use zipcore::Error;
    /// use std::io::ErrorKind;
    ///
    /// fn handle_io_error(error: &Error) {
    ///     if let Error::Io(e) = error {
    ///         match e.kind() {
    ///             ErrorKind::NotFound => println!("File not found"),
    ///             ErrorKind::PermissionDenied => println!("Access denied"),
    ///             _ => println!("I/O error: {}", e),
    ///         }
    ///     }
    /// }
    /// ```
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The data is not a ZIP archive, or its directory cannot be located.
    #[error("Invalid zip format: {0}")]
    InvalidFormat(String),

    /// A fixed record is truncated, has a bad signature or inconsistent fields.
    ///
    /// The offset is the absolute position of the record in the storage.
    #[error("Corrupt header at offset {offset:#x}: {reason}")]
    CorruptHeader {
        /// The byte offset where corruption was detected.
        offset: u64,
        /// A description of the corruption.
        reason: String,
    },

    /// The compressed payload of an entry cannot be decoded.
    ///
    /// Returned when a decompressor reports corruption or the stream ends
    /// before the recorded uncompressed size was produced.
    #[error("Corrupt data in entry '{entry_name}': {reason}")]
    CorruptData {
        /// The entry being decoded.
        entry_name: String,
        /// A description of the failure.
        reason: String,
    },

    /// The entry uses a compression method not supported by this build.
    ///
    /// Method IDs known to this crate:
    /// - `0`: Stored
    /// - `8`: Deflate (feature `deflate`)
    /// - `12`: BZip2 (feature `bzip2`)
    /// - `14`: LZMA (feature `lzma`)
    #[error("Unsupported compression method: {method_id}")]
    UnsupportedMethod {
        /// The method ID that is not supported.
        method_id: u16,
    },

    /// A feature required by the archive is not supported.
    #[error("Unsupported feature: {feature}")]
    UnsupportedFeature {
        /// The name of the unsupported feature.
        feature: &'static str,
    },

    /// An entry needs a newer "version needed to extract" than supported.
    #[error("Entry '{entry_name}' requires zip version {}.{}", version / 10, version % 10)]
    UnsupportedVersion {
        /// The entry name.
        entry_name: String,
        /// The version needed to extract, as stored (e.g. 63 for 6.3).
        version: u16,
    },

    /// The CRC-32 of the extracted data does not match the recorded value.
    ///
    /// Raised once the last byte of an entry was produced. Other entries of
    /// the archive may still be intact.
    #[error("{}", CrcMismatchDisplay { entry_name, expected: *expected, actual: *actual })]
    CrcMismatch {
        /// The entry name.
        entry_name: String,
        /// The CRC recorded in the archive.
        expected: u32,
        /// The CRC of the data actually produced.
        actual: u32,
    },

    /// The ZipCrypto check byte did not match, so the password is wrong.
    ///
    /// Detected from the 12-byte encryption header before any data is
    /// returned.
    #[error("Wrong password for entry '{entry_name}'")]
    WrongPassword {
        /// The encrypted entry.
        entry_name: String,
    },

    /// The entry is encrypted and no password was supplied.
    #[error("Entry '{entry_name}' is encrypted, password required for extraction")]
    PasswordRequired {
        /// The encrypted entry.
        entry_name: String,
    },

    /// A value needs ZIP64 extensions but ZIP64 is disabled.
    ///
    /// The string names the offending quantity, for example
    /// "Filesize would require ZIP64 extensions".
    #[error("Large archive: {0}")]
    LargeArchive(String),

    /// The single-writer discipline was violated.
    ///
    /// Returned when a second entry writer is requested, or an entry is
    /// read while an entry writer is open.
    #[error("Concurrency violation: {0}")]
    ConcurrencyViolation(&'static str),

    /// No entry with the requested name exists.
    #[error("Entry not found: {path}")]
    EntryNotFound {
        /// The requested name.
        path: String,
    },

    /// The operation is not permitted in the archive's open mode.
    #[error("{operation} requires a different mode, archive was opened with mode '{mode}'")]
    InvalidMode {
        /// The attempted operation.
        operation: &'static str,
        /// The archive mode.
        mode: Mode,
    },

    /// The archive has been closed.
    #[error("Attempt to use a closed zip archive")]
    Closed,

    /// An entry name has no safe extraction path.
    ///
    /// This is a **security error**: after removing absolute prefixes,
    /// drive letters, `.` and `..` components nothing usable remained.
    #[error("Unsafe extraction path: {path}")]
    PathTraversal {
        /// The entry name.
        path: String,
    },

    /// A timestamp cannot be represented as an MS-DOS date/time.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Invalid compression level specified.
    #[error("Invalid compression level {level}: must be 0-9")]
    InvalidCompressionLevel {
        /// The invalid level that was specified.
        level: u32,
    },

    /// An argument does not satisfy the operation's requirements.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Returns `true` if this error means the archive bytes are malformed.
    ///
    /// Covers [`InvalidFormat`](Self::InvalidFormat),
    /// [`CorruptHeader`](Self::CorruptHeader) and
    /// [`CorruptData`](Self::CorruptData).
    pub fn is_bad_format(&self) -> bool {
        matches!(
            self,
            Error::InvalidFormat(_) | Error::CorruptHeader { .. } | Error::CorruptData { .. }
        )
    }

    /// Returns `true` if this is a data corruption error.
    ///
    /// Corruption errors indicate the archive or extracted data is damaged.
    ///
    /// # Example
    ///
    /// ```rust
    /// use zipcore::Error;
    ///
    /// let err = Error::CrcMismatch {
    ///     entry_name: "a.txt".into(),
    ///     expected: 1,
    ///     actual: 2,
    /// };
    /// assert!(err.is_corruption());
    /// ```
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::CrcMismatch { .. } | Error::CorruptHeader { .. } | Error::CorruptData { .. }
        )
    }

    /// Returns `true` if this is an encryption-related error.
    pub fn is_encryption_error(&self) -> bool {
        matches!(
            self,
            Error::WrongPassword { .. } | Error::PasswordRequired { .. }
        )
    }

    /// Returns `true` if this error is related to unsupported features or methods.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedMethod { .. }
                | Error::UnsupportedFeature { .. }
                | Error::UnsupportedVersion { .. }
        )
    }

    /// Returns the entry name associated with this error, if any.
    ///
    /// # Example
    ///
    /// ```rust
    /// use zipcore::Error;
    ///
    /// fn log_error(error: &Error) {
    ///     if let Some(name) = error.entry_name() {
    ///         eprintln!("Error for '{}': {}", name, error);
    ///     }
    /// }
    /// ```
    pub fn entry_name(&self) -> Option<&str> {
        match self {
            Error::CorruptData { entry_name, .. }
            | Error::UnsupportedVersion { entry_name, .. }
            | Error::CrcMismatch { entry_name, .. }
            | Error::WrongPassword { entry_name }
            | Error::PasswordRequired { entry_name } => Some(entry_name),
            Error::EntryNotFound { path } | Error::PathTraversal { path } => Some(path),
            _ => None,
        }
    }

    /// Creates a corrupt header error.
    pub fn corrupt_header(offset: u64, reason: impl Into<String>) -> Self {
        Error::CorruptHeader {
            offset,
            reason: reason.into(),
        }
    }

    /// Creates a corrupt data error for the named entry.
    pub fn corrupt_data(entry_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::CorruptData {
            entry_name: entry_name.into(),
            reason: reason.into(),
        }
    }

    /// Recovers a crate error from an [`io::Error`] returned by an entry stream.
    ///
    /// Errors that did not originate in this crate are returned as
    /// [`Error::Io`].
    ///
    /// ```rust
    /// use zipcore::Error;
    ///
    /// let io_err = std::io::Error::other(Error::Closed);
    /// assert!(matches!(Error::from_io(io_err), Error::Closed));
    /// ```
    pub fn from_io(e: io::Error) -> Self {
        if !e.get_ref().is_some_and(|inner| inner.is::<Error>()) {
            return Error::Io(e);
        }
        match e.into_inner().map(|inner| inner.downcast::<Error>()) {
            Some(Ok(err)) => *err,
            Some(Err(inner)) => Error::Io(io::Error::other(inner)),
            None => Error::InvalidFormat("lost error context".into()),
        }
    }

    /// Wraps this error for transport through `std::io` traits.
    pub(crate) fn into_io(self) -> io::Error {
        match self {
            Error::Io(e) if e.get_ref().is_some_and(|inner| inner.is::<Error>()) => e,
            other => io::Error::other(other),
        }
    }
}

/// A specialized Result type for ZIP archive operations.
pub type Result<T> = std::result::Result<T, Error>;
