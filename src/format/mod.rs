//! ZIP format constants, record layouts, and low-level parsing utilities.
//!
//! This module contains the signatures, version numbers, flag bits and size
//! limits defined by the PKWARE APPNOTE, together with the codecs for the
//! fixed records ([`records`]), the extra-field chain ([`extra`]), entry
//! name encodings ([`names`]) and the central directory locator
//! ([`locate`]).

pub mod detect;
pub mod extra;
pub mod locate;
pub mod names;
pub mod reader;
pub mod records;

/// Values that do not fit a 32-bit field need ZIP64 extensions.
///
/// `0xFFFFFFFF` itself is the ZIP64 sentinel, so it cannot be stored
/// directly either.
pub const ZIP64_LIMIT: u64 = 0xFFFF_FFFF;

/// Entry counts at or above this value need a ZIP64 end record.
pub const ZIP_FILECOUNT_LIMIT: u64 = 0xFFFF;

/// Maximum length of the archive comment.
pub const ZIP_MAX_COMMENT: usize = 0xFFFF;

/// The 32-bit sentinel that defers a value to the ZIP64 extra record.
pub const SENTINEL_32: u32 = 0xFFFF_FFFF;

/// The 16-bit sentinel used for entry counts.
pub const SENTINEL_16: u16 = 0xFFFF;

/// Returns `true` if `value` cannot be stored in a 32-bit header field.
#[inline]
pub fn needs_zip64(value: u64) -> bool {
    value >= ZIP64_LIMIT
}

/// "Version needed to extract" values.
pub mod version {
    /// Baseline: deflate, directories, ZipCrypto.
    pub const DEFAULT: u16 = 20;
    /// ZIP64 format extensions.
    pub const ZIP64: u16 = 45;
    /// BZip2 compression.
    pub const BZIP2: u16 = 46;
    /// LZMA compression.
    pub const LZMA: u16 = 63;
    /// Newest version this crate can extract.
    pub const MAX_EXTRACT: u16 = 63;
}

/// General purpose flag bits.
pub mod flags {
    /// Entry data is encrypted.
    pub const ENCRYPTED: u16 = 0x0001;
    /// LZMA: the stream is terminated by an end-of-stream marker.
    pub const COMPRESS_OPTION_1: u16 = 0x0002;
    /// CRC and sizes follow the data in a data descriptor.
    pub const DATA_DESCRIPTOR: u16 = 0x0008;
    /// Compressed patched data.
    pub const PATCHED_DATA: u16 = 0x0020;
    /// Strong encryption.
    pub const STRONG_ENCRYPTION: u16 = 0x0040;
    /// Entry name and comment are UTF-8.
    pub const UTF8: u16 = 0x0800;
}

/// Host systems recorded in "version made by".
pub mod host {
    /// MS-DOS and compatible (FAT).
    pub const DOS: u8 = 0;
    /// Unix.
    pub const UNIX: u8 = 3;

    /// The host system of the running platform.
    pub const fn current() -> u8 {
        if cfg!(windows) { DOS } else { UNIX }
    }
}

/// MS-DOS directory attribute bit of `external_attr`.
pub const DOS_DIRECTORY_ATTR: u32 = 0x10;
