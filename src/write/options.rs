//! Archive-wide write configuration.

use crate::codec::CompressionMethod;

/// Options applied to an archive opened for writing or appending.
///
/// # Example
///
/// ```rust
/// use zipcore::{ArchiveOptions, CompressionMethod};
///
/// let opts = ArchiveOptions::new()
///     .compression(CompressionMethod::Deflated)
///     .level(9)?
///     .allow_zip64(false);
/// assert_eq!(opts.level, Some(9));
/// # Ok::<(), zipcore::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ArchiveOptions {
    /// Default compression for entries added by name.
    pub compression: CompressionMethod,
    /// Default compression level, `None` for the codec default.
    pub level: Option<u32>,
    /// Whether ZIP64 extensions may be written.
    pub allow_zip64: bool,
    /// Whether out-of-range file times are rejected instead of clamped.
    pub strict_timestamps: bool,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            compression: CompressionMethod::Stored,
            level: None,
            allow_zip64: true,
            strict_timestamps: true,
        }
    }
}

impl ArchiveOptions {
    /// Creates options with defaults: stored, ZIP64 allowed, strict timestamps.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default compression method.
    pub fn compression(mut self, method: CompressionMethod) -> Self {
        self.compression = method;
        self
    }

    /// Sets the compression level (strict validation).
    ///
    /// Valid values are 0-9. Deflate uses the level directly; BZip2 maps 0
    /// to 1; LZMA ignores it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCompressionLevel`] if level is greater than 9.
    ///
    /// [`Error::InvalidCompressionLevel`]: crate::Error::InvalidCompressionLevel
    pub fn level(mut self, level: u32) -> crate::Result<Self> {
        if level > 9 {
            return Err(crate::Error::InvalidCompressionLevel { level });
        }
        self.level = Some(level);
        Ok(self)
    }

    /// Allows or forbids ZIP64 extensions.
    pub fn allow_zip64(mut self, allow: bool) -> Self {
        self.allow_zip64 = allow;
        self
    }

    /// Rejects (true) or clamps (false) file times outside 1980..=2107.
    pub fn strict_timestamps(mut self, strict: bool) -> Self {
        self.strict_timestamps = strict;
        self
    }
}
