//! Options for extraction.

use crate::Password;

/// Options for preserving file metadata during extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreserveMetadata {
    /// Restore the entry's modification time on the extracted file.
    pub modification_time: bool,
    /// Restore the Unix permission bits stored in the external attributes.
    pub permissions: bool,
}

impl PreserveMetadata {
    /// Preserve all available metadata.
    pub fn all() -> Self {
        Self {
            modification_time: true,
            permissions: true,
        }
    }

    /// Preserve no metadata.
    pub fn none() -> Self {
        Self::default()
    }

    /// Preserve only the modification time.
    pub fn modification_time_only() -> Self {
        Self {
            modification_time: true,
            permissions: false,
        }
    }
}

/// Options for extraction operations.
///
/// # Example
///
/// ```rust
/// use zipcore::{ExtractOptions, PreserveMetadata};
///
/// let opts = ExtractOptions::new()
///     .preserve(PreserveMetadata::all())
///     .password("secret");
/// assert!(opts.preserve_metadata.permissions);
/// ```
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct ExtractOptions {
    /// Metadata preservation options.
    pub preserve_metadata: PreserveMetadata,
    /// Password for encrypted entries, overriding the archive password.
    pub password: Option<Password>,
}

impl ExtractOptions {
    /// Creates extraction options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the metadata preservation options.
    pub fn preserve(mut self, preserve: PreserveMetadata) -> Self {
        self.preserve_metadata = preserve;
        self
    }

    /// Sets the password for encrypted entries.
    pub fn password(mut self, password: impl Into<Password>) -> Self {
        self.password = Some(password.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserve_metadata() {
        let all = PreserveMetadata::all();
        assert!(all.modification_time);
        assert!(all.permissions);

        let none = PreserveMetadata::none();
        assert!(!none.modification_time);
        assert!(!none.permissions);

        let mtime = PreserveMetadata::modification_time_only();
        assert!(mtime.modification_time);
        assert!(!mtime.permissions);
    }

    #[test]
    fn test_extract_options_builder() {
        let opts = ExtractOptions::new()
            .preserve(PreserveMetadata::modification_time_only())
            .password("pw");
        assert!(opts.preserve_metadata.modification_time);
        assert_eq!(opts.password.as_ref().map(|p| p.as_bytes()), Some(&b"pw"[..]));
    }

    #[test]
    fn test_defaults_preserve_nothing() {
        let opts = ExtractOptions::default();
        assert_eq!(opts.preserve_metadata, PreserveMetadata::none());
        assert!(opts.password.is_none());
    }
}
