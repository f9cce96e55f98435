//! Extraction of entries to the filesystem.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::metadata::apply_metadata;
use super::path_safety::target_path;
use super::ExtractOptions;
use crate::storage::Storage;
use crate::{Entry, Error, Result, ZipArchive};

/// Result of an extraction operation.
///
/// Counts how many entries were extracted or failed, along with details
/// about each failure.
#[must_use = "extraction results should be checked for partial failures"]
#[derive(Debug, Clone, Default)]
pub struct ExtractResult {
    /// Number of entries extracted.
    pub entries_extracted: usize,
    /// Number of entries that failed.
    pub entries_failed: usize,
    /// Total bytes written.
    pub bytes_extracted: u64,
    /// Detailed failures (entry name and error message).
    pub failures: Vec<(String, String)>,
}

impl ExtractResult {
    /// Returns true if every entry was extracted.
    pub fn is_ok(&self) -> bool {
        self.entries_failed == 0
    }

    /// Returns true if any entry failed.
    pub fn is_err(&self) -> bool {
        self.entries_failed > 0
    }
}

/// Errors that make every later entry fail too.
fn is_fatal(err: &Error) -> bool {
    matches!(
        err,
        Error::Closed | Error::InvalidMode { .. } | Error::ConcurrencyViolation(_)
    )
}

impl<S: Storage> ZipArchive<S> {
    /// Extracts the named entry below `dest` and returns the path written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] for unknown names and
    /// [`Error::PathTraversal`] when the name has no safe path; otherwise
    /// the errors of [`by_entry`](Self::by_entry) and the filesystem.
    pub fn extract(&self, name: &str, dest: impl AsRef<Path>) -> Result<PathBuf> {
        let entry = self.entry(name)?;
        self.extract_entry(entry, dest, &ExtractOptions::default())
    }

    /// Extracts one entry below `dest`.
    ///
    /// Missing parent directories are created. Directory entries create a
    /// directory; file entries are decoded and written, replacing an
    /// existing file.
    pub fn extract_entry(
        &self,
        entry: &Entry,
        dest: impl AsRef<Path>,
        options: &ExtractOptions,
    ) -> Result<PathBuf> {
        self.extract_counted(entry, dest.as_ref(), options)
            .map(|(path, _)| path)
    }

    fn extract_counted(
        &self,
        entry: &Entry,
        dest: &Path,
        options: &ExtractOptions,
    ) -> Result<(PathBuf, u64)> {
        let target = target_path(dest, &entry.name, entry.is_dir())?;

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            apply_metadata(&target, entry, &options.preserve_metadata);
            return Ok((target, 0));
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let password = options.password.as_ref().map(|p| p.as_bytes());
        let mut reader = self.by_entry_with_password(entry, password)?;
        let mut out = BufWriter::new(File::create(&target)?);
        let written = io::copy(&mut reader, &mut out).map_err(Error::from_io)?;
        out.flush()?;
        drop(out);

        log::trace!("extracted '{}' to {}", entry.name, target.display());
        apply_metadata(&target, entry, &options.preserve_metadata);
        Ok((target, written))
    }

    /// Extracts every entry below `dest`.
    ///
    /// Per-entry failures are recorded in the result and extraction
    /// continues; errors that affect the whole archive, such as
    /// [`Error::Closed`], are returned immediately.
    pub fn extract_all(
        &self,
        dest: impl AsRef<Path>,
        options: &ExtractOptions,
    ) -> Result<ExtractResult> {
        let dest = dest.as_ref();
        let mut result = ExtractResult::default();
        for entry in self.entries() {
            match self.extract_counted(entry, dest, options) {
                Ok((_, bytes)) => {
                    result.entries_extracted += 1;
                    result.bytes_extracted += bytes;
                }
                Err(e) if is_fatal(&e) => return Err(e),
                Err(e) => {
                    log::warn!("Failed to extract '{}': {}", entry.name, e);
                    result.entries_failed += 1;
                    result.failures.push((entry.name.clone(), e.to_string()));
                }
            }
        }
        Ok(result)
    }
}
