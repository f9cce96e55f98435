//! Metadata restoration for extracted files.

use std::path::Path;

use super::PreserveMetadata;
use crate::Entry;

/// Applies the entry's metadata to an extracted file as configured.
///
/// Failures are logged and otherwise ignored.
pub(crate) fn apply_metadata(path: &Path, entry: &Entry, options: &PreserveMetadata) {
    if options.modification_time {
        if let Some(mtime) = entry.modified.to_system_time() {
            let mtime = filetime::FileTime::from_system_time(mtime);
            if let Err(e) = filetime::set_file_mtime(path, mtime) {
                log::warn!(
                    "Failed to set modification time on '{}': {}",
                    path.display(),
                    e
                );
            }
        }
    }

    if options.permissions {
        if let Some(mode) = entry.unix_mode() {
            apply_permissions(path, mode);
        }
    }
}

#[cfg(unix)]
fn apply_permissions(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;

    let perms = std::fs::Permissions::from_mode(mode & 0o7777);
    if let Err(e) = std::fs::set_permissions(path, perms) {
        log::warn!("Failed to set permissions on '{}': {}", path.display(), e);
    }
}

#[cfg(not(unix))]
fn apply_permissions(path: &Path, mode: u32) {
    if mode & 0o222 != 0 {
        return;
    }
    match std::fs::metadata(path) {
        Ok(meta) => {
            let mut perms = meta.permissions();
            perms.set_readonly(true);
            if let Err(e) = std::fs::set_permissions(path, perms) {
                log::warn!(
                    "Failed to set read-only attribute on '{}': {}",
                    path.display(),
                    e
                );
            }
        }
        Err(e) => log::warn!("Failed to stat '{}': {}", path.display(), e),
    }
}
