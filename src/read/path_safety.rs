//! Mapping entry names to safe extraction paths.
//!
//! Entry names are untrusted. Absolute prefixes, drive letters, `.` and `..`
//! components are dropped so the result always stays below the destination
//! directory.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Characters Windows does not allow in file names.
const WINDOWS_ILLEGAL: &[char] = &[':', '<', '>', '|', '"', '?', '*'];

/// Returns the relative path an entry name extracts to.
///
/// The result may be empty for directory entries such as `"./"`.
pub(crate) fn sanitize(name: &str) -> PathBuf {
    let name = strip_drive(name);
    let mut out = PathBuf::new();
    for part in name.split(|c: char| c == '/' || (cfg!(windows) && c == '\\')) {
        if matches!(part, "" | "." | "..") {
            continue;
        }
        if cfg!(windows) {
            let cleaned = sanitize_windows_component(part);
            if !cleaned.is_empty() {
                out.push(cleaned);
            }
        } else {
            out.push(part);
        }
    }
    out
}

fn strip_drive(name: &str) -> &str {
    let bytes = name.as_bytes();
    if cfg!(windows) && bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        &name[2..]
    } else {
        name
    }
}

/// Replaces illegal characters and drops trailing dots.
fn sanitize_windows_component(part: &str) -> String {
    let replaced: String = part
        .chars()
        .map(|c| if WINDOWS_ILLEGAL.contains(&c) { '_' } else { c })
        .collect();
    replaced.trim_end_matches('.').to_string()
}

/// Resolves the on-disk path for an entry below `dest`.
///
/// # Errors
///
/// Returns [`Error::PathTraversal`] if a file entry has no usable path
/// components.
pub(crate) fn target_path(dest: &Path, name: &str, is_dir: bool) -> Result<PathBuf> {
    let relative = sanitize(name);
    if relative.as_os_str().is_empty() && !is_dir {
        return Err(Error::PathTraversal {
            path: name.to_string(),
        });
    }
    Ok(dest.join(relative))
}
