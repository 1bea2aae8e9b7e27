//! Path validation and splitting.
//!
//! Every path a backend hands out or accepts is relative to its root. These
//! helpers make sure a path can never climb out of that root, and split
//! validated paths into the component list snapshots store.

use crate::error::{ErrorKind, Result};
use std::path::{Component, Path, PathBuf};

/// Validates a relative path and returns it normalized.
///
/// `.` components, duplicate and trailing separators are dropped, and `..`
/// is resolved as long as it never leaves the root.
///
/// > **Note:** This does **not** normalize backslashes, non-UTF8 bytes, or
/// >           platform-specific weirdness. Null bytes are explicitly rejected.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use snapdiff_storage::validate_path;
/// assert!(validate_path("photos/2021/beach.jpg").is_ok());
/// assert!(validate_path("photos/../notes.txt").is_ok()); // (never leaves root)
/// assert!(validate_path("../etc/passwd").is_err());
/// assert!(validate_path("a\0b").is_err());
/// assert_eq!(
///     validate_path("wrong/../still-wrong/.././correct//./path.txt/").unwrap(),
///     Path::new("correct/path.txt")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls; reject them explicitly.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(path.to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}

/// Splits a path into its validated, normalized components.
///
/// Non-UTF8 components are converted lossily (U+FFFD); snapshot lines are
/// JSON and can only carry strings.
///
/// ```
/// use snapdiff_storage::path_components;
/// assert_eq!(path_components("a/./b//c.txt").unwrap(), vec!["a", "b", "c.txt"]);
/// ```
pub fn components(path: impl AsRef<Path>) -> Result<Vec<String>> {
    Ok(validate(path)?.iter().map(|c| c.to_string_lossy().into_owned()).collect())
}
