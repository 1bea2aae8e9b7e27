//! Storage models.

use std::path::PathBuf;
use time::UtcDateTime;

/// Metadata of one regular file, as reported by a backend listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Relative path from the backend root
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub modified: UtcDateTime,
}
impl FileInfo {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: UtcDateTime) -> Self {
        Self { path: path.into(), size, modified }
    }

    /// Modification time as fractional seconds since the Unix epoch.
    ///
    /// Nanosecond precision survives the conversion for any date a
    /// filesystem is likely to report (an `f64` carries ~15.9 significant
    /// digits).
    pub fn modified_epoch(&self) -> f64 {
        self.modified.unix_timestamp_nanos() as f64 / 1_000_000_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modified_epoch() {
        let modified = UtcDateTime::from_unix_timestamp(1_700_000_000).unwrap().replace_millisecond(500).unwrap();
        let info = FileInfo::new("a.txt", 3, modified);
        assert_eq!(info.modified_epoch(), 1_700_000_000.5);
    }
}
