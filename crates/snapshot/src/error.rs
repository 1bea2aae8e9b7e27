//! Snapshot Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Reading a single file during a scan never produces one of these: such
//! failures are recorded on the [`FileRecord`](crate::FileRecord) itself.
//! Everything here is structural and aborts the operation that raised it.

use derive_more::{Display, Error};

/// A snapshot error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for snapshot operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A persisted record is well-formed JSON but not a valid record.
    #[display("invalid record: {_0}")]
    InvalidRecord(#[error(not(source))] &'static str),
    /// A persisted snapshot line could not be parsed (1-based line number).
    #[display("malformed snapshot at line {_0}")]
    Malformed(#[error(not(source))] usize),
    /// The snapshot was written by an incompatible format version.
    #[display("unsupported snapshot version {_0}")]
    UnsupportedVersion(#[error(not(source))] u32),
    /// The snapshot predates BLAKE3 digests; its SHA-1 digests can never
    /// match a current scan, so the tree has to be scanned again.
    #[display("snapshot version {_0} uses SHA-1 digests; rescan the tree to compare against it")]
    LegacyDigest(#[error(not(source))] u32),
    /// The snapshot source holds no provenance line.
    #[display("snapshot is empty")]
    Empty,
    /// Persisting requires provenance, which only a scan or a load provides.
    #[display("index has no provenance")]
    NoProvenance,
    /// Reading or writing the snapshot source failed.
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io)
    }
}
