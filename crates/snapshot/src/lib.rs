//! Content-addressed snapshots of a directory tree.
//!
//! A snapshot is a [`SnapshotIndex`]: every file below a root, identified by
//! the BLAKE3 digest of its bytes, its size and its modification time, plus
//! the [`Provenance`] of the capture. Indices are built by [scanning](scan) a
//! [`StorageBackend`](snapdiff_storage::StorageBackend) or by
//! [restoring](SnapshotIndex::restore) a persisted snapshot, and answer the
//! path and content lookups that comparisons are made of.
//!
//! # Persisted format
//! Newline-delimited JSON. The first line holds the provenance, every
//! following line one record, in insertion order:
//!
//! ```text
//! {"version":1,"rootdir":"/srv/photos","scan_ts":1700000000.25,"username":"zan","hostname":"nas","description":null}
//! {"filepath":["2021","beach.jpg"],"hash":"af1349b9…","mtime":1612345678.5,"size":48213}
//! {"filepath":["2021","locked.jpg"],"error":"permission denied: 2021/locked.jpg"}
//! ```
//!
//! Version `0` snapshots hashed with SHA-1. They are rejected with
//! [`LegacyDigest`](error::ErrorKind::LegacyDigest) rather than compared,
//! since none of their digests could match a BLAKE3 one; scan the tree again
//! to get a current snapshot.

pub mod error;
mod index;
mod persist;
mod provenance;
mod record;
mod scan;

pub use crate::index::{Claims, RecordId, SnapshotIndex};
pub use crate::provenance::{LEGACY_VERSION, Provenance, ProvenanceLine, SNAPSHOT_VERSION};
pub use crate::record::{FileRecord, Identity, RecordLine, RecordState};
pub use crate::scan::{DEFAULT_CONCURRENCY, ScanEvent, ScanSummary, scan};
