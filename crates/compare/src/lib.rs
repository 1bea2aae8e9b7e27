//! Classify the differences between two snapshots.
//!
//! A [`Classifier`] pairs the records of an old and a new
//! [`SnapshotIndex`](snapdiff_snapshot::SnapshotIndex) by path, then by
//! content, and reports every file exactly once as a [`Change`]. Files that
//! kept their contents under another name are found even when the name and
//! the directory both changed.
//!
//! ```
//! use snapdiff_compare::{Classifier, ChangeKind};
//! use snapdiff_snapshot::{FileRecord, SnapshotIndex};
//!
//! let mut old = SnapshotIndex::new();
//! old.add(FileRecord::identified(["dir", "x.txt"], "af13", 5, 1.0));
//! let mut new = SnapshotIndex::new();
//! new.add(FileRecord::identified(["dir2", "x.txt"], "af13", 5, 1.0));
//!
//! let changes = Classifier::new().classify(&old, &new).unwrap();
//! let change = changes.iter().next().unwrap();
//! assert_eq!(change.kind(), ChangeKind::Moved);
//! assert_eq!(change.to_string(), "MOVED: dir/x.txt -> dir2/x.txt");
//! ```

mod change;
mod classifier;
pub mod error;
mod exclude;
mod report;

pub use crate::change::{Change, ChangeKind, Changes};
pub use crate::classifier::Classifier;
pub use crate::exclude::Excludes;
pub use crate::report::{Format, Selection, write_report};
