use crate::index::SnapshotIndex;
use crate::provenance::Provenance;
use crate::record::FileRecord;
use async_stream::stream;
use futures::{Stream, StreamExt};
use snapdiff_storage::StorageBackend;
use tracing::instrument;

/// Number of files read and hashed at the same time when nothing else is
/// configured.
pub const DEFAULT_CONCURRENCY: usize = 16;

#[derive(Debug)]
pub enum ScanEvent {
    Started,
    /// One file, identified or failed, in listing order.
    Scanned(FileRecord),
    /// A listing error (usually an unreadable directory). The walk goes on.
    Skipped(String),
    /// Number of records produced.
    Complete(u64),
}

/// Tally of one [`SnapshotIndex::populate`] run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    pub scanned: u64,
    pub failed: u64,
    pub skipped: u64,
}

/// Walks every file of `backend` and builds its record.
///
/// Up to `concurrency` files are read at once, but records come out in the
/// order the backend listed them.
pub fn scan<'a>(backend: &'a dyn StorageBackend, concurrency: usize) -> impl Stream<Item = ScanEvent> + 'a {
    stream! {
        yield ScanEvent::Started;
        let records = backend
            .list_stream()
            .map(|listed| async move {
                match listed {
                    Ok(info) => Ok(FileRecord::build_listed(backend, &info).await),
                    Err(e) => Err((*e).to_string()),
                }
            })
            .buffered(concurrency.max(1));
        let mut count = 0u64;
        for await outcome in records {
            match outcome {
                Ok(record) => {
                    count += 1;
                    yield ScanEvent::Scanned(record);
                },
                Err(reason) => yield ScanEvent::Skipped(reason),
            }
        }
        yield ScanEvent::Complete(count);
    }
}

impl SnapshotIndex {
    /// Scans `backend` and adds every file to the index.
    ///
    /// Calling this again with another backend unions both trees into one
    /// namespace; the provenance of the first call is kept. Unreadable files
    /// are added as failed records and unreadable directories are skipped,
    /// neither aborts the scan.
    #[instrument(skip_all, fields(index = self.label(), backend = backend.name()))]
    pub async fn populate(
        &mut self,
        backend: &dyn StorageBackend,
        description: Option<&str>,
        concurrency: usize,
    ) -> ScanSummary {
        self.set_provenance_if_absent(Provenance::capture(backend.root(), description.map(str::to_string)));
        let mut summary = ScanSummary::default();
        let events = scan(backend, concurrency);
        futures::pin_mut!(events);
        while let Some(event) = events.next().await {
            match event {
                ScanEvent::Started => tracing::info!(root = %backend.root().display(), "Scan started"),
                ScanEvent::Scanned(record) => {
                    if let Some(error) = record.error() {
                        tracing::warn!(path = record.path(), error, "Could not read file");
                        summary.failed += 1;
                    } else {
                        summary.scanned += 1;
                    }
                    self.add(record);
                },
                ScanEvent::Skipped(reason) => {
                    tracing::warn!(reason = %reason, "Skipping unreadable directory entry");
                    summary.skipped += 1;
                },
                ScanEvent::Complete(count) => tracing::info!(records = count, "Scan complete"),
            }
        }
        summary
    }
}
