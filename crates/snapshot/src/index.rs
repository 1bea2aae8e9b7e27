use crate::provenance::Provenance;
use crate::record::FileRecord;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

/// Position of a record inside the [`SnapshotIndex`] that handed it out.
///
/// Only meaningful for that index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(usize);

/// Records of one index that have already been paired, tracked by whoever
/// does the pairing instead of by the records themselves.
#[derive(Debug, Default, Clone)]
pub struct Claims(HashSet<RecordId>);

impl Claims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the record had already been claimed.
    pub fn claim(&mut self, id: RecordId) -> bool {
        self.0.insert(id)
    }

    pub fn is_claimed(&self, id: RecordId) -> bool {
        self.0.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Every file of one side of a comparison, with path and content lookups.
///
/// Records live in insertion order. Identified records are reachable by
/// path (unique; a later record at the same path replaces the earlier one
/// in place) and by digest (a bucket per digest, in insertion order). Records
/// that failed to be read are kept for reporting and persistence only; they
/// are in neither lookup and never returned by the matching queries.
///
/// Scans and loads can be repeated on the same index to union several
/// sources into one namespace. Only the first provenance is kept.
#[derive(Debug, Default)]
pub struct SnapshotIndex {
    name: Option<String>,
    pub(crate) provenance: Option<Provenance>,
    entries: Vec<FileRecord>,
    by_path: HashMap<String, RecordId>,
    by_hash: HashMap<String, Vec<RecordId>>,
}

impl SnapshotIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// An index whose name shows up in log events (e.g. "old" and "new").
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Self::default() }
    }

    pub(crate) fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("index")
    }

    pub fn provenance(&self) -> Option<&Provenance> {
        self.provenance.as_ref()
    }

    /// Attaches `provenance` unless the index already has one.
    ///
    /// Returns whether it was attached.
    pub fn set_provenance_if_absent(&mut self, provenance: Provenance) -> bool {
        if self.provenance.is_some() {
            tracing::debug!(index = self.label(), "Discarding provenance of merged source");
            return false;
        }
        self.provenance = Some(provenance);
        true
    }

    /// Adds a record, returning its id, or `None` if the record is a read
    /// failure (kept, but excluded from lookups).
    pub fn add(&mut self, record: FileRecord) -> Option<RecordId> {
        let Some(hash) = record.hash().map(str::to_owned) else {
            tracing::debug!(index = self.label(), path = record.path(), "Keeping failed record out of lookups");
            self.entries.push(record);
            return None;
        };
        let id = match self.by_path.get(record.path()).copied() {
            Some(id) => {
                tracing::debug!(index = self.label(), path = record.path(), "Replacing record at existing path");
                if let Some(previous) = self.entries[id.0].hash().map(str::to_owned)
                    && let Some(bucket) = self.by_hash.get_mut(&previous)
                {
                    bucket.retain(|other| *other != id);
                    if bucket.is_empty() {
                        self.by_hash.remove(&previous);
                    }
                }
                self.entries[id.0] = record;
                id
            },
            None => {
                let id = RecordId(self.entries.len());
                self.by_path.insert(record.path().to_owned(), id);
                self.entries.push(record);
                id
            },
        };
        self.by_hash.entry(hash).or_default().push(id);
        Some(id)
    }

    /// Panics if `id` was handed out by a different index.
    pub fn get(&self, id: RecordId) -> &FileRecord {
        &self.entries[id.0]
    }

    pub fn by_path(&self, path: &str) -> Option<&FileRecord> {
        self.by_path.get(path).map(|id| self.get(*id))
    }

    /// Number of identified (matchable) records.
    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// Every record, failed ones included, in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &FileRecord> {
        self.entries.iter()
    }

    /// Identified records in insertion order.
    pub fn records(&self) -> impl Iterator<Item = (RecordId, &FileRecord)> {
        self.entries.iter().enumerate().filter(|(_, r)| !r.is_failed()).map(|(i, r)| (RecordId(i), r))
    }

    /// Records whose file could not be read, in insertion order.
    pub fn failures(&self) -> impl Iterator<Item = &FileRecord> {
        self.entries.iter().filter(|r| r.is_failed())
    }

    /// Joined paths of the identified records, in no particular order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.by_path.keys().map(String::as_str)
    }

    /// Distinct digests of the identified records, in no particular order.
    pub fn digests(&self) -> impl Iterator<Item = &str> {
        self.by_hash.keys().map(String::as_str)
    }

    /// Whether any identified record has the digest `hash`, claimed or not.
    pub fn contains_hash(&self, hash: &str) -> bool {
        self.by_hash.contains_key(hash)
    }

    /// Snapshot of the identified records not yet claimed, in insertion
    /// order. Claiming records afterwards doesn't change the returned list.
    pub fn unmatched(&self, claims: &Claims) -> Vec<RecordId> {
        self.records().map(|(id, _)| id).filter(|id| !claims.is_claimed(*id)).collect()
    }

    /// The unclaimed record at the same path as `probe`.
    pub fn best_name_match(&self, probe: &FileRecord, claims: &Claims) -> Option<RecordId> {
        self.by_path.get(probe.path()).copied().filter(|id| !claims.is_claimed(*id))
    }

    /// The unclaimed record most likely to be `probe` under another name.
    ///
    /// Among the unclaimed records sharing `probe`'s digest:
    /// 1. none → `None`, exactly one → that one;
    /// 2. exactly one with `probe`'s modification time → that one;
    /// 3. otherwise the one sharing the longest run of trailing path
    ///    components with `probe` (a moved file keeps more of its path than
    ///    an unrelated copy). Equal runs go to whichever record entered the
    ///    digest bucket first, which for a scan is listing order and for a
    ///    load is line order.
    pub fn best_content_match(&self, probe: &FileRecord, claims: &Claims) -> Option<RecordId> {
        let identity = probe.identity()?;
        let candidates: Vec<RecordId> =
            self.by_hash.get(&identity.hash)?.iter().copied().filter(|id| !claims.is_claimed(*id)).collect();
        if candidates.len() <= 1 {
            return candidates.first().copied();
        }

        let same_mtime: Vec<RecordId> = candidates
            .iter()
            .copied()
            .filter(|id| self.get(*id).identity().is_some_and(|other| other.mtime == identity.mtime))
            .collect();
        if let [only] = same_mtime.as_slice() {
            return Some(*only);
        }

        // `min_by_key` keeps the first of equal keys, `max_by_key` the last.
        candidates.into_iter().min_by_key(|id| Reverse(self.get(*id).common_suffix_len(probe)))
    }
}
