use crate::change::{Change, ChangeKind, Changes};
use crate::error::{ErrorKind, Result};
use crate::exclude::Excludes;
use snapdiff_snapshot::{Claims, SnapshotIndex};
use tracing::instrument;

/// Pairs the records of an old and a new snapshot and classifies each file.
///
/// Records go through four phases, each only seeing what the previous ones
/// left unclaimed:
/// 0. records matching an exclusion pattern, on either side, are EXCLUDED;
/// 1. old records with a new record at the same path are IDENTICAL or
///    MODIFIED, depending on their digests;
/// 2. remaining old records are MOVED when a new record has the same digest
///    (see [`SnapshotIndex::best_content_match`] for which one), or DELETED;
/// 3. remaining new records are ADDED.
///
/// With duplicate tracking, DELETED becomes DEDUPLICATED when the content
/// survives elsewhere in the new snapshot, and ADDED becomes DUPLICATED when
/// it already existed in the old one.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    excludes: Excludes,
    track_duplicates: bool,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_excludes(mut self, excludes: Excludes) -> Self {
        self.excludes = excludes;
        self
    }

    pub fn track_duplicates(mut self, enabled: bool) -> Self {
        self.track_duplicates = enabled;
        self
    }

    /// Classifies every identified record of both indices exactly once.
    ///
    /// Records that failed to be read take no part. Fails only if a record
    /// was left without a change, which would be a bug here rather than a
    /// problem with the input.
    #[instrument(skip_all, fields(old = old.len(), new = new.len()))]
    pub fn classify<'a>(&self, old: &'a SnapshotIndex, new: &'a SnapshotIndex) -> Result<Changes<'a>> {
        let mut pass = Pass { old, new, old_claims: Claims::new(), new_claims: Claims::new(), changes: Vec::new() };

        if !self.excludes.is_empty() {
            tracing::info!(patterns = ?self.excludes.patterns().collect::<Vec<_>>(), "Excluding files");
            pass.exclude(&self.excludes);
        }
        tracing::info!("Matching files with identical paths");
        pass.match_paths();
        tracing::info!("Matching files with identical contents");
        pass.match_contents(self.track_duplicates);
        tracing::info!("Adding remaining files");
        pass.add_residue(self.track_duplicates);

        let unpaired_old = old.unmatched(&pass.old_claims).len();
        let unpaired_new = new.unmatched(&pass.new_claims).len();
        if unpaired_old > 0 || unpaired_new > 0 {
            tracing::error!(old = unpaired_old, new = unpaired_new, "Records left unpaired after classification");
            exn::bail!(ErrorKind::Unpaired { old: unpaired_old, new: unpaired_new });
        }
        let changes = Changes::sorted(pass.changes);
        tracing::debug!(changes = changes.len(), "Classification complete");
        Ok(changes)
    }
}

/// State of one classification: which records each side has given away so
/// far, and the changes that did so.
struct Pass<'a> {
    old: &'a SnapshotIndex,
    new: &'a SnapshotIndex,
    old_claims: Claims,
    new_claims: Claims,
    changes: Vec<Change<'a>>,
}

impl<'a> Pass<'a> {
    fn exclude(&mut self, excludes: &Excludes) {
        for id in self.old.unmatched(&self.old_claims) {
            let record = self.old.get(id);
            if excludes.matches(record.path()) {
                self.old_claims.claim(id);
                self.changes.push(Change::old_only(ChangeKind::Excluded, record));
            }
        }
        for id in self.new.unmatched(&self.new_claims) {
            let record = self.new.get(id);
            if excludes.matches(record.path()) {
                self.new_claims.claim(id);
                self.changes.push(Change::new_only(ChangeKind::Excluded, record));
            }
        }
    }

    fn match_paths(&mut self) {
        for id in self.old.unmatched(&self.old_claims) {
            let record = self.old.get(id);
            let Some(other) = self.new.best_name_match(record, &self.new_claims) else {
                continue;
            };
            let counterpart = self.new.get(other);
            let kind = if record.same_contents(counterpart) { ChangeKind::Identical } else { ChangeKind::Modified };
            self.old_claims.claim(id);
            self.new_claims.claim(other);
            self.changes.push(Change::paired(kind, record, counterpart));
        }
    }

    fn match_contents(&mut self, track_duplicates: bool) {
        for id in self.old.unmatched(&self.old_claims) {
            let record = self.old.get(id);
            self.old_claims.claim(id);
            if let Some(other) = self.new.best_content_match(record, &self.new_claims) {
                self.new_claims.claim(other);
                self.changes.push(Change::paired(ChangeKind::Moved, record, self.new.get(other)));
                continue;
            }
            let survives = record.hash().is_some_and(|hash| self.new.contains_hash(hash));
            let kind = if track_duplicates && survives { ChangeKind::Deduplicated } else { ChangeKind::Deleted };
            self.changes.push(Change::old_only(kind, record));
        }
    }

    fn add_residue(&mut self, track_duplicates: bool) {
        for id in self.new.unmatched(&self.new_claims) {
            let record = self.new.get(id);
            self.new_claims.claim(id);
            let existed = record.hash().is_some_and(|hash| self.old.contains_hash(hash));
            let kind = if track_duplicates && existed { ChangeKind::Duplicated } else { ChangeKind::Added };
            self.changes.push(Change::new_only(kind, record));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapdiff_snapshot::FileRecord;
    use snapdiff_storage::backend::MockBackend;

    fn index(records: &[(&str, &str, f64)]) -> SnapshotIndex {
        let mut index = SnapshotIndex::new();
        for (path, hash, mtime) in records {
            index.add(FileRecord::identified(path.split('/'), *hash, 1, *mtime));
        }
        index
    }

    fn render(changes: &Changes<'_>) -> Vec<String> {
        changes.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_self_comparison_is_identical() {
        let snapshot = index(&[("a.txt", "h1", 1.0), ("dir/b.txt", "h2", 2.0), ("dir/copy.txt", "h2", 3.0)]);
        let changes = Classifier::new().classify(&snapshot, &snapshot).unwrap();
        assert_eq!(changes.len(), 3);
        assert!(changes.iter().all(|c| c.kind() == ChangeKind::Identical));
    }

    #[test]
    fn test_every_kind() {
        let old = index(&[
            ("same.txt", "s", 1.0),
            ("edited.txt", "e1", 1.0),
            ("dir/x.txt", "m", 1.0),
            ("gone.txt", "g", 1.0),
            ("tmp/cache.bin", "c", 1.0),
        ]);
        let new = index(&[
            ("same.txt", "s", 1.0),
            ("edited.txt", "e2", 2.0),
            ("dir2/x.txt", "m", 1.0),
            ("fresh.txt", "f", 1.0),
            ("tmp/cache.bin", "c", 1.0),
        ]);
        let classifier = Classifier::new().with_excludes(Excludes::new(["tmp/*"]).unwrap());
        let changes = classifier.classify(&old, &new).unwrap();
        assert_eq!(
            render(&changes),
            vec![
                "EXCLUDED: tmp/cache.bin -> -",
                "EXCLUDED: - -> tmp/cache.bin",
                "IDENTICAL: same.txt -> same.txt",
                "MODIFIED: edited.txt -> edited.txt",
                "MOVED: dir/x.txt -> dir2/x.txt",
                "DELETED: gone.txt -> -",
                "ADDED: - -> fresh.txt",
            ]
        );
    }

    #[test]
    fn test_completeness() {
        let old = index(&[("a", "1", 1.0), ("b", "1", 1.0), ("c", "2", 1.0), ("d", "3", 1.0), ("e/f", "4", 1.0)]);
        let new = index(&[("a", "2", 1.0), ("x/b", "1", 1.0), ("y", "1", 2.0), ("e/f", "4", 1.0), ("z", "5", 1.0)]);
        let changes = Classifier::new().with_excludes(Excludes::new(["d"]).unwrap()).classify(&old, &new).unwrap();
        assert_eq!(changes.references(), old.len() + new.len());
    }

    #[test]
    fn test_rename_detection() {
        let old = index(&[("dir/x.txt", "h", 1.0)]);
        let new = index(&[("dir2/x.txt", "h", 5.0)]);
        let changes = Classifier::new().classify(&old, &new).unwrap();
        assert_eq!(render(&changes), vec!["MOVED: dir/x.txt -> dir2/x.txt"]);
    }

    #[test]
    fn test_tie_break_is_deterministic() {
        for (first, second) in [("a/b/x.txt", "c/b/x.txt"), ("c/b/x.txt", "a/b/x.txt")] {
            let old = index(&[("z/b/x.txt", "h", 9.0)]);
            let new = index(&[(first, "h", 1.0), (second, "h", 2.0)]);
            let changes = Classifier::new().classify(&old, &new).unwrap();
            assert_eq!(
                render(&changes),
                vec![format!("MOVED: z/b/x.txt -> {first}"), format!("ADDED: - -> {second}")]
            );
        }
    }

    #[test]
    fn test_exclusion_precedes_pairing() {
        let old = index(&[("keep/a.log", "h", 1.0), ("b.log", "l", 1.0)]);
        let new = index(&[("keep/a.log", "h", 1.0), ("moved/b.log", "l", 1.0)]);
        let classifier = Classifier::new().with_excludes(Excludes::new(["*.log"]).unwrap());
        let changes = classifier.classify(&old, &new).unwrap();
        assert_eq!(changes.len(), 4);
        assert!(changes.iter().all(|c| c.kind() == ChangeKind::Excluded));
    }

    #[test]
    fn test_moves_prefer_path_similarity() {
        // Two copies of the same content moved between directories.
        let old = index(&[("photos/2020/a.jpg", "h", 1.0), ("photos/2021/a.jpg", "h", 1.0)]);
        let new = index(&[("archive/2021/a.jpg", "h", 1.0), ("archive/2020/a.jpg", "h", 1.0)]);
        let changes = Classifier::new().classify(&old, &new).unwrap();
        assert_eq!(
            render(&changes),
            vec![
                "MOVED: photos/2020/a.jpg -> archive/2020/a.jpg",
                "MOVED: photos/2021/a.jpg -> archive/2021/a.jpg",
            ]
        );
    }

    #[test]
    fn test_duplicate_tracking() {
        let old = index(&[("a.txt", "h", 1.0), ("b.txt", "h", 1.0), ("c.txt", "k", 1.0)]);
        let new = index(&[("a.txt", "h", 1.0), ("c.txt", "k", 1.0), ("c-copy.txt", "k", 2.0)]);

        let plain = Classifier::new().classify(&old, &new).unwrap();
        assert_eq!(plain.of_kind(ChangeKind::Deleted).count(), 1);
        assert_eq!(plain.of_kind(ChangeKind::Added).count(), 1);

        let tracked = Classifier::new().track_duplicates(true).classify(&old, &new).unwrap();
        assert_eq!(
            render(&tracked),
            vec![
                "IDENTICAL: a.txt -> a.txt",
                "IDENTICAL: c.txt -> c.txt",
                "DEDUPLICATED: b.txt -> -",
                "DUPLICATED: - -> c-copy.txt",
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_records_are_never_classified() {
        let old_backend = MockBackend::with_files([("a.txt", &b"one"[..]), ("locked.txt", &b"secret"[..])])
            .with_unreadable("locked.txt");
        let new_backend = MockBackend::with_files([("a.txt", &b"one"[..]), ("locked.txt", &b"secret"[..])]);
        let mut old = SnapshotIndex::named("old");
        let mut new = SnapshotIndex::named("new");
        old.populate(&old_backend, None, 2).await;
        new.populate(&new_backend, None, 2).await;

        let changes = Classifier::new().classify(&old, &new).unwrap();
        assert_eq!(render(&changes)[0], "IDENTICAL: a.txt -> a.txt");
        assert_eq!(render(&changes)[1], "ADDED: - -> locked.txt");
        assert!(changes.iter().all(|c| c.old().is_none_or(|r| !r.is_failed())));
        assert_eq!(old.failures().count(), 1);
    }
}
