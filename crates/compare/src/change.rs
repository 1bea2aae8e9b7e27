use crate::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use snapdiff_snapshot::FileRecord;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Classification of one file across two snapshots.
///
/// Variants are declared in report order: sorting by kind groups a report
/// the way it is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum ChangeKind {
    /// Matched an exclusion pattern; never paired. Old side or new side.
    Excluded,
    /// Same path, same contents.
    Identical,
    /// Same path, different contents.
    Modified,
    /// Same contents under a different path.
    Moved,
    /// Only in the old snapshot.
    Deleted,
    /// Only in the old snapshot, but its contents still exist elsewhere in
    /// the new one. Only reported when duplicate tracking is enabled.
    Deduplicated,
    /// Only in the new snapshot.
    Added,
    /// Only in the new snapshot, but its contents already existed in the old
    /// one. Only reported when duplicate tracking is enabled.
    Duplicated,
}

impl ChangeKind {
    pub const ALL: [Self; 8] = [
        Self::Excluded,
        Self::Identical,
        Self::Modified,
        Self::Moved,
        Self::Deleted,
        Self::Deduplicated,
        Self::Added,
        Self::Duplicated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excluded => "EXCLUDED",
            Self::Identical => "IDENTICAL",
            Self::Modified => "MODIFIED",
            Self::Moved => "MOVED",
            Self::Deleted => "DELETED",
            Self::Deduplicated => "DEDUPLICATED",
            Self::Added => "ADDED",
            Self::Duplicated => "DUPLICATED",
        }
    }

    fn has_old(&self) -> bool {
        !matches!(self, Self::Added | Self::Duplicated)
    }

    fn has_new(&self) -> bool {
        !matches!(self, Self::Deleted | Self::Deduplicated)
    }
}

impl FromStr for ChangeKind {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "excluded" => Self::Excluded,
            "identical" | "unchanged" => Self::Identical,
            "modified" | "changed" => Self::Modified,
            "moved" | "renamed" => Self::Moved,
            "deleted" | "removed" => Self::Deleted,
            "deduplicated" => Self::Deduplicated,
            "added" | "new" => Self::Added,
            "duplicated" => Self::Duplicated,
            _ => exn::bail!(ErrorKind::UnknownKind(s.to_string())),
        })
    }
}
impl TryFrom<String> for ChangeKind {
    type Error = Error;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
impl From<ChangeKind> for &'static str {
    fn from(kind: ChangeKind) -> Self {
        kind.as_str()
    }
}

impl Display for ChangeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// One classified file: a kind plus the record(s) it pairs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Change<'a> {
    kind: ChangeKind,
    old: Option<&'a FileRecord>,
    new: Option<&'a FileRecord>,
}

impl<'a> Change<'a> {
    pub(crate) fn paired(kind: ChangeKind, old: &'a FileRecord, new: &'a FileRecord) -> Self {
        debug_assert!(kind.has_old() && kind.has_new() && kind != ChangeKind::Excluded);
        Self { kind, old: Some(old), new: Some(new) }
    }

    pub(crate) fn old_only(kind: ChangeKind, old: &'a FileRecord) -> Self {
        debug_assert!(kind.has_old() && (kind == ChangeKind::Excluded || !kind.has_new()));
        Self { kind, old: Some(old), new: None }
    }

    pub(crate) fn new_only(kind: ChangeKind, new: &'a FileRecord) -> Self {
        debug_assert!(kind.has_new() && (kind == ChangeKind::Excluded || !kind.has_old()));
        Self { kind, old: None, new: Some(new) }
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn old(&self) -> Option<&'a FileRecord> {
        self.old
    }

    pub fn new(&self) -> Option<&'a FileRecord> {
        self.new
    }

    /// Kind first, then old-side records before new-side ones (which only
    /// matters for exclusions), then the path of the side present.
    fn sort_key(&self) -> (ChangeKind, bool, &'a str) {
        match (self.old, self.new) {
            (Some(old), _) => (self.kind, false, old.path()),
            (None, Some(new)) => (self.kind, true, new.path()),
            (None, None) => (self.kind, true, ""),
        }
    }
}

impl Display for Change<'_> {
    /// `MOVED: photos/a.jpg -> archive/a.jpg`, with `-` for a missing side.
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let old = self.old.map_or("-", FileRecord::path);
        let new = self.new.map_or("-", FileRecord::path);
        write!(f, "{}: {old} -> {new}", self.kind)
    }
}

/// Every change of a comparison, in report order.
#[derive(Debug, Clone, Default)]
pub struct Changes<'a> {
    changes: Vec<Change<'a>>,
}

impl<'a> Changes<'a> {
    pub(crate) fn sorted(mut changes: Vec<Change<'a>>) -> Self {
        changes.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Self { changes }
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change<'a>> {
        self.changes.iter()
    }

    pub fn of_kind(&self, kind: ChangeKind) -> impl Iterator<Item = &Change<'a>> {
        self.changes.iter().filter(move |c| c.kind == kind)
    }

    /// Number of changes per kind; kinds that didn't occur are absent.
    pub fn counts(&self) -> BTreeMap<ChangeKind, usize> {
        let mut counts = BTreeMap::new();
        for change in &self.changes {
            *counts.entry(change.kind).or_default() += 1;
        }
        counts
    }

    /// Number of record references over all changes: one per side present.
    pub fn references(&self) -> usize {
        self.changes.iter().map(|c| usize::from(c.old.is_some()) + usize::from(c.new.is_some())).sum()
    }
}

impl<'a> IntoIterator for Changes<'a> {
    type Item = Change<'a>;
    type IntoIter = std::vec::IntoIter<Change<'a>>;
    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record(path: &str) -> FileRecord {
        FileRecord::identified(path.split('/'), "h", 1, 1.0)
    }

    #[rstest]
    #[case("MOVED", ChangeKind::Moved)]
    #[case("moved", ChangeKind::Moved)]
    #[case(" Changed ", ChangeKind::Modified)]
    #[case("unchanged", ChangeKind::Identical)]
    #[case("dedUPlicated", ChangeKind::Deduplicated)]
    fn test_parse_kind(#[case] input: &str, #[case] expected: ChangeKind) {
        assert_eq!(input.parse::<ChangeKind>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_kind() {
        let err = "teleported".parse::<ChangeKind>().unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnknownKind(k) if k == "teleported"));
    }

    #[test]
    fn test_kind_order_is_report_order() {
        let mut shuffled = ChangeKind::ALL;
        shuffled.reverse();
        shuffled.sort();
        assert_eq!(shuffled, ChangeKind::ALL);
    }

    #[test]
    fn test_kind_serde() {
        assert_eq!(serde_json::to_string(&ChangeKind::Modified).unwrap(), r#""MODIFIED""#);
        assert_eq!(serde_json::from_str::<ChangeKind>(r#""added""#).unwrap(), ChangeKind::Added);
        assert!(serde_json::from_str::<ChangeKind>(r#""nope""#).is_err());
    }

    #[test]
    fn test_display() {
        let (a, b) = (record("photos/a.jpg"), record("archive/a.jpg"));
        assert_eq!(Change::paired(ChangeKind::Moved, &a, &b).to_string(), "MOVED: photos/a.jpg -> archive/a.jpg");
        assert_eq!(Change::old_only(ChangeKind::Deleted, &a).to_string(), "DELETED: photos/a.jpg -> -");
        assert_eq!(Change::new_only(ChangeKind::Added, &b).to_string(), "ADDED: - -> archive/a.jpg");
    }

    #[test]
    fn test_sorting() {
        let records: Vec<FileRecord> = ["b", "a", "z", "c", "y"].into_iter().map(record).collect();
        let [b, a, z, c, y] = records.as_slice() else { unreachable!() };
        let changes = Changes::sorted(vec![
            Change::new_only(ChangeKind::Added, y),
            Change::new_only(ChangeKind::Excluded, a),
            Change::old_only(ChangeKind::Deleted, c),
            Change::old_only(ChangeKind::Excluded, z),
            Change::paired(ChangeKind::Identical, b, b),
            Change::new_only(ChangeKind::Added, c),
            Change::paired(ChangeKind::Identical, a, a),
        ]);
        let rendered: Vec<String> = changes.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "EXCLUDED: z -> -",
                "EXCLUDED: - -> a",
                "IDENTICAL: a -> a",
                "IDENTICAL: b -> b",
                "DELETED: c -> -",
                "ADDED: - -> c",
                "ADDED: - -> y",
            ]
        );
        assert_eq!(changes.references(), 9);
        assert_eq!(changes.counts()[&ChangeKind::Added], 2);
        assert!(!changes.counts().contains_key(&ChangeKind::Moved));
        assert_eq!(changes.of_kind(ChangeKind::Identical).count(), 2);
    }
}
