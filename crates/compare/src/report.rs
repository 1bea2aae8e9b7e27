use crate::change::{Change, ChangeKind, Changes};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Write;

/// Which kinds of change a report shows.
///
/// By default everything that differs is shown, and IDENTICAL and EXCLUDED
/// are hidden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    kinds: BTreeSet<ChangeKind>,
}

impl Default for Selection {
    fn default() -> Self {
        Self::only(ChangeKind::ALL.into_iter().filter(|k| !matches!(k, ChangeKind::Identical | ChangeKind::Excluded)))
    }
}

impl Selection {
    pub fn all() -> Self {
        Self::only(ChangeKind::ALL)
    }

    pub fn only(kinds: impl IntoIterator<Item = ChangeKind>) -> Self {
        Self { kinds: kinds.into_iter().collect() }
    }

    pub fn contains(&self, kind: ChangeKind) -> bool {
        self.kinds.contains(&kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// `MOVED: photos/a.jpg -> archive/a.jpg`
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

#[derive(Serialize)]
struct ChangeLine<'a> {
    kind: ChangeKind,
    old: Option<&'a str>,
    new: Option<&'a str>,
}

impl<'a> From<&Change<'a>> for ChangeLine<'a> {
    fn from(change: &Change<'a>) -> Self {
        Self {
            kind: change.kind(),
            old: change.old().map(|r| r.path()),
            new: change.new().map(|r| r.path()),
        }
    }
}

/// Writes the selected changes, in report order, returning how many were
/// written.
pub fn write_report(changes: &Changes<'_>, selection: &Selection, format: Format, mut writer: impl Write) -> Result<usize> {
    let mut written = 0;
    for change in changes.iter().filter(|c| selection.contains(c.kind())) {
        match format {
            Format::Text => writeln!(writer, "{change}").or_raise(|| ErrorKind::Report)?,
            Format::Json => {
                serde_json::to_writer(&mut writer, &ChangeLine::from(change)).or_raise(|| ErrorKind::Report)?;
                writer.write_all(b"\n").or_raise(|| ErrorKind::Report)?;
            },
        }
        written += 1;
    }
    writer.flush().or_raise(|| ErrorKind::Report)?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classifier;
    use snapdiff_snapshot::{FileRecord, SnapshotIndex};

    fn fixture() -> (SnapshotIndex, SnapshotIndex) {
        let mut old = SnapshotIndex::new();
        let mut new = SnapshotIndex::new();
        old.add(FileRecord::identified(["same.txt"], "s", 1, 1.0));
        old.add(FileRecord::identified(["dir", "x.txt"], "m", 1, 1.0));
        new.add(FileRecord::identified(["same.txt"], "s", 1, 1.0));
        new.add(FileRecord::identified(["dir2", "x.txt"], "m", 1, 1.0));
        new.add(FileRecord::identified(["fresh.txt"], "f", 1, 1.0));
        (old, new)
    }

    fn report(selection: &Selection, format: Format) -> String {
        let (old, new) = fixture();
        let changes = Classifier::new().classify(&old, &new).unwrap();
        let mut buffer = Vec::new();
        write_report(&changes, selection, format, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_default_selection_hides_identical() {
        assert_eq!(report(&Selection::default(), Format::Text), "MOVED: dir/x.txt -> dir2/x.txt\nADDED: - -> fresh.txt\n");
        let selection = Selection::default();
        assert!(!selection.contains(ChangeKind::Identical));
        assert!(!selection.contains(ChangeKind::Excluded));
        for kind in [ChangeKind::Modified, ChangeKind::Moved, ChangeKind::Deleted, ChangeKind::Added] {
            assert!(selection.contains(kind));
        }
    }

    #[test]
    fn test_all_and_only() {
        assert!(report(&Selection::all(), Format::Text).starts_with("IDENTICAL: same.txt -> same.txt\n"));
        assert_eq!(report(&Selection::only([ChangeKind::Added]), Format::Text), "ADDED: - -> fresh.txt\n");
        assert_eq!(report(&Selection::only([]), Format::Text), "");
    }

    #[test]
    fn test_json_lines() {
        assert_eq!(
            report(&Selection::default(), Format::Json),
            concat!(
                r#"{"kind":"MOVED","old":"dir/x.txt","new":"dir2/x.txt"}"#,
                "\n",
                r#"{"kind":"ADDED","old":null,"new":"fresh.txt"}"#,
                "\n",
            )
        );
    }
}
