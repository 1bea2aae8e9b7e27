use crate::cli::{CompareArgs, ScanArgs};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use snapdiff_compare::{Classifier, Format, Selection, write_report};
use snapdiff_config::Config;
use snapdiff_snapshot::SnapshotIndex;
use snapdiff_storage::backend::LocalBackend;
use std::io::Write;
use std::path::Path;

pub async fn scan(args: ScanArgs, config: &Config, mut out: impl Write) -> Result<()> {
    let concurrency = args.concurrency.unwrap_or(config.concurrency);
    let mut index = SnapshotIndex::named("scan");
    let mut total = (0, 0, 0);
    for dir in &args.dirs {
        let backend = LocalBackend::open("local", dir).or_raise(|| ErrorKind::Directory(dir.clone()))?;
        let summary = index.populate(&backend, args.description.as_deref(), concurrency).await;
        total = (total.0 + summary.scanned, total.1 + summary.failed, total.2 + summary.skipped);
    }
    index.persist_to(&args.output).or_raise(|| ErrorKind::Save(args.output.clone()))?;
    writeln!(
        out,
        "{} files ({} unreadable, {} skipped) written to {}",
        total.0 + total.1,
        total.1,
        total.2,
        args.output.display()
    )
    .or_raise(|| ErrorKind::Output)
}

pub async fn compare(args: CompareArgs, config: &Config, out: impl Write) -> Result<()> {
    let concurrency = args.concurrency.unwrap_or(config.concurrency);
    let old = open_side("old", &args.old, concurrency).await?;
    let new = open_side("new", &args.new, concurrency).await?;

    let mut patterns = config.exclude.clone();
    patterns.extend(args.exclude);
    let excludes = snapdiff_compare::Excludes::new(&patterns).or_raise(|| ErrorKind::Compare)?;
    let changes = Classifier::new()
        .with_excludes(excludes)
        .track_duplicates(args.duplicates || config.track_duplicates)
        .classify(&old, &new)
        .or_raise(|| ErrorKind::Compare)?;

    for (side, index) in [("old", &old), ("new", &new)] {
        for failed in index.failures() {
            tracing::warn!(side, path = failed.path(), error = failed.error(), "Unreadable file left out of the comparison");
        }
    }
    tracing::info!(counts = ?changes.counts(), "Comparison complete");

    let selection = match (args.all, args.show.is_empty()) {
        (true, _) => Selection::all(),
        (false, false) => Selection::only(args.show),
        (false, true) => config.selection(),
    };
    let format = if args.json { Format::Json } else { Format::Text };
    write_report(&changes, &selection, format, out).or_raise(|| ErrorKind::Output)?;
    Ok(())
}

pub fn show(file: &Path, mut out: impl Write) -> Result<()> {
    let index = SnapshotIndex::load("show", file).or_raise(|| ErrorKind::Load(file.to_path_buf()))?;
    if let Some(provenance) = index.provenance() {
        writeln!(out, "{provenance}").or_raise(|| ErrorKind::Output)?;
    }
    writeln!(out, "{} files, {} digests", index.len(), index.digests().count()).or_raise(|| ErrorKind::Output)?;
    for failed in index.failures() {
        writeln!(out, "UNREADABLE: {} ({})", failed.path(), failed.error().unwrap_or_default())
            .or_raise(|| ErrorKind::Output)?;
    }
    Ok(())
}

/// A directory is scanned now; anything else is read as a snapshot file.
async fn open_side(name: &str, path: &Path, concurrency: usize) -> Result<SnapshotIndex> {
    if path.is_dir() {
        let backend = LocalBackend::open(name, path).or_raise(|| ErrorKind::Directory(path.to_path_buf()))?;
        let mut index = SnapshotIndex::named(name);
        index.populate(&backend, None, concurrency).await;
        Ok(index)
    } else {
        SnapshotIndex::load(name, path).or_raise(|| ErrorKind::Load(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use std::path::PathBuf;

    fn tree(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (path, contents) in files {
            let path = dir.path().join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }
        dir
    }

    fn compare_args(old: PathBuf, new: PathBuf) -> CompareArgs {
        CompareArgs {
            old,
            new,
            exclude: Vec::new(),
            show: Vec::new(),
            all: false,
            json: false,
            duplicates: false,
            concurrency: None,
        }
    }

    async fn run_compare(args: CompareArgs) -> String {
        let mut out = Vec::new();
        compare(args, &Config::default(), &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn test_scan_then_compare_against_live_tree() {
        let before = tree(&[("photos/a.jpg", "sand"), ("notes.txt", "remember"), ("tmp/x.tmp", "junk")]);
        let store = tempfile::tempdir().unwrap();
        let snapshot = store.path().join("before.snap");

        let mut out = Vec::new();
        let args = ScanArgs {
            dirs: vec![before.path().to_path_buf()],
            output: snapshot.clone(),
            description: Some("before cleanup".to_string()),
            concurrency: Some(2),
        };
        scan(args, &Config::default(), &mut out).await.unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("3 files (0 unreadable, 0 skipped)"));

        let after = tree(&[("archive/photos/a.jpg", "sand"), ("notes.txt", "forget"), ("tmp/x.tmp", "other")]);
        let mut args = compare_args(snapshot, after.path().to_path_buf());
        args.exclude = vec!["tmp/*".to_string()];
        assert_eq!(
            run_compare(args).await,
            "MODIFIED: notes.txt -> notes.txt\nMOVED: photos/a.jpg -> archive/photos/a.jpg\n"
        );
    }

    #[rstest]
    #[case(vec![], false, "ADDED: - -> b.txt\n")]
    #[case(vec![snapdiff_compare::ChangeKind::Identical], false, "IDENTICAL: a.txt -> a.txt\n")]
    #[case(vec![], true, "IDENTICAL: a.txt -> a.txt\nADDED: - -> b.txt\n")]
    #[tokio::test]
    async fn test_compare_selection(
        #[case] show: Vec<snapdiff_compare::ChangeKind>,
        #[case] all: bool,
        #[case] expected: &str,
    ) {
        let old = tree(&[("a.txt", "one")]);
        let new = tree(&[("a.txt", "one"), ("b.txt", "two")]);
        let mut args = compare_args(old.path().to_path_buf(), new.path().to_path_buf());
        args.show = show;
        args.all = all;
        assert_eq!(run_compare(args).await, expected);
    }

    #[tokio::test]
    async fn test_show() {
        let dir = tree(&[("a.txt", "one"), ("b/c.txt", "one")]);
        let store = tempfile::tempdir().unwrap();
        let snapshot = store.path().join("tree.snap");
        let args = ScanArgs { dirs: vec![dir.path().to_path_buf()], output: snapshot.clone(), description: None, concurrency: None };
        scan(args, &Config::default(), Vec::new()).await.unwrap();

        let mut out = Vec::new();
        show(&snapshot, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].ends_with(&format!(":{} [{}]", dir.path().display(), snapshot.display())));
        assert_eq!(lines[1], "2 files, 1 digests");
    }

    #[tokio::test]
    async fn test_missing_snapshot() {
        let err = compare(compare_args("/nonexistent/old.snap".into(), "/nonexistent/new.snap".into()), &Config::default(), Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(&*err, ErrorKind::Load(_)));
    }
}
