//! In-memory storage backend for testing.

use super::FileInfoStream;
use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::models::FileInfo;
use crate::path::validate as validate_path;
use async_stream::stream;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use time::UtcDateTime;

/// In-memory storage backend for testing.
///
/// Files are stored in a `BTreeMap`, so listings come out sorted by path, and
/// are fixed once the backend is built. Paths marked
/// [unreadable](Self::with_unreadable) are listed and can be stat-ed, but
/// reading them fails with [`PermissionDenied`](ErrorKind::PermissionDenied).
///
/// # Examples
///
/// ```
/// use snapdiff_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([
///     ("dir/x.txt", b"hello"),
/// ]);
/// assert_eq!(backend.read(Path::new("dir/x.txt")).await?, b"hello");
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    root: PathBuf,
    storage: BTreeMap<PathBuf, (UtcDateTime, Vec<u8>)>,
    unreadable: BTreeSet<PathBuf>,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files, all sharing the same
    /// modification time.
    ///
    /// Panics if any path fails validation (e.g. path traversal). If test
    /// setup is wrong, then test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let now = UtcDateTime::now();
        Self::with_timed_files(files.into_iter().map(|(path, data)| (path, now, data)))
    }

    /// Create a mock backend pre-populated with files and explicit
    /// modification times.
    pub fn with_timed_files(
        files: impl IntoIterator<Item = (impl Into<PathBuf>, UtcDateTime, impl Into<Vec<u8>>)>,
    ) -> Self {
        let mut map = BTreeMap::new();
        for (path, modified, data) in files {
            map.insert(Self::validated(path.into()), (modified, data.into()));
        }
        Self {
            name: "mock".to_string(),
            root: PathBuf::from("/mock"),
            storage: map,
            unreadable: BTreeSet::new(),
        }
    }

    /// Change the root the mock backend reports.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Make reads of `path` fail, as if the file lost its permissions between
    /// being listed and being read.
    pub fn with_unreadable(mut self, path: impl Into<PathBuf>) -> Self {
        self.unreadable.insert(Self::validated(path.into()));
        self
    }

    fn validated(path: PathBuf) -> PathBuf {
        let Ok(validated) = validate_path(&path) else {
            // The panic here is DELIBERATE. MockBackend is intended to be
            // used in tests; panics are expected. There is no error result.
            panic!("MockBackend: invalid path {}", path.display());
        };
        validated
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn list_stream(&self) -> FileInfoStream<'_> {
        Box::pin(stream! {
            for (path, (modified, data)) in &self.storage {
                yield Ok(FileInfo::new(path.clone(), data.len() as u64, *modified));
            }
        })
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        if self.unreadable.contains(&path) {
            exn::bail!(ErrorKind::PermissionDenied(path));
        }
        let (_modified, data) = self.storage.get(&path).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path.clone())))?;
        Ok(data.clone())
    }

    async fn stat(&self, path: &Path) -> Result<FileInfo> {
        let path = validate_path(path)?;
        let (modified, data) = self.storage.get(&path).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path.clone())))?;
        Ok(FileInfo::new(path.clone(), data.len() as u64, *modified))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    async fn list(backend: &MockBackend) -> Vec<FileInfo> {
        backend.list_stream().try_collect().await.unwrap()
    }

    #[tokio::test]
    async fn test_read() {
        let backend = MockBackend::with_files([("test.txt", b"hello")]);
        assert_eq!(backend.read(Path::new("test.txt")).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_read_not_found() {
        let backend = MockBackend::default();
        let err = backend.read(Path::new("missing.txt")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unreadable() {
        let backend = MockBackend::with_files([("locked.txt", b"secret")]).with_unreadable("locked.txt");
        assert_eq!(list(&backend).await.len(), 1);
        assert_eq!(backend.stat(Path::new("locked.txt")).await.unwrap().size, 6);
        let err = backend.read(Path::new("locked.txt")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_list_sorted() {
        let backend = MockBackend::with_files([
            ("b/two.txt", Vec::from(*b"2")),
            ("a/one.txt", Vec::from(*b"1")),
            ("b/three.txt", Vec::from(*b"3")),
        ]);
        let all: Vec<_> = list(&backend).await.into_iter().map(|f| f.path).collect();
        assert_eq!(all, vec![PathBuf::from("a/one.txt"), PathBuf::from("b/three.txt"), PathBuf::from("b/two.txt")]);
    }

    #[tokio::test]
    async fn test_timed_files() {
        let modified = UtcDateTime::from_unix_timestamp(1_000).unwrap();
        let backend = MockBackend::with_timed_files([("x.txt", modified, Vec::from(*b"x"))]);
        assert_eq!(backend.stat(Path::new("x.txt")).await.unwrap().modified, modified);
    }

    #[test]
    #[should_panic(expected = "invalid path")]
    fn test_with_files_panics_on_bad_path() {
        MockBackend::with_files([("../escape", Vec::from(*b"bad"))]);
    }
}
