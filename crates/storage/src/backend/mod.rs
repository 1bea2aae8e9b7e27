//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, the walker that snapshot
//! scans pull files from. The local filesystem is the only production
//! implementation; an in-memory backend is available for tests behind the
//! `mock` feature.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::error::Result;
use crate::models::FileInfo;
use async_trait::async_trait;
use futures::Stream;
use std::path::Path;
use std::pin::Pin;

pub type FileInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FileInfo>> + Send + 'a>>;

/// Unified interface for walking and reading a tree of files.
///
/// All paths are relative to the backend root and must be validated using
/// [`validate_path`](crate::validate_path) before use. Implementations should
/// enforce this validation.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use snapdiff_storage::{backend::StorageBackend, error::Result};
///
/// async fn readme_digest(backend: &dyn StorageBackend) -> Result<Option<String>> {
///     let path = Path::new("README.md");
///     if backend.stat(path).await?.size == 0 {
///         return Ok(None);
///     }
///     let bytes = backend.read(path).await?;
///     Ok(Some(format!("{} bytes", bytes.len())))
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the backend, used for logging only.
    fn name(&self) -> &str;

    /// Location the backend is rooted at. For the local filesystem this is
    /// the absolute root directory; snapshots record it as their provenance.
    fn root(&self) -> &Path;

    /// Stream metadata of every regular file below the root.
    ///
    /// Directories are descended recursively. An error item (an unreadable
    /// directory, say) does not end the stream; callers decide whether it is
    /// fatal.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::TryStreamExt;
    /// # use snapdiff_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// let mut stream = backend.list_stream();
    /// while let Some(info) = stream.try_next().await? {
    ///     println!("{}: {} bytes", info.path.display(), info.size);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    fn list_stream(&self) -> FileInfoStream<'_>;

    /// Read the complete file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Get file metadata without reading contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn stat(&self, path: &Path) -> Result<FileInfo>;
}
