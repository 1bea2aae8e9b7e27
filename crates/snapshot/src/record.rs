use crate::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use snapdiff_storage::error::Result as StorageResult;
use snapdiff_storage::{FileInfo, StorageBackend, path_components};
use std::path::{Component, Path};
use tracing::instrument;

/// Content identity of a successfully read file.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    /// BLAKE3 digest of the full file contents, hex encoded.
    pub hash: String,
    /// File size in bytes.
    pub size: u64,
    /// Modification time in fractional seconds since the Unix epoch.
    pub mtime: f64,
}

/// Either the identity of a file, or the reason it couldn't be acquired.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordState {
    Identified(Identity),
    Failed(String),
}

/// One file of a snapshot.
///
/// The path is kept twice: joined with `/` (the lookup key, and the sort key
/// of reports) and as its component list (used to compare trailing path
/// segments when several files share a digest).
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    path: String,
    components: Vec<String>,
    state: RecordState,
}

impl FileRecord {
    pub fn new(components: impl IntoIterator<Item = impl Into<String>>, state: RecordState) -> Self {
        let components: Vec<String> = components.into_iter().map(Into::into).collect();
        Self { path: components.join("/"), components, state }
    }

    /// Convenience constructor for an identified record.
    pub fn identified(
        components: impl IntoIterator<Item = impl Into<String>>,
        hash: impl Into<String>,
        size: u64,
        mtime: f64,
    ) -> Self {
        Self::new(components, RecordState::Identified(Identity { hash: hash.into(), size, mtime }))
    }

    /// Convenience constructor for a record whose file could not be read.
    pub fn failed(components: impl IntoIterator<Item = impl Into<String>>, error: impl Into<String>) -> Self {
        Self::new(components, RecordState::Failed(error.into()))
    }

    /// Builds the record of the file at `path` (relative to the backend root).
    ///
    /// The file is stat-ed and read exactly once. Any failure along the way
    /// is stored on the record instead of being returned; the path is
    /// populated either way.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn build(backend: &dyn StorageBackend, path: &Path) -> Self {
        let state = match backend.stat(path).await {
            Ok(info) => Self::acquire(backend, &info).await,
            Err(e) => Err(e),
        };
        Self::from_acquisition(path, state)
    }

    /// Same as [`build`](Self::build), reusing the metadata the backend
    /// listing already reported so only the read remains.
    pub async fn build_listed(backend: &dyn StorageBackend, info: &FileInfo) -> Self {
        Self::from_acquisition(&info.path, Self::acquire(backend, info).await)
    }

    async fn acquire(backend: &dyn StorageBackend, info: &FileInfo) -> StorageResult<Identity> {
        let bytes = backend.read(&info.path).await?;
        Ok(Identity {
            hash: blake3::hash(&bytes).to_string(),
            size: bytes.len() as u64,
            mtime: info.modified_epoch(),
        })
    }

    fn from_acquisition(path: &Path, acquired: StorageResult<Identity>) -> Self {
        let components = path_components(path).unwrap_or_else(|_| {
            // Still record *something* recognisable for the report.
            path.components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect()
        });
        let state = match acquired {
            Ok(identity) => RecordState::Identified(identity),
            Err(e) => RecordState::Failed((*e).to_string()),
        };
        Self::new(components, state)
    }

    /// Relative path, components joined with `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn state(&self) -> &RecordState {
        &self.state
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            RecordState::Identified(identity) => Some(identity),
            RecordState::Failed(_) => None,
        }
    }

    pub fn hash(&self) -> Option<&str> {
        self.identity().map(|i| i.hash.as_str())
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            RecordState::Identified(_) => None,
            RecordState::Failed(e) => Some(e.as_str()),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, RecordState::Failed(_))
    }

    /// Whether both records were identified with the same digest.
    pub fn same_contents(&self, other: &Self) -> bool {
        matches!((self.hash(), other.hash()), (Some(a), Some(b)) if a == b)
    }

    /// Number of trailing path components both records have in common.
    pub fn common_suffix_len(&self, other: &Self) -> usize {
        self.components.iter().rev().zip(other.components.iter().rev()).take_while(|(a, b)| a == b).count()
    }
}

/// Persisted form of a [`FileRecord`]: one line of a snapshot file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordLine {
    pub filepath: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtime: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&FileRecord> for RecordLine {
    fn from(record: &FileRecord) -> Self {
        let filepath = record.components.clone();
        match &record.state {
            RecordState::Identified(Identity { hash, size, mtime }) => Self {
                filepath,
                hash: Some(hash.clone()),
                mtime: Some(*mtime),
                size: Some(*size),
                error: None,
            },
            RecordState::Failed(error) => Self {
                filepath,
                hash: None,
                mtime: None,
                size: None,
                error: Some(error.clone()),
            },
        }
    }
}

impl TryFrom<RecordLine> for FileRecord {
    type Error = Error;
    fn try_from(line: RecordLine) -> Result<Self, Self::Error> {
        // Each component must be one plain path segment, or two lines could
        // join to the same path.
        let segment = |c: &String| matches!(path_components(c).as_deref(), Ok([only]) if only == c);
        if line.filepath.is_empty() || !line.filepath.iter().all(segment) {
            exn::bail!(ErrorKind::InvalidRecord("filepath"));
        }
        let state = match (line.error, line.hash, line.mtime, line.size) {
            (Some(error), None, None, None) => RecordState::Failed(error),
            (Some(_), _, _, _) => exn::bail!(ErrorKind::InvalidRecord("both error and identity")),
            (None, Some(hash), Some(mtime), Some(size)) => RecordState::Identified(Identity { hash, size, mtime }),
            (None, None, _, _) => exn::bail!(ErrorKind::InvalidRecord("hash")),
            (None, _, None, _) => exn::bail!(ErrorKind::InvalidRecord("mtime")),
            (None, _, _, None) => exn::bail!(ErrorKind::InvalidRecord("size")),
        };
        Ok(Self::new(line.filepath, state))
    }
}
