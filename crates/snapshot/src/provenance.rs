use crate::error::{ErrorKind, Result};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use time::{OffsetDateTime, UtcDateTime};
use time::macros::format_description;

/// Format version written to (and required from) the provenance line.
pub const SNAPSHOT_VERSION: u32 = 1;
/// Last format version hashing with SHA-1.
pub const LEGACY_VERSION: u32 = 0;

/// How, when and by whom a snapshot was captured.
///
/// Built once, by [`capture`](Self::capture) during a scan or from the first
/// line of a persisted snapshot, and never modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    version: u32,
    root: String,
    captured_at: f64,
    username: String,
    hostname: String,
    description: Option<String>,
    origin: Option<String>,
}

/// Persisted form of [`Provenance`]: the first line of a snapshot file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceLine {
    pub version: u32,
    pub rootdir: String,
    pub scan_ts: f64,
    pub username: String,
    pub hostname: String,
    pub description: Option<String>,
}

impl Provenance {
    /// Describes a capture of `root` happening now, by the current user on
    /// the current host.
    pub fn capture(root: &Path, description: Option<String>) -> Self {
        let hostname = match hostname::get() {
            Ok(name) => name.to_string_lossy().into_owned(),
            Err(e) => {
                tracing::debug!(error = %e, "Could not determine hostname");
                "unknown".to_string()
            },
        };
        Self {
            version: SNAPSHOT_VERSION,
            root: root.display().to_string(),
            captured_at: UtcDateTime::now().unix_timestamp_nanos() as f64 / 1_000_000_000.0,
            username: whoami::username(),
            hostname,
            description,
            origin: None,
        }
    }

    /// Rebuilds the provenance of a persisted snapshot read from `origin`.
    pub fn from_line(line: ProvenanceLine, origin: Option<String>) -> Result<Self> {
        match line.version {
            SNAPSHOT_VERSION => {},
            LEGACY_VERSION => exn::bail!(ErrorKind::LegacyDigest(line.version)),
            version => exn::bail!(ErrorKind::UnsupportedVersion(version)),
        }
        Ok(Self {
            version: line.version,
            root: line.rootdir,
            captured_at: line.scan_ts,
            username: line.username,
            hostname: line.hostname,
            description: line.description,
            origin,
        })
    }

    pub fn to_line(&self) -> ProvenanceLine {
        ProvenanceLine {
            version: self.version,
            rootdir: self.root.clone(),
            scan_ts: self.captured_at,
            username: self.username.clone(),
            hostname: self.hostname.clone(),
            description: self.description.clone(),
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Absolute root directory the snapshot was taken of.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Capture time in fractional seconds since the Unix epoch.
    pub fn captured_at(&self) -> f64 {
        self.captured_at
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Where the snapshot was loaded from; `None` when it was scanned in
    /// this process.
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }
}

impl Display for Provenance {
    /// `2024-03-01 12:00:00 UTC zan@nas:/srv/photos [photos.snap] (before cleanup)`
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
        let date = OffsetDateTime::from_unix_timestamp(self.captured_at.floor() as i64)
            .ok()
            .and_then(|ts| ts.format(format).ok());
        match date {
            Some(date) => write!(f, "{date} UTC")?,
            None => write!(f, "@{}", self.captured_at)?,
        }
        write!(f, " {}@{}:{}", self.username, self.hostname, self.root)?;
        match &self.origin {
            Some(origin) => write!(f, " [{origin}]")?,
            None => write!(f, " [scanned now]")?,
        }
        if let Some(description) = &self.description {
            write!(f, " ({description})")?;
        }
        Ok(())
    }
}
