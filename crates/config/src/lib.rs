//! Layered configuration for snapdiff.
//!
//! Values are merged from, in increasing priority:
//! 1. built-in defaults;
//! 2. a configuration file: the one given explicitly, otherwise
//!    `<config dir>/snapdiff/config.toml` if it exists (TOML, YAML or JSON,
//!    chosen by extension);
//! 3. `SNAPDIFF_*` environment variables (`SNAPDIFF_CONCURRENCY=4`,
//!    `SNAPDIFF_EXCLUDE='["*.tmp"]'`).
//!
//! Command-line flags are applied on top by the binary.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::BaseDirs;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use snapdiff_compare::{ChangeKind, Excludes, Selection};
use snapdiff_snapshot::DEFAULT_CONCURRENCY;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "SNAPDIFF_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Glob patterns of paths to report as EXCLUDED instead of pairing them.
    pub exclude: Vec<String>,
    /// Kinds of change to report. `None` shows everything but IDENTICAL and
    /// EXCLUDED.
    pub show: Option<Vec<ChangeKind>>,
    /// Files read and hashed at the same time while scanning.
    pub concurrency: usize,
    /// Report DEDUPLICATED and DUPLICATED instead of DELETED and ADDED when
    /// the content still exists on the other side.
    pub track_duplicates: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self { exclude: Vec::new(), show: None, concurrency: DEFAULT_CONCURRENCY, track_duplicates: false }
    }
}

impl Config {
    /// Location of the configuration file used when none is given.
    pub fn default_path() -> Option<PathBuf> {
        BaseDirs::new().map(|dirs| dirs.config_dir().join("snapdiff").join("config.toml"))
    }

    /// Loads and validates the configuration.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(path)?.extract().map_err(|e| ErrorKind::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// The merged configuration layers, before extraction.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        let file = match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.is_file()),
        };
        if let Some(file) = file {
            tracing::debug!(path = %file.display(), "Loading configuration file");
            figment = match file.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref() {
                Some("toml") => figment.merge(Toml::file(&file)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(&file)),
                Some("json") => figment.merge(Json::file(&file)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(file)),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["config"])))
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            exn::bail!(ErrorKind::InvalidValue { field: "concurrency", reason: "must be at least 1".to_string() });
        }
        if let Err(e) = Excludes::new(&self.exclude) {
            exn::bail!(ErrorKind::InvalidValue { field: "exclude", reason: (*e).to_string() });
        }
        Ok(())
    }

    /// The exclusion patterns, compiled.
    pub fn excludes(&self) -> Result<Excludes> {
        Excludes::new(&self.exclude)
            .map_err(|e| ErrorKind::InvalidValue { field: "exclude", reason: (*e).to_string() }.into())
    }

    pub fn selection(&self) -> Selection {
        match &self.show {
            Some(kinds) => Selection::only(kinds.iter().copied()),
            None => Selection::default(),
        }
    }
}
