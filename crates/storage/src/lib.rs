//! Directory walking and file access for snapshot scans.
//!
//! A [`StorageBackend`] enumerates every regular file below its root and
//! hands out their bytes and metadata. Which entries count as "regular files"
//! (symlinks, sockets, devices) is decided here and nowhere else.

pub mod backend;
pub mod error;
mod models;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::models::FileInfo;
pub use crate::path::{components as path_components, validate as validate_path};
