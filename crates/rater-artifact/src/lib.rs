//! Rater Artifact
//!
//! This crate provides the artifact storage trait and implementations for rater.
//! Artifacts are the files a run hands to the participant for manual saving,
//! such as the CSV written when remote delivery cannot be confirmed.
//!
//! The [`Store`] trait defines the backend layer. [`FsStore`] writes into a
//! local directory; [`MemoryStore`] keeps artifacts in-process. Neither
//! performs network I/O.

mod fs;
mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;

/// Error type for artifact storage operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The requested artifact was not found.
  #[error("artifact not found: {0}")]
  NotFound(String),

  /// The key cannot be mapped to a storage location.
  #[error("invalid artifact key: {0}")]
  InvalidKey(String),

  /// An I/O error occurred.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// Where a stored artifact can be picked up from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactLocation {
  /// A file on the local filesystem.
  Path(PathBuf),
  /// Held in memory by the store that wrote it.
  Memory,
}

impl std::fmt::Display for ArtifactLocation {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Path(path) => write!(f, "{}", path.display()),
      Self::Memory => write!(f, "<memory>"),
    }
  }
}

/// Artifact storage trait.
#[async_trait]
pub trait Store: Send + Sync {
  /// Retrieve an artifact by key.
  async fn get(&self, key: &str) -> Result<Bytes, Error>;

  /// Store an artifact, replacing any previous one under the same key.
  async fn put(
    &self,
    key: &str,
    data: Bytes,
    content_type: &str,
  ) -> Result<ArtifactLocation, Error>;

  /// Delete an artifact by key.
  async fn delete(&self, key: &str) -> Result<(), Error>;
}

/// Reject keys that would escape the store root.
pub(crate) fn check_key(key: &str) -> Result<(), Error> {
  let escapes = key.split(['/', '\\']).any(|part| part == "..");
  if key.is_empty() || key.starts_with('/') || escapes {
    return Err(Error::InvalidKey(key.to_string()));
  }
  Ok(())
}
