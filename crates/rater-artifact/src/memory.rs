use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::{ArtifactLocation, Error, Store, check_key};

/// A stored artifact and the content type it was written with.
#[derive(Debug, Clone)]
struct Entry {
  data: Bytes,
  content_type: String,
}

/// In-process artifact store.
///
/// Useful for tests and for embedding hosts that hand the bytes to the user
/// themselves.
#[derive(Debug, Default)]
pub struct MemoryStore {
  entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of stored artifacts.
  pub async fn len(&self) -> usize {
    self.entries.read().await.len()
  }

  pub async fn is_empty(&self) -> bool {
    self.entries.read().await.is_empty()
  }

  /// Content type recorded for `key`, if present.
  pub async fn content_type(&self, key: &str) -> Option<String> {
    self
      .entries
      .read()
      .await
      .get(key)
      .map(|e| e.content_type.clone())
  }
}

#[async_trait]
impl Store for MemoryStore {
  async fn get(&self, key: &str) -> Result<Bytes, Error> {
    self
      .entries
      .read()
      .await
      .get(key)
      .map(|e| e.data.clone())
      .ok_or_else(|| Error::NotFound(key.to_string()))
  }

  async fn put(
    &self,
    key: &str,
    data: Bytes,
    content_type: &str,
  ) -> Result<ArtifactLocation, Error> {
    check_key(key)?;
    self.entries.write().await.insert(
      key.to_string(),
      Entry {
        data,
        content_type: content_type.to_string(),
      },
    );
    Ok(ArtifactLocation::Memory)
  }

  async fn delete(&self, key: &str) -> Result<(), Error> {
    self
      .entries
      .write()
      .await
      .remove(key)
      .map(|_| ())
      .ok_or_else(|| Error::NotFound(key.to_string()))
  }
}
