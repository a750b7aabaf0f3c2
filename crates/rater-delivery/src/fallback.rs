//! Local CSV fallback for runs whose delivery could not be confirmed.

use std::collections::HashSet;

use bytes::Bytes;
use rater_artifact::{ArtifactLocation, Store};
use rater_config::FallbackConfig;
use rater_record::TrialRecord;
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::info;

use crate::error::FallbackError;

/// A stored fallback file, ready to be offered to the participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactHandle {
  /// Store key the file was written under.
  pub key: String,
  /// Suggested download name.
  pub file_name: String,
  pub content_type: String,
  #[serde(serialize_with = "serialize_location")]
  pub location: ArtifactLocation,
  /// Number of data rows (header excluded).
  pub rows: usize,
  pub bytes: usize,
}

fn serialize_location<S: Serializer>(
  location: &ArtifactLocation,
  serializer: S,
) -> Result<S::Ok, S::Error> {
  serializer.collect_str(location)
}

/// Writes every captured record to a CSV artifact.
///
/// Unlike the delivery rows, the CSV keeps every field each record carries,
/// including keys the delivery projection drops.
pub struct FallbackWriter<S: Store> {
  store: S,
  config: FallbackConfig,
  key_prefix: Option<String>,
}

impl<S: Store> FallbackWriter<S> {
  pub fn new(store: S, config: FallbackConfig) -> Self {
    Self {
      store,
      config,
      key_prefix: None,
    }
  }

  /// Store artifacts under `{prefix}/{file_name}` instead of `{file_name}`.
  pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.key_prefix = Some(prefix.into());
    self
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  /// Store key the next artifact will be written under.
  pub fn key(&self) -> String {
    match &self.key_prefix {
      Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), self.config.file_name),
      None => self.config.file_name.clone(),
    }
  }

  /// Render `records` as CSV and store the file.
  pub async fn write(&self, records: &[TrialRecord]) -> Result<ArtifactHandle, FallbackError> {
    let csv = render_csv(records)?;
    let bytes = csv.len();
    let key = self.key();

    let location = self
      .store
      .put(&key, Bytes::from(csv), &self.config.content_type)
      .await?;

    info!(
      key = %key,
      location = %location,
      rows = records.len(),
      bytes,
      "fallback artifact written"
    );

    Ok(ArtifactHandle {
      key,
      file_name: self.config.file_name.clone(),
      content_type: self.config.content_type.clone(),
      location,
      rows: records.len(),
      bytes,
    })
  }
}

/// Render records as comma-separated text.
///
/// The header is the union of every record's keys in first-seen order, keys
/// holding only `null` included. A record lacking a column, or holding `null`
/// in it, gets an empty cell. An empty slice renders as an empty document.
pub fn render_csv(records: &[TrialRecord]) -> Result<Vec<u8>, FallbackError> {
  let rows: Vec<Vec<(&str, Value)>> = records.iter().map(|r| r.captured_fields()).collect();

  let mut seen = HashSet::new();
  let mut header: Vec<&str> = Vec::new();
  for (key, _) in rows.iter().flatten() {
    if seen.insert(*key) {
      header.push(*key);
    }
  }

  let mut writer = csv::Writer::from_writer(Vec::new());
  if !rows.is_empty() {
    writer.write_record(&header)?;
  }

  for fields in &rows {
    let cells = header.iter().map(|column| {
      fields
        .iter()
        .find(|(key, _)| key == column)
        .map(|(_, value)| cell(value))
        .unwrap_or_default()
    });
    writer.write_record(cells)?;
  }

  writer.into_inner().map_err(|e| FallbackError::Flush {
    message: e.to_string(),
  })
}

fn cell(value: &Value) -> String {
  match value {
    Value::Null => String::new(),
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rater_artifact::MemoryStore;
  use serde_json::json;

  fn record(value: Value) -> TrialRecord {
    serde_json::from_value(value).unwrap()
  }

  fn render(records: &[TrialRecord]) -> String {
    String::from_utf8(render_csv(records).unwrap()).unwrap()
  }

  #[test]
  fn test_empty_records_render_empty_document() {
    assert_eq!(render(&[]), "");
  }

  #[test]
  fn test_header_is_union_in_first_seen_order() {
    let records = vec![
      record(json!({"trial_index": 0, "time_elapsed": 10, "trial_type": "preload"})),
      record(json!({
        "trial_index": 1, "task": "rating", "rating": 5, "rt": 900,
        "time_elapsed": 1000, "slider_start": 4
      })),
    ];

    let csv = render(&records);
    let mut lines = csv.lines();

    assert_eq!(
      lines.next(),
      Some("trial_index,time_elapsed,trial_type,task,rating,rt,slider_start")
    );
    assert_eq!(lines.next(), Some("0,10,preload,,,,"));
    assert_eq!(lines.next(), Some("1,1000,,rating,5,900,4"));
    assert_eq!(lines.next(), None);
  }

  #[test]
  fn test_null_only_columns_stay_in_header() {
    let records = vec![
      record(json!({
        "trial_index": 0, "trial_type": "html-button-response",
        "rt": null, "response": null, "time_elapsed": 10
      })),
      record(json!({"trial_index": 1, "trial_type": "preload", "time_elapsed": 20})),
    ];

    let csv = render(&records);
    let mut lines = csv.lines();

    assert_eq!(lines.next(), Some("trial_index,trial_type,rt,response,time_elapsed"));
    assert_eq!(lines.next(), Some("0,html-button-response,,,10"));
    assert_eq!(lines.next(), Some("1,preload,,,20"));
  }

  #[test]
  fn test_descriptive_names_keep_their_column() {
    let records = vec![record(json!({
      "trial_index": 0, "rating": 5, "response_value": 5,
      "elapsed_time": 300, "response_latency": 640
    }))];

    let csv = render(&records);
    let mut lines = csv.lines();

    assert_eq!(
      lines.next(),
      Some("trial_index,rating,response_value,elapsed_time,response_latency")
    );
    assert_eq!(lines.next(), Some("0,5,5,300,640"));
  }

  #[test]
  fn test_quotes_and_nested_values() {
    let records = vec![record(json!({
      "trial_index": 0,
      "time_elapsed": 5,
      "user_agent": "Mozilla/5.0 (X11, Linux)",
      "view_history": [{"page": 0}],
      "prompt": "say \"hi\""
    }))];

    let csv = render(&records);
    let data = csv.lines().nth(1).unwrap();

    assert!(data.contains("\"Mozilla/5.0 (X11, Linux)\""));
    assert!(data.contains("\"[{\"\"page\"\":0}]\""));
    assert!(data.contains("\"say \"\"hi\"\"\""));
  }

  #[tokio::test]
  async fn test_write_stores_under_prefixed_key() {
    let writer = FallbackWriter::new(MemoryStore::new(), FallbackConfig::default())
      .with_key_prefix("run-42/");

    let records = vec![record(json!({"trial_index": 0, "time_elapsed": 1}))];
    let handle = writer.write(&records).await.unwrap();

    assert_eq!(handle.key, "run-42/data_fallback.csv");
    assert_eq!(handle.file_name, "data_fallback.csv");
    assert_eq!(handle.content_type, "text/csv");
    assert_eq!(handle.location, ArtifactLocation::Memory);
    assert_eq!(handle.rows, 1);

    let stored = writer.store().get(&handle.key).await.unwrap();
    assert_eq!(stored.len(), handle.bytes);
    assert_eq!(
      writer.store().content_type(&handle.key).await.as_deref(),
      Some("text/csv")
    );
  }

  #[tokio::test]
  async fn test_write_empty_succeeds() {
    let writer = FallbackWriter::new(MemoryStore::new(), FallbackConfig::default());
    let handle = writer.write(&[]).await.unwrap();

    assert_eq!(handle.rows, 0);
    assert_eq!(handle.bytes, 0);
  }
}
