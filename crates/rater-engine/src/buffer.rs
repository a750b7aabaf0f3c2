//! Append-only record accumulation for a single run.

use std::sync::Arc;

use rater_record::{Ambient, TrialRecord, keys};

/// Errors raised while accumulating trial records.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
  /// Trial indices must strictly increase within a run.
  #[error("trial index {next} does not follow {previous}")]
  NonIncreasingIndex { previous: u64, next: u64 },
}

/// Records of a run in progress.
///
/// The buffer is the only writer while the run is live. [`finish`](Self::finish)
/// consumes it, so no record can be added or changed once a snapshot exists.
#[derive(Debug)]
pub struct TrialBuffer {
  run_id: String,
  records: Vec<TrialRecord>,
}

impl Default for TrialBuffer {
  fn default() -> Self {
    Self::new()
  }
}

impl TrialBuffer {
  /// Start a run with a fresh random ID.
  pub fn new() -> Self {
    Self::with_run_id(uuid::Uuid::new_v4().to_string())
  }

  pub fn with_run_id(run_id: impl Into<String>) -> Self {
    Self {
      run_id: run_id.into(),
      records: Vec::new(),
    }
  }

  pub fn run_id(&self) -> &str {
    &self.run_id
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  /// Append a completed trial.
  pub fn push(&mut self, record: TrialRecord) -> Result<(), RecordError> {
    if let Some(previous) = self.records.last().map(|r| r.trial_index) {
      if record.trial_index <= previous {
        return Err(RecordError::NonIncreasingIndex {
          previous,
          next: record.trial_index,
        });
      }
    }
    self.records.push(record);
    Ok(())
  }

  /// Append a completed rating trial after applying its completion hook.
  pub fn push_rating(
    &mut self,
    mut record: TrialRecord,
    ambient: &dyn Ambient,
  ) -> Result<(), RecordError> {
    enrich_rating_trial(&mut record, ambient);
    self.push(record)
  }

  /// End the run and freeze its records.
  pub fn finish(self) -> RunSnapshot {
    RunSnapshot {
      run_id: self.run_id,
      records: self.records.into(),
    }
  }
}

/// Completion hook for rating trials, run when the trial ends.
///
/// Copies the raw slider response into `rating` when the trial has none,
/// prefers the stimulus file attached as metadata over the presented
/// stimulus, and stamps the capture instant and client identifier unless the
/// record already carries them.
pub fn enrich_rating_trial(record: &mut TrialRecord, ambient: &dyn Ambient) {
  if record.first_present(&[keys::RATING, keys::RESPONSE_VALUE]).is_none() {
    if let Some(response) = record.get(keys::RESPONSE).cloned() {
      record.set(keys::RATING, response);
    }
  }

  if let Some(file) = record.stimulus_file().map(str::to_string) {
    record.set(keys::STIMULUS, file);
  }

  if record.client_context().is_none() {
    record.set(keys::USER_AGENT, ambient.client_context());
  }
  if record.timestamp().is_none() {
    record.set(keys::TIMESTAMP, ambient.timestamp());
  }
}

/// The immutable record set of a finished run.
///
/// Cheap to clone; every clone shares the same records.
#[derive(Debug, Clone)]
pub struct RunSnapshot {
  run_id: String,
  records: Arc<[TrialRecord]>,
}

impl RunSnapshot {
  /// Build a snapshot from records captured elsewhere (e.g. an exported file).
  ///
  /// Records pass through the same ordering check as [`TrialBuffer::push`].
  pub fn from_records(
    run_id: impl Into<String>,
    records: Vec<TrialRecord>,
  ) -> Result<Self, RecordError> {
    let mut buffer = TrialBuffer::with_run_id(run_id);
    for record in records {
      buffer.push(record)?;
    }
    Ok(buffer.finish())
  }

  pub fn run_id(&self) -> &str {
    &self.run_id
  }

  pub fn records(&self) -> &[TrialRecord] {
    &self.records
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }
}
