use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names the presentation engine writes, plus the descriptive names some
/// exports carry instead.
pub mod keys {
  pub const TRIAL_INDEX: &str = "trial_index";
  pub const TASK: &str = "task";
  pub const STIMULUS: &str = "stimulus";
  pub const STIMULUS_FILE: &str = "stimulus_file";
  pub const RATING: &str = "rating";
  pub const RESPONSE_VALUE: &str = "response_value";
  pub const RESPONSE: &str = "response";
  pub const RT: &str = "rt";
  pub const RESPONSE_LATENCY: &str = "response_latency";
  pub const TIME_ELAPSED: &str = "time_elapsed";
  pub const ELAPSED_TIME: &str = "elapsed_time";
  pub const TIMESTAMP: &str = "timestamp";
  pub const USER_AGENT: &str = "user_agent";
  pub const CLIENT_CONTEXT: &str = "client_context";
}

/// One completed trial, as accumulated by the presentation engine.
///
/// Only `trial_index` is typed. Every other key is kept verbatim in `fields`,
/// in the order the record carried it, including explicit `null`s. The
/// accessors resolve the engine key first and the descriptive name second.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
  /// Ordinal position in the run.
  pub trial_index: u64,

  /// Every other key the trial captured.
  #[serde(flatten)]
  pub fields: Map<String, Value>,
}

impl TrialRecord {
  pub fn new(trial_index: u64, elapsed_time: u64) -> Self {
    Self::with_index(trial_index).with(keys::TIME_ELAPSED, elapsed_time)
  }

  /// A record with no captured fields.
  pub fn with_index(trial_index: u64) -> Self {
    Self {
      trial_index,
      fields: Map::new(),
    }
  }

  pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
    self.set(key, value);
    self
  }

  /// Store `value` under `key`, returning the previous value.
  pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Option<Value> {
    self.fields.insert(key.to_string(), value.into())
  }

  /// Raw value under `key`, an explicit `null` included.
  pub fn get(&self, key: &str) -> Option<&Value> {
    self.fields.get(key)
  }

  /// First value under `candidates` that is not `null`.
  pub fn first_present(&self, candidates: &[&str]) -> Option<&Value> {
    candidates
      .iter()
      .filter_map(|key| self.fields.get(*key))
      .find(|value| !value.is_null())
  }

  /// First non-empty string under `candidates`.
  pub fn first_text(&self, candidates: &[&str]) -> Option<&str> {
    candidates
      .iter()
      .filter_map(|key| self.fields.get(*key))
      .filter_map(Value::as_str)
      .find(|text| !text.is_empty())
  }

  pub fn task(&self) -> Option<&str> {
    self.first_text(&[keys::TASK])
  }

  /// Presented stimulus, falling back to the attached stimulus file.
  pub fn stimulus(&self) -> Option<&str> {
    self.first_text(&[keys::STIMULUS, keys::STIMULUS_FILE])
  }

  pub fn stimulus_file(&self) -> Option<&str> {
    self.first_text(&[keys::STIMULUS_FILE])
  }

  /// Post-processed answer, or the raw response when there is none.
  pub fn rating(&self) -> Option<&Value> {
    self.first_present(&[keys::RATING, keys::RESPONSE_VALUE, keys::RESPONSE])
  }

  /// Response latency in ms, as captured.
  pub fn rt(&self) -> Option<&Value> {
    self.first_present(&[keys::RT, keys::RESPONSE_LATENCY])
  }

  /// Milliseconds from run start to trial completion; 0 when not captured.
  pub fn elapsed_time(&self) -> u64 {
    self
      .first_present(&[keys::TIME_ELAPSED, keys::ELAPSED_TIME])
      .and_then(|value| {
        value
          .as_u64()
          .or_else(|| value.as_f64().filter(|ms| *ms >= 0.0).map(|ms| ms as u64))
      })
      .unwrap_or_default()
  }

  pub fn timestamp(&self) -> Option<&str> {
    self.first_text(&[keys::TIMESTAMP])
  }

  pub fn client_context(&self) -> Option<&str> {
    self.first_text(&[keys::USER_AGENT, keys::CLIENT_CONTEXT])
  }

  /// All captured fields as `(key, value)` pairs: `trial_index` first, then
  /// every other key in capture order. Null values are kept.
  pub fn captured_fields(&self) -> Vec<(&str, Value)> {
    let mut fields = Vec::with_capacity(1 + self.fields.len());
    fields.push((keys::TRIAL_INDEX, Value::from(self.trial_index)));
    fields.extend(self.fields.iter().map(|(k, v)| (k.as_str(), v.clone())));
    fields
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn record(value: Value) -> TrialRecord {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn test_deserialize_engine_keys() {
    let record = record(json!({
      "trial_index": 3,
      "trial_type": "audio-slider-response",
      "task": "rating",
      "stimulus": "assets/audio/amazed.wav",
      "stimulus_file": "assets/audio/amazed.wav",
      "response": 6,
      "rating": 6,
      "rt": 1834.5,
      "time_elapsed": 9120,
      "timestamp": "2024-01-01T00:00:00.000Z",
      "user_agent": "Mozilla/5.0",
      "slider_start": 4
    }));

    assert_eq!(record.trial_index, 3);
    assert_eq!(record.task(), Some("rating"));
    assert_eq!(record.rating(), Some(&json!(6)));
    assert_eq!(record.rt(), Some(&json!(1834.5)));
    assert_eq!(record.elapsed_time(), 9120);
    assert_eq!(record.client_context(), Some("Mozilla/5.0"));
    assert_eq!(record.fields["trial_type"], "audio-slider-response");
    assert_eq!(record.fields["slider_start"], 4);
  }

  #[test]
  fn test_descriptive_names_resolve_and_keep_their_key() {
    let record = record(json!({
      "trial_index": 0,
      "response_value": "yes",
      "response_latency": 250,
      "elapsed_time": 1200,
      "client_context": "cli"
    }));

    assert_eq!(record.rating(), Some(&json!("yes")));
    assert_eq!(record.rt(), Some(&json!(250)));
    assert_eq!(record.elapsed_time(), 1200);
    assert_eq!(record.client_context(), Some("cli"));
    assert!(record.get("response_value").is_some());
    assert!(record.get("rating").is_none());
  }

  #[test]
  fn test_engine_key_and_descriptive_name_together() {
    let record = record(json!({
      "trial_index": 0,
      "rating": 5,
      "response_value": 4,
      "rt": 900,
      "response_latency": 901,
      "time_elapsed": 1
    }));

    assert_eq!(record.rating(), Some(&json!(5)));
    assert_eq!(record.rt(), Some(&json!(900)));
    assert_eq!(record.fields.len(), 5);
  }

  #[test]
  fn test_nulls_are_kept_but_not_present() {
    let record = record(json!({
      "trial_index": 1,
      "rating": null,
      "response": null,
      "rt": null,
      "time_elapsed": 500
    }));

    assert_eq!(record.rating(), None);
    assert_eq!(record.rt(), None);
    assert_eq!(record.get("rt"), Some(&Value::Null));
  }

  #[test]
  fn test_integer_rt_stays_integer() {
    let record = record(json!({"trial_index": 0, "rt": 900, "time_elapsed": 10}));

    let json = serde_json::to_string(&record).unwrap();
    assert_eq!(json, r#"{"trial_index":0,"rt":900,"time_elapsed":10}"#);
  }

  #[test]
  fn test_fractional_elapsed_time_truncates() {
    let record = TrialRecord::with_index(0).with(keys::ELAPSED_TIME, 12.9);
    assert_eq!(record.elapsed_time(), 12);
  }

  #[test]
  fn test_captured_fields_keep_capture_order_and_nulls() {
    let record = TrialRecord::new(2, 3000)
      .with("trial_type", "html-button-response")
      .with(keys::RT, Value::Null)
      .with(keys::RESPONSE, 4);

    let keys: Vec<&str> = record.captured_fields().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["trial_index", "time_elapsed", "trial_type", "rt", "response"]);
  }
}
