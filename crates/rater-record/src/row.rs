use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical row shape sent to the remote store.
///
/// Serializes with exactly the keys in [`DeliveryRow::FIELDS`], in that order.
/// An absent `rating` or `rt` is written as `null`. Both keep the JSON value
/// the trial captured, so an integer latency stays an integer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRow {
  pub trial_index: u64,
  pub task: String,
  pub stimulus: String,
  pub rating: Option<Value>,
  pub rt: Option<Value>,
  pub time_elapsed: u64,
  pub timestamp: String,
  pub user_agent: String,
}

impl DeliveryRow {
  /// Column names expected by the receiving sheet.
  pub const FIELDS: [&'static str; 8] = [
    "trial_index",
    "task",
    "stimulus",
    "rating",
    "rt",
    "time_elapsed",
    "timestamp",
    "user_agent",
  ];
}
