//! Row projection: [`TrialRecord`] → [`DeliveryRow`].

use crate::ambient::{Ambient, SystemAmbient};
use crate::record::TrialRecord;
use crate::row::DeliveryRow;

/// Project records using the system clock and client identifier for fallbacks.
pub fn project(records: &[TrialRecord]) -> Vec<DeliveryRow> {
  project_with(records, &SystemAmbient)
}

/// Project records, reading fallback values from `ambient`.
///
/// The output has the same length and order as `records`.
pub fn project_with(records: &[TrialRecord], ambient: &dyn Ambient) -> Vec<DeliveryRow> {
  records.iter().map(|r| project_one(r, ambient)).collect()
}

/// Project a single record.
pub fn project_one(record: &TrialRecord, ambient: &dyn Ambient) -> DeliveryRow {
  let timestamp = match record.timestamp() {
    Some(ts) => ts.to_string(),
    None => ambient.timestamp(),
  };

  let user_agent = match record.client_context() {
    Some(ua) => ua.to_string(),
    None => ambient.client_context(),
  };

  DeliveryRow {
    trial_index: record.trial_index,
    task: record.task().unwrap_or_default().to_string(),
    stimulus: record.stimulus().unwrap_or_default().to_string(),
    rating: record.rating().cloned(),
    rt: record.rt().cloned(),
    time_elapsed: record.elapsed_time(),
    timestamp,
    user_agent,
  }
}
