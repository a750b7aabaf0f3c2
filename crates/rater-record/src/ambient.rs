//! Environment-derived values used as projection fallbacks.

use chrono::{DateTime, SecondsFormat, Utc};

/// Source of the "current" values a record may lack.
pub trait Ambient: Send + Sync {
  /// The current instant.
  fn now(&self) -> DateTime<Utc>;

  /// Identifier of the client producing the rows.
  fn client_context(&self) -> String;

  /// The current instant as an ISO-8601 string.
  fn timestamp(&self) -> String {
    format_timestamp(self.now())
  }
}

/// Format an instant the way trial timestamps are stored: UTC, millisecond
/// precision, `Z` suffix (e.g. `2024-01-01T00:00:05.000Z`).
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
  instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Reads the system clock and describes the running binary.
#[derive(Debug, Clone, Default)]
pub struct SystemAmbient;

impl Ambient for SystemAmbient {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }

  fn client_context(&self) -> String {
    format!(
      "rater/{} ({}; {})",
      env!("CARGO_PKG_VERSION"),
      std::env::consts::OS,
      std::env::consts::ARCH
    )
  }
}

/// Returns the same instant and client identifier on every call.
#[derive(Debug, Clone)]
pub struct FixedAmbient {
  pub now: DateTime<Utc>,
  pub client_context: String,
}

impl FixedAmbient {
  pub fn new(now: DateTime<Utc>, client_context: impl Into<String>) -> Self {
    Self {
      now,
      client_context: client_context.into(),
    }
  }
}

impl Ambient for FixedAmbient {
  fn now(&self) -> DateTime<Utc> {
    self.now
  }

  fn client_context(&self) -> String {
    self.client_context.clone()
  }
}
