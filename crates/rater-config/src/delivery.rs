use serde::{Deserialize, Serialize};

use crate::enums::DeliveryMode;

/// Endpoint values starting with this prefix are template leftovers, not real addresses.
pub const DEFAULT_PLACEHOLDER_PREFIX: &str = "PASTE_";

/// Settings for the single end-of-run delivery attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
  /// Address of the spreadsheet web app receiving the rows.
  /// Empty means "not configured".
  pub endpoint: String,

  pub mode: DeliveryMode,

  /// Upper bound on the send, in milliseconds.
  /// If not specified, the transport's own timeout applies.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub timeout_ms: Option<u64>,

  /// Endpoint prefixes treated as unconfigured.
  pub placeholder_prefixes: Vec<String>,

  /// Exact endpoint values treated as unconfigured.
  pub placeholder_values: Vec<String>,
}

impl Default for DeliveryConfig {
  fn default() -> Self {
    Self {
      endpoint: String::new(),
      mode: DeliveryMode::default(),
      timeout_ms: None,
      placeholder_prefixes: vec![DEFAULT_PLACEHOLDER_PREFIX.to_string()],
      placeholder_values: Vec::new(),
    }
  }
}

impl DeliveryConfig {
  /// Whether the endpoint is blank or a known placeholder.
  pub fn is_placeholder(&self) -> bool {
    let endpoint = self.endpoint.trim();
    endpoint.is_empty()
      || self
        .placeholder_prefixes
        .iter()
        .any(|prefix| !prefix.is_empty() && endpoint.starts_with(prefix.as_str()))
      || self.placeholder_values.iter().any(|value| value == endpoint)
  }
}

/// Where and how the local fallback artifact is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
  pub file_name: String,
  pub content_type: String,
}

impl Default for FallbackConfig {
  fn default() -> Self {
    Self {
      file_name: "data_fallback.csv".to_string(),
      content_type: "text/csv".to_string(),
    }
  }
}
