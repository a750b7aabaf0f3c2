use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Likert-style slider settings for rating trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliderConfig {
  pub min: i64,
  pub max: i64,
  pub step: i64,
  /// Initial handle position.
  pub start: i64,
  /// Participant must move the handle before continuing.
  pub require_movement: bool,
  /// Tick labels shown under the slider, left to right.
  pub labels: Vec<String>,
}

impl Default for SliderConfig {
  fn default() -> Self {
    Self {
      min: 1,
      max: 7,
      step: 1,
      start: 4,
      require_movement: true,
      labels: (1..=7).map(|n| n.to_string()).collect(),
    }
  }
}

impl SliderConfig {
  pub(crate) fn validate(&self) -> Result<(), ConfigError> {
    if self.min >= self.max {
      return Err(ConfigError::invalid(
        "slider.min",
        format!("min ({}) must be less than max ({})", self.min, self.max),
      ));
    }
    if self.step <= 0 {
      return Err(ConfigError::invalid("slider.step", "step must be positive"));
    }
    if self.start < self.min || self.start > self.max {
      return Err(ConfigError::invalid(
        "slider.start",
        format!(
          "start ({}) must lie within [{}, {}]",
          self.start, self.min, self.max
        ),
      ));
    }
    if self.labels.is_empty() {
      return Err(ConfigError::invalid("slider.labels", "at least one label is required"));
    }
    Ok(())
  }
}
