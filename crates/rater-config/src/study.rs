use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::delivery::{DeliveryConfig, FallbackConfig};
use crate::error::ConfigError;
use crate::slider::SliderConfig;
use crate::stimulus::Stimulus;
use crate::texts::UiTexts;

/// A complete rating study definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
  pub name: String,
  pub delivery: DeliveryConfig,
  /// Audio items, each rated exactly once per run in random order.
  pub stimuli: Vec<Stimulus>,
  pub slider: SliderConfig,
  pub texts: UiTexts,
  pub fallback: FallbackConfig,
}

impl Default for StudyConfig {
  fn default() -> Self {
    Self {
      name: "audio-rating".to_string(),
      delivery: DeliveryConfig::default(),
      stimuli: vec![
        Stimulus::new("assets/audio/amazed.wav"),
        Stimulus::new("assets/audio/sarcastic.wav"),
      ],
      slider: SliderConfig::default(),
      texts: UiTexts::default(),
      fallback: FallbackConfig::default(),
    }
  }
}

impl StudyConfig {
  /// Parse and validate a study from a JSON document.
  pub fn from_json(json: &str) -> Result<Self, ConfigError> {
    let config: Self = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
  }

  /// Read, parse and validate a study from a JSON file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.display().to_string(),
      source,
    })?;
    Self::from_json(&content)
  }

  /// Check the settings a run depends on.
  ///
  /// The endpoint is deliberately not checked here: an unconfigured endpoint
  /// is a valid study that always falls back to the local artifact.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.stimuli.is_empty() {
      return Err(ConfigError::invalid("stimuli", "at least one stimulus is required"));
    }
    if let Some(pos) = self.stimuli.iter().position(|s| s.file.trim().is_empty()) {
      return Err(ConfigError::invalid(
        format!("stimuli[{}].file", pos),
        "file must not be empty",
      ));
    }
    self.slider.validate()?;
    if self.fallback.file_name.trim().is_empty() {
      return Err(ConfigError::invalid("fallback.file_name", "file name must not be empty"));
    }
    Ok(())
  }

  /// Stimulus files in configuration order, as handed to the audio preloader.
  pub fn audio_files(&self) -> Vec<String> {
    self.stimuli.iter().map(|s| s.file.clone()).collect()
  }
}
