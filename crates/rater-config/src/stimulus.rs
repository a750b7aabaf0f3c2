use serde::{Deserialize, Serialize};

/// A single audio item to be rated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stimulus {
  /// Path of the audio file relative to the study root, e.g. "assets/audio/amazed.wav"
  pub file: String,
}

impl Stimulus {
  pub fn new(file: impl Into<String>) -> Self {
    Self { file: file.into() }
  }
}
