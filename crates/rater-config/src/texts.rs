use serde::{Deserialize, Serialize};

/// Participant-facing text for every screen of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiTexts {
  pub welcome_title: String,
  pub welcome_body: String,
  pub start_button: String,
  /// Question shown above the slider on every rating trial.
  pub prompt: String,
  pub left_label: String,
  pub right_label: String,
  pub end_title: String,
  pub end_body: String,
  pub finish_button: String,
}

impl Default for UiTexts {
  fn default() -> Self {
    Self {
      welcome_title: "Audio Rating Task".to_string(),
      welcome_body: "You will hear short sounds and rate them on a scale.".to_string(),
      start_button: "Start".to_string(),
      prompt: "How strongly did this sound match the \u{201c}sarcastic\u{201d} category?".to_string(),
      left_label: "Not at all".to_string(),
      right_label: "Very strongly".to_string(),
      end_title: "Thanks!".to_string(),
      end_body: "Your data have been prepared. If upload fails, use the CSV button.".to_string(),
      finish_button: "Finish".to_string(),
    }
  }
}
