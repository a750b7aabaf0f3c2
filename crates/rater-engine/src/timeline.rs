//! The ordered plan of screens for one run.

use rand::Rng;
use rand::seq::SliceRandom;
use rater_config::{SliderConfig, StudyConfig};
use serde::{Deserialize, Serialize};

/// Task label attached to every rating trial.
pub const RATING_TASK: &str = "rating";

/// Metadata attached to a trial and echoed back in its record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialMetadata {
  pub task: String,
  pub stimulus_file: String,
}

/// A text screen dismissed with a button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonScreen {
  pub title: String,
  pub body: String,
  pub choices: Vec<String>,
}

/// Play one audio stimulus and collect a slider rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingTrial {
  pub stimulus: String,
  pub prompt: String,
  pub left_label: String,
  pub right_label: String,
  pub slider: SliderConfig,
  /// Keeps response latency comparable across trials.
  pub response_allowed_while_playing: bool,
  pub data: TrialMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Screen {
  /// Fetch every audio file before the first trial.
  Preload { audio: Vec<String> },
  Welcome(ButtonScreen),
  /// Rating trials in presentation order.
  RatingBlock { trials: Vec<RatingTrial> },
  End(ButtonScreen),
}

/// Run plan: preload, welcome, rating block, end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
  pub screens: Vec<Screen>,
}

impl Timeline {
  /// Build the plan for `config`, sampling the rating order from `rng`.
  ///
  /// Every stimulus appears exactly once in the rating block.
  pub fn build<R: Rng + ?Sized>(config: &StudyConfig, rng: &mut R) -> Self {
    let texts = &config.texts;

    let mut trials: Vec<RatingTrial> = config
      .stimuli
      .iter()
      .map(|stimulus| RatingTrial {
        stimulus: stimulus.file.clone(),
        prompt: texts.prompt.clone(),
        left_label: texts.left_label.clone(),
        right_label: texts.right_label.clone(),
        slider: config.slider.clone(),
        response_allowed_while_playing: false,
        data: TrialMetadata {
          task: RATING_TASK.to_string(),
          stimulus_file: stimulus.file.clone(),
        },
      })
      .collect();
    trials.shuffle(rng);

    let screens = vec![
      Screen::Preload {
        audio: config.audio_files(),
      },
      Screen::Welcome(ButtonScreen {
        title: texts.welcome_title.clone(),
        body: texts.welcome_body.clone(),
        choices: vec![texts.start_button.clone()],
      }),
      Screen::RatingBlock { trials },
      Screen::End(ButtonScreen {
        title: texts.end_title.clone(),
        body: texts.end_body.clone(),
        choices: vec![texts.finish_button.clone()],
      }),
    ];

    Self { screens }
  }

  /// Rating trials in presentation order.
  pub fn rating_trials(&self) -> &[RatingTrial] {
    self
      .screens
      .iter()
      .find_map(|screen| match screen {
        Screen::RatingBlock { trials } => Some(trials.as_slice()),
        _ => None,
      })
      .unwrap_or_default()
  }

  /// Number of trial records a completed run produces.
  pub fn expected_records(&self) -> usize {
    self
      .screens
      .iter()
      .map(|screen| match screen {
        Screen::RatingBlock { trials } => trials.len(),
        _ => 1,
      })
      .sum()
  }
}
