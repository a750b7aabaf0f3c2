//! Rater Config
//!
//! This crate contains the serializable study configuration types for rater.
//! A [`StudyConfig`] describes one rating study: where results are delivered,
//! which audio stimuli are rated, how the response slider behaves, and the
//! text shown on each screen.
//!
//! Configuration can be loaded from:
//! - JSON files (via CLI with `--config=study.json`)
//! - In-code construction (every field has a default matching the reference study)
//!
//! The engine takes a validated configuration and builds the run timeline and
//! the delivery pipeline from it. Nothing in the workspace reads configuration
//! from global state.

mod delivery;
mod enums;
mod error;
mod slider;
mod stimulus;
mod study;
mod texts;

pub use delivery::{DEFAULT_PLACEHOLDER_PREFIX, DeliveryConfig, FallbackConfig};
pub use enums::DeliveryMode;
pub use error::ConfigError;
pub use slider::SliderConfig;
pub use stimulus::Stimulus;
pub use study::StudyConfig;
pub use texts::UiTexts;
