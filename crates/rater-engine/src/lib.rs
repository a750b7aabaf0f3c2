//! Rater Engine
//!
//! This crate ties a rating run together. It builds the plan handed to the
//! presentation engine, holds the records that engine produces, and runs the
//! end-of-run delivery sequence.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Timeline                            │
//! │  - preload, welcome, shuffled rating block, end             │
//! │  - per-trial metadata (task, stimulus_file)                 │
//! └─────────────────────────────────────────────────────────────┘
//!                               │  presentation engine runs it
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       TrialBuffer                           │
//! │  - append-only, single writer                               │
//! │  - finish() → immutable RunSnapshot                         │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 RunCompletionController                     │
//! │  - project → deliver once → fallback CSV if Failed          │
//! │  - emits RunEvents through a RunNotifier                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use rater_engine::{RunCompletionController, TrialBuffer};
//! use rater_artifact::FsStore;
//! use tokio_util::sync::CancellationToken;
//!
//! let mut buffer = TrialBuffer::new();
//! for record in records {
//!     buffer.push(record)?;
//! }
//!
//! let controller = RunCompletionController::http(&config, FsStore::new("out"))?;
//! let completion = controller.complete(buffer.finish(), CancellationToken::new()).await?;
//! if let Some(handle) = completion.fallback {
//!     println!("save your data: {}", handle.location);
//! }
//! ```

mod buffer;
mod controller;
mod events;
mod timeline;

pub use buffer::{RecordError, RunSnapshot, TrialBuffer, enrich_rating_trial};
pub use controller::{CompletionError, RunCompletion, RunCompletionController};
pub use events::{ChannelNotifier, LogNotifier, NoopNotifier, RunEvent, RunNotifier};
pub use timeline::{ButtonScreen, RATING_TASK, RatingTrial, Screen, Timeline, TrialMetadata};
