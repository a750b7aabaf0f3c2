//! Run events and notifiers for observability.
//!
//! Events are emitted while a run completes so consumers can log progress,
//! show the fallback download, or persist the outcome.

use rater_delivery::{ArtifactHandle, Confirmation, DeliveryError};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Events emitted during run completion, in order.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
  /// The record buffer was frozen.
  RunFinished { run_id: String, records: usize },

  /// The delivery attempt is starting.
  DeliveryStarted { run_id: String, rows: usize },

  /// The delivery attempt succeeded.
  Delivered {
    run_id: String,
    confirmation: Confirmation,
  },

  /// The delivery attempt failed; a fallback follows.
  DeliveryFailed { run_id: String, error: DeliveryError },

  /// The fallback artifact is ready for the participant to save.
  FallbackWritten {
    run_id: String,
    handle: ArtifactHandle,
  },
}

/// Trait for receiving run events.
pub trait RunNotifier: Send + Sync {
  /// Called when a run event occurs.
  fn notify(&self, event: RunEvent);
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl RunNotifier for NoopNotifier {
  fn notify(&self, _event: RunEvent) {}
}

/// A notifier that sends events to an unbounded channel.
///
/// A run emits at most four events, so the channel cannot grow unbounded in
/// practice.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<RunEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<RunEvent>) -> Self {
    Self { sender }
  }
}

impl RunNotifier for ChannelNotifier {
  fn notify(&self, event: RunEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}

/// A notifier that writes each event to the tracing subscriber.
///
/// The fallback event is logged at `warn` so the save location stands out
/// in console output.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl RunNotifier for LogNotifier {
  fn notify(&self, event: RunEvent) {
    match event {
      RunEvent::RunFinished { run_id, records } => {
        info!(run_id = %run_id, records, "run finished");
      }
      RunEvent::DeliveryStarted { run_id, rows } => {
        info!(run_id = %run_id, rows, "delivery started");
      }
      RunEvent::Delivered {
        run_id,
        confirmation,
      } => {
        info!(run_id = %run_id, confirmation = ?confirmation, "rows delivered");
      }
      RunEvent::DeliveryFailed { run_id, error } => {
        warn!(run_id = %run_id, error = %error, "delivery failed, writing fallback");
      }
      RunEvent::FallbackWritten { run_id, handle } => {
        warn!(
          run_id = %run_id,
          file_name = %handle.file_name,
          location = %handle.location,
          rows = handle.rows,
          "fallback artifact ready, save it manually"
        );
      }
    }
  }
}
