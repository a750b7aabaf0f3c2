//! End-of-run sequencing: project, deliver once, fall back if needed.

use std::sync::Arc;

use rater_artifact::Store;
use rater_config::StudyConfig;
use rater_delivery::{
  ArtifactHandle, DeliveryOrchestrator, DeliveryOutcome, FallbackError, FallbackWriter,
  HttpTransport, Transport, TransportError,
};
use rater_record::{Ambient, SystemAmbient, project_with};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, instrument};

use crate::buffer::RunSnapshot;
use crate::events::{NoopNotifier, RunEvent, RunNotifier};

/// Errors that stop a run from completing safely.
///
/// Delivery failures are not errors; they trigger the fallback. Only a failed
/// fallback leaves the run's data unprotected.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
  #[error("fallback artifact could not be written for run '{run_id}'")]
  Fallback {
    run_id: String,
    #[source]
    source: FallbackError,
  },
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunCompletion {
  pub run_id: String,
  pub outcome: DeliveryOutcome,
  /// Number of rows projected and offered for delivery.
  pub rows: usize,
  /// Present exactly when the outcome is `Failed`.
  pub fallback: Option<ArtifactHandle>,
}

/// Runs the end-of-run sequence exactly once.
///
/// Generic over `N: RunNotifier` to allow different notification strategies.
/// [`complete`](Self::complete) consumes the controller, so a second delivery
/// attempt for the same run is not expressible.
pub struct RunCompletionController<T: Transport, S: Store, N: RunNotifier = NoopNotifier> {
  orchestrator: DeliveryOrchestrator<T>,
  fallback: FallbackWriter<S>,
  ambient: Arc<dyn Ambient>,
  notifier: N,
}

impl<S: Store> RunCompletionController<HttpTransport, S, NoopNotifier> {
  /// Build the production pipeline for `config`, writing fallbacks to `store`.
  pub fn http(config: &StudyConfig, store: S) -> Result<Self, TransportError> {
    let orchestrator = DeliveryOrchestrator::http(config.delivery.clone())?;
    let fallback = FallbackWriter::new(store, config.fallback.clone());
    Ok(Self::new(orchestrator, fallback))
  }
}

impl<T: Transport, S: Store> RunCompletionController<T, S, NoopNotifier> {
  pub fn new(orchestrator: DeliveryOrchestrator<T>, fallback: FallbackWriter<S>) -> Self {
    Self::with_notifier(orchestrator, fallback, NoopNotifier)
  }
}

impl<T: Transport, S: Store, N: RunNotifier> RunCompletionController<T, S, N> {
  pub fn with_notifier(
    orchestrator: DeliveryOrchestrator<T>,
    fallback: FallbackWriter<S>,
    notifier: N,
  ) -> Self {
    Self {
      orchestrator,
      fallback,
      ambient: Arc::new(SystemAmbient),
      notifier,
    }
  }

  /// Replace the notifier, keeping everything else.
  pub fn notify_with<M: RunNotifier>(self, notifier: M) -> RunCompletionController<T, S, M> {
    RunCompletionController {
      orchestrator: self.orchestrator,
      fallback: self.fallback,
      ambient: self.ambient,
      notifier,
    }
  }

  /// Source of fallback timestamps and client identifier during projection.
  pub fn with_ambient(mut self, ambient: Arc<dyn Ambient>) -> Self {
    self.ambient = ambient;
    self
  }

  /// Complete the run: project, attempt delivery, and write the fallback
  /// artifact if delivery failed.
  ///
  /// The fallback is only written after the delivery outcome is known.
  #[instrument(
    name = "run_complete",
    skip(self, snapshot, cancel),
    fields(run_id = %snapshot.run_id(), records = snapshot.len())
  )]
  pub async fn complete(
    self,
    snapshot: RunSnapshot,
    cancel: CancellationToken,
  ) -> Result<RunCompletion, CompletionError> {
    let run_id = snapshot.run_id().to_string();

    self.notifier.notify(RunEvent::RunFinished {
      run_id: run_id.clone(),
      records: snapshot.len(),
    });

    let rows = project_with(snapshot.records(), self.ambient.as_ref());

    self.notifier.notify(RunEvent::DeliveryStarted {
      run_id: run_id.clone(),
      rows: rows.len(),
    });

    let outcome = self.orchestrator.deliver(&rows, &cancel).await;

    let fallback = match &outcome {
      DeliveryOutcome::Delivered { confirmation } => {
        self.notifier.notify(RunEvent::Delivered {
          run_id: run_id.clone(),
          confirmation: *confirmation,
        });
        None
      }
      DeliveryOutcome::Failed { error } => {
        self.notifier.notify(RunEvent::DeliveryFailed {
          run_id: run_id.clone(),
          error: error.clone(),
        });

        let handle = self
          .fallback
          .write(snapshot.records())
          .await
          .map_err(|source| {
            error!(run_id = %run_id, error = %source, "fallback artifact failed");
            CompletionError::Fallback {
              run_id: run_id.clone(),
              source,
            }
          })?;

        self.notifier.notify(RunEvent::FallbackWritten {
          run_id: run_id.clone(),
          handle: handle.clone(),
        });
        Some(handle)
      }
    };

    Ok(RunCompletion {
      run_id,
      outcome,
      rows: rows.len(),
      fallback,
    })
  }
}
