//! The single end-of-run delivery attempt.

use std::time::Duration;

use bytes::Bytes;
use rater_config::{DeliveryConfig, DeliveryMode};
use rater_record::DeliveryRow;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

use crate::error::{DeliveryError, TransportError};
use crate::outcome::{Confirmation, DeliveryOutcome};
use crate::transport::{HttpTransport, Transport, TransportResponse};

/// Sends a run's rows to the configured endpoint, once.
///
/// State progression per call: an unconfigured endpoint fails immediately
/// without touching the transport; otherwise the rows are encoded and one
/// send is issued. There are no retries.
pub struct DeliveryOrchestrator<T: Transport> {
  config: DeliveryConfig,
  transport: T,
}

impl DeliveryOrchestrator<HttpTransport> {
  /// Create an orchestrator with an HTTP transport matching `config.mode`.
  pub fn http(config: DeliveryConfig) -> Result<Self, TransportError> {
    let transport = HttpTransport::new(config.mode)?;
    Ok(Self::new(config, transport))
  }
}

impl<T: Transport> DeliveryOrchestrator<T> {
  pub fn new(config: DeliveryConfig, transport: T) -> Self {
    Self { config, transport }
  }

  pub fn config(&self) -> &DeliveryConfig {
    &self.config
  }

  pub fn transport(&self) -> &T {
    &self.transport
  }

  /// Resolve the configured endpoint, or explain why it is unusable.
  pub fn endpoint(&self) -> Result<Url, DeliveryError> {
    if self.config.is_placeholder() {
      return Err(DeliveryError::configuration(
        "endpoint is empty or a placeholder",
      ));
    }

    let url = Url::parse(self.config.endpoint.trim())
      .map_err(|e| DeliveryError::configuration(format!("invalid endpoint url: {}", e)))?;

    match url.scheme() {
      "http" | "https" => Ok(url),
      other => Err(DeliveryError::configuration(format!(
        "unsupported endpoint scheme '{}'",
        other
      ))),
    }
  }

  /// Attempt delivery of `rows`.
  ///
  /// Never returns an error: configuration problems, transport failures,
  /// rejections, deadline expiry and cancellation all map to
  /// [`DeliveryOutcome::Failed`].
  pub async fn deliver(&self, rows: &[DeliveryRow], cancel: &CancellationToken) -> DeliveryOutcome {
    let outcome = self.attempt(rows, cancel).await;

    match &outcome {
      DeliveryOutcome::Delivered {
        confirmation: Confirmation::Dispatched,
      } => {
        info!(rows = rows.len(), "delivery dispatched, response not inspected");
      }
      DeliveryOutcome::Delivered {
        confirmation: Confirmation::Acknowledged { status },
      } => {
        info!(rows = rows.len(), status, "delivery acknowledged");
      }
      DeliveryOutcome::Failed { error } => {
        warn!(rows = rows.len(), error = %error, "delivery failed");
      }
    }

    outcome
  }

  async fn attempt(&self, rows: &[DeliveryRow], cancel: &CancellationToken) -> DeliveryOutcome {
    let endpoint = match self.endpoint() {
      Ok(endpoint) => endpoint,
      Err(e) => return e.into(),
    };

    let body = match serde_json::to_vec(rows) {
      Ok(body) => Bytes::from(body),
      Err(e) => {
        return DeliveryError::Serialization {
          message: e.to_string(),
        }
        .into();
      }
    };

    if cancel.is_cancelled() {
      return DeliveryError::Cancelled.into();
    }

    info!(
      endpoint = %endpoint,
      rows = rows.len(),
      bytes = body.len(),
      mode = ?self.config.mode,
      "sending rows"
    );

    let timeout_ms = self.config.timeout_ms;
    let deadline = async {
      match timeout_ms {
        Some(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
        None => std::future::pending::<()>().await,
      }
    };

    let result = tokio::select! {
        result = self.transport.send(&endpoint, body) => result,
        _ = deadline => {
          return DeliveryError::TimedOut {
            timeout_ms: timeout_ms.unwrap_or_default(),
          }
          .into();
        }
        _ = cancel.cancelled() => return DeliveryError::Cancelled.into(),
    };

    match result {
      Ok(response) => self.interpret(response),
      Err(e) => DeliveryError::Transport {
        message: e.to_string(),
      }
      .into(),
    }
  }

  fn interpret(&self, response: TransportResponse) -> DeliveryOutcome {
    match self.config.mode {
      DeliveryMode::FireAndForget => DeliveryOutcome::Delivered {
        confirmation: Confirmation::Dispatched,
      },
      DeliveryMode::Confirmed => match response.status {
        Some(status) if (200..300).contains(&status) => DeliveryOutcome::Delivered {
          confirmation: Confirmation::Acknowledged { status },
        },
        Some(status) => DeliveryError::Rejected { status }.into(),
        None => DeliveryError::Unconfirmed.into(),
      },
    }
  }
}
