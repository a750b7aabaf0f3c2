//! Delivery error types.

use serde::Serialize;

/// Errors raised by a [`Transport`](crate::Transport) while sending.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
  /// The HTTP client failed (DNS, connect, TLS, I/O, client timeout).
  #[error("http request failed: {0}")]
  Http(#[from] reqwest::Error),

  /// The endpoint could not be reached.
  #[error("connection failed: {message}")]
  Connection { message: String },
}

/// Why a delivery attempt ended in `Failed`.
///
/// Carries messages rather than sources so outcomes can be cloned into events
/// and printed in run summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliveryError {
  /// No usable endpoint is configured. No request was made.
  #[error("endpoint not configured: {reason}")]
  Configuration { reason: String },

  /// The rows could not be encoded.
  #[error("failed to serialize rows: {message}")]
  Serialization { message: String },

  /// The send raised a transport-level error.
  #[error("transport error: {message}")]
  Transport { message: String },

  /// The endpoint answered with a non-success status (confirmed mode only).
  #[error("endpoint rejected delivery with status {status}")]
  Rejected { status: u16 },

  /// The transport could not report a status (confirmed mode only).
  #[error("delivery could not be confirmed: no response status observed")]
  Unconfirmed,

  /// The configured deadline elapsed before the send completed.
  #[error("delivery timed out after {timeout_ms}ms")]
  TimedOut { timeout_ms: u64 },

  /// The run was cancelled while the send was in flight.
  #[error("delivery cancelled")]
  Cancelled,
}

impl DeliveryError {
  pub(crate) fn configuration(reason: impl Into<String>) -> Self {
    Self::Configuration {
      reason: reason.into(),
    }
  }
}

/// Errors raised while producing the fallback artifact.
#[derive(Debug, thiserror::Error)]
pub enum FallbackError {
  /// CSV encoding failed.
  #[error("failed to encode csv: {0}")]
  Csv(#[from] csv::Error),

  /// The encoded CSV could not be flushed out of the writer.
  #[error("failed to flush csv: {message}")]
  Flush { message: String },

  /// The artifact store refused the file.
  #[error("failed to store fallback artifact: {0}")]
  Store(#[from] rater_artifact::Error),
}
