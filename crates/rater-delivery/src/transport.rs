//! The network seam of the delivery pipeline.

use async_trait::async_trait;
use bytes::Bytes;
use rater_config::DeliveryMode;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::error::TransportError;

/// What the transport observed after a send completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportResponse {
  /// HTTP status, or `None` when the response was not inspected.
  pub status: Option<u16>,
}

impl TransportResponse {
  /// A response that was deliberately left unread.
  pub fn opaque() -> Self {
    Self { status: None }
  }

  pub fn with_status(status: u16) -> Self {
    Self {
      status: Some(status),
    }
  }
}

/// Sends one request body to an endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
  /// POST `body` (a JSON document) to `endpoint`.
  ///
  /// Returns `Err` only for transport-level failures. An HTTP error status is
  /// a completed send and is reported through [`TransportResponse::status`].
  async fn send(&self, endpoint: &Url, body: Bytes) -> Result<TransportResponse, TransportError>;
}

/// [`Transport`] backed by a `reqwest` client.
pub struct HttpTransport {
  client: Client,
  mode: DeliveryMode,
}

impl HttpTransport {
  /// Create a transport with a default client.
  pub fn new(mode: DeliveryMode) -> Result<Self, TransportError> {
    let client = Client::builder()
      .user_agent(concat!("rater/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self::with_client(client, mode))
  }

  pub fn with_client(client: Client, mode: DeliveryMode) -> Self {
    Self { client, mode }
  }

  pub fn mode(&self) -> DeliveryMode {
    self.mode
  }
}

#[async_trait]
impl Transport for HttpTransport {
  async fn send(&self, endpoint: &Url, body: Bytes) -> Result<TransportResponse, TransportError> {
    let response = self
      .client
      .post(endpoint.clone())
      .header(CONTENT_TYPE, "application/json")
      .body(body)
      .send()
      .await?;

    match self.mode {
      // The response is dropped unread.
      DeliveryMode::FireAndForget => Ok(TransportResponse::opaque()),
      DeliveryMode::Confirmed => Ok(TransportResponse::with_status(response.status().as_u16())),
    }
  }
}
