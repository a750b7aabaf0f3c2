use serde::{Deserialize, Serialize};

/// How the delivery request treats the endpoint's response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
  /// Send the request and never inspect the response.
  ///
  /// A completed send counts as delivered even if the endpoint rejected the
  /// rows, since the response is treated as opaque.
  #[default]
  FireAndForget,
  /// Read the response status; only a 2xx counts as delivered.
  Confirmed,
}
