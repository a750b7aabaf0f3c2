use serde::Serialize;

use crate::error::DeliveryError;

/// How much the sender knows about a delivered request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Confirmation {
  /// The request was sent; the response was not inspected.
  Dispatched,
  /// The endpoint answered with a success status.
  Acknowledged { status: u16 },
}

/// Result of the single delivery attempt of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DeliveryOutcome {
  Delivered { confirmation: Confirmation },
  Failed { error: DeliveryError },
}

impl DeliveryOutcome {
  pub fn is_delivered(&self) -> bool {
    matches!(self, Self::Delivered { .. })
  }

  pub fn is_failed(&self) -> bool {
    matches!(self, Self::Failed { .. })
  }

  /// The failure reason, if the attempt failed.
  pub fn error(&self) -> Option<&DeliveryError> {
    match self {
      Self::Failed { error } => Some(error),
      Self::Delivered { .. } => None,
    }
  }
}

impl From<DeliveryError> for DeliveryOutcome {
  fn from(error: DeliveryError) -> Self {
    Self::Failed { error }
  }
}
