//! Rater Delivery
//!
//! The end-of-run half of the result pipeline:
//!
//! - [`DeliveryOrchestrator`] makes exactly one attempt to send the projected
//!   rows to the configured endpoint and reports a [`DeliveryOutcome`]. It never
//!   returns an error; every failure becomes [`DeliveryOutcome::Failed`].
//! - [`FallbackWriter`] renders every captured record as CSV and stores it as a
//!   local artifact the participant can save by hand.
//!
//! The network seam is the [`Transport`] trait. [`HttpTransport`] is the
//! production implementation; tests substitute their own.
//!
//! # Confirmation semantics
//!
//! In [`DeliveryMode::FireAndForget`](rater_config::DeliveryMode) the response is
//! never inspected, so `Delivered` means the request left the process, not that
//! the sheet stored the rows. A rejection after dispatch cannot trigger the
//! fallback. [`DeliveryMode::Confirmed`](rater_config::DeliveryMode) reads the
//! status line and only a 2xx counts as delivered.

mod error;
mod fallback;
mod orchestrator;
mod outcome;
mod transport;

pub use error::{DeliveryError, FallbackError, TransportError};
pub use fallback::{ArtifactHandle, FallbackWriter, render_csv};
pub use orchestrator::DeliveryOrchestrator;
pub use outcome::{Confirmation, DeliveryOutcome};
pub use transport::{HttpTransport, Transport, TransportResponse};
