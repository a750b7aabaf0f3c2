//! Rater Record
//!
//! Types for the data a rating run produces and the shape it is delivered in.
//!
//! - [`TrialRecord`] is one entry per completed trial, as accumulated by the
//!   presentation engine. Every key is kept verbatim in
//!   [`TrialRecord::fields`], nulls included, so the fallback artifact can
//!   reproduce everything the run captured.
//! - [`DeliveryRow`] is the fixed-shape projection sent to the remote store.
//! - [`project`] / [`project_with`] map records to rows. Projection never fails.
//!
//! Values that depend on the environment (the current instant and the client
//! identifier) come from an [`Ambient`] source so tests can pin them.

mod ambient;
mod project;
mod record;
mod row;

pub use ambient::{Ambient, FixedAmbient, SystemAmbient, format_timestamp};
pub use project::{project, project_one, project_with};
pub use record::{TrialRecord, keys};
pub use row::DeliveryRow;
