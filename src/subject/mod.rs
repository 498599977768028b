//! # Status subjects.
//!
//! - [`StatusSubject`] wraps one push-based source; tracks value/error/completion
//!   and multicasts to observers with single-item replay.
//! - [`FirstEmission`] awaitable that settles on the first value or first error.
//! - [`Observation`] / [`Notification`] the observer feed.

mod first_emission;
mod observation;
mod status_subject;

pub use first_emission::FirstEmission;
pub use observation::{Notification, Observation};
pub use status_subject::StatusSubject;

pub(crate) use status_subject::{Inspection, Shared};
