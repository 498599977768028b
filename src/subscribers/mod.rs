//! # Diagnostic subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and built-in implementations for handling events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Registry / StatusSubject / StatusBridge
//!        │ publish(Event)
//!        ▼
//!       Bus ──► fan-out listener ──► SubscriberSet::emit_arc
//!                                         │
//!                               ┌─────────┼─────────┐
//!                               ▼         ▼         ▼
//!                           LogWriter  Metrics   Custom
//! ```
//!
//! Subscribers only ever see diagnostics. Payload values travel through
//! [`Observation`](crate::Observation)s and snapshots, never through the bus.

mod subscribe;
mod subscriber_set;

#[cfg(feature = "logging")]
mod embedded;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;
