//! Diagnostic events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to diagnostic events emitted by the registry, status
//! subjects, the bridge and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Registry`, `StatusSubject`, `StatusBridge`,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the fan-out listener spawned by `BridgeBuilder::build`
//!   (forwards to `SubscriberSet`), or any receiver from [`Bus::subscribe`].

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
