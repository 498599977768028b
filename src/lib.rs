//! # statusvisor
//!
//! **Statusvisor** bridges push-based, possibly infinite value sources into
//! synchronous status snapshots that a rendering layer can read at any time.
//!
//! It provides a replay-latest subject per source, a keyed preload cache that
//! guarantees at most one upstream subscription per key, and a read path that
//! either returns a snapshot right away or, in suspense mode, a pending
//! signal to wait on before reading again.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   read(k1)   │   │   read(k1)   │   │ preload(k2)  │
//!     │ (consumer A) │   │ (consumer B) │   │  (warm-up)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  StatusBridge                                                     │
//! │  - Config (suspense default, timeout window, stall policy)        │
//! │  - Registry (key ─► StatusSubject, one subscription per key)      │
//! │  - Escalation (settle or suspend, stall flag)                     │
//! │  - SubscriberSet (fans diagnostics out to user subscribers)       │
//! └──────┬──────────────────────────────────────┬─────────────────────┘
//!        ▼                                      ▼
//!     ┌──────────────────┐               ┌──────────────────┐
//!     │ StatusSubject k1 │               │ StatusSubject k2 │
//!     │ value/error/done │               │ value/error/done │
//!     └──────┬───────────┘               └──────┬───────────┘
//!            │ Sink                             │ Sink
//!     ┌──────┴───────────┐               ┌──────┴───────────┐
//!     │   Source (k1)    │               │   Source (k2)    │
//!     └──────────────────┘               └──────────────────┘
//!
//!  Registry / subjects / bridge ──publish──► Bus ──► listener ──► SubscriberSet
//! ```
//!
//! ### Read path
//! ```text
//! read(key, factory, options)
//!   ├─► registry.get_or_create(key, factory, window)
//!   ├─► suspense = options.suspense ?? config.suspense
//!   └─► Escalation::decide
//!         ├─ value or error present           ─► Ready(snapshot)
//!         ├─ initial data supplied            ─► Ready(snapshot, Success)
//!         ├─ not suspense                     ─► Ready(snapshot, Loading)
//!         └─ suspense, nothing yet            ─► Pending(first emission)
//!                                                 (stall logged past the window)
//! ```
//!
//! ## Features
//! | Area              | Description                                                      | Key types / traits                          |
//! |-------------------|------------------------------------------------------------------|---------------------------------------------|
//! | **Sources**       | Producer side: push values, errors and completion.               | [`Source`], [`Sink`], [`SourceFn`], [`StreamSource`] |
//! | **Subjects**      | Replay-latest multicast with first-emission signal.              | [`StatusSubject`], [`FirstEmission`], [`Observation`] |
//! | **Cache**         | Keyed warm-up cache, one subscription per key.                   | [`Registry`]                                |
//! | **Reads**         | Status derivation and suspense escalation.                       | [`StatusBridge`], [`ReadOutcome`], [`StatusSnapshot`] |
//! | **Subscriber API**| Hook into bridge diagnostics (logging, metrics, custom).         | [`Subscribe`], [`Event`]                    |
//! | **Errors**        | Source errors and configuration errors.                          | [`SourceError`], [`BridgeError`]            |
//! | **Configuration** | Bridge-wide defaults.                                            | [`Config`], [`StallPolicy`]                 |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in `LogWriter` _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use statusvisor::{Config, ReadOptions, SourceError, SourceFn, SourceRef, Sink, Status, StatusBridge};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bridge = StatusBridge::builder(Config::default()).build();
//!
//!     // A source that pushes one value as soon as it is subscribed.
//!     let factory = || {
//!         let src: SourceRef<String> = SourceFn::arc(|sink: Sink<String>, _ctx: CancellationToken| {
//!             sink.next("hello".to_string());
//!             Ok::<_, SourceError>(())
//!         });
//!         Ok(src)
//!     };
//!
//!     let snapshot = bridge
//!         .read_settled("greeting", factory, ReadOptions::<String>::new().suspense(true))
//!         .await?;
//!     assert_eq!(snapshot.status, Status::Success);
//!     assert_eq!(snapshot.data.as_deref(), Some("hello"));
//!
//!     bridge.shutdown().await;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod policies;
mod sources;
mod subject;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{
    BridgeBuilder, Config, Pending, ReadOptions, ReadOutcome, Registry, Status, StatusBridge,
    StatusSnapshot,
};
pub use error::{BridgeError, SourceError};
pub use events::{Bus, Event, EventKind};
pub use policies::{Escalation, StallPolicy, SubjectView};
pub use sources::{Sink, Source, SourceFn, SourceRef, StreamSource};
pub use subject::{FirstEmission, Notification, Observation, StatusSubject};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
