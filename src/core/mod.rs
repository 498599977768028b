//! Bridge core: registry, read path and configuration.
//!
//! The public entry point of this module is [`StatusBridge`], which turns a
//! keyed source into a synchronous [`StatusSnapshot`] (or a [`Pending`]
//! suspend signal) on every read.
//!
//! Internal modules:
//! - [`registry`]: keyed subject cache, one warm-up subscription per key;
//! - [`bridge`]: per-read status derivation and suspense escalation;
//! - [`builder`]: wires the bus, registry and subscriber fan-out;
//! - [`snapshot`]: read result types;
//! - [`options`]: per-read options;
//! - [`config`]: bridge-wide defaults.

mod bridge;
mod builder;
mod config;
mod options;
mod registry;
mod snapshot;

pub use bridge::StatusBridge;
pub use builder::BridgeBuilder;
pub use config::Config;
pub use options::ReadOptions;
pub use registry::Registry;
pub use snapshot::{Pending, ReadOutcome, Status, StatusSnapshot};
