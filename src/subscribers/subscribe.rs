//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging custom diagnostic handlers
//! into the bridge. Each subscriber is driven by a dedicated worker loop fed by
//! a bounded queue owned by the [`SubscriberSet`](crate::subscribers::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching) – they do **not** block
//!   subjects, reads, nor other subscribers.
//! - Each subscriber **declares** its preferred queue capacity via
//!   [`Subscribe::queue_capacity`]. If a queue overflows, events for that
//!   subscriber are **dropped**.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use statusvisor::{Event, EventKind, Subscribe};
//!
//! struct StallAlert;
//!
//! #[async_trait]
//! impl Subscribe for StallAlert {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::SuspenseStalled {
//!             // page someone...
//!         }
//!     }
//!     fn name(&self) -> &'static str { "stall-alert" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for diagnostic event subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should avoid
/// blocking the async runtime.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    ///
    /// On overflow, events for this subscriber are **dropped**.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
