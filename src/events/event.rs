//! # Diagnostic events emitted by the registry, subjects and the bridge.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Entry events**: registry lifecycle (created, evicted, construction failed)
//! - **Emission events**: source lifecycle as seen by a subject (first emission, error, completion)
//! - **Suspense events**: read-side escalation (suspended, stalled, resolved)
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the cache
//! key, reasons and elapsed durations.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use statusvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::SuspenseStalled)
//!     .with_key("users/alice")
//!     .with_elapsed(Duration::from_secs(31))
//!     .with_window(Duration::from_secs(30));
//!
//! assert_eq!(ev.kind, EventKind::SuspenseStalled);
//! assert_eq!(ev.key.as_deref(), Some("users/alice"));
//! assert_eq!(ev.window_ms, Some(30_000));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of diagnostic events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `key`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `key`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Entry events ===
    /// A registry entry was created and its warm-up subscription started.
    ///
    /// Sets:
    /// - `key`: cache key
    /// - `window_ms`: timeout window of the new subject
    EntryCreated,

    /// A registry entry was evicted and its warm-up subscription cancelled.
    ///
    /// Sets:
    /// - `key`: cache key
    EntryEvicted,

    /// The source factory or the source's `subscribe` failed synchronously.
    ///
    /// Sets:
    /// - `key`: cache key
    /// - `reason`: error message
    SourceFailed,

    // === Emission events ===
    /// The subject's first emission settled (first value or first error).
    ///
    /// Sets:
    /// - `key`: cache key
    /// - `elapsed_ms`: time since the subject was created
    FirstEmission,

    /// The source emitted an error.
    ///
    /// Sets:
    /// - `key`: cache key
    /// - `reason`: error message
    SourceErrored,

    /// The source signalled completion.
    ///
    /// Sets:
    /// - `key`: cache key
    SourceCompleted,

    // === Suspense events ===
    /// A suspense read found neither value nor error and returned a pending signal.
    ///
    /// Published once per subject (first suspension only).
    ///
    /// Sets:
    /// - `key`: cache key
    ReadSuspended,

    /// A suspense read is still pending past the subject's timeout window.
    ///
    /// Advisory only: the pending signal is never rejected.
    ///
    /// Sets:
    /// - `key`: cache key
    /// - `elapsed_ms`: time since the subject was created
    /// - `window_ms`: configured window
    SuspenseStalled,

    /// A suspended subject received its first emission.
    ///
    /// Sets:
    /// - `key`: cache key
    /// - `elapsed_ms`: time between the first suspended read and the emission
    SuspenseResolved,
}

/// Diagnostic event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Cache key (or subscriber name for subscriber events).
    pub key: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Elapsed time in milliseconds (compact).
    pub elapsed_ms: Option<u32>,
    /// Timeout window in milliseconds (compact).
    pub window_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            key: None,
            reason: None,
            elapsed_ms: None,
            window_ms: None,
        }
    }

    /// Attaches a cache key.
    #[inline]
    pub fn with_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an elapsed duration (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        self.elapsed_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a timeout window (stored as milliseconds).
    #[inline]
    pub fn with_window(mut self, d: Duration) -> Self {
        self.window_ms = Some(compact_ms(d));
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_key(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_key(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::new(EventKind::EntryCreated);
        let b = Event::new(EventKind::EntryEvicted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn durations_saturate() {
        let ev = Event::new(EventKind::SuspenseStalled).with_elapsed(Duration::from_secs(u64::MAX));
        assert_eq!(ev.elapsed_ms, Some(u32::MAX));
    }
}
