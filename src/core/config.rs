//! # Bridge configuration.
//!
//! Provides [`Config`] centralized settings for a [`StatusBridge`](crate::StatusBridge).
//!
//! Config is used in two ways:
//! 1. **Bridge creation**: `StatusBridge::builder(config).build()`
//! 2. **Read defaults**: reads that do not set `suspense` or `timeout_window`
//!    inherit them from here
//!
//! ## Sentinel values
//! - `timeout_window = 0s` → stall detection disabled

use std::time::Duration;

use crate::policies::StallPolicy;

/// Global configuration for the status bridge.
///
/// ## Field semantics
/// - `suspense`: default suspense mode for reads that don't choose one
/// - `timeout_window`: advisory window after which a pending suspense read counts as stalled (`0s` = never)
/// - `stall`: what to do about stalled reads
/// - `bus_capacity`: diagnostic event bus ring buffer size (min 1; clamped by Bus)
#[derive(Clone, Debug)]
pub struct Config {
    /// Default suspense mode.
    ///
    /// A per-read [`ReadOptions::suspense`](crate::ReadOptions::suspense) overrides it.
    pub suspense: bool,

    /// Default advisory timeout window for new subjects.
    ///
    /// The first writer of a key fixes its window; later reads of the same
    /// key with a different window do not change it.
    pub timeout_window: Duration,

    /// Stall reporting policy.
    pub stall: StallPolicy,

    /// Capacity of the diagnostic event bus.
    pub bus_capacity: usize,
}

impl Config {
    /// Resolves the suspense mode for a read: the read's own choice wins.
    #[inline]
    pub fn suspense_enabled(&self, from_read: Option<bool>) -> bool {
        from_read.unwrap_or(self.suspense)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `suspense = false`
    /// - `timeout_window = 30s`
    /// - `stall = StallPolicy::Log`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            suspense: false,
            timeout_window: Duration::from_secs(30),
            stall: StallPolicy::default(),
            bus_capacity: 1024,
        }
    }
}

/// Zero means "no window".
#[inline]
pub(crate) fn window_or_none(d: Duration) -> Option<Duration> {
    if d == Duration::ZERO {
        None
    } else {
        Some(d)
    }
}
