//! # Stall policies for suspended reads.
//!
//! [`StallPolicy`] decides what happens when a suspense read is still pending
//! after the subject's timeout window elapsed.
//!
//! - [`StallPolicy::Log`] emit one `tracing` warning and one
//!   [`SuspenseStalled`](crate::EventKind::SuspenseStalled) event per subject (default).
//! - [`StallPolicy::Ignore`] do nothing.
//!
//! Neither variant rejects the pending signal: a late legitimate value must
//! still be able to settle the first emission, and a settled first emission
//! never changes again.

/// Policy controlling how stalled suspense reads are reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StallPolicy {
    /// Warn once per subject and publish a diagnostic event (default).
    #[default]
    Log,
    /// Keep suspending silently.
    Ignore,
}

impl StallPolicy {
    /// Returns true if stalls should be reported.
    #[inline]
    pub fn reports(&self) -> bool {
        matches!(self, StallPolicy::Log)
    }
}
