//! # Read results.
//!
//! - [`Status`] the three-state loading status
//! - [`StatusSnapshot`] the synchronous value consumers render from
//! - [`Pending`] the suspend signal returned instead of a snapshot
//! - [`ReadOutcome`] either of the two
//!
//! ## Status rules
//! ```text
//! current error, not masked by initial data      ─► Error
//! value received, or initial data supplied       ─► Success
//! otherwise                                      ─► Loading
//! ```
//! Initial data masks an error only while no real value has arrived. An error
//! followed by a newer value is stale: it stays in `error` but the status is
//! `Success`.

use std::fmt;
use std::sync::Arc;

use tokio::time::Instant;

use crate::error::SourceError;
use crate::subject::{FirstEmission, Inspection};

/// Loading status of a read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// Waiting for the first value.
    Loading,
    /// The source errored; see [`StatusSnapshot::error`].
    Error,
    /// A value (or initial data) is available.
    Success,
}

impl Status {
    /// Returns a short stable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Loading => "loading",
            Status::Error => "error",
            Status::Success => "success",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Synchronous status snapshot of one subject, as seen by one read.
#[derive(Clone, Debug)]
pub struct StatusSnapshot<T> {
    /// Derived loading status.
    pub status: Status,
    /// True once the subject has received a real value. Initial data does not count.
    pub has_emitted: bool,
    /// True once the source completed.
    pub is_complete: bool,
    /// Latest value, or the read's initial data before the first real value.
    pub data: Option<T>,
    /// Latest error (current or stale), the original object unmodified.
    pub error: Option<SourceError>,
    /// Signal that settles on the subject's first emission.
    pub first_value: FirstEmission,
}

impl<T> StatusSnapshot<T> {
    pub(crate) fn derive(inspection: Inspection<T>, initial: Option<T>, first_value: FirstEmission) -> Self {
        let has_emitted = inspection.value.is_some();
        let masked = initial.is_some() && !has_emitted;
        let current_error = inspection.error.is_some() && inspection.error_current;

        let status = if current_error && !masked {
            Status::Error
        } else if has_emitted || initial.is_some() {
            Status::Success
        } else {
            Status::Loading
        };

        Self {
            status,
            has_emitted,
            is_complete: inspection.complete,
            data: inspection.value.or(initial),
            error: inspection.error,
            first_value,
        }
    }

    #[inline]
    pub fn is_loading(&self) -> bool {
        self.status == Status::Loading
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.status == Status::Error
    }
}

/// Called once the timeout window of a pending subject elapses.
pub(crate) type StallHook = Arc<dyn Fn() + Send + Sync>;

/// Suspend signal: the read cannot produce a snapshot yet.
///
/// Await [`Pending::wait`], then read the same key again.
#[derive(Clone)]
pub struct Pending {
    key: String,
    first: FirstEmission,
    stalled: bool,
    stall_watch: Option<(Instant, StallHook)>,
}

impl Pending {
    pub(crate) fn new(key: &str, first: FirstEmission, stalled: bool) -> Self {
        Self {
            key: key.to_string(),
            first,
            stalled,
            stall_watch: None,
        }
    }

    /// Runs `hook` if [`wait`](Self::wait) is still waiting at `deadline`.
    pub(crate) fn watch_stall(mut self, deadline: Instant, hook: StallHook) -> Self {
        self.stall_watch = Some((deadline, hook));
        self
    }

    /// Key of the pending subject.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The awaitable the caller should wait on.
    pub fn first_emission(&self) -> &FirstEmission {
        &self.first
    }

    /// True if the read happened past the subject's timeout window.
    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// Waits until re-reading is worthwhile.
    ///
    /// If the subject's timeout window elapses first, the stall is reported
    /// and the wait goes on; the signal is never rejected.
    pub async fn wait(&self) {
        let Some((deadline, hook)) = &self.stall_watch else {
            return self.first.wait().await;
        };
        tokio::select! {
            _ = self.first.wait() => return,
            _ = tokio::time::sleep_until(*deadline) => hook(),
        }
        self.first.wait().await
    }
}

impl fmt::Debug for Pending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pending")
            .field("key", &self.key)
            .field("stalled", &self.stalled)
            .field("watching", &self.stall_watch.is_some())
            .finish()
    }
}

/// Result of a bridge read.
#[derive(Clone, Debug)]
pub enum ReadOutcome<T> {
    /// A snapshot is available now.
    Ready(StatusSnapshot<T>),
    /// Suspense read with nothing to show yet.
    Pending(Pending),
}

impl<T> ReadOutcome<T> {
    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self, ReadOutcome::Pending(_))
    }

    /// Returns the snapshot if ready.
    pub fn ready(self) -> Option<StatusSnapshot<T>> {
        match self {
            ReadOutcome::Ready(s) => Some(s),
            ReadOutcome::Pending(_) => None,
        }
    }

    /// Returns the pending signal if suspended.
    pub fn pending(&self) -> Option<&Pending> {
        match self {
            ReadOutcome::Pending(p) => Some(p),
            ReadOutcome::Ready(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn inspection(value: Option<&'static str>, error: Option<&str>, error_current: bool) -> Inspection<&'static str> {
        Inspection {
            value,
            error: error.map(SourceError::msg),
            error_current,
            complete: false,
            closed: false,
            elapsed: Duration::ZERO,
        }
    }

    fn derive(i: Inspection<&'static str>, initial: Option<&'static str>) -> StatusSnapshot<&'static str> {
        let (_tx, first) = FirstEmission::channel();
        StatusSnapshot::derive(i, initial, first)
    }

    #[test]
    fn loading_without_anything() {
        let s = derive(inspection(None, None, false), None);
        assert_eq!(s.status, Status::Loading);
        assert!(!s.has_emitted);
        assert!(s.data.is_none());
    }

    #[test]
    fn initial_data_is_success_but_not_emitted() {
        let s = derive(inspection(None, None, false), Some("X"));
        assert_eq!(s.status, Status::Success);
        assert_eq!(s.data, Some("X"));
        assert!(!s.has_emitted);
    }

    #[test]
    fn real_value_supersedes_initial() {
        let s = derive(inspection(Some("Y"), None, false), Some("X"));
        assert_eq!(s.data, Some("Y"));
        assert!(s.has_emitted);
    }

    #[test]
    fn error_keeps_stale_data() {
        let s = derive(inspection(Some("Y"), Some("boom"), true), None);
        assert_eq!(s.status, Status::Error);
        assert_eq!(s.data, Some("Y"));
        assert_eq!(s.error.unwrap().to_string(), "boom");
    }

    #[test]
    fn stale_error_does_not_drive_status() {
        let s = derive(inspection(Some("Z"), Some("boom"), false), None);
        assert_eq!(s.status, Status::Success);
        assert!(s.error.is_some());
    }

    #[test]
    fn initial_data_masks_early_error() {
        let s = derive(inspection(None, Some("boom"), true), Some("X"));
        assert_eq!(s.status, Status::Success);
        assert_eq!(s.data, Some("X"));
        assert!(s.error.is_some());
    }

    #[test]
    fn status_labels() {
        assert_eq!(Status::Loading.to_string(), "loading");
        assert_eq!(Status::Error.as_str(), "error");
    }
}
