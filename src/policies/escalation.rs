//! # Suspense escalation decision.
//!
//! [`Escalation::decide`] is evaluated on every bridge read and answers one
//! question: return a snapshot now, or hand the caller a pending signal?
//!
//! ```text
//! suspense disabled                     ─► Settle
//! value / error / complete / closed     ─► Settle
//! initial data supplied                 ─► Settle
//! otherwise                             ─► Suspend { stalled: elapsed >= window }
//! ```
//!
//! `stalled` is advisory. The bridge reports it according to its
//! [`StallPolicy`](crate::StallPolicy) and still suspends.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use statusvisor::{Escalation, SubjectView};
//!
//! let view = SubjectView { elapsed: Duration::from_secs(45), ..SubjectView::default() };
//! let window = Some(Duration::from_secs(30));
//!
//! assert_eq!(Escalation::decide(&view, window, false), Escalation::Settle);
//! assert_eq!(Escalation::decide(&view, window, true), Escalation::Suspend { stalled: true });
//! ```

use std::time::Duration;

/// Decision inputs taken from a subject and the read options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubjectView {
    /// A value has been received.
    pub has_value: bool,
    /// An error has been received.
    pub has_error: bool,
    /// The source completed.
    pub is_complete: bool,
    /// The subject was evicted.
    pub is_closed: bool,
    /// The read supplied initial data.
    pub has_initial: bool,
    /// Time since the subject was created.
    pub elapsed: Duration,
}

/// Outcome of the escalation decision for one read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Escalation {
    /// Return a snapshot synchronously.
    Settle,
    /// Return a pending signal.
    Suspend {
        /// The read is past the subject's timeout window.
        stalled: bool,
    },
}

impl Escalation {
    /// Decides how a read should proceed.
    ///
    /// `window = None` disables stall detection.
    pub fn decide(view: &SubjectView, window: Option<Duration>, suspense: bool) -> Self {
        if !suspense {
            return Escalation::Settle;
        }
        let resolved = view.has_value || view.has_error || view.is_complete || view.is_closed;
        if resolved || view.has_initial {
            return Escalation::Settle;
        }
        let stalled = window.is_some_and(|w| view.elapsed >= w);
        Escalation::Suspend { stalled }
    }

    #[inline]
    pub fn is_suspend(&self) -> bool {
        matches!(self, Escalation::Suspend { .. })
    }
}
