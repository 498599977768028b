//! # LogWriter - event renderer
//!
//! A minimal subscriber that renders incoming [`Event`]s through `tracing`.
//! Use it for tests, demos, or as a starting point for a real sink.
//!
//! ## Example output
//! ```text
//! [entry-created] key="users/alice" window_ms=30000
//! [read-suspended] key="users/alice"
//! [first-emission] key="users/alice" elapsed_ms=84
//! [suspense-resolved] key="users/alice" elapsed_ms=80
//! [source-errored] key="rooms/7" err="permission denied"
//! [suspense-stalled] key="rooms/9" elapsed_ms=30012 window_ms=30000
//! [entry-evicted] key="users/alice"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let key = e.key.as_deref().unwrap_or("unknown");
        let reason = e.reason.as_deref().unwrap_or("unknown");
        match e.kind {
            EventKind::EntryCreated => {
                tracing::info!("[entry-created] key={key:?} window_ms={:?}", e.window_ms);
            }
            EventKind::EntryEvicted => {
                tracing::info!("[entry-evicted] key={key:?}");
            }
            EventKind::SourceFailed => {
                tracing::warn!("[source-failed] key={key:?} err={reason:?}");
            }
            EventKind::FirstEmission => {
                tracing::info!("[first-emission] key={key:?} elapsed_ms={:?}", e.elapsed_ms);
            }
            EventKind::SourceErrored => {
                tracing::warn!("[source-errored] key={key:?} err={reason:?}");
            }
            EventKind::SourceCompleted => {
                tracing::info!("[source-completed] key={key:?}");
            }
            EventKind::ReadSuspended => {
                tracing::info!("[read-suspended] key={key:?}");
            }
            EventKind::SuspenseStalled => {
                tracing::warn!(
                    "[suspense-stalled] key={key:?} elapsed_ms={:?} window_ms={:?}",
                    e.elapsed_ms,
                    e.window_ms
                );
            }
            EventKind::SuspenseResolved => {
                tracing::info!("[suspense-resolved] key={key:?} elapsed_ms={:?}", e.elapsed_ms);
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!("[subscriber-overflow] subscriber={key} reason={reason}");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!("[subscriber-panicked] subscriber={key} info={reason}");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
