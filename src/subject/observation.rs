//! # Observer side of a status subject.
//!
//! [`Observation`] is what [`StatusSubject::observe`](crate::StatusSubject::observe)
//! returns: an ordered, unbounded feed of [`Notification`]s that starts with
//! the replayed latest item (if any). Dropping it detaches the observer and
//! affects nobody else.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::error::SourceError;

/// One item delivered to an observer.
#[derive(Debug, Clone)]
pub enum Notification<T> {
    /// A value pushed by the source.
    Next(T),
    /// An error pushed by the source (does not end the feed).
    Error(SourceError),
    /// The source completed; the feed ends after this item.
    Complete,
}

impl<T> Notification<T> {
    /// Returns the value if this is [`Notification::Next`].
    pub fn value(&self) -> Option<&T> {
        match self {
            Notification::Next(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Notification::Error(_))
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        matches!(self, Notification::Complete)
    }
}

/// Attached observer of a status subject.
///
/// The feed ends (`None`) after `Complete`, or when the subject is evicted.
#[derive(Debug)]
pub struct Observation<T> {
    rx: mpsc::UnboundedReceiver<Notification<T>>,
}

impl<T> Observation<T> {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Notification<T>>) -> Self {
        Self { rx }
    }

    /// Waits for the next notification.
    pub async fn recv(&mut self) -> Option<Notification<T>> {
        self.rx.recv().await
    }

    /// Returns the next notification if one is already queued.
    pub fn try_recv(&mut self) -> Option<Notification<T>> {
        self.rx.try_recv().ok()
    }

    /// Detaches from the subject. Equivalent to dropping the observation.
    pub fn detach(self) {}
}

impl<T> Stream for Observation<T> {
    type Item = Notification<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}
