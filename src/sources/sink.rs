//! # Push handle given to sources.
//!
//! A [`Sink`] is how a [`Source`](crate::Source) feeds its subject. It holds a
//! weak reference only: once the subject is dropped, evicted or completed,
//! every push is a no-op that returns `false`, telling the source it can stop.

use std::fmt;
use std::sync::Weak;

use crate::error::SourceError;
use crate::subject::{Notification, Shared};

/// Push handle for a single status subject.
pub struct Sink<T> {
    target: Weak<Shared<T>>,
}

impl<T> Sink<T> {
    pub(crate) fn new(target: Weak<Shared<T>>) -> Self {
        Self { target }
    }
}

impl<T: Clone + Send + 'static> Sink<T> {
    /// Pushes a value. Returns `false` if the subject no longer accepts items.
    pub fn next(&self, value: T) -> bool {
        self.push(Notification::Next(value))
    }

    /// Pushes an error. Returns `false` if the subject no longer accepts items.
    ///
    /// Errors do not close the subject; later values are still accepted.
    pub fn error(&self, err: SourceError) -> bool {
        self.push(Notification::Error(err))
    }

    /// Signals completion. Nothing is accepted afterwards.
    pub fn complete(&self) -> bool {
        self.push(Notification::Complete)
    }

    /// Returns true if pushing would be a no-op.
    pub fn is_closed(&self) -> bool {
        self.target
            .upgrade()
            .map_or(true, |shared| !shared.accepts())
    }

    fn push(&self, n: Notification<T>) -> bool {
        match self.target.upgrade() {
            Some(shared) => shared.push(n),
            None => false,
        }
    }
}

impl<T> Clone for Sink<T> {
    fn clone(&self) -> Self {
        Self {
            target: Weak::clone(&self.target),
        }
    }
}

impl<T> fmt::Debug for Sink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("attached", &(self.target.strong_count() > 0))
            .finish()
    }
}
