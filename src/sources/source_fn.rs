//! # Function-backed source (`SourceFn`)
//!
//! [`SourceFn`] wraps a closure `F: Fn(Sink<T>, CancellationToken) -> Result<(), SourceError>`.
//! The closure is the whole subscription: it may push synchronously, hand the
//! sink to a callback-style listener, or spawn a task that pushes later.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use statusvisor::{Sink, SourceError, SourceFn, SourceRef};
//!
//! let s: SourceRef<&'static str> = SourceFn::arc(|sink: Sink<&'static str>, _ctx: CancellationToken| {
//!     sink.next("signed-out");
//!     Ok::<_, SourceError>(())
//! });
//! # let _ = s;
//! ```

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::SourceError;
use crate::sources::{Sink, Source};

/// Function-backed source implementation.
pub struct SourceFn<F> {
    f: F,
}

impl<F> SourceFn<F> {
    /// Creates a new function-backed source.
    ///
    /// Prefer [`SourceFn::arc`] when you immediately need a [`SourceRef`](crate::SourceRef).
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the source and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<F> fmt::Debug for SourceFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFn").finish_non_exhaustive()
    }
}

impl<T, F> Source<T> for SourceFn<F>
where
    F: Fn(Sink<T>, CancellationToken) -> Result<(), SourceError> + Send + Sync + 'static,
{
    fn subscribe(&self, sink: Sink<T>, ctx: CancellationToken) -> Result<(), SourceError> {
        (self.f)(sink, ctx)
    }
}
