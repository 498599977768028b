//! # Stream-backed source (`StreamSource`)
//!
//! Adapts any [`futures::Stream`] of `Result<T, SourceError>` into a [`Source`].
//! The stream is created by a factory on subscribe and driven on a spawned
//! tokio task:
//!
//! ```text
//! loop {
//!   ├─ ctx cancelled      ─► stop (eviction teardown)
//!   ├─ Some(Ok(v))        ─► sink.next(v)
//!   ├─ Some(Err(e))       ─► sink.error(e), keep polling
//!   └─ None               ─► sink.complete(), stop
//! }
//! ```
//!
//! The driver also stops as soon as the sink reports it is closed.
//! Subscribing outside a tokio runtime fails with a construction error.

use std::fmt;

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::error::SourceError;
use crate::sources::{Sink, Source};

/// Stream-backed source implementation.
pub struct StreamSource<F> {
    factory: F,
}

impl<F> StreamSource<F> {
    /// Creates a source that calls `factory` to obtain its stream.
    pub fn new(factory: F) -> Self {
        Self { factory }
    }
}

impl<F> fmt::Debug for StreamSource<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSource").finish_non_exhaustive()
    }
}

impl<T, F, St> Source<T> for StreamSource<F>
where
    T: Clone + Send + 'static,
    F: Fn() -> St + Send + Sync + 'static,
    St: Stream<Item = Result<T, SourceError>> + Send + 'static,
{
    fn subscribe(&self, sink: Sink<T>, ctx: CancellationToken) -> Result<(), SourceError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|_| SourceError::msg("stream source requires a tokio runtime"))?;
        let mut stream = Box::pin((self.factory)());

        handle.spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = ctx.cancelled() => break,
                    item = stream.next() => {
                        let open = match item {
                            Some(Ok(v)) => sink.next(v),
                            Some(Err(e)) => sink.error(e),
                            None => {
                                sink.complete();
                                false
                            }
                        };
                        if !open {
                            break;
                        }
                    }
                }
            }
        });
        Ok(())
    }
}
