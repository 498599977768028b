//! # Push-based source abstraction.
//!
//! A [`Source`] is anything that can push a sequence of values, optionally
//! terminated by an error or a completion signal, into a [`Sink`]. Database
//! listeners, auth state watchers and upload-progress feeds are all sources.
//!
//! A source receives a [`CancellationToken`] alongside the sink. The token is
//! cancelled when the owning registry entry is evicted; background work spawned
//! by the source should watch it and stop.
//!
//! The common handle type is [`SourceRef`], an `Arc<dyn Source<T>>`.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::SourceError;
use crate::sources::Sink;

/// # Push-based producer of `T` values.
///
/// `subscribe` is called exactly once per registry entry, to start the
/// warm-up subscription. Returning `Err` is treated as an immediate error
/// emission (the subject records it and settles its first emission).
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use statusvisor::{Sink, Source, SourceError};
///
/// struct Fixed(u32);
///
/// impl Source<u32> for Fixed {
///     fn subscribe(&self, sink: Sink<u32>, _ctx: CancellationToken) -> Result<(), SourceError> {
///         sink.next(self.0);
///         sink.complete();
///         Ok(())
///     }
/// }
/// ```
pub trait Source<T>: Send + Sync + 'static {
    /// Starts pushing into `sink` until the source ends or `ctx` is cancelled.
    fn subscribe(&self, sink: Sink<T>, ctx: CancellationToken) -> Result<(), SourceError>;
}

/// Shared handle to a source.
pub type SourceRef<T> = Arc<dyn Source<T>>;

impl<T, S> Source<T> for Arc<S>
where
    S: Source<T> + ?Sized,
{
    fn subscribe(&self, sink: Sink<T>, ctx: CancellationToken) -> Result<(), SourceError> {
        (**self).subscribe(sink, ctx)
    }
}
