//! # Push-based source abstractions.
//!
//! This module provides the producer side of the bridge:
//! - [`Source`] - trait for anything that pushes values into a [`Sink`]
//! - [`Sink`] - weak push handle bound to one status subject
//! - [`SourceFn`] - closure-backed source
//! - [`StreamSource`] - adapter driving a `futures::Stream` on a tokio task
//! - [`SourceRef`] - shared reference to a source (`Arc<dyn Source<T>>`)

mod sink;
mod source;
mod source_fn;
mod stream;

pub use sink::Sink;
pub use source::{Source, SourceRef};
pub use source_fn::SourceFn;
pub use stream::StreamSource;
