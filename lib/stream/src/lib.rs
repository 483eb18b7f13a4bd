#![doc(test(attr(deny(warnings))))]

//! Lazy, pull-based streams and the primitives for composing them.
//!
//! Every stream in RDF Weave yields `Result<T, StreamError>` items. Streams do nothing until
//! they are polled, so consumers control the pace of their producers (backpressure).

mod chunk;
mod cloneable;
mod ext;
mod managed;
mod state;
#[cfg(test)]
mod test_util;
mod transform;
mod union;

pub use chunk::ChunkStream;
pub use cloneable::CloneableStream;
pub use ext::QueryStreamExt;
pub use managed::ManagedStream;
pub use state::StreamState;
pub use transform::{MultiTransformStream, TransformStream};
pub use union::{UnionMode, UnionStream};

use futures::{Stream, StreamExt};
use rdf_weave_common::StreamError;
use rdf_weave_model::{Bindings, Quad};
use std::pin::Pin;

/// The result of polling a stream.
pub type StreamResult<T> = Result<T, StreamError>;

/// A boxed, type-erased stream that can be sent across threads.
pub type SendableStream<T> = Pin<Box<dyn Stream<Item = StreamResult<T>> + Send>>;

/// A stream of solution mappings.
pub type BindingsStream = SendableStream<Bindings>;

/// A stream of quads.
pub type QuadStream = SendableStream<Quad>;

/// Creates a stream that yields all `items`.
pub fn stream_from_iter<T, I>(items: I) -> SendableStream<T>
where
    T: Send + 'static,
    I: IntoIterator<Item = T>,
    I::IntoIter: Send + 'static,
{
    futures::stream::iter(items.into_iter().map(Ok)).boxed()
}

/// Creates a stream that yields all `results`, including errors.
pub fn stream_from_results<T, I>(results: I) -> SendableStream<T>
where
    T: Send + 'static,
    I: IntoIterator<Item = StreamResult<T>>,
    I::IntoIter: Send + 'static,
{
    futures::stream::iter(results).boxed()
}

/// Creates a stream that ends immediately.
pub fn empty_stream<T: Send + 'static>() -> SendableStream<T> {
    futures::stream::empty().boxed()
}

/// Merges `streams` into a single stream. See [UnionStream].
pub fn union<T: Send + 'static>(
    streams: impl IntoIterator<Item = SendableStream<T>>,
    mode: UnionMode,
) -> SendableStream<T> {
    UnionStream::new(streams, mode).boxed()
}
