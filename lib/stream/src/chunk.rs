use crate::{SendableStream, StreamState};
use futures::{ready, Stream, StreamExt};
use rdf_weave_common::StreamError;
use std::num::NonZeroUsize;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Groups the items of a stream into batches of at most `size` items.
///
/// A batch is emitted as soon as it is full. The last batch contains the remaining items and
/// may be shorter. An upstream error is forwarded and terminates the stream; the items of the
/// incomplete batch are discarded.
pub struct ChunkStream<T> {
    source: Option<SendableStream<T>>,
    size: NonZeroUsize,
    batch: Vec<T>,
    state: StreamState,
}

impl<T> ChunkStream<T> {
    /// Creates a new [ChunkStream].
    ///
    /// Returns an error if `size` is zero.
    pub fn try_new(source: SendableStream<T>, size: usize) -> Result<Self, StreamError> {
        let size = NonZeroUsize::new(size)
            .ok_or_else(|| StreamError::msg("Chunk size must be greater than zero"))?;
        Ok(Self::new(source, size))
    }

    /// Creates a new [ChunkStream].
    pub fn new(source: SendableStream<T>, size: NonZeroUsize) -> Self {
        Self {
            source: Some(source),
            size,
            batch: Vec::with_capacity(size.get()),
            state: StreamState::Init,
        }
    }

    /// Returns the lifecycle state of the stream.
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Ends the stream without emitting the incomplete batch and releases the upstream. No-op if
    /// the stream has terminated.
    pub fn close(&mut self) {
        self.terminate(StreamState::Ended);
    }

    /// Cancels the stream and releases the upstream. No-op if the stream has terminated.
    pub fn destroy(&mut self) {
        self.terminate(StreamState::Destroyed);
    }

    fn terminate(&mut self, state: StreamState) {
        if self.state.terminate(state) {
            self.source = None;
            self.batch = Vec::new();
        }
    }
}

// The pending batch is never pinned.
impl<T> Unpin for ChunkStream<T> {}

impl<T> Stream for ChunkStream<T> {
    type Item = Result<Vec<T>, StreamError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            let Some(source) = self.source.as_mut() else {
                return Poll::Ready(None);
            };

            match ready!(source.poll_next_unpin(cx)) {
                Some(Ok(item)) => {
                    self.batch.push(item);
                    if self.batch.len() == self.size.get() {
                        self.state.open();
                        let capacity = self.size.get();
                        let batch =
                            std::mem::replace(&mut self.batch, Vec::with_capacity(capacity));
                        return Poll::Ready(Some(Ok(batch)));
                    }
                }
                Some(Err(error)) => {
                    self.terminate(StreamState::Errored);
                    return Poll::Ready(Some(Err(error)));
                }
                None => {
                    let batch = std::mem::take(&mut self.batch);
                    self.terminate(StreamState::Ended);
                    if batch.is_empty() {
                        return Poll::Ready(None);
                    }
                    return Poll::Ready(Some(Ok(batch)));
                }
            }
        }
    }
}
