use crate::{SendableStream, StreamState};
use futures::{ready, Stream, StreamExt};
use rdf_weave_common::StreamError;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Maps every item of a stream to zero or one output items.
///
/// An upstream error is forwarded and terminates the stream. The upstream is dropped as soon as
/// the stream terminates.
pub struct TransformStream<T, U> {
    source: Option<SendableStream<T>>,
    transform: Box<dyn FnMut(T) -> Option<U> + Send>,
    state: StreamState,
}

impl<T, U> TransformStream<T, U> {
    /// Creates a new [TransformStream].
    pub fn new(
        source: SendableStream<T>,
        transform: impl FnMut(T) -> Option<U> + Send + 'static,
    ) -> Self {
        Self {
            source: Some(source),
            transform: Box::new(transform),
            state: StreamState::Init,
        }
    }

    /// Returns the lifecycle state of the stream.
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Ends the stream and releases the upstream. No-op if the stream has terminated.
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
        }
    }
}

impl<T, U> Stream for TransformStream<T, U> {
    type Item = Result<U, StreamError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            let Some(source) = self.source.as_mut() else {
                return Poll::Ready(None);
            };

            match ready!(source.poll_next_unpin(cx)) {
                Some(Ok(item)) => {
                    self.state.open();
                    if let Some(result) = (self.transform)(item) {
                        return Poll::Ready(Some(Ok(result)));
                    }
                }
                Some(Err(error)) => {
                    self.terminate(StreamState::Errored);
                    return Poll::Ready(Some(Err(error)));
                }
                None => {
                    self.terminate(StreamState::Ended);
                    return Poll::Ready(None);
                }
            }
        }
    }
}

enum MultiTransformState<U> {
    /// Waiting for the next upstream item.
    Pulling,
    /// Draining the inner stream of the last upstream item.
    Draining { inner: SendableStream<U> },
    /// The stream has terminated.
    Done,
}

/// Maps every item of a stream to an inner stream and concatenates the inner streams.
///
/// The inner stream of an item is fully drained before the next upstream item is pulled, so
/// the output preserves the upstream order. Errors of the upstream or of an inner stream are
/// forwarded and terminate the stream. Once terminated, the upstream and the active inner
/// stream are dropped.
pub struct MultiTransformStream<T, U> {
    source: Option<SendableStream<T>>,
    transform: Box<dyn FnMut(T) -> SendableStream<U> + Send>,
    state: MultiTransformState<U>,
    stream_state: StreamState,
}

impl<T, U> MultiTransformStream<T, U> {
    /// Creates a new [MultiTransformStream].
    pub fn new(
        source: SendableStream<T>,
        transform: impl FnMut(T) -> SendableStream<U> + Send + 'static,
    ) -> Self {
        Self {
            source: Some(source),
            transform: Box::new(transform),
            state: MultiTransformState::Pulling,
            stream_state: StreamState::Init,
        }
    }

    /// Returns the lifecycle state of the stream.
    pub fn state(&self) -> StreamState {
        self.stream_state
    }

    /// Ends the stream and releases the upstream. No-op if the stream has terminated.
    pub fn close(&mut self) {
        self.terminate(StreamState::Ended);
    }

    /// Cancels the stream and releases the upstream. No-op if the stream has terminated.
    pub fn destroy(&mut self) {
        self.terminate(StreamState::Destroyed);
    }

    fn terminate(&mut self, stream_state: StreamState) {
        if self.stream_state.terminate(stream_state) {
            self.state = MultiTransformState::Done;
            self.source = None;
        }
    }

    fn poll_inner(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<U, StreamError>>> {
        loop {
            match &mut self.state {
                MultiTransformState::Pulling => {
                    let Some(source) = self.source.as_mut() else {
                        self.terminate(StreamState::Ended);
                        return Poll::Ready(None);
                    };
                    match ready!(source.poll_next_unpin(cx)) {
                        Some(Ok(item)) => {
                            let inner = (self.transform)(item);
                            self.state = MultiTransformState::Draining { inner };
                        }
                        Some(Err(error)) => {
                            self.terminate(StreamState::Errored);
                            return Poll::Ready(Some(Err(error)));
                        }
                        None => {
                            self.terminate(StreamState::Ended);
                            return Poll::Ready(None);
                        }
                    }
                }
                MultiTransformState::Draining { inner } => match ready!(inner.poll_next_unpin(cx)) {
                    Some(Ok(item)) => {
                        self.stream_state.open();
                        return Poll::Ready(Some(Ok(item)));
                    }
                    Some(Err(error)) => {
                        self.terminate(StreamState::Errored);
                        return Poll::Ready(Some(Err(error)));
                    }
                    None => self.state = MultiTransformState::Pulling,
                },
                MultiTransformState::Done => return Poll::Ready(None),
            }
        }
    }
}

impl<T, U> Stream for MultiTransformStream<T, U> {
    type Item = Result<U, StreamError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.poll_inner(cx)
    }
}
