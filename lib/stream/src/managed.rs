use crate::{SendableStream, StreamState};
use futures::task::noop_waker_ref;
use futures::{Stream, StreamExt};
use rdf_weave_common::StreamError;
use std::fmt::{Debug, Formatter};
use std::pin::Pin;
use std::task::{Context, Poll};

/// A stream that tracks its lifecycle and can be read without awaiting.
///
/// [ManagedStream] is both a regular [Stream] (for consumers that `await` new items) and a
/// pull-based source with a non-blocking [Self::read]. Once the stream reaches a terminal
/// [StreamState], it never produces items again. Closing and destroying are idempotent.
///
/// ```
/// # tokio_test::block_on(async {
/// use futures::StreamExt;
/// use rdf_weave_stream::{stream_from_iter, ManagedStream, StreamState};
///
/// let mut stream = ManagedStream::new(stream_from_iter([1, 2, 3]));
/// assert_eq!(stream.read(), Some(1));
///
/// stream.destroy();
/// assert_eq!(stream.read(), None);
/// assert_eq!(stream.state(), StreamState::Destroyed);
/// assert!(stream.next().await.is_none());
/// # })
/// ```
pub struct ManagedStream<T> {
    inner: Option<SendableStream<T>>,
    state: StreamState,
    error: Option<StreamError>,
}

impl<T> ManagedStream<T> {
    /// Creates a new [ManagedStream] in the [StreamState::Init] state.
    pub fn new(inner: SendableStream<T>) -> Self {
        Self {
            inner: Some(inner),
            state: StreamState::Init,
            error: None,
        }
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Returns the error that terminated the stream, if any.
    pub fn error(&self) -> Option<&StreamError> {
        self.error.as_ref()
    }

    /// Returns whether the stream has reached a terminal state.
    pub fn is_terminated(&self) -> bool {
        self.state.is_terminal()
    }

    /// Returns the next item if it is available immediately.
    ///
    /// Returns [None] if no item is available right now or the stream has terminated. The
    /// caller should then wait for readiness via [Stream::poll_next]. An upstream error moves
    /// the stream to [StreamState::Errored] and can be inspected with [Self::error].
    pub fn read(&mut self) -> Option<T> {
        let mut cx = Context::from_waker(noop_waker_ref());
        match self.poll_next_unpin(&mut cx) {
            Poll::Ready(Some(Ok(item))) => Some(item),
            Poll::Ready(Some(Err(_)) | None) | Poll::Pending => None,
        }
    }

    /// Ends the stream and releases the upstream. No-op if the stream has terminated.
    pub fn close(&mut self) {
        if self.terminate(StreamState::Ended) {
            tracing::trace!("Closed stream");
        }
    }

    /// Cancels the stream and releases the upstream. No-op if the stream has terminated.
    ///
    /// A destroyed stream behaves like an ended stream towards its consumer. It never emits an
    /// error.
    pub fn destroy(&mut self) {
        if self.terminate(StreamState::Destroyed) {
            tracing::trace!("Destroyed stream");
        }
    }

    fn terminate(&mut self, state: StreamState) -> bool {
        if !self.state.terminate(state) {
            return false;
        }
        self.inner = None;
        true
    }
}

impl<T> Stream for ManagedStream<T> {
    type Item = Result<T, StreamError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let Some(inner) = self.inner.as_mut() else {
            return Poll::Ready(None);
        };

        match inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(item))) => {
                self.state = StreamState::Open;
                Poll::Ready(Some(Ok(item)))
            }
            Poll::Ready(Some(Err(error))) => {
                self.terminate(StreamState::Errored);
                self.error = Some(error.clone());
                Poll::Ready(Some(Err(error)))
            }
            Poll::Ready(None) => {
                self.terminate(StreamState::Ended);
                Poll::Ready(None)
            }
            Poll::Pending => {
                self.state.open();
                Poll::Pending
            }
        }
    }
}

impl<T> Debug for ManagedStream<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedStream")
            .field("state", &self.state)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}
