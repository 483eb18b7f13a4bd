use futures::{ready, Stream, StreamExt};
use rdf_weave_common::StreamError;
use rdf_weave_stream::{CloneableStream, SendableStream, StreamState};
use std::fmt::{Debug, Formatter};
use std::pin::Pin;
use std::task::{Context, Poll};

type JoinFn<L, R, O> = Box<dyn FnMut(&L, &R) -> Option<O> + Send>;

enum NestedLoopJoinState<L, R> {
    /// Waiting for the next item of the left stream.
    PullingLeft,
    /// Joining `left_item` with a fresh cursor over the right stream.
    Joining {
        left_item: L,
        right: CloneableStream<R>,
    },
    /// The join has terminated.
    Done,
}

/// A lazy nested-loop join of two streams.
///
/// For every item of the left stream (in order), the join clones the right stream and emits
/// every `Some` result of the join function, in the order of the right stream, before it
/// advances the left stream. The right stream is therefore read once from its source and
/// replayed for every left item.
///
/// The original right cursor is closed exactly once, when the join terminates. An error of
/// either input is emitted once and terminates the join.
///
/// ```
/// # tokio_test::block_on(async {
/// use futures::StreamExt;
/// use rdf_weave_physical::join::NestedLoopJoin;
/// use rdf_weave_stream::{stream_from_iter, CloneableStream};
///
/// let left = stream_from_iter([1, 2]);
/// let right = CloneableStream::new(stream_from_iter([10, 20]));
/// let join = NestedLoopJoin::new(left, right, |l: &u32, r: &u32| Some(l + r));
///
/// let result = join.map(|item| item.unwrap()).collect::<Vec<_>>().await;
/// assert_eq!(result, vec![11, 21, 12, 22]);
/// # })
/// ```
pub struct NestedLoopJoin<L, R, O> {
    left: Option<SendableStream<L>>,
    right: Option<CloneableStream<R>>,
    join: JoinFn<L, R, O>,
    state: NestedLoopJoinState<L, R>,
    stream_state: StreamState,
    on_right_closed: Option<Box<dyn FnOnce() + Send>>,
}

// Neither the left item nor the streams are structurally pinned.
impl<L, R, O> Unpin for NestedLoopJoin<L, R, O> {}

impl<L, R: Clone, O> NestedLoopJoin<L, R, O> {
    /// Creates a new [NestedLoopJoin].
    pub fn new(
        left: SendableStream<L>,
        right: CloneableStream<R>,
        join: impl FnMut(&L, &R) -> Option<O> + Send + 'static,
    ) -> Self {
        Self {
            left: Some(left),
            right: Some(right),
            join: Box::new(join),
            state: NestedLoopJoinState::PullingLeft,
            stream_state: StreamState::Init,
            on_right_closed: None,
        }
    }

    /// Registers a hook that is called once the join closes the original right cursor.
    #[must_use]
    pub fn with_on_right_closed(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_right_closed = Some(Box::new(hook));
        self
    }

    /// Returns the lifecycle state of the join.
    pub fn state(&self) -> StreamState {
        self.stream_state
    }

    /// Cancels the join. The active right cursor and the left stream are released immediately.
    ///
    /// No-op if the join has already terminated.
    pub fn destroy(&mut self) {
        if !self.stream_state.is_terminal() {
            self.terminate(StreamState::Destroyed);
        }
    }

    fn terminate(&mut self, stream_state: StreamState) {
        self.state = NestedLoopJoinState::Done;
        self.left = None;
        self.close_right();
        self.stream_state = stream_state;
    }

    fn close_right(&mut self) {
        if let Some(right) = self.right.take() {
            right.close();
            if let Some(hook) = self.on_right_closed.take() {
                hook();
            }
        }
    }

    fn poll_inner(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<O, StreamError>>> {
        loop {
            match &mut self.state {
                NestedLoopJoinState::PullingLeft => {
                    let (Some(left), Some(right)) = (self.left.as_mut(), self.right.as_ref())
                    else {
                        self.terminate(StreamState::Ended);
                        return Poll::Ready(None);
                    };

                    match ready!(left.poll_next_unpin(cx)) {
                        Some(Ok(left_item)) => {
                            let right = right.clone();
                            self.state = NestedLoopJoinState::Joining { left_item, right };
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
                NestedLoopJoinState::Joining { left_item, right } => {
                    match ready!(right.poll_next_unpin(cx)) {
                        Some(Ok(right_item)) => {
                            if let Some(result) = (self.join)(left_item, &right_item) {
                                return Poll::Ready(Some(Ok(result)));
                            }
                        }
                        Some(Err(error)) => {
                            self.terminate(StreamState::Errored);
                            return Poll::Ready(Some(Err(error)));
                        }
                        None => self.state = NestedLoopJoinState::PullingLeft,
                    }
                }
                NestedLoopJoinState::Done => return Poll::Ready(None),
            }
        }
    }
}

impl<L, R: Clone, O> Stream for NestedLoopJoin<L, R, O> {
    type Item = Result<O, StreamError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let result = self.poll_inner(cx);
        if matches!(result, Poll::Ready(Some(Ok(_))) | Poll::Pending)
            && self.stream_state == StreamState::Init
        {
            self.stream_state = StreamState::Open;
        }
        result
    }
}

impl<L, R, O> Debug for NestedLoopJoin<L, R, O> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NestedLoopJoin")
            .field("state", &self.stream_state)
            .field("right", &self.right)
            .finish_non_exhaustive()
    }
}
