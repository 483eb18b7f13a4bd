use crate::{SendableStream, StreamState};
use futures::{Stream, StreamExt};
use rdf_weave_common::StreamError;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Defines how a [UnionStream] interleaves its sources.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum UnionMode {
    /// Takes at most one item from each ready source in turn.
    #[default]
    RoundRobin,
    /// Exhausts the sources one after another.
    Sequential,
}

/// Merges multiple streams into a single stream.
///
/// The union ends once all sources have ended. An error of any source is forwarded and
/// terminates the union. All remaining sources are dropped at that point.
pub struct UnionStream<T> {
    sources: VecDeque<SendableStream<T>>,
    mode: UnionMode,
    state: StreamState,
}

impl<T> UnionStream<T> {
    /// Creates a new [UnionStream].
    pub fn new(sources: impl IntoIterator<Item = SendableStream<T>>, mode: UnionMode) -> Self {
        Self {
            sources: sources.into_iter().collect(),
            mode,
            state: StreamState::Init,
        }
    }

    /// Returns the lifecycle state of the union.
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Ends the union and releases all sources. No-op if the union has terminated.
    pub fn close(&mut self) {
        self.terminate(StreamState::Ended);
    }

    /// Cancels the union and releases all sources. No-op if the union has terminated.
    pub fn destroy(&mut self) {
        self.terminate(StreamState::Destroyed);
    }

    fn terminate(&mut self, state: StreamState) {
        if self.state.terminate(state) {
            self.sources.clear();
        }
    }

    fn poll_sequential(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<T, StreamError>>> {
        while let Some(source) = self.sources.front_mut() {
            match source.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(item))) => return Poll::Ready(Some(Ok(item))),
                Poll::Ready(Some(Err(error))) => return self.fail(error),
                Poll::Ready(None) => {
                    self.sources.pop_front();
                }
                Poll::Pending => return Poll::Pending,
            }
        }
        Poll::Ready(None)
    }

    fn poll_round_robin(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<T, StreamError>>> {
        // Every source is polled at most once per call. The source that yields an item moves to
        // the back so that the next call starts with its successor.
        let mut remaining = self.sources.len();
        while remaining > 0 {
            remaining -= 1;
            let Some(mut source) = self.sources.pop_front() else {
                break;
            };
            match source.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(item))) => {
                    self.sources.push_back(source);
                    return Poll::Ready(Some(Ok(item)));
                }
                Poll::Ready(Some(Err(error))) => return self.fail(error),
                Poll::Ready(None) => {}
                Poll::Pending => self.sources.push_back(source),
            }
        }

        if self.sources.is_empty() {
            Poll::Ready(None)
        } else {
            Poll::Pending
        }
    }

    fn fail(&mut self, error: StreamError) -> Poll<Option<Result<T, StreamError>>> {
        self.terminate(StreamState::Errored);
        Poll::Ready(Some(Err(error)))
    }
}

impl<T> Stream for UnionStream<T> {
    type Item = Result<T, StreamError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.state.is_terminal() {
            return Poll::Ready(None);
        }

        let result = match self.mode {
            UnionMode::RoundRobin => self.poll_round_robin(cx),
            UnionMode::Sequential => self.poll_sequential(cx),
        };
        match &result {
            Poll::Ready(Some(Ok(_))) => self.state.open(),
            Poll::Ready(None) => self.terminate(StreamState::Ended),
            Poll::Ready(Some(Err(_))) | Poll::Pending => {}
        }
        result
    }
}
