use crate::SendableStream;
use futures::{Stream, StreamExt};
use rdf_weave_common::StreamError;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::fmt::{Debug, Formatter};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

/// A stream whose cursors can be cloned.
///
/// Every clone is an independent cursor over the same logical sequence. A clone starts at the
/// position of the cursor it was cloned from. The upstream is only polled once per item; items
/// are buffered until the slowest live cursor has read them. An upstream error is replayed to
/// every cursor once it reaches the position of the error.
///
/// Dropping a cursor (or calling [Self::close]) releases its position. Once the last cursor is
/// gone, the upstream is dropped.
///
/// ```
/// # tokio_test::block_on(async {
/// use futures::StreamExt;
/// use rdf_weave_stream::{stream_from_iter, CloneableStream};
///
/// let mut original = CloneableStream::new(stream_from_iter([1, 2, 3]));
/// assert_eq!(original.next().await.unwrap().unwrap(), 1);
///
/// let clone = original.clone();
/// let rest = clone.map(|item| item.unwrap()).collect::<Vec<_>>().await;
/// assert_eq!(rest, vec![2, 3]);
/// assert_eq!(original.next().await.unwrap().unwrap(), 2);
/// # })
/// ```
pub struct CloneableStream<T> {
    shared: Arc<Mutex<SharedBuffer<T>>>,
    cursor: u64,
}

enum Termination {
    Ended,
    Errored(StreamError),
}

struct CursorState {
    position: u64,
    error_emitted: bool,
}

struct SharedBuffer<T> {
    source: Option<SendableStream<T>>,
    /// Absolute position of `items[0]`.
    offset: u64,
    items: VecDeque<T>,
    /// Reached at absolute position `offset + items.len()`.
    termination: Option<Termination>,
    cursors: FxHashMap<u64, CursorState>,
    next_cursor: u64,
    waiting: Vec<Waker>,
}

impl<T> SharedBuffer<T> {
    fn register_cursor(&mut self, position: u64, error_emitted: bool) -> u64 {
        let cursor = self.next_cursor;
        self.next_cursor += 1;
        self.cursors.insert(
            cursor,
            CursorState {
                position,
                error_emitted,
            },
        );
        cursor
    }

    fn end_position(&self) -> u64 {
        self.offset + self.items.len() as u64
    }

    fn trim(&mut self) {
        let Some(slowest) = self.cursors.values().map(|c| c.position).min() else {
            self.source = None;
            self.items.clear();
            return;
        };
        while self.offset < slowest && self.items.pop_front().is_some() {
            self.offset += 1;
        }
    }

    fn wake_waiting(&mut self) {
        for waker in self.waiting.drain(..) {
            waker.wake();
        }
    }
}

impl<T: Clone> CloneableStream<T> {
    /// Creates the first cursor over `source`.
    pub fn new(source: SendableStream<T>) -> Self {
        let mut shared = SharedBuffer {
            source: Some(source),
            offset: 0,
            items: VecDeque::new(),
            termination: None,
            cursors: FxHashMap::default(),
            next_cursor: 0,
            waiting: Vec::new(),
        };
        let cursor = shared.register_cursor(0, false);
        Self {
            shared: Arc::new(Mutex::new(shared)),
            cursor,
        }
    }
}

impl<T> CloneableStream<T> {
    /// Returns the number of items this cursor has read.
    pub fn position(&self) -> u64 {
        let shared = self.lock();
        shared.cursors.get(&self.cursor).map_or(0, |c| c.position)
    }

    /// Returns the number of items that are buffered for slower cursors.
    pub fn buffered_len(&self) -> usize {
        self.lock().items.len()
    }

    /// Returns the number of live cursors on the shared buffer.
    pub fn cursor_count(&self) -> usize {
        self.lock().cursors.len()
    }

    /// Closes this cursor. Other cursors are not affected.
    pub fn close(self) {
        tracing::trace!(cursor = self.cursor, "Closed cloneable stream cursor");
    }

    fn lock(&self) -> MutexGuard<'_, SharedBuffer<T>> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Clone for CloneableStream<T> {
    fn clone(&self) -> Self {
        let mut shared = self.lock();
        let (position, error_emitted) = shared
            .cursors
            .get(&self.cursor)
            .map_or((0, true), |c| (c.position, c.error_emitted));
        let cursor = shared.register_cursor(position, error_emitted);
        drop(shared);
        Self {
            shared: Arc::clone(&self.shared),
            cursor,
        }
    }
}

impl<T> Drop for CloneableStream<T> {
    fn drop(&mut self) {
        let mut shared = self.lock();
        shared.cursors.remove(&self.cursor);
        shared.trim();
        // The source may only hold the waker of this cursor.
        shared.wake_waiting();
    }
}

impl<T: Clone> Stream for CloneableStream<T> {
    type Item = Result<T, StreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let cursor = self.cursor;
        let mut guard = self.lock();
        let shared = &mut *guard;
        let Some(state) = shared.cursors.get(&cursor) else {
            return Poll::Ready(None);
        };
        let position = state.position;

        // Replay from the buffer.
        if position < shared.end_position() {
            let index = usize::try_from(position - shared.offset)
                .map_err(|_| StreamError::msg("Replay buffer index out of range"))?;
            let Some(item) = shared.items.get(index).cloned() else {
                return Poll::Ready(None);
            };
            if let Some(state) = shared.cursors.get_mut(&cursor) {
                state.position += 1;
            }
            shared.trim();
            return Poll::Ready(Some(Ok(item)));
        }

        if let Some(termination) = &shared.termination {
            return match termination {
                Termination::Ended => Poll::Ready(None),
                Termination::Errored(error) => {
                    let error = error.clone();
                    match shared.cursors.get_mut(&cursor) {
                        Some(state) if !state.error_emitted => {
                            state.error_emitted = true;
                            Poll::Ready(Some(Err(error)))
                        }
                        _ => Poll::Ready(None),
                    }
                }
            };
        }

        let Some(source) = shared.source.as_mut() else {
            return Poll::Ready(None);
        };
        match source.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(item))) => {
                if shared.cursors.len() > 1 {
                    shared.items.push_back(item.clone());
                    if let Some(state) = shared.cursors.get_mut(&cursor) {
                        state.position += 1;
                    }
                    shared.trim();
                } else {
                    shared.offset += 1;
                    if let Some(state) = shared.cursors.get_mut(&cursor) {
                        state.position += 1;
                    }
                }
                shared.wake_waiting();
                Poll::Ready(Some(Ok(item)))
            }
            Poll::Ready(Some(Err(error))) => {
                shared.source = None;
                shared.termination = Some(Termination::Errored(error.clone()));
                if let Some(state) = shared.cursors.get_mut(&cursor) {
                    state.error_emitted = true;
                }
                shared.wake_waiting();
                Poll::Ready(Some(Err(error)))
            }
            Poll::Ready(None) => {
                shared.source = None;
                shared.termination = Some(Termination::Ended);
                shared.wake_waiting();
                Poll::Ready(None)
            }
            Poll::Pending => {
                if !shared.waiting.iter().any(|w| w.will_wake(cx.waker())) {
                    shared.waiting.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

impl<T> Debug for CloneableStream<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let shared = self.lock();
        f.debug_struct("CloneableStream")
            .field("cursor", &self.cursor)
            .field("cursors", &shared.cursors.len())
            .field("buffered", &shared.items.len())
            .finish()
    }
}
