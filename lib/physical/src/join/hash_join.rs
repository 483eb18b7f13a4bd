use futures::{ready, Stream, StreamExt};
use itertools::Either;
use rdf_weave_common::StreamError;
use rdf_weave_model::{Bindings, Term, Variable};
use rdf_weave_stream::{BindingsStream, StreamState};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

/// The materialized right side of a [HashJoin].
#[derive(Debug, Default)]
struct HashTable {
    /// Bindings that bind all join variables, grouped by their values.
    buckets: FxHashMap<Vec<Term>, Vec<Bindings>>,
    /// Bindings that leave at least one join variable unbound.
    partial: Vec<Bindings>,
}

impl HashTable {
    fn insert(&mut self, bindings: Bindings, variables: &[Variable]) {
        match join_key(&bindings, variables) {
            Some(key) => self.buckets.entry(key).or_default().push(bindings),
            None => self.partial.push(bindings),
        }
    }

    fn probe(&self, left: &Bindings, variables: &[Variable]) -> Vec<Bindings> {
        let candidates = match join_key(left, variables) {
            Some(key) => Either::Left(self.buckets.get(&key).into_iter().flatten()),
            None => Either::Right(self.buckets.values().flatten()),
        };
        candidates
            .chain(self.partial.iter())
            .filter_map(|right| left.merge(right))
            .collect()
    }
}

fn join_key(bindings: &Bindings, variables: &[Variable]) -> Option<Vec<Term>> {
    variables
        .iter()
        .map(|variable| bindings.get(variable).cloned())
        .collect()
}

enum HashJoinState {
    /// Materializing the right stream.
    Building {
        right: BindingsStream,
        table: HashTable,
    },
    /// Probing the left stream against the table.
    Probing {
        left: BindingsStream,
        table: HashTable,
        pending: VecDeque<Bindings>,
    },
    /// The join has terminated.
    Done,
}

/// A hash join of two bindings streams.
///
/// The right stream is consumed completely before the first result is produced. Afterward, the
/// left stream is probed in order. Bindings that leave a join variable unbound are compared
/// with every binding of the other side.
///
/// Both inputs and the hash table are released as soon as the join terminates.
pub struct HashJoin {
    variables: Vec<Variable>,
    pending_left: Option<BindingsStream>,
    state: HashJoinState,
    stream_state: StreamState,
}

impl HashJoin {
    /// Creates a new [HashJoin] on the given join `variables`.
    pub fn new(left: BindingsStream, right: BindingsStream, variables: Vec<Variable>) -> Self {
        Self {
            variables,
            pending_left: Some(left),
            state: HashJoinState::Building {
                right,
                table: HashTable::default(),
            },
            stream_state: StreamState::Init,
        }
    }

    /// Returns the lifecycle state of the join.
    pub fn state(&self) -> StreamState {
        self.stream_state
    }

    /// Cancels the join. Both inputs and the hash table are released immediately.
    ///
    /// No-op if the join has already terminated.
    pub fn destroy(&mut self) {
        self.terminate(StreamState::Destroyed);
    }

    fn terminate(&mut self, stream_state: StreamState) {
        if self.stream_state.terminate(stream_state) {
            self.state = HashJoinState::Done;
            self.pending_left = None;
        }
    }

    fn poll_inner(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<Bindings, StreamError>>> {
        loop {
            match &mut self.state {
                HashJoinState::Building { right, table } => {
                    match ready!(right.poll_next_unpin(cx)) {
                        Some(Ok(bindings)) => table.insert(bindings, &self.variables),
                        Some(Err(error)) => return self.fail(error),
                        None => {
                            let table = std::mem::take(table);
                            tracing::trace!(
                                buckets = table.buckets.len(),
                                partial = table.partial.len(),
                                "Built hash table"
                            );
                            let Some(left) = self.pending_left.take() else {
                                self.terminate(StreamState::Ended);
                                return Poll::Ready(None);
                            };
                            self.state = HashJoinState::Probing {
                                left,
                                table,
                                pending: VecDeque::new(),
                            };
                        }
                    }
                }
                HashJoinState::Probing {
                    left,
                    table,
                    pending,
                } => {
                    if let Some(bindings) = pending.pop_front() {
                        self.stream_state.open();
                        return Poll::Ready(Some(Ok(bindings)));
                    }
                    match ready!(left.poll_next_unpin(cx)) {
                        Some(Ok(bindings)) => pending.extend(table.probe(&bindings, &self.variables)),
                        Some(Err(error)) => return self.fail(error),
                        None => {
                            self.terminate(StreamState::Ended);
                            return Poll::Ready(None);
                        }
                    }
                }
                HashJoinState::Done => return Poll::Ready(None),
            }
        }
    }

    fn fail(&mut self, error: StreamError) -> Poll<Option<Result<Bindings, StreamError>>> {
        self.terminate(StreamState::Errored);
        Poll::Ready(Some(Err(error)))
    }
}

impl Stream for HashJoin {
    type Item = Result<Bindings, StreamError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.poll_inner(cx)
    }
}
