use crate::{
    ChunkStream, CloneableStream, ManagedStream, MultiTransformStream, SendableStream,
    StreamResult, TransformStream,
};
use futures::{Stream, StreamExt};
use rdf_weave_common::StreamError;

/// Composition primitives for streams of `Result<T, StreamError>`.
///
/// ```
/// # tokio_test::block_on(async {
/// use futures::StreamExt;
/// use rdf_weave_stream::{stream_from_iter, QueryStreamExt};
///
/// let chunks = stream_from_iter(1..=5)
///     .transform(|item: u32| (item != 3).then_some(item * 2))
///     .chunk(2)
///     .unwrap()
///     .map(|chunk| chunk.unwrap())
///     .collect::<Vec<_>>()
///     .await;
/// assert_eq!(chunks, vec![vec![2, 4], vec![8, 10]]);
/// # })
/// ```
pub trait QueryStreamExt<T>: Stream<Item = StreamResult<T>> + Send + Sized + 'static
where
    T: Send + 'static,
{
    /// Erases the type of this stream.
    fn into_sendable(self) -> SendableStream<T> {
        self.boxed()
    }

    /// Maps every item to zero or one output items. See [TransformStream].
    fn transform<U: Send + 'static>(
        self,
        transform: impl FnMut(T) -> Option<U> + Send + 'static,
    ) -> SendableStream<U> {
        TransformStream::new(self.boxed(), transform).boxed()
    }

    /// Maps every item to an inner stream and concatenates the results in order. See
    /// [MultiTransformStream].
    fn multi_transform<U: Send + 'static>(
        self,
        transform: impl FnMut(T) -> SendableStream<U> + Send + 'static,
    ) -> SendableStream<U> {
        MultiTransformStream::new(self.boxed(), transform).boxed()
    }

    /// Groups the items into batches of at most `size`. Fails if `size` is zero.
    fn chunk(self, size: usize) -> Result<SendableStream<Vec<T>>, StreamError> {
        Ok(ChunkStream::try_new(self.boxed(), size)?.boxed())
    }

    /// Turns this stream into a stream whose cursors can be cloned.
    fn into_cloneable(self) -> CloneableStream<T>
    where
        T: Clone,
    {
        CloneableStream::new(self.boxed())
    }

    /// Wraps this stream into a [ManagedStream].
    fn into_managed(self) -> ManagedStream<T> {
        ManagedStream::new(self.boxed())
    }
}

impl<T, S> QueryStreamExt<T> for S
where
    T: Send + 'static,
    S: Stream<Item = StreamResult<T>> + Send + Sized + 'static,
{
}
