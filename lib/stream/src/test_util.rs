use crate::{stream_from_iter, SendableStream, StreamResult};
use futures::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Set once the stream that owns it is dropped.
#[derive(Clone, Debug, Default)]
pub(crate) struct DropFlag(Arc<AtomicBool>);

impl DropFlag {
    pub(crate) fn is_dropped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

struct DropGuard(DropFlag);

impl Drop for DropGuard {
    fn drop(&mut self) {
        self.0 .0.store(true, Ordering::SeqCst);
    }
}

/// A stream that yields `items` and then stays pending. The returned flag reports whether the
/// stream has been dropped.
pub(crate) fn tracked_stream<T: Send + 'static>(items: Vec<T>) -> (SendableStream<T>, DropFlag) {
    let flag = DropFlag::default();
    let guard = DropGuard(flag.clone());
    let stream = stream_from_iter(items)
        .chain(futures::stream::pending::<StreamResult<T>>())
        .map(move |item| {
            let _guard = &guard;
            item
        })
        .boxed();
    (stream, flag)
}
