use crate::Link;
use std::collections::VecDeque;
use std::fmt::Debug;

/// A queue of links that still have to be followed.
///
/// Implementations define in which order links are returned. Decorators (e.g.,
/// [LinkQueueFilterDuplicates](crate::LinkQueueFilterDuplicates)) wrap another queue, delegate
/// all operations to it, and apply their own policy before or after delegating.
pub trait LinkQueue: Debug + Send {
    /// Adds `link`, which has been discovered in `parent`, to the queue.
    ///
    /// Returns `false` if the queue rejected the link. A rejected link is not enqueued.
    fn push(&mut self, link: Link, parent: Option<&Link>) -> bool;

    /// Removes and returns the next link.
    fn pop(&mut self) -> Option<Link>;

    /// Returns the next link without removing it.
    fn peek(&self) -> Option<&Link>;

    /// Returns the number of queued links.
    fn size(&self) -> usize;

    /// Returns whether no link is queued.
    fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

impl<Q: LinkQueue + ?Sized> LinkQueue for Box<Q> {
    fn push(&mut self, link: Link, parent: Option<&Link>) -> bool {
        self.as_mut().push(link, parent)
    }

    fn pop(&mut self) -> Option<Link> {
        self.as_mut().pop()
    }

    fn peek(&self) -> Option<&Link> {
        self.as_ref().peek()
    }

    fn size(&self) -> usize {
        self.as_ref().size()
    }

    fn is_empty(&self) -> bool {
        self.as_ref().is_empty()
    }
}

/// Returns links in insertion order.
#[derive(Debug, Default)]
pub struct LinkQueueFifo {
    links: VecDeque<Link>,
}

impl LinkQueueFifo {
    /// Creates a new empty [LinkQueueFifo].
    pub fn new() -> Self {
        Self::default()
    }
}

impl LinkQueue for LinkQueueFifo {
    fn push(&mut self, link: Link, _parent: Option<&Link>) -> bool {
        self.links.push_back(link);
        true
    }

    fn pop(&mut self) -> Option<Link> {
        self.links.pop_front()
    }

    fn peek(&self) -> Option<&Link> {
        self.links.front()
    }

    fn size(&self) -> usize {
        self.links.len()
    }
}

/// Returns the most recently pushed link first (depth-first traversal).
#[derive(Debug, Default)]
pub struct LinkQueueLifo {
    links: Vec<Link>,
}

impl LinkQueueLifo {
    /// Creates a new empty [LinkQueueLifo].
    pub fn new() -> Self {
        Self::default()
    }
}

impl LinkQueue for LinkQueueLifo {
    fn push(&mut self, link: Link, _parent: Option<&Link>) -> bool {
        self.links.push(link);
        true
    }

    fn pop(&mut self) -> Option<Link> {
        self.links.pop()
    }

    fn peek(&self) -> Option<&Link> {
        self.links.last()
    }

    fn size(&self) -> usize {
        self.links.len()
    }
}
