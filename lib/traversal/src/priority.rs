use crate::{Link, LinkQueue};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Orders two links. Links that compare as [Ordering::Less] are returned first.
pub type LinkComparator = Arc<dyn Fn(&Link, &Link) -> Ordering + Send + Sync>;

/// Returns links in the order defined by a [LinkComparator].
///
/// Links that compare as equal are returned in insertion order.
///
/// ```
/// use rdf_weave_traversal::{Link, LinkQueue, LinkQueuePriority};
///
/// let mut queue = LinkQueuePriority::by_metadata_number("v");
/// queue.push(Link::new("http://example.com/a").with_metadata("v", 5), None);
/// queue.push(Link::new("http://example.com/b").with_metadata("v", 1), None);
///
/// assert_eq!(queue.pop().unwrap().metadata["v"], 1);
/// ```
pub struct LinkQueuePriority {
    comparator: LinkComparator,
    links: BinaryHeap<QueuedLink>,
    next_sequence: u64,
}

/// A heap entry. The greatest entry is the link that is returned next.
struct QueuedLink {
    link: Link,
    /// Insertion counter, breaks ties between equal links.
    sequence: u64,
    comparator: LinkComparator,
}

impl Ord for QueuedLink {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.comparator)(&other.link, &self.link)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for QueuedLink {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedLink {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedLink {}

impl LinkQueuePriority {
    /// Creates a new empty [LinkQueuePriority].
    pub fn new(comparator: LinkComparator) -> Self {
        Self {
            comparator,
            links: BinaryHeap::new(),
            next_sequence: 0,
        }
    }

    /// Creates a queue that returns links in ascending order of the numeric metadata entry
    /// `field`. Links without a numeric `field` are returned last.
    pub fn by_metadata_number(field: impl Into<String>) -> Self {
        Self::new(metadata_number_comparator(field))
    }
}

/// Compares links by the numeric metadata entry `field` in ascending order.
pub fn metadata_number_comparator(field: impl Into<String>) -> LinkComparator {
    let field = field.into();
    Arc::new(move |a: &Link, b: &Link| {
        let value = |link: &Link| {
            link.metadata
                .get(&field)
                .and_then(serde_json::Value::as_f64)
                .unwrap_or(f64::INFINITY)
        };
        value(a).total_cmp(&value(b))
    })
}

impl LinkQueue for LinkQueuePriority {
    fn push(&mut self, link: Link, _parent: Option<&Link>) -> bool {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.links.push(QueuedLink {
            link,
            sequence,
            comparator: Arc::clone(&self.comparator),
        });
        true
    }

    fn pop(&mut self) -> Option<Link> {
        self.links.pop().map(|queued| queued.link)
    }

    fn peek(&self) -> Option<&Link> {
        self.links.peek().map(|queued| &queued.link)
    }

    fn size(&self) -> usize {
        self.links.len()
    }
}

impl Debug for LinkQueuePriority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkQueuePriority")
            .field("size", &self.links.len())
            .field("next", &self.peek())
            .finish_non_exhaustive()
    }
}
