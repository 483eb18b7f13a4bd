use crate::{Link, LinkQueue};
use rdf_weave_common::statistics::StatisticLinkDiscovery;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// Rejects links whose URL has already been pushed and records which link discovered which.
///
/// ```
/// use rdf_weave_traversal::{Link, LinkQueue, LinkQueueFifo, LinkQueueFilterDuplicates};
///
/// let mut queue = LinkQueueFilterDuplicates::new(LinkQueueFifo::new());
/// let root = Link::new("http://example.com/");
/// assert!(queue.push(root.clone(), None));
/// assert!(queue.push(Link::new("http://example.com/a"), Some(&root)));
/// assert!(!queue.push(Link::new("http://example.com/"), None));
///
/// assert_eq!(queue.parent_of("http://example.com/a"), Some("http://example.com/"));
/// ```
#[derive(Debug)]
pub struct LinkQueueFilterDuplicates<Q> {
    inner: Q,
    seen: FxHashSet<String>,
    parents: FxHashMap<String, String>,
}

impl<Q: LinkQueue> LinkQueueFilterDuplicates<Q> {
    /// Wraps `inner`.
    pub fn new(inner: Q) -> Self {
        Self {
            inner,
            seen: FxHashSet::default(),
            parents: FxHashMap::default(),
        }
    }

    /// Returns whether a link with `url` has been accepted before.
    pub fn has_seen(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Returns the URL of the link in which `url` has been discovered.
    pub fn parent_of(&self, url: &str) -> Option<&str> {
        self.parents.get(url).map(String::as_str)
    }

    /// Returns the chain of URLs that led to `url`, starting with the root.
    pub fn discovery_path(&self, url: &str) -> Vec<String> {
        let mut path = vec![url.to_owned()];
        let mut current = url;
        // Every URL is accepted once, so the chain has at most `seen.len()` entries.
        while let Some(parent) = self.parent_of(current) {
            if path.len() > self.seen.len() {
                break;
            }
            path.push(parent.to_owned());
            current = parent;
        }
        path.reverse();
        path
    }

    /// Returns the wrapped queue.
    pub fn into_inner(self) -> Q {
        self.inner
    }
}

impl<Q: LinkQueue> LinkQueue for LinkQueueFilterDuplicates<Q> {
    fn push(&mut self, link: Link, parent: Option<&Link>) -> bool {
        if self.seen.contains(&link.url) {
            tracing::trace!(url = %link.url, "Rejected duplicate link");
            return false;
        }

        let url = link.url.clone();
        if !self.inner.push(link, parent) {
            return false;
        }
        if let Some(parent) = parent {
            self.parents.insert(url.clone(), parent.url.clone());
        }
        self.seen.insert(url);
        true
    }

    fn pop(&mut self) -> Option<Link> {
        self.inner.pop()
    }

    fn peek(&self) -> Option<&Link> {
        self.inner.peek()
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Rejects all links once a maximum number of links has been accepted.
#[derive(Debug)]
pub struct LinkQueueLimitCount<Q> {
    inner: Q,
    limit: usize,
    accepted: usize,
}

impl<Q: LinkQueue> LinkQueueLimitCount<Q> {
    /// Wraps `inner` and accepts at most `limit` links.
    pub fn new(inner: Q, limit: usize) -> Self {
        Self {
            inner,
            limit,
            accepted: 0,
        }
    }

    /// Returns the number of accepted links.
    pub fn accepted(&self) -> usize {
        self.accepted
    }
}

impl<Q: LinkQueue> LinkQueue for LinkQueueLimitCount<Q> {
    fn push(&mut self, link: Link, parent: Option<&Link>) -> bool {
        if self.accepted >= self.limit {
            tracing::debug!(limit = self.limit, url = %link.url, "Link limit reached");
            return false;
        }
        let accepted = self.inner.push(link, parent);
        if accepted {
            self.accepted += 1;
        }
        accepted
    }

    fn pop(&mut self) -> Option<Link> {
        self.inner.pop()
    }

    fn peek(&self) -> Option<&Link> {
        self.inner.peek()
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Reports every accepted link to a [StatisticLinkDiscovery].
#[derive(Debug)]
pub struct LinkQueueStatistics<Q> {
    inner: Q,
    statistic: Arc<StatisticLinkDiscovery>,
}

impl<Q: LinkQueue> LinkQueueStatistics<Q> {
    /// Wraps `inner`.
    pub fn new(inner: Q, statistic: Arc<StatisticLinkDiscovery>) -> Self {
        Self { inner, statistic }
    }
}

impl<Q: LinkQueue> LinkQueue for LinkQueueStatistics<Q> {
    fn push(&mut self, link: Link, parent: Option<&Link>) -> bool {
        let url = link.url.clone();
        let metadata = link.metadata.clone();
        let accepted = self.inner.push(link, parent);
        if accepted {
            self.statistic
                .update(&url, parent.map(|p| p.url.as_str()), &metadata);
        }
        accepted
    }

    fn pop(&mut self) -> Option<Link> {
        self.inner.pop()
    }

    fn peek(&self) -> Option<&Link> {
        self.inner.peek()
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LinkQueueFifo;
    use std::sync::Mutex;

    #[test]
    fn filter_duplicates_rejects_seen_urls() {
        let mut queue = LinkQueueFilterDuplicates::new(LinkQueueFifo::new());
        assert!(queue.push(Link::new("a"), None));
        assert!(!queue.push(Link::new("a"), None));

        // Popping does not make a link new again.
        queue.pop();
        assert!(!queue.push(Link::new("a"), None));
        assert!(queue.is_empty());
        assert!(queue.has_seen("a"));
    }

    #[test]
    fn filter_duplicates_tracks_discovery_path() {
        let mut queue = LinkQueueFilterDuplicates::new(LinkQueueFifo::new());
        let root = Link::new("root");
        let child = Link::new("child");
        queue.push(root.clone(), None);
        queue.push(child.clone(), Some(&root));
        queue.push(Link::new("grandchild"), Some(&child));
        assert!(!queue.push(Link::new("child"), Some(&child)));

        assert_eq!(queue.parent_of("root"), None);
        assert_eq!(queue.parent_of("child"), Some("root"));
        assert_eq!(queue.discovery_path("grandchild"), vec!["root", "child", "grandchild"]);
    }

    #[test]
    fn limit_count_rejects_links_beyond_limit() {
        let mut queue = LinkQueueLimitCount::new(LinkQueueFifo::new(), 2);
        assert!(queue.push(Link::new("a"), None));
        assert!(queue.push(Link::new("b"), None));
        assert!(!queue.push(Link::new("c"), None));

        queue.pop();
        assert!(!queue.push(Link::new("d"), None));
        assert_eq!(queue.accepted(), 2);
        assert_eq!(queue.size(), 1);
    }

    #[test]
    fn statistics_report_accepted_links_only() {
        let statistic = Arc::new(StatisticLinkDiscovery::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let inner = Arc::clone(&seen);
        statistic.on(move |link| inner.lock().unwrap().push(link.url.clone()));

        let mut queue = LinkQueueStatistics::new(
            LinkQueueFilterDuplicates::new(LinkQueueFifo::new()),
            Arc::clone(&statistic),
        );
        let root = Link::new("root");
        queue.push(root.clone(), None);
        queue.push(Link::new("a"), Some(&root));
        queue.push(Link::new("a"), Some(&root));

        assert_eq!(*seen.lock().unwrap(), vec!["root", "a"]);
        assert_eq!(statistic.count(), 2);
    }

    #[test]
    fn decorators_delegate_peek_and_pop() {
        let mut queue = LinkQueueLimitCount::new(
            LinkQueueFilterDuplicates::new(LinkQueueFifo::new()),
            10,
        );
        queue.push(Link::new("a"), None);
        queue.push(Link::new("b"), None);

        assert_eq!(queue.peek().unwrap().url, "a");
        assert_eq!(queue.pop().unwrap().url, "a");
        assert_eq!(queue.size(), 1);
    }
}
