use serde_json::{Map, Value};
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Identifies a listener registered at a [StatisticBase].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A subscription point for runtime events (e.g., discovered links or partial results).
///
/// Listeners are invoked synchronously, in registration order, for every emitted event.
pub struct StatisticBase<T> {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, Listener<T>)>>,
}

impl<T> Default for StatisticBase<T> {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            listeners: Mutex::new(Vec::new()),
        }
    }
}

impl<T> StatisticBase<T> {
    /// Creates a new [StatisticBase] without listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new listener.
    pub fn on(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns whether the listener was registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.lock();
        let length = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != length
    }

    /// Returns the number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.lock().len()
    }

    /// Notifies all listeners about `event`.
    pub fn emit(&self, event: &T) {
        // Listeners may register other listeners, so they are called without holding the lock.
        let listeners = self
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect::<Vec<_>>();
        for listener in listeners {
            listener(event);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(ListenerId, Listener<T>)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Debug for StatisticBase<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticBase")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// An edge in the link discovery graph.
#[derive(Clone, Debug, PartialEq)]
pub struct DiscoveredLink {
    /// The URL of the document in which the link has been discovered, if any.
    pub parent: Option<String>,
    /// The discovered URL.
    pub url: String,
    /// The metadata of the discovered link.
    pub metadata: Map<String, Value>,
    /// The position of this link in the discovery order, starting at zero.
    pub discover_order: u64,
}

/// Tracks links that are discovered while traversing hypermedia documents.
#[derive(Debug, Default)]
pub struct StatisticLinkDiscovery {
    base: StatisticBase<DiscoveredLink>,
    count: AtomicU64,
}

impl StatisticLinkDiscovery {
    /// Creates a new [StatisticLinkDiscovery].
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `url` has been discovered in `parent`.
    pub fn update(&self, url: &str, parent: Option<&str>, metadata: &Map<String, Value>) {
        let discover_order = self.count.fetch_add(1, Ordering::Relaxed);
        self.base.emit(&DiscoveredLink {
            parent: parent.map(ToOwned::to_owned),
            url: url.to_owned(),
            metadata: metadata.clone(),
            discover_order,
        });
    }

    /// Returns the number of discovered links.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// See [StatisticBase::on].
    pub fn on(&self, listener: impl Fn(&DiscoveredLink) + Send + Sync + 'static) -> ListenerId {
        self.base.on(listener)
    }

    /// See [StatisticBase::remove_listener].
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.base.remove_listener(id)
    }
}
