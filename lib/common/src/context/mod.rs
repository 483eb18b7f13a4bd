pub mod keys;

use crate::error::MissingContextKey;
use rustc_hash::FxHashMap;
use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;

/// A typed key of an [ActionContext].
///
/// The key carries the type of its value, so that lookups do not require any casts by the
/// caller. Keys are identified by their name. Two keys with the same name but different value
/// types refer to the same entry; a lookup with the wrong value type yields [None].
pub struct ActionContextKey<V> {
    name: &'static str,
    _value: PhantomData<fn() -> V>,
}

impl<V> ActionContextKey<V> {
    /// Creates a new key with the given unique `name`.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _value: PhantomData,
        }
    }

    /// Returns the name of this key.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<V> Clone for ActionContextKey<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for ActionContextKey<V> {}

impl<V> Debug for ActionContextKey<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ActionContextKey").field(&self.name).finish()
    }
}

type ContextValue = Arc<dyn Any + Send + Sync>;

/// An immutable, typed key-value store that is passed along with every action.
///
/// Modifying operations ([Self::set], [Self::delete], [Self::merge]) return a new context and
/// leave the original untouched. The values are shared between the original and the new
/// context; only the (shallow) entry table is copied.
///
/// ```
/// use rdf_weave_common::{ActionContext, ActionContextKey};
///
/// const LIMIT: ActionContextKey<usize> = ActionContextKey::new("example:limit");
///
/// let context = ActionContext::new();
/// let with_limit = context.set(LIMIT, 10);
///
/// assert_eq!(with_limit.get(LIMIT), Some(&10));
/// assert_eq!(context.get(LIMIT), None);
/// ```
#[derive(Clone, Default)]
pub struct ActionContext {
    entries: Arc<FxHashMap<&'static str, ContextValue>>,
}

impl ActionContext {
    /// Creates an empty [ActionContext].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new context in which `key` is bound to `value`.
    #[must_use]
    pub fn set<V: Send + Sync + 'static>(&self, key: ActionContextKey<V>, value: V) -> Self {
        let mut entries = self.entries.as_ref().clone();
        entries.insert(key.name, Arc::new(value));
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Returns a new context without `key`.
    ///
    /// If `key` is not present, the returned context is equivalent to `self`.
    #[must_use]
    pub fn delete<V>(&self, key: ActionContextKey<V>) -> Self {
        if !self.entries.contains_key(key.name) {
            return self.clone();
        }

        let mut entries = self.entries.as_ref().clone();
        entries.remove(key.name);
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Returns the value bound to `key`.
    pub fn get<V: 'static>(&self, key: ActionContextKey<V>) -> Option<&V> {
        self.entries
            .get(key.name)
            .and_then(|value| value.as_ref().downcast_ref::<V>())
    }

    /// Returns the value bound to `key` or an error if it is not present.
    pub fn get_safe<V: 'static>(&self, key: ActionContextKey<V>) -> Result<&V, MissingContextKey> {
        self.get(key).ok_or(MissingContextKey { key: key.name })
    }

    /// Returns whether `key` is present.
    pub fn has<V>(&self, key: ActionContextKey<V>) -> bool {
        self.entries.contains_key(key.name)
    }

    /// Returns the names of all keys in this context.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the context has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a new context that contains the entries of `self` and `other`. Entries of `other`
    /// take precedence.
    #[must_use]
    pub fn merge(&self, other: &ActionContext) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }

        let mut entries = self.entries.as_ref().clone();
        for (key, value) in other.entries.iter() {
            entries.insert(*key, Arc::clone(value));
        }
        Self {
            entries: Arc::new(entries),
        }
    }
}

impl Debug for ActionContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut keys = self.keys().collect::<Vec<_>>();
        keys.sort_unstable();
        f.debug_struct("ActionContext")
            .field("keys", &keys)
            .finish()
    }
}
