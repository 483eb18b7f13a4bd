use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};

/// A reference to a hypermedia document (or federation endpoint) that should be fetched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Link {
    /// The URL of the document.
    pub url: String,
    /// Additional information about the link (e.g., a priority or the discovering predicate).
    pub metadata: Map<String, Value>,
}

impl Link {
    /// Creates a new [Link] without metadata.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            metadata: Map::new(),
        }
    }

    /// Returns a copy of this link with an additional metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl Display for Link {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}>", self.url)
    }
}
