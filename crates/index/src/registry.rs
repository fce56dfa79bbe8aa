//! Closed-world mapping from collection name to index handler.

use crate::error::{IndexError, IndexResult};
use crate::handlers::{FollowHandler, IndexHandler, LikeHandler, PostHandler};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Immutable set of index handlers, keyed by collection.
///
/// Built once at startup and shared by the store; there is no runtime
/// registration.
#[derive(Clone)]
pub struct CollectionRegistry {
    handlers: BTreeMap<&'static str, Arc<dyn IndexHandler>>,
}

impl CollectionRegistry {
    /// Build a registry from a fixed set of handlers.
    /// Two handlers claiming the same collection is a configuration error.
    pub fn new(handlers: impl IntoIterator<Item = Arc<dyn IndexHandler>>) -> IndexResult<Self> {
        let mut map = BTreeMap::new();
        for handler in handlers {
            let collection = handler.collection();
            if map.insert(collection, handler).is_some() {
                return Err(IndexError::Config(format!(
                    "duplicate index handler for collection '{collection}'"
                )));
            }
        }
        Ok(Self { handlers: map })
    }

    /// Registry with every record type this crate knows how to index.
    pub fn standard() -> Self {
        let handlers: [Arc<dyn IndexHandler>; 3] = [
            Arc::new(PostHandler),
            Arc::new(LikeHandler),
            Arc::new(FollowHandler),
        ];
        Self {
            handlers: handlers
                .into_iter()
                .map(|handler| (handler.collection(), handler))
                .collect(),
        }
    }

    /// Look up the handler for a collection.
    pub fn resolve(&self, collection: &str) -> IndexResult<&dyn IndexHandler> {
        self.handlers
            .get(collection)
            .map(|handler| handler.as_ref())
            .ok_or_else(|| IndexError::UnknownCollection(collection.to_string()))
    }

    /// Registered collection names, sorted.
    pub fn collections(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    pub(crate) fn handlers(&self) -> impl Iterator<Item = &dyn IndexHandler> + '_ {
        self.handlers.values().map(|handler| handler.as_ref())
    }
}

impl fmt::Debug for CollectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionRegistry")
            .field("collections", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
