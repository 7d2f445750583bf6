//! Types for lifecycle events delivered by a watch subscription
use std::fmt::Debug;

/// A typed lifecycle event for one object
///
/// Bookmarks and in-band errors of the underlying watch never reach this type;
/// the adapter producing the events deals with them.
#[derive(Clone)]
pub enum WatchEvent<K> {
    /// Object was added
    Added(K),
    /// Object was modified
    Modified(K),
    /// Object was deleted
    Deleted(K),
}

impl<K> WatchEvent<K> {
    /// The object snapshot carried by the event
    pub fn object(&self) -> &K {
        match self {
            WatchEvent::Added(obj) | WatchEvent::Modified(obj) | WatchEvent::Deleted(obj) => obj,
        }
    }

    /// Take the object snapshot out of the event
    pub fn into_object(self) -> K {
        match self {
            WatchEvent::Added(obj) | WatchEvent::Modified(obj) | WatchEvent::Deleted(obj) => obj,
        }
    }

    /// Whether the object was newly created
    pub fn is_added(&self) -> bool {
        matches!(self, WatchEvent::Added(_))
    }
}

impl<K> Debug for WatchEvent<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self {
            WatchEvent::Added(_) => write!(f, "Added event"),
            WatchEvent::Modified(_) => write!(f, "Modified event"),
            WatchEvent::Deleted(_) => write!(f, "Deleted event"),
        }
    }
}
