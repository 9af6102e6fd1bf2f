//! Bookkeeping for listeners bound on the map view.
//!
//! Every subscription the sync engine makes goes through a [`ListenerRegistry`]
//! so teardown can release all of them and tests can check nothing leaks.

use crate::prelude::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    MoveEnd,
    ZoomEnd,
    Resize,
    MapClick,
    MarkerInteraction,
    /// Re-projects the active marker for popup placement on camera changes
    PopupProjection,
}

#[derive(Debug, Default)]
pub struct ListenerRegistry {
    next_id: u64,
    listeners: HashMap<ListenerId, ListenerKind>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: ListenerKind) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.insert(id, kind);
        log::trace!("registered {id} ({kind:?})");
        id
    }

    /// Returns false when the id was not registered
    pub fn unregister(&mut self, id: ListenerId) -> bool {
        let removed = self.listeners.remove(&id).is_some();
        if removed {
            log::trace!("unregistered {id}");
        }
        removed
    }

    pub fn is_registered(&self, id: ListenerId) -> bool {
        self.listeners.contains_key(&id)
    }

    pub fn count(&self) -> usize {
        self.listeners.len()
    }

    pub fn count_of(&self, kind: ListenerKind) -> usize {
        self.listeners.values().filter(|k| **k == kind).count()
    }

    /// Unregisters everything, returning how many listeners were released
    pub fn clear(&mut self) -> usize {
        let released = self.listeners.len();
        self.listeners.clear();
        released
    }
}
