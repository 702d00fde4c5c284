use std::collections::HashMap;

use crate::id::Id;

/// Values attached to nodes of one tree, keyed by node identity.
///
/// A pass records what it learned about a node here; a later pass walking the
/// same tree retrieves it with the very same [`Id`].
#[derive(Debug, Clone)]
pub struct NodeMap<V> {
    entries: HashMap<usize, V>,
}

impl<V> Default for NodeMap<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V> NodeMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value` for `id`, returning what was recorded before.
    pub fn insert<T>(&mut self, id: Id<T>, value: V) -> Option<V> {
        self.entries.insert(id.as_usize(), value)
    }

    pub fn get<T>(&self, id: Id<T>) -> Option<&V> {
        self.entries.get(&id.as_usize())
    }

    pub fn contains<T>(&self, id: Id<T>) -> bool {
        self.entries.contains_key(&id.as_usize())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.values_mut()
    }
}

impl<V: Copy> NodeMap<V> {
    pub fn copied<T>(&self, id: Id<T>) -> Option<V> {
        self.get(id).copied()
    }
}
