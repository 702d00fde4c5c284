use std::collections::HashMap;

use crate::{rebase::Rebase, symbol::SymbolId};

/// Pass-specific facts about symbols, kept beside the table rather than on
/// the symbols themselves.
#[derive(Debug, Clone)]
pub struct Annotations<T> {
    entries: HashMap<SymbolId, T>,
}

impl<T> Default for Annotations<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> Annotations<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: SymbolId, value: T) -> Option<T> {
        self.entries.insert(symbol, value)
    }

    pub fn get(&self, symbol: SymbolId) -> Option<&T> {
        self.entries.get(&symbol)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &T)> {
        self.entries.iter().map(|(&id, value)| (id, value))
    }

    /// Re-keys annotations made against a unit-local table.
    pub fn rebase(self, rebase: &Rebase) -> Self {
        Self {
            entries: self
                .entries
                .into_iter()
                .map(|(id, value)| (rebase.symbol(id), value))
                .collect(),
        }
    }

    pub fn extend(&mut self, other: Annotations<T>) {
        self.entries.extend(other.entries);
    }
}
