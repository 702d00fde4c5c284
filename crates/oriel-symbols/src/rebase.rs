use crate::{scope::ScopeId, symbol::SymbolId};

/// Maps the ids of a unit-local table onto the shared table it was merged
/// into. Local scope 0, the unit's module scope, becomes the shared module
/// scope of the same namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rebase {
    symbol_base: usize,
    scope_base: usize,
    root: ScopeId,
}

impl Rebase {
    pub(crate) fn new(symbol_base: usize, scope_base: usize, root: ScopeId) -> Self {
        Self {
            symbol_base,
            scope_base,
            root,
        }
    }

    pub fn symbol(&self, local: SymbolId) -> SymbolId {
        SymbolId::from_usize(self.symbol_base + local.as_usize())
    }

    pub fn scope(&self, local: ScopeId) -> ScopeId {
        match local.as_usize() {
            0 => self.root,
            n => ScopeId::from_usize(self.scope_base + n - 1),
        }
    }

    pub fn symbols(&self, ids: &mut [SymbolId]) {
        for id in ids {
            *id = self.symbol(*id);
        }
    }
}
