use oriel_span::SourceId;
use oriel_symbols::{Annotations, CompilerError, Rebase, ScopeId, SymbolId};
use oriel_tree::{node::WebBinding, prelude::*};

/// What the passes learned about the nodes of one unit.
#[derive(Debug, Clone, Default)]
pub struct UnitRecords {
    /// Declaration nodes to the symbol they declare.
    pub symbols: NodeMap<SymbolId>,
    /// Nodes introducing a scope to that scope.
    pub scopes: NodeMap<ScopeId>,
    /// Type expressions and expressions to their type.
    pub types: NodeMap<SymbolId>,
    /// Identifiers and calls to what they refer to.
    pub targets: NodeMap<SymbolId>,
    /// Parameters of services and where in a web request they come from.
    pub bindings: Annotations<WebBinding>,
}

impl UnitRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translates ids recorded against a unit-local table.
    pub fn rebase(&mut self, rebase: &Rebase) {
        for symbol in self.symbols.values_mut() {
            *symbol = rebase.symbol(*symbol);
        }
        for scope in self.scopes.values_mut() {
            *scope = rebase.scope(*scope);
        }
        for ty in self.types.values_mut() {
            *ty = rebase.symbol(*ty);
        }
        for target in self.targets.values_mut() {
            *target = rebase.symbol(*target);
        }
        self.bindings = std::mem::take(&mut self.bindings).rebase(rebase);
    }

    pub fn symbol<T>(&self, id: Id<T>, unit: SourceId) -> Result<SymbolId, CompilerError> {
        self.symbols.copied(id).ok_or(CompilerError::MissingRecord {
            what: "symbol",
            node: id.as_usize(),
            unit,
        })
    }

    pub fn scope<T>(&self, id: Id<T>, unit: SourceId) -> Result<ScopeId, CompilerError> {
        self.scopes.copied(id).ok_or(CompilerError::MissingRecord {
            what: "scope",
            node: id.as_usize(),
            unit,
        })
    }
}
