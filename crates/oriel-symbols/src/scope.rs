use ecow::EcoString;
use indexmap::IndexMap;
use oriel_utils::define_id;

use crate::{
    rebase::Rebase,
    symbol::{Category, SymbolId},
};

define_id!(ScopeId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Top level of a module; its name is the namespace.
    Module,
    Aggregate(SymbolId),
    Method(SymbolId),
    Function(SymbolId),
    Block,
    Capture,
}

/// Named container of symbols, partitioned by category and name.
///
/// The partitioning lets a type `Foo` and a variable `Foo` live side by side
/// and lets methods named alike form an overload set. Besides the partitions
/// every defined symbol is kept in definition order, which gives parameters
/// their positions.
#[derive(Debug, Clone)]
pub struct Scope {
    pub name: EcoString,
    pub kind: ScopeKind,
    pub enclosing: Option<ScopeId>,
    enclosing_visible: bool,
    partitions: IndexMap<Category, IndexMap<EcoString, Vec<SymbolId>>>,
    ordered: Vec<SymbolId>,
}

impl Scope {
    pub fn new(name: impl Into<EcoString>, kind: ScopeKind, enclosing: Option<ScopeId>) -> Self {
        Self {
            name: name.into(),
            kind,
            enclosing,
            enclosing_visible: true,
            partitions: IndexMap::new(),
            ordered: Vec::new(),
        }
    }

    pub fn lookup(&self, category: Category, name: &str) -> &[SymbolId] {
        self.partitions
            .get(&category)
            .and_then(|names| names.get(name))
            .map_or(&[], Vec::as_slice)
    }

    pub fn contains(&self, category: Category, name: &str) -> bool {
        !self.lookup(category, name).is_empty()
    }

    /// All symbols in definition order.
    pub fn symbols(&self) -> &[SymbolId] {
        &self.ordered
    }

    pub fn is_enclosing_visible(&self) -> bool {
        self.enclosing_visible
    }

    pub fn is_module(&self) -> bool {
        self.kind == ScopeKind::Module
    }

    pub(crate) fn set_enclosing_visible(&mut self, visible: bool) {
        self.enclosing_visible = visible;
    }

    pub(crate) fn insert(&mut self, category: Category, name: EcoString, symbol: SymbolId) {
        self.partitions
            .entry(category)
            .or_default()
            .entry(name)
            .or_default()
            .push(symbol);
        self.ordered.push(symbol);
    }

    pub(crate) fn rebase(&mut self, rebase: &Rebase) {
        self.enclosing = self.enclosing.map(|e| rebase.scope(e));
        self.kind = match self.kind {
            ScopeKind::Aggregate(s) => ScopeKind::Aggregate(rebase.symbol(s)),
            ScopeKind::Method(s) => ScopeKind::Method(rebase.symbol(s)),
            ScopeKind::Function(s) => ScopeKind::Function(rebase.symbol(s)),
            other => other,
        };
        for ids in self.partitions.values_mut().flat_map(IndexMap::values_mut) {
            rebase.symbols(ids);
        }
        rebase.symbols(&mut self.ordered);
    }
}
