use ecow::{EcoString, eco_format};
use indexmap::IndexMap;
use log::debug;
use oriel_span::Loc;
use oriel_utils::naming::{is_qualified, make_qualified, namespace_of, unqualified};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::{
    builtins::{CORE_NAMESPACE, CoreTypes},
    coerce::Coercions,
    error::{CompilerError, SemanticError, SymbolError},
    generics::ParameterizedKey,
    matcher::{MatchWeights, NOT_ASSIGNABLE, match_methods},
    rebase::Rebase,
    scope::{Scope, ScopeId, ScopeKind},
    search::{MethodSearch, MethodSearchResult, SymbolSearch},
    symbol::{
        Aggregate, Category, Method, MethodFlags, Symbol, SymbolId, SymbolKind, VariableRole,
    },
};

/// Arena of every symbol and scope of a compilation run.
///
/// Symbols and scopes are append only and refer to each other by id, so the
/// logically cyclic links (aggregate and sub-aggregate, scope and enclosing
/// scope) never own each other. A unit builds its own table during the
/// definition pass and [`SymbolTable::absorb`] merges it into the shared one.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    pub(crate) symbols: Vec<Symbol>,
    pub(crate) scopes: Vec<Scope>,
    pub(crate) modules: IndexMap<EcoString, ScopeId>,
    pub(crate) instances: HashMap<ParameterizedKey, SymbolId>,
    pub(crate) pending: VecDeque<SymbolId>,
    pub(crate) coercions: Coercions,
    pub(crate) weights: MatchWeights,
    pub(crate) core: Option<CoreTypes>,
}

/// Result of merging a unit table into the shared one.
#[derive(Debug)]
pub struct Absorbed {
    pub rebase: Rebase,
    /// Top-level declarations another unit of the same module already made.
    pub clashes: Vec<SemanticError>,
}

/// Declared shape of a method added by the compiler.
#[derive(Debug, Clone)]
pub struct MethodSpec {
    pub name: EcoString,
    pub params: Vec<(EcoString, SymbolId)>,
    pub returning: Option<SymbolId>,
    pub flags: MethodFlags,
    pub pure: bool,
    pub loc: Loc,
}

impl MethodSpec {
    pub fn new(name: impl Into<EcoString>, loc: Loc) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returning: None,
            flags: MethodFlags::default(),
            pure: false,
            loc,
        }
    }

    pub fn param(mut self, name: impl Into<EcoString>, ty: SymbolId) -> Self {
        self.params.push((name.into(), ty));
        self
    }

    pub fn returning(mut self, ty: SymbolId) -> Self {
        self.returning = Some(ty);
        self
    }

    pub fn operator(mut self) -> Self {
        self.flags.operator = true;
        self
    }

    pub fn constructor(mut self) -> Self {
        self.flags.constructor = true;
        self
    }

    pub fn synthetic(mut self) -> Self {
        self.flags.synthetic = true;
        self
    }

    pub fn pure(mut self) -> Self {
        self.pure = true;
        self
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table for a single unit; scope 0 is the unit's module scope.
    pub fn for_unit(namespace: impl Into<EcoString>) -> Self {
        let mut table = Self::new();
        let namespace = namespace.into();
        let root = table.new_scope(namespace.clone(), ScopeKind::Module, None);
        table.modules.insert(namespace, root);
        table
    }

    pub fn weights(&self) -> MatchWeights {
        self.weights
    }

    pub fn set_weights(&mut self, weights: MatchWeights) {
        self.weights = weights;
    }

    pub fn core(&self) -> Option<&CoreTypes> {
        self.core.as_ref()
    }

    pub fn require_core(&self) -> Result<&CoreTypes, CompilerError> {
        self.core.as_ref().ok_or(CompilerError::MissingCore)
    }

    // Arena

    pub fn add_symbol(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId::from_usize(self.symbols.len());
        let mut symbol = symbol;
        if symbol.category() == Category::Type {
            symbol.ty = Some(id);
        }
        self.symbols.push(symbol);
        id
    }

    /// The id the next [`SymbolTable::add_symbol`] call hands out.
    pub fn next_symbol_id(&self) -> SymbolId {
        SymbolId::from_usize(self.symbols.len())
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.as_usize()]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.as_usize()]
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn symbol_ids(&self) -> impl Iterator<Item = SymbolId> + use<> {
        (0..self.symbols.len()).map(SymbolId::from_usize)
    }

    pub fn new_scope(
        &mut self,
        name: impl Into<EcoString>,
        kind: ScopeKind,
        enclosing: Option<ScopeId>,
    ) -> ScopeId {
        let id = ScopeId::from_usize(self.scopes.len());
        self.scopes.push(Scope::new(name, kind, enclosing));
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.as_usize()]
    }

    /// Scope of the module `namespace`, created on first use.
    pub fn register_module(&mut self, namespace: impl Into<EcoString>) -> ScopeId {
        let namespace = namespace.into();
        if let Some(&scope) = self.modules.get(&namespace) {
            return scope;
        }

        let scope = self.new_scope(namespace.clone(), ScopeKind::Module, None);
        self.modules.insert(namespace, scope);
        scope
    }

    pub fn module_scope(&self, namespace: &str) -> Option<ScopeId> {
        self.modules.get(namespace).copied()
    }

    pub fn modules(&self) -> impl Iterator<Item = (&EcoString, ScopeId)> {
        self.modules.iter().map(|(name, &scope)| (name, scope))
    }

    pub fn set_enclosing_visible(&mut self, scope: ScopeId, visible: bool) {
        self.scopes[scope.as_usize()].set_enclosing_visible(visible);
    }

    /// Adds `symbol` to `scope`.
    ///
    /// A second non-method symbol in the same category and name is a broken
    /// invariant: callers check for user-level duplicates first.
    pub fn define(&mut self, scope: ScopeId, symbol: SymbolId) -> Result<(), CompilerError> {
        let entry = &self.symbols[symbol.as_usize()];
        let category = entry.category();
        let name = entry.name.clone();
        let target = &mut self.scopes[scope.as_usize()];

        if category != Category::Method && target.contains(category, &name) {
            return Err(CompilerError::DuplicateSymbol {
                name,
                category,
                scope: target.name.clone(),
            });
        }

        target.insert(category, name, symbol);
        Ok(())
    }

    pub fn add_and_define(
        &mut self,
        scope: ScopeId,
        symbol: Symbol,
    ) -> Result<SymbolId, CompilerError> {
        let id = self.add_symbol(symbol);
        self.define(scope, id)?;
        Ok(id)
    }

    /// Creates an aggregate together with its member scope under `enclosing`.
    pub fn new_aggregate(
        &mut self,
        symbol: Symbol,
        enclosing: ScopeId,
    ) -> Result<SymbolId, CompilerError> {
        let id = self.next_symbol_id();
        let scope = self.new_scope(symbol.name.clone(), ScopeKind::Aggregate(id), Some(enclosing));
        let mut symbol = symbol;
        match symbol.as_aggregate_mut() {
            Some(aggregate) => aggregate.scope = scope,
            None => {
                return Err(CompilerError::UnexpectedKind {
                    symbol: id,
                    expected: "type",
                });
            }
        }
        Ok(self.add_symbol(symbol))
    }

    /// Adds a compiler-made method to `owner`'s member scope.
    pub fn add_method(
        &mut self,
        owner: SymbolId,
        spec: MethodSpec,
    ) -> Result<SymbolId, CompilerError> {
        let member_scope = self.member_scope(owner)?;
        let module = self.symbol(owner).module.clone();
        let id = self.next_symbol_id();
        let scope = self.new_scope(spec.name.clone(), ScopeKind::Method(id), Some(member_scope));

        let mut symbol = Symbol::method(
            spec.name,
            Method {
                scope,
                owner,
                params: Vec::new(),
                returning: None,
                flags: spec.flags,
            },
            spec.loc,
        )
        .with_module(module.clone());
        symbol.flags.pure = spec.pure;
        let method = self.add_symbol(symbol);
        self.define(member_scope, method)?;

        let mut params = Vec::with_capacity(spec.params.len());
        for (name, ty) in spec.params {
            let param = Symbol::variable(name, VariableRole::Parameter, spec.loc)
                .with_module(module.clone())
                .with_type(ty);
            params.push(self.add_and_define(scope, param)?);
        }
        let returning = match spec.returning {
            Some(ty) => {
                let rtn = Symbol::variable("rtn", VariableRole::Returning, spec.loc)
                    .with_module(module)
                    .with_type(ty);
                Some(self.add_and_define(scope, rtn)?)
            }
            None => None,
        };

        if let Some(method) = self.symbol_mut(method).as_method_mut() {
            method.params = params;
            method.returning = returning;
        }
        Ok(method)
    }

    /// Copies a variable or method into `enclosing`, with `substitute`
    /// applied to every type it mentions and optionally under a new `name`.
    /// Methods get a fresh scope of their own; the copy shares nothing with
    /// the original.
    pub fn clone_symbol(
        &mut self,
        id: SymbolId,
        name: Option<EcoString>,
        enclosing: ScopeId,
        owner: SymbolId,
        substitute: &mut dyn FnMut(&mut Self, SymbolId) -> Result<SymbolId, SemanticError>,
    ) -> Result<SymbolId, SymbolError> {
        let mut original = self.symbol(id).clone();
        if let Some(name) = name {
            original.name = name;
        }

        let SymbolKind::Method(method) = &original.kind else {
            let mut copy = original.clone();
            copy.ty = original.ty.map(|ty| substitute(self, ty)).transpose()?;
            return Ok(self.add_and_define(enclosing, copy)?);
        };

        let params: Vec<Symbol> = method
            .params
            .iter()
            .map(|&p| self.symbol(p).clone())
            .collect();
        let returning = method.returning.map(|r| self.symbol(r).clone());

        let new_id = self.next_symbol_id();
        let scope = self.new_scope(
            original.name.clone(),
            ScopeKind::Method(new_id),
            Some(enclosing),
        );
        let copy = Symbol {
            kind: SymbolKind::Method(Method {
                scope,
                owner,
                params: Vec::new(),
                returning: None,
                flags: method.flags,
            }),
            ..original.clone()
        };
        let copy = self.add_and_define(enclosing, copy)?;

        let mut new_params = Vec::with_capacity(params.len());
        for mut param in params {
            param.ty = param.ty.map(|ty| substitute(self, ty)).transpose()?;
            new_params.push(self.add_and_define(scope, param)?);
        }
        let new_returning = match returning {
            Some(mut rtn) => {
                rtn.ty = rtn.ty.map(|ty| substitute(self, ty)).transpose()?;
                Some(self.add_and_define(scope, rtn)?)
            }
            None => None,
        };

        if let Some(method) = self.symbol_mut(copy).as_method_mut() {
            method.params = new_params;
            method.returning = new_returning;
        }
        Ok(copy)
    }

    // Queries

    pub fn aggregate(&self, id: SymbolId) -> Option<&Aggregate> {
        self.symbol(id).as_aggregate()
    }

    pub fn aggregate_mut(&mut self, id: SymbolId) -> Option<&mut Aggregate> {
        self.symbol_mut(id).as_aggregate_mut()
    }

    pub fn member_scope(&self, id: SymbolId) -> Result<ScopeId, CompilerError> {
        self.aggregate(id)
            .map(|a| a.scope)
            .ok_or(CompilerError::UnexpectedKind {
                symbol: id,
                expected: "type",
            })
    }

    /// A type is its own type, anything else has whatever type it was given.
    pub fn type_of(&self, id: SymbolId) -> Option<SymbolId> {
        let symbol = self.symbol(id);
        match symbol.category() {
            Category::Type => Some(id),
            _ => symbol.ty,
        }
    }

    pub fn fully_qualified_name(&self, id: SymbolId) -> EcoString {
        let symbol = self.symbol(id);

        if let Some(generic) = symbol.generic() {
            if let (true, Some(parent)) = (generic.conceptual, generic.parent) {
                return make_qualified(&self.fully_qualified_name(parent), &symbol.name);
            }
            if let Some(template) = generic.template {
                let args: Vec<EcoString> = generic
                    .params
                    .iter()
                    .map(|&arg| self.fully_qualified_name(arg))
                    .collect();
                return eco_format!(
                    "{} of ({})",
                    self.fully_qualified_name(template),
                    args.join(", ")
                );
            }
        }

        if symbol.module.is_empty() || is_qualified(&symbol.name) {
            symbol.name.clone()
        } else {
            make_qualified(&symbol.module, &symbol.name)
        }
    }

    pub fn is_exact_same_type(&self, a: SymbolId, b: SymbolId) -> bool {
        a == b
            || (self.symbol(a).category() == self.symbol(b).category()
                && self.fully_qualified_name(a) == self.fully_qualified_name(b))
    }

    /// Argument types as written in messages, `Integer, String`.
    pub fn describe_types(&self, types: &[SymbolId]) -> String {
        types
            .iter()
            .map(|&ty| self.symbol(ty).name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    // Assignability

    /// What it costs to use a value of type `from` where `to` is expected,
    /// [`NOT_ASSIGNABLE`] when it cannot be done.
    pub fn assignable_cost(&self, from: SymbolId, to: SymbolId) -> f64 {
        let direct = self.uncoerced_cost(from, to);
        if direct >= 0.0 {
            return direct;
        }

        let (from_name, to_name) = (self.fully_qualified_name(from), self.fully_qualified_name(to));
        if self.coercions.is_coercible(&from_name, &to_name) {
            self.weights.coercion_cost
        } else {
            NOT_ASSIGNABLE
        }
    }

    pub fn is_assignable(&self, from: SymbolId, to: SymbolId) -> bool {
        self.assignable_cost(from, to) >= 0.0
    }

    fn uncoerced_cost(&self, from: SymbolId, to: SymbolId) -> f64 {
        if self.is_exact_same_type(from, to) {
            return 0.0;
        }

        if self.core.as_ref().is_some_and(|core| core.any == to)
            && matches!(
                self.symbol(from).category(),
                Category::Type | Category::Function
            )
        {
            return self.weights.any_cost;
        }

        let Some(aggregate) = self.aggregate(from) else {
            return NOT_ASSIGNABLE;
        };

        let mut best = NOT_ASSIGNABLE;
        let mut consider = |cost: f64| {
            if cost >= 0.0 && (best < 0.0 || cost < best) {
                best = cost;
            }
        };

        if let Some(parent) = aggregate.super_aggregate {
            let cost = self.uncoerced_cost(parent, to);
            if cost >= 0.0 {
                consider(cost + self.weights.super_cost);
            }
        }
        for &trait_id in &aggregate.traits {
            let cost = self.uncoerced_cost(trait_id, to);
            if cost >= 0.0 {
                consider(cost + self.weights.trait_cost);
            }
        }

        best
    }

    // Resolution

    /// Looks for a non-method symbol in `scope` alone.
    ///
    /// A qualified name only matches in the module scope of its namespace,
    /// every other scope answers nothing for it.
    pub fn resolve_in_this_scope_only(
        &self,
        scope: ScopeId,
        search: &SymbolSearch,
    ) -> Option<SymbolId> {
        let scope = self.scope(scope);

        let name = if is_qualified(&search.name) {
            if !scope.is_module() || namespace_of(&search.name) != Some(scope.name.as_str()) {
                return None;
            }
            unqualified(&search.name)
        } else {
            search.name.as_str()
        };

        search
            .expanded_categories()
            .filter(|&category| category != Category::Method)
            .find_map(|category| {
                let &found = scope.lookup(category, name).first()?;
                match search.of_type {
                    Some(expected) => self
                        .type_of(found)
                        .filter(|&ty| self.is_assignable(ty, expected))
                        .map(|_| found),
                    None => Some(found),
                }
            })
    }

    /// Lexical lookup from `scope` outwards, then the module registry and
    /// finally the core module.
    pub fn resolve(&self, scope: ScopeId, search: &SymbolSearch) -> Option<SymbolId> {
        self.resolve_lexically(scope, search)
            .or_else(|| self.resolve_globally(search))
    }

    fn resolve_lexically(&self, start: ScopeId, search: &SymbolSearch) -> Option<SymbolId> {
        let mut current = Some(start);

        while let Some(id) = current {
            if let Some(found) = self.resolve_in_this_scope_only(id, search) {
                return Some(found);
            }

            let scope = self.scope(id);
            if let ScopeKind::Aggregate(aggregate) = scope.kind
                && let Some(found) = self.resolve_inherited(aggregate, search)
            {
                return Some(found);
            }

            current = match scope.enclosing {
                Some(enclosing) if scope.is_enclosing_visible() => Some(enclosing),
                // A sealed capture still sees module level declarations.
                Some(enclosing) => Some(self.outermost(enclosing)),
                None => None,
            };
        }

        None
    }

    fn resolve_globally(&self, search: &SymbolSearch) -> Option<SymbolId> {
        let namespace = namespace_of(&search.name).unwrap_or(CORE_NAMESPACE);
        let scope = self.module_scope(namespace)?;

        if is_qualified(&search.name) {
            self.resolve_in_this_scope_only(scope, search)
        } else {
            let qualified = SymbolSearch {
                name: make_qualified(namespace, &search.name),
                ..search.clone()
            };
            self.resolve_in_this_scope_only(scope, &qualified)
        }
    }

    fn outermost(&self, mut scope: ScopeId) -> ScopeId {
        while let Some(enclosing) = self.scope(scope).enclosing {
            scope = enclosing;
        }
        scope
    }

    /// Members inherited from supers and traits, nearest first.
    pub fn resolve_inherited(
        &self,
        aggregate: SymbolId,
        search: &SymbolSearch,
    ) -> Option<SymbolId> {
        let mut seen = HashSet::from([aggregate]);
        let mut queue: VecDeque<SymbolId> = self.parents(aggregate).collect();

        while let Some(parent) = queue.pop_front() {
            if !seen.insert(parent) {
                continue;
            }
            if let Some(scope) = self.aggregate(parent).map(|a| a.scope)
                && let Some(found) = self.resolve_in_this_scope_only(scope, search)
            {
                return Some(found);
            }
            queue.extend(self.parents(parent));
        }

        None
    }

    /// Looks up a member of `aggregate`, own members first.
    pub fn resolve_member(&self, aggregate: SymbolId, search: &SymbolSearch) -> Option<SymbolId> {
        let scope = self.aggregate(aggregate)?.scope;
        self.resolve_in_this_scope_only(scope, search)
            .or_else(|| self.resolve_inherited(aggregate, search))
    }

    pub(crate) fn parents(&self, aggregate: SymbolId) -> impl Iterator<Item = SymbolId> + '_ {
        self.aggregate(aggregate).into_iter().flat_map(|a| {
            a.super_aggregate
                .into_iter()
                .chain(a.traits.iter().copied())
        })
    }

    /// Methods visible from `scope` that could accept `search`.
    ///
    /// Matches of the enclosing scopes are collected first and then
    /// overridden by this scope's, which win ties.
    pub fn resolve_matching_methods(
        &self,
        scope: ScopeId,
        search: &MethodSearch,
    ) -> MethodSearchResult {
        let current = self.scope(scope);

        let outer = match current.enclosing {
            Some(enclosing) if current.is_enclosing_visible() => {
                self.resolve_matching_methods(enclosing, search)
            }
            _ => MethodSearchResult::default(),
        };

        let here = match current.kind {
            ScopeKind::Aggregate(aggregate) => self.aggregate_matching_methods(aggregate, search),
            _ => match_methods(
                self,
                current.lookup(Category::Method, &search.name),
                search,
                0.0,
            ),
        };

        outer.overridden_by(here)
    }

    /// Methods of `aggregate`, including inherited ones, that could accept
    /// `search`. Every level climbed adds the configured super cost and an
    /// own method hides an inherited one of the same signature.
    pub fn aggregate_matching_methods(
        &self,
        aggregate: SymbolId,
        search: &MethodSearch,
    ) -> MethodSearchResult {
        let mut seen = HashSet::new();
        self.aggregate_matching_methods_at(aggregate, search, 0.0, &mut seen)
    }

    fn aggregate_matching_methods_at(
        &self,
        aggregate: SymbolId,
        search: &MethodSearch,
        extra_cost: f64,
        seen: &mut HashSet<SymbolId>,
    ) -> MethodSearchResult {
        let Some(scope) = self.aggregate(aggregate).map(|a| a.scope) else {
            return MethodSearchResult::default();
        };
        seen.insert(aggregate);

        let mut inherited = MethodSearchResult::default();
        let parents: Vec<SymbolId> = self.parents(aggregate).collect();
        for parent in parents {
            if !seen.contains(&parent) {
                inherited.merge(self.aggregate_matching_methods_at(
                    parent,
                    search,
                    extra_cost + self.weights.super_cost,
                    seen,
                ));
            }
        }

        let own_candidates = self.scope(scope).lookup(Category::Method, &search.name);
        let own = match_methods(self, own_candidates, search, extra_cost);

        inherited.retain(|m| {
            !own_candidates
                .iter()
                .any(|&mine| self.has_same_signature(mine, m.method))
        });
        inherited.merge(own);
        inherited
    }

    /// Same name and parameter types, the return type is not considered.
    pub fn has_same_signature(&self, a: SymbolId, b: SymbolId) -> bool {
        let (sa, sb) = (self.symbol(a), self.symbol(b));
        if sa.name != sb.name {
            return false;
        }
        match (sa.signature(), sb.signature()) {
            (Some((pa, _)), Some((pb, _))) => self.same_param_types(pa, pb),
            _ => false,
        }
    }

    pub(crate) fn same_param_types(&self, a: &[SymbolId], b: &[SymbolId]) -> bool {
        a.len() == b.len()
            && a.iter().zip(b).all(|(&x, &y)| {
                match (self.type_of(x), self.type_of(y)) {
                    (Some(tx), Some(ty)) => self.is_exact_same_type(tx, ty),
                    _ => false,
                }
            })
    }

    /// Parameter types of a method or function, `None` while any is unknown.
    pub fn param_types(&self, method: SymbolId) -> Option<Vec<SymbolId>> {
        let (params, _) = self.symbol(method).signature()?;
        params.iter().map(|&p| self.type_of(p)).collect()
    }

    pub fn return_type(&self, method: SymbolId) -> Option<SymbolId> {
        let (_, returning) = self.symbol(method).signature()?;
        returning.and_then(|r| self.type_of(r))
    }

    // Merging

    /// Moves everything `unit` defined into this table.
    ///
    /// The unit's module scope is folded into the shared scope of the same
    /// namespace; a top-level name another unit already took is reported as
    /// a clash and left out of the module scope.
    pub fn absorb(&mut self, unit: SymbolTable) -> Result<Absorbed, CompilerError> {
        let SymbolTable {
            symbols, scopes, ..
        } = unit;
        let mut scopes = scopes.into_iter();
        let root = scopes.next().ok_or(CompilerError::MissingUnitScope)?;

        let module = self.register_module(root.name.clone());
        let rebase = Rebase::new(self.symbols.len(), self.scopes.len(), module);

        for mut symbol in symbols {
            symbol.rebase(&rebase);
            self.symbols.push(symbol);
        }
        for mut scope in scopes {
            scope.rebase(&rebase);
            self.scopes.push(scope);
        }

        let mut clashes = Vec::new();
        for &local in root.symbols() {
            let id = rebase.symbol(local);
            let symbol = self.symbol(id);
            let category = symbol.category();

            if category != Category::Method
                && let Some(&existing) = self.scope(module).lookup(category, &symbol.name).first()
            {
                clashes.push(SemanticError::DuplicateDefinition {
                    name: symbol.name.clone(),
                    category,
                    loc: symbol.loc,
                    previous: self.symbol(existing).loc,
                });
                continue;
            }
            self.define(module, id)?;
        }

        debug!(
            "absorbed {} symbols into module `{}` ({} clashes)",
            self.symbols.len() - rebase.symbol(SymbolId::new(0)).as_usize(),
            root.name,
            clashes.len()
        );

        Ok(Absorbed { rebase, clashes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{search::MatchOutcome, symbol::Genus, test::Fixture};

    #[test]
    fn type_is_its_own_type() {
        let mut fx = Fixture::new();
        let shape = fx.class("Shape");

        assert_eq!(fx.table.type_of(shape), Some(shape));
        assert_eq!(fx.table.symbol(shape).ty, Some(shape));
    }

    #[test]
    fn define_rejects_second_non_method() {
        let mut fx = Fixture::new();
        let module = fx.module;
        let a = fx.table.add_symbol(Symbol::new("x", fx.loc()));
        let b = fx.table.add_symbol(Symbol::new("x", fx.loc()));

        assert!(fx.table.define(module, a).is_ok());
        assert!(matches!(
            fx.table.define(module, b),
            Err(CompilerError::DuplicateSymbol { .. })
        ));
    }

    #[test]
    fn same_name_in_different_categories() {
        let mut fx = Fixture::new();
        let module = fx.module;
        let ty = fx.class("Foo");
        let var = fx.table.add_symbol(Symbol::new("Foo", fx.loc()));
        fx.table.define(module, var).unwrap();

        let as_type = fx.table.resolve(module, &SymbolSearch::types("Foo"));
        let as_var = fx.table.resolve(module, &SymbolSearch::variables("Foo"));
        assert_eq!(as_type, Some(ty));
        assert_eq!(as_var, Some(var));
    }

    #[test]
    fn resolution_walks_outwards_and_is_deterministic() {
        let mut fx = Fixture::new();
        let core = fx.core();
        let module = fx.module;
        let block = fx.table.new_scope("block", ScopeKind::Block, Some(module));
        let inner = fx.table.new_scope("inner", ScopeKind::Block, Some(block));

        let outer_x = fx.variable(block, "x", core.integer);
        let search = SymbolSearch::variables("x");

        let first = fx.table.resolve(inner, &search);
        for _ in 0..10 {
            assert_eq!(fx.table.resolve(inner, &search), first);
        }
        assert_eq!(first, Some(outer_x));

        let inner_x = fx.variable(inner, "x", core.string);
        assert_eq!(fx.table.resolve(inner, &search), Some(inner_x));
        assert_eq!(fx.table.resolve(block, &search), Some(outer_x));
    }

    #[test]
    fn typed_search_filters_variables() {
        let mut fx = Fixture::new();
        let core = fx.core();
        let module = fx.module;
        fx.variable(module, "n", core.integer);

        let search = SymbolSearch::variables("n").of_type(core.float);
        assert!(fx.table.resolve_in_this_scope_only(module, &search).is_some());

        let search = SymbolSearch::variables("n").of_type(core.boolean);
        assert!(fx.table.resolve_in_this_scope_only(module, &search).is_none());
    }

    #[test]
    fn qualified_names_short_circuit_foreign_modules() {
        let mut fx = Fixture::new();
        let shape = fx.class("Shape");
        let other = fx.table.register_module("other");

        let qualified = SymbolSearch::types("demo::Shape");
        assert_eq!(fx.table.resolve_in_this_scope_only(other, &qualified), None);
        assert_eq!(
            fx.table.resolve_in_this_scope_only(fx.module, &qualified),
            Some(shape)
        );
        // Reached through the module registry from anywhere.
        assert_eq!(fx.table.resolve(other, &qualified), Some(shape));
        assert_eq!(fx.table.resolve(other, &SymbolSearch::types("Shape")), None);
    }

    #[test]
    fn core_types_resolve_unqualified() {
        let fx = Fixture::new();
        let core = fx.core();

        let found = fx.table.resolve(fx.module, &SymbolSearch::types("Integer"));
        assert_eq!(found, Some(core.integer));
        assert_eq!(fx.table.fully_qualified_name(core.integer), "core::Integer");
    }

    #[test]
    fn capture_scope_can_be_sealed() {
        let mut fx = Fixture::new();
        let core = fx.core();
        let module = fx.module;
        let body = fx.table.new_scope("body", ScopeKind::Block, Some(module));
        let outer = fx.variable(body, "total", core.integer);
        let capture = fx.table.new_scope("capture", ScopeKind::Capture, Some(body));
        let shape = fx.class("Shape");

        let search = SymbolSearch::variables("total");
        assert_eq!(fx.table.resolve(capture, &search), Some(outer));

        fx.table.set_enclosing_visible(capture, false);
        assert_eq!(fx.table.resolve(capture, &search), None);
        assert_eq!(
            fx.table.resolve(capture, &SymbolSearch::types("Shape")),
            Some(shape)
        );

        let captured = fx.variable(capture, "total", core.integer);
        assert_eq!(fx.table.resolve(capture, &search), Some(captured));
    }

    #[test]
    fn assignability_through_hierarchy() {
        let mut fx = Fixture::new();
        let core = fx.core();
        let weights = fx.table.weights();
        let animal = fx.open_class("Animal");
        let dog = fx.class("Dog");
        let pet = fx.trait_("Pet");
        fx.table.set_super(dog, animal).unwrap();
        fx.table.add_trait(dog, pet).unwrap();

        assert_eq!(fx.table.assignable_cost(dog, dog), 0.0);
        assert_eq!(fx.table.assignable_cost(dog, animal), weights.super_cost);
        assert_eq!(fx.table.assignable_cost(dog, pet), weights.trait_cost);
        assert_eq!(fx.table.assignable_cost(animal, dog), NOT_ASSIGNABLE);
        assert_eq!(fx.table.assignable_cost(dog, core.any), weights.any_cost);
        assert_eq!(
            fx.table.assignable_cost(core.integer, core.float),
            weights.coercion_cost
        );
    }

    #[test]
    fn local_method_beats_inherited_one() {
        let mut fx = Fixture::new();
        let core = fx.core();
        let base = fx.open_class("Base");
        let derived = fx.class("Derived");
        fx.table.set_super(derived, base).unwrap();

        let inherited = fx.method(base, "size", &[core.integer], None);
        let search = MethodSearch::new("size", vec![core.integer]);
        let outcome = fx.table.aggregate_matching_methods(derived, &search).outcome();
        assert_eq!(outcome, MatchOutcome::Resolved(inherited));

        let local = fx.method(derived, "size", &[core.integer], None);
        let result = fx.table.aggregate_matching_methods(derived, &search);
        assert_eq!(result.outcome(), MatchOutcome::Resolved(local));
        assert_eq!(result.matches().len(), 1);
    }

    #[test]
    fn method_body_sees_class_methods() {
        let mut fx = Fixture::new();
        let core = fx.core();
        let shape = fx.class("Shape");
        let area = fx.method(shape, "area", &[], Some(core.float));
        let body = fx.table.symbol(area).owned_scope().unwrap();
        let block = fx.table.new_scope("block", ScopeKind::Block, Some(body));

        let search = MethodSearch::new("area", vec![]);
        let outcome = fx.table.resolve_matching_methods(block, &search).outcome();
        assert_eq!(outcome, MatchOutcome::Resolved(area));
    }

    #[test]
    fn absorb_rebases_and_reports_clashes() {
        let mut shared = SymbolTable::with_core().unwrap();
        let source = oriel_span::SourceId::new(0);
        let loc = Loc::new(source, 1, 1);

        let mut first = SymbolTable::for_unit("demo");
        let root = ScopeId::new(0);
        let a = first
            .new_aggregate(
                Symbol::aggregate("A", Genus::Class, root, loc).with_module("demo"),
                root,
            )
            .unwrap();
        first.define(root, a).unwrap();

        let mut second = SymbolTable::for_unit("demo");
        let clash = second
            .new_aggregate(
                Symbol::aggregate("A", Genus::Class, root, Loc::new(source, 9, 1))
                    .with_module("demo"),
                root,
            )
            .unwrap();
        second.define(root, clash).unwrap();

        let absorbed = shared.absorb(first).unwrap();
        assert!(absorbed.clashes.is_empty());
        let a = absorbed.rebase.symbol(a);
        let module = shared.module_scope("demo").unwrap();
        assert_eq!(shared.resolve(module, &SymbolSearch::types("A")), Some(a));

        let member_scope = shared.member_scope(a).unwrap();
        assert_eq!(shared.scope(member_scope).kind, ScopeKind::Aggregate(a));
        assert_eq!(shared.scope(member_scope).enclosing, Some(module));

        let absorbed = shared.absorb(second).unwrap();
        assert_eq!(absorbed.clashes.len(), 1);
        assert_eq!(absorbed.clashes[0].loc().line, 9);
        assert_eq!(shared.resolve(module, &SymbolSearch::types("A")), Some(a));
    }
}
