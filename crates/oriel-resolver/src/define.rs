//! The definition pass: every declaration of a unit becomes a symbol in a
//! table of the unit's own, which is merged into the shared table later.

use ecow::EcoString;
use log::debug;
use oriel_span::{Loc, Report, SourceId};
use oriel_symbols::{
    Category, CompilerError, Genus, ScopeId, ScopeKind, SemanticError, Symbol, SymbolId,
    SymbolTable,
    symbol::{Function, Generic, Method, MethodFlags, VariableRole},
};
use oriel_tree::{
    node::{
        AggregateDecl, AggregateKind, Block, Capture, Decl, Expr, FunctionDecl, MethodDecl,
        MethodKind, Stmt, VariableDecl,
    },
    prelude::*,
};

use crate::records::UnitRecords;

/// Scope 0 of a unit table is the unit's module scope.
const ROOT: ScopeId = ScopeId::new(0);

pub(crate) struct DefinedUnit {
    pub table: SymbolTable,
    pub records: UnitRecords,
}

pub(crate) fn define_unit(tree: &Tree, report: &mut Report) -> Result<DefinedUnit, CompilerError> {
    let namespace = tree.root().namespace.clone();
    let mut definer = Definer {
        tree,
        source: tree.source(),
        table: SymbolTable::for_unit(namespace.clone()),
        namespace,
        records: UnitRecords::new(),
        report,
    };
    definer.define_module()?;

    debug!(
        "defined {} symbols in {:?} (`{}`)",
        definer.table.symbol_count(),
        definer.source,
        definer.namespace
    );

    let Definer { table, records, .. } = definer;
    Ok(DefinedUnit { table, records })
}

pub fn genus_of(kind: AggregateKind) -> Genus {
    match kind {
        AggregateKind::Class => Genus::Class,
        AggregateKind::Trait => Genus::ClassTrait,
        AggregateKind::Record => Genus::Record,
        AggregateKind::Component => Genus::Component,
        AggregateKind::Enumeration => Genus::ClassEnumeration,
        AggregateKind::Constrained => Genus::ClassConstrained,
        AggregateKind::Service => Genus::Service,
        AggregateKind::Program => Genus::Program,
        AggregateKind::Application => Genus::GeneralApplication,
        AggregateKind::ServiceApplication => Genus::ServiceApplication,
    }
}

struct Definer<'a> {
    tree: &'a Tree,
    source: SourceId,
    namespace: EcoString,
    table: SymbolTable,
    records: UnitRecords,
    report: &'a mut Report,
}

impl Definer<'_> {
    fn define_module(&mut self) -> Result<(), CompilerError> {
        let tree = self.tree;
        self.records.scopes.insert(tree.root_id(), ROOT);

        for &decl in &tree.root().decls {
            match decl {
                Decl::Aggregate(id) => self.define_aggregate(id)?,
                Decl::Function(id) => self.define_function(id)?,
                Decl::Constant(id) => {
                    self.define_variable(id, ROOT, VariableRole::Constant)?;
                    if let Some(init) = tree.node(id).init {
                        self.define_expr(init, ROOT)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Reports `name` if `scope` already holds a `category` of that name.
    fn is_unique(
        &mut self,
        scope: ScopeId,
        category: Category,
        name: &EcoString,
        loc: Loc,
    ) -> bool {
        let Some(&previous) = self.table.scope(scope).lookup(category, name).first() else {
            return true;
        };

        let error = SemanticError::DuplicateDefinition {
            name: name.clone(),
            category,
            loc,
            previous: self.table.symbol(previous).loc,
        };
        self.report.add_diagnostic(error.into());
        false
    }

    fn define_aggregate(&mut self, id: Id<AggregateDecl>) -> Result<(), CompilerError> {
        let tree = self.tree;
        let decl = tree.node(id);
        let loc = tree.loc(id);

        if !self.is_unique(ROOT, Category::Type, &decl.name, loc) {
            return Ok(());
        }

        let is_trait = decl.kind == AggregateKind::Trait;
        let mut symbol = Symbol::aggregate(decl.name.clone(), genus_of(decl.kind), ROOT, loc)
            .with_module(self.namespace.clone());
        if let Some(aggregate) = symbol.as_aggregate_mut() {
            let modifiers = &decl.modifiers;
            aggregate.open = modifiers.open || is_trait;
            aggregate.is_abstract = modifiers.is_abstract || is_trait;
            aggregate.injectable = modifiers.injectable;
            aggregate.dispatcher = modifiers.dispatcher;
            aggregate.pipe_sink = modifiers.pipe_sink.clone();
            aggregate.pipe_source = modifiers.pipe_source.clone();
        }

        let aggregate = self.table.new_aggregate(symbol, ROOT)?;
        self.table.define(ROOT, aggregate)?;
        let scope = self.table.member_scope(aggregate)?;
        self.records.symbols.insert(id, aggregate);
        self.records.scopes.insert(id, scope);

        for param in &decl.type_params {
            if self.is_unique(scope, Category::Type, param, loc) {
                self.table.add_type_parameter(aggregate, param.clone(), loc)?;
            }
        }

        for &field in &decl.fields {
            let role = if tree.node(field).modifiers.constant {
                VariableRole::Constant
            } else {
                VariableRole::Field
            };
            self.define_variable(field, scope, role)?;
            if let Some(init) = tree.node(field).init {
                self.define_expr(init, scope)?;
            }
        }

        for value in &decl.values {
            if self.is_unique(scope, Category::Variable, value, loc) {
                let constant = Symbol::variable(value.clone(), VariableRole::Constant, loc)
                    .with_module(self.namespace.clone())
                    .with_type(aggregate);
                self.table.add_and_define(scope, constant)?;
            }
        }

        for &method in &decl.methods {
            self.define_method(method, aggregate, scope)?;
        }
        Ok(())
    }

    fn define_method(
        &mut self,
        id: Id<MethodDecl>,
        owner: SymbolId,
        member_scope: ScopeId,
    ) -> Result<(), CompilerError> {
        let tree = self.tree;
        let decl = tree.node(id);
        let loc = tree.loc(id);

        let name = match decl.kind {
            MethodKind::Constructor => self.table.symbol(owner).name.clone(),
            _ => decl.name.clone(),
        };
        let flags = MethodFlags {
            operator: decl.kind == MethodKind::Operator,
            constructor: decl.kind == MethodKind::Constructor,
            synthetic: false,
            is_abstract: decl.modifiers.is_abstract,
            is_override: decl.modifiers.is_override,
            dispatcher: decl.modifiers.dispatcher,
        };

        let method_id = self.table.next_symbol_id();
        let scope = self
            .table
            .new_scope(name.clone(), ScopeKind::Method(method_id), Some(member_scope));
        let mut symbol = Symbol::method(
            name,
            Method {
                scope,
                owner,
                params: Vec::new(),
                returning: None,
                flags,
            },
            loc,
        )
        .with_module(self.namespace.clone());
        symbol.flags.pure = decl.modifiers.pure;

        let method = self.table.add_and_define(member_scope, symbol)?;
        self.records.symbols.insert(id, method);
        self.records.scopes.insert(id, scope);

        let (params, returning) = self.define_signature(&decl.params, decl.returning, scope)?;
        if let Some(method) = self.table.symbol_mut(method).as_method_mut() {
            method.params = params;
            method.returning = returning;
        }

        if let Some(body) = decl.body {
            self.define_block(body, scope)?;
        }
        Ok(())
    }

    fn define_function(&mut self, id: Id<FunctionDecl>) -> Result<(), CompilerError> {
        let tree = self.tree;
        let decl = tree.node(id);
        let loc = tree.loc(id);

        if !self.is_unique(ROOT, Category::Function, &decl.name, loc) {
            return Ok(());
        }

        let function_id = self.table.next_symbol_id();
        let scope = self
            .table
            .new_scope(decl.name.clone(), ScopeKind::Function(function_id), Some(ROOT));
        let mut symbol = Symbol::function(
            decl.name.clone(),
            Function {
                scope,
                params: Vec::new(),
                returning: None,
                is_abstract: decl.modifiers.is_abstract,
                generic: Generic::default(),
            },
            loc,
        )
        .with_module(self.namespace.clone());
        symbol.flags.pure = decl.modifiers.pure;

        let function = self.table.add_and_define(ROOT, symbol)?;
        self.records.symbols.insert(id, function);
        self.records.scopes.insert(id, scope);

        for param in &decl.type_params {
            if self.is_unique(scope, Category::Type, param, loc) {
                self.table.add_type_parameter(function, param.clone(), loc)?;
            }
        }

        let (params, returning) = self.define_signature(&decl.params, decl.returning, scope)?;
        if let Some(function) = self.table.symbol_mut(function).as_function_mut() {
            function.params = params;
            function.returning = returning;
        }

        if let Some(body) = decl.body {
            self.define_block(body, scope)?;
        }
        Ok(())
    }

    fn define_signature(
        &mut self,
        params: &[Id<VariableDecl>],
        returning: Option<Id<VariableDecl>>,
        scope: ScopeId,
    ) -> Result<(Vec<SymbolId>, Option<SymbolId>), CompilerError> {
        let mut defined = Vec::with_capacity(params.len());
        for &param in params {
            if let Some(symbol) = self.define_variable(param, scope, VariableRole::Parameter)? {
                defined.push(symbol);
            }
        }

        let returning = match returning {
            Some(rtn) => self.define_variable(rtn, scope, VariableRole::Returning)?,
            None => None,
        };
        Ok((defined, returning))
    }

    /// Defines the variable itself; its initializer is left to the caller,
    /// which knows the scope it is evaluated in.
    fn define_variable(
        &mut self,
        id: Id<VariableDecl>,
        scope: ScopeId,
        role: VariableRole,
    ) -> Result<Option<SymbolId>, CompilerError> {
        let tree = self.tree;
        let decl = tree.node(id);
        let loc = tree.loc(id);

        if !self.is_unique(scope, Category::Variable, &decl.name, loc) {
            return Ok(None);
        }

        let mut symbol =
            Symbol::variable(decl.name.clone(), role, loc).with_module(self.namespace.clone());
        let modifiers = &decl.modifiers;
        symbol.flags.nullable = modifiers.nullable;
        symbol.flags.injection_expected = modifiers.injected;
        if modifiers.constant {
            symbol.flags.mutable = false;
        }

        let variable = self.table.add_and_define(scope, symbol)?;
        self.records.symbols.insert(id, variable);
        if let Some(binding) = &modifiers.binding {
            self.records.bindings.insert(variable, binding.clone());
        }
        Ok(Some(variable))
    }

    fn define_block(&mut self, id: Id<Block>, enclosing: ScopeId) -> Result<(), CompilerError> {
        let tree = self.tree;
        let scope = self
            .table
            .new_scope("block", ScopeKind::Block, Some(enclosing));
        self.records.scopes.insert(id, scope);

        for &stmt in &tree.node(id).stmts {
            match stmt {
                Stmt::Variable(variable) => {
                    self.define_variable(variable, scope, VariableRole::Local)?;
                    if let Some(init) = tree.node(variable).init {
                        self.define_expr(init, scope)?;
                    }
                }
                Stmt::Expr(expr) => self.define_expr(expr, scope)?,
                Stmt::Block(block) => self.define_block(block, scope)?,
            }
        }
        Ok(())
    }

    /// Expressions only declare something when they contain captures.
    fn define_expr(&mut self, id: Id<Expr>, scope: ScopeId) -> Result<(), CompilerError> {
        let tree = self.tree;
        match tree.node(id) {
            Expr::Literal(_) | Expr::Ident(_) => {}
            Expr::Call { args, .. } => {
                for &arg in args {
                    self.define_expr(arg, scope)?;
                }
            }
            Expr::MethodCall { target, args, .. } => {
                self.define_expr(*target, scope)?;
                for &arg in args {
                    self.define_expr(arg, scope)?;
                }
            }
            Expr::Binary { lhs, rhs, .. } => {
                self.define_expr(*lhs, scope)?;
                self.define_expr(*rhs, scope)?;
            }
            Expr::Unary { operand, .. } => self.define_expr(*operand, scope)?,
            Expr::Capture(capture) => self.define_capture(*capture, scope)?,
        }
        Ok(())
    }

    fn define_capture(&mut self, id: Id<Capture>, enclosing: ScopeId) -> Result<(), CompilerError> {
        let tree = self.tree;
        let capture = tree.node(id);
        let scope = self
            .table
            .new_scope("capture", ScopeKind::Capture, Some(enclosing));
        self.records.scopes.insert(id, scope);

        for &variable in &capture.captures {
            self.define_variable(variable, scope, VariableRole::Captured)?;
            if let Some(init) = tree.node(variable).init {
                self.define_expr(init, enclosing)?;
            }
        }
        self.define_block(capture.body, scope)
    }
}

#[cfg(test)]
mod tests {
    use oriel_symbols::{Category, SymbolSearch, symbol::VariableRole};
    use oriel_tree::node::{AggregateDecl, AggregateKind, MethodDecl, VariableDecl, WebBinding};

    use crate::{
        coordinator::Pass,
        test::{UnitBuilder, error_codes, find_type, resolve_one},
    };

    #[test]
    fn duplicate_in_one_unit_points_at_first() {
        let mut unit = UnitBuilder::new(0, "demo");
        unit.class("Shape");
        unit.class("Shape");
        let output = resolve_one(unit.finish());

        assert_eq!(output.pass, Pass::Definition);
        assert_eq!(error_codes(&output), ["duplicate-definition"]);
        let diagnostic = output.units[0].report.errors().next().unwrap();
        assert_eq!(diagnostic.trace.len(), 1);
    }

    #[test]
    fn type_and_variable_may_share_a_name() {
        let mut unit = UnitBuilder::new(0, "demo");
        unit.class("Origin");
        let zero = unit.integer("0");
        unit.constant(VariableDecl::inferred("Origin", zero));
        let output = resolve_one(unit.finish());

        assert!(output.is_complete(), "{:?}", error_codes(&output));
        let module = output.table.module_scope("demo").unwrap();
        let scope = output.table.scope(module);
        assert!(scope.contains(Category::Type, "Origin"));
        assert!(scope.contains(Category::Variable, "Origin"));
    }

    #[test]
    fn members_land_in_the_member_scope() {
        let mut unit = UnitBuilder::new(0, "demo");
        let width = unit.typed("width", "Integer");
        let area = unit.signature(MethodDecl::method("area"), &[], Some("Integer"));
        let mut decl = AggregateDecl::class("Rect")
            .with_fields(vec![width])
            .with_methods(vec![area]);
        decl.type_params = vec!["T".into()];
        unit.aggregate(decl);
        let output = resolve_one(unit.finish());

        let table = &output.table;
        let rect = find_type(table, "demo", "Rect");
        let records = &output.units[0].records;
        let area = records.symbols.copied(area).unwrap();
        let width = records.symbols.copied(width).unwrap();

        assert_eq!(table.fields(rect), [width]);
        assert!(table.own_methods(rect).contains(&area));
        assert_eq!(table.symbol(area).as_method().unwrap().owner, rect);
        assert!(table.is_generic_template(rect));
        assert!(
            table
                .resolve_member(rect, &SymbolSearch::types("T"))
                .is_some_and(|t| table.symbol(t).is_conceptual())
        );
    }

    #[test]
    fn web_bindings_follow_the_merge() {
        let mut unit = UnitBuilder::new(0, "demo");
        let ty = unit.ty("String");
        let mut param = VariableDecl::typed("id", ty);
        param.modifiers.binding = Some(WebBinding::Query("id".into()));
        let param = unit.var(param);
        let handler = unit.method(MethodDecl::method("fetch").with_params(vec![param]));
        let service = AggregateDecl::new(AggregateKind::Service, "Orders");
        unit.aggregate(service.with_methods(vec![handler]));
        let output = resolve_one(unit.finish());

        assert!(output.is_complete(), "{:?}", error_codes(&output));
        let records = &output.units[0].records;
        let param = records.symbols.copied(param).unwrap();
        assert_eq!(
            output.table.symbol(param).as_variable().unwrap().role,
            VariableRole::Parameter
        );
        assert_eq!(records.bindings.get(param), Some(&WebBinding::Query("id".into())));
    }
}
