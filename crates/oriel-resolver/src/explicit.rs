//! The explicit types pass: everything the source spells out. Supers,
//! traits, constraint bases and declared types are resolved here, and each
//! parameterization site creates its instance shell.

use ecow::{EcoString, eco_format};
use log::{debug, trace};
use oriel_span::{Loc, Report, SourceId};
use oriel_symbols::{
    CORE_NAMESPACE, Category, CompilerError, Genus, ScopeId, SemanticError, SymbolError,
    SymbolId, SymbolSearch, SymbolTable,
};
use oriel_tree::{
    node::{
        AggregateDecl, Block, Capture, Decl, Expr, FunctionDecl, MethodDecl, Stmt, TypeExpr,
        VariableDecl,
    },
    prelude::*,
};

use crate::{program::Program, records::UnitRecords};

/// A constrained type waiting for its members, found while walking a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Constraint {
    pub constrained: SymbolId,
    pub base: SymbolId,
    pub loc: Loc,
}

pub(crate) fn resolve_unit(
    program: &Program,
    tree: &Tree,
    records: &mut UnitRecords,
    report: &mut Report,
) -> Result<Vec<Constraint>, CompilerError> {
    let mut resolver = ExplicitResolver {
        program,
        tree,
        source: tree.source(),
        records,
        report,
        constraints: Vec::new(),
    };
    resolver.resolve_module()?;

    trace!(
        "resolved explicit types of {:?}, {} constrained types",
        resolver.source,
        resolver.constraints.len()
    );
    Ok(resolver.constraints)
}

struct ExplicitResolver<'a> {
    program: &'a Program,
    tree: &'a Tree,
    source: SourceId,
    records: &'a mut UnitRecords,
    report: &'a mut Report,
    constraints: Vec<Constraint>,
}

impl ExplicitResolver<'_> {
    fn report(&mut self, error: SemanticError) {
        self.report.add_diagnostic(error.into());
    }

    fn resolve_module(&mut self) -> Result<(), CompilerError> {
        let tree = self.tree;
        let root = self.records.scope(tree.root_id(), self.source)?;

        for &decl in &tree.root().decls {
            match decl {
                Decl::Aggregate(id) => self.resolve_aggregate(id)?,
                Decl::Function(id) => self.resolve_function(id)?,
                Decl::Constant(id) => self.resolve_variable(id, root, true)?,
            }
        }
        Ok(())
    }

    /// Resolves a written type, parameterizing it when it has arguments.
    fn resolve_type_expr(
        &mut self,
        id: Id<TypeExpr>,
        scope: ScopeId,
    ) -> Result<Option<SymbolId>, CompilerError> {
        let tree = self.tree;
        let expr = tree.node(id);
        let loc = tree.loc(id);

        let mut args = Vec::with_capacity(expr.args.len());
        for &arg in &expr.args {
            match self.resolve_type_expr(arg, scope)? {
                Some(ty) => args.push(ty),
                None => return Ok(None),
            }
        }

        let found = self
            .program
            .read()
            .resolve(scope, &SymbolSearch::types(expr.name.clone()));
        let Some(found) = found else {
            self.report(SemanticError::Unresolved {
                name: expr.name.clone(),
                category: Category::Type,
                loc,
            });
            return Ok(None);
        };

        let ty = if args.is_empty() {
            let bare = {
                let table = self.program.read();
                table.is_generic_template(found) && !table.refers_to_own_template(scope, found)
            };
            if bare {
                self.report(SemanticError::TemplateNeedsArguments {
                    name: expr.name.clone(),
                    loc,
                });
                return Ok(None);
            }
            found
        } else {
            let parameterized = self.program.write().parameterize(found, &args, loc);
            match parameterized {
                Ok(instance) => instance,
                Err(error) => {
                    self.report(error);
                    return Ok(None);
                }
            }
        };

        self.records.types.insert(id, ty);
        Ok(Some(ty))
    }

    fn assign_type(&mut self, variable: SymbolId, ty: SymbolId) {
        self.program.write().symbol_mut(variable).ty = Some(ty);
    }

    fn resolve_aggregate(&mut self, id: Id<AggregateDecl>) -> Result<(), CompilerError> {
        let tree = self.tree;
        let decl = tree.node(id);

        // Duplicates were reported by the definition pass and have no symbol.
        let Some(aggregate) = self.records.symbols.copied(id) else {
            return Ok(());
        };
        let scope = self.records.scope(id, self.source)?;

        if let Some(extends) = decl.extends
            && let Some(parent) = self.resolve_type_expr(extends, scope)?
        {
            self.link_super(aggregate, parent, tree.loc(extends))?;
        }

        let mut listed = Vec::with_capacity(decl.traits.len());
        for &trait_expr in &decl.traits {
            let loc = tree.loc(trait_expr);
            let Some(trait_id) = self.resolve_type_expr(trait_expr, scope)? else {
                continue;
            };
            if listed.contains(&trait_id) {
                let name = decl.name.clone();
                let trait_name = self.program.read().symbol(trait_id).name.clone();
                self.report(SemanticError::DuplicateTrait {
                    name,
                    trait_name,
                    loc,
                });
                continue;
            }
            listed.push(trait_id);
            self.link_trait(aggregate, trait_id, loc)?;
        }

        if let Some(base) = decl.constrains
            && let Some(resolved) = self.resolve_type_expr(base, scope)?
        {
            self.constraints.push(Constraint {
                constrained: aggregate,
                base: resolved,
                loc: tree.loc(base),
            });
        }

        let loc = tree.loc(id);
        for pipe in [&decl.modifiers.pipe_sink, &decl.modifiers.pipe_source]
            .into_iter()
            .flatten()
        {
            self.resolve_pipe(pipe, scope, loc);
        }

        for &field in &decl.fields {
            self.resolve_variable(field, scope, true)?;
        }
        for &method in &decl.methods {
            self.resolve_method(method)?;
        }
        Ok(())
    }

    fn link_super(
        &mut self,
        aggregate: SymbolId,
        parent: SymbolId,
        loc: Loc,
    ) -> Result<(), CompilerError> {
        let mut table = self.program.write();
        let checked = check_extends(&table, aggregate, parent, loc)
            .and_then(|()| table.check_super(aggregate, parent, loc));
        if let Err(error) = checked {
            drop(table);
            self.report(error);
            return Ok(());
        }
        table.set_super(aggregate, parent)
    }

    fn link_trait(
        &mut self,
        aggregate: SymbolId,
        trait_id: SymbolId,
        loc: Loc,
    ) -> Result<(), CompilerError> {
        let mut table = self.program.write();
        let trait_symbol = table.symbol(trait_id);
        let checked = if trait_symbol.genus == Genus::ClassTrait {
            table.check_trait(aggregate, trait_id, loc)
        } else {
            Err(SemanticError::IllegalTrait {
                name: table.symbol(aggregate).name.clone(),
                trait_name: trait_symbol.name.clone(),
                reason: eco_format!("it is a {}, not a trait", trait_symbol.genus),
                loc,
            })
        };
        if let Err(error) = checked {
            drop(table);
            self.report(error);
            return Ok(());
        }
        table.add_trait(aggregate, trait_id).map(|_| ())
    }

    fn resolve_pipe(&mut self, name: &EcoString, scope: ScopeId, loc: Loc) {
        let found = self
            .program
            .read()
            .resolve(scope, &SymbolSearch::types(name.clone()));
        if found.is_none() {
            self.report(SemanticError::Unresolved {
                name: name.clone(),
                category: Category::Type,
                loc,
            });
        }
    }

    fn resolve_method(&mut self, id: Id<MethodDecl>) -> Result<(), CompilerError> {
        let decl = self.tree.node(id);
        let scope = self.records.scope(id, self.source)?;

        for &param in &decl.params {
            self.resolve_variable(param, scope, false)?;
        }
        if let Some(returning) = decl.returning {
            self.resolve_variable(returning, scope, false)?;
        }
        if let Some(body) = decl.body {
            self.resolve_block(body)?;
        }
        Ok(())
    }

    fn resolve_function(&mut self, id: Id<FunctionDecl>) -> Result<(), CompilerError> {
        let decl = self.tree.node(id);
        if !self.records.symbols.contains(id) {
            return Ok(());
        }
        let scope = self.records.scope(id, self.source)?;

        for &param in &decl.params {
            self.resolve_variable(param, scope, false)?;
        }
        if let Some(returning) = decl.returning {
            self.resolve_variable(returning, scope, false)?;
        }
        if let Some(body) = decl.body {
            self.resolve_block(body)?;
        }
        Ok(())
    }

    /// Gives a variable its declared type. Without one it must have an
    /// initializer to infer from, which signatures never do.
    fn resolve_variable(
        &mut self,
        id: Id<VariableDecl>,
        scope: ScopeId,
        may_infer: bool,
    ) -> Result<(), CompilerError> {
        let tree = self.tree;
        let decl = tree.node(id);
        let Some(variable) = self.records.symbols.copied(id) else {
            return Ok(());
        };

        match decl.ty {
            Some(ty) => {
                if let Some(ty) = self.resolve_type_expr(ty, scope)? {
                    self.assign_type(variable, ty);
                }
            }
            None if may_infer && decl.init.is_some() => {}
            None => self.report(SemanticError::NotInferable {
                name: decl.name.clone(),
                loc: tree.loc(id),
            }),
        }

        if let Some(init) = decl.init {
            self.resolve_expr(init, scope)?;
        }
        Ok(())
    }

    fn resolve_block(&mut self, id: Id<Block>) -> Result<(), CompilerError> {
        let tree = self.tree;
        let scope = self.records.scope(id, self.source)?;

        for &stmt in &tree.node(id).stmts {
            match stmt {
                Stmt::Variable(variable) => self.resolve_variable(variable, scope, true)?,
                Stmt::Expr(expr) => self.resolve_expr(expr, scope)?,
                Stmt::Block(block) => self.resolve_block(block)?,
            }
        }
        Ok(())
    }

    /// Only parameterization sites and captures need anything here.
    fn resolve_expr(&mut self, id: Id<Expr>, scope: ScopeId) -> Result<(), CompilerError> {
        let tree = self.tree;
        match tree.node(id) {
            Expr::Literal(_) | Expr::Ident(_) => {}
            Expr::Call {
                callee,
                type_args,
                args,
            } => {
                if !type_args.is_empty() {
                    self.resolve_parameterization(id, callee, type_args, scope)?;
                }
                for &arg in args {
                    self.resolve_expr(arg, scope)?;
                }
            }
            Expr::MethodCall { target, args, .. } => {
                self.resolve_expr(*target, scope)?;
                for &arg in args {
                    self.resolve_expr(arg, scope)?;
                }
            }
            Expr::Binary { lhs, rhs, .. } => {
                self.resolve_expr(*lhs, scope)?;
                self.resolve_expr(*rhs, scope)?;
            }
            Expr::Unary { operand, .. } => self.resolve_expr(*operand, scope)?,
            Expr::Capture(capture) => self.resolve_capture(*capture, scope)?,
        }
        Ok(())
    }

    /// `List of Integer()`: the instance is recorded as the call's type.
    fn resolve_parameterization(
        &mut self,
        call: Id<Expr>,
        callee: &EcoString,
        type_args: &[Id<TypeExpr>],
        scope: ScopeId,
    ) -> Result<(), CompilerError> {
        let loc = self.tree.loc(call);

        let mut args = Vec::with_capacity(type_args.len());
        for &arg in type_args {
            match self.resolve_type_expr(arg, scope)? {
                Some(ty) => args.push(ty),
                None => return Ok(()),
            }
        }

        let template = self.program.read().resolve(
            scope,
            &SymbolSearch::types(callee.clone()).or(Category::Function),
        );
        let Some(template) = template else {
            self.report(SemanticError::Unresolved {
                name: callee.clone(),
                category: Category::Type,
                loc,
            });
            return Ok(());
        };

        let parameterized = self.program.write().parameterize(template, &args, loc);
        match parameterized {
            Ok(instance) => {
                self.records.types.insert(call, instance);
            }
            Err(error) => self.report(error),
        }
        Ok(())
    }

    /// Captured variables are typed and initialised in the enclosing scope.
    fn resolve_capture(
        &mut self,
        id: Id<Capture>,
        enclosing: ScopeId,
    ) -> Result<(), CompilerError> {
        let capture = self.tree.node(id);
        for &variable in &capture.captures {
            self.resolve_variable(variable, enclosing, true)?;
        }
        self.resolve_block(capture.body)
    }
}

/// Genus and openness rules of a super, cycles aside.
fn check_extends(
    table: &SymbolTable,
    aggregate: SymbolId,
    parent: SymbolId,
    loc: Loc,
) -> Result<(), SemanticError> {
    let (child, base) = (table.symbol(aggregate), table.symbol(parent));

    let reason = if !child.genus.can_extend(base.genus) {
        Some(eco_format!("a {} cannot extend a {}", child.genus, base.genus))
    } else if !table.aggregate(parent).is_some_and(|a| a.open || a.is_abstract) {
        Some(EcoString::from("it is neither open nor abstract"))
    } else {
        None
    };

    match reason {
        Some(reason) => Err(SemanticError::IllegalSuper {
            name: child.name.clone(),
            parent: base.name.clone(),
            reason,
            loc,
        }),
        None => Ok(()),
    }
}

/// The serial step between the two halves of the pass: instances are
/// populated, constrained types get their members and the compiler adds its
/// synthetic members. Runs under a single write guard.
pub(crate) fn settle(
    table: &mut SymbolTable,
    constraints: &[Constraint],
) -> Result<Vec<SemanticError>, CompilerError> {
    let mut errors = table.populate_pending()?;

    let aggregates: Vec<SymbolId> = table
        .symbol_ids()
        .filter(|&id| {
            let symbol = table.symbol(id);
            symbol.module != CORE_NAMESPACE
                && symbol.as_aggregate().is_some()
                && !symbol.is_conceptual()
        })
        .collect();

    for &aggregate in &aggregates {
        if table.symbol(aggregate).genus == Genus::ClassEnumeration {
            table.synthesize_enumeration(aggregate)?;
        }
    }

    let pairs: Vec<(SymbolId, SymbolId)> = constraints
        .iter()
        .map(|c| (c.constrained, c.base))
        .collect();
    for (constrained, base) in table.order_by_base(&pairs) {
        let loc = constraints
            .iter()
            .find(|c| c.constrained == constrained)
            .map_or(table.symbol(constrained).loc, |c| c.loc);
        match table.constrain(constrained, base, loc) {
            Ok(()) => {}
            Err(SymbolError::Semantic(error)) => errors.push(error),
            Err(SymbolError::Fatal(error)) => return Err(error),
        }
    }

    errors.extend(table.populate_pending()?);

    // Templates are only constructed through their instances, including the
    // instances constraining just populated.
    let owing: Vec<SymbolId> = table
        .symbol_ids()
        .filter(|&id| {
            let symbol = table.symbol(id);
            symbol.module != CORE_NAMESPACE
                && symbol.as_aggregate().is_some()
                && !symbol.is_conceptual()
                && !table.is_generic_template(id)
        })
        .collect();
    let mut synthesized = 0;
    for aggregate in owing {
        synthesized += table.synthesize_constructors(aggregate)?;
    }

    debug!(
        "settled {} constrained types, synthesized {synthesized} constructors",
        constraints.len()
    );
    Ok(errors)
}

/// Read-only checks once every signature is typed: operator contracts and
/// methods declared twice with the same parameter types.
pub(crate) fn check_unit(
    program: &Program,
    tree: &Tree,
    records: &UnitRecords,
    report: &mut Report,
) {
    let table = program.read();

    for &decl in &tree.root().decls {
        let Decl::Aggregate(id) = decl else {
            continue;
        };
        if !records.symbols.contains(id) {
            continue;
        }

        let methods: Vec<SymbolId> = tree
            .node(id)
            .methods
            .iter()
            .filter_map(|&method| records.symbols.copied(method))
            .collect();

        for (index, &method) in methods.iter().enumerate() {
            if table.symbol(method).is_operator() {
                report.extend(table.check_operator(method).into_iter().map(Into::into));
            }

            let Some(&previous) = methods[..index]
                .iter()
                .find(|&&earlier| table.has_same_signature(earlier, method))
            else {
                continue;
            };
            let symbol = table.symbol(method);
            let types = table.param_types(method).unwrap_or_default();
            report.add_diagnostic(
                SemanticError::DuplicateMethod {
                    name: symbol.name.clone(),
                    args: table.describe_types(&types),
                    loc: symbol.loc,
                    previous: table.symbol(previous).loc,
                }
                .into(),
            );
        }
    }
}
