//! The inferred types pass: variables declared without a type take the type
//! of their initializer, and every call is bound to the method, function or
//! constructor it resolves to.

use ecow::EcoString;
use log::trace;
use oriel_span::{Loc, Report, SourceId};
use std::collections::{HashMap, HashSet};
use oriel_symbols::{
    Category, CompilerError, CoreTypes, MatchOutcome, MethodSearch, ScopeId, SemanticError,
    SymbolId, SymbolSearch, matcher::match_methods,
};
use oriel_tree::{
    node::{Block, Capture, Decl, Expr, LiteralKind, Stmt, VariableDecl},
    prelude::*,
};

use crate::{program::Program, records::UnitRecords};

/// A declaration that stayed untyped because its initializer used variables
/// that were untyped as well.
#[derive(Debug, Clone)]
pub(crate) struct Waiting {
    pub variable: SymbolId,
    pub on: Vec<SymbolId>,
    pub name: EcoString,
    pub loc: Loc,
}

/// What one run over the declarations of a unit achieved.
#[derive(Debug, Default)]
pub(crate) struct Declarations {
    /// Variables that got their first type during the run.
    pub typed: usize,
    pub waiting: Vec<Waiting>,
}

/// Module constants and field initializers. Other units may depend on these,
/// so the coordinator runs this step for one unit at a time, repeating it
/// while it keeps typing new declarations.
pub(crate) fn infer_declarations(
    program: &Program,
    tree: &Tree,
    records: &mut UnitRecords,
    report: &mut Report,
) -> Result<Declarations, CompilerError> {
    let mut inferrer = Inferrer::new(program, tree, records, report)?;
    let root = inferrer.records.scope(tree.root_id(), inferrer.source)?;

    for &decl in &tree.root().decls {
        match decl {
            Decl::Constant(id) => inferrer.infer_variable(id, root)?,
            Decl::Aggregate(id) => {
                if !inferrer.records.symbols.contains(id) {
                    continue;
                }
                let scope = inferrer.records.scope(id, inferrer.source)?;
                for &field in &tree.node(id).fields {
                    inferrer.infer_variable(field, scope)?;
                }
            }
            Decl::Function(_) => {}
        }
    }
    Ok(inferrer.declarations)
}

/// Errors for the waiting declarations that wait, directly or through
/// others, on themselves. The rest wait on a declaration that failed for a
/// reason of its own and was reported as such.
pub(crate) fn circular(waiting: &[Waiting]) -> Vec<SemanticError> {
    let edges: HashMap<SymbolId, &[SymbolId]> = waiting
        .iter()
        .map(|w| (w.variable, w.on.as_slice()))
        .collect();

    waiting
        .iter()
        .filter(|w| {
            let mut seen = HashSet::new();
            let mut stack = w.on.clone();
            while let Some(next) = stack.pop() {
                if next == w.variable {
                    return true;
                }
                if seen.insert(next)
                    && let Some(&on) = edges.get(&next)
                {
                    stack.extend_from_slice(on);
                }
            }
            false
        })
        .map(|w| SemanticError::CircularInference {
            name: w.name.clone(),
            loc: w.loc,
        })
        .collect()
}

/// Method and function bodies of one unit.
pub(crate) fn infer_bodies(
    program: &Program,
    tree: &Tree,
    records: &mut UnitRecords,
    report: &mut Report,
) -> Result<(), CompilerError> {
    let mut inferrer = Inferrer::new(program, tree, records, report)?;

    for &decl in &tree.root().decls {
        match decl {
            Decl::Aggregate(id) => {
                if !inferrer.records.symbols.contains(id) {
                    continue;
                }
                for &method in &tree.node(id).methods {
                    if let Some(body) = tree.node(method).body {
                        inferrer.infer_block(body)?;
                    }
                }
            }
            Decl::Function(id) => {
                if inferrer.records.symbols.contains(id)
                    && let Some(body) = tree.node(id).body
                {
                    inferrer.infer_block(body)?;
                }
            }
            Decl::Constant(_) => {}
        }
    }

    trace!(
        "inferred {} expression types in {:?}",
        inferrer.records.types.len(),
        inferrer.source
    );
    Ok(())
}

struct Inferrer<'a> {
    program: &'a Program,
    tree: &'a Tree,
    source: SourceId,
    core: CoreTypes,
    records: &'a mut UnitRecords,
    report: &'a mut Report,
    /// Untyped variables the current initializer referred to.
    untyped_uses: Vec<SymbolId>,
    declarations: Declarations,
}

impl<'a> Inferrer<'a> {
    fn new(
        program: &'a Program,
        tree: &'a Tree,
        records: &'a mut UnitRecords,
        report: &'a mut Report,
    ) -> Result<Self, CompilerError> {
        let core = *program.read().require_core()?;
        Ok(Self {
            program,
            tree,
            source: tree.source(),
            core,
            records,
            report,
            untyped_uses: Vec::new(),
            declarations: Declarations::default(),
        })
    }

    fn report(&mut self, error: SemanticError) {
        self.report.add_diagnostic(error.into());
    }

    /// Evaluates the initializer in `scope` and, for an untyped variable,
    /// takes over its type.
    fn infer_variable(
        &mut self,
        id: Id<VariableDecl>,
        scope: ScopeId,
    ) -> Result<(), CompilerError> {
        let tree = self.tree;
        let decl = tree.node(id);
        let Some(init) = decl.init else {
            return Ok(());
        };

        let reported = self.report.len();
        let outer = std::mem::take(&mut self.untyped_uses);
        let ty = self.infer_expr(init, scope)?;
        let untyped_uses = std::mem::replace(&mut self.untyped_uses, outer);

        let Some(variable) = self.records.symbols.copied(id) else {
            return Ok(());
        };
        if decl.ty.is_some() {
            return Ok(());
        }

        match ty {
            Some(ty) => {
                let mut table = self.program.write();
                let symbol = table.symbol_mut(variable);
                if symbol.ty.replace(ty).is_none() {
                    self.declarations.typed += 1;
                }
            }
            // Errors in the initializer already explain why.
            None if self.report.len() > reported => {}
            None if !untyped_uses.is_empty() => self.declarations.waiting.push(Waiting {
                variable,
                on: untyped_uses,
                name: decl.name.clone(),
                loc: tree.loc(id),
            }),
            None => self.report(SemanticError::NotInferable {
                name: decl.name.clone(),
                loc: tree.loc(id),
            }),
        }
        Ok(())
    }

    fn infer_block(&mut self, id: Id<Block>) -> Result<(), CompilerError> {
        let tree = self.tree;
        let scope = self.records.scope(id, self.source)?;

        for &stmt in &tree.node(id).stmts {
            match stmt {
                Stmt::Variable(variable) => self.infer_variable(variable, scope)?,
                Stmt::Expr(expr) => {
                    self.infer_expr(expr, scope)?;
                }
                Stmt::Block(block) => self.infer_block(block)?,
            }
        }
        Ok(())
    }

    /// Type of the expression `id`, `None` when it has none or could not be
    /// determined. Sub-expressions are typed before their parents.
    fn infer_expr(
        &mut self,
        id: Id<Expr>,
        scope: ScopeId,
    ) -> Result<Option<SymbolId>, CompilerError> {
        let tree = self.tree;
        let ty = match tree.node(id) {
            Expr::Literal(literal) => Some(self.literal_type(literal.kind)),
            Expr::Ident(name) => self.infer_ident(id, name, scope),
            Expr::Call {
                callee,
                type_args,
                args,
            } => {
                let Some(args) = self.infer_args(args, scope)? else {
                    return Ok(None);
                };
                if type_args.is_empty() {
                    self.infer_call(id, callee, &args, scope)
                } else {
                    self.infer_parameterized_call(id, &args)
                }
            }
            Expr::MethodCall { target, name, args } => {
                let target = self.infer_expr(*target, scope)?;
                let Some(args) = self.infer_args(args, scope)? else {
                    return Ok(None);
                };
                match target {
                    Some(target) => self.infer_member_call(id, target, name, args),
                    None => None,
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.infer_expr(*lhs, scope)?;
                let rhs = self.infer_expr(*rhs, scope)?;
                match (lhs, rhs) {
                    (Some(lhs), Some(rhs)) => self.infer_member_call(id, lhs, op, vec![rhs]),
                    _ => None,
                }
            }
            Expr::Unary { op, operand } => match self.infer_expr(*operand, scope)? {
                Some(operand) => self.infer_member_call(id, operand, op, Vec::new()),
                None => None,
            },
            Expr::Capture(capture) => {
                self.infer_capture(*capture, scope)?;
                Some(self.core.any)
            }
        };

        if let Some(ty) = ty {
            self.records.types.insert(id, ty);
        }
        Ok(ty)
    }

    fn literal_type(&self, kind: LiteralKind) -> SymbolId {
        match kind {
            LiteralKind::Integer => self.core.integer,
            LiteralKind::Float => self.core.float,
            LiteralKind::String => self.core.string,
            LiteralKind::Character => self.core.character,
            LiteralKind::Boolean => self.core.boolean,
        }
    }

    /// Types of all `args`, `None` if any of them is unknown.
    fn infer_args(
        &mut self,
        args: &[Id<Expr>],
        scope: ScopeId,
    ) -> Result<Option<Vec<SymbolId>>, CompilerError> {
        let mut types = Vec::with_capacity(args.len());
        let mut complete = true;
        for &arg in args {
            match self.infer_expr(arg, scope)? {
                Some(ty) => types.push(ty),
                None => complete = false,
            }
        }
        Ok(complete.then_some(types))
    }

    fn infer_ident(&mut self, id: Id<Expr>, name: &EcoString, scope: ScopeId) -> Option<SymbolId> {
        let table = self.program.read();
        let Some(found) = table.resolve(scope, &SymbolSearch::variables(name.clone())) else {
            drop(table);
            self.report(SemanticError::Unresolved {
                name: name.clone(),
                category: Category::Variable,
                loc: self.tree.loc(id),
            });
            return None;
        };
        let ty = table.type_of(found);
        drop(table);

        if ty.is_none() {
            self.untyped_uses.push(found);
        }
        self.records.targets.insert(id, found);
        ty
    }

    /// `callee(args)`: a constructor when `callee` names a type, otherwise a
    /// function or a method visible from `scope`.
    fn infer_call(
        &mut self,
        id: Id<Expr>,
        callee: &EcoString,
        args: &[SymbolId],
        scope: ScopeId,
    ) -> Option<SymbolId> {
        let table = self.program.read();

        if let Some(aggregate) = table.resolve(scope, &SymbolSearch::types(callee.clone())) {
            drop(table);
            return self.infer_construction(id, aggregate, args.to_vec());
        }

        let search = MethodSearch::new(callee.clone(), args.to_vec());
        let outcome = match table.resolve(scope, &SymbolSearch::functions(callee.clone())) {
            Some(function) => match_methods(&table, &[function], &search, 0.0).outcome(),
            None => table.resolve_matching_methods(scope, &search).outcome(),
        };
        drop(table);

        self.bind_call(id, callee, args, outcome, None)
    }

    /// `List of Integer(args)`; the instance was recorded on the call by the
    /// explicit types pass.
    fn infer_parameterized_call(&mut self, id: Id<Expr>, args: &[SymbolId]) -> Option<SymbolId> {
        let instance = self.records.types.copied(id)?;
        let table = self.program.read();

        if table.aggregate(instance).is_some() {
            drop(table);
            return self.infer_construction(id, instance, args.to_vec());
        }

        let name = table.symbol(instance).name.clone();
        let search = MethodSearch::new(name.clone(), args.to_vec());
        let outcome = match_methods(&table, &[instance], &search, 0.0).outcome();
        drop(table);

        self.bind_call(id, &name, args, outcome, None)
    }

    fn infer_construction(
        &mut self,
        id: Id<Expr>,
        aggregate: SymbolId,
        args: Vec<SymbolId>,
    ) -> Option<SymbolId> {
        let table = self.program.read();
        let name = table.symbol(aggregate).name.clone();
        if table.is_generic_template(aggregate) {
            drop(table);
            self.report(SemanticError::TemplateNeedsArguments {
                name,
                loc: self.tree.loc(id),
            });
            return None;
        }
        let search = MethodSearch::new(name.clone(), args);
        let outcome = match_methods(&table, &table.constructors(aggregate), &search, 0.0).outcome();
        drop(table);

        self.bind_call(id, &name, &search.args, outcome, Some(aggregate))
    }

    /// Methods and operators invoked on a value of type `target`.
    fn infer_member_call(
        &mut self,
        id: Id<Expr>,
        target: SymbolId,
        name: &EcoString,
        args: Vec<SymbolId>,
    ) -> Option<SymbolId> {
        let search = MethodSearch::new(name.clone(), args);
        let outcome = self
            .program
            .read()
            .aggregate_matching_methods(target, &search)
            .outcome();
        self.bind_call(id, name, &search.args, outcome, None)
    }

    /// Records what a call resolved to and yields its type; constructors
    /// yield the type they construct.
    fn bind_call(
        &mut self,
        id: Id<Expr>,
        name: &EcoString,
        args: &[SymbolId],
        outcome: MatchOutcome,
        constructs: Option<SymbolId>,
    ) -> Option<SymbolId> {
        let loc = self.tree.loc(id);
        let table = self.program.read();

        let error = match outcome {
            MatchOutcome::Resolved(target) => {
                let ty = constructs.or_else(|| table.return_type(target));
                drop(table);
                self.records.targets.insert(id, target);
                return ty;
            }
            MatchOutcome::Unresolved => SemanticError::UnresolvedCall {
                name: name.clone(),
                args: table.describe_types(args),
                loc,
            },
            MatchOutcome::Ambiguous(candidates) => SemanticError::Ambiguous {
                name: name.clone(),
                args: table.describe_types(args),
                candidates: candidates
                    .iter()
                    .map(|&candidate| {
                        let types = table.param_types(candidate).unwrap_or_default();
                        format!(
                            "`{}({})`",
                            table.fully_qualified_name(candidate),
                            table.describe_types(&types)
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(" and "),
                loc,
            },
        };
        drop(table);

        self.report(error);
        None
    }

    /// Captured variables are evaluated in the enclosing scope, then the
    /// capture is sealed so its body only sees what it captured.
    fn infer_capture(&mut self, id: Id<Capture>, enclosing: ScopeId) -> Result<(), CompilerError> {
        let tree = self.tree;
        let capture = tree.node(id);
        let scope = self.records.scope(id, self.source)?;

        for &variable in &capture.captures {
            self.infer_variable(variable, enclosing)?;
        }
        self.program.write().set_enclosing_visible(scope, false);
        self.infer_block(capture.body)
    }
}

#[cfg(test)]
mod tests {
    use oriel_span::SourceId;
    use oriel_symbols::{Category, SymbolSearch};
    use oriel_tree::{
        node::{
            AggregateDecl, AggregateKind, Capture, Expr, FunctionDecl, MethodDecl, Stmt,
            VariableDecl,
        },
        prelude::{Id, Tree},
    };

    use crate::test::{UnitBuilder, error_codes, find_type, resolve_one};

    #[test]
    fn locals_take_their_initializer_type() {
        let mut unit = UnitBuilder::new(0, "demo");
        let one = unit.integer("1");
        let x = unit.local("x", one);
        let text = unit.string("\"hi\"");
        let y = unit.local("y", text);
        let x_ref = unit.expr(Expr::ident("x"));
        let two = unit.integer("2");
        let sum = unit.expr(Expr::binary("+", x_ref, two));
        let z = unit.local("z", sum);
        let body = unit.block(vec![x, y, z]);
        unit.function(FunctionDecl::new("main").with_body(body));
        let output = resolve_one(unit.finish());

        assert!(output.is_complete(), "{:?}", error_codes(&output));
        let core = *output.table.core().unwrap();
        let records = &output.units[0].records;
        let type_of = |stmt: Stmt| {
            let Stmt::Variable(variable) = stmt else {
                unreachable!()
            };
            output.table.symbol(records.symbols.copied(variable).unwrap()).ty
        };

        assert_eq!(type_of(x), Some(core.integer));
        assert_eq!(type_of(y), Some(core.string));
        assert_eq!(type_of(z), Some(core.integer));
        assert_eq!(records.types.copied(sum), Some(core.integer));
        assert!(records.targets.contains(sum));
    }

    #[test]
    fn unary_operators_and_declared_initializers() {
        let mut unit = UnitBuilder::new(0, "demo");
        let five = unit.integer("5");
        let n = unit.local("n", five);
        let n_ref = unit.expr(Expr::ident("n"));
        let negated = unit.expr(Expr::unary("-", n_ref));
        let m = unit.local("m", negated);
        let float = unit.ty("Float");
        let one = unit.integer("1");
        let ratio = unit.var(VariableDecl::typed("ratio", float).with_init(one));
        let body = unit.block(vec![n, m, Stmt::Variable(ratio)]);
        unit.function(FunctionDecl::new("main").with_body(body));
        let output = resolve_one(unit.finish());

        assert!(output.is_complete(), "{:?}", error_codes(&output));
        let core = *output.table.core().unwrap();
        let records = &output.units[0].records;
        let Stmt::Variable(m) = m else {
            unreachable!()
        };

        let minus = records.targets.copied(negated).unwrap();
        assert!(output.table.symbol(minus).is_operator());
        assert_eq!(output.table.param_types(minus), Some(Vec::new()));
        assert_eq!(output.table.symbol(records.symbols.copied(m).unwrap()).ty, Some(core.integer));

        // The declared type stands, the initializer keeps its own.
        let ratio = records.symbols.copied(ratio).unwrap();
        assert_eq!(output.table.symbol(ratio).ty, Some(core.float));
        assert_eq!(records.types.copied(one), Some(core.integer));
    }

    #[test]
    fn override_wins_over_inherited() {
        let mut unit = UnitBuilder::new(0, "demo");
        let animal_speak = unit.signature(MethodDecl::method("speak"), &[], Some("String"));
        unit.aggregate(
            AggregateDecl::class("Animal")
                .open()
                .with_methods(vec![animal_speak]),
        );
        let dog_speak = unit.signature(MethodDecl::method("speak"), &[], Some("String"));
        let animal = unit.ty("Animal");
        unit.aggregate(
            AggregateDecl::class("Dog")
                .with_extends(animal)
                .with_methods(vec![dog_speak]),
        );

        let construct = unit.expr(Expr::call("Dog", Vec::new()));
        let dog = unit.local("dog", construct);
        let dog_ref = unit.expr(Expr::ident("dog"));
        let call = unit.expr(Expr::method_call(dog_ref, "speak", Vec::new()));
        let said = unit.local("said", call);
        let body = unit.block(vec![dog, said]);
        unit.function(FunctionDecl::new("main").with_body(body));
        let output = resolve_one(unit.finish());

        assert!(output.is_complete(), "{:?}", error_codes(&output));
        let table = &output.table;
        let records = &output.units[0].records;
        let dog_type = find_type(table, "demo", "Dog");
        let dog_speak = records.symbols.copied(dog_speak).unwrap();
        let animal_speak = records.symbols.copied(animal_speak).unwrap();

        assert_eq!(records.types.copied(construct), Some(dog_type));
        assert_eq!(records.targets.copied(call), Some(dog_speak));
        assert_eq!(records.types.copied(call), Some(table.core().unwrap().string));

        let effective = table.all_effective_methods(dog_type);
        assert!(effective.contains(&dog_speak));
        assert!(!effective.contains(&animal_speak));
    }

    #[test]
    fn constrained_type_operators_resolve() {
        let mut unit = UnitBuilder::new(0, "demo");
        let base = unit.ty("Integer");
        let mut age = AggregateDecl::new(AggregateKind::Constrained, "Age");
        age.constrains = Some(base);
        unit.aggregate(age);

        let one = unit.integer("1");
        let construct = unit.expr(Expr::call("Age", vec![one]));
        let a = unit.local("a", construct);
        let lhs = unit.expr(Expr::ident("a"));
        let rhs = unit.expr(Expr::ident("a"));
        let same = unit.expr(Expr::binary("<", lhs, rhs));
        let lhs = unit.expr(Expr::ident("a"));
        let two = unit.integer("2");
        let mixed = unit.expr(Expr::binary("<", lhs, two));
        let s = unit.local("same", same);
        let m = unit.local("mixed", mixed);
        let body = unit.block(vec![a, s, m]);
        unit.function(FunctionDecl::new("main").with_body(body));
        let output = resolve_one(unit.finish());

        assert!(output.is_complete(), "{:?}", error_codes(&output));
        let table = &output.table;
        let core = *table.core().unwrap();
        let age = find_type(table, "demo", "Age");
        let records = &output.units[0].records;

        assert_eq!(
            records.targets.copied(construct),
            table.find_method(age, "Age", &[core.integer])
        );
        assert_eq!(records.types.copied(construct), Some(age));
        assert_eq!(records.targets.copied(same), table.find_method(age, "<", &[age]));
        assert_eq!(
            records.targets.copied(mixed),
            table.find_method(age, "<", &[core.integer])
        );
        assert_eq!(records.types.copied(same), Some(core.boolean));
    }

    #[test]
    fn instance_constructor_call() {
        let mut unit = UnitBuilder::new(0, "demo");
        unit.aggregate(AggregateDecl::class("Box").with_type_params(["T"]));
        let arg = unit.ty("Integer");
        let construct = unit.expr(Expr::Call {
            callee: "Box".into(),
            type_args: vec![arg],
            args: Vec::new(),
        });
        let boxed = unit.local("boxed", construct);
        let body = unit.block(vec![boxed]);
        unit.function(FunctionDecl::new("main").with_body(body));
        let output = resolve_one(unit.finish());

        assert!(output.is_complete(), "{:?}", error_codes(&output));
        let records = &output.units[0].records;
        let instance = records.types.copied(construct).unwrap();
        assert_eq!(output.table.symbol(instance).name, "Box of (Integer)");
        assert!(records.targets.contains(construct));
    }

    #[test]
    fn template_constructor_needs_arguments() {
        let mut unit = UnitBuilder::new(0, "demo");
        unit.aggregate(AggregateDecl::class("Box").with_type_params(["T"]));
        let construct = unit.expr(Expr::call("Box", Vec::new()));
        let boxed = unit.local("boxed", construct);
        let body = unit.block(vec![boxed]);
        unit.function(FunctionDecl::new("main").with_body(body));
        let output = resolve_one(unit.finish());

        assert!(!output.is_complete());
        assert_eq!(error_codes(&output), ["signature-violation"]);
        let records = &output.units[0].records;
        assert!(!records.targets.contains(construct));
        assert!(!records.types.contains(construct));
    }

    #[test]
    fn equally_good_overloads_are_ambiguous() {
        let mut unit = UnitBuilder::new(0, "demo");
        let first = unit.signature(
            MethodDecl::method("mix"),
            &[("a", "Integer"), ("b", "Float")],
            None,
        );
        let second = unit.signature(
            MethodDecl::method("mix"),
            &[("a", "Float"), ("b", "Integer")],
            None,
        );
        let one = unit.integer("1");
        let two = unit.integer("2");
        let call = unit.expr(Expr::call("mix", vec![one, two]));
        let body = unit.block(vec![Stmt::Expr(call)]);
        let caller = unit.method(MethodDecl::method("run").with_body(body));
        unit.aggregate(AggregateDecl::class("Mixer").with_methods(vec![first, second, caller]));
        let output = resolve_one(unit.finish());

        assert_eq!(error_codes(&output), ["ambiguous-reference"]);
        assert!(!output.units[0].records.targets.contains(call));
    }

    #[test]
    fn unknown_method_is_unresolved() {
        let mut unit = UnitBuilder::new(0, "demo");
        let one = unit.integer("1");
        let call = unit.expr(Expr::method_call(one, "fly", Vec::new()));
        let body = unit.block(vec![Stmt::Expr(call)]);
        unit.function(FunctionDecl::new("main").with_body(body));
        let output = resolve_one(unit.finish());

        assert_eq!(error_codes(&output), ["unresolved-reference"]);
    }

    #[test]
    fn capture_only_sees_what_it_captured() {
        let mut unit = UnitBuilder::new(0, "demo");
        let one = unit.integer("1");
        let outer = unit.local("outer", one);
        let outer_ref = unit.expr(Expr::ident("outer"));
        let captured = unit.var(VariableDecl::inferred("seen", outer_ref));
        let seen_ref = unit.expr(Expr::ident("seen"));
        let copy = unit.local("copy", seen_ref);
        let hidden = unit.expr(Expr::ident("outer"));
        let capture_body = unit.block(vec![copy, Stmt::Expr(hidden)]);
        let capture = unit.insert(Capture {
            captures: vec![captured],
            body: capture_body,
        });
        let closure = unit.expr(Expr::Capture(capture));
        let f = unit.local("f", closure);
        let body = unit.block(vec![outer, f]);
        unit.function(FunctionDecl::new("main").with_body(body));
        let output = resolve_one(unit.finish());

        assert_eq!(error_codes(&output), ["unresolved-reference"]);
        let records = &output.units[0].records;
        let core = *output.table.core().unwrap();
        assert_eq!(records.types.copied(seen_ref), Some(core.integer));
        assert_eq!(records.types.copied(closure), Some(core.any));
        assert!(!records.targets.contains(hidden));
    }

    /// `DOUBLE := LIMIT` in one unit, `LIMIT := 10` in another.
    fn limit_units() -> (Tree, Tree, Id<VariableDecl>) {
        let mut first = UnitBuilder::new(0, "demo");
        let limit_ref = first.expr(Expr::ident("LIMIT"));
        let double = first.constant(VariableDecl::inferred("DOUBLE", limit_ref));
        let mut second = UnitBuilder::new(1, "demo");
        let ten = second.integer("10");
        second.constant(VariableDecl::inferred("LIMIT", ten));
        (first.finish(), second.finish(), double)
    }

    #[test]
    fn constants_are_inferred_across_units() {
        let (user, provider, double) = limit_units();
        let used_first = crate::test::resolve_all([user, provider]);
        let (user, provider, _) = limit_units();
        let provided_first = crate::test::resolve_all([provider, user]);

        for output in [used_first, provided_first] {
            assert!(output.is_complete(), "{:?}", error_codes(&output));
            let table = &output.table;
            let module = table.module_scope("demo").unwrap();
            let found = table
                .resolve(module, &SymbolSearch::new("DOUBLE", Category::Variable))
                .unwrap();
            assert_eq!(table.symbol(found).ty, Some(table.core().unwrap().integer));
            let user = &output.units[&SourceId::new(0)];
            assert_eq!(user.records.symbols.copied(double), Some(found));
        }
    }

    #[test]
    fn constants_may_use_later_constants() {
        let mut unit = UnitBuilder::new(0, "demo");
        let b_ref = unit.expr(Expr::ident("B"));
        let a = unit.constant(VariableDecl::inferred("A", b_ref));
        let c_ref = unit.expr(Expr::ident("C"));
        let b = unit.constant(VariableDecl::inferred("B", c_ref));
        let text = unit.string("\"late\"");
        unit.constant(VariableDecl::inferred("C", text));
        let output = resolve_one(unit.finish());

        assert!(output.is_complete(), "{:?}", error_codes(&output));
        let table = &output.table;
        let records = &output.units[0].records;
        let string = table.core().unwrap().string;
        for constant in [a, b] {
            let symbol = records.symbols.copied(constant).unwrap();
            assert_eq!(table.symbol(symbol).ty, Some(string));
        }
        assert_eq!(records.types.copied(b_ref), Some(string));
    }

    #[test]
    fn circular_constants_are_reported() {
        let mut unit = UnitBuilder::new(0, "demo");
        let b_ref = unit.expr(Expr::ident("B"));
        unit.constant(VariableDecl::inferred("A", b_ref));
        let a_ref = unit.expr(Expr::ident("A"));
        unit.constant(VariableDecl::inferred("B", a_ref));
        let c_ref = unit.expr(Expr::ident("A"));
        unit.constant(VariableDecl::inferred("C", c_ref));
        let output = resolve_one(unit.finish());

        assert!(!output.is_complete());
        let mut messages: Vec<_> = output.units[0]
            .report
            .errors()
            .map(|diagnostic| diagnostic.message.as_str())
            .collect();
        messages.sort_unstable();
        assert_eq!(
            messages,
            [
                "the type of `A` depends on itself",
                "the type of `B` depends on itself",
            ]
        );
    }
}
