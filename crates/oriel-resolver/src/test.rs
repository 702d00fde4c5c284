use ecow::EcoString;
use oriel_span::SourceId;
use oriel_symbols::{Category, SymbolId, SymbolSearch, SymbolTable};
use oriel_tree::{
    node::{
        AggregateDecl, Block, Decl, Expr, FunctionDecl, LiteralKind, MethodDecl, Module, Stmt,
        TypeExpr, VariableDecl,
    },
    prelude::*,
};

use crate::{
    coordinator::{ResolveOutput, resolve},
    options::ResolveOptions,
    workspace::Workspace,
};

/// Builds the tree of one mocked source file, a line per node.
pub struct UnitBuilder {
    builder: TreeBuilder,
    namespace: EcoString,
    decls: Vec<Decl>,
    line: u32,
}

impl UnitBuilder {
    pub fn new(source: u32, namespace: &str) -> Self {
        Self {
            builder: TreeBuilder::new(SourceId::new(source)),
            namespace: namespace.into(),
            decls: Vec::new(),
            line: 0,
        }
    }

    pub fn insert<T>(&mut self, node: T) -> Id<T>
    where
        Node: From<T>,
    {
        self.line += 1;
        self.builder.at(self.line, 1).insert(node)
    }

    pub fn ty(&mut self, name: &str) -> Id<TypeExpr> {
        self.insert(TypeExpr::named(name))
    }

    pub fn ty_of(&mut self, name: &str, args: &[&str]) -> Id<TypeExpr> {
        let args = args.iter().map(|arg| self.ty(arg)).collect();
        self.insert(TypeExpr::parameterized(name, args))
    }

    pub fn typed(&mut self, name: &str, ty: &str) -> Id<VariableDecl> {
        let ty = self.ty(ty);
        self.insert(VariableDecl::typed(name, ty))
    }

    pub fn var(&mut self, decl: VariableDecl) -> Id<VariableDecl> {
        self.insert(decl)
    }

    pub fn expr(&mut self, expr: Expr) -> Id<Expr> {
        self.insert(expr)
    }

    pub fn integer(&mut self, text: &str) -> Id<Expr> {
        self.expr(Expr::literal(LiteralKind::Integer, text))
    }

    pub fn string(&mut self, text: &str) -> Id<Expr> {
        self.expr(Expr::literal(LiteralKind::String, text))
    }

    pub fn local(&mut self, name: &str, init: Id<Expr>) -> Stmt {
        Stmt::Variable(self.insert(VariableDecl::inferred(name, init)))
    }

    pub fn block(&mut self, stmts: Vec<Stmt>) -> Id<Block> {
        self.insert(Block::new(stmts))
    }

    pub fn method(&mut self, decl: MethodDecl) -> Id<MethodDecl> {
        self.insert(decl)
    }

    /// `name(params) returns rtn`, with `params` as `(name, type)` pairs.
    pub fn signature(
        &mut self,
        decl: MethodDecl,
        params: &[(&str, &str)],
        returning: Option<&str>,
    ) -> Id<MethodDecl> {
        let params = params.iter().map(|(name, ty)| self.typed(name, ty)).collect();
        let mut decl = decl.with_params(params);
        if let Some(ty) = returning {
            decl = decl.with_returning(self.typed("rtn", ty));
        }
        self.insert(decl)
    }

    pub fn aggregate(&mut self, decl: AggregateDecl) -> Id<AggregateDecl> {
        let id = self.insert(decl);
        self.decls.push(Decl::Aggregate(id));
        id
    }

    pub fn class(&mut self, name: &str) -> Id<AggregateDecl> {
        self.aggregate(AggregateDecl::class(name))
    }

    pub fn function(&mut self, decl: FunctionDecl) -> Id<FunctionDecl> {
        let id = self.insert(decl);
        self.decls.push(Decl::Function(id));
        id
    }

    pub fn constant(&mut self, decl: VariableDecl) -> Id<VariableDecl> {
        let id = self.insert(decl.constant());
        self.decls.push(Decl::Constant(id));
        id
    }

    pub fn finish(mut self) -> Tree {
        let module = Module {
            namespace: self.namespace.clone(),
            decls: std::mem::take(&mut self.decls),
        };
        let root = self.insert(module);
        self.builder.finish(root)
    }
}

pub fn resolve_all(trees: impl IntoIterator<Item = Tree>) -> ResolveOutput {
    let workspace: Workspace = trees.into_iter().collect();
    resolve(&workspace, ResolveOptions::default().with_max_workers(4)).unwrap()
}

pub fn resolve_one(tree: Tree) -> ResolveOutput {
    resolve_all([tree])
}

/// Looks up the qualified type `ns::name`.
pub fn find_type(table: &SymbolTable, namespace: &str, name: &str) -> SymbolId {
    let module = table.module_scope(namespace).unwrap();
    table
        .resolve_in_this_scope_only(module, &SymbolSearch::new(name, Category::Type))
        .unwrap()
}

pub fn error_codes(output: &ResolveOutput) -> Vec<&'static str> {
    output
        .units
        .values()
        .flat_map(|unit| unit.report.errors())
        .filter_map(|diagnostic| diagnostic.code)
        .collect()
}
