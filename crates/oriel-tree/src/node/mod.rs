pub use decl::*;
pub use expr::*;
pub use ty::*;

mod decl;
mod expr;
mod ty;

use derive_more::From;
use oriel_utils::impl_try_as;

pub type Name = ecow::EcoString;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    Module,
    AggregateDecl,
    MethodDecl,
    FunctionDecl,
    VariableDecl,
    TypeExpr,
    Block,
    Capture,
    Expr,
}

#[derive(Debug, Clone, PartialEq, From)]
pub enum Node {
    Module(Module),
    AggregateDecl(AggregateDecl),
    MethodDecl(MethodDecl),
    FunctionDecl(FunctionDecl),
    VariableDecl(VariableDecl),
    TypeExpr(TypeExpr),
    Block(Block),
    Capture(Capture),
    Expr(Expr),
}

impl_try_as!(
    Node,
    Module(Module),
    AggregateDecl(AggregateDecl),
    MethodDecl(MethodDecl),
    FunctionDecl(FunctionDecl),
    VariableDecl(VariableDecl),
    TypeExpr(TypeExpr),
    Block(Block),
    Capture(Capture),
    Expr(Expr)
);

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Module(_) => NodeKind::Module,
            Self::AggregateDecl(_) => NodeKind::AggregateDecl,
            Self::MethodDecl(_) => NodeKind::MethodDecl,
            Self::FunctionDecl(_) => NodeKind::FunctionDecl,
            Self::VariableDecl(_) => NodeKind::VariableDecl,
            Self::TypeExpr(_) => NodeKind::TypeExpr,
            Self::Block(_) => NodeKind::Block,
            Self::Capture(_) => NodeKind::Capture,
            Self::Expr(_) => NodeKind::Expr,
        }
    }
}
