use derive_more::From;

use crate::id::Id;

use super::{Name, TypeExpr, VariableDecl};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Integer,
    Float,
    String,
    Character,
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub kind: LiteralKind,
    pub text: Name,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    /// A variable, constant or enumeration value, possibly qualified.
    Ident(Name),
    /// `callee(args)`: a constructor when `callee` names a type, otherwise a
    /// function or a method of the enclosing aggregate. `type_args` makes it a
    /// parameterization site, `List of Integer()`.
    Call {
        callee: Name,
        type_args: Vec<Id<TypeExpr>>,
        args: Vec<Id<Expr>>,
    },
    MethodCall {
        target: Id<Expr>,
        name: Name,
        args: Vec<Id<Expr>>,
    },
    Binary {
        op: Name,
        lhs: Id<Expr>,
        rhs: Id<Expr>,
    },
    Unary {
        op: Name,
        operand: Id<Expr>,
    },
    Capture(Id<Capture>),
}

impl Expr {
    pub fn literal(kind: LiteralKind, text: impl Into<Name>) -> Self {
        Self::Literal(Literal {
            kind,
            text: text.into(),
        })
    }

    pub fn ident(name: impl Into<Name>) -> Self {
        Self::Ident(name.into())
    }

    pub fn call(callee: impl Into<Name>, args: Vec<Id<Expr>>) -> Self {
        Self::Call {
            callee: callee.into(),
            type_args: Vec::new(),
            args,
        }
    }

    pub fn method_call(target: Id<Expr>, name: impl Into<Name>, args: Vec<Id<Expr>>) -> Self {
        Self::MethodCall {
            target,
            name: name.into(),
            args,
        }
    }

    pub fn binary(op: impl Into<Name>, lhs: Id<Expr>, rhs: Id<Expr>) -> Self {
        Self::Binary {
            op: op.into(),
            lhs,
            rhs,
        }
    }

    pub fn unary(op: impl Into<Name>, operand: Id<Expr>) -> Self {
        Self::Unary {
            op: op.into(),
            operand,
        }
    }
}

/// A closure: the captured variables are initialised from the defining
/// scope, the body only sees what was captured.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub captures: Vec<Id<VariableDecl>>,
    pub body: Id<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, From)]
pub enum Stmt {
    Variable(Id<VariableDecl>),
    Expr(Id<Expr>),
    Block(Id<Block>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }
}
