use derive_more::From;

use crate::id::Id;

use super::{Block, Expr, Name, TypeExpr};

/// One source file: a module namespace and its top-level declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// Dotted namespace, `com.example.shapes`.
    pub namespace: Name,
    pub decls: Vec<Decl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, From)]
pub enum Decl {
    Aggregate(Id<AggregateDecl>),
    Function(Id<FunctionDecl>),
    Constant(Id<VariableDecl>),
}

/// Keyword a type declaration was introduced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    Class,
    Trait,
    Record,
    Component,
    Enumeration,
    /// `type Age as Integer`
    Constrained,
    Service,
    Program,
    Application,
    ServiceApplication,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateModifiers {
    pub open: bool,
    pub is_abstract: bool,
    pub injectable: bool,
    pub dispatcher: bool,
    /// Type names accepted and produced by pipeline operators.
    pub pipe_sink: Option<Name>,
    pub pipe_source: Option<Name>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateDecl {
    pub name: Name,
    pub kind: AggregateKind,
    pub type_params: Vec<Name>,
    pub extends: Option<Id<TypeExpr>>,
    pub traits: Vec<Id<TypeExpr>>,
    /// Base of a constrained type.
    pub constrains: Option<Id<TypeExpr>>,
    pub modifiers: AggregateModifiers,
    pub fields: Vec<Id<VariableDecl>>,
    pub methods: Vec<Id<MethodDecl>>,
    /// Values of an enumeration.
    pub values: Vec<Name>,
}

impl AggregateDecl {
    pub fn new(kind: AggregateKind, name: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            kind,
            type_params: Vec::new(),
            extends: None,
            traits: Vec::new(),
            constrains: None,
            modifiers: AggregateModifiers::default(),
            fields: Vec::new(),
            methods: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn class(name: impl Into<Name>) -> Self {
        Self::new(AggregateKind::Class, name)
    }

    pub fn with_type_params<N: Into<Name>>(mut self, params: impl IntoIterator<Item = N>) -> Self {
        self.type_params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_extends(mut self, ty: Id<TypeExpr>) -> Self {
        self.extends = Some(ty);
        self
    }

    pub fn with_traits(mut self, traits: Vec<Id<TypeExpr>>) -> Self {
        self.traits = traits;
        self
    }

    pub fn with_fields(mut self, fields: Vec<Id<VariableDecl>>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_methods(mut self, methods: Vec<Id<MethodDecl>>) -> Self {
        self.methods = methods;
        self
    }

    pub fn open(mut self) -> Self {
        self.modifiers.open = true;
        self
    }

    pub fn as_abstract(mut self) -> Self {
        self.modifiers.is_abstract = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Method,
    Operator,
    Constructor,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MethodModifiers {
    pub pure: bool,
    pub is_abstract: bool,
    pub is_override: bool,
    pub dispatcher: bool,
}

/// Method, operator or constructor of an aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    /// Operator symbol for operators, the type name for constructors.
    pub name: Name,
    pub kind: MethodKind,
    pub modifiers: MethodModifiers,
    pub params: Vec<Id<VariableDecl>>,
    pub returning: Option<Id<VariableDecl>>,
    pub body: Option<Id<Block>>,
}

impl MethodDecl {
    pub fn new(kind: MethodKind, name: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            kind,
            modifiers: MethodModifiers::default(),
            params: Vec::new(),
            returning: None,
            body: None,
        }
    }

    pub fn method(name: impl Into<Name>) -> Self {
        Self::new(MethodKind::Method, name)
    }

    pub fn operator(op: impl Into<Name>) -> Self {
        Self::new(MethodKind::Operator, op)
    }

    pub fn constructor(name: impl Into<Name>) -> Self {
        Self::new(MethodKind::Constructor, name)
    }

    pub fn with_params(mut self, params: Vec<Id<VariableDecl>>) -> Self {
        self.params = params;
        self
    }

    pub fn with_returning(mut self, returning: Id<VariableDecl>) -> Self {
        self.returning = Some(returning);
        self
    }

    pub fn with_body(mut self, body: Id<Block>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn pure(mut self) -> Self {
        self.modifiers.pure = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Name,
    pub type_params: Vec<Name>,
    pub modifiers: MethodModifiers,
    pub params: Vec<Id<VariableDecl>>,
    pub returning: Option<Id<VariableDecl>>,
    pub body: Option<Id<Block>>,
}

impl FunctionDecl {
    pub fn new(name: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            type_params: Vec::new(),
            modifiers: MethodModifiers::default(),
            params: Vec::new(),
            returning: None,
            body: None,
        }
    }

    pub fn with_type_params<N: Into<Name>>(mut self, params: impl IntoIterator<Item = N>) -> Self {
        self.type_params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_params(mut self, params: Vec<Id<VariableDecl>>) -> Self {
        self.params = params;
        self
    }

    pub fn with_returning(mut self, returning: Id<VariableDecl>) -> Self {
        self.returning = Some(returning);
        self
    }

    pub fn with_body(mut self, body: Id<Block>) -> Self {
        self.body = Some(body);
        self
    }
}

/// Which part of a web request a service parameter is taken from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WebBinding {
    Path(Name),
    Query(Name),
    Header(Name),
    Content,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableModifiers {
    pub constant: bool,
    pub nullable: bool,
    pub injected: bool,
    pub binding: Option<WebBinding>,
}

/// Variable, field, parameter, returning value or constant.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub name: Name,
    pub ty: Option<Id<TypeExpr>>,
    pub init: Option<Id<Expr>>,
    pub modifiers: VariableModifiers,
}

impl VariableDecl {
    pub fn new(name: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            ty: None,
            init: None,
            modifiers: VariableModifiers::default(),
        }
    }

    pub fn typed(name: impl Into<Name>, ty: Id<TypeExpr>) -> Self {
        Self {
            ty: Some(ty),
            ..Self::new(name)
        }
    }

    pub fn inferred(name: impl Into<Name>, init: Id<Expr>) -> Self {
        Self {
            init: Some(init),
            ..Self::new(name)
        }
    }

    pub fn with_init(mut self, init: Id<Expr>) -> Self {
        self.init = Some(init);
        self
    }

    pub fn constant(mut self) -> Self {
        self.modifiers.constant = true;
        self
    }
}
