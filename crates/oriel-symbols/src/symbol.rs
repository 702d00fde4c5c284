use ecow::EcoString;
use oriel_span::Loc;
use oriel_utils::{
    convert::{TryAsMut, TryAsRef},
    define_id, impl_try_as,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{rebase::Rebase, scope::ScopeId};

define_id!(SymbolId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Type,
    Method,
    Function,
    Variable,
    Control,
    /// Only meaningful in searches, matches every non-method category.
    Any,
}

impl Category {
    pub const SEARCHABLE: [Category; 4] = [
        Category::Type,
        Category::Function,
        Category::Variable,
        Category::Control,
    ];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Type => "type",
            Self::Method => "method",
            Self::Function => "function",
            Self::Variable => "variable",
            Self::Control => "control",
            Self::Any => "symbol",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Genus {
    Class,
    ClassTrait,
    ClassConstrained,
    ClassEnumeration,
    Record,
    Component,
    Function,
    FunctionTrait,
    Service,
    Program,
    GeneralApplication,
    ServiceApplication,
    Any,
}

impl Genus {
    /// Genera a class-like super may come from, keyed by the genus of the
    /// extending aggregate.
    pub fn can_extend(self, parent: Genus) -> bool {
        match self {
            Genus::Class => parent == Genus::Class,
            Genus::ClassTrait => parent == Genus::ClassTrait,
            Genus::Record => parent == Genus::Record,
            Genus::Component => parent == Genus::Component,
            Genus::Function => parent == Genus::Function,
            Genus::Service => parent == Genus::Service,
            _ => false,
        }
    }
}

impl fmt::Display for Genus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Class => "class",
            Self::ClassTrait => "trait",
            Self::ClassConstrained => "constrained type",
            Self::ClassEnumeration => "enumeration",
            Self::Record => "record",
            Self::Component => "component",
            Self::Function => "function",
            Self::FunctionTrait => "abstract function",
            Self::Service => "service",
            Self::Program => "program",
            Self::GeneralApplication => "application",
            Self::ServiceApplication => "service application",
            Self::Any => "any",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SymbolFlags {
    pub mutable: bool,
    pub pure: bool,
    pub nullable: bool,
    pub injection_expected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableRole {
    Local,
    Field,
    Parameter,
    Returning,
    Constant,
    Captured,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub role: VariableRole,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MethodFlags {
    pub operator: bool,
    pub constructor: bool,
    /// Made up by the compiler rather than declared.
    pub synthetic: bool,
    pub is_abstract: bool,
    pub is_override: bool,
    pub dispatcher: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    /// Holds the parameters and the returning variable.
    pub scope: ScopeId,
    pub owner: SymbolId,
    pub params: Vec<SymbolId>,
    pub returning: Option<SymbolId>,
    pub flags: MethodFlags,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub scope: ScopeId,
    pub params: Vec<SymbolId>,
    pub returning: Option<SymbolId>,
    pub is_abstract: bool,
    pub generic: Generic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub scope: ScopeId,
}

/// Generic shape of a type or function.
///
/// A template has placeholder `params` and no `template`; a parameterized
/// instance has its bound arguments in `params` and points at its template;
/// a placeholder is `conceptual` and points at the template it belongs to
/// through `parent`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generic {
    pub params: Vec<SymbolId>,
    pub template: Option<SymbolId>,
    pub conceptual: bool,
    pub parent: Option<SymbolId>,
}

impl Generic {
    pub fn is_template(&self) -> bool {
        !self.conceptual && self.template.is_none() && !self.params.is_empty()
    }

    pub fn is_instance(&self) -> bool {
        self.template.is_some()
    }
}

/// Class, record, trait, component and the other type declarations. The
/// aggregate is a symbol whose members live in `scope`.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub scope: ScopeId,
    pub super_aggregate: Option<SymbolId>,
    pub sub_aggregates: Vec<SymbolId>,
    pub traits: Vec<SymbolId>,
    pub open: bool,
    pub is_abstract: bool,
    pub injectable: bool,
    pub dispatcher: bool,
    pub pipe_sink: Option<EcoString>,
    pub pipe_source: Option<EcoString>,
    /// Base type of a constrained type.
    pub constrains: Option<SymbolId>,
    pub generic: Generic,
}

impl Aggregate {
    pub fn new(scope: ScopeId) -> Self {
        Self {
            scope,
            super_aggregate: None,
            sub_aggregates: Vec::new(),
            traits: Vec::new(),
            open: false,
            is_abstract: false,
            injectable: false,
            dispatcher: false,
            pipe_sink: None,
            pipe_source: None,
            constrains: None,
            generic: Generic::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    Variable(Variable),
    Method(Method),
    Function(Function),
    Control(Control),
    Type(Aggregate),
}

impl_try_as!(
    SymbolKind,
    Variable(Variable),
    Method(Method),
    Function(Function),
    Control(Control),
    Type(Aggregate)
);

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: EcoString,
    pub genus: Genus,
    /// For types this is the symbol itself, see `SymbolTable::type_of`.
    pub ty: Option<SymbolId>,
    pub flags: SymbolFlags,
    /// Namespace of the declaring module, empty for compiler internals.
    pub module: EcoString,
    pub loc: Loc,
    pub kind: SymbolKind,
}

impl Symbol {
    /// A mutable local variable of genus class, the default shape of a symbol.
    pub fn new(name: impl Into<EcoString>, loc: Loc) -> Self {
        let name = name.into();
        debug_assert!(!name.is_empty(), "symbols must be named");

        Self {
            name,
            genus: Genus::Class,
            ty: None,
            flags: SymbolFlags {
                mutable: true,
                ..SymbolFlags::default()
            },
            module: EcoString::new(),
            loc,
            kind: SymbolKind::Variable(Variable {
                role: VariableRole::Local,
            }),
        }
    }

    pub fn variable(name: impl Into<EcoString>, role: VariableRole, loc: Loc) -> Self {
        let mut symbol = Self::new(name, loc);
        symbol.flags.mutable = !matches!(role, VariableRole::Constant | VariableRole::Captured);
        symbol.kind = SymbolKind::Variable(Variable { role });
        symbol
    }

    pub fn aggregate(name: impl Into<EcoString>, genus: Genus, scope: ScopeId, loc: Loc) -> Self {
        Self {
            genus,
            flags: SymbolFlags::default(),
            kind: SymbolKind::Type(Aggregate::new(scope)),
            ..Self::new(name, loc)
        }
    }

    pub fn method(name: impl Into<EcoString>, method: Method, loc: Loc) -> Self {
        Self {
            flags: SymbolFlags::default(),
            kind: SymbolKind::Method(method),
            ..Self::new(name, loc)
        }
    }

    pub fn function(name: impl Into<EcoString>, function: Function, loc: Loc) -> Self {
        Self {
            genus: Genus::Function,
            flags: SymbolFlags::default(),
            kind: SymbolKind::Function(function),
            ..Self::new(name, loc)
        }
    }

    pub fn with_module(mut self, module: impl Into<EcoString>) -> Self {
        self.module = module.into();
        self
    }

    pub fn with_type(mut self, ty: SymbolId) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn category(&self) -> Category {
        match self.kind {
            SymbolKind::Variable(_) => Category::Variable,
            SymbolKind::Method(_) => Category::Method,
            SymbolKind::Function(_) => Category::Function,
            SymbolKind::Control(_) => Category::Control,
            SymbolKind::Type(_) => Category::Type,
        }
    }

    pub fn as_aggregate(&self) -> Option<&Aggregate> {
        self.kind.try_as_ref()
    }

    pub fn as_aggregate_mut(&mut self) -> Option<&mut Aggregate> {
        self.kind.try_as_mut()
    }

    pub fn as_method(&self) -> Option<&Method> {
        self.kind.try_as_ref()
    }

    pub fn as_method_mut(&mut self) -> Option<&mut Method> {
        self.kind.try_as_mut()
    }

    pub fn as_function(&self) -> Option<&Function> {
        self.kind.try_as_ref()
    }

    pub fn as_function_mut(&mut self) -> Option<&mut Function> {
        self.kind.try_as_mut()
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        self.kind.try_as_ref()
    }

    pub fn generic(&self) -> Option<&Generic> {
        match &self.kind {
            SymbolKind::Type(aggregate) => Some(&aggregate.generic),
            SymbolKind::Function(function) => Some(&function.generic),
            _ => None,
        }
    }

    pub fn generic_mut(&mut self) -> Option<&mut Generic> {
        match &mut self.kind {
            SymbolKind::Type(aggregate) => Some(&mut aggregate.generic),
            SymbolKind::Function(function) => Some(&mut function.generic),
            _ => None,
        }
    }

    /// The scope this symbol owns, if it introduces one.
    pub fn owned_scope(&self) -> Option<ScopeId> {
        match &self.kind {
            SymbolKind::Variable(_) => None,
            SymbolKind::Method(method) => Some(method.scope),
            SymbolKind::Function(function) => Some(function.scope),
            SymbolKind::Control(control) => Some(control.scope),
            SymbolKind::Type(aggregate) => Some(aggregate.scope),
        }
    }

    /// Parameters and returning variable of a method or function.
    pub fn signature(&self) -> Option<(&[SymbolId], Option<SymbolId>)> {
        match &self.kind {
            SymbolKind::Method(method) => Some((&method.params, method.returning)),
            SymbolKind::Function(function) => Some((&function.params, function.returning)),
            _ => None,
        }
    }

    pub fn is_operator(&self) -> bool {
        self.as_method().is_some_and(|m| m.flags.operator)
    }

    pub fn is_constructor(&self) -> bool {
        self.as_method().is_some_and(|m| m.flags.constructor)
    }

    pub fn is_abstract(&self) -> bool {
        match &self.kind {
            SymbolKind::Method(method) => method.flags.is_abstract,
            SymbolKind::Function(function) => function.is_abstract,
            SymbolKind::Type(aggregate) => aggregate.is_abstract,
            _ => false,
        }
    }

    pub fn is_conceptual(&self) -> bool {
        self.generic().is_some_and(|g| g.conceptual)
    }

    pub(crate) fn rebase(&mut self, rebase: &Rebase) {
        self.ty = self.ty.map(|ty| rebase.symbol(ty));

        let rebase_generic = |generic: &mut Generic| {
            rebase.symbols(&mut generic.params);
            generic.template = generic.template.map(|t| rebase.symbol(t));
            generic.parent = generic.parent.map(|p| rebase.symbol(p));
        };

        match &mut self.kind {
            SymbolKind::Variable(_) => {}
            SymbolKind::Method(method) => {
                method.scope = rebase.scope(method.scope);
                method.owner = rebase.symbol(method.owner);
                rebase.symbols(&mut method.params);
                method.returning = method.returning.map(|r| rebase.symbol(r));
            }
            SymbolKind::Function(function) => {
                function.scope = rebase.scope(function.scope);
                rebase.symbols(&mut function.params);
                function.returning = function.returning.map(|r| rebase.symbol(r));
                rebase_generic(&mut function.generic);
            }
            SymbolKind::Control(control) => control.scope = rebase.scope(control.scope),
            SymbolKind::Type(aggregate) => {
                aggregate.scope = rebase.scope(aggregate.scope);
                aggregate.super_aggregate = aggregate.super_aggregate.map(|s| rebase.symbol(s));
                rebase.symbols(&mut aggregate.sub_aggregates);
                rebase.symbols(&mut aggregate.traits);
                aggregate.constrains = aggregate.constrains.map(|c| rebase.symbol(c));
                rebase_generic(&mut aggregate.generic);
            }
        }
    }
}
