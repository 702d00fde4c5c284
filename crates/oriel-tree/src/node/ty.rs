use crate::id::Id;

use super::Name;

/// A written type reference, `Integer` or `Dict of (String, List of Integer)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeExpr {
    /// Possibly qualified, `com.example::Widget`.
    pub name: Name,
    pub args: Vec<Id<TypeExpr>>,
}

impl TypeExpr {
    pub fn named(name: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn parameterized(name: impl Into<Name>, args: Vec<Id<TypeExpr>>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    pub fn is_parameterized(&self) -> bool {
        !self.args.is_empty()
    }
}
