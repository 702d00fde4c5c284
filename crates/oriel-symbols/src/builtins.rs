use derive_more::Display;
use oriel_span::{Loc, SourceId};

use crate::{
    coerce::Coercions,
    error::CompilerError,
    symbol::{Genus, Symbol, SymbolId},
    table::{MethodSpec, SymbolTable},
};

/// Namespace of the module holding the core types.
pub const CORE_NAMESPACE: &str = "core";

/// Source the core declarations pretend to come from.
pub const BUILTIN_SOURCE: SourceId = SourceId::new(u32::MAX);

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CoreType {
    Any,
    Boolean,
    Integer,
    Float,
    String,
    Character,
    Json,
}

impl CoreType {
    pub const ALL: [CoreType; 7] = [
        Self::Any,
        Self::Boolean,
        Self::Integer,
        Self::Float,
        Self::String,
        Self::Character,
        Self::Json,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Any => "Any",
            Self::Boolean => "Boolean",
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::String => "String",
            Self::Character => "Character",
            Self::Json => "Json",
        }
    }
}

/// Ids of the core types in the table that bootstrapped them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreTypes {
    pub any: SymbolId,
    pub boolean: SymbolId,
    pub integer: SymbolId,
    pub float: SymbolId,
    pub string: SymbolId,
    pub character: SymbolId,
    pub json: SymbolId,
}

impl CoreTypes {
    pub fn get(&self, ty: CoreType) -> SymbolId {
        match ty {
            CoreType::Any => self.any,
            CoreType::Boolean => self.boolean,
            CoreType::Integer => self.integer,
            CoreType::Float => self.float,
            CoreType::String => self.string,
            CoreType::Character => self.character,
            CoreType::Json => self.json,
        }
    }

    pub fn kind_of(&self, id: SymbolId) -> Option<CoreType> {
        CoreType::ALL.into_iter().find(|&ty| self.get(ty) == id)
    }
}

#[derive(Debug, Clone, Copy)]
enum Operand {
    Own,
    Of(CoreType),
}

#[derive(Debug, Clone, Copy)]
struct Member {
    name: &'static str,
    args: &'static [Operand],
    returning: Option<Operand>,
    pure: bool,
}

const fn op(name: &'static str, args: &'static [Operand], returning: Operand) -> Member {
    Member {
        name,
        args,
        returning: Some(returning),
        pure: true,
    }
}

const fn impure(member: Member) -> Member {
    Member {
        pure: false,
        ..member
    }
}

use Operand::{Of, Own};

const SHARED: &[Member] = &[
    op("==", &[Own], Of(CoreType::Boolean)),
    op("<>", &[Own], Of(CoreType::Boolean)),
    op("$", &[], Of(CoreType::String)),
    op("?", &[], Of(CoreType::Boolean)),
];

const ORDERED: &[Member] = &[
    op("<", &[Own], Of(CoreType::Boolean)),
    op("<=", &[Own], Of(CoreType::Boolean)),
    op(">", &[Own], Of(CoreType::Boolean)),
    op(">=", &[Own], Of(CoreType::Boolean)),
    op("<=>", &[Own], Of(CoreType::Integer)),
];

const ARITHMETIC: &[Member] = &[
    op("+", &[Own], Own),
    op("-", &[Own], Own),
    op("*", &[Own], Own),
    op("/", &[Own], Own),
    op("abs", &[], Own),
    op("-", &[], Own),
];

const INTEGER: &[Member] = &[
    op("mod", &[Own], Own),
    op("rem", &[Own], Own),
    op("#?", &[], Own),
    impure(op("++", &[], Own)),
];

const FLOAT: &[Member] = &[op("^", &[Own], Own)];

const STRING: &[Member] = &[
    op("+", &[Own], Own),
    op("+", &[Of(CoreType::Character)], Own),
    op("length", &[], Of(CoreType::Integer)),
    op("contains", &[Own], Of(CoreType::Boolean)),
    op("empty", &[], Of(CoreType::Boolean)),
];

const BOOLEAN: &[Member] = &[
    op("and", &[Own], Own),
    op("or", &[Own], Own),
    op("xor", &[Own], Own),
    op("~", &[], Own),
];

fn members(ty: CoreType) -> Vec<&'static [Member]> {
    match ty {
        CoreType::Any | CoreType::Json => vec![SHARED],
        CoreType::Boolean => vec![SHARED, BOOLEAN],
        CoreType::Integer => vec![SHARED, ORDERED, ARITHMETIC, INTEGER],
        CoreType::Float => vec![SHARED, ORDERED, ARITHMETIC, FLOAT],
        CoreType::String => vec![SHARED, ORDERED, STRING],
        CoreType::Character => vec![SHARED, ORDERED],
    }
}

impl SymbolTable {
    /// A table holding the core module: every [`CoreType`] with its
    /// constructors and operators, and the core coercions.
    pub fn with_core() -> Result<Self, CompilerError> {
        let mut table = Self::new();
        table.coercions = Coercions::core();

        let module = table.register_module(CORE_NAMESPACE);
        let loc = Loc::synthetic(BUILTIN_SOURCE);

        let mut ids = [SymbolId::new(0); CoreType::ALL.len()];
        for (slot, ty) in ids.iter_mut().zip(CoreType::ALL) {
            let genus = match ty {
                CoreType::Any => Genus::Any,
                _ => Genus::Class,
            };
            let symbol =
                Symbol::aggregate(ty.name(), genus, module, loc).with_module(CORE_NAMESPACE);
            let id = table.new_aggregate(symbol, module)?;
            if ty == CoreType::Any
                && let Some(any) = table.aggregate_mut(id)
            {
                any.open = true;
                any.is_abstract = true;
            }
            table.define(module, id)?;
            *slot = id;
        }

        let [any, boolean, integer, float, string, character, json] = ids;
        let core = CoreTypes {
            any,
            boolean,
            integer,
            float,
            string,
            character,
            json,
        };
        table.core = Some(core);

        for ty in CoreType::ALL {
            table.add_core_members(&core, ty, loc)?;
        }
        Ok(table)
    }

    fn add_core_members(
        &mut self,
        core: &CoreTypes,
        ty: CoreType,
        loc: Loc,
    ) -> Result<(), CompilerError> {
        let id = core.get(ty);
        let resolve = |operand: Operand| match operand {
            Own => id,
            Of(other) => core.get(other),
        };

        if ty != CoreType::Any {
            self.add_method(id, MethodSpec::new(ty.name(), loc).constructor().pure())?;
            self.add_method(
                id,
                MethodSpec::new(ty.name(), loc)
                    .param("value", id)
                    .constructor()
                    .pure(),
            )?;
        }

        for member in members(ty).into_iter().flatten() {
            let mut spec = MethodSpec::new(member.name, loc).operator();
            for (index, &arg) in member.args.iter().enumerate() {
                let name = if index == 0 { "other" } else { "arg" };
                spec = spec.param(name, resolve(arg));
            }
            if let Some(returning) = member.returning {
                spec = spec.returning(resolve(returning));
            }
            if member.pure {
                spec = spec.pure();
            }
            self.add_method(id, spec)?;
        }
        Ok(())
    }
}
