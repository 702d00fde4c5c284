//! Members the compiler adds on its own: default and field-wise
//! constructors, and the operators every enumeration answers to.

use log::trace;

use crate::{
    error::CompilerError,
    symbol::{Genus, SymbolId},
    table::{MethodSpec, SymbolTable},
};

/// Records with at least this many fields get no field-wise constructor.
pub const MAX_RECORD_CONSTRUCTOR_FIELDS: usize = 20;

impl SymbolTable {
    /// Adds the constructors `aggregate` is owed, returning how many.
    pub fn synthesize_constructors(&mut self, aggregate: SymbolId) -> Result<usize, CompilerError> {
        let symbol = self.symbol(aggregate);
        let genus = symbol.genus;
        let name = symbol.name.clone();
        let loc = symbol.loc;
        let eligible = matches!(
            genus,
            Genus::Class | Genus::Record | Genus::Component | Genus::ClassConstrained
        );
        if !eligible || symbol.is_abstract() {
            return Ok(0);
        }

        let mut added = 0;
        if self.find_method(aggregate, &name, &[]).is_none() {
            self.add_method(
                aggregate,
                MethodSpec::new(name.clone(), loc).constructor().synthetic(),
            )?;
            added += 1;
        }

        if genus == Genus::Record {
            let fields = self.all_fields(aggregate);
            let typed: Option<Vec<_>> = fields
                .iter()
                .map(|&field| {
                    let symbol = self.symbol(field);
                    symbol.ty.map(|ty| (symbol.name.clone(), ty))
                })
                .collect();

            if let Some(typed) = typed
                && !typed.is_empty()
                && typed.len() < MAX_RECORD_CONSTRUCTOR_FIELDS
            {
                let types: Vec<SymbolId> = typed.iter().map(|&(_, ty)| ty).collect();
                if self.find_method(aggregate, &name, &types).is_none() {
                    let spec = typed.into_iter().fold(
                        MethodSpec::new(name.clone(), loc).constructor().synthetic(),
                        |spec, (field, ty)| spec.param(field, ty),
                    );
                    self.add_method(aggregate, spec)?;
                    added += 1;
                }
            }
        }

        if added > 0 {
            trace!("synthesized {added} constructors for `{name}`");
        }
        Ok(added)
    }

    /// Gives an enumeration its comparison and conversion operators.
    pub fn synthesize_enumeration(
        &mut self,
        enumeration: SymbolId,
    ) -> Result<usize, CompilerError> {
        let core = *self.require_core()?;
        let loc = self.symbol(enumeration).loc;

        let operators = [
            ("==", true, core.boolean),
            ("<>", true, core.boolean),
            ("<", true, core.boolean),
            (">", true, core.boolean),
            ("<=", true, core.boolean),
            (">=", true, core.boolean),
            ("<=>", true, core.integer),
            ("$", false, core.string),
            ("#?", false, core.integer),
        ];

        let mut added = 0;
        for (name, binary, returning) in operators {
            let params: &[SymbolId] = if binary { &[enumeration] } else { &[] };
            if self.find_method(enumeration, name, params).is_some() {
                continue;
            }

            let mut spec = MethodSpec::new(name, loc)
                .operator()
                .synthetic()
                .pure()
                .returning(returning);
            if binary {
                spec = spec.param("other", enumeration);
            }
            self.add_method(enumeration, spec)?;
            added += 1;
        }
        Ok(added)
    }
}
