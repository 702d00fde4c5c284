//! Constrained types, `type Age as Integer`.
//!
//! A constrained type gets a constructor from its base and a copy of the
//! base's methods, with the operators that produce or compare values of the
//! base rewritten to produce or compare values of the new type instead.

use log::debug;
use oriel_span::Loc;
use std::collections::HashMap;

use crate::{
    builtins::CoreType,
    error::{SemanticError, SymbolError},
    symbol::{Genus, SymbolId},
    table::{MethodSpec, SymbolTable},
};

/// Nullary operators that keep the base's return type.
const KEEPS_RETURN: &[&str] = &["length", "abs", "#?"];

/// Operators returning the new type instead of the base.
const RETURNS_NEW: &[&str] = &["+", "-", "*", "/", "^", ">>", "<<", "and", "or", "xor"];

/// Operators taking the new type instead of the base.
const TAKES_NEW: &[&str] = &[
    ":=:", ":^:", ":~:", "matches", "contains", "and", "or", "xor", "<", "<=", ">", ">=", "==",
    "<>", "<=>", "<~>",
];

/// Operators that also keep a copy taking the base.
const ALSO_TAKES_BASE: &[&str] = &["matches", "contains", "<", "<=", ">", ">=", "==", "<>"];

/// How one inherited method is copied onto the constrained type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rewrite {
    returning: bool,
    params: bool,
}

fn rewrites(name: &str, operator: bool, arity: usize) -> Vec<Rewrite> {
    if !operator {
        return vec![Rewrite {
            returning: false,
            params: false,
        }];
    }
    if arity == 0 {
        return vec![Rewrite {
            returning: !KEEPS_RETURN.contains(&name),
            params: false,
        }];
    }

    let returning = RETURNS_NEW.contains(&name);
    let mut rewrites = vec![Rewrite {
        returning,
        params: TAKES_NEW.contains(&name),
    }];
    if ALSO_TAKES_BASE.contains(&name) {
        rewrites.push(Rewrite {
            returning,
            params: false,
        });
    }
    rewrites
}

impl SymbolTable {
    /// Makes `constrained` a constrained type over `base`.
    pub fn constrain(
        &mut self,
        constrained: SymbolId,
        base: SymbolId,
        loc: Loc,
    ) -> Result<(), SymbolError> {
        if let Some(reason) = self.why_not_constrainable(base) {
            return Err(SemanticError::CannotConstrain {
                name: self.symbol(constrained).name.clone(),
                base: self.symbol(base).name.clone(),
                reason: reason.into(),
                loc,
            }
            .into());
        }

        let name = self.symbol(constrained).name.clone();
        if let Some(aggregate) = self.aggregate_mut(constrained) {
            aggregate.constrains = Some(base);
        }

        if self.find_method(constrained, &name, &[base]).is_none() {
            self.add_method(
                constrained,
                MethodSpec::new(name.clone(), loc)
                    .param("value", base)
                    .constructor()
                    .synthetic(),
            )?;
        }

        let inherited: Vec<SymbolId> = self
            .all_non_abstract_methods(base)
            .into_iter()
            .filter(|&m| !self.symbol(m).is_constructor())
            .collect();
        let member_scope = self.member_scope(constrained)?;

        let mut added = 0;
        for method in inherited {
            let symbol = self.symbol(method);
            let method_name = symbol.name.clone();
            let params = self.param_types(method).unwrap_or_default();

            for rewrite in rewrites(&method_name, symbol.is_operator(), params.len()) {
                let target: Vec<SymbolId> = params
                    .iter()
                    .map(|&ty| {
                        if rewrite.params && self.is_exact_same_type(ty, base) {
                            constrained
                        } else {
                            ty
                        }
                    })
                    .collect();
                if self.find_method(constrained, &method_name, &target).is_some() {
                    continue;
                }

                let copy = self.clone_symbol(
                    method,
                    None,
                    member_scope,
                    constrained,
                    &mut |_, ty| Ok(ty),
                )?;
                self.retype_clone(copy, base, constrained, rewrite);
                added += 1;
            }
        }

        let base_ctors = self.constructors(base);
        let pure = !base_ctors.is_empty()
            && base_ctors.iter().all(|&ctor| self.symbol(ctor).flags.pure);
        if pure {
            for ctor in self.constructors(constrained) {
                self.symbol_mut(ctor).flags.pure = true;
            }
        }

        debug!(
            "constrained `{name}` over `{}` with {added} methods",
            self.symbol(base).name
        );
        Ok(())
    }

    fn why_not_constrainable(&self, base: SymbolId) -> Option<&'static str> {
        let symbol = self.symbol(base);
        let Some(aggregate) = symbol.as_aggregate() else {
            return Some("only types can be constrained");
        };

        if !matches!(
            symbol.genus,
            Genus::Class | Genus::ClassConstrained | Genus::ClassEnumeration | Genus::Record
        ) {
            return Some("only classes, records, enumerations and constrained types qualify");
        }
        if aggregate.is_abstract {
            return Some("the base is abstract");
        }
        let core_kind = self.core().and_then(|core| core.kind_of(base));
        if matches!(core_kind, Some(CoreType::Boolean | CoreType::Json)) {
            return Some("Boolean and Json cannot be constrained");
        }
        None
    }

    fn retype_clone(
        &mut self,
        copy: SymbolId,
        base: SymbolId,
        constrained: SymbolId,
        rewrite: Rewrite,
    ) {
        let Some((params, returning)) = self
            .symbol(copy)
            .signature()
            .map(|(params, returning)| (params.to_vec(), returning))
        else {
            return;
        };

        let mut targets: Vec<SymbolId> = Vec::new();
        if rewrite.params {
            targets.extend(params);
        }
        if rewrite.returning {
            targets.extend(returning);
        }
        for variable in targets {
            if self
                .symbol(variable)
                .ty
                .is_some_and(|ty| self.is_exact_same_type(ty, base))
            {
                self.symbol_mut(variable).ty = Some(constrained);
            }
        }
    }

    /// `types` ordered so that every constrained type comes after the
    /// constrained type it is based on. Ties keep their given order.
    pub fn order_by_base(&self, types: &[(SymbolId, SymbolId)]) -> Vec<(SymbolId, SymbolId)> {
        let bases: HashMap<SymbolId, SymbolId> = types.iter().copied().collect();
        let depth = |mut id: SymbolId| {
            let mut depth = 0usize;
            while let Some(&base) = bases.get(&id) {
                depth += 1;
                if depth > bases.len() {
                    break;
                }
                id = base;
            }
            depth
        };

        let mut ordered = types.to_vec();
        ordered.sort_by_key(|&(constrained, _)| depth(constrained));
        ordered
    }
}
