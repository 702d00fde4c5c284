//! Super types, traits and the member lists derived from them.
//!
//! The hierarchy operations assume an acyclic super chain. Cycles are
//! caught earlier by [`SymbolTable::check_super`] and
//! [`SymbolTable::check_trait`], which report them as semantic errors;
//! `set_super` and `add_trait` still refuse to close a cycle and fail with
//! a [`CompilerError`] if one slips through.

use oriel_span::Loc;
use std::collections::HashSet;

use crate::{
    error::{CompilerError, SemanticError},
    symbol::{Category, SymbolId},
    table::SymbolTable,
};

impl SymbolTable {
    /// Reports the cycle `parent` would close as `aggregate`'s super.
    pub fn check_super(
        &self,
        aggregate: SymbolId,
        parent: SymbolId,
        loc: Loc,
    ) -> Result<(), SemanticError> {
        if self.is_in_aggregate_hierarchy(parent, aggregate) {
            return Err(SemanticError::CircularHierarchy {
                name: self.symbol(aggregate).name.clone(),
                parent: self.symbol(parent).name.clone(),
                loc,
            });
        }
        Ok(())
    }

    /// Reports the cycle composing `trait_id` into `aggregate` would close.
    pub fn check_trait(
        &self,
        aggregate: SymbolId,
        trait_id: SymbolId,
        loc: Loc,
    ) -> Result<(), SemanticError> {
        if self.reaches(trait_id, aggregate) {
            return Err(SemanticError::CircularHierarchy {
                name: self.symbol(aggregate).name.clone(),
                parent: self.symbol(trait_id).name.clone(),
                loc,
            });
        }
        Ok(())
    }

    /// Makes `parent` the super of `aggregate` and registers the back link.
    /// Setting the current super again changes nothing.
    pub fn set_super(
        &mut self,
        aggregate: SymbolId,
        parent: SymbolId,
    ) -> Result<(), CompilerError> {
        let current = self.aggregate(aggregate).and_then(|a| a.super_aggregate);
        if current == Some(parent) {
            return Ok(());
        }
        if self.reaches(parent, aggregate) {
            return Err(CompilerError::HierarchyCycle {
                name: self.symbol(aggregate).name.clone(),
                parent: self.symbol(parent).name.clone(),
            });
        }

        self.clear_super(aggregate);
        self.link_super(aggregate, parent)
    }

    pub(crate) fn link_super(
        &mut self,
        aggregate: SymbolId,
        parent: SymbolId,
    ) -> Result<(), CompilerError> {
        let not_a_type = |symbol| CompilerError::UnexpectedKind {
            symbol,
            expected: "type",
        };

        self.aggregate_mut(aggregate)
            .ok_or(not_a_type(aggregate))?
            .super_aggregate = Some(parent);

        let subs = &mut self
            .aggregate_mut(parent)
            .ok_or(not_a_type(parent))?
            .sub_aggregates;
        if !subs.contains(&aggregate) {
            subs.push(aggregate);
        }
        Ok(())
    }

    /// Removes `aggregate`'s super, and `aggregate` from that super's subs.
    pub fn clear_super(&mut self, aggregate: SymbolId) {
        let Some(parent) = self
            .aggregate_mut(aggregate)
            .and_then(|a| a.super_aggregate.take())
        else {
            return;
        };

        if let Some(parent) = self.aggregate_mut(parent) {
            parent.sub_aggregates.retain(|&sub| sub != aggregate);
        }
    }

    /// Composes `trait_id` into `aggregate`; `false` if it already was.
    pub fn add_trait(
        &mut self,
        aggregate: SymbolId,
        trait_id: SymbolId,
    ) -> Result<bool, CompilerError> {
        if self.reaches(trait_id, aggregate) {
            return Err(CompilerError::HierarchyCycle {
                name: self.symbol(aggregate).name.clone(),
                parent: self.symbol(trait_id).name.clone(),
            });
        }

        let traits = &mut self
            .aggregate_mut(aggregate)
            .ok_or(CompilerError::UnexpectedKind {
                symbol: aggregate,
                expected: "type",
            })?
            .traits;
        if traits.contains(&trait_id) {
            return Ok(false);
        }
        traits.push(trait_id);
        Ok(true)
    }

    /// Whether `candidate` is `aggregate` or one of its supers.
    pub fn is_in_aggregate_hierarchy(&self, aggregate: SymbolId, candidate: SymbolId) -> bool {
        let mut current = Some(aggregate);
        while let Some(id) = current {
            if self.is_exact_same_type(id, candidate) {
                return true;
            }
            current = self.aggregate(id).and_then(|a| a.super_aggregate);
        }
        false
    }

    /// Whether `target` is `from` or reachable from it through supers and traits.
    fn reaches(&self, from: SymbolId, target: SymbolId) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![from];

        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if seen.insert(id) {
                stack.extend(self.parents(id));
            }
        }
        false
    }

    pub fn is_extension_of_injectable(&self, aggregate: SymbolId) -> bool {
        let mut current = Some(aggregate);
        while let Some(id) = current {
            let Some(info) = self.aggregate(id) else {
                return false;
            };
            if info.injectable {
                return true;
            }
            current = info.super_aggregate;
        }
        false
    }

    /// Own traits, the traits they compose and those of the super chain,
    /// each once.
    pub fn all_traits(&self, aggregate: SymbolId) -> Vec<SymbolId> {
        let mut seen = HashSet::new();
        let mut traits = Vec::new();
        self.collect_traits(aggregate, &mut seen, &mut traits);
        traits
    }

    fn collect_traits(
        &self,
        aggregate: SymbolId,
        seen: &mut HashSet<SymbolId>,
        traits: &mut Vec<SymbolId>,
    ) {
        let Some(info) = self.aggregate(aggregate) else {
            return;
        };

        for &trait_id in &info.traits {
            if seen.insert(trait_id) {
                traits.push(trait_id);
                self.collect_traits(trait_id, seen, traits);
            }
        }
        if let Some(parent) = info.super_aggregate {
            self.collect_traits(parent, seen, traits);
        }
    }

    /// Methods declared by `aggregate` itself, in declaration order.
    pub fn own_methods(&self, aggregate: SymbolId) -> Vec<SymbolId> {
        self.members(aggregate, Category::Method)
    }

    /// Fields declared by `aggregate` itself.
    pub fn fields(&self, aggregate: SymbolId) -> Vec<SymbolId> {
        self.members(aggregate, Category::Variable)
    }

    fn members(&self, aggregate: SymbolId, category: Category) -> Vec<SymbolId> {
        let Some(info) = self.aggregate(aggregate) else {
            return Vec::new();
        };
        self.scope(info.scope)
            .symbols()
            .iter()
            .copied()
            .filter(|&id| self.symbol(id).category() == category)
            .collect()
    }

    /// Fields of the super chain first, then own.
    pub fn all_fields(&self, aggregate: SymbolId) -> Vec<SymbolId> {
        let mut fields = match self.aggregate(aggregate).and_then(|a| a.super_aggregate) {
            Some(parent) => self.all_fields(parent),
            None => Vec::new(),
        };
        fields.extend(self.fields(aggregate));
        fields
    }

    pub fn constructors(&self, aggregate: SymbolId) -> Vec<SymbolId> {
        self.own_methods(aggregate)
            .into_iter()
            .filter(|&m| self.symbol(m).is_constructor())
            .collect()
    }

    /// Every method of the hierarchy without override suppression: the
    /// super's first, then own, then those of the traits.
    pub fn all_methods(&self, aggregate: SymbolId) -> Vec<SymbolId> {
        let mut seen = HashSet::new();
        self.all_methods_from(aggregate, &mut seen)
    }

    fn all_methods_from(&self, aggregate: SymbolId, seen: &mut HashSet<SymbolId>) -> Vec<SymbolId> {
        if !seen.insert(aggregate) {
            return Vec::new();
        }
        let Some(info) = self.aggregate(aggregate) else {
            return Vec::new();
        };

        let mut methods = match info.super_aggregate {
            Some(parent) => self.all_methods_from(parent, seen),
            None => Vec::new(),
        };
        methods.extend(self.own_methods(aggregate));
        for &trait_id in &info.traits {
            methods.extend(self.all_methods_from(trait_id, seen));
        }
        methods
    }

    /// The methods a value of `aggregate` actually answers to: own methods,
    /// then inherited ones whose name and signature were not overridden.
    pub fn all_effective_methods(&self, aggregate: SymbolId) -> Vec<SymbolId> {
        let mut methods = self.own_methods(aggregate);
        let Some(info) = self.aggregate(aggregate) else {
            return methods;
        };

        let parents: Vec<SymbolId> = info
            .super_aggregate
            .into_iter()
            .chain(info.traits.iter().copied())
            .collect();
        for parent in parents {
            for inherited in self.all_effective_methods(parent) {
                let overridden = methods
                    .iter()
                    .any(|&mine| self.has_same_signature(mine, inherited));
                if !overridden {
                    methods.push(inherited);
                }
            }
        }
        methods
    }

    /// Non-abstract methods along the super chain, nearest first.
    pub fn all_non_abstract_methods(&self, aggregate: SymbolId) -> Vec<SymbolId> {
        self.all_effective_methods(aggregate)
            .into_iter()
            .filter(|&m| !self.symbol(m).is_abstract())
            .collect()
    }

    /// Own method `name` whose parameter types are exactly `params`.
    pub fn find_method(
        &self,
        aggregate: SymbolId,
        name: &str,
        params: &[SymbolId],
    ) -> Option<SymbolId> {
        let scope = self.aggregate(aggregate)?.scope;
        self.scope(scope)
            .lookup(Category::Method, name)
            .iter()
            .copied()
            .find(|&m| {
                self.param_types(m).is_some_and(|types| {
                    types.len() == params.len()
                        && types
                            .iter()
                            .zip(params)
                            .all(|(&a, &b)| self.is_exact_same_type(a, b))
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use crate::test::Fixture;

    #[test]
    fn super_links_both_ways() {
        let mut fx = Fixture::new();
        let animal = fx.open_class("Animal");
        let dog = fx.class("Dog");

        fx.table.set_super(dog, animal).unwrap();
        fx.table.set_super(dog, animal).unwrap();

        assert_eq!(fx.table.aggregate(dog).unwrap().super_aggregate, Some(animal));
        assert_eq!(fx.table.aggregate(animal).unwrap().sub_aggregates, vec![dog]);

        fx.table.clear_super(dog);
        assert_eq!(fx.table.aggregate(dog).unwrap().super_aggregate, None);
        assert!(fx.table.aggregate(animal).unwrap().sub_aggregates.is_empty());
    }

    #[test]
    fn replacing_super_moves_back_link() {
        let mut fx = Fixture::new();
        let first = fx.open_class("First");
        let second = fx.open_class("Second");
        let child = fx.class("Child");

        fx.table.set_super(child, first).unwrap();
        fx.table.set_super(child, second).unwrap();

        assert!(fx.table.aggregate(first).unwrap().sub_aggregates.is_empty());
        assert_eq!(fx.table.aggregate(second).unwrap().sub_aggregates, vec![child]);
    }

    #[test]
    fn cycles_are_rejected() {
        let mut fx = Fixture::new();
        let a = fx.open_class("A");
        let b = fx.open_class("B");
        let c = fx.open_class("C");
        fx.table.set_super(b, a).unwrap();
        fx.table.set_super(c, b).unwrap();

        let loc = fx.loc();
        assert!(fx.table.check_super(a, c, loc).is_err());
        assert!(fx.table.check_super(a, a, loc).is_err());
        assert!(fx.table.set_super(a, c).is_err());
        assert_eq!(fx.table.aggregate(a).unwrap().super_aggregate, None);
    }

    #[test]
    fn hierarchy_membership() {
        let mut fx = Fixture::new();
        let a = fx.open_class("A");
        let b = fx.class("B");
        let unrelated = fx.class("Unrelated");
        fx.table.set_super(b, a).unwrap();

        assert!(fx.table.is_in_aggregate_hierarchy(a, a));
        assert!(fx.table.is_in_aggregate_hierarchy(b, a));
        assert!(!fx.table.is_in_aggregate_hierarchy(a, b));
        assert!(!fx.table.is_in_aggregate_hierarchy(a, unrelated));
    }

    #[test]
    fn traits_are_a_set() {
        let mut fx = Fixture::new();
        let printable = fx.trait_("Printable");
        let named = fx.trait_("Named");
        let base = fx.open_class("Base");
        let leaf = fx.class("Leaf");
        fx.table.set_super(leaf, base).unwrap();

        assert!(fx.table.add_trait(base, printable).unwrap());
        assert!(fx.table.add_trait(leaf, named).unwrap());
        assert!(fx.table.add_trait(leaf, printable).unwrap());
        assert!(!fx.table.add_trait(leaf, printable).unwrap());

        assert_eq!(fx.table.aggregate(leaf).unwrap().traits, vec![named, printable]);
        assert_eq!(fx.table.all_traits(leaf), vec![named, printable]);
        assert!(fx.table.check_trait(printable, leaf, fx.loc()).is_err());
    }

    #[test]
    fn effective_methods_honour_overrides() {
        let mut fx = Fixture::new();
        let animal = fx.open_class("Animal");
        let dog = fx.class("Dog");
        fx.table.set_super(dog, animal).unwrap();

        let base_speak = fx.method(animal, "speak", &[], None);
        let sleep = fx.method(animal, "sleep", &[], None);
        let dog_speak = fx.method(dog, "speak", &[], None);

        let effective = fx.table.all_effective_methods(dog);
        let speaks: Vec<_> = effective
            .iter()
            .filter(|&&m| fx.table.symbol(m).name == "speak")
            .collect();
        assert_eq!(speaks, vec![&dog_speak]);
        assert!(effective.contains(&sleep));

        let all = fx.table.all_methods(dog);
        assert!(all.contains(&base_speak));
        assert!(all.contains(&dog_speak));
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn injectable_through_super() {
        let mut fx = Fixture::new();
        let base = fx.open_class("Service");
        let concrete = fx.class("Concrete");
        fx.table.set_super(concrete, base).unwrap();

        assert!(!fx.table.is_extension_of_injectable(concrete));
        fx.table.aggregate_mut(base).unwrap().injectable = true;
        assert!(fx.table.is_extension_of_injectable(concrete));
    }

    #[test]
    fn fields_of_the_chain() {
        let mut fx = Fixture::new();
        let core = fx.core();
        let base = fx.open_class("Base");
        let leaf = fx.class("Leaf");
        fx.table.set_super(leaf, base).unwrap();
        let id = fx.field(base, "id", core.integer);
        let label = fx.field(leaf, "label", core.string);

        assert_eq!(fx.table.fields(leaf), vec![label]);
        assert_eq!(fx.table.all_fields(leaf), vec![id, label]);
    }
}
