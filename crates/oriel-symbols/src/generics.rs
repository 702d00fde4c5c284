//! Parameterized types and functions.
//!
//! Instantiating a template happens in two steps. [`SymbolTable::parameterize`]
//! hands out the instance for a template and its arguments, creating an empty
//! shell the first time and caching it by fully qualified names afterwards.
//! [`SymbolTable::populate_pending`] later copies the template's members into
//! every shell created since, substituting the placeholders. Splitting the two
//! lets a template mention instances of itself, since the shell is already
//! cached by the time its members are copied.

use ecow::{EcoString, eco_format};
use log::{debug, trace};
use oriel_span::Loc;
use std::collections::HashMap;

use crate::{
    error::{CompilerError, SemanticError, SymbolError},
    scope::{ScopeId, ScopeKind},
    symbol::{Category, Function, Generic, Symbol, SymbolId, SymbolKind},
    table::SymbolTable,
};

/// Cache key of an instance: the template and its arguments, by fully
/// qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterizedKey {
    pub template: EcoString,
    pub args: Vec<EcoString>,
}

type Substitutions = HashMap<SymbolId, SymbolId>;

impl SymbolTable {
    pub fn is_generic_template(&self, id: SymbolId) -> bool {
        self.symbol(id).generic().is_some_and(Generic::is_template)
    }

    /// Whether a template used bare from `scope` stands for its own instance,
    /// which is the case anywhere inside its declaration.
    pub fn refers_to_own_template(&self, scope: ScopeId, template: SymbolId) -> bool {
        let Some(owned) = self.symbol(template).owned_scope() else {
            return false;
        };
        let mut current = Some(scope);
        while let Some(id) = current {
            if id == owned {
                return true;
            }
            current = self.scope(id).enclosing;
        }
        false
    }

    /// Declares the placeholder `name` on `template`, in its own scope.
    pub fn add_type_parameter(
        &mut self,
        template: SymbolId,
        name: impl Into<EcoString>,
        loc: Loc,
    ) -> Result<SymbolId, CompilerError> {
        let scope = self
            .symbol(template)
            .owned_scope()
            .ok_or(CompilerError::UnexpectedKind {
                symbol: template,
                expected: "type or function",
            })?;
        let module = self.symbol(template).module.clone();

        let mut symbol = Symbol::aggregate(name, self.symbol(template).genus, scope, loc)
            .with_module(module);
        if let Some(aggregate) = symbol.as_aggregate_mut() {
            aggregate.open = true;
            aggregate.is_abstract = true;
            aggregate.generic = Generic {
                conceptual: true,
                parent: Some(template),
                ..Generic::default()
            };
        }
        let placeholder = self.new_aggregate(symbol, scope)?;
        self.define(scope, placeholder)?;

        let generic = self
            .symbol_mut(template)
            .generic_mut()
            .ok_or(CompilerError::UnexpectedKind {
                symbol: template,
                expected: "type or function",
            })?;
        generic.params.push(placeholder);
        Ok(placeholder)
    }

    /// The instance of `template` for `args`, created as an unpopulated shell
    /// if this is the first time it is asked for.
    pub fn parameterize(
        &mut self,
        template: SymbolId,
        args: &[SymbolId],
        loc: Loc,
    ) -> Result<SymbolId, SemanticError> {
        let symbol = self.symbol(template);
        let Some(generic) = symbol.generic().filter(|g| g.is_template()) else {
            return Err(SemanticError::NotGeneric {
                name: symbol.name.clone(),
                loc,
            });
        };
        if generic.params.len() != args.len() {
            return Err(SemanticError::GenericArity {
                name: symbol.name.clone(),
                expected: generic.params.len(),
                found: args.len(),
                loc,
            });
        }
        if let Some(&invalid) = args.iter().find(|&&arg| {
            self.is_generic_template(arg)
                || !matches!(
                    self.symbol(arg).category(),
                    Category::Type | Category::Function
                )
        }) {
            return Err(SemanticError::InvalidTypeArgument {
                name: symbol.name.clone(),
                arg: self.symbol(invalid).name.clone(),
                loc,
            });
        }

        let key = ParameterizedKey {
            template: self.fully_qualified_name(template),
            args: args.iter().map(|&arg| self.fully_qualified_name(arg)).collect(),
        };
        if let Some(&instance) = self.instances.get(&key) {
            return Ok(instance);
        }

        let instance = self
            .new_instance_shell(template, args)
            .map_err(|_| SemanticError::NotGeneric {
                name: self.symbol(template).name.clone(),
                loc,
            })?;
        debug!(
            "parameterized `{}` as {instance:?}",
            self.fully_qualified_name(instance)
        );
        self.instances.insert(key, instance);
        self.pending.push_back(instance);
        Ok(instance)
    }

    fn new_instance_shell(
        &mut self,
        template: SymbolId,
        args: &[SymbolId],
    ) -> Result<SymbolId, CompilerError> {
        let original = self.symbol(template).clone();
        let template_scope = original.owned_scope().ok_or(CompilerError::UnexpectedKind {
            symbol: template,
            expected: "type or function",
        })?;
        let enclosing = self.scope(template_scope).enclosing;

        let names: Vec<&str> = args.iter().map(|&arg| self.symbol(arg).name.as_str()).collect();
        let name = eco_format!("{} of ({})", original.name, names.join(", "));
        let generic = Generic {
            params: args.to_vec(),
            template: Some(template),
            ..Generic::default()
        };

        let id = self.next_symbol_id();
        let kind = match original.kind {
            SymbolKind::Type(mut aggregate) => {
                aggregate.scope = self.new_scope(name.clone(), ScopeKind::Aggregate(id), enclosing);
                aggregate.super_aggregate = None;
                aggregate.sub_aggregates.clear();
                aggregate.traits.clear();
                aggregate.constrains = None;
                aggregate.generic = generic;
                SymbolKind::Type(aggregate)
            }
            SymbolKind::Function(function) => SymbolKind::Function(Function {
                scope: self.new_scope(name.clone(), ScopeKind::Function(id), enclosing),
                params: Vec::new(),
                returning: None,
                is_abstract: function.is_abstract,
                generic,
            }),
            _ => {
                return Err(CompilerError::UnexpectedKind {
                    symbol: template,
                    expected: "type or function",
                });
            }
        };

        Ok(self.add_symbol(Symbol {
            name,
            ty: None,
            kind,
            ..original
        }))
    }

    /// Fills every shell created since the last call, including those
    /// created while filling. Semantic errors of one instance do not stop
    /// the others.
    pub fn populate_pending(&mut self) -> Result<Vec<SemanticError>, CompilerError> {
        let mut errors = Vec::new();

        while let Some(instance) = self.pending.pop_front() {
            match self.populate(instance) {
                Ok(()) => {}
                Err(SymbolError::Semantic(error)) => errors.push(error),
                Err(SymbolError::Fatal(error)) => return Err(error),
            }
        }
        Ok(errors)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Parameterizes and populates in one go.
    pub fn instantiate(
        &mut self,
        template: SymbolId,
        args: &[SymbolId],
        loc: Loc,
    ) -> Result<SymbolId, SymbolError> {
        let instance = self.parameterize(template, args, loc)?;
        if let Some(error) = self.populate_pending()?.into_iter().next() {
            return Err(error.into());
        }
        Ok(instance)
    }

    fn populate(&mut self, instance: SymbolId) -> Result<(), SymbolError> {
        let not_an_instance = CompilerError::UnexpectedKind {
            symbol: instance,
            expected: "parameterized instance",
        };
        let generic = self.symbol(instance).generic().ok_or(not_an_instance.clone())?;
        let template = generic.template.ok_or(not_an_instance)?;
        let args = generic.params.clone();
        let placeholders = self
            .symbol(template)
            .generic()
            .map(|g| g.params.clone())
            .unwrap_or_default();
        let loc = self.symbol(instance).loc;

        let mut substitutions: Substitutions = placeholders.into_iter().zip(args).collect();
        substitutions.insert(template, instance);
        let mut substitute = |table: &mut SymbolTable, ty: SymbolId| {
            table.substitute(ty, &substitutions, loc)
        };

        trace!("populating {instance:?} from template {template:?}");
        match self.symbol(template).kind.clone() {
            SymbolKind::Type(aggregate) => {
                let own_scope = self.member_scope(instance)?;
                let name = self.symbol(instance).name.clone();

                let members: Vec<SymbolId> = self.scope(aggregate.scope).symbols().to_vec();
                for member in members {
                    let symbol = self.symbol(member);
                    if !matches!(symbol.category(), Category::Variable | Category::Method) {
                        continue;
                    }
                    let rename = symbol.is_constructor().then(|| name.clone());
                    self.clone_symbol(member, rename, own_scope, instance, &mut substitute)?;
                }

                if let Some(parent) = aggregate.super_aggregate {
                    let parent = substitute(self, parent)?;
                    self.link_super(instance, parent)?;
                }
                for trait_id in aggregate.traits {
                    let trait_id = substitute(self, trait_id)?;
                    if let Some(own) = self.aggregate_mut(instance)
                        && !own.traits.contains(&trait_id)
                    {
                        own.traits.push(trait_id);
                    }
                }
            }
            SymbolKind::Function(function) => {
                let own_scope = self
                    .symbol(instance)
                    .owned_scope()
                    .ok_or(CompilerError::UnexpectedKind {
                        symbol: instance,
                        expected: "function",
                    })?;

                let mut params = Vec::with_capacity(function.params.len());
                for param in function.params {
                    params.push(self.clone_variable(param, own_scope, &mut substitute)?);
                }
                let returning = match function.returning {
                    Some(rtn) => Some(self.clone_variable(rtn, own_scope, &mut substitute)?),
                    None => None,
                };

                if let Some(own) = self.symbol_mut(instance).as_function_mut() {
                    own.params = params;
                    own.returning = returning;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn clone_variable(
        &mut self,
        variable: SymbolId,
        scope: ScopeId,
        substitute: &mut dyn FnMut(&mut Self, SymbolId) -> Result<SymbolId, SemanticError>,
    ) -> Result<SymbolId, SymbolError> {
        let mut copy = self.symbol(variable).clone();
        copy.ty = copy.ty.map(|ty| substitute(self, ty)).transpose()?;
        Ok(self.add_and_define(scope, copy)?)
    }

    /// Replaces placeholders in `ty`, re-parameterizing nested instances
    /// whose arguments change.
    fn substitute(
        &mut self,
        ty: SymbolId,
        substitutions: &Substitutions,
        loc: Loc,
    ) -> Result<SymbolId, SemanticError> {
        if let Some(&replacement) = substitutions.get(&ty) {
            return Ok(replacement);
        }

        let Some(generic) = self.symbol(ty).generic().filter(|g| g.is_instance()) else {
            return Ok(ty);
        };
        let Some(template) = generic.template else {
            return Ok(ty);
        };
        let args = generic.params.clone();

        let mut substituted = Vec::with_capacity(args.len());
        for &arg in &args {
            substituted.push(self.substitute(arg, substitutions, loc)?);
        }
        if substituted == args {
            return Ok(ty);
        }
        self.parameterize(template, &substituted, loc)
    }
}
