//! Overload and operator matching.
//!
//! Every candidate with the right arity is priced by summing the cost of
//! assigning each argument to its parameter, left to right. The caller adds
//! an extra cost for candidates it had to reach through a super type or a
//! trait, which is what makes a locally declared method beat an inherited one
//! of the same signature. Picking the winner is left to
//! [`MethodSearchResult::outcome`].

use ecow::eco_format;
use serde::{Deserialize, Serialize};

use crate::{
    error::CompilerError,
    search::{MethodMatch, MethodSearch, MethodSearchResult},
    symbol::SymbolId,
    table::SymbolTable,
};

/// Cost of an assignment that cannot happen.
pub const NOT_ASSIGNABLE: f64 = -1_000_000.0;

/// Costs closer than this are a tie.
pub const TOLERANCE: f64 = 0.001;

/// Relative weights of the ways an argument can reach a parameter.
///
/// An exact match costs nothing. The defaults keep `super_cost` well below
/// `coercion_cost`, so an exact match one level up the hierarchy still beats
/// a coercion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchWeights {
    /// Argument converted through the coercion table.
    pub coercion_cost: f64,
    /// Per level of super type climbed, for arguments and for inherited methods.
    pub super_cost: f64,
    /// Per trait the argument is reached through.
    pub trait_cost: f64,
    /// Any type passed where `Any` is expected.
    pub any_cost: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            coercion_cost: 0.5,
            super_cost: 0.05,
            trait_cost: 0.05,
            any_cost: 20.0,
        }
    }
}

impl MatchWeights {
    /// Every cost must be finite and larger than [`TOLERANCE`], otherwise a
    /// super type or coercion step would tie with an exact match.
    pub fn validate(&self) -> Result<(), CompilerError> {
        let costs = [
            ("coercion_cost", self.coercion_cost),
            ("super_cost", self.super_cost),
            ("trait_cost", self.trait_cost),
            ("any_cost", self.any_cost),
        ];
        match costs
            .into_iter()
            .find(|&(_, cost)| !cost.is_finite() || cost <= TOLERANCE)
        {
            Some((name, cost)) => Err(CompilerError::InvalidWeights(eco_format!(
                "`{name}` is {cost}, it must be finite and above {TOLERANCE}"
            ))),
            None => Ok(()),
        }
    }
}

/// Prices `candidate` for `search`, `None` when it cannot accept the call.
pub fn match_method(
    table: &SymbolTable,
    candidate: SymbolId,
    search: &MethodSearch,
    extra_cost: f64,
) -> Option<MethodMatch> {
    let (params, returning) = table.symbol(candidate).signature()?;

    if params.len() != search.args.len() {
        return None;
    }

    let mut cost = extra_cost;
    for (&param, &arg) in params.iter().zip(&search.args) {
        let param_ty = table.type_of(param)?;
        let arg_cost = table.assignable_cost(arg, param_ty);
        if arg_cost < 0.0 {
            return None;
        }
        cost += arg_cost;
    }

    let return_compatible = match search.returning {
        None => true,
        Some(expected) => returning
            .and_then(|r| table.type_of(r))
            .is_some_and(|actual| table.assignable_cost(actual, expected) >= 0.0),
    };

    Some(MethodMatch {
        method: candidate,
        cost,
        return_compatible,
    })
}

pub fn match_methods(
    table: &SymbolTable,
    candidates: &[SymbolId],
    search: &MethodSearch,
    extra_cost: f64,
) -> MethodSearchResult {
    candidates
        .iter()
        .filter_map(|&candidate| match_method(table, candidate, search, extra_cost))
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::{search::MatchOutcome, test::Fixture};

    #[test]
    fn weights_must_stay_above_tolerance() {
        assert_eq!(MatchWeights::default().validate(), Ok(()));

        let flat = MatchWeights {
            super_cost: 0.0005,
            ..MatchWeights::default()
        };
        assert!(matches!(
            flat.validate(),
            Err(CompilerError::InvalidWeights(reason)) if reason.contains("super_cost")
        ));

        let unbounded = MatchWeights {
            any_cost: f64::INFINITY,
            ..MatchWeights::default()
        };
        assert!(unbounded.validate().is_err());
    }

    #[test]
    fn exact_match_beats_other_overload() {
        let mut fx = Fixture::new();
        let core = fx.core();
        let owner = fx.class("Printer");
        let f_int = fx.method(owner, "f", &[core.integer], None);
        let f_str = fx.method(owner, "f", &[core.string], None);

        let search = MethodSearch::new("f", vec![core.integer]);
        let result = match_methods(&fx.table, &[f_int, f_str], &search, 0.0);

        assert_eq!(result.outcome(), MatchOutcome::Resolved(f_int));

        let search = MethodSearch::new("f", vec![core.string]);
        let result = match_methods(&fx.table, &[f_int, f_str], &search, 0.0);
        assert_eq!(result.outcome(), MatchOutcome::Resolved(f_str));
    }

    #[test]
    fn coercion_never_beats_exact() {
        let mut fx = Fixture::new();
        let core = fx.core();
        let owner = fx.class("Scaler");
        let by_float = fx.method(owner, "scale", &[core.float], None);
        let by_int = fx.method(owner, "scale", &[core.integer], None);

        let search = MethodSearch::new("scale", vec![core.integer]);
        let result = match_methods(&fx.table, &[by_float, by_int], &search, 0.0);
        assert_eq!(result.outcome(), MatchOutcome::Resolved(by_int));

        // With only the Float overload left the coercion is taken.
        let result = match_methods(&fx.table, &[by_float], &search, 0.0);
        assert_eq!(result.outcome(), MatchOutcome::Resolved(by_float));
        assert_eq!(result.matches()[0].cost, MatchWeights::default().coercion_cost);
    }

    #[test]
    fn arity_and_failed_parameters_reject() {
        let mut fx = Fixture::new();
        let core = fx.core();
        let owner = fx.class("Pair");
        let two = fx.method(owner, "set", &[core.integer, core.string], None);

        let short = MethodSearch::new("set", vec![core.integer]);
        assert!(match_method(&fx.table, two, &short, 0.0).is_none());

        let swapped = MethodSearch::new("set", vec![core.string, core.integer]);
        assert!(match_method(&fx.table, two, &swapped, 0.0).is_none());
    }

    #[test]
    fn equal_cost_is_ambiguous() {
        let mut fx = Fixture::new();
        let core = fx.core();
        let owner = fx.class("Mixer");
        let a = fx.method(owner, "mix", &[core.float, core.integer], None);
        let b = fx.method(owner, "mix", &[core.integer, core.float], None);

        let search = MethodSearch::new("mix", vec![core.integer, core.integer]);
        let result = match_methods(&fx.table, &[a, b], &search, 0.0);

        assert_eq!(result.outcome(), MatchOutcome::Ambiguous(vec![a, b]));
    }

    #[test]
    fn requested_return_type_resolves_tie() {
        let mut fx = Fixture::new();
        let core = fx.core();
        let owner = fx.class("Reader");
        let as_int = fx.method(owner, "read", &[core.float, core.integer], Some(core.integer));
        let as_str = fx.method(owner, "read", &[core.integer, core.float], Some(core.string));

        let search =
            MethodSearch::new("read", vec![core.integer, core.integer]).returning(core.string);
        let result = match_methods(&fx.table, &[as_int, as_str], &search, 0.0);

        assert_eq!(result.outcome(), MatchOutcome::Resolved(as_str));
    }

    proptest! {
        #[test]
        fn outcome_is_independent_of_candidate_order(
            picks in proptest::collection::vec(0usize..4, 1..8),
            arg in 0usize..4,
        ) {
            let mut fx = Fixture::new();
            let core = fx.core();
            let types = [core.integer, core.float, core.string, core.character];
            let owner = fx.class("Overloads");

            let candidates: Vec<SymbolId> = picks
                .iter()
                .map(|&p| fx.method(owner, "go", &[types[p]], None))
                .collect();
            let mut reversed = candidates.clone();
            reversed.reverse();

            let search = MethodSearch::new("go", vec![types[arg]]);
            let forward = match_methods(&fx.table, &candidates, &search, 0.0).outcome();
            let again = match_methods(&fx.table, &candidates, &search, 0.0).outcome();
            let backward = match_methods(&fx.table, &reversed, &search, 0.0).outcome();

            prop_assert_eq!(&forward, &again);
            prop_assert_eq!(&forward, &backward);
        }

        #[test]
        fn inherited_exact_match_beats_local_coercion(
            super_cost in 0.0f64..0.4,
            coercion_cost in 0.45f64..5.0,
        ) {
            let mut fx = Fixture::with_weights(MatchWeights {
                super_cost,
                coercion_cost,
                ..MatchWeights::default()
            });
            let core = fx.core();
            let owner = fx.class("Narrow");
            let local = fx.method(owner, "take", &[core.float], None);
            let inherited = fx.method(owner, "take", &[core.integer], None);

            let search = MethodSearch::new("take", vec![core.integer]);
            let mut result = match_methods(&fx.table, &[local], &search, 0.0);
            result.merge(match_methods(&fx.table, &[inherited], &search, super_cost));

            prop_assert_eq!(result.outcome(), MatchOutcome::Resolved(inherited));
        }
    }
}
