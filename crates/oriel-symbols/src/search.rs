use ecow::EcoString;

use crate::{
    matcher::TOLERANCE,
    symbol::{Category, SymbolId},
};

/// Name lookup request for anything but methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolSearch {
    pub name: EcoString,
    /// Tried in order, [`Category::Any`] expands to every searchable category.
    pub categories: Vec<Category>,
    /// When set, a variable's type (or a type itself) must be assignable to it.
    pub of_type: Option<SymbolId>,
}

impl SymbolSearch {
    pub fn new(name: impl Into<EcoString>, category: Category) -> Self {
        Self {
            name: name.into(),
            categories: vec![category],
            of_type: None,
        }
    }

    pub fn types(name: impl Into<EcoString>) -> Self {
        Self::new(name, Category::Type)
    }

    pub fn variables(name: impl Into<EcoString>) -> Self {
        Self::new(name, Category::Variable)
    }

    pub fn functions(name: impl Into<EcoString>) -> Self {
        Self::new(name, Category::Function)
    }

    pub fn any(name: impl Into<EcoString>) -> Self {
        Self::new(name, Category::Any)
    }

    pub fn or(mut self, category: Category) -> Self {
        self.categories.push(category);
        self
    }

    pub fn of_type(mut self, ty: SymbolId) -> Self {
        self.of_type = Some(ty);
        self
    }

    pub fn expanded_categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.categories.iter().flat_map(|&category| match category {
            Category::Any => Category::SEARCHABLE.to_vec(),
            other => vec![other],
        })
    }
}

/// The shape of a call: method name, argument types in order and optionally
/// the type the caller expects back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSearch {
    pub name: EcoString,
    pub args: Vec<SymbolId>,
    pub returning: Option<SymbolId>,
}

impl MethodSearch {
    pub fn new(name: impl Into<EcoString>, args: Vec<SymbolId>) -> Self {
        Self {
            name: name.into(),
            args,
            returning: None,
        }
    }

    pub fn returning(mut self, ty: SymbolId) -> Self {
        self.returning = Some(ty);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MethodMatch {
    pub method: SymbolId,
    pub cost: f64,
    /// Whether the declared return type satisfies the requested one. Always
    /// true when nothing was requested.
    pub return_compatible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Unresolved,
    Resolved(SymbolId),
    /// Ids of the equally good candidates, ascending.
    Ambiguous(Vec<SymbolId>),
}

impl MatchOutcome {
    pub fn resolved(&self) -> Option<SymbolId> {
        match self {
            Self::Resolved(id) => Some(*id),
            _ => None,
        }
    }
}

/// Every candidate that could accept a call, with what accepting it costs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodSearchResult {
    matches: Vec<MethodMatch>,
}

impl MethodSearchResult {
    pub fn new(matches: Vec<MethodMatch>) -> Self {
        Self { matches }
    }

    pub fn matches(&self) -> &[MethodMatch] {
        &self.matches
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn merge(&mut self, other: MethodSearchResult) {
        self.matches.extend(other.matches);
    }

    fn best_cost(&self) -> Option<f64> {
        self.matches.iter().map(|m| m.cost).min_by(f64::total_cmp)
    }

    /// Lets the matches of an inner scope take over: outer matches survive
    /// only when strictly better than the best inner one.
    pub fn overridden_by(self, inner: MethodSearchResult) -> MethodSearchResult {
        let Some(best) = inner.best_cost() else {
            return self;
        };

        let mut matches: Vec<_> = self
            .matches
            .into_iter()
            .filter(|m| m.cost < best - TOLERANCE)
            .collect();
        matches.extend(inner.matches);
        Self { matches }
    }

    /// Drops the matches `keep` returns false for.
    pub fn retain(&mut self, keep: impl FnMut(&MethodMatch) -> bool) {
        self.matches.retain(keep);
    }

    /// Picks the cheapest candidate. Ties are decided by value, so the order
    /// candidates were collected in never matters.
    pub fn outcome(&self) -> MatchOutcome {
        let Some(best) = self.best_cost() else {
            return MatchOutcome::Unresolved;
        };

        let tied: Vec<&MethodMatch> = self
            .matches
            .iter()
            .filter(|m| (m.cost - best).abs() <= TOLERANCE)
            .collect();

        let mut ids: Vec<SymbolId> = tied.iter().map(|m| m.method).collect();
        ids.sort();
        ids.dedup();

        if ids.len() > 1 {
            let mut compatible: Vec<SymbolId> = tied
                .iter()
                .filter(|m| m.return_compatible)
                .map(|m| m.method)
                .collect();
            compatible.sort();
            compatible.dedup();

            if compatible.len() == 1 {
                return MatchOutcome::Resolved(compatible[0]);
            }
        }

        match ids.as_slice() {
            [] => MatchOutcome::Unresolved,
            [single] => MatchOutcome::Resolved(*single),
            _ => MatchOutcome::Ambiguous(ids),
        }
    }
}

impl FromIterator<MethodMatch> for MethodSearchResult {
    fn from_iter<I: IntoIterator<Item = MethodMatch>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: u32, cost: f64) -> MethodMatch {
        MethodMatch {
            method: SymbolId::new(id),
            cost,
            return_compatible: true,
        }
    }

    #[test]
    fn cheapest_wins() {
        let result: MethodSearchResult = [hit(1, 0.5), hit(2, 0.0)].into_iter().collect();
        assert_eq!(result.outcome(), MatchOutcome::Resolved(SymbolId::new(2)));
    }

    #[test]
    fn ties_are_ambiguous_in_any_order() {
        let forward: MethodSearchResult = [hit(4, 0.05), hit(2, 0.0502)].into_iter().collect();
        let backward: MethodSearchResult = [hit(2, 0.0502), hit(4, 0.05)].into_iter().collect();

        let expected = MatchOutcome::Ambiguous(vec![SymbolId::new(2), SymbolId::new(4)]);
        assert_eq!(forward.outcome(), expected);
        assert_eq!(backward.outcome(), expected);
    }

    #[test]
    fn return_type_breaks_ties() {
        let mut other = hit(3, 0.0);
        other.return_compatible = false;
        let result: MethodSearchResult = [other, hit(5, 0.0)].into_iter().collect();

        assert_eq!(result.outcome(), MatchOutcome::Resolved(SymbolId::new(5)));
    }

    #[test]
    fn inner_scope_wins_ties() {
        let outer: MethodSearchResult = [hit(1, 0.0), hit(2, 0.5)].into_iter().collect();
        let inner: MethodSearchResult = [hit(3, 0.0)].into_iter().collect();

        let merged = outer.overridden_by(inner);
        assert_eq!(merged.outcome(), MatchOutcome::Resolved(SymbolId::new(3)));
        assert_eq!(merged.matches().len(), 1);
    }

    #[test]
    fn strictly_better_outer_match_survives() {
        let outer: MethodSearchResult = [hit(1, 0.0)].into_iter().collect();
        let inner: MethodSearchResult = [hit(3, 0.5)].into_iter().collect();

        let merged = outer.overridden_by(inner);
        assert_eq!(merged.outcome(), MatchOutcome::Resolved(SymbolId::new(1)));
    }

    #[test]
    fn nothing_matched() {
        assert_eq!(MethodSearchResult::default().outcome(), MatchOutcome::Unresolved);
    }
}
