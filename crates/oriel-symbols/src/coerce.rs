use ecow::EcoString;
use std::collections::HashSet;

use crate::builtins::CORE_NAMESPACE;
use oriel_utils::naming::make_qualified;

/// Implicit conversions between types, by fully qualified name.
#[derive(Debug, Clone, Default)]
pub struct Coercions {
    pairs: HashSet<(EcoString, EcoString)>,
}

impl Coercions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Integer widens to Float and Character to String.
    pub fn core() -> Self {
        let mut coercions = Self::new();
        for (from, to) in [("Integer", "Float"), ("Character", "String")] {
            coercions.allow(
                make_qualified(CORE_NAMESPACE, from),
                make_qualified(CORE_NAMESPACE, to),
            );
        }
        coercions
    }

    pub fn allow(&mut self, from: impl Into<EcoString>, to: impl Into<EcoString>) {
        self.pairs.insert((from.into(), to.into()));
    }

    pub fn is_coercible(&self, from: &str, to: &str) -> bool {
        self.pairs.contains(&(EcoString::from(from), EcoString::from(to)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_coercions_are_one_way() {
        let coercions = Coercions::core();

        assert!(coercions.is_coercible("core::Integer", "core::Float"));
        assert!(!coercions.is_coercible("core::Float", "core::Integer"));
        assert!(coercions.is_coercible("core::Character", "core::String"));
    }
}
