use ecow::{EcoString, eco_format};

use crate::{
    builtins::CoreType,
    error::SemanticError,
    symbol::SymbolId,
    table::SymbolTable,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arity {
    Zero,
    One,
    ZeroOrOne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Returns {
    Core(CoreType),
    Something,
    Nothing,
    Unchecked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Purity {
    Pure,
    Impure,
    Either,
}

/// What an operator of a given name has to look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Contract {
    arity: Arity,
    returns: Returns,
    purity: Purity,
}

const fn contract(arity: Arity, returns: Returns, purity: Purity) -> Contract {
    Contract {
        arity,
        returns,
        purity,
    }
}

fn contract_of(operator: &str) -> Option<Contract> {
    use Arity::*;
    use Purity::*;
    use Returns::*;

    let contract = match operator {
        "<" | "<=" | ">" | ">=" | "==" | "<>" => contract(One, Core(CoreType::Boolean), Pure),
        "<=>" | "<~>" => contract(One, Core(CoreType::Integer), Pure),
        "?" | "empty" => contract(Zero, Core(CoreType::Boolean), Pure),
        "#?" | "length" => contract(Zero, Core(CoreType::Integer), Pure),
        "$" => contract(Zero, Core(CoreType::String), Pure),
        "$$" => contract(Zero, Core(CoreType::Json), Pure),
        "#<" | "#>" => contract(Zero, Something, Pure),
        "contains" | "matches" => contract(One, Core(CoreType::Boolean), Pure),
        "mod" | "rem" => contract(One, Core(CoreType::Integer), Pure),
        "abs" | "~" | "!" | "sqrt" => contract(Zero, Something, Pure),
        "+" | "*" | "/" | "^" | ">>" | "<<" | "and" | "or" | "xor" => {
            contract(One, Something, Pure)
        }
        "-" => contract(ZeroOrOne, Unchecked, Pure),
        "close" => contract(Zero, Nothing, Either),
        ":~:" | ":^:" | ":=:" | "|" | "+=" | "-=" | "*=" | "/=" => contract(One, Nothing, Impure),
        "++" | "--" => contract(Zero, Something, Impure),
        _ => return None,
    };
    Some(contract)
}

impl SymbolTable {
    /// Checks an operator method against the contract for its name.
    pub fn check_operator(&self, method: SymbolId) -> Vec<SemanticError> {
        let symbol = self.symbol(method);
        let name = symbol.name.clone();
        let loc = symbol.loc;
        let error = |reason: EcoString| SemanticError::OperatorSignature {
            operator: name.clone(),
            reason,
            loc,
        };

        let Some(contract) = contract_of(&name) else {
            let reason = match name.as_str() {
                "!=" => "is not an operator, use `<>`".into(),
                "not" => "is not an operator, use `~`".into(),
                _ => "is not a known operator".into(),
            };
            return vec![error(reason)];
        };
        let Some((params, returning)) = symbol.signature() else {
            return vec![error("must be declared as a method".into())];
        };

        let mut errors = Vec::new();

        let arity_ok = match contract.arity {
            Arity::Zero => params.is_empty(),
            Arity::One => params.len() == 1,
            Arity::ZeroOrOne => params.len() <= 1,
        };
        if !arity_ok {
            let expected = match contract.arity {
                Arity::Zero => "no arguments",
                Arity::One => "exactly one argument",
                Arity::ZeroOrOne => "at most one argument",
            };
            errors.push(error(eco_format!(
                "takes {expected}, found {}",
                params.len()
            )));
        }

        let returned = returning.and_then(|r| self.type_of(r));
        match contract.returns {
            Returns::Core(expected) => {
                let expected_id = self.core().map(|core| core.get(expected));
                let matches = match (returned, expected_id) {
                    (Some(actual), Some(expected_id)) => {
                        self.is_exact_same_type(actual, expected_id)
                    }
                    (Some(_), None) => true,
                    (None, _) => false,
                };
                if !matches {
                    errors.push(error(eco_format!("must return {}", expected.name())));
                }
            }
            Returns::Something if returning.is_none() => {
                errors.push(error("must return a value".into()));
            }
            Returns::Nothing if returning.is_some() => {
                errors.push(error("must not return a value".into()));
            }
            _ => {}
        }

        let pure = symbol.flags.pure;
        match contract.purity {
            Purity::Pure if !pure => errors.push(error("must be pure".into())),
            Purity::Impure if pure => errors.push(error("must not be pure".into())),
            _ => {}
        }

        errors
    }
}
