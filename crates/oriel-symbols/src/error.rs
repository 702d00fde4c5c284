use derive_more::Display;
use ecow::EcoString;
use oriel_span::{Diagnostic, IntoDiagnostic, Loc, SourceId};
use thiserror::Error;

use crate::symbol::{Category, SymbolId};

/// Kinds of semantic errors, as seen by whoever reports them.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnresolvedReference,
    AmbiguousReference,
    IllegalHierarchy,
    SignatureViolation,
    DuplicateDefinition,
}

impl ErrorKind {
    pub const fn code(self) -> &'static str {
        match self {
            Self::UnresolvedReference => "unresolved-reference",
            Self::AmbiguousReference => "ambiguous-reference",
            Self::IllegalHierarchy => "illegal-hierarchy",
            Self::SignatureViolation => "signature-violation",
            Self::DuplicateDefinition => "duplicate-definition",
        }
    }
}

/// A problem in the program being compiled. These are reported against the
/// source they were found in and never stop a pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    #[error("{category} `{name}` could not be resolved")]
    Unresolved {
        name: EcoString,
        category: Category,
        loc: Loc,
    },
    #[error("`{name}({args})` could not be resolved")]
    UnresolvedCall {
        name: EcoString,
        args: String,
        loc: Loc,
    },
    #[error("`{name}({args})` is ambiguous between {candidates}")]
    Ambiguous {
        name: EcoString,
        args: String,
        candidates: String,
        loc: Loc,
    },
    #[error("`{name}` cannot extend `{parent}`, the hierarchy would become circular")]
    CircularHierarchy {
        name: EcoString,
        parent: EcoString,
        loc: Loc,
    },
    #[error("`{name}` cannot extend `{parent}`: {reason}")]
    IllegalSuper {
        name: EcoString,
        parent: EcoString,
        reason: EcoString,
        loc: Loc,
    },
    #[error("`{name}` cannot use `{trait_name}` as a trait: {reason}")]
    IllegalTrait {
        name: EcoString,
        trait_name: EcoString,
        reason: EcoString,
        loc: Loc,
    },
    #[error("trait `{trait_name}` is listed more than once by `{name}`")]
    DuplicateTrait {
        name: EcoString,
        trait_name: EcoString,
        loc: Loc,
    },
    #[error("`{name}` cannot constrain `{base}`: {reason}")]
    CannotConstrain {
        name: EcoString,
        base: EcoString,
        reason: EcoString,
        loc: Loc,
    },
    #[error("`{name}` is not generic and cannot be parameterized")]
    NotGeneric { name: EcoString, loc: Loc },
    #[error("`{name}` expects {expected} type argument(s), found {found}")]
    GenericArity {
        name: EcoString,
        expected: usize,
        found: usize,
        loc: Loc,
    },
    #[error("generic type `{name}` needs type arguments here")]
    TemplateNeedsArguments { name: EcoString, loc: Loc },
    #[error("`{arg}` cannot be a type argument of `{name}`")]
    InvalidTypeArgument {
        name: EcoString,
        arg: EcoString,
        loc: Loc,
    },
    #[error("operator `{operator}` {reason}")]
    OperatorSignature {
        operator: EcoString,
        reason: EcoString,
        loc: Loc,
    },
    #[error("the type of `{name}` cannot be inferred")]
    NotInferable { name: EcoString, loc: Loc },
    #[error("the type of `{name}` depends on itself")]
    CircularInference { name: EcoString, loc: Loc },
    #[error("{category} `{name}` is already defined")]
    DuplicateDefinition {
        name: EcoString,
        category: Category,
        loc: Loc,
        previous: Loc,
    },
    #[error("`{name}({args})` is already defined")]
    DuplicateMethod {
        name: EcoString,
        args: String,
        loc: Loc,
        previous: Loc,
    },
}

impl SemanticError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unresolved { .. } | Self::UnresolvedCall { .. } => ErrorKind::UnresolvedReference,
            Self::Ambiguous { .. } => ErrorKind::AmbiguousReference,
            Self::CircularHierarchy { .. }
            | Self::IllegalSuper { .. }
            | Self::IllegalTrait { .. }
            | Self::DuplicateTrait { .. }
            | Self::CannotConstrain { .. } => ErrorKind::IllegalHierarchy,
            Self::NotGeneric { .. }
            | Self::GenericArity { .. }
            | Self::TemplateNeedsArguments { .. }
            | Self::InvalidTypeArgument { .. }
            | Self::OperatorSignature { .. }
            | Self::NotInferable { .. }
            | Self::CircularInference { .. } => ErrorKind::SignatureViolation,
            Self::DuplicateDefinition { .. } | Self::DuplicateMethod { .. } => {
                ErrorKind::DuplicateDefinition
            }
        }
    }

    pub fn loc(&self) -> Loc {
        match self {
            Self::Unresolved { loc, .. }
            | Self::UnresolvedCall { loc, .. }
            | Self::Ambiguous { loc, .. }
            | Self::CircularHierarchy { loc, .. }
            | Self::IllegalSuper { loc, .. }
            | Self::IllegalTrait { loc, .. }
            | Self::DuplicateTrait { loc, .. }
            | Self::CannotConstrain { loc, .. }
            | Self::NotGeneric { loc, .. }
            | Self::GenericArity { loc, .. }
            | Self::TemplateNeedsArguments { loc, .. }
            | Self::InvalidTypeArgument { loc, .. }
            | Self::OperatorSignature { loc, .. }
            | Self::NotInferable { loc, .. }
            | Self::CircularInference { loc, .. }
            | Self::DuplicateDefinition { loc, .. }
            | Self::DuplicateMethod { loc, .. } => *loc,
        }
    }

    pub fn source_id(&self) -> SourceId {
        self.loc().source
    }
}

impl IntoDiagnostic for SemanticError {}

impl From<SemanticError> for Diagnostic {
    fn from(error: SemanticError) -> Self {
        let loc = error.loc();
        let code = error.kind().code();

        let trace = match &error {
            SemanticError::DuplicateDefinition { previous, .. }
            | SemanticError::DuplicateMethod { previous, .. } => {
                vec![("first defined here".to_owned(), *previous)]
            }
            _ => Vec::new(),
        };
        let help = match &error {
            SemanticError::NotInferable { .. } | SemanticError::CircularInference { .. } => {
                Some("declare the type explicitly")
            }
            SemanticError::TemplateNeedsArguments { .. } => Some("supply its type arguments"),
            SemanticError::IllegalSuper { .. } => Some("mark the super type as open or abstract"),
            _ => None,
        };

        let mut diagnostic = error.into_diagnostic(loc).with_code(code).with_trace(trace);
        if let Some(help) = help {
            diagnostic = diagnostic.with_help(help);
        }
        diagnostic
    }
}

/// Broken compiler invariants. Unlike [`SemanticError`]s these end the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompilerError {
    #[error("{category} `{name}` was defined twice in scope `{scope}`")]
    DuplicateSymbol {
        name: EcoString,
        category: Category,
        scope: EcoString,
    },
    #[error("making `{parent}` the super of `{name}` creates a cycle")]
    HierarchyCycle { name: EcoString, parent: EcoString },
    #[error("symbol {symbol:?} is not a {expected}")]
    UnexpectedKind {
        symbol: SymbolId,
        expected: &'static str,
    },
    #[error("no {what} was recorded for node {node} of source {unit}")]
    MissingRecord {
        what: &'static str,
        node: usize,
        unit: SourceId,
    },
    #[error("unit table has no module scope")]
    MissingUnitScope,
    #[error("core types have not been bootstrapped")]
    MissingCore,
    #[error("worker resolving {0} panicked")]
    WorkerPanicked(SourceId),
    #[error("invalid match weights: {0}")]
    InvalidWeights(EcoString),
}

/// Either kind of failure, for operations that can hit both.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    #[error(transparent)]
    Semantic(#[from] SemanticError),
    #[error(transparent)]
    Fatal(#[from] CompilerError),
}
