//! Symbols, scopes and the queries the resolver asks of them.
//!
//! Important concepts in this crate include:
//!
//! - the [`SymbolTable`], an append-only arena of [`Symbol`]s and [`Scope`]s
//!   that refer to one another by id;
//! - lexical and inherited name resolution, see [`SymbolTable::resolve`];
//! - cost based overload matching, see [`matcher`];
//! - generic instantiation and constrained types, see [`generics`] and
//!   [`constrain`].

pub mod annotations;
pub mod builtins;
pub mod coerce;
pub mod constrain;
pub mod error;
pub mod generics;
pub mod hierarchy;
pub mod matcher;
pub mod operators;
pub mod rebase;
pub mod scope;
pub mod search;
pub mod symbol;
pub mod synth;
pub mod table;


pub use annotations::Annotations;
pub use builtins::{CORE_NAMESPACE, CoreType, CoreTypes};
pub use error::{CompilerError, ErrorKind, SemanticError, SymbolError};
pub use generics::ParameterizedKey;
pub use matcher::MatchWeights;
pub use rebase::Rebase;
pub use scope::{Scope, ScopeId, ScopeKind};
pub use search::{MatchOutcome, MethodSearch, MethodSearchResult, SymbolSearch};
pub use symbol::{Category, Genus, Symbol, SymbolId, SymbolKind};
pub use table::{Absorbed, MethodSpec, SymbolTable};
