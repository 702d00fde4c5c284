//! Source positions and diagnostics.
//!
//! Important concepts in this module include:
//!
//! - the *location*, represented by [`Loc`], which pins a construct to a
//!   source, a byte span and a line/column pair;
//! - the per-source [`Report`] that collects [`Diagnostic`]s while a pass runs.

mod diag;
mod loc;
mod source;
mod span;

pub use diag::{Diagnostic, IntoDiagnostic, Report, Severity};
pub use loc::{Loc, Located};
pub use source::{Source, SourceId, SourceManager};
pub use span::Span;
