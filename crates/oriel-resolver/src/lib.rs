//! The multi-pass resolution of a [`Workspace`] into one shared symbol space.
//!
//! Resolution runs three passes over every unit:
//!
//! 1. *definition* declares every symbol in a table of the unit's own and
//!    merges it into the shared [`Program`];
//! 2. *explicit types* resolves what the source spells out: supers, traits,
//!    constraint bases, declared types and parameterizations;
//! 3. *inferred types* types the remaining variables from their initializers
//!    and binds every call to its target.
//!
//! What a pass learns about a node is recorded in the unit's [`UnitRecords`]
//! and picked up by the passes after it. See [`resolve`] for the entry point.

mod define;
mod explicit;
mod inferred;

pub mod coordinator;
pub mod options;
pub mod program;
pub mod records;
pub mod workspace;

#[cfg(test)]
mod test;

pub use coordinator::{Coordinator, Pass, ResolveOutput, UnitResolution, resolve};
pub use define::genus_of;
pub use options::ResolveOptions;
pub use program::Program;
pub use records::UnitRecords;
pub use workspace::{CompilationUnit, Workspace};

pub mod prelude {
    pub use crate::coordinator::{ResolveOutput, resolve};
    pub use crate::options::ResolveOptions;
    pub use crate::workspace::Workspace;
}
