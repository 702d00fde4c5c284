//! Small building blocks shared by every oriel crate.

pub mod convert;
pub mod id;
pub mod naming;
