//! The parse structure the semantic passes walk.
//!
//! Parsing itself happens elsewhere; this crate only fixes the shape of the
//! result. Nodes live in a flat arena per source and are addressed by typed
//! [`Id`]s, which stay stable for as long as the [`Tree`] lives. Passes hang
//! their results off nodes through a [`NodeMap`].

pub mod id;
pub mod map;
pub mod node;
pub mod tree;

pub mod prelude {
    pub use crate::id::Id;
    pub use crate::map::NodeMap;
    pub use crate::node::{self, Node, NodeKind};
    pub use crate::tree::{Tree, TreeAccess, TreeBuilder};
}
