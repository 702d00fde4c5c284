use oriel_span::{Loc, SourceId, Span};
use oriel_utils::convert::TryAsRef;
use std::sync::Arc;

use crate::{
    id::Id,
    node::{Module, Node},
};

pub trait TreeAccess {
    fn node<T>(&self, id: Id<T>) -> &T
    where
        Node: TryAsRef<T>;

    fn loc<T>(&self, id: Id<T>) -> Loc;
}

fn cast<T>(node: &Node, index: usize) -> &T
where
    Node: TryAsRef<T>,
{
    match node.try_as_ref() {
        Some(node) => node,
        None => panic!(
            "node {index} is a {:?}, not a {}",
            node.kind(),
            std::any::type_name::<T>()
        ),
    }
}

/// Appends nodes in the order a parser would produce them, stamping each with
/// the current position.
#[derive(Debug)]
pub struct TreeBuilder {
    source: SourceId,
    nodes: Vec<Node>,
    locs: Vec<Loc>,
    cursor: Loc,
}

impl TreeAccess for TreeBuilder {
    fn node<T>(&self, id: Id<T>) -> &T
    where
        Node: TryAsRef<T>,
    {
        cast(&self.nodes[id.as_usize()], id.as_usize())
    }

    fn loc<T>(&self, id: Id<T>) -> Loc {
        self.locs[id.as_usize()]
    }
}

impl TreeBuilder {
    pub fn new(source: SourceId) -> Self {
        Self {
            source,
            nodes: Vec::new(),
            locs: Vec::new(),
            cursor: Loc::new(source, 1, 1),
        }
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    /// Moves the cursor; nodes inserted afterwards are located at `line:column`.
    pub fn at(&mut self, line: u32, column: u32) -> &mut Self {
        self.cursor = Loc::new(self.source, line, column);
        self
    }

    pub fn at_span(&mut self, line: u32, column: u32, span: Span) -> &mut Self {
        self.cursor = Loc::new(self.source, line, column).with_span(span);
        self
    }

    pub fn insert<T>(&mut self, node: T) -> Id<T>
    where
        Node: From<T>,
    {
        let id = u32::try_from(self.nodes.len()).unwrap_or(u32::MAX);

        self.nodes.push(node.into());
        self.locs.push(self.cursor);

        Id::new(id)
    }

    pub fn finish(self, root: Id<Module>) -> Tree {
        let Self {
            source,
            nodes,
            locs,
            ..
        } = self;

        Tree {
            source,
            nodes: Arc::from(nodes),
            locs: Arc::from(locs),
            root,
        }
    }
}

/// A finished, immutable parse tree. Cloning is cheap and the tree can be
/// shared between worker threads.
#[derive(Debug, Clone)]
pub struct Tree {
    source: SourceId,
    nodes: Arc<[Node]>,
    locs: Arc<[Loc]>,
    root: Id<Module>,
}

impl TreeAccess for Tree {
    fn node<T>(&self, id: Id<T>) -> &T
    where
        Node: TryAsRef<T>,
    {
        cast(&self.nodes[id.as_usize()], id.as_usize())
    }

    fn loc<T>(&self, id: Id<T>) -> Loc {
        self.locs[id.as_usize()]
    }
}

impl Tree {
    pub fn source(&self) -> SourceId {
        self.source
    }

    pub fn root_id(&self) -> Id<Module> {
        self.root
    }

    pub fn root(&self) -> &Module {
        self.node(self.root)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        map::NodeMap,
        node::{AggregateDecl, Decl, TypeExpr},
    };

    #[test]
    fn nodes_keep_their_location() {
        let mut builder = TreeBuilder::new(SourceId::new(4));

        builder.at(3, 5);
        let ty = builder.insert(TypeExpr::named("Integer"));
        builder.at(1, 1);
        let class = builder.insert(AggregateDecl::class("Counter").with_extends(ty));
        let root = builder.insert(Module {
            namespace: "demo".into(),
            decls: vec![Decl::Aggregate(class)],
        });

        let tree = builder.finish(root);

        assert_eq!(tree.node(ty).name, "Integer");
        assert_eq!(tree.loc(ty).line, 3);
        assert_eq!(tree.loc(ty).column, 5);
        assert_eq!(tree.loc(class).source, SourceId::new(4));
        assert_eq!(tree.root().namespace, "demo");
    }

    #[test]
    fn records_survive_between_walks() {
        let mut builder = TreeBuilder::new(SourceId::new(0));
        let ty = builder.insert(TypeExpr::named("Float"));
        let other = builder.insert(TypeExpr::named("String"));

        let mut map = NodeMap::new();
        map.insert(ty, 7u32);

        assert_eq!(map.copied(ty), Some(7));
        assert_eq!(map.copied(other), None);
        assert!(map.contains(ty));
    }
}
