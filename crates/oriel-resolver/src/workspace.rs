use indexmap::IndexMap;
use oriel_span::SourceId;
use oriel_tree::prelude::*;

/// One parsed source file.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    pub tree: Tree,
}

impl CompilationUnit {
    pub fn new(tree: Tree) -> Self {
        Self { tree }
    }

    pub fn source(&self) -> SourceId {
        self.tree.source()
    }

    pub fn namespace(&self) -> &str {
        &self.tree.root().namespace
    }
}

/// Every unit of a run, in the order they were added. Unit order decides
/// the order of serial steps, so it is kept stable.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    units: IndexMap<SourceId, CompilationUnit>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `tree`, replacing a unit of the same source.
    pub fn insert(&mut self, tree: Tree) {
        self.units.insert(tree.source(), CompilationUnit::new(tree));
    }

    pub fn get(&self, source: SourceId) -> Option<&CompilationUnit> {
        self.units.get(&source)
    }

    pub fn units(&self) -> impl Iterator<Item = &CompilationUnit> {
        self.units.values()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl FromIterator<Tree> for Workspace {
    fn from_iter<I: IntoIterator<Item = Tree>>(iter: I) -> Self {
        let mut workspace = Self::new();
        for tree in iter {
            workspace.insert(tree);
        }
        workspace
    }
}
