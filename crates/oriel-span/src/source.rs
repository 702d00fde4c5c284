use ariadne::Cache;
use camino::{Utf8Path, Utf8PathBuf};
use oriel_utils::define_id;
use std::{collections::HashMap, fmt, sync::Arc};

define_id!(SourceId);

/// A source file registered with the [`SourceManager`].
#[derive(Debug, Clone)]
pub struct Source {
    pub path: Utf8PathBuf,
    pub text: ariadne::Source<Arc<str>>,
}

/// Hands out stable [`SourceId`]s for paths. Registering the same path twice
/// returns the id it got the first time.
#[derive(Debug, Clone, Default)]
pub struct SourceManager {
    sources: Vec<Source>,
    lookup: HashMap<Utf8PathBuf, SourceId>,
}

impl SourceManager {
    pub const EXTENSION: &'static str = "ori";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl AsRef<Utf8Path>, text: impl Into<Arc<str>>) -> SourceId {
        let path = path.as_ref();

        if let Some(&id) = self.lookup.get(path) {
            return id;
        }

        let id = SourceId::from_usize(self.sources.len());
        self.sources.push(Source {
            path: path.to_owned(),
            text: ariadne::Source::from(text.into()),
        });
        self.lookup.insert(path.to_owned(), id);
        id
    }

    pub fn lookup(&self, path: &Utf8Path) -> Option<SourceId> {
        self.lookup.get(path).copied()
    }

    pub fn get(&self, id: SourceId) -> Option<&Source> {
        self.sources.get(id.as_usize())
    }

    pub fn path(&self, id: SourceId) -> Option<&Utf8Path> {
        self.get(id).map(|source| source.path.as_path())
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = SourceId> + '_ {
        (0..self.sources.len()).map(SourceId::from_usize)
    }
}

impl Cache<SourceId> for &SourceManager {
    type Storage = Arc<str>;

    fn fetch(&mut self, id: &SourceId) -> Result<&ariadne::Source<Arc<str>>, impl fmt::Debug> {
        self.get(*id).map(|source| &source.text).ok_or("unknown source")
    }

    fn display<'a>(&self, id: &'a SourceId) -> Option<impl fmt::Display + 'a> {
        self.path(*id).map(Utf8Path::to_owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent() {
        let mut manager = SourceManager::new();

        let a = manager.insert("/work/a.ori", "module a");
        let b = manager.insert("/work/b.ori", "module b");
        let again = manager.insert("/work/a.ori", "ignored");

        assert_ne!(a, b);
        assert_eq!(a, again);
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.get(a).unwrap().text.text(), "module a");
        assert_eq!(manager.path(b), Some(Utf8Path::new("/work/b.ori")));
    }
}
