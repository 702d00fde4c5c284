use serde::{Deserialize, Serialize};
use std::{fmt, hash::Hash, marker::PhantomData};

/// Index of a node of type `T` in its tree.
#[derive(Serialize, Deserialize)]
pub struct Id<T> {
    id: u32,
    #[serde(skip)]
    t: PhantomData<fn() -> T>,
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id.eq(&other.id)
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = std::any::type_name::<T>();
        let name = name.rsplit("::").next().unwrap_or(name);
        write!(f, "Id<{name}>({})", self.id)
    }
}

impl<T> Id<T> {
    pub(crate) fn new(id: u32) -> Self {
        Self {
            id,
            t: PhantomData,
        }
    }

    pub fn as_usize(&self) -> usize {
        self.id as usize
    }
}
