//! Live instances a field reads from and writes to.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Instance or id-addressable collection behind a field.
///
/// Targets are shared handles: cloning a target never copies the entities.
pub enum Target<T> {
    /// One object. Every id resolves to it.
    Single(Arc<RwLock<T>>),
    /// Positional collection where the id is the index.
    Collection(Arc<RwLock<Vec<T>>>),
    /// Collection keyed by arbitrary ids.
    Keyed(Arc<RwLock<BTreeMap<i64, T>>>),
}

impl<T> Clone for Target<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Single(item) => Self::Single(Arc::clone(item)),
            Self::Collection(items) => Self::Collection(Arc::clone(items)),
            Self::Keyed(items) => Self::Keyed(Arc::clone(items)),
        }
    }
}

impl<T> Target<T> {
    pub fn single(item: T) -> Self {
        Self::Single(Arc::new(RwLock::new(item)))
    }

    pub fn collection(items: Vec<T>) -> Self {
        Self::Collection(Arc::new(RwLock::new(items)))
    }

    pub fn keyed(items: BTreeMap<i64, T>) -> Self {
        Self::Keyed(Arc::new(RwLock::new(items)))
    }

    /// Ids addressable through this target, in ascending order.
    pub fn ids(&self) -> Vec<i64> {
        match self {
            Self::Single(_) => vec![0],
            Self::Collection(items) => (0..items.read().len() as i64).collect(),
            Self::Keyed(items) => items.read().keys().copied().collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Collection(items) => items.read().len(),
            Self::Keyed(items) => items.read().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs `read` against the instance addressed by `id`.
    ///
    /// Returns `None` when no instance has that id.
    pub fn with_ref<R>(&self, id: i64, read: impl FnOnce(&T) -> R) -> Option<R> {
        match self {
            Self::Single(item) => Some(read(&*item.read())),
            Self::Collection(items) => {
                let position = usize::try_from(id).ok()?;
                items.read().get(position).map(read)
            }
            Self::Keyed(items) => items.read().get(&id).map(read),
        }
    }

    /// Runs `write` against the instance addressed by `id`.
    pub fn with_mut<R>(&self, id: i64, write: impl FnOnce(&mut T) -> R) -> Option<R> {
        match self {
            Self::Single(item) => Some(write(&mut *item.write())),
            Self::Collection(items) => {
                let position = usize::try_from(id).ok()?;
                items.write().get_mut(position).map(write)
            }
            Self::Keyed(items) => items.write().get_mut(&id).map(write),
        }
    }
}
