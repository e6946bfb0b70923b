use crate::{db::index::Index, model::IndexModel};
use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

///
/// DeclareOutcome
///
/// What `declare` did. `Created` and `Replaced` carry the index that now
/// needs a rebuild from live records; `Unchanged` needs nothing.
///

#[derive(Clone, Debug)]
pub enum DeclareOutcome {
    Created(Arc<Index>),
    Replaced(Arc<Index>),
    Unchanged,
}

///
/// IndexRegistry
///
/// Per-type registry owning one shared `Index` per declared indexed
/// property. Records reference these through `Arc`; the registry is the
/// only place indexes are created or dropped.
///

#[derive(Debug, Default)]
pub struct IndexRegistry {
    indexes: RwLock<BTreeMap<String, Arc<Index>>>,
}

impl IndexRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            indexes: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register an index for a property.
    ///
    /// Idempotent when the declaration is identical; a changed `tokenized`
    /// flag replaces the index with a fresh one (the caller rebuilds it).
    pub fn declare(&self, model: IndexModel) -> DeclareOutcome {
        let mut indexes = self.write_indexes();

        if let Some(existing) = indexes.get(&model.property) {
            if existing.model() == &model {
                return DeclareOutcome::Unchanged;
            }

            let replacement = Arc::new(Index::new(model.clone()));
            indexes.insert(model.property, Arc::clone(&replacement));
            return DeclareOutcome::Replaced(replacement);
        }

        let created = Arc::new(Index::new(model.clone()));
        indexes.insert(model.property, Arc::clone(&created));
        DeclareOutcome::Created(created)
    }

    /// Unregister the index for a property and drop its entries.
    /// Subsequent finds on the property return empty.
    pub fn remove(&self, property: &str) -> Option<Arc<Index>> {
        let removed = self.write_indexes().remove(property);
        if let Some(index) = &removed {
            index.drop_entries();
        }

        removed
    }

    #[must_use]
    pub fn get(&self, property: &str) -> Option<Arc<Index>> {
        self.read_indexes().get(property).cloned()
    }

    #[must_use]
    pub fn is_declared(&self, property: &str) -> bool {
        self.read_indexes().contains_key(property)
    }

    /// Snapshot the declared indexes, in property order.
    #[must_use]
    pub fn declared(&self) -> Vec<Arc<Index>> {
        self.read_indexes().values().cloned().collect()
    }

    fn read_indexes(&self) -> RwLockReadGuard<'_, BTreeMap<String, Arc<Index>>> {
        self.indexes
            .read()
            .expect("index registry lock poisoned")
    }

    fn write_indexes(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Arc<Index>>> {
        self.indexes
            .write()
            .expect("index registry lock poisoned")
    }
}
