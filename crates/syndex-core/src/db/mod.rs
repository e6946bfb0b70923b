pub mod index;
pub mod query;
pub mod store;
pub mod sync;
pub mod txn;

use crate::{
    db::{
        index::{DeclareOutcome, IndexRegistry},
        query::{FindQuery, Predicate},
        store::{Record, RecordId, RecordStore},
        txn::RecordOp,
    },
    error::{ErrorClass, ErrorOrigin, InternalError},
    model::TypeModel,
    obs::sink::{self, MetricsEvent, PlanKind},
    value::Value,
};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

///
/// Db
///
/// Root handle over the registered record types. Each type owns its record
/// store and index registry; transaction contexts resolve their staged
/// targets through this handle at commit time.
///

#[derive(Debug, Default)]
pub struct Db {
    types: RwLock<BTreeMap<String, Arc<TypeStore>>>,
}

impl Db {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            types: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register a record type. Registering the same name twice is rejected.
    pub fn register_type(&self, model: TypeModel) -> Result<Arc<TypeStore>, InternalError> {
        let mut types = self.write_types();

        if types.contains_key(&model.name) {
            return Err(InternalError::new(
                ErrorClass::InvariantViolation,
                ErrorOrigin::Store,
                format!("record type '{}' already registered", model.name),
            ));
        }

        let store = Arc::new(TypeStore::new(model));
        types.insert(store.model().name.clone(), Arc::clone(&store));

        Ok(store)
    }

    #[must_use]
    pub fn type_store(&self, name: &str) -> Option<Arc<TypeStore>> {
        self.read_types().get(name).cloned()
    }

    pub fn try_type_store(&self, name: &str) -> Result<Arc<TypeStore>, InternalError> {
        self.type_store(name)
            .ok_or_else(|| InternalError::unknown_type(name))
    }

    fn read_types(&self) -> RwLockReadGuard<'_, BTreeMap<String, Arc<TypeStore>>> {
        self.types.read().expect("type registry lock poisoned")
    }

    fn write_types(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Arc<TypeStore>>> {
        self.types.write().expect("type registry lock poisoned")
    }
}

///
/// TypeStore
///
/// Committed records plus the index registry for one record type.
///

#[derive(Debug)]
pub struct TypeStore {
    model: TypeModel,
    records: RwLock<RecordStore>,
    indexes: IndexRegistry,
}

impl TypeStore {
    pub(crate) const fn new(model: TypeModel) -> Self {
        Self {
            model,
            records: RwLock::new(RecordStore::new()),
            indexes: IndexRegistry::new(),
        }
    }

    #[must_use]
    pub const fn model(&self) -> &TypeModel {
        &self.model
    }

    #[must_use]
    pub const fn indexes(&self) -> &IndexRegistry {
        &self.indexes
    }

    /// Register an index on a declared property.
    ///
    /// Idempotent for an identical declaration. A new or replaced index is
    /// rebuilt from live records so it immediately reflects committed state.
    pub fn declare_index(&self, property: &str, tokenized: bool) -> Result<(), InternalError> {
        if !self.model.declares(property) {
            return Err(InternalError::schema_unsupported(format!(
                "cannot index undeclared property '{property}' on '{}'",
                self.model.name
            )));
        }

        let model = crate::model::IndexModel::new(&self.model.name, property, tokenized)?;
        match self.indexes.declare(model) {
            DeclareOutcome::Unchanged => {}
            DeclareOutcome::Created(index) | DeclareOutcome::Replaced(index) => {
                let records = self.read_records();
                index.rebuild(records.live());
            }
        }

        Ok(())
    }

    /// Unregister a property's index. Subsequent finds on it return empty.
    pub fn remove_index(&self, property: &str) {
        self.indexes.remove(property);
    }

    /// Re-derive every declared index from current live records.
    pub fn rebuild_indexes(&self) {
        let records = self.read_records();
        for index in self.indexes.declared() {
            index.rebuild(records.live());
        }
    }

    /// Look up identities by property value.
    ///
    /// An undeclared property is not an error; it simply finds nothing.
    #[must_use]
    pub fn find(&self, property: &str, value: &Value) -> BTreeSet<RecordId> {
        match self.indexes.get(property) {
            Some(index) => {
                sink::record(MetricsEvent::Plan {
                    kind: PlanKind::Index,
                });
                index.find(value)
            }
            None => BTreeSet::new(),
        }
    }

    /// AND-combined equality constraints, served from indexes only.
    #[must_use]
    pub fn find_all(&self, query: &FindQuery) -> BTreeSet<RecordId> {
        query::find_all(self, query)
    }

    /// Predicate-tree query: indexed equality clauses are served from
    /// indexes, the residual by scanning live records.
    #[must_use]
    pub fn find_where(&self, predicate: &Predicate) -> BTreeSet<RecordId> {
        query::find_where(self, predicate)
    }

    /// Clone the committed record for an identity, if present.
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<Record> {
        self.read_records().get(&id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read_records().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_records().is_empty()
    }

    pub(crate) fn apply_record_op(&self, op: RecordOp) {
        let mut records = self.write_records();
        match op {
            RecordOp::Put { record, .. } => {
                debug_assert!(
                    !record.is_deleted(),
                    "deleted records are staged as Delete, never Put"
                );
                records.insert(record.id(), record);
            }
            RecordOp::Delete { id, .. } => {
                records.remove(&id);
            }
        }
    }

    pub(crate) fn with_records<R>(&self, f: impl FnOnce(&RecordStore) -> R) -> R {
        f(&self.read_records())
    }

    fn read_records(&self) -> RwLockReadGuard<'_, RecordStore> {
        self.records.read().expect("record store lock poisoned")
    }

    fn write_records(&self) -> RwLockWriteGuard<'_, RecordStore> {
        self.records.write().expect("record store lock poisoned")
    }
}
