use crate::{Error, transaction::Transaction};
use std::{collections::BTreeSet, sync::Arc};
use syndex_core::{
    db::{
        TypeStore,
        query::{FindQuery, Predicate},
        store::{Record, RecordId},
        sync::Synchronizer,
        txn::RecordOp,
    },
    error::{ErrorClass, ErrorOrigin, InternalError},
    value::Value,
};

///
/// Handle
///
/// Typed surface for one record type. Mutations go through a transaction
/// and stage their index deltas via the synchronizer; reads see committed
/// state only.
///

#[derive(Clone)]
pub struct Handle {
    store: Arc<TypeStore>,
}

impl Handle {
    pub(crate) const fn new(store: Arc<TypeStore>) -> Self {
        Self { store }
    }

    /// Create a record with the given properties inside a transaction.
    ///
    /// The returned record value is the caller's working copy; it only
    /// becomes findable once the transaction commits.
    pub fn create(
        &self,
        tx: &mut Transaction<'_>,
        props: &[(&str, Value)],
    ) -> Result<Record, Error> {
        let mut record = Record::new(RecordId::generate());
        for (property, value) in props {
            self.ensure_declared(property)?;
            record.set_property(*property, value.clone());
        }

        Synchronizer::new(&self.store).on_create(tx.ctx_mut(), &record)?;
        tx.ctx_mut().stage_record(RecordOp::Put {
            type_name: self.store.model().name.clone(),
            record: record.clone(),
        })?;

        Ok(record)
    }

    /// Change one property inside a transaction, re-indexing as needed.
    pub fn set(
        &self,
        tx: &mut Transaction<'_>,
        record: &mut Record,
        property: &str,
        value: Value,
    ) -> Result<(), Error> {
        self.ensure_declared(property)?;

        let old = record.property(property).cloned();
        Synchronizer::new(&self.store).on_property_change(
            tx.ctx_mut(),
            record.id(),
            property,
            old.as_ref(),
            Some(&value),
        )?;
        record.set_property(property, value);
        tx.ctx_mut().stage_record(RecordOp::Put {
            type_name: self.store.model().name.clone(),
            record: record.clone(),
        })?;

        Ok(())
    }

    /// Delete a record inside a transaction. Once the transaction commits,
    /// no `find` can reach it.
    pub fn delete(&self, tx: &mut Transaction<'_>, record: &mut Record) -> Result<(), Error> {
        Synchronizer::new(&self.store).on_delete(tx.ctx_mut(), record)?;
        tx.ctx_mut().stage_record(RecordOp::Delete {
            type_name: self.store.model().name.clone(),
            id: record.id(),
        })?;

        Ok(())
    }

    /// Find committed records by property value. An undeclared or unindexed
    /// property finds nothing.
    #[must_use]
    pub fn find(&self, property: &str, value: &Value) -> Vec<Record> {
        self.resolve(self.store.find(property, value))
    }

    /// Find committed records matching every equality constraint.
    #[must_use]
    pub fn find_all(&self, query: &FindQuery) -> Vec<Record> {
        self.resolve(self.store.find_all(query))
    }

    /// Find committed records matching a predicate tree.
    #[must_use]
    pub fn find_where(&self, predicate: &Predicate) -> Vec<Record> {
        self.resolve(self.store.find_where(predicate))
    }

    /// Clone the committed record for an identity, if present.
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<Record> {
        self.store.get(id)
    }

    /// Register (or re-register) an index on a declared property.
    pub fn declare_index(&self, property: &str, tokenized: bool) -> Result<(), Error> {
        self.store.declare_index(property, tokenized)?;
        Ok(())
    }

    /// Unregister a property's index; subsequent finds on it return empty.
    pub fn remove_index(&self, property: &str) {
        self.store.remove_index(property);
    }

    /// Re-derive every declared index from current live records.
    pub fn rebuild_indexes(&self) {
        self.store.rebuild_indexes();
    }

    fn resolve(&self, ids: BTreeSet<RecordId>) -> Vec<Record> {
        ids.into_iter().filter_map(|id| self.store.get(id)).collect()
    }

    fn ensure_declared(&self, property: &str) -> Result<(), Error> {
        if self.store.model().declares(property) {
            return Ok(());
        }

        Err(InternalError::new(
            ErrorClass::Unsupported,
            ErrorOrigin::Schema,
            format!(
                "undeclared property '{property}' on '{}'",
                self.store.model().name
            ),
        )
        .into())
    }
}
