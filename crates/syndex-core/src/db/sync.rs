use crate::{
    db::{
        TypeStore,
        store::{Record, RecordId},
        txn::{IndexDelta, TransactionContext, TxnError},
    },
    value::Value,
};

///
/// Synchronizer
///
/// Translates record lifecycle events into staged index deltas. Only
/// declared indexes are tracked; undeclared properties are invisible to
/// indexing and to `find`.
///

pub struct Synchronizer<'a> {
    store: &'a TypeStore,
}

impl<'a> Synchronizer<'a> {
    #[must_use]
    pub const fn new(store: &'a TypeStore) -> Self {
        Self { store }
    }

    /// Stage creation deltas: one per declared index whose property the
    /// record carries.
    pub fn on_create(
        &self,
        ctx: &mut TransactionContext,
        record: &Record,
    ) -> Result<(), TxnError> {
        for index in self.store.indexes().declared() {
            let property = &index.model().property;
            let Some(value) = record.property(property) else {
                continue;
            };

            ctx.stage_index(IndexDelta {
                type_name: self.store.model().name.clone(),
                property: property.clone(),
                old: None,
                new: Some(value.clone()),
                id: record.id(),
            })?;
        }

        Ok(())
    }

    /// Stage a re-index delta for one property change.
    ///
    /// No-op if the property is not indexed or the value is unchanged, so
    /// redundant writes cause no index churn.
    pub fn on_property_change(
        &self,
        ctx: &mut TransactionContext,
        id: RecordId,
        property: &str,
        old: Option<&Value>,
        new: Option<&Value>,
    ) -> Result<(), TxnError> {
        if !self.store.indexes().is_declared(property) {
            return Ok(());
        }
        if old == new {
            return Ok(());
        }

        ctx.stage_index(IndexDelta {
            type_name: self.store.model().name.clone(),
            property: property.to_string(),
            old: old.cloned(),
            new: new.cloned(),
            id,
        })
    }

    /// Stage removal deltas for every indexed property the record carries,
    /// then mark the record deleted. Once the owning transaction commits,
    /// no `find` can reach the record.
    pub fn on_delete(
        &self,
        ctx: &mut TransactionContext,
        record: &mut Record,
    ) -> Result<(), TxnError> {
        for index in self.store.indexes().declared() {
            let property = &index.model().property;
            let Some(value) = record.property(property) else {
                continue;
            };

            ctx.stage_index(IndexDelta {
                type_name: self.store.model().name.clone(),
                property: property.clone(),
                old: Some(value.clone()),
                new: None,
                id: record.id(),
            })?;
        }

        record.mark_deleted();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::Db,
        model::TypeModel,
        value::Value,
    };

    fn person_store(db: &Db) -> std::sync::Arc<TypeStore> {
        let store = db
            .register_type(TypeModel::new("Person", ["name", "age"]).expect("valid model"))
            .expect("type registration should succeed");
        store
            .declare_index("name", false)
            .expect("index declaration should succeed");
        store
    }

    #[test]
    fn on_create_stages_only_declared_indexes() {
        let db = Db::new();
        let store = person_store(&db);
        let sync = Synchronizer::new(&store);

        let mut record = Record::new(RecordId::generate());
        record.set_property("name", Value::from("hello"));
        record.set_property("age", Value::from(3i64));

        let mut ctx = TransactionContext::begin();
        sync.on_create(&mut ctx, &record)
            .expect("staging should succeed while active");

        let staged = ctx.staged_index_ops();
        assert_eq!(staged.len(), 1, "age is not indexed and must not stage");
        assert_eq!(staged[0].property, "name");
        assert_eq!(staged[0].old, None);
        assert_eq!(staged[0].new, Some(Value::from("hello")));
    }

    #[test]
    fn unchanged_property_value_stages_nothing() {
        let db = Db::new();
        let store = person_store(&db);
        let sync = Synchronizer::new(&store);

        let mut ctx = TransactionContext::begin();
        let id = RecordId::generate();
        let value = Value::from("same");
        sync.on_property_change(&mut ctx, id, "name", Some(&value), Some(&value))
            .expect("no-op change should not error");
        sync.on_property_change(&mut ctx, id, "age", Some(&Value::from(1i64)), Some(&Value::from(2i64)))
            .expect("unindexed change should not error");

        assert!(
            ctx.staged_index_ops().is_empty(),
            "no-op and unindexed changes must avoid index churn"
        );
    }

    #[test]
    fn on_delete_marks_record_and_stages_removal() {
        let db = Db::new();
        let store = person_store(&db);
        let sync = Synchronizer::new(&store);

        let mut record = Record::new(RecordId::generate());
        record.set_property("name", Value::from("remove"));

        let mut ctx = TransactionContext::begin();
        sync.on_delete(&mut ctx, &mut record)
            .expect("staging should succeed while active");

        assert!(record.is_deleted());
        let staged = ctx.staged_index_ops();
        assert_eq!(staged.len(), 1);
        assert_eq!(staged[0].old, Some(Value::from("remove")));
        assert_eq!(staged[0].new, None);
    }
}
