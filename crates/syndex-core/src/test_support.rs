//! Shared fixtures for engine tests.

use crate::{
    db::{
        Db, TypeStore,
        store::{Record, RecordId},
        sync::Synchronizer,
        txn::{RecordOp, TransactionContext},
    },
    model::TypeModel,
    value::Value,
};
use std::sync::Arc;

/// Register a type and declare its indexes.
pub(crate) fn store_with_indexes(
    db: &Db,
    name: &str,
    properties: &[&str],
    indexed: &[(&str, bool)],
) -> Arc<TypeStore> {
    let store = db
        .register_type(TypeModel::new(name, properties.iter().copied()).expect("valid model"))
        .expect("type registration should succeed");
    for (property, tokenized) in indexed {
        store
            .declare_index(property, *tokenized)
            .expect("index declaration should succeed");
    }

    store
}

/// Create and commit one record through the full staging path.
pub(crate) fn commit_record(db: &Db, store: &TypeStore, props: &[(&str, Value)]) -> Record {
    let mut record = Record::new(RecordId::generate());
    for (property, value) in props {
        record.set_property(*property, value.clone());
    }

    let mut ctx = TransactionContext::begin();
    Synchronizer::new(store)
        .on_create(&mut ctx, &record)
        .expect("staging should succeed while active");
    ctx.stage_record(RecordOp::Put {
        type_name: store.model().name.clone(),
        record: record.clone(),
    })
    .expect("staging should succeed while active");
    ctx.commit(db).expect("commit should succeed");

    record
}
