//! Core runtime for syndex: values, records, indexes, transaction contexts,
//! and the synchronizer that stages index deltas from record lifecycle
//! events.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod db;
pub mod error;
pub mod model;
pub mod obs;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, stores, or sink plumbing is re-exported here.
///

pub mod prelude {
    pub use crate::{
        db::{
            store::{Record, RecordId},
            sync::Synchronizer,
            txn::TransactionContext,
        },
        model::{IndexModel, TypeModel},
        value::Value,
    };
}
