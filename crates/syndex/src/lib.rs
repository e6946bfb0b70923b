//! syndex: a transactional secondary-index synchronizer for mutable
//! records.
//!
//! The engine lives in `syndex-core`; this crate is the record-mapping
//! layer consumed by callers: runtime type declaration ([`TypeDef`]), a
//! typed handle surface ([`Handle`]), and the [`Transaction::run`]
//! unit-of-work wrapper that commits on success and rolls back on failure.

pub mod error;
mod handle;
mod schema;
mod transaction;

pub use error::Error;
pub use handle::Handle;
pub use schema::TypeDef;
pub use transaction::Transaction;

// core vocabulary
pub use syndex_core::{
    db::{
        Db,
        query::{CompareOp, FindQuery, Predicate},
        store::{Record, RecordId},
        txn::TxnStatus,
    },
    value::{Float64, Value},
};

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        Db, Error, FindQuery, Handle, Predicate, Record, RecordId, Transaction, TypeDef, Value,
    };
}
