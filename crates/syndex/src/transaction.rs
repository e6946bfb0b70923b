use crate::Error;
use syndex_core::db::{
    Db,
    txn::{TransactionContext, TxnStatus},
};

///
/// Transaction
///
/// One unit of work. [`Transaction::run`] mirrors the surrounding
/// "run work, call success or failure" pattern: the closure's `Ok` commits
/// every staged mutation, its `Err` rolls everything back and propagates.
///

pub struct Transaction<'db> {
    db: &'db Db,
    ctx: TransactionContext,
}

impl<'db> Transaction<'db> {
    /// Run a closure inside a fresh transaction context.
    ///
    /// A failed commit also rolls back, so no staged state can leak out of
    /// a finished unit of work.
    pub fn run<T>(
        db: &'db Db,
        work: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut tx = Self {
            db,
            ctx: TransactionContext::begin(),
        };

        match work(&mut tx) {
            Ok(value) => match tx.ctx.commit(tx.db) {
                Ok(()) => Ok(value),
                Err(err) => {
                    tx.ctx.rollback();
                    Err(err.into())
                }
            },
            Err(err) => {
                tx.ctx.rollback();
                Err(err)
            }
        }
    }

    #[must_use]
    pub const fn status(&self) -> TxnStatus {
        self.ctx.status()
    }

    pub(crate) const fn ctx_mut(&mut self) -> &mut TransactionContext {
        &mut self.ctx
    }
}
