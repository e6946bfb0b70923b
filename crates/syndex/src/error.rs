use syndex_core::{db::txn::TxnError, error::InternalError, model::ModelError};
use thiserror::Error as ThisError;

///
/// Error
///
/// Unified public error surface over the engine's error types.
///

#[derive(Debug, ThisError)]
pub enum Error {
    /// The unit of work signalled failure; the transaction was rolled back.
    #[error("unit of work aborted by caller")]
    Aborted,

    #[error(transparent)]
    Internal(#[from] InternalError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Txn(#[from] TxnError),
}
