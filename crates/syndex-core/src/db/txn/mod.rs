//! Transaction contexts: atomic grouping of staged record and index
//! mutations.
//!
//! Contract:
//! - Staging buffers deltas; nothing touches an index or record store until
//!   `commit`.
//! - `commit` resolves every staged target first, then applies: index groups
//!   each under their index's exclusive section, then record ops. Apply
//!   cannot fail once resolution has passed.
//! - `rollback` discards staged ops without touching any store, so an
//!   index's observable state afterwards is bit-identical to its state when
//!   the context was opened.


use crate::{
    db::{
        Db,
        index::Index,
        store::{Record, RecordId},
    },
    error::{ErrorClass, ErrorOrigin, InternalError},
    obs::sink::{self, MetricsEvent},
    value::Value,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{self, Display},
    sync::Arc,
};
use thiserror::Error as ThisError;

///
/// TxnStatus
///
/// `Active` is the only state that accepts staging; `Committed` and
/// `RolledBack` are terminal.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum TxnStatus {
    Active,
    Committed,
    RolledBack,
}

impl Display for TxnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Active => "active",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        };
        write!(f, "{label}")
    }
}

///
/// TxnError
///

#[derive(Debug, ThisError)]
pub enum TxnError {
    #[error("transaction context is no longer active ({status})")]
    InvalidState { status: TxnStatus },
}

impl TxnError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidState { .. } => ErrorClass::InvariantViolation,
        }
    }
}

impl From<TxnError> for InternalError {
    fn from(err: TxnError) -> Self {
        Self::new(err.class(), ErrorOrigin::Txn, err.to_string())
    }
}

///
/// IndexDelta
///
/// One staged index mutation. `old = None` for creations, `new = None` for
/// deletions; applying means `remove(old)` then `put(new)`.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct IndexDelta {
    pub type_name: String,
    pub property: String,
    pub old: Option<Value>,
    pub new: Option<Value>,
    pub id: RecordId,
}

///
/// RecordOp
///
/// One staged record-store mutation.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum RecordOp {
    Put { type_name: String, record: Record },
    Delete { type_name: String, id: RecordId },
}

impl RecordOp {
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Put { type_name, .. } | Self::Delete { type_name, .. } => type_name,
        }
    }
}

///
/// TransactionContext
///
/// Owned by the call that opened it; never shared across concurrent
/// operations and never reused after reaching a terminal state.
///

#[derive(Debug)]
pub struct TransactionContext {
    status: TxnStatus,
    record_ops: Vec<RecordOp>,
    index_ops: Vec<IndexDelta>,
}

impl TransactionContext {
    /// Open a fresh context in `Active` state.
    #[must_use]
    pub const fn begin() -> Self {
        Self {
            status: TxnStatus::Active,
            record_ops: Vec::new(),
            index_ops: Vec::new(),
        }
    }

    #[must_use]
    pub const fn status(&self) -> TxnStatus {
        self.status
    }

    /// Staged index deltas, in staging order (diagnostics only).
    #[must_use]
    pub fn staged_index_ops(&self) -> &[IndexDelta] {
        &self.index_ops
    }

    /// Staged record ops, in staging order (diagnostics only).
    #[must_use]
    pub fn staged_record_ops(&self) -> &[RecordOp] {
        &self.record_ops
    }

    /// Append an index delta. Only legal while `Active`.
    pub fn stage_index(&mut self, delta: IndexDelta) -> Result<(), TxnError> {
        self.ensure_active()?;
        self.index_ops.push(delta);
        Ok(())
    }

    /// Append a record op. Only legal while `Active`.
    pub fn stage_record(&mut self, op: RecordOp) -> Result<(), TxnError> {
        self.ensure_active()?;
        self.record_ops.push(op);
        Ok(())
    }

    /// Apply every staged op and transition to `Committed`.
    ///
    /// Resolution of staged targets is the only fallible phase and happens
    /// before anything is applied; a failed commit therefore leaves every
    /// index and record store untouched. Index deltas are grouped per index
    /// and each group is applied under that index's exclusive section, in
    /// staging order; record ops follow.
    pub fn commit(&mut self, db: &Db) -> Result<(), InternalError> {
        self.ensure_active()?;

        // Resolve record-op targets first so a bogus staged op surfaces
        // before any mutation.
        let mut record_targets = Vec::with_capacity(self.record_ops.len());
        for op in &self.record_ops {
            record_targets.push(db.try_type_store(op.type_name())?);
        }

        // Group index deltas per index. Deltas whose index has been
        // undeclared since staging are discarded; the dropped index's
        // entries are already gone.
        let mut groups: Vec<(Arc<Index>, Vec<IndexDelta>)> = Vec::new();
        let mut slots: BTreeMap<(String, String), usize> = BTreeMap::new();
        let mut applied_deltas: u64 = 0;
        for delta in self.index_ops.drain(..) {
            let key = (delta.type_name.clone(), delta.property.clone());
            if let Some(&slot) = slots.get(&key) {
                groups[slot].1.push(delta);
                applied_deltas += 1;
                continue;
            }

            let resolved = db
                .type_store(&delta.type_name)
                .and_then(|store| store.indexes().get(&delta.property));
            match resolved {
                Some(index) => {
                    slots.insert(key, groups.len());
                    groups.push((index, vec![delta]));
                    applied_deltas += 1;
                }
                None => {
                    sink::record(MetricsEvent::StaleDeltaDiscarded);
                }
            }
        }

        // Apply: index groups first, then record ops.
        for (index, deltas) in &groups {
            index.apply(deltas);
        }

        let record_ops = u64::try_from(self.record_ops.len()).unwrap_or(u64::MAX);
        for (op, store) in self.record_ops.drain(..).zip(record_targets) {
            store.apply_record_op(op);
        }

        self.status = TxnStatus::Committed;
        sink::record(MetricsEvent::TxnCommitted {
            index_deltas: applied_deltas,
            record_ops,
        });

        Ok(())
    }

    /// Discard every staged op and transition to `RolledBack`.
    ///
    /// Touches no index and no record store; infallible. Calling on a
    /// terminal context does nothing.
    pub fn rollback(&mut self) {
        if self.status != TxnStatus::Active {
            return;
        }

        let discarded =
            u64::try_from(self.record_ops.len() + self.index_ops.len()).unwrap_or(u64::MAX);
        self.record_ops.clear();
        self.index_ops.clear();
        self.status = TxnStatus::RolledBack;

        sink::record(MetricsEvent::TxnRolledBack { discarded });
    }

    const fn ensure_active(&self) -> Result<(), TxnError> {
        match self.status {
            TxnStatus::Active => Ok(()),
            status => Err(TxnError::InvalidState { status }),
        }
    }
}
