use serde::{Deserialize, Serialize};
use std::sync::Mutex;

///
/// EventReport
///
/// Point-in-time snapshot of the process-wide counters.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventReport {
    pub index_inserts: u64,
    pub index_removes: u64,
    pub index_rebuilds: u64,
    pub plan_full_scan: u64,
    pub plan_index: u64,
    pub plan_intersection: u64,
    pub rows_scanned: u64,
    pub stale_deltas_discarded: u64,
    pub txn_commits: u64,
    pub txn_index_deltas: u64,
    pub txn_record_ops: u64,
    pub txn_rollback_discarded: u64,
    pub txn_rollbacks: u64,
}

impl EventReport {
    const ZERO: Self = Self {
        index_inserts: 0,
        index_removes: 0,
        index_rebuilds: 0,
        plan_full_scan: 0,
        plan_index: 0,
        plan_intersection: 0,
        rows_scanned: 0,
        stale_deltas_discarded: 0,
        txn_commits: 0,
        txn_index_deltas: 0,
        txn_record_ops: 0,
        txn_rollback_discarded: 0,
        txn_rollbacks: 0,
    };
}

static STATE: Mutex<EventReport> = Mutex::new(EventReport::ZERO);

pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventReport) -> R) -> R {
    // A poisoned lock only means a panic elsewhere mid-update; counters are
    // diagnostic, so keep serving them.
    let mut state = STATE.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    f(&mut state)
}

pub(crate) fn report() -> EventReport {
    with_state_mut(|state| *state)
}

pub(crate) fn reset_all() {
    with_state_mut(|state| *state = EventReport::ZERO);
}
