//! Metrics sink boundary.
//!
//! Engine logic MUST NOT depend on `obs::metrics` directly.
//! All instrumentation flows through [`MetricsEvent`] and [`MetricsSink`];
//! this module is the only bridge to the global counter state.

use crate::obs::metrics;
use std::cell::RefCell;

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<*const dyn MetricsSink>> = const { RefCell::new(None) };
}

///
/// PlanKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlanKind {
    FullScan,
    Index,
    Intersection,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MetricsEvent {
    IndexApply {
        inserts: u64,
        removes: u64,
    },
    IndexRebuilt {
        entries: u64,
    },
    Plan {
        kind: PlanKind,
    },
    RowsScanned {
        rows: u64,
    },
    StaleDeltaDiscarded,
    TxnCommitted {
        index_deltas: u64,
        record_ops: u64,
    },
    TxnRolledBack {
        discarded: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default process-wide sink that writes into global counter state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        metrics::with_state_mut(|m| match event {
            MetricsEvent::IndexApply { inserts, removes } => {
                m.index_inserts = m.index_inserts.saturating_add(inserts);
                m.index_removes = m.index_removes.saturating_add(removes);
            }
            MetricsEvent::IndexRebuilt { .. } => {
                m.index_rebuilds = m.index_rebuilds.saturating_add(1);
            }
            MetricsEvent::Plan { kind } => match kind {
                PlanKind::FullScan => {
                    m.plan_full_scan = m.plan_full_scan.saturating_add(1);
                }
                PlanKind::Index => {
                    m.plan_index = m.plan_index.saturating_add(1);
                }
                PlanKind::Intersection => {
                    m.plan_intersection = m.plan_intersection.saturating_add(1);
                }
            },
            MetricsEvent::RowsScanned { rows } => {
                m.rows_scanned = m.rows_scanned.saturating_add(rows);
            }
            MetricsEvent::StaleDeltaDiscarded => {
                m.stale_deltas_discarded = m.stale_deltas_discarded.saturating_add(1);
            }
            MetricsEvent::TxnCommitted {
                index_deltas,
                record_ops,
            } => {
                m.txn_commits = m.txn_commits.saturating_add(1);
                m.txn_index_deltas = m.txn_index_deltas.saturating_add(index_deltas);
                m.txn_record_ops = m.txn_record_ops.saturating_add(record_ops);
            }
            MetricsEvent::TxnRolledBack { discarded } => {
                m.txn_rollbacks = m.txn_rollbacks.saturating_add(1);
                m.txn_rollback_discarded = m.txn_rollback_discarded.saturating_add(discarded);
            }
        });
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    let override_ptr = SINK_OVERRIDE.with(|cell| *cell.borrow());
    if let Some(ptr) = override_ptr {
        // SAFETY:
        // - `ptr` was produced from a valid `&dyn MetricsSink` in
        //   `with_metrics_sink`, which always restores the previous pointer
        //   before returning, including unwind paths via `Guard::drop`.
        // - `record` is synchronous and never stores `ptr` beyond this call.
        // - Only a shared reference is materialized, matching the shared
        //   borrow used to install the override.
        unsafe { (&*ptr).record(event) };
    } else {
        GLOBAL_METRICS_SINK.record(event);
    }
}

/// Snapshot the current counter state for endpoint/test plumbing.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all counter state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override on this thread.
pub(crate) fn with_metrics_sink<T>(sink: &dyn MetricsSink, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<*const dyn MetricsSink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = self.0;
            });
        }
    }

    // SAFETY:
    // - `sink_ptr` is installed only for this dynamic scope; `Guard` restores
    //   the previous slot on all exits, including panic.
    // - `record` only dereferences synchronously and never persists the
    //   pointer, so it cannot outlive the borrowed sink.
    let sink_ptr = unsafe { std::mem::transmute::<&dyn MetricsSink, *const dyn MetricsSink>(sink) };
    let prev = SINK_OVERRIDE.with(|cell| {
        let mut slot = cell.borrow_mut();
        slot.replace(sink_ptr)
    });
    let _guard = Guard(prev);

    f()
}
