//! Observability: runtime telemetry (counters) and sink abstractions.
//!
//! Engine logic never touches counter state directly; all instrumentation
//! flows through [`sink::record`].

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::EventReport;
pub use sink::{MetricsEvent, MetricsSink, PlanKind, metrics_report, metrics_reset_all};
