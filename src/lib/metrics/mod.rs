//! Metrics collection and reporting for utrext.
//!
//! The counter and summary types live in the `utrext-metrics` crate and are re-exported here:
//! - [`AnnotationCounters`] - shared, deduplicating counters updated by every worker
//! - [`AnnotationMetrics`] - the end-of-run summary built from those counters
//! - [`writer`] - metrics file I/O utilities

pub use utrext_metrics::{
    AnnotationCounters, AnnotationMetrics, DedupCounter, Metric, ProcessingMetrics,
    RejectionCounters, RejectionReason, format_count,
};

pub mod writer;

pub use writer::{write_metrics, write_metrics_auto};
