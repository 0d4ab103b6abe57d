#![deny(unsafe_code)]

//! Counters and summary metric types for utrext.
//!
//! This crate provides:
//! - [`counter`] deduplicating counters that stay consistent across concurrent workers
//! - [`rejection`] the criteria a peak can fail, used as statistics keys
//! - [`annotation`] the summary metrics written at the end of a run

pub mod annotation;
pub mod counter;
pub mod rejection;

use serde::{Deserialize, Serialize};

/// A metric type that can be serialized to TSV files.
pub trait Metric: Serialize + for<'de> Deserialize<'de> + Clone + Default {
    /// Human-readable name for this metric type.
    ///
    /// Used in error messages and logging when writing metrics files.
    fn metric_name() -> &'static str;
}

/// Common interface for metrics that track processing pipeline counts.
pub trait ProcessingMetrics {
    /// Total number of input items processed.
    fn total_input(&self) -> u64;

    /// Total number of output items produced.
    fn total_output(&self) -> u64;

    /// Total number of items filtered out or rejected.
    fn total_filtered(&self) -> u64;

    /// Processing efficiency as a percentage (output / input * 100).
    fn efficiency(&self) -> f64 {
        if self.total_input() == 0 {
            0.0
        } else {
            #[expect(clippy::cast_precision_loss, reason = "peak counts never exceed 2^53")]
            let result = self.total_output() as f64 / self.total_input() as f64 * 100.0;
            result
        }
    }
}

pub use annotation::AnnotationMetrics;
pub use counter::{AnnotationCounters, DedupCounter, RejectionCounters};
pub use rejection::{RejectionReason, format_count};
