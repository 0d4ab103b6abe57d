//! Concurrent 3' UTR annotation of peaks.
//!
//! - [`worker`] annotates single peaks and runs one batch on a worker thread
//! - [`pipeline`] splits peaks into batches, runs the workers and drains their outcomes
//! - [`collect`] merges outcomes into the final gene models

pub mod collect;
pub mod outcome;
pub mod pipeline;
pub mod worker;

pub use collect::{AnnotationSet, OutcomeTally};
pub use outcome::{AnnotationRecord, Outcome};
pub use pipeline::{AnnotationPipeline, RunningPipeline, partition_peaks};
pub use worker::{PeakAnnotator, run_batch};
