#![deny(unsafe_code)]
// Clippy lint configuration for CI
// - cast_*: coordinate and count arithmetic casts between numeric types
// - missing_*_doc: documentation improvements tracked separately
// - needless_pass_by_value: some APIs take ownership for symmetry with their callers
// - items_after_statements: some test code uses late item declarations
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::needless_pass_by_value,
    clippy::items_after_statements,
    clippy::module_name_repetitions,
    clippy::uninlined_format_args
)]

//! # utrext - 3' UTR extension annotation library
//!
//! Given read-coverage peaks and a gene annotation, utrext decides for every peak whether it
//! extends the 3' UTR of a nearby gene, trims the extension against cached per-strand coverage
//! gaps and truncation points, and writes the updated gene models.
//!
//! ## Overview
//!
//! ### Core Functionality
//!
//! - **[`criteria`]** - the ordered acceptance rules a candidate UTR must pass
//! - **[`annotate`]** - per-peak workers, the thread-per-batch pipeline and output merging
//! - **[`intervals`]** - per-strand truncation point and coverage gap indexes
//!
//! ### Data and I/O
//!
//! - **[`feature`]** - strands, spans, peaks and annotation features
//! - **[`gateway`]** - the feature database seen by workers
//! - **[`gff`]** - GFF3/GTF parsing and rendering
//! - **[`peaks`]** - BED peak reading
//! - **[`utr`]** - UTR candidates and their colour classification
//!
//! ### Utilities
//!
//! - **[`config`]** - run parameters
//! - **[`memory`]** - the optional process-wide address-space limit
//! - **[`errors`]** - structured error types
//! - **[`logging`]** - log formatting and the run summary
//! - **[`metrics`]** - shared counters and summary metrics
//! - **[`progress`]** - progress tracking
//! - **[`validation`]** - input validation
//!
//! ## Quick Start
//!
//! ```no_run
//! use utrext_lib::annotate::{AnnotationPipeline, AnnotationSet};
//! use utrext_lib::config::AnnotationConfig;
//! use utrext_lib::feature::Dialect;
//! use utrext_lib::gateway::InMemoryFeatureDb;
//! use utrext_lib::peaks::read_peaks_from_path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let db = InMemoryFeatureDb::from_path("genes.gff3", Dialect::Gff3)?;
//! let peaks = read_peaks_from_path("peaks.bed")?;
//!
//! let pipeline = AnnotationPipeline::new(db.clone(), AnnotationConfig::default())
//!     .with_cache_dir("cache");
//! let mut annotations = AnnotationSet::new();
//! let mut running = pipeline.start(&peaks)?;
//! for outcome in running.by_ref() {
//!     annotations.add_outcome(outcome);
//! }
//! let metrics = running.finish()?;
//! annotations.write(&db, Dialect::Gff3, "extended.gff3")?;
//! # let _ = metrics;
//! # Ok(())
//! # }
//! ```

pub mod annotate;
pub mod config;
pub mod criteria;
pub mod errors;
pub mod feature;
pub mod gateway;
pub mod gff;
pub mod intervals;
pub mod logging;
pub mod memory;
pub mod metrics;
pub mod peaks;
pub mod progress;
pub mod utr;
pub mod validation;
