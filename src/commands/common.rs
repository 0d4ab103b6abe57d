//! Common CLI options shared across commands.
//!
//! This module provides shared argument structures that can be composed into
//! command structs using `#[command(flatten)]`.

use std::path::PathBuf;

use anyhow::bail;
use clap::Args;

use utrext_lib::config::UtrPolicy;
use utrext_lib::feature::Dialect;
use utrext_lib::validation::{validate_dir_exists, validate_file_exists};

/// Inputs and outputs of an annotation run.
#[derive(Debug, Clone, Args)]
pub struct AnnotateIoOptions {
    /// Peaks to annotate, as BED6 (chrom, start, end, name, score, strand).
    #[arg(short = 'p', long = "peaks")]
    pub peaks: PathBuf,

    /// Gene annotation to extend (GFF3, or GTF with --gtf-in).
    #[arg(short = 'a', long = "annotation")]
    pub annotation: PathBuf,

    /// Directory holding `{forward,reverse}_unmapped.json` and
    /// `{forward,reverse}_coverage_gaps.bed`.
    #[arg(short = 'c', long = "cache-dir")]
    pub cache_dir: PathBuf,

    /// Output annotation with the new 3' UTRs.
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,

    /// Read the annotation as GTF.
    #[arg(long = "gtf-in", default_value = "false")]
    pub gtf_in: bool,

    /// Write the output as GTF.
    #[arg(long = "gtf-out", default_value = "false")]
    pub gtf_out: bool,

    /// Optional output file for summary metrics.
    #[arg(short = 'm', long = "metrics")]
    pub metrics: Option<PathBuf>,
}

impl AnnotateIoOptions {
    /// Validates that the inputs exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the peaks or annotation file, or the cache directory, is missing.
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_file_exists(&self.peaks, "Peaks BED")?;
        validate_file_exists(&self.annotation, self.input_dialect_name())?;
        validate_dir_exists(&self.cache_dir, "cache-dir")?;
        Ok(())
    }

    #[must_use]
    pub fn input_dialect(&self) -> Dialect {
        if self.gtf_in { Dialect::Gtf } else { Dialect::Gff3 }
    }

    #[must_use]
    pub fn output_dialect(&self) -> Dialect {
        if self.gtf_out { Dialect::Gtf } else { Dialect::Gff3 }
    }

    fn input_dialect_name(&self) -> &'static str {
        if self.gtf_in { "Annotation GTF" } else { "Annotation GFF3" }
    }
}

/// Threading and resource options for the annotation pipeline.
///
/// # Examples
///
/// ```bash
/// utrext annotate --threads 8 ...
/// # Splits the peaks into 8 batches, one worker thread each
/// ```
#[derive(Debug, Clone, Default, Args)]
pub struct ThreadingOptions {
    /// Number of worker threads; defaults to the available parallelism.
    #[arg(short = 't', long = "threads")]
    pub threads: Option<usize>,

    /// Capacity of the queue between workers and the writer; defaults to 4 per thread.
    #[arg(long = "queue-capacity")]
    pub queue_capacity: Option<usize>,

    /// Address-space limit for the whole process in bytes; exceeding it aborts the run.
    #[arg(long = "max-memory")]
    pub max_memory: Option<u64>,
}

impl ThreadingOptions {
    /// Validates that any explicit value is at least 1.
    ///
    /// # Errors
    ///
    /// Returns an error if `--threads`, `--queue-capacity` or `--max-memory` is 0.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.threads == Some(0) {
            bail!("--threads must be at least 1");
        }
        if self.queue_capacity == Some(0) {
            bail!("--queue-capacity must be at least 1");
        }
        if self.max_memory == Some(0) {
            bail!("--max-memory must be at least 1 byte");
        }
        Ok(())
    }

    /// Number of worker threads to run.
    #[must_use]
    pub fn num_threads(&self) -> usize {
        self.threads.unwrap_or_else(|| std::thread::available_parallelism().map_or(1, usize::from))
    }
}

/// How peaks over already annotated 3' UTRs are handled.
#[derive(Debug, Clone, Default, Args)]
pub struct UtrPolicyOptions {
    /// Replace existing 3' UTRs with the peak-derived UTR.
    #[arg(long = "override-utr", default_value = "false", conflicts_with = "extend_utr")]
    pub override_utr: bool,

    /// Extend existing 3' UTRs with the peak-derived UTR.
    #[arg(long = "extend-utr", default_value = "false")]
    pub extend_utr: bool,
}

impl UtrPolicyOptions {
    /// Validates that at most one policy flag is set.
    ///
    /// # Errors
    ///
    /// Returns an error if both `--override-utr` and `--extend-utr` are set.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.policy().map(|_| ())
    }

    /// The policy selected by the flags.
    ///
    /// # Errors
    ///
    /// Returns an error if both flags are set.
    pub fn policy(&self) -> anyhow::Result<UtrPolicy> {
        Ok(UtrPolicy::from_flags(self.override_utr, self.extend_utr)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    fn io_options(peaks: PathBuf, annotation: PathBuf, cache_dir: PathBuf) -> AnnotateIoOptions {
        AnnotateIoOptions {
            peaks,
            annotation,
            cache_dir,
            output: PathBuf::from("out.gff3"),
            gtf_in: false,
            gtf_out: false,
            metrics: None,
        }
    }

    #[test]
    fn test_io_options_validate() {
        let peaks = NamedTempFile::new().unwrap();
        let annotation = NamedTempFile::new().unwrap();
        let cache = TempDir::new().unwrap();
        let opts = io_options(
            peaks.path().to_path_buf(),
            annotation.path().to_path_buf(),
            cache.path().to_path_buf(),
        );
        assert!(opts.validate().is_ok());

        let missing_cache = io_options(
            peaks.path().to_path_buf(),
            annotation.path().to_path_buf(),
            PathBuf::from("/nonexistent/cache"),
        );
        let err = missing_cache.validate().unwrap_err();
        assert!(err.to_string().contains("cache-dir"));

        let missing_annotation = io_options(
            peaks.path().to_path_buf(),
            PathBuf::from("/nonexistent/genes.gff3"),
            cache.path().to_path_buf(),
        );
        let err = missing_annotation.validate().unwrap_err();
        assert!(err.to_string().contains("Annotation GFF3"));
    }

    #[test]
    fn test_io_options_dialects() {
        let mut opts = io_options(PathBuf::new(), PathBuf::new(), PathBuf::new());
        assert_eq!(opts.input_dialect(), Dialect::Gff3);
        assert_eq!(opts.output_dialect(), Dialect::Gff3);
        opts.gtf_in = true;
        opts.gtf_out = true;
        assert_eq!(opts.input_dialect(), Dialect::Gtf);
        assert_eq!(opts.output_dialect(), Dialect::Gtf);
    }

    #[test]
    fn test_threading_options() {
        let opts = ThreadingOptions { threads: Some(4), ..ThreadingOptions::default() };
        assert!(opts.validate().is_ok());
        assert_eq!(opts.num_threads(), 4);
        assert!(ThreadingOptions::default().num_threads() >= 1);

        let zero = ThreadingOptions { threads: Some(0), ..ThreadingOptions::default() };
        assert!(zero.validate().unwrap_err().to_string().contains("--threads"));
        let zero_queue =
            ThreadingOptions { queue_capacity: Some(0), ..ThreadingOptions::default() };
        assert!(zero_queue.validate().unwrap_err().to_string().contains("--queue-capacity"));
        let zero_memory = ThreadingOptions { max_memory: Some(0), ..ThreadingOptions::default() };
        assert!(zero_memory.validate().unwrap_err().to_string().contains("--max-memory"));
    }

    #[test]
    fn test_utr_policy_options() {
        assert_eq!(UtrPolicyOptions::default().policy().unwrap(), UtrPolicy::Reject);
        let extend = UtrPolicyOptions { override_utr: false, extend_utr: true };
        assert_eq!(extend.policy().unwrap(), UtrPolicy::Extend);
        let both = UtrPolicyOptions { override_utr: true, extend_utr: true };
        assert!(both.validate().is_err());
    }
}
