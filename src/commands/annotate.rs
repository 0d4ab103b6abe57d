//! Annotate 3' UTR extensions from read-coverage peaks.
//!
//! Each peak is matched against the genes within `--max-distance` on its strand. The first
//! gene whose outermost transcript the peak extends past its 3' end, without running into the
//! next gene downstream, receives a new `three_prime_UTR`. The UTR is then trimmed against the
//! coverage gaps and truncation points cached for the peak's strand.

use anyhow::Result;
use clap::Parser;
use log::info;

use utrext_lib::annotate::{AnnotationPipeline, AnnotationSet, OutcomeTally};
use utrext_lib::config::AnnotationConfig;
use utrext_lib::feature::Position;
use utrext_lib::gateway::InMemoryFeatureDb;
use utrext_lib::logging::{OperationTimer, log_annotation_summary};
use utrext_lib::metrics::write_metrics_auto;
use utrext_lib::peaks::read_peaks_from_path;
use utrext_lib::validation::validate_non_negative;

use crate::commands::command::Command;
use crate::commands::common::{AnnotateIoOptions, ThreadingOptions, UtrPolicyOptions};

/// Annotate 3' UTR extensions onto gene models.
#[derive(Debug, Parser)]
#[command(
    name = "annotate",
    about = "\x1b[38;5;72m[ANNOTATION]\x1b[0m     \x1b[36mExtend 3' UTRs of gene models from read-coverage peaks\x1b[0m",
    long_about = r#"
Extend the 3' UTRs of a gene annotation using read-coverage peaks.

Every peak yields exactly one outcome: a new 3' UTR on the first nearby gene it extends, no
UTR, no nearby gene, or a UTR removed because it had no read coverage. For each candidate gene
the peak must:

  1. not overlap an already annotated 3' UTR (see --override-utr / --extend-utr)
  2. not lie entirely within the gene's outermost transcript
  3. reach past the transcript's 3' end
  4. not belong to the next gene downstream (see --five-prime-ext)

The UTR is then cut back at the first coverage gap and extended to the furthest truncation
point within it, both read from the cache directory.

CACHE DIRECTORY:

  forward_unmapped.json        JSON object: chromosome -> [truncation points]
  reverse_unmapped.json
  forward_coverage_gaps.bed    BED3 intervals without coverage (0-based, half-open)
  reverse_coverage_gaps.bed

EXAMPLES:

  # Extend a GFF3 annotation with 8 threads
  utrext annotate -p peaks.bed -a genes.gff3 -c cache/ -o extended.gff3 --threads 8

  # Abort the run if the process needs more than 16 GB of address space
  utrext annotate -p peaks.bed -a genes.gff3 -c cache/ -o extended.gff3 --max-memory 16000000000

  # GTF in and out, allowing existing UTRs to be extended
  utrext annotate -p peaks.bed -a genes.gtf --gtf-in --gtf-out -c cache/ -o extended.gtf \
    --extend-utr
"#
)]
pub struct Annotate {
    #[command(flatten)]
    pub io: AnnotateIoOptions,

    /// Maximum distance either side of a peak to search for genes.
    #[arg(short = 'd', long = "max-distance", default_value_t = 500)]
    pub max_distance: Position,

    /// Assumed 5' extension of the next gene downstream; UTRs stop this far before it.
    #[arg(short = 'e', long = "five-prime-ext", default_value_t = 0)]
    pub five_prime_ext: Position,

    #[command(flatten)]
    pub policy: UtrPolicyOptions,

    #[command(flatten)]
    pub threading: ThreadingOptions,
}

impl Annotate {
    fn validate(&self) -> Result<()> {
        self.io.validate()?;
        self.threading.validate()?;
        self.policy.validate()?;
        validate_non_negative(self.max_distance, "max-distance")?;
        validate_non_negative(self.five_prime_ext, "five-prime-ext")?;
        Ok(())
    }

    /// The pipeline configuration selected by the options.
    pub fn config(&self) -> Result<AnnotationConfig> {
        let config = AnnotationConfig {
            processors: self.threading.num_threads(),
            max_distance: self.max_distance,
            utr_policy: self.policy.policy()?,
            five_prime_ext: self.five_prime_ext,
            gtf_in: self.io.gtf_in,
            queue_capacity: self.threading.queue_capacity,
            max_memory: self.threading.max_memory,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Command for Annotate {
    fn execute(&self, command_line: &str) -> Result<()> {
        self.validate()?;
        let config = self.config()?;
        info!("Command line: {command_line}");

        let timer = OperationTimer::new("Annotating 3' UTRs");

        let db = InMemoryFeatureDb::from_path(&self.io.annotation, self.io.input_dialect())?;
        info!("Loaded {} features from {}", db.len(), self.io.annotation.display());
        let peaks = read_peaks_from_path(&self.io.peaks)?;
        info!("Loaded {} peaks from {}", peaks.len(), self.io.peaks.display());

        let pipeline =
            AnnotationPipeline::new(db.clone(), config).with_cache_dir(&self.io.cache_dir);
        let mut annotations = AnnotationSet::new();
        let mut tally = OutcomeTally::default();
        let mut running = pipeline.start(&peaks)?;
        for outcome in running.by_ref() {
            tally.add(&outcome);
            annotations.add_outcome(outcome);
        }
        let metrics = running.finish()?;

        if tally.annotated > annotations.len() as u64 {
            info!(
                "{} UTR(s) superseded by a more distal UTR on the same gene",
                tally.annotated - annotations.len() as u64
            );
        }

        annotations.write(&db, self.io.output_dialect(), &self.io.output)?;
        info!("Wrote {} annotated gene(s) to {}", annotations.len(), self.io.output.display());

        log_annotation_summary(&metrics);
        if let Some(path) = &self.io.metrics {
            write_metrics_auto(path, &[metrics])?;
        }

        timer.log_completion(tally.total());
        Ok(())
    }
}
