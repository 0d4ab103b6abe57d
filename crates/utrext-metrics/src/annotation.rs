//! Summary metrics for the `annotate` command.

use serde::{Deserialize, Serialize};

use crate::counter::AnnotationCounters;
use crate::rejection::RejectionReason;
use crate::{Metric, ProcessingMetrics};

/// Summary statistics of one annotation run.
///
/// Counts of peaks are distinct peak names, so they do not depend on how peaks were split
/// across workers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationMetrics {
    /// Total peaks submitted to the pipeline
    pub total_peaks: u64,

    /// 3' UTRs annotated
    pub utrs_annotated: u64,

    /// Peaks with no gene within the search window
    pub peaks_no_nearby_features: u64,

    /// Peaks whose potential UTR was removed because of zero read coverage
    pub peaks_zero_coverage: u64,

    /// Peaks that produced no UTR for any candidate gene
    pub peaks_no_utr: u64,

    /// Peaks corresponding to an already annotated 3' UTR
    pub peaks_utr_already_annotated: u64,

    /// Peaks contained within a transcript
    pub peaks_within_transcript: u64,

    /// Peaks corresponding to the 5'-end of a transcript
    pub peaks_five_prime_end: u64,

    /// Peaks belonging to the next gene downstream
    pub peaks_belonging_to_next_gene: u64,
}

impl AnnotationMetrics {
    /// Snapshots the shared counters of a finished run.
    #[must_use]
    pub fn from_counters(total_peaks: u64, counters: &AnnotationCounters) -> Self {
        let rejections = &counters.rejections;
        Self {
            total_peaks,
            utrs_annotated: counters.new_utrs.value(),
            peaks_no_nearby_features: counters.no_features.value(),
            peaks_zero_coverage: counters.zero_coverage_removals.value(),
            peaks_no_utr: counters.no_utr.value(),
            peaks_utr_already_annotated: rejections.count(RejectionReason::UtrAlreadyAnnotated),
            peaks_within_transcript: rejections.count(RejectionReason::PeakWithinTranscript),
            peaks_five_prime_end: rejections.count(RejectionReason::FivePrimeEnd),
            peaks_belonging_to_next_gene: rejections.count(RejectionReason::BelongsToNextGene),
        }
    }

    /// Per-criterion counts in chain order.
    #[must_use]
    pub fn rejection_summary(&self) -> Vec<(RejectionReason, u64)> {
        vec![
            (RejectionReason::UtrAlreadyAnnotated, self.peaks_utr_already_annotated),
            (RejectionReason::PeakWithinTranscript, self.peaks_within_transcript),
            (RejectionReason::FivePrimeEnd, self.peaks_five_prime_end),
            (RejectionReason::BelongsToNextGene, self.peaks_belonging_to_next_gene),
        ]
    }
}

impl Metric for AnnotationMetrics {
    fn metric_name() -> &'static str {
        "3' UTR annotation"
    }
}

impl ProcessingMetrics for AnnotationMetrics {
    fn total_input(&self) -> u64 {
        self.total_peaks
    }

    fn total_output(&self) -> u64 {
        self.utrs_annotated
    }

    fn total_filtered(&self) -> u64 {
        self.peaks_no_nearby_features + self.peaks_zero_coverage + self.peaks_no_utr
    }
}
