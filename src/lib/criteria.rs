//! The chain of positional rules that decides whether a peak is a 3' UTR extension of a
//! transcript, and the interval truncation applied once it is.
//!
//! Every rule is written once in terms of 5'/3' edges via [`Span::edge`]; the `-` strand only
//! changes the direction of the comparisons. Rules never touch the gateway: the worker fetches
//! existing UTRs and the next gene up front and passes them in.

use log::debug;
use thiserror::Error;
use utrext_metrics::RejectionReason;

use crate::config::UtrPolicy;
use crate::feature::{Edge, Feature, Peak, Position, Span};
use crate::intervals::{IntervalLookup, StrandIndexes};
use crate::utr::{AnnotationColour, UtrCandidate};

/// A peak failed one rule of the chain for one transcript.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CriteriaFailure {
    pub reason: RejectionReason,
    pub message: String,
}

impl CriteriaFailure {
    fn new(reason: RejectionReason, message: String) -> Self {
        Self { reason, message }
    }
}

type CriteriaResult<T> = std::result::Result<T, CriteriaFailure>;

/// Handles a transcript that already carries 3' UTRs according to `policy`.
///
/// Under [`UtrPolicy::Override`] the transcript's 3' edge moves back to the most proximal 5'
/// edge of the existing UTRs; under [`UtrPolicy::Extend`] it moves out to their most distal
/// 3' edge.
pub fn assert_whether_utr_already_annotated(
    peak: &Peak,
    transcript: &mut Feature,
    existing_utrs: &[Feature],
    policy: UtrPolicy,
) -> CriteriaResult<()> {
    if existing_utrs.is_empty() {
        return Ok(());
    }
    if existing_utrs.len() > 1 {
        debug!("Multiple existing 3' UTRs found for transcript {}", transcript.id);
    }
    let strand = peak.strand;
    let edge = match policy {
        UtrPolicy::Reject => {
            return Err(CriteriaFailure::new(
                RejectionReason::UtrAlreadyAnnotated,
                format!(
                    "3' UTR already annotated for transcript {} near peak {}",
                    transcript.id, peak.name
                ),
            ));
        }
        UtrPolicy::Override => strand
            .most_proximal(existing_utrs.iter().map(|utr| utr.edge(strand, Edge::FivePrime))),
        UtrPolicy::Extend => strand
            .most_distal(existing_utrs.iter().map(|utr| utr.edge(strand, Edge::ThreePrime))),
    };
    if let Some(edge) = edge {
        transcript.set_edge(strand, Edge::ThreePrime, edge);
    }
    Ok(())
}

/// Fails if the peak lies wholly within the transcript.
pub fn assert_not_a_subset(peak: &Peak, transcript: &Feature) -> CriteriaResult<()> {
    if transcript.contains_span(peak) {
        return Err(CriteriaFailure::new(
            RejectionReason::PeakWithinTranscript,
            format!("Peak {} wholly contained within transcript {}", peak.name, transcript.id),
        ));
    }
    Ok(())
}

/// Fails unless the peak runs past the transcript's 3' edge, in which case the UTR starts there.
pub fn assert_three_prime_end_and_truncate(
    peak: &Peak,
    transcript: &Feature,
    utr: &mut UtrCandidate,
) -> CriteriaResult<()> {
    let strand = peak.strand;
    let transcript_end = transcript.edge(strand, Edge::ThreePrime);
    if !strand.is_downstream(peak.edge(strand, Edge::ThreePrime), transcript_end) {
        return Err(CriteriaFailure::new(
            RejectionReason::FivePrimeEnd,
            format!("Peak {} corresponds to 5'-end of transcript {}", peak.name, transcript.id),
        ));
    }
    utr.set_edge(strand, Edge::FivePrime, transcript_end);
    Ok(())
}

/// Bounds the UTR by the next gene downstream, assumed to extend `five_prime_ext` bases
/// upstream of its annotated 5' edge.
///
/// Fails if that boundary does not lie strictly beyond the UTR's 5' edge, or if the peak
/// itself starts at or beyond it. Otherwise the UTR's 3' edge is pulled back to the boundary.
pub fn assert_before_next_gene(
    peak: &Peak,
    next_gene: &Feature,
    utr: &mut UtrCandidate,
    five_prime_ext: Position,
) -> CriteriaResult<()> {
    let strand = peak.strand;
    let boundary = strand.upstream(next_gene.edge(strand, Edge::FivePrime), five_prime_ext);
    if !strand.is_downstream(boundary, utr.edge(strand, Edge::FivePrime))
        || !strand.is_downstream(boundary, peak.edge(strand, Edge::FivePrime))
    {
        return Err(CriteriaFailure::new(
            RejectionReason::BelongsToNextGene,
            format!("Peak {} belongs to next gene {}", peak.name, next_gene.id),
        ));
    }
    if strand.is_downstream(utr.edge(strand, Edge::ThreePrime), boundary) {
        debug!("Peak {} overlapping next gene {}: truncating", peak.name, next_gene.id);
        utr.set_edge(strand, Edge::ThreePrime, boundary);
    }
    Ok(())
}

/// Applies the rule chain to one (peak, transcript) pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct CriteriaEngine {
    policy: UtrPolicy,
    five_prime_ext: Position,
}

impl CriteriaEngine {
    #[must_use]
    pub fn new(policy: UtrPolicy, five_prime_ext: Position) -> Self {
        Self { policy, five_prime_ext }
    }

    /// Runs the chain, returning the UTR candidate if every rule passes.
    ///
    /// `transcript` may be moved by the already-annotated rule; `next_gene` is the following
    /// candidate gene, if any.
    pub fn evaluate(
        &self,
        peak: &Peak,
        transcript: &mut Feature,
        existing_utrs: &[Feature],
        next_gene: Option<&Feature>,
    ) -> CriteriaResult<UtrCandidate> {
        assert_whether_utr_already_annotated(peak, transcript, existing_utrs, self.policy)?;
        assert_not_a_subset(peak, transcript)?;
        let mut utr = UtrCandidate::from_peak(peak);
        assert_three_prime_end_and_truncate(peak, transcript, &mut utr)?;
        if let Some(next_gene) = next_gene {
            assert_before_next_gene(peak, next_gene, &mut utr, self.five_prime_ext)?;
        }
        Ok(utr)
    }
}

/// Truncates a UTR that passed the chain against the strand's coverage gaps and truncation
/// points.
///
/// Truncation points are taken from the UTR as it stands on entry. A gap covering part of the
/// UTR or bordering its 3' edge pulls that edge back to the gap (never behind the transcript's
/// 3' edge); a gap that only abuts the 5' edge is ignored. A truncation point inside the UTR
/// then overrides that with the most distal point.
#[must_use]
pub fn truncate_to_intervals(
    peak: &Peak,
    transcript: &Feature,
    mut utr: UtrCandidate,
    indexes: &StrandIndexes,
) -> (UtrCandidate, AnnotationColour) {
    let strand = peak.strand;
    let mut colour = AnnotationColour::Extended;
    let points = indexes.truncation.entries(&peak.chr, strand, utr.start, utr.end);

    let gaps = indexes.gaps.entries(&peak.chr, strand, utr.start, utr.end);
    let gap_edge = strand.most_proximal(gaps.iter().map(|gap| gap.edge(strand, Edge::FivePrime)));
    if let Some(gap_edge) = gap_edge {
        let transcript_end = transcript.edge(strand, Edge::ThreePrime);
        if let Some(edge) = strand.most_distal([transcript_end, gap_edge]) {
            utr.set_edge(strand, Edge::ThreePrime, edge);
        }
        colour = AnnotationColour::TruncatedZeroCoverage;
    }

    if let Some(point) = strand.most_distal(points.iter().copied()) {
        utr.set_edge(strand, Edge::ThreePrime, point);
        colour = AnnotationColour::ExtendedWithSpat;
    }
    (utr, colour)
}
