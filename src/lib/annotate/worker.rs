//! Per-peak annotation and the worker loop that runs it over one batch.

use std::path::Path;

use anyhow::Result;
use crossbeam_channel::Sender;
use log::{debug, error};
use utrext_metrics::AnnotationCounters;

use super::outcome::{AnnotationRecord, Outcome};
use crate::config::AnnotationConfig;
use crate::criteria::{CriteriaEngine, truncate_to_intervals};
use crate::feature::{Edge, Feature, FeatureTypes, Peak, Span, Strand};
use crate::gateway::{FeatureGateway, GatewayFactory, OrderBy};
use crate::intervals::{PerStrand, StrandIndexes};
use crate::utr::{AnnotationColour, UtrCandidate};

/// Annotates single peaks against one gateway connection and one set of indexes.
pub struct PeakAnnotator<'a, G: FeatureGateway> {
    gateway: &'a G,
    indexes: &'a PerStrand<StrandIndexes>,
    config: &'a AnnotationConfig,
    counters: &'a AnnotationCounters,
    engine: CriteriaEngine,
}

impl<'a, G: FeatureGateway> PeakAnnotator<'a, G> {
    #[must_use]
    pub fn new(
        gateway: &'a G,
        indexes: &'a PerStrand<StrandIndexes>,
        config: &'a AnnotationConfig,
        counters: &'a AnnotationCounters,
    ) -> Self {
        let engine = CriteriaEngine::new(config.utr_policy, config.five_prime_ext);
        Self { gateway, indexes, config, counters, engine }
    }

    /// Genes on the peak's strand within `max_distance`, ordered 5' to 3' along the strand.
    fn nearby_genes(&self, peak: &Peak) -> Result<Vec<Feature>> {
        let mut genes = self.gateway.region(
            &peak.chr,
            peak.start - self.config.max_distance,
            peak.end + self.config.max_distance,
            peak.strand,
            FeatureTypes::GENE,
        )?;
        genes.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        if peak.strand == Strand::Reverse {
            genes.reverse();
        }
        Ok(genes)
    }

    /// The transcript of `gene` reaching furthest 3'.
    fn outermost_transcript(&self, gene: &Feature, strand: Strand) -> Result<Option<Feature>> {
        let (order_by, reverse) = match strand {
            Strand::Forward => (OrderBy::End, true),
            Strand::Reverse => (OrderBy::Start, false),
        };
        let transcripts = self.gateway.children(
            gene,
            Some(FeatureTypes::transcripts(self.config.gtf_in)),
            Some(order_by),
            reverse,
        )?;
        Ok(transcripts.into_iter().next())
    }

    /// Produces exactly one outcome for `peak`, updating the shared counters.
    ///
    /// Candidate genes are tried in order; the first that yields a UTR (or a UTR collapsed to
    /// zero length) decides the outcome.
    pub fn annotate_peak(&self, peak: &Peak) -> Result<Outcome> {
        let genes = self.nearby_genes(peak)?;
        if genes.is_empty() {
            debug!("No features found near peak {}", peak.name);
            self.counters.no_features.add(&peak.name);
            return Ok(Outcome::NoNearbyFeatures { peak: peak.name.clone() });
        }

        for (idx, gene) in genes.iter().enumerate() {
            let Some(mut transcript) = self.outermost_transcript(gene, peak.strand)? else {
                continue;
            };
            let children = self.gateway.children(&transcript, None, None, false)?;
            let existing_utrs: Vec<Feature> = children
                .iter()
                .filter(|f| f.is_type(FeatureTypes::THREE_PRIME_UTR))
                .cloned()
                .collect();

            let utr = match self.engine.evaluate(
                peak,
                &mut transcript,
                &existing_utrs,
                genes.get(idx + 1),
            ) {
                Ok(utr) => utr,
                Err(failure) => {
                    debug!("CriteriaFailure - {failure}");
                    self.counters.rejections.record(failure.reason, &peak.name);
                    continue;
                }
            };

            let strand_indexes = self.indexes.get(peak.strand);
            let (utr, colour) = truncate_to_intervals(peak, &transcript, utr, strand_indexes);
            if utr.is_valid() {
                debug!("Peak {} corresponds to 3' UTR {utr} of gene {}", peak.name, gene.id);
                let record = build_record(peak, gene.clone(), transcript, children, utr, colour);
                self.counters.new_utrs.increment();
                return Ok(Outcome::Annotated(Box::new(record)));
            }
            if utr.length() == 0 {
                debug!(
                    "Peak {} corresponds to potential 3' UTR that was removed due to zero read \
                     coverage",
                    peak.name
                );
                self.counters.zero_coverage_removals.add(&peak.name);
                return Ok(Outcome::PotentialUtrZeroCoverage { peak: peak.name.clone() });
            }
            error!("Peak {} produced abnormal 3' UTR {utr} for gene {}", peak.name, gene.id);
        }

        self.counters.no_utr.add(&peak.name);
        Ok(Outcome::NoUtr { peak: peak.name.clone() })
    }
}

/// Builds the record for a confirmed UTR, moving the gene's and transcript's 3' edges to the
/// UTR's 3' edge.
fn build_record(
    peak: &Peak,
    mut gene: Feature,
    mut transcript: Feature,
    children: Vec<Feature>,
    utr: UtrCandidate,
    colour: AnnotationColour,
) -> AnnotationRecord {
    let existing = children.iter().filter(|f| FeatureTypes::is_utr(&f.featuretype)).count();
    let utr_feature = utr.to_feature(&transcript, existing, colour);
    let features =
        children.into_iter().filter(|f| f.id != transcript.id && f.id != gene.id).collect();

    let strand = peak.strand;
    let distal = utr.edge(strand, Edge::ThreePrime);
    gene.set_edge(strand, Edge::ThreePrime, distal);
    transcript.set_edge(strand, Edge::ThreePrime, distal);

    AnnotationRecord {
        gene,
        transcript: Some(transcript),
        features,
        utr: Some(utr_feature),
        peak: Some(peak.name.clone()),
    }
}

/// Runs one batch on the current thread: connects to the gateway, loads both strands'
/// indexes from `cache_dir`, then sends one outcome per peak in batch order.
///
/// Returns early without error if the receiving side hangs up.
pub fn run_batch<F: GatewayFactory>(
    factory: &F,
    cache_dir: &Path,
    config: &AnnotationConfig,
    counters: &AnnotationCounters,
    peaks: &[Peak],
    tx: &Sender<Outcome>,
) -> Result<()> {
    let gateway = factory.connect()?;
    let indexes = PerStrand::<StrandIndexes>::load(cache_dir)?;
    let annotator = PeakAnnotator::new(&gateway, &indexes, config, counters);
    for peak in peaks {
        let outcome = annotator.annotate_peak(peak)?;
        if tx.send(outcome).is_err() {
            debug!("Outcome receiver closed; stopping batch early");
            break;
        }
    }
    Ok(())
}
