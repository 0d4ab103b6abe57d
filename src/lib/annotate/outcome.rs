//! What a worker emits for each peak.

use crate::feature::Feature;

/// A confirmed 3' UTR with the features it is written alongside.
///
/// `gene` and `transcript` have already had their 3' edges moved to the UTR's 3' edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRecord {
    pub gene: Feature,
    pub transcript: Option<Feature>,
    /// Other descendants of the transcript (`feature_N`), in database order.
    pub features: Vec<Feature>,
    pub utr: Option<Feature>,
    /// Name of the peak the UTR came from.
    pub peak: Option<String>,
}

impl AnnotationRecord {
    /// A record for a gene left as it is in the database.
    #[must_use]
    pub fn unannotated(gene: Feature, features: Vec<Feature>) -> Self {
        Self { gene, transcript: None, features, utr: None, peak: None }
    }

    #[must_use]
    pub fn gene_id(&self) -> &str {
        &self.gene.id
    }

    /// Returns true if this record carries a new UTR.
    #[must_use]
    pub fn is_annotated(&self) -> bool {
        self.utr.is_some()
    }

    /// Features in output order, each with its record key (`gene`, `transcript`,
    /// `feature_N`, `utr`).
    #[must_use]
    pub fn named_features(&self) -> Vec<(String, &Feature)> {
        let mut named = vec![("gene".to_string(), &self.gene)];
        if let Some(transcript) = &self.transcript {
            named.push(("transcript".to_string(), transcript));
        }
        named.extend(self.features.iter().enumerate().map(|(i, f)| (format!("feature_{i}"), f)));
        if let Some(utr) = &self.utr {
            named.push(("utr".to_string(), utr));
        }
        named
    }
}

/// The single result of annotating one peak.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A new UTR was annotated.
    Annotated(Box<AnnotationRecord>),
    /// Genes were nearby but none yielded a UTR.
    NoUtr { peak: String },
    /// No gene lies within the search distance of the peak.
    NoNearbyFeatures { peak: String },
    /// A UTR passed every rule but collapsed to zero length against coverage gaps.
    PotentialUtrZeroCoverage { peak: String },
}

impl Outcome {
    /// Name of the peak this outcome is for.
    #[must_use]
    pub fn peak(&self) -> &str {
        match self {
            Self::Annotated(record) => record.peak.as_deref().unwrap_or_default(),
            Self::NoUtr { peak }
            | Self::NoNearbyFeatures { peak }
            | Self::PotentialUtrZeroCoverage { peak } => peak,
        }
    }

    #[must_use]
    pub fn record(&self) -> Option<&AnnotationRecord> {
        match self {
            Self::Annotated(record) => Some(record),
            _ => None,
        }
    }
}
