//! The candidate 3' UTR refined across the criteria chain.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::feature::{Feature, FeatureTypes, Peak, Position, Span};

/// Source column written for new UTR features.
pub const UTR_SOURCE: &str = "utrext";

/// How a UTR's distal edge was decided, written as the `colour` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnnotationColour {
    /// Truncated at a zero-coverage gap
    TruncatedZeroCoverage,
    /// Extended to the peak edge (or the next gene)
    Extended,
    /// Extended to a soft-clipped polyA truncation point
    ExtendedWithSpat,
}

impl AnnotationColour {
    /// Numeric code used in the `colour` attribute.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::TruncatedZeroCoverage => 2,
            Self::Extended => 3,
            Self::ExtendedWithSpat => 4,
        }
    }
}

impl fmt::Display for AnnotationColour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A mutable UTR candidate for one (peak, transcript) attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtrCandidate {
    pub start: Position,
    pub end: Position,
}

impl UtrCandidate {
    #[must_use]
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Starts from the peak's own coordinates.
    #[must_use]
    pub fn from_peak(peak: &Peak) -> Self {
        Self { start: peak.start, end: peak.end }
    }

    /// A UTR is valid when it has positive length.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.length() > 0
    }

    /// Builds the `three_prime_UTR` feature for this candidate.
    ///
    /// The identifier is `utr_{n}` where `n` is one more than the number of UTR features the
    /// transcript already has, and the feature inherits the transcript's dialect.
    #[must_use]
    pub fn to_feature(
        &self,
        transcript: &Feature,
        existing_utrs: usize,
        colour: AnnotationColour,
    ) -> Feature {
        let mut feature = Feature::new(
            format!("utr_{}", existing_utrs + 1),
            transcript.seqid.clone(),
            FeatureTypes::NEW_UTR,
            self.start,
            self.end,
            transcript.strand,
        )
        .with_parent(transcript.id.clone())
        .with_source(UTR_SOURCE)
        .with_dialect(transcript.dialect);
        feature.set_attribute("colour", colour.to_string());
        feature
    }
}

impl Span for UtrCandidate {
    fn start(&self) -> Position {
        self.start
    }

    fn end(&self) -> Position {
        self.end
    }

    fn set_start(&mut self, pos: Position) {
        self.start = pos;
    }

    fn set_end(&mut self, pos: Position) {
        self.end = pos;
    }
}

impl fmt::Display for UtrCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UTR({}-{})", self.start, self.end)
    }
}
