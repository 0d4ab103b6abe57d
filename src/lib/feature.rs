//! Genomic features, peaks and strand-aware coordinate helpers.
//!
//! All strand-dependent logic in the crate goes through [`Strand`] and [`Span`]: the `-` strand
//! only flips the direction of comparisons, so the criteria and truncation code is written once
//! in terms of 5' and 3' edges rather than `start` and `end`.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::errors::UtrError;

/// Genomic coordinate.
pub type Position = i64;

/// Strand of a peak or feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strand {
    /// `+`
    Forward,
    /// `-`
    Reverse,
}

impl Strand {
    /// Both strands, forward first.
    pub const BOTH: [Strand; 2] = [Strand::Forward, Strand::Reverse];

    /// `+1` for forward, `-1` for reverse.
    #[must_use]
    pub fn sign(self) -> Position {
        match self {
            Self::Forward => 1,
            Self::Reverse => -1,
        }
    }

    /// The single-character symbol used in GFF/BED files.
    #[must_use]
    pub fn symbol(self) -> char {
        match self {
            Self::Forward => '+',
            Self::Reverse => '-',
        }
    }

    /// Prefix of the per-strand cache files.
    #[must_use]
    pub fn cache_prefix(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Reverse => "reverse",
        }
    }

    /// Returns true if `a` lies strictly 3' of `b` on this strand.
    #[must_use]
    pub fn is_downstream(self, a: Position, b: Position) -> bool {
        (a - b) * self.sign() > 0
    }

    /// Moves `pos` toward the 5' end by `by` bases.
    #[must_use]
    pub fn upstream(self, pos: Position, by: Position) -> Position {
        pos - by * self.sign()
    }

    /// The most 3' of `positions` (max on `+`, min on `-`).
    pub fn most_distal<I: IntoIterator<Item = Position>>(self, positions: I) -> Option<Position> {
        match self {
            Self::Forward => positions.into_iter().max(),
            Self::Reverse => positions.into_iter().min(),
        }
    }

    /// The most 5' of `positions` (min on `+`, max on `-`).
    pub fn most_proximal<I: IntoIterator<Item = Position>>(self, positions: I) -> Option<Position> {
        match self {
            Self::Forward => positions.into_iter().min(),
            Self::Reverse => positions.into_iter().max(),
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Strand {
    type Err = UtrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Self::Forward),
            "-" => Ok(Self::Reverse),
            other => Err(UtrError::InvalidParameter {
                parameter: "strand".to_string(),
                reason: format!("expected '+' or '-', got '{other}'"),
            }),
        }
    }
}

/// One end of a span, relative to its strand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// The upstream edge (`start` on `+`, `end` on `-`).
    FivePrime,
    /// The downstream edge (`end` on `+`, `start` on `-`).
    ThreePrime,
}

/// Anything with mutable `start`/`end` coordinates.
pub trait Span {
    fn start(&self) -> Position;
    fn end(&self) -> Position;
    fn set_start(&mut self, pos: Position);
    fn set_end(&mut self, pos: Position);

    /// `end - start`; negative if the span is inverted.
    fn length(&self) -> Position {
        self.end() - self.start()
    }

    /// Coordinate of `edge` when read on `strand`.
    fn edge(&self, strand: Strand, edge: Edge) -> Position {
        match (strand, edge) {
            (Strand::Forward, Edge::ThreePrime) | (Strand::Reverse, Edge::FivePrime) => self.end(),
            (Strand::Forward, Edge::FivePrime) | (Strand::Reverse, Edge::ThreePrime) => {
                self.start()
            }
        }
    }

    /// Moves `edge` (read on `strand`) to `pos`.
    fn set_edge(&mut self, strand: Strand, edge: Edge, pos: Position) {
        match (strand, edge) {
            (Strand::Forward, Edge::ThreePrime) | (Strand::Reverse, Edge::FivePrime) => {
                self.set_end(pos);
            }
            (Strand::Forward, Edge::FivePrime) | (Strand::Reverse, Edge::ThreePrime) => {
                self.set_start(pos);
            }
        }
    }

    /// Half-open range view.
    fn range(&self) -> Range<Position> {
        self.start()..self.end()
    }

    /// Returns true if every position of `other` lies within this span.
    ///
    /// An empty `other` is contained in anything.
    fn contains_span<S: Span + ?Sized>(&self, other: &S) -> bool {
        other.length() <= 0 || (other.start() >= self.start() && other.end() <= self.end())
    }
}

/// A signal interval inferred from sequencing coverage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Peak {
    pub chr: String,
    pub start: Position,
    pub end: Position,
    pub strand: Strand,
    pub name: String,
}

impl Peak {
    #[must_use]
    pub fn new(
        chr: impl Into<String>,
        start: Position,
        end: Position,
        strand: Strand,
        name: impl Into<String>,
    ) -> Self {
        Self { chr: chr.into(), start, end, strand, name: name.into() }
    }
}

impl Span for Peak {
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

/// Attribute syntax of an annotation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// `key=value;key=v1,v2`
    #[default]
    Gff3,
    /// `key "value"; key "value";`
    Gtf,
}

/// A record from the gene annotation database.
///
/// Features are handed out by value, so mutating one (e.g. extending a transcript after a UTR is
/// confirmed) only changes that copy, which then travels with its annotation record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub id: String,
    pub seqid: String,
    pub source: String,
    pub featuretype: String,
    pub start: Position,
    pub end: Position,
    pub score: String,
    pub strand: Strand,
    pub phase: String,
    /// Identifier of the parent feature, if any.
    pub parent: Option<String>,
    /// Attributes in file order, excluding the identifiers held in `id` and `parent`.
    pub attributes: Vec<(String, Vec<String>)>,
    pub dialect: Dialect,
}

impl Feature {
    /// Creates a feature with empty score, phase and attributes.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        seqid: impl Into<String>,
        featuretype: impl Into<String>,
        start: Position,
        end: Position,
        strand: Strand,
    ) -> Self {
        Self {
            id: id.into(),
            seqid: seqid.into(),
            source: ".".to_string(),
            featuretype: featuretype.into(),
            start,
            end,
            score: ".".to_string(),
            strand,
            phase: ".".to_string(),
            parent: None,
            attributes: Vec::new(),
            dialect: Dialect::Gff3,
        }
    }

    /// Sets the parent identifier.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Sets the source column.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Sets the dialect this feature was read in.
    #[must_use]
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// First value of attribute `key`.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }

    /// Replaces (or appends) attribute `key` with a single value.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = vec![value.into()];
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => *values = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Returns true if this feature's type is one of `featuretypes`.
    #[must_use]
    pub fn is_type(&self, featuretypes: &[&str]) -> bool {
        featuretypes.contains(&self.featuretype.as_str())
    }
}

impl Span for Feature {
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

/// Feature-type labels queried in the annotation database.
pub struct FeatureTypes;

impl FeatureTypes {
    pub const GENE: &'static [&'static str] =
        &["gene", "protein_coding_gene", "ncRNA_gene", "pseudogene"];
    pub const GFF_TRANSCRIPT: &'static [&'static str] =
        &["mRNA", "transcript", "ncRNA", "lnc_RNA", "pseudogenic_transcript"];
    pub const GTF_TRANSCRIPT: &'static [&'static str] = &["transcript"];
    pub const THREE_PRIME_UTR: &'static [&'static str] =
        &["three_prime_UTR", "three_prime_utr", "3UTR", "3'UTR"];
    pub const FIVE_PRIME_UTR: &'static [&'static str] =
        &["five_prime_UTR", "five_prime_utr", "5UTR", "5'UTR"];
    /// Feature type written for new UTRs.
    pub const NEW_UTR: &'static str = "three_prime_UTR";

    /// Transcript labels to query, depending on the input annotation format.
    #[must_use]
    pub fn transcripts(gtf_in: bool) -> &'static [&'static str] {
        if gtf_in { Self::GTF_TRANSCRIPT } else { Self::GFF_TRANSCRIPT }
    }

    /// Returns true for any 5' or 3' UTR label.
    #[must_use]
    pub fn is_utr(featuretype: &str) -> bool {
        Self::THREE_PRIME_UTR.contains(&featuretype) || Self::FIVE_PRIME_UTR.contains(&featuretype)
    }
}
