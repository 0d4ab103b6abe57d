//! Collecting worker outcomes into the final annotation.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ahash::{AHashMap, AHashSet};
use anyhow::{Context, Result};
use log::debug;

use super::outcome::{AnnotationRecord, Outcome};
use crate::feature::{Dialect, Edge, FeatureTypes, Span};
use crate::gateway::FeatureGateway;
use crate::gff::format_gene_lines;

/// Per-kind totals of the outcomes received from the workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeTally {
    pub annotated: u64,
    pub no_utr: u64,
    pub no_nearby_features: u64,
    pub zero_coverage: u64,
}

impl OutcomeTally {
    pub fn add(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Annotated(_) => self.annotated += 1,
            Outcome::NoUtr { .. } => self.no_utr += 1,
            Outcome::NoNearbyFeatures { .. } => self.no_nearby_features += 1,
            Outcome::PotentialUtrZeroCoverage { .. } => self.zero_coverage += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.annotated + self.no_utr + self.no_nearby_features + self.zero_coverage
    }
}

/// Annotated records keyed by gene.
///
/// When several peaks extend the same gene, the record whose UTR reaches furthest 3' is kept;
/// ties go to the lexicographically smaller peak name, so the result does not depend on the
/// order in which workers deliver records.
#[derive(Debug, Default)]
pub struct AnnotationSet {
    records: AHashMap<String, AnnotationRecord>,
}

impl AnnotationSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the record carried by `outcome`, if any. Returns true if it was kept.
    pub fn add_outcome(&mut self, outcome: Outcome) -> bool {
        match outcome {
            Outcome::Annotated(record) => self.insert(*record),
            _ => false,
        }
    }

    /// Adds `record`, replacing an existing record for the same gene if it wins.
    /// Returns true if `record` was kept.
    pub fn insert(&mut self, record: AnnotationRecord) -> bool {
        match self.records.get(record.gene_id()) {
            Some(existing) if !supersedes(&record, existing) => {
                debug!(
                    "Keeping UTR from peak {:?} over peak {:?} for gene {}",
                    existing.peak,
                    record.peak,
                    record.gene_id()
                );
                false
            }
            _ => {
                self.records.insert(record.gene_id().to_string(), record);
                true
            }
        }
    }

    #[must_use]
    pub fn get(&self, gene_id: &str) -> Option<&AnnotationRecord> {
        self.records.get(gene_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every gene of the database rendered in `dialect`, in database order.
    ///
    /// Annotated genes are written from their records; all other genes are written with their
    /// descendants unchanged.
    pub fn merged_lines<G: FeatureGateway>(
        &self,
        gateway: &G,
        dialect: Dialect,
    ) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        let mut written = AHashSet::new();
        for gene in gateway.features_of_type(FeatureTypes::GENE)? {
            if let Some(record) = self.records.get(&gene.id) {
                lines.extend(record_lines(record, dialect));
                written.insert(gene.id);
            } else {
                let children = gateway.children(&gene, None, None, false)?;
                lines.extend(format_gene_lines(
                    &gene.id,
                    std::iter::once(&gene).chain(&children),
                    dialect,
                ));
            }
        }

        // Records whose gene the database does not list as a gene.
        let mut orphans: Vec<_> =
            self.records.values().filter(|r| !written.contains(r.gene_id())).collect();
        orphans.sort_by(|a, b| a.gene_id().cmp(b.gene_id()));
        for record in orphans {
            lines.extend(record_lines(record, dialect));
        }
        Ok(lines)
    }

    /// Writes [`merged_lines`](Self::merged_lines) to `path`, with a version header for GFF3.
    pub fn write<G: FeatureGateway, P: AsRef<Path>>(
        &self,
        gateway: &G,
        dialect: Dialect,
        path: P,
    ) -> Result<()> {
        let path = path.as_ref();
        let lines = self.merged_lines(gateway, dialect)?;
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        if dialect == Dialect::Gff3 {
            writeln!(writer, "##gff-version 3")?;
        }
        for line in &lines {
            writeln!(writer, "{line}")?;
        }
        writer.flush().with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// True if `candidate` should replace `existing` for the same gene.
fn supersedes(candidate: &AnnotationRecord, existing: &AnnotationRecord) -> bool {
    let strand = candidate.gene.strand;
    let distal = |r: &AnnotationRecord| r.utr.as_ref().map(|u| u.edge(strand, Edge::ThreePrime));
    match (distal(candidate), distal(existing)) {
        (Some(c), Some(e)) if c != e => strand.is_downstream(c, e),
        (Some(_), None) => true,
        (None, Some(_)) => false,
        _ => candidate.peak < existing.peak,
    }
}

fn record_lines(record: &AnnotationRecord, dialect: Dialect) -> Vec<String> {
    let named = record.named_features();
    format_gene_lines(record.gene_id(), named.iter().map(|(_, feature)| *feature), dialect)
}
