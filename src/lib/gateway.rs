//! Access to the gene annotation database.
//!
//! Workers only see the database through [`FeatureGateway`]; each worker obtains its own
//! connection from a shared [`GatewayFactory`]. [`InMemoryFeatureDb`] is the implementation
//! used by the command line: the whole annotation is loaded once and every connection is a
//! cheap handle onto the same read-only store.

use std::path::Path;
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use anyhow::Result;
use log::debug;

use crate::errors::UtrError;
use crate::feature::{Dialect, Feature, FeatureTypes, Position, Strand};
use crate::gff::read_features_from_path;

/// Sort key for [`FeatureGateway::children`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    Start,
    End,
}

/// Queries a worker runs against the annotation database.
///
/// Returned features are owned copies; mutating them never affects the database.
pub trait FeatureGateway {
    /// Features of one of `featuretypes` on `strand` of `seqid` overlapping the closed span
    /// `[start, end]`, ordered by start.
    fn region(
        &self,
        seqid: &str,
        start: Position,
        end: Position,
        strand: Strand,
        featuretypes: &[&str],
    ) -> Result<Vec<Feature>>;

    /// All descendants of `feature`, optionally restricted to `featuretypes` and sorted by
    /// `order_by` (file order otherwise).
    fn children(
        &self,
        feature: &Feature,
        featuretypes: Option<&[&str]>,
        order_by: Option<OrderBy>,
        reverse: bool,
    ) -> Result<Vec<Feature>>;

    /// Every feature of one of `featuretypes`, in file order.
    fn features_of_type(&self, featuretypes: &[&str]) -> Result<Vec<Feature>>;
}

/// Hands out one gateway connection per worker.
pub trait GatewayFactory: Send + Sync + 'static {
    type Gateway: FeatureGateway;

    fn connect(&self) -> Result<Self::Gateway>;
}

#[derive(Debug, Default)]
struct FeatureStore {
    /// Features in file order.
    features: Vec<Feature>,
    by_id: AHashMap<String, usize>,
    /// Direct children of each feature id, in file order.
    children: AHashMap<String, Vec<usize>>,
    /// Feature indices per seqid, sorted by start.
    by_seqid: AHashMap<String, Vec<usize>>,
    /// Longest feature per seqid, bounding region scans.
    max_length: AHashMap<String, Position>,
}

impl FeatureStore {
    fn new(features: Vec<Feature>) -> Self {
        let mut store = Self::default();
        for mut feature in features {
            if store.by_id.contains_key(&feature.id) {
                let base = feature.id.clone();
                let mut n = 1;
                while store.by_id.contains_key(&format!("{base}_{n}")) {
                    n += 1;
                }
                feature.id = format!("{base}_{n}");
                debug!("Duplicate feature id {base} renamed to {}", feature.id);
            }
            store.by_id.insert(feature.id.clone(), store.features.len());
            store.features.push(feature);
        }

        for (i, feature) in store.features.iter().enumerate() {
            if let Some(parent) = &feature.parent {
                if store.by_id.contains_key(parent) {
                    store.children.entry(parent.clone()).or_default().push(i);
                } else {
                    debug!("Parent {parent} of feature {} not found", feature.id);
                }
            }
            store.by_seqid.entry(feature.seqid.clone()).or_default().push(i);
            let longest = store.max_length.entry(feature.seqid.clone()).or_insert(0);
            *longest = (*longest).max(feature.end - feature.start);
        }
        let features = &store.features;
        for indices in store.by_seqid.values_mut() {
            indices.sort_by(|&a, &b| {
                features[a].start.cmp(&features[b].start).then_with(|| a.cmp(&b))
            });
        }
        store
    }

    fn descendants(&self, id: &str) -> Vec<usize> {
        let mut found = Vec::new();
        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            for &child in self.children.get(&current).into_iter().flatten() {
                if !found.contains(&child) {
                    found.push(child);
                    stack.push(self.features[child].id.clone());
                }
            }
        }
        found.sort_unstable();
        found
    }
}

/// A gene annotation held in memory.
///
/// Cloning is cheap; every clone shares the same store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFeatureDb {
    store: Arc<FeatureStore>,
}

impl InMemoryFeatureDb {
    /// Builds the database from parsed features.
    ///
    /// GTF input rarely carries gene and transcript lines, so for [`Dialect::Gtf`] any gene or
    /// transcript referenced through `gene_id`/`transcript_id` but absent from `features` is
    /// derived, spanning all of its features.
    #[must_use]
    pub fn from_features(features: Vec<Feature>, dialect: Dialect) -> Self {
        let features = match dialect {
            Dialect::Gff3 => features,
            Dialect::Gtf => with_derived_gtf_features(features),
        };
        Self { store: Arc::new(FeatureStore::new(features)) }
    }

    /// Loads a GFF3 or GTF file.
    pub fn from_path<P: AsRef<Path>>(path: P, dialect: Dialect) -> Result<Self> {
        Ok(Self::from_features(read_features_from_path(path, dialect)?, dialect))
    }

    /// Number of features held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.features.is_empty()
    }

    /// Looks a feature up by identifier.
    pub fn feature(&self, id: &str) -> crate::errors::Result<Feature> {
        self.store
            .by_id
            .get(id)
            .map(|&i| self.store.features[i].clone())
            .ok_or_else(|| UtrError::FeatureNotFound { id: id.to_string() })
    }
}

impl FeatureGateway for InMemoryFeatureDb {
    fn region(
        &self,
        seqid: &str,
        start: Position,
        end: Position,
        strand: Strand,
        featuretypes: &[&str],
    ) -> Result<Vec<Feature>> {
        let Some(indices) = self.store.by_seqid.get(seqid) else {
            return Ok(Vec::new());
        };
        let features = &self.store.features;
        let longest = self.store.max_length.get(seqid).copied().unwrap_or(0);
        let lo = indices.partition_point(|&i| features[i].start < start - longest);
        let hi = indices.partition_point(|&i| features[i].start <= end);
        Ok(indices[lo..hi]
            .iter()
            .map(|&i| &features[i])
            .filter(|f| f.end >= start && f.strand == strand && f.is_type(featuretypes))
            .cloned()
            .collect())
    }

    fn children(
        &self,
        feature: &Feature,
        featuretypes: Option<&[&str]>,
        order_by: Option<OrderBy>,
        reverse: bool,
    ) -> Result<Vec<Feature>> {
        let mut children: Vec<Feature> = self
            .store
            .descendants(&feature.id)
            .into_iter()
            .map(|i| &self.store.features[i])
            .filter(|f| featuretypes.is_none_or(|types| f.is_type(types)))
            .cloned()
            .collect();
        if let Some(order_by) = order_by {
            children.sort_by(|a, b| {
                let (ka, kb) = match order_by {
                    OrderBy::Start => (a.start, b.start),
                    OrderBy::End => (a.end, b.end),
                };
                let key = if reverse { kb.cmp(&ka) } else { ka.cmp(&kb) };
                key.then_with(|| a.id.cmp(&b.id))
            });
        }
        Ok(children)
    }

    fn features_of_type(&self, featuretypes: &[&str]) -> Result<Vec<Feature>> {
        Ok(self.store.features.iter().filter(|f| f.is_type(featuretypes)).cloned().collect())
    }
}

impl GatewayFactory for InMemoryFeatureDb {
    type Gateway = InMemoryFeatureDb;

    fn connect(&self) -> Result<Self::Gateway> {
        Ok(self.clone())
    }
}

/// Source column of genes and transcripts derived from GTF attributes.
pub const DERIVED_SOURCE: &str = "derived";

fn with_derived_gtf_features(features: Vec<Feature>) -> Vec<Feature> {
    struct Derived<'a> {
        id: String,
        gene_id: Option<String>,
        is_transcript: bool,
        template: &'a Feature,
        start: Position,
        end: Position,
    }

    let present: AHashSet<&str> = features
        .iter()
        .filter(|f| f.is_type(FeatureTypes::GENE) || f.is_type(FeatureTypes::GTF_TRANSCRIPT))
        .map(|f| f.id.as_str())
        .collect();

    let mut derived: Vec<Derived<'_>> = Vec::new();
    let mut positions: AHashMap<String, usize> = AHashMap::new();
    for feature in &features {
        let gene_id = feature.attribute("gene_id");
        let mut wanted = Vec::new();
        if let Some(gene_id) = gene_id {
            wanted.push((gene_id, false));
        }
        if let Some(transcript_id) = feature.attribute("transcript_id") {
            if !feature.is_type(FeatureTypes::GTF_TRANSCRIPT) {
                wanted.push((transcript_id, true));
            }
        }
        for (id, is_transcript) in wanted {
            if present.contains(id) {
                continue;
            }
            match positions.get(id) {
                Some(&i) => {
                    derived[i].start = derived[i].start.min(feature.start);
                    derived[i].end = derived[i].end.max(feature.end);
                }
                None => {
                    positions.insert(id.to_string(), derived.len());
                    derived.push(Derived {
                        id: id.to_string(),
                        gene_id: gene_id.filter(|_| is_transcript).map(str::to_string),
                        is_transcript,
                        template: feature,
                        start: feature.start,
                        end: feature.end,
                    });
                }
            }
        }
    }

    let mut all: Vec<Feature> = derived
        .into_iter()
        .map(|d| {
            let featuretype = if d.is_transcript { "transcript" } else { "gene" };
            let mut feature = Feature::new(
                d.id.clone(),
                d.template.seqid.clone(),
                featuretype,
                d.start,
                d.end,
                d.template.strand,
            )
            .with_source(DERIVED_SOURCE)
            .with_dialect(Dialect::Gtf);
            if let Some(gene_id) = &d.gene_id {
                feature.set_attribute("gene_id", gene_id.clone());
                feature.parent = Some(gene_id.clone());
            }
            if d.is_transcript {
                feature.set_attribute("transcript_id", d.id);
            } else {
                feature.set_attribute("gene_id", d.id);
            }
            feature
        })
        .collect();
    all.extend(features);
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gff::read_features;
    use std::io::Cursor;

    fn db() -> InMemoryFeatureDb {
        let f = |id: &str, ty: &str, start, end, strand, parent: Option<&str>| {
            let feature = Feature::new(id, "chr1", ty, start, end, strand);
            match parent {
                Some(parent) => feature.with_parent(parent),
                None => feature,
            }
        };
        InMemoryFeatureDb::from_features(
            vec![
                f("g1", "gene", 100, 1000, Strand::Forward, None),
                f("t1", "mRNA", 100, 900, Strand::Forward, Some("g1")),
                f("t2", "mRNA", 150, 1000, Strand::Forward, Some("g1")),
                f("e1", "exon", 100, 200, Strand::Forward, Some("t1")),
                f("u1", "three_prime_UTR", 800, 900, Strand::Forward, Some("t1")),
                f("g2", "gene", 5000, 6000, Strand::Forward, None),
                f("g3", "gene", 1200, 1300, Strand::Reverse, None),
                f("big", "gene", 0, 100_000, Strand::Forward, None),
            ],
            Dialect::Gff3,
        )
    }

    fn ids(features: &[Feature]) -> Vec<&str> {
        features.iter().map(|f| f.id.as_str()).collect()
    }

    #[test]
    fn test_region() -> Result<()> {
        let db = db();
        let genes = db.region("chr1", 950, 1500, Strand::Forward, FeatureTypes::GENE)?;
        assert_eq!(ids(&genes), ["big", "g1"]);
        let genes = db.region("chr1", 950, 1500, Strand::Reverse, FeatureTypes::GENE)?;
        assert_eq!(ids(&genes), ["g3"]);
        // Closed span: touching the end counts
        let genes = db.region("chr1", 6000, 6000, Strand::Forward, &["gene"])?;
        assert_eq!(ids(&genes), ["big", "g2"]);
        assert!(db.region("chr2", 0, 10, Strand::Forward, &["gene"])?.is_empty());
        Ok(())
    }

    #[test]
    fn test_children() -> Result<()> {
        let db = db();
        let gene = db.feature("g1")?;
        assert_eq!(ids(&db.children(&gene, None, None, false)?), ["t1", "t2", "e1", "u1"]);
        let transcripts =
            db.children(&gene, Some(&["mRNA"][..]), Some(OrderBy::End), true)?;
        assert_eq!(ids(&transcripts), ["t2", "t1"]);
        let transcripts =
            db.children(&gene, Some(&["mRNA"][..]), Some(OrderBy::Start), false)?;
        assert_eq!(ids(&transcripts), ["t1", "t2"]);
        let transcript = db.feature("t1")?;
        let utrs = db.children(&transcript, Some(FeatureTypes::THREE_PRIME_UTR), None, false)?;
        assert_eq!(ids(&utrs), ["u1"]);
        Ok(())
    }

    #[test]
    fn test_feature_lookup() {
        let db = db();
        assert_eq!(db.len(), 8);
        assert!(matches!(db.feature("nope"), Err(UtrError::FeatureNotFound { .. })));
        assert_eq!(ids(&db.features_of_type(&["gene"]).unwrap()), ["g1", "g2", "g3", "big"]);
    }

    #[test]
    fn test_connect_shares_store() -> Result<()> {
        let db = db();
        let handle = db.connect()?;
        assert_eq!(handle.len(), db.len());
        assert!(Arc::ptr_eq(&handle.store, &db.store));
        Ok(())
    }

    #[test]
    fn test_duplicate_ids_are_renamed() {
        let db = InMemoryFeatureDb::from_features(
            vec![
                Feature::new("cds", "chr1", "CDS", 1, 10, Strand::Forward),
                Feature::new("cds", "chr1", "CDS", 20, 30, Strand::Forward),
            ],
            Dialect::Gff3,
        );
        assert!(db.feature("cds").is_ok());
        assert_eq!(db.feature("cds_1").map(|f| f.start).ok(), Some(20));
    }

    #[test]
    fn test_gtf_derives_genes_and_transcripts() -> Result<()> {
        let gtf = "chr1\tsrc\texon\t100\t200\t.\t+\t.\tgene_id \"g1\"; transcript_id \"g1.1\";\n\
            chr1\tsrc\texon\t300\t450\t.\t+\t.\tgene_id \"g1\"; transcript_id \"g1.1\";\n\
            chr1\tsrc\texon\t120\t500\t.\t+\t.\tgene_id \"g1\"; transcript_id \"g1.2\";\n";
        let features = read_features(Cursor::new(gtf), Dialect::Gtf, "test.gtf")?;
        let db = InMemoryFeatureDb::from_features(features, Dialect::Gtf);

        let gene = db.feature("g1")?;
        assert_eq!((gene.start, gene.end), (100, 500));
        assert_eq!(gene.source, DERIVED_SOURCE);
        let transcript = db.feature("g1.1")?;
        assert_eq!((transcript.start, transcript.end), (100, 450));
        assert_eq!(transcript.parent.as_deref(), Some("g1"));
        assert_eq!(transcript.featuretype, "transcript");

        let transcripts =
            db.children(&gene, Some(FeatureTypes::GTF_TRANSCRIPT), Some(OrderBy::End), true)?;
        assert_eq!(ids(&transcripts), ["g1.2", "g1.1"]);
        assert_eq!(db.children(&transcript, None, None, false)?.len(), 2);
        Ok(())
    }
}
