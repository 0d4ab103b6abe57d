//! Interval indexes over cached per-strand coverage data.
//!
//! Each annotation worker loads its own [`StrandIndexes`] for both strands from the cache
//! directory; the indexes are read-only once built.

pub mod coverage;
pub mod truncation;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use coverage::{CoverageGap, CoverageGapIndex};
pub use truncation::TruncationPointIndex;

use crate::feature::{Position, Strand};

/// Common lookup capability of the interval indexes.
pub trait IntervalLookup {
    /// What a lookup returns per hit.
    type Entry;

    /// Entries on `chrom` relevant to a UTR spanning `start..end` on `strand`.
    fn entries(&self, chrom: &str, strand: Strand, start: Position, end: Position)
    -> Vec<Self::Entry>;
}

/// Path of the truncation point cache for `strand`.
#[must_use]
pub fn truncation_points_path(cache_dir: &Path, strand: Strand) -> PathBuf {
    cache_dir.join(format!("{}_unmapped.json", strand.cache_prefix()))
}

/// Path of the coverage gap cache for `strand`.
#[must_use]
pub fn coverage_gaps_path(cache_dir: &Path, strand: Strand) -> PathBuf {
    cache_dir.join(format!("{}_coverage_gaps.bed", strand.cache_prefix()))
}

/// The truncation points and coverage gaps of one strand.
#[derive(Debug, Clone, Default)]
pub struct StrandIndexes {
    pub truncation: TruncationPointIndex,
    pub gaps: CoverageGapIndex,
}

impl StrandIndexes {
    /// Loads both indexes for `strand` from `cache_dir`.
    pub fn load(cache_dir: &Path, strand: Strand) -> Result<Self> {
        let prefix = strand.cache_prefix();
        let truncation = TruncationPointIndex::from_path(truncation_points_path(cache_dir, strand))
            .with_context(|| format!("Failed to load {prefix} strand truncation points"))?;
        let gaps = CoverageGapIndex::from_path(coverage_gaps_path(cache_dir, strand))
            .with_context(|| format!("Failed to load {prefix} strand coverage gaps"))?;
        Ok(Self { truncation, gaps })
    }
}

/// A value held separately for each strand.
#[derive(Debug, Clone, Default)]
pub struct PerStrand<T> {
    pub forward: T,
    pub reverse: T,
}

impl<T> PerStrand<T> {
    #[must_use]
    pub fn get(&self, strand: Strand) -> &T {
        match strand {
            Strand::Forward => &self.forward,
            Strand::Reverse => &self.reverse,
        }
    }
}

impl PerStrand<StrandIndexes> {
    /// Loads the indexes of both strands.
    pub fn load(cache_dir: &Path) -> Result<Self> {
        Ok(Self {
            forward: StrandIndexes::load(cache_dir, Strand::Forward)?,
            reverse: StrandIndexes::load(cache_dir, Strand::Reverse)?,
        })
    }
}
