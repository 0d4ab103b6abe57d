//! Per-chromosome truncation points.
//!
//! Truncation points are genomic coordinates (from soft-clipped polyA evidence) that bound how
//! far a UTR extension may run. The cache stores one JSON object per strand mapping chromosome
//! names to arrays of integer positions.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use ahash::AHashMap;
use anyhow::{Context, Result};

use super::IntervalLookup;
use crate::feature::{Position, Strand};

/// Sorted truncation points keyed by chromosome.
#[derive(Debug, Clone, Default)]
pub struct TruncationPointIndex {
    points: AHashMap<String, Vec<Position>>,
}

impl TruncationPointIndex {
    /// Builds an index from unsorted points, sorting and de-duplicating each chromosome.
    #[must_use]
    pub fn from_points<I, S>(points: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<Position>)>,
        S: Into<String>,
    {
        let points = points
            .into_iter()
            .map(|(chrom, mut positions)| {
                positions.sort_unstable();
                positions.dedup();
                (chrom.into(), positions)
            })
            .collect();
        Self { points }
    }

    /// Parses the JSON cache format: `{"chr1": [100, 250], ...}`.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let raw: HashMap<String, Vec<Position>> =
            serde_json::from_reader(reader).context("Failed to parse truncation points JSON")?;
        Ok(Self::from_points(raw))
    }

    /// Loads the index from a JSON cache file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open truncation points: {}", path.display()))?;
        Self::from_json_reader(BufReader::new(file))
            .with_context(|| format!("Invalid truncation points file: {}", path.display()))
    }

    /// All points on `chrom` in ascending order; empty if the chromosome is unknown.
    #[must_use]
    pub fn lookup(&self, chrom: &str) -> &[Position] {
        self.points.get(chrom).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Points `p` on `chrom` with `start <= p < end`, in ascending order.
    #[must_use]
    pub fn within(&self, chrom: &str, start: Position, end: Position) -> &[Position] {
        let points = self.lookup(chrom);
        let lo = points.partition_point(|&p| p < start);
        let hi = points.partition_point(|&p| p < end);
        if lo >= hi { &[] } else { &points[lo..hi] }
    }

    /// Number of chromosomes with at least one point.
    #[must_use]
    pub fn num_chromosomes(&self) -> usize {
        self.points.len()
    }
}

impl IntervalLookup for TruncationPointIndex {
    type Entry = Position;

    fn entries(
        &self,
        chrom: &str,
        _strand: Strand,
        start: Position,
        end: Position,
    ) -> Vec<Position> {
        self.within(chrom, start, end).to_vec()
    }
}
