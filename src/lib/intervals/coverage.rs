//! Per-chromosome zero-coverage gaps.
//!
//! Gaps are stored sorted by start alongside a running maximum of their ends, so a query only
//! scans the gaps that can possibly reach the queried span.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ahash::AHashMap;
use anyhow::{Context, Result};

use super::IntervalLookup;
use crate::errors::UtrError;
use crate::feature::{Position, Span, Strand};
use crate::peaks::is_bed_header;

/// A half-open `[start, end)` interval with zero coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoverageGap {
    pub start: Position,
    pub end: Position,
}

impl CoverageGap {
    #[must_use]
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

impl Span for CoverageGap {
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

/// Gaps on one chromosome, sorted by start.
#[derive(Debug, Clone, Default)]
struct ChromGaps {
    gaps: Vec<CoverageGap>,
    /// `max_end[i]` is the largest `end` among `gaps[..=i]`.
    max_end: Vec<Position>,
}

impl ChromGaps {
    fn new(mut gaps: Vec<CoverageGap>) -> Self {
        gaps.sort_unstable();
        gaps.dedup();
        let max_end = gaps
            .iter()
            .scan(Position::MIN, |acc, gap| {
                *acc = (*acc).max(gap.end);
                Some(*acc)
            })
            .collect();
        Self { gaps, max_end }
    }

    /// Gaps with `gap.start <= end && gap.end >= start`, in ascending start order.
    fn overlapping(&self, start: Position, end: Position) -> Vec<CoverageGap> {
        let hi = self.gaps.partition_point(|gap| gap.start <= end);
        let mut hits = Vec::new();
        for i in (0..hi).rev() {
            if self.max_end[i] < start {
                break;
            }
            if self.gaps[i].end >= start {
                hits.push(self.gaps[i]);
            }
        }
        hits.reverse();
        hits
    }
}

/// Zero-coverage gaps keyed by chromosome.
#[derive(Debug, Clone, Default)]
pub struct CoverageGapIndex {
    chroms: AHashMap<String, ChromGaps>,
}

impl CoverageGapIndex {
    /// Builds an index from `(chromosome, gap)` pairs in any order.
    #[must_use]
    pub fn from_gaps<I, S>(gaps: I) -> Self
    where
        I: IntoIterator<Item = (S, CoverageGap)>,
        S: Into<String>,
    {
        let mut grouped: AHashMap<String, Vec<CoverageGap>> = AHashMap::new();
        for (chrom, gap) in gaps {
            grouped.entry(chrom.into()).or_default().push(gap);
        }
        let chroms =
            grouped.into_iter().map(|(chrom, gaps)| (chrom, ChromGaps::new(gaps))).collect();
        Self { chroms }
    }

    /// Parses BED3+ lines. Header, `track` and `browser` lines are skipped.
    pub fn from_bed_reader<R: BufRead>(reader: R, source: &str) -> Result<Self> {
        let mut gaps = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read {source}"))?;
            let line = line.trim_end();
            if is_bed_header(line) {
                continue;
            }
            gaps.push(parse_bed_line(line).map_err(|reason| UtrError::InvalidFileFormat {
                file_type: "BED".to_string(),
                path: source.to_string(),
                reason: format!("line {}: {reason}", i + 1),
            })?);
        }
        Ok(Self::from_gaps(gaps))
    }

    /// Loads the index from a BED cache file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open coverage gaps: {}", path.display()))?;
        Self::from_bed_reader(BufReader::new(file), &path.display().to_string())
    }

    /// Gaps touching the closed span `[start, end]` on `chrom`, in ascending start order.
    #[must_use]
    pub fn overlapping(&self, chrom: &str, start: Position, end: Position) -> Vec<CoverageGap> {
        self.chroms.get(chrom).map(|gaps| gaps.overlapping(start, end)).unwrap_or_default()
    }

    /// Gaps containing or immediately bordering `position` (`gap.start <= position <= gap.end`).
    #[must_use]
    pub fn filter(&self, chrom: &str, position: Position) -> Vec<CoverageGap> {
        self.overlapping(chrom, position, position)
    }

    /// Gaps on `chrom` covering a base of `[start, end)` or bordering its 3' edge on `strand`.
    ///
    /// A gap that only abuts the 5' edge is not returned.
    #[must_use]
    pub fn reaching(
        &self,
        chrom: &str,
        strand: Strand,
        start: Position,
        end: Position,
    ) -> Vec<CoverageGap> {
        let mut gaps = self.overlapping(chrom, start, end);
        gaps.retain(|gap| match strand {
            Strand::Forward => gap.end > start,
            Strand::Reverse => gap.start < end,
        });
        gaps
    }

    /// Number of gaps on `chrom`.
    #[must_use]
    pub fn num_gaps(&self, chrom: &str) -> usize {
        self.chroms.get(chrom).map_or(0, |gaps| gaps.gaps.len())
    }
}

impl IntervalLookup for CoverageGapIndex {
    type Entry = CoverageGap;

    fn entries(
        &self,
        chrom: &str,
        strand: Strand,
        start: Position,
        end: Position,
    ) -> Vec<CoverageGap> {
        self.reaching(chrom, strand, start, end)
    }
}

fn parse_bed_line(line: &str) -> std::result::Result<(String, CoverageGap), String> {
    let mut fields = line.split('\t');
    let (Some(chrom), Some(start), Some(end)) = (fields.next(), fields.next(), fields.next())
    else {
        return Err("expected at least 3 tab-separated columns".to_string());
    };
    let start: Position = start.parse().map_err(|_| format!("invalid start '{start}'"))?;
    let end: Position = end.parse().map_err(|_| format!("invalid end '{end}'"))?;
    if end < start {
        return Err(format!("end {end} is before start {start}"));
    }
    Ok((chrom.to_string(), CoverageGap::new(start, end)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Cursor;

    fn index() -> CoverageGapIndex {
        CoverageGapIndex::from_gaps([
            ("chr1", CoverageGap::new(150, 180)),
            ("chr1", CoverageGap::new(10, 1000)),
            ("chr1", CoverageGap::new(300, 310)),
            ("chr2", CoverageGap::new(5, 6)),
        ])
    }

    #[rstest]
    #[case(175, vec![(10, 1000), (150, 180)])]
    #[case(180, vec![(10, 1000), (150, 180)])]
    #[case(200, vec![(10, 1000)])]
    #[case(1000, vec![(10, 1000)])]
    #[case(1001, vec![])]
    #[case(9, vec![])]
    fn test_filter(#[case] position: Position, #[case] expected: Vec<(Position, Position)>) {
        let hits: Vec<_> =
            index().filter("chr1", position).into_iter().map(|g| (g.start, g.end)).collect();
        assert_eq!(hits, expected);
    }

    #[test]
    fn test_overlapping_span() {
        let index = index();
        let hits = index.overlapping("chr1", 100, 500);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0], CoverageGap::new(10, 1000));
        // A long early gap must not hide later, shorter ones
        let hits = index.overlapping("chr1", 305, 305);
        assert_eq!(hits, vec![CoverageGap::new(10, 1000), CoverageGap::new(300, 310)]);
        assert!(index.overlapping("chrX", 0, 10_000).is_empty());
        assert_eq!(index.overlapping("chr2", 6, 8), vec![CoverageGap::new(5, 6)]);
    }

    #[rstest]
    #[case(Strand::Forward, 6, 8, vec![])]
    #[case(Strand::Forward, 3, 5, vec![(5, 6)])]
    #[case(Strand::Forward, 5, 8, vec![(5, 6)])]
    #[case(Strand::Reverse, 3, 5, vec![])]
    #[case(Strand::Reverse, 6, 8, vec![(5, 6)])]
    #[case(Strand::Reverse, 4, 6, vec![(5, 6)])]
    fn test_reaching_ignores_gaps_at_five_prime_edge(
        #[case] strand: Strand,
        #[case] start: Position,
        #[case] end: Position,
        #[case] expected: Vec<(Position, Position)>,
    ) {
        let hits: Vec<_> = index()
            .entries("chr2", strand, start, end)
            .into_iter()
            .map(|g| (g.start, g.end))
            .collect();
        assert_eq!(hits, expected);
    }

    #[test]
    fn test_from_bed_reader() -> Result<()> {
        let bed = "track name=gaps\n# comment\nchr1\t150\t180\tgap1\nchr1\t10\t20\n\nchr3\t0\t5\n";
        let index = CoverageGapIndex::from_bed_reader(Cursor::new(bed), "gaps.bed")?;
        assert_eq!(index.num_gaps("chr1"), 2);
        assert_eq!(index.num_gaps("chr3"), 1);
        assert_eq!(index.num_gaps("chr2"), 0);
        Ok(())
    }

    #[rstest]
    #[case("chr1\t150\n", "line 1")]
    #[case("chr1\t1\t2\nchr1\tabc\t180\n", "invalid start")]
    #[case("chr1\t200\t100\n", "before start")]
    fn test_from_bed_reader_errors(#[case] bed: &str, #[case] expected: &str) {
        let err = CoverageGapIndex::from_bed_reader(Cursor::new(bed), "gaps.bed").unwrap_err();
        assert!(err.to_string().contains(expected), "{err}");
    }
}
