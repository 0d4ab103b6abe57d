//! Input files for annotation runs.
//!
//! The fixture annotation has four genes on `chr1`, and the peaks are chosen so that each
//! outcome occurs at least once:
//!
//! | peak  | strand | outcome                                    |
//! |-------|--------|--------------------------------------------|
//! | `pA`  | `+`    | UTR on `g1`, cut at truncation point 2300  |
//! | `pB`  | `+`    | no gene nearby                             |
//! | `pC`  | `+`    | within `g1`'s transcript, no UTR           |
//! | `pD`  | `-`    | UTR on `g3`                                |
//! | `pE`  | `+`    | UTR on `g4` collapsed by a coverage gap    |

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use utrext_lib::feature::{Peak, Strand};

pub const ANNOTATION_GFF3: &str = "\
##gff-version 3
chr1\ttest\tgene\t1000\t2000\t.\t+\t.\tID=g1;Name=alpha
chr1\ttest\tmRNA\t1000\t2000\t.\t+\t.\tID=t1;Parent=g1
chr1\ttest\texon\t1000\t1500\t.\t+\t.\tID=e1;Parent=t1
chr1\ttest\tgene\t3000\t4000\t.\t+\t.\tID=g2
chr1\ttest\tmRNA\t3000\t4000\t.\t+\t.\tID=t2;Parent=g2
chr1\ttest\tgene\t6000\t7000\t.\t-\t.\tID=g3
chr1\ttest\tmRNA\t6000\t7000\t.\t-\t.\tID=t3;Parent=g3
chr1\ttest\tgene\t10000\t11000\t.\t+\t.\tID=g4
chr1\ttest\tmRNA\t10000\t11000\t.\t+\t.\tID=t4;Parent=g4
";

pub const ANNOTATION_GTF: &str = "\
chr1\ttest\texon\t1000\t1500\t.\t+\t.\tgene_id \"g1\"; transcript_id \"t1\";
chr1\ttest\texon\t1800\t2000\t.\t+\t.\tgene_id \"g1\"; transcript_id \"t1\";
chr1\ttest\texon\t6000\t7000\t.\t-\t.\tgene_id \"g3\"; transcript_id \"t3\";
";

pub const PEAKS_BED: &str = "\
track name=peaks
chr1\t1900\t2400\tpA\t0\t+
chr1\t50000\t50100\tpB\t0\t+
chr1\t1200\t1400\tpC\t0\t+
chr1\t5600\t6100\tpD\t0\t-
chr1\t10900\t11300\tpE\t0\t+
";

/// Paths of one set of input files in a temporary directory.
pub struct Inputs {
    pub annotation: PathBuf,
    pub peaks: PathBuf,
    pub cache_dir: PathBuf,
}

/// Writes the truncation point and coverage gap caches for both strands.
pub fn write_cache(dir: &Path) -> PathBuf {
    let cache_dir = dir.join("cache");
    fs::create_dir_all(&cache_dir).unwrap();
    fs::write(cache_dir.join("forward_unmapped.json"), r#"{"chr1": [2300]}"#).unwrap();
    fs::write(cache_dir.join("reverse_unmapped.json"), "{}").unwrap();
    fs::write(cache_dir.join("forward_coverage_gaps.bed"), "chr1\t11000\t11200\n").unwrap();
    fs::write(cache_dir.join("reverse_coverage_gaps.bed"), "").unwrap();
    cache_dir
}

/// Writes the GFF3 annotation, the peaks and the cache into `dir`.
pub fn write_inputs(dir: &Path) -> Inputs {
    let annotation = dir.join("genes.gff3");
    fs::write(&annotation, ANNOTATION_GFF3).unwrap();
    let peaks = dir.join("peaks.bed");
    fs::write(&peaks, PEAKS_BED).unwrap();
    Inputs { annotation, peaks, cache_dir: write_cache(dir) }
}

/// Many peaks spread over the fixture genes, with repeated names.
pub fn many_peaks(n: usize) -> Vec<Peak> {
    let templates = [
        (1900, 2400, Strand::Forward),
        (50_000, 50_100, Strand::Forward),
        (1200, 1400, Strand::Forward),
        (5600, 6100, Strand::Reverse),
        (10_900, 11_300, Strand::Forward),
    ];
    (0..n)
        .map(|i| {
            let (start, end, strand) = templates[i % templates.len()];
            Peak::new("chr1", start, end, strand, format!("peak{}", i % 13))
        })
        .collect()
}
