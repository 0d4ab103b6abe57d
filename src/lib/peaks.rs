//! Reading peaks from BED6 files.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};

use crate::errors::UtrError;
use crate::feature::{Peak, Position, Strand};

/// Returns true for BED lines that carry no interval.
pub(crate) fn is_bed_header(line: &str) -> bool {
    line.is_empty()
        || line.starts_with('#')
        || line.starts_with("track")
        || line.starts_with("browser")
}

/// Reads BED6 peaks (`chrom start end name score strand`) in file order.
///
/// `source` names the input in error messages.
pub fn read_peaks<R: BufRead>(reader: R, source: &str) -> Result<Vec<Peak>> {
    let mut peaks = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {source}"))?;
        let line = line.trim_end();
        if is_bed_header(line) {
            continue;
        }
        let peak = parse_peak(line).map_err(|reason| UtrError::InvalidFileFormat {
            file_type: "BED".to_string(),
            path: source.to_string(),
            reason: format!("line {}: {reason}", i + 1),
        })?;
        peaks.push(peak);
    }
    Ok(peaks)
}

/// Reads BED6 peaks from a file.
pub fn read_peaks_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Peak>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open peaks: {}", path.display()))?;
    read_peaks(BufReader::new(file), &path.display().to_string())
}

fn parse_peak(line: &str) -> std::result::Result<Peak, String> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 6 {
        return Err(format!("expected 6 tab-separated columns, found {}", fields.len()));
    }
    let start: Position =
        fields[1].parse().map_err(|_| format!("invalid start '{}'", fields[1]))?;
    let end: Position = fields[2].parse().map_err(|_| format!("invalid end '{}'", fields[2]))?;
    let strand: Strand = fields[5].parse().map_err(|e: UtrError| e.to_string())?;
    Ok(Peak::new(fields[0], start, end, strand, fields[3]))
}
