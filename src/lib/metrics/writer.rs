//! Utilities for writing metrics files.
//!
//! Metrics are written as a header line plus one tab-separated row per record.

use anyhow::{Context, Result};
use fgoxide::io::DelimFile;
use serde::Serialize;
use std::path::Path;

use super::Metric;

/// Writes metrics to a TSV file.
///
/// `description` names the metrics in the error message if the file cannot be written.
///
/// # Errors
/// Returns an error if the file cannot be created or written to
///
/// # Example
/// ```no_run
/// use utrext_lib::metrics::AnnotationMetrics;
/// use utrext_lib::metrics::writer::write_metrics;
/// use std::path::Path;
///
/// let metrics = vec![AnnotationMetrics { total_peaks: 10, ..Default::default() }];
/// write_metrics(Path::new("annotate.metrics.txt"), &metrics, "annotation").unwrap();
/// ```
pub fn write_metrics<P: AsRef<Path>, T: Serialize>(
    path: P,
    metrics: &[T],
    description: &str,
) -> Result<()> {
    let path = path.as_ref().to_path_buf();
    DelimFile::default()
        .write_tsv(&path, metrics)
        .with_context(|| format!("Failed to write {} metrics: {}", description, path.display()))
}

/// Writes metrics to a TSV file, naming them by [`Metric::metric_name`] in errors.
///
/// # Errors
/// Returns an error if the file cannot be created or written to
pub fn write_metrics_auto<P: AsRef<Path>, T: Metric>(path: P, metrics: &[T]) -> Result<()> {
    write_metrics(path, metrics, T::metric_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::AnnotationMetrics;
    use std::fs;
    use tempfile::NamedTempFile;

    fn sample() -> AnnotationMetrics {
        AnnotationMetrics {
            total_peaks: 12,
            utrs_annotated: 5,
            peaks_no_nearby_features: 3,
            peaks_no_utr: 4,
            peaks_belonging_to_next_gene: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_write_metrics_header_and_row() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        write_metrics(temp_file.path(), &[sample()], "annotation")?;

        let content = fs::read_to_string(temp_file.path())?;
        let mut lines = content.lines();
        let header: Vec<_> = lines.next().unwrap_or_default().split('\t').collect();
        assert_eq!(header[0], "total_peaks");
        assert!(header.contains(&"peaks_belonging_to_next_gene"));
        let row: Vec<_> = lines.next().unwrap_or_default().split('\t').collect();
        assert_eq!(row[0], "12");
        assert_eq!(row[1], "5");
        Ok(())
    }

    #[test]
    fn test_write_metrics_invalid_path() {
        let result = write_metrics("/invalid/path/metrics.txt", &[sample()], "annotation");
        let err = result.expect_err("writing into a missing directory should fail");
        assert!(err.to_string().contains("Failed to write annotation metrics"));
    }

    #[test]
    fn test_write_metrics_auto_reads_back() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        write_metrics_auto(temp_file.path(), &[sample()])?;

        let path = temp_file.path().to_path_buf();
        let read: Vec<AnnotationMetrics> = DelimFile::default().read_tsv(&path)?;
        assert_eq!(read, vec![sample()]);
        Ok(())
    }
}
