//! Formatting helpers for log output and the end-of-run summary.

use std::time::{Duration, Instant};

use crate::metrics::{AnnotationMetrics, format_count};

/// Formats a fraction (0.0-1.0) as a percentage with `decimals` decimal places.
///
/// # Examples
///
/// ```
/// use utrext_lib::logging::format_percent;
///
/// assert_eq!(format_percent(0.9543, 2), "95.43%");
/// assert_eq!(format_percent(1.0, 0), "100%");
/// ```
#[must_use]
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.decimals$}%", value * 100.0, decimals = decimals)
}

/// `numerator` as a share of `total`; 0% when `total` is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_share(numerator: u64, total: u64, decimals: usize) -> String {
    let fraction = if total == 0 { 0.0 } else { numerator as f64 / total as f64 };
    format_percent(fraction, decimals)
}

/// Formats a duration as e.g. "45s", "2m 15s" or "1h 30m".
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        let (mins, rem) = (secs / 60, secs % 60);
        if rem == 0 { format!("{mins}m") } else { format!("{mins}m {rem}s") }
    } else {
        let (hours, mins) = (secs / 3600, (secs % 3600) / 60);
        if mins == 0 { format!("{hours}h") } else { format!("{hours}h {mins}m") }
    }
}

/// Formats a processing rate, switching to per-minute below one peak per second.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_rate(count: u64, duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        return format!("{} peaks/s", format_count(count));
    }
    let rate = count as f64 / secs;
    if rate >= 1.0 {
        format!("{} peaks/s", format_count(rate as u64))
    } else {
        format!("{:.1} peaks/min", count as f64 / (secs / 60.0))
    }
}

/// One summary line: `"{label}: {count}"`, with the share of `total` when given.
#[must_use]
pub fn format_stats_line(label: &str, count: u64, total: Option<u64>) -> String {
    match total {
        Some(total) => {
            format!("{label}: {} ({})", format_count(count), format_share(count, total, 0))
        }
        None => format!("{label}: {}", format_count(count)),
    }
}

/// Logs the end-of-run statistics.
pub fn log_annotation_summary(metrics: &AnnotationMetrics) {
    let total = Some(metrics.total_peaks);
    log::info!("3' UTR Annotation Summary:");
    log::info!("  {}", format_stats_line("Total peaks", metrics.total_peaks, None));
    log::info!("  {}", format_stats_line("Total 3' UTRs annotated", metrics.utrs_annotated, None));
    log::info!(
        "  {}",
        format_stats_line("Peaks with no nearby features", metrics.peaks_no_nearby_features, total)
    );
    log::info!(
        "  {}",
        format_stats_line(
            "Peaks whose 3' UTR was removed for zero coverage",
            metrics.peaks_zero_coverage,
            total
        )
    );
    log::info!("  {}", format_stats_line("Peaks with no 3' UTR", metrics.peaks_no_utr, total));
    for (reason, count) in metrics.rejection_summary() {
        log::info!("  {}", format_stats_line(reason.description(), count, total));
    }
}

/// Times an operation and logs its completion with a count and rate.
///
/// # Examples
///
/// ```no_run
/// use utrext_lib::logging::OperationTimer;
///
/// let timer = OperationTimer::new("Annotating peaks");
/// // ... do work ...
/// timer.log_completion(10_000);
/// ```
pub struct OperationTimer {
    operation: String,
    start_time: Instant,
}

impl OperationTimer {
    /// Creates a timer and logs the start of the operation.
    #[must_use]
    pub fn new(operation: &str) -> Self {
        log::info!("{operation} ...");
        Self { operation: operation.to_string(), start_time: Instant::now() }
    }

    pub fn log_completion(&self, count: u64) {
        let duration = self.start_time.elapsed();
        log::info!(
            "{} completed: {} peaks in {} ({})",
            self.operation,
            format_count(count),
            format_duration(duration),
            format_rate(count, duration)
        );
    }
}
