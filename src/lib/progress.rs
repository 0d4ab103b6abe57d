//! Progress tracking utilities
//!
//! A thread-safe tracker that logs each time the number of processed items crosses an interval
//! boundary, optionally reporting the share of a known total.

use log::info;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::logging::format_share;

/// Thread-safe progress tracker for logging progress at regular intervals.
///
/// # Example
/// ```
/// use utrext_lib::progress::ProgressTracker;
///
/// let tracker = ProgressTracker::new("Annotated peaks").with_interval(100).with_total(250);
///
/// for _ in 0..250 {
///     tracker.log_if_needed(1); // Logs at 100 and 200
/// }
/// tracker.log_final(); // Logs "Annotated peaks 250/250 (100.00%) (complete)"
/// ```
pub struct ProgressTracker {
    /// Progress is logged when the count crosses multiples of this.
    interval: u64,
    message: String,
    /// Expected number of items, if known.
    total: Option<u64>,
    count: AtomicU64,
}

impl ProgressTracker {
    /// Creates a tracker with a default interval of 10,000.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { interval: 10_000, message: message.into(), total: None, count: AtomicU64::new(0) }
    }

    /// Sets the logging interval.
    #[must_use]
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval.max(1);
        self
    }

    /// Sets the expected total, which is then reported alongside each count.
    #[must_use]
    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    fn describe(&self, count: u64) -> String {
        match self.total {
            Some(total) => {
                format!("{} {count}/{total} ({})", self.message, format_share(count, total, 2))
            }
            None => format!("{} {count}", self.message),
        }
    }

    /// Adds to the count and logs once per interval boundary crossed.
    ///
    /// Returns `true` if the new count lies exactly on an interval boundary.
    pub fn log_if_needed(&self, additional: u64) -> bool {
        if additional == 0 {
            let count = self.count.load(Ordering::Relaxed);
            return count > 0 && count.is_multiple_of(self.interval);
        }

        let prev = self.count.fetch_add(additional, Ordering::Relaxed);
        let new_count = prev + additional;
        for i in (prev / self.interval + 1)..=(new_count / self.interval) {
            info!("{}", self.describe(i * self.interval));
        }
        new_count.is_multiple_of(self.interval)
    }

    /// Logs the final count with "(complete)" unless it was just logged on a boundary.
    pub fn log_final(&self) {
        if !self.log_if_needed(0) {
            let count = self.count.load(Ordering::Relaxed);
            if count > 0 {
                info!("{} (complete)", self.describe(count));
            }
        }
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_defaults() {
        let tracker = ProgressTracker::new("Processing");
        assert_eq!(tracker.interval, 10_000);
        assert_eq!(tracker.count(), 0);
        assert_eq!(tracker.describe(5), "Processing 5");
        assert_eq!(ProgressTracker::new("Test").with_interval(0).interval, 1);
    }

    #[test]
    fn test_describe_with_total() {
        let tracker = ProgressTracker::new("Peaks").with_total(200);
        assert_eq!(tracker.describe(50), "Peaks 50/200 (25.00%)");
    }

    #[test]
    fn test_log_if_needed_returns_correctly() {
        let tracker = ProgressTracker::new("Test").with_interval(10);
        assert!(!tracker.log_if_needed(0));
        assert!(!tracker.log_if_needed(5));
        assert!(tracker.log_if_needed(5));
        assert!(tracker.log_if_needed(0));
        assert!(!tracker.log_if_needed(25));
        assert!(tracker.log_if_needed(5));
        assert_eq!(tracker.count(), 40);
    }

    #[test]
    fn test_thread_safety() {
        let tracker = Arc::new(ProgressTracker::new("Test").with_interval(1000));
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                thread::spawn(move || {
                    for _ in 0..100 {
                        tracker.log_if_needed(1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(tracker.count(), 1000);
        tracker.log_final();
    }
}
