//! Deduplicating counters shared across annotation workers.
//!
//! Several workers may independently observe the same peak failing the same criterion or having
//! no nearby features. Statistics must count distinct peaks rather than distinct detections, so
//! each [`DedupCounter`] remembers the keys it has already counted.

use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashSet;
use parking_lot::Mutex;

use crate::rejection::RejectionReason;

/// Thread-safe counter that counts each key at most once.
///
/// [`DedupCounter::add`] is idempotent per key for the counter's whole lifetime, while
/// [`DedupCounter::increment`] always counts. Each counter owns its own set of seen keys, so the
/// same peak may be counted once by each of several counters.
///
/// # Example
/// ```
/// use utrext_metrics::counter::DedupCounter;
///
/// let counter = DedupCounter::new();
/// counter.add("peak_1");
/// counter.add("peak_1");
/// counter.increment();
/// assert_eq!(counter.value(), 2);
/// ```
#[derive(Debug, Default)]
pub struct DedupCounter {
    value: AtomicU64,
    seen: Mutex<AHashSet<String>>,
}

impl DedupCounter {
    /// Creates a counter at zero with no seen keys.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts `key` if it has never been added before.
    ///
    /// Returns `true` if this call incremented the counter.
    pub fn add(&self, key: &str) -> bool {
        let mut seen = self.seen.lock();
        if seen.contains(key) {
            return false;
        }
        seen.insert(key.to_owned());
        // Incremented under the lock so `value` never lags behind `seen` for a finished add.
        self.value.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Increments the counter unconditionally.
    pub fn increment(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Current total.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Returns true if `key` has been counted through [`DedupCounter::add`].
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.seen.lock().contains(key)
    }
}

/// One [`DedupCounter`] per [`RejectionReason`], keyed by peak name.
#[derive(Debug, Default)]
pub struct RejectionCounters {
    counters: [DedupCounter; RejectionReason::ALL.len()],
}

impl RejectionCounters {
    /// Creates an empty set of counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `peak` failed for `reason`. Returns `true` the first time for that pair.
    pub fn record(&self, reason: RejectionReason, peak: &str) -> bool {
        self.counters[reason.index()].add(peak)
    }

    /// Number of distinct peaks rejected for `reason`.
    #[must_use]
    pub fn count(&self, reason: RejectionReason) -> u64 {
        self.counters[reason.index()].value()
    }

    /// Total across all reasons. A peak rejected for two reasons is counted twice.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counters.iter().map(DedupCounter::value).sum()
    }

    /// Per-reason counts in criteria-chain order.
    #[must_use]
    pub fn summary(&self) -> Vec<(RejectionReason, u64)> {
        RejectionReason::ALL.iter().map(|r| (*r, self.count(*r))).collect()
    }
}

/// The counters of one annotation run, shared by all workers.
#[derive(Debug, Default)]
pub struct AnnotationCounters {
    /// Peaks with no gene within the search window, by peak name.
    pub no_features: DedupCounter,
    /// Annotated UTRs; incremented once per annotation record.
    pub new_utrs: DedupCounter,
    /// Peaks whose UTR collapsed to zero length, by peak name.
    pub zero_coverage_removals: DedupCounter,
    /// Peaks for which no candidate gene produced a UTR, by peak name.
    pub no_utr: DedupCounter,
    /// Peaks that failed a criterion at some candidate gene, per criterion. A peak is counted
    /// as soon as it fails, even if a later gene is then annotated from it.
    pub rejections: RejectionCounters,
}

impl AnnotationCounters {
    /// Creates an empty set of run counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
