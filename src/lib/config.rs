//! Run configuration consumed by the annotation pipeline.

use crate::errors::{Result, UtrError};
use crate::feature::Position;

/// What to do when a transcript already carries a 3' UTR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UtrPolicy {
    /// Reject the peak for this transcript.
    #[default]
    Reject,
    /// Pull the transcript's 3' edge back to where the existing UTRs begin.
    Override,
    /// Push the transcript's 3' edge out to where the existing UTRs end.
    Extend,
}

impl UtrPolicy {
    /// Resolves the policy from the two mutually exclusive command-line flags.
    pub fn from_flags(override_utr: bool, extend_utr: bool) -> Result<Self> {
        match (override_utr, extend_utr) {
            (true, true) => Err(UtrError::InvalidParameter {
                parameter: "override-utr/extend-utr".to_string(),
                reason: "existing 3' UTRs cannot be both overridden and extended".to_string(),
            }),
            (true, false) => Ok(Self::Override),
            (false, true) => Ok(Self::Extend),
            (false, false) => Ok(Self::Reject),
        }
    }
}

/// Parameters of one annotation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationConfig {
    /// Number of worker threads (and peak batches).
    pub processors: usize,
    /// How far either side of a peak to look for genes.
    pub max_distance: Position,
    pub utr_policy: UtrPolicy,
    /// Assumed 5' extension of the next gene downstream.
    pub five_prime_ext: Position,
    /// Whether the feature database was loaded from GTF.
    pub gtf_in: bool,
    /// Capacity of the output channel; `None` uses `4 * processors`.
    pub queue_capacity: Option<usize>,
    /// Address-space ceiling for the whole process, in bytes.
    pub max_memory: Option<u64>,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            processors: std::thread::available_parallelism().map_or(1, usize::from),
            max_distance: 500,
            utr_policy: UtrPolicy::Reject,
            five_prime_ext: 0,
            gtf_in: false,
            queue_capacity: None,
            max_memory: None,
        }
    }
}

impl AnnotationConfig {
    /// Checks every parameter, returning the first that is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.processors == 0 {
            return Err(invalid("processors", "must be at least 1"));
        }
        if self.max_distance < 0 {
            return Err(invalid("max-distance", "must not be negative"));
        }
        if self.five_prime_ext < 0 {
            return Err(invalid("five-prime-ext", "must not be negative"));
        }
        if self.queue_capacity == Some(0) {
            return Err(invalid("queue-capacity", "must be at least 1"));
        }
        if self.max_memory == Some(0) {
            return Err(invalid("max-memory", "must be at least 1 byte"));
        }
        Ok(())
    }

    /// Effective output channel capacity.
    #[must_use]
    pub fn channel_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(4 * self.processors.max(1))
    }
}

fn invalid(parameter: &str, reason: &str) -> UtrError {
    UtrError::InvalidParameter { parameter: parameter.to_string(), reason: reason.to_string() }
}
