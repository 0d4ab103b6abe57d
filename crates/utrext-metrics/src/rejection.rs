//! Rejection reason tracking for peaks.
//!
//! This module provides the reasons a peak can fail to become a 3' UTR extension for a
//! candidate transcript, enabling per-criterion statistics and debugging.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reasons why a peak was rejected as a 3' UTR extension of a transcript.
///
/// Each variant corresponds to one step of the criteria chain, in the order the chain
/// applies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RejectionReason {
    /// The transcript already carries a 3' UTR annotation
    UtrAlreadyAnnotated,
    /// The peak lies wholly within the transcript
    PeakWithinTranscript,
    /// The peak does not extend past the 3' edge of the transcript
    FivePrimeEnd,
    /// The peak belongs to the next gene downstream
    BelongsToNextGene,
}

impl RejectionReason {
    /// All reasons, in criteria-chain order.
    pub const ALL: [RejectionReason; 4] = [
        Self::UtrAlreadyAnnotated,
        Self::PeakWithinTranscript,
        Self::FivePrimeEnd,
        Self::BelongsToNextGene,
    ];

    /// Returns a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::UtrAlreadyAnnotated => "Peaks corresponding to an already annotated 3' UTR",
            Self::PeakWithinTranscript => "Peaks contained within a feature",
            Self::FivePrimeEnd => "Peaks corresponding to 5'-end of a feature",
            Self::BelongsToNextGene => "Peaks belonging to the next gene downstream",
        }
    }

    /// Position of this reason in [`RejectionReason::ALL`].
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::UtrAlreadyAnnotated => 0,
            Self::PeakWithinTranscript => 1,
            Self::FivePrimeEnd => 2,
            Self::BelongsToNextGene => 3,
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Formats a count with thousands separators.
///
/// # Panics
///
/// Cannot panic: input is always valid UTF-8 since it comes from `u64::to_string()`.
///
/// # Examples
///
/// ```
/// use utrext_metrics::rejection::format_count;
///
/// assert_eq!(format_count(1234567), "1,234,567");
/// assert_eq!(format_count(123), "123");
/// ```
#[must_use]
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
