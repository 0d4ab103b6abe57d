//! Custom error types for utrext operations.

use thiserror::Error;

/// Result type alias for utrext operations
pub type Result<T> = std::result::Result<T, UtrError>;

/// Error type for utrext operations
#[derive(Error, Debug)]
pub enum UtrError {
    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// File format error
    #[error("Invalid {file_type} file '{path}': {reason}")]
    InvalidFileFormat {
        /// Type of file (e.g., "BED", "GFF3")
        file_type: String,
        /// Path to the file
        path: String,
        /// Explanation of the problem
        reason: String,
    },

    /// The pipeline was started without a cache directory to load interval indexes from
    #[error("{pipeline} requires a cache directory holding truncation points and coverage gaps")]
    MissingCacheDir {
        /// Name of the pipeline type
        pipeline: String,
    },

    /// A feature referenced by another was not found in the feature database
    #[error("Feature '{id}' not found in feature database")]
    FeatureNotFound {
        /// The feature identifier
        id: String,
    },

    /// The process address-space limit could not be applied
    #[error("Failed to limit memory to {max_bytes} bytes: {reason}")]
    MemoryLimit {
        /// The requested limit
        max_bytes: u64,
        /// Why it could not be applied
        reason: String,
    },

    /// One or more annotation workers failed
    #[error("{failed} of {total} annotation workers failed: {details}")]
    WorkersFailed {
        /// Number of workers that failed
        failed: usize,
        /// Number of workers started
        total: usize,
        /// Per-worker failure messages
        details: String,
    },
}
