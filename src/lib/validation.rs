//! Input validation utilities
//!
//! Checks on command-line paths and numeric parameters that fail with structured
//! [`UtrError`]s.

use crate::errors::{Result, UtrError};
use std::fmt::Display;
use std::path::Path;

/// Validate that a file exists
///
/// # Errors
/// Returns an error if the file does not exist
///
/// # Example
/// ```
/// use utrext_lib::validation::validate_file_exists;
///
/// let result = validate_file_exists("/nonexistent/peaks.bed", "Peaks");
/// assert!(result.is_err());
/// ```
pub fn validate_file_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    if !path_ref.is_file() {
        return Err(UtrError::InvalidFileFormat {
            file_type: description.to_string(),
            path: path_ref.display().to_string(),
            reason: "File does not exist".to_string(),
        });
    }
    Ok(())
}

/// Validate that multiple files exist, failing on the first missing one
///
/// # Errors
/// Returns an error for the first file that doesn't exist
pub fn validate_files_exist<P: AsRef<Path>>(files: &[(P, &str)]) -> Result<()> {
    for (path, desc) in files {
        validate_file_exists(path, desc)?;
    }
    Ok(())
}

/// Validate that a directory exists
///
/// # Errors
/// Returns an error if `path` does not exist or is not a directory
pub fn validate_dir_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    if !path_ref.is_dir() {
        return Err(UtrError::InvalidParameter {
            parameter: description.to_string(),
            reason: format!("Directory does not exist: {}", path_ref.display()),
        });
    }
    Ok(())
}

/// Validate that a value is positive (> 0)
///
/// # Errors
/// Returns an error if the value is not positive
///
/// # Example
/// ```
/// use utrext_lib::validation::validate_positive;
///
/// validate_positive(4, "threads").unwrap();
/// assert!(validate_positive(0, "threads").is_err());
/// ```
#[allow(clippy::needless_pass_by_value)]
pub fn validate_positive<T: Ord + Display + Default>(value: T, name: &str) -> Result<()> {
    if value <= T::default() {
        return Err(UtrError::InvalidParameter {
            parameter: name.to_string(),
            reason: format!("Must be positive (> 0), got: {value}"),
        });
    }
    Ok(())
}

/// Validate that a value is not negative (>= 0)
///
/// # Errors
/// Returns an error if the value is negative
#[allow(clippy::needless_pass_by_value)]
pub fn validate_non_negative<T: Ord + Display + Default>(value: T, name: &str) -> Result<()> {
    if value < T::default() {
        return Err(UtrError::InvalidParameter {
            parameter: name.to_string(),
            reason: format!("Must not be negative, got: {value}"),
        });
    }
    Ok(())
}
