//! Process-wide address-space ceiling.
//!
//! The limit is set on the whole process before any worker starts, so every worker shares it.
//! An allocation that would breach it fails and aborts the process; nothing is retried.

use log::info;

use crate::errors::{Result, UtrError};

/// Caps the address space of the process at `max_bytes`, keeping the current hard limit.
///
/// # Errors
///
/// Returns [`UtrError::MemoryLimit`] if `max_bytes` is above the hard limit, the limit cannot be
/// read or set, or the platform has no address-space limit.
#[cfg(unix)]
pub fn limit_memory(max_bytes: u64) -> Result<()> {
    use rlimit::Resource;

    let (_, hard) = Resource::AS.get().map_err(|e| memory_error(max_bytes, &e.to_string()))?;
    check_within_hard_limit(max_bytes, hard)?;
    Resource::AS.set(max_bytes, hard).map_err(|e| memory_error(max_bytes, &e.to_string()))?;
    info!("Limited process address space to {max_bytes} bytes");
    Ok(())
}

#[cfg(not(unix))]
pub fn limit_memory(max_bytes: u64) -> Result<()> {
    Err(memory_error(max_bytes, "address-space limits are only supported on Unix"))
}

/// The current soft address-space limit, or `None` if unlimited.
///
/// # Errors
///
/// Returns [`UtrError::MemoryLimit`] if the limit cannot be read.
#[cfg(unix)]
pub fn memory_limit() -> Result<Option<u64>> {
    use rlimit::{INFINITY, Resource};

    let (soft, _) = Resource::AS.get().map_err(|e| memory_error(0, &e.to_string()))?;
    Ok((soft != INFINITY).then_some(soft))
}

fn check_within_hard_limit(max_bytes: u64, hard: u64) -> Result<()> {
    if max_bytes > hard {
        return Err(memory_error(max_bytes, &format!("above the hard limit of {hard} bytes")));
    }
    Ok(())
}

fn memory_error(max_bytes: u64, reason: &str) -> UtrError {
    UtrError::MemoryLimit { max_bytes, reason: reason.to_string() }
}
