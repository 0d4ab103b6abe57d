//! Thread-per-batch scheduling of peak annotation.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐
//! │ worker 0   │──┐
//! ├────────────┤  │    ┌─────────────────┐    ┌─────────────────┐
//! │ worker 1   │──┼───>│ bounded channel │───>│ RunningPipeline │
//! ├────────────┤  │    │   (Outcome)     │    │   (iterator)    │
//! │ worker N-1 │──┘    └─────────────────┘    └─────────────────┘
//! └────────────┘
//! ```
//!
//! Peaks are split into contiguous batches of `ceil(total / processors)`. Every worker opens its
//! own gateway connection and loads its own copy of the interval indexes, then sends one
//! [`Outcome`] per peak in batch order. Nothing is ordered across workers.
//!
//! The consumer drains outcomes by iterating the [`RunningPipeline`] and then calls
//! [`RunningPipeline::finish`] to join the workers and surface any failure. Dropping the
//! pipeline early closes the channel, so blocked workers stop, and still joins them.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, bounded};
use log::{error, info, warn};

use super::outcome::Outcome;
use super::worker::run_batch;
use crate::config::AnnotationConfig;
use crate::errors::UtrError;
use crate::feature::Peak;
use crate::gateway::GatewayFactory;
use crate::memory::limit_memory;
use crate::metrics::{AnnotationCounters, AnnotationMetrics};
use crate::progress::ProgressTracker;
use crate::validation::validate_dir_exists;

const PROGRESS_MESSAGE: &str = "Iterating over peaks to annotate 3' UTRs";
const PROGRESS_INTERVAL: u64 = 10_000;

/// Splits `peaks` into at most `processors` contiguous batches of `ceil(total / processors)`.
#[must_use]
pub fn partition_peaks(peaks: &[Peak], processors: usize) -> Vec<Vec<Peak>> {
    if peaks.is_empty() {
        return Vec::new();
    }
    let batch_size = peaks.len().div_ceil(processors.max(1));
    peaks.chunks(batch_size).map(<[Peak]>::to_vec).collect()
}

/// A configured annotation run, ready to be started over a set of peaks.
pub struct AnnotationPipeline<F: GatewayFactory> {
    factory: Arc<F>,
    config: AnnotationConfig,
    cache_dir: Option<PathBuf>,
}

impl<F: GatewayFactory> AnnotationPipeline<F> {
    #[must_use]
    pub fn new(factory: F, config: AnnotationConfig) -> Self {
        Self { factory: Arc::new(factory), config, cache_dir: None }
    }

    /// Binds the directory holding the per-strand truncation points and coverage gaps.
    #[must_use]
    pub fn with_cache_dir<P: AsRef<Path>>(mut self, cache_dir: P) -> Self {
        self.cache_dir = Some(cache_dir.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn config(&self) -> &AnnotationConfig {
        &self.config
    }

    /// Validates the setup and starts one worker thread per batch of `peaks`.
    ///
    /// Each call gets fresh counters, so runs started from the same pipeline never share
    /// counts.
    ///
    /// # Errors
    ///
    /// Returns an error before any worker starts if the configuration is invalid, no cache
    /// directory is bound, the cache directory does not exist or the memory limit cannot be
    /// applied.
    pub fn start(&self, peaks: &[Peak]) -> Result<RunningPipeline> {
        self.config.validate()?;
        let cache_dir = self.cache_dir.clone().ok_or_else(|| UtrError::MissingCacheDir {
            pipeline: "AnnotationPipeline".to_string(),
        })?;
        validate_dir_exists(&cache_dir, "Cache directory")?;
        if let Some(max_memory) = self.config.max_memory {
            limit_memory(max_memory)?;
        }

        let batches = partition_peaks(peaks, self.config.processors);
        info!(
            "Annotating {} peaks in {} batch(es) with {} worker thread(s)",
            peaks.len(),
            batches.len(),
            batches.len()
        );

        let counters = Arc::new(AnnotationCounters::new());
        let (tx, rx) = bounded(self.config.channel_capacity());
        let mut handles = Vec::with_capacity(batches.len());
        for (index, batch) in batches.into_iter().enumerate() {
            let factory = Arc::clone(&self.factory);
            let counters = Arc::clone(&counters);
            let config = self.config.clone();
            let cache_dir = cache_dir.clone();
            let tx = tx.clone();
            let handle = thread::Builder::new()
                .name(format!("utrext-worker-{index}"))
                .spawn(move || {
                    run_batch(factory.as_ref(), &cache_dir, &config, &counters, &batch, &tx)
                })
                .with_context(|| format!("Failed to spawn annotation worker {index}"))?;
            handles.push(handle);
        }
        // Only the workers hold senders now, so the channel closes when the last one exits.
        drop(tx);

        let total_peaks = peaks.len() as u64;
        Ok(RunningPipeline {
            receiver: Some(rx),
            handles,
            progress: ProgressTracker::new(PROGRESS_MESSAGE)
                .with_interval(PROGRESS_INTERVAL)
                .with_total(total_peaks),
            counters,
            total_peaks,
            finished: false,
        })
    }
}

/// The workers of a started run and the receiving end of their output channel.
///
/// Iterating yields outcomes as workers produce them. Workers are always joined: by
/// [`finish`](Self::finish), or on drop.
pub struct RunningPipeline {
    /// Option so the channel can be closed before joining.
    receiver: Option<Receiver<Outcome>>,
    handles: Vec<JoinHandle<Result<()>>>,
    progress: ProgressTracker,
    counters: Arc<AnnotationCounters>,
    total_peaks: u64,
    finished: bool,
}

impl RunningPipeline {
    /// Number of worker threads started.
    #[must_use]
    pub fn num_workers(&self) -> usize {
        self.handles.len()
    }

    /// Counters updated by this run's workers.
    #[must_use]
    pub fn counters(&self) -> &AnnotationCounters {
        &self.counters
    }

    /// Drains any outcomes not yet consumed, joins every worker and returns the run's metrics.
    ///
    /// # Errors
    ///
    /// Returns [`UtrError::WorkersFailed`] if any worker returned an error or panicked. The
    /// outcomes already received from the other workers remain valid.
    pub fn finish(mut self) -> Result<AnnotationMetrics> {
        let mut discarded = 0_u64;
        for _ in self.by_ref() {
            discarded += 1;
        }
        if discarded > 0 {
            warn!("Discarded {discarded} outcome(s) not consumed before finish");
        }
        drop(self.receiver.take());

        let total = self.handles.len();
        let failures = self.join_workers();
        self.progress.log_final();
        self.finished = true;

        if !failures.is_empty() {
            return Err(UtrError::WorkersFailed {
                failed: failures.len(),
                total,
                details: failures.join("; "),
            }
            .into());
        }
        Ok(AnnotationMetrics::from_counters(self.total_peaks, &self.counters))
    }

    /// Joins all workers, returning one message per failed worker.
    fn join_workers(&mut self) -> Vec<String> {
        let mut failures = Vec::new();
        for (index, handle) in self.handles.drain(..).enumerate() {
            let failure = match handle.join() {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => format!("worker {index}: {e:#}"),
                Err(_) => format!("worker {index}: panicked"),
            };
            error!("Annotation {failure}");
            failures.push(failure);
        }
        failures
    }
}

impl Iterator for RunningPipeline {
    type Item = Outcome;

    fn next(&mut self) -> Option<Self::Item> {
        let outcome = self.receiver.as_ref()?.recv().ok()?;
        self.progress.log_if_needed(1);
        Some(outcome)
    }
}

impl Drop for RunningPipeline {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // Close the receiver first so workers blocked on a full channel can exit.
        drop(self.receiver.take());
        let failures = self.join_workers();
        if !failures.is_empty() {
            warn!("{} annotation worker(s) failed before the pipeline was finished", failures.len());
        }
        self.progress.log_final();
    }
}
