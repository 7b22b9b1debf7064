//! Bounded worker pool with a per-task timeout.
//!
//! One task per source descriptor. At most `width` tasks are in flight;
//! each is wrapped in its own timeout so a slow source fails alone. Tasks
//! finish in whatever order the network allows, but every result is
//! written into the slot of the descriptor that produced it, so the
//! returned vector is in submission order.

use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};

use crate::adapter::Query;
use crate::adapters::invoke;
use crate::config::PipelineConfig;
use crate::error::DigestError;
use crate::http::Transport;
use crate::types::{FetchResult, SourceDescriptor};

/// Fixed-width pool parameterised by width and per-task timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    width: usize,
    task_timeout: Duration,
}

impl WorkerPool {
    /// Creates a pool of `width` concurrent tasks.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Config`] for zero width or a zero timeout.
    pub fn new(width: usize, task_timeout: Duration) -> Result<Self, DigestError> {
        if width == 0 {
            return Err(DigestError::Config("worker pool width must be > 0".into()));
        }
        if task_timeout.is_zero() {
            return Err(DigestError::Config("task timeout must be > 0".into()));
        }
        Ok(Self {
            width,
            task_timeout,
        })
    }

    /// Pool sized from `config.workers` and `config.task_timeout_seconds`.
    ///
    /// # Errors
    ///
    /// Same as [`WorkerPool::new`].
    pub fn from_config(config: &PipelineConfig) -> Result<Self, DigestError> {
        Self::new(
            config.workers,
            Duration::from_secs(config.task_timeout_seconds),
        )
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn task_timeout(&self) -> Duration {
        self.task_timeout
    }

    /// Run every source once and return one result per source.
    ///
    /// The output has exactly `sources.len()` entries, `results[i]` being
    /// the outcome of `sources[i]`. A task that errors or exceeds the
    /// timeout yields a failed result; it never aborts its siblings.
    pub async fn run<T: Transport>(
        &self,
        transport: &T,
        sources: &[SourceDescriptor],
        query: &Query,
        config: &PipelineConfig,
    ) -> Vec<FetchResult> {
        let timeout = self.task_timeout;
        let tasks = sources.iter().enumerate().map(|(index, source)| async move {
            let started = Instant::now();
            let task = invoke(transport, source, query, config);
            let result = match tokio::time::timeout(timeout, task).await {
                Ok(result) => result,
                Err(_) => {
                    let err =
                        DigestError::Timeout(format!("no response after {}s", timeout.as_secs_f64()));
                    tracing::warn!(source = %source.label(), error = %err, "source task timed out");
                    let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                    FetchResult::failed(source.clone(), err).with_duration_ms(elapsed)
                }
            };
            (index, result)
        });

        let mut slots: Vec<Option<FetchResult>> = vec![None; sources.len()];
        let mut completions = stream::iter(tasks).buffer_unordered(self.width);
        while let Some((index, result)) = completions.next().await {
            slots[index] = Some(result);
        }

        slots
            .into_iter()
            .zip(sources)
            .map(|(slot, source)| {
                slot.unwrap_or_else(|| {
                    FetchResult::failed(source.clone(), "task produced no result")
                })
            })
            .collect()
    }
}
