// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the queue worker pool.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;
use uuid::Uuid;

/// Worker pool started consuming a queue.
///
/// # Log Level
/// `info!` - Important operational event
pub struct WorkerPoolStarted<'a> {
    pub queue: &'a str,
    pub workers: usize,
}

impl Display for WorkerPoolStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Worker pool started on queue '{}' with {} workers",
            self.queue, self.workers
        )
    }
}

impl StructuredLog for WorkerPoolStarted<'_> {
    fn log(&self) {
        tracing::info!(queue = self.queue, workers = self.workers, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "worker_pool",
            span_name = name,
            queue = self.queue,
            workers = self.workers,
        )
    }
}

/// The queue could not be started, so the pool refuses to run.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct WorkerPoolStartFailed<'a> {
    pub queue: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for WorkerPoolStartFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Worker pool could not start queue '{}': {}",
            self.queue, self.error
        )
    }
}

impl StructuredLog for WorkerPoolStartFailed<'_> {
    fn log(&self) {
        tracing::error!(queue = self.queue, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("worker_pool_start_failed", span_name = name, queue = self.queue)
    }
}

pub struct WorkerStopped {
    pub worker: usize,
}

impl Display for WorkerStopped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Worker {} stopped", self.worker)
    }
}

impl StructuredLog for WorkerStopped {
    fn log(&self) {
        tracing::debug!(worker = self.worker, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("worker_stopped", span_name = name, worker = self.worker)
    }
}

/// A worker hit an infrastructure error and is taking the pool down.
pub struct WorkerFailed<'a> {
    pub worker: usize,
    pub error: &'a dyn std::error::Error,
}

impl Display for WorkerFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Worker {} failed: {}", self.worker, self.error)
    }
}

impl StructuredLog for WorkerFailed<'_> {
    fn log(&self) {
        tracing::error!(worker = self.worker, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("worker_failed", span_name = name, worker = self.worker)
    }
}

/// A job was fetched from the queue.
///
/// # Example
/// ```
/// use playbook_engine::observability::messages::worker::JobReceived;
/// use uuid::Uuid;
///
/// let msg = JobReceived {
///     worker: 0,
///     job_id: Uuid::nil(),
///     process_id: Uuid::nil(),
///     attempt: 1,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct JobReceived {
    pub worker: usize,
    pub job_id: Uuid,
    pub process_id: Uuid,
    pub attempt: u32,
}

impl Display for JobReceived {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Worker {} received job {} for process {} (attempt {})",
            self.worker, self.job_id, self.process_id, self.attempt
        )
    }
}

impl StructuredLog for JobReceived {
    fn log(&self) {
        tracing::debug!(
            worker = self.worker,
            job_id = %self.job_id,
            process_id = %self.process_id,
            attempt = self.attempt,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "job",
            span_name = name,
            worker = self.worker,
            job_id = %self.job_id,
            process_id = %self.process_id,
            attempt = self.attempt,
        )
    }
}

pub struct JobCompleted {
    pub job_id: Uuid,
    pub process_id: Uuid,
}

impl Display for JobCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Job {} for process {} completed",
            self.job_id, self.process_id
        )
    }
}

impl StructuredLog for JobCompleted {
    fn log(&self) {
        tracing::debug!(job_id = %self.job_id, process_id = %self.process_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("job_completed", span_name = name, job_id = %self.job_id)
    }
}

/// Job returned to the queue because the process is claimed elsewhere.
pub struct JobReleased {
    pub job_id: Uuid,
    pub process_id: Uuid,
    pub delay: Duration,
}

impl Display for JobReleased {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Job {} for process {} released for {:?}",
            self.job_id, self.process_id, self.delay
        )
    }
}

impl StructuredLog for JobReleased {
    fn log(&self) {
        tracing::debug!(
            job_id = %self.job_id,
            process_id = %self.process_id,
            delay_ms = self.delay.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("job_released", span_name = name, job_id = %self.job_id)
    }
}

/// A job was marked failed in the queue.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct JobFailed<'a> {
    pub job_id: Uuid,
    pub process_id: Uuid,
    pub reason: &'a str,
}

impl Display for JobFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Job {} for process {} failed: {}",
            self.job_id, self.process_id, self.reason
        )
    }
}

impl StructuredLog for JobFailed<'_> {
    fn log(&self) {
        tracing::error!(
            job_id = %self.job_id,
            process_id = %self.process_id,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "job_failed",
            span_name = name,
            job_id = %self.job_id,
            process_id = %self.process_id,
        )
    }
}

/// A job named a process the graph store does not have.
///
/// Processes are inserted before they are enqueued, so this is an invariant
/// violation rather than a race.
pub struct ProcessMissing {
    pub job_id: Uuid,
    pub process_id: Uuid,
}

impl Display for ProcessMissing {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Job {} references process {} which is not in the graph store",
            self.job_id, self.process_id
        )
    }
}

impl StructuredLog for ProcessMissing {
    fn log(&self) {
        tracing::error!(job_id = %self.job_id, process_id = %self.process_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "process_missing",
            span_name = name,
            job_id = %self.job_id,
            process_id = %self.process_id,
        )
    }
}
