// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use crate::errors::QueueError;

/// One delivery of a queued process id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: Uuid,
    pub queue: String,
    pub process_id: Uuid,
    /// 1 on first delivery, incremented on every redelivery.
    pub attempt: u32,
}

/// Lifecycle of a queued job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    /// Waiting to be fetched, possibly not before a retry delay.
    Created,
    /// Held by a worker until its lease expires.
    Active,
    Completed,
    /// Dead-lettered after exhausting its retries.
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Created => "created",
            JobState::Active => "active",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobState {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(JobState::Created),
            "active" => Ok(JobState::Active),
            "completed" => Ok(JobState::Completed),
            "failed" => Ok(JobState::Failed),
            other => Err(QueueError::Corrupt(format!("unknown job state '{other}'"))),
        }
    }
}

/// Delivery policy shared by the queue backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuePolicy {
    /// How long a fetched job stays with its worker before redelivery.
    pub lease: Duration,
    /// Retries after the first attempt before a job is dead-lettered.
    pub retry_limit: u32,
    pub retry_delay: Duration,
}

impl Default for QueuePolicy {
    fn default() -> Self {
        Self {
            lease: Duration::from_secs(300),
            retry_limit: 3,
            retry_delay: Duration::from_millis(1000),
        }
    }
}

/// Durable competing-consumers queue carrying process ids.
///
/// Delivery is at-least-once and unordered across process ids: a fetched job
/// belongs to one worker until it is completed, failed, released, or its
/// lease expires.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Prepare the queue (schema, connectivity). Workers call this once and
    /// refuse to start when it fails.
    async fn start(&self) -> Result<(), QueueError>;

    async fn send(&self, queue: &str, process_id: Uuid) -> Result<Uuid, QueueError>;

    /// Hand the oldest available job to the caller, if any.
    async fn fetch(&self, queue: &str) -> Result<Option<Job>, QueueError>;

    /// Acknowledge a job. Only called after its result is stored.
    async fn complete(&self, job: &Job) -> Result<(), QueueError>;

    /// Record a failed attempt; the job is retried until its retry limit.
    async fn fail(&self, job: &Job, reason: &str) -> Result<(), QueueError>;

    /// Put a job back without consuming an attempt, due after `delay`.
    async fn release(&self, job: &Job, delay: Duration) -> Result<(), QueueError>;
}
