// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::errors::QueueError;
use crate::traits::{Job, JobQueue, JobState, QueuePolicy};

struct JobRecord {
    seq: u64,
    queue: String,
    process_id: Uuid,
    state: JobState,
    attempt: u32,
    start_after: Instant,
    expire_at: Option<Instant>,
    last_error: Option<String>,
}

impl JobRecord {
    fn job(&self, id: Uuid) -> Job {
        Job {
            id,
            queue: self.queue.clone(),
            process_id: self.process_id,
            attempt: self.attempt,
        }
    }

    fn is_available(&self, now: Instant) -> bool {
        match self.state {
            JobState::Created => self.start_after <= now,
            JobState::Active => self.expire_at.is_some_and(|at| at <= now),
            JobState::Completed | JobState::Failed => false,
        }
    }
}

#[derive(Default)]
struct State {
    started: bool,
    next_seq: u64,
    /// Live and dead-lettered jobs; completed jobs are dropped on ack.
    jobs: HashMap<Uuid, JobRecord>,
}

impl State {
    /// The record `job` refers to, if that delivery still holds the lease.
    fn held(&mut self, job: &Job) -> Option<&mut JobRecord> {
        self.jobs
            .get_mut(&job.id)
            .filter(|record| record.state == JobState::Active && record.attempt == job.attempt)
    }
}

/// In-process job queue with the same delivery rules as the SQLite queue.
///
/// Acks from a delivery whose lease was lost to a redelivery are ignored.
/// Completed jobs are removed, so [`MemoryJobQueue::job_state`] reports
/// `None` for them.
pub struct MemoryJobQueue {
    policy: QueuePolicy,
    state: Mutex<State>,
}

impl MemoryJobQueue {
    pub fn new(policy: QueuePolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(State::default()),
        }
    }

    pub async fn job_state(&self, id: Uuid) -> Option<JobState> {
        self.state.lock().await.jobs.get(&id).map(|job| job.state)
    }

    pub async fn last_error(&self, id: Uuid) -> Option<String> {
        self.state
            .lock()
            .await
            .jobs
            .get(&id)
            .and_then(|job| job.last_error.clone())
    }

    /// Jobs in `queue` currently in `state`.
    pub async fn count(&self, queue: &str, state: JobState) -> usize {
        self.state
            .lock()
            .await
            .jobs
            .values()
            .filter(|job| job.queue == queue && job.state == state)
            .count()
    }
}

impl Default for MemoryJobQueue {
    fn default() -> Self {
        Self::new(QueuePolicy::default())
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn start(&self) -> Result<(), QueueError> {
        self.state.lock().await.started = true;
        Ok(())
    }

    async fn send(&self, queue: &str, process_id: Uuid) -> Result<Uuid, QueueError> {
        let mut state = self.state.lock().await;
        if !state.started {
            return Err(QueueError::NotStarted);
        }
        let id = Uuid::new_v4();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.jobs.insert(
            id,
            JobRecord {
                seq,
                queue: queue.to_string(),
                process_id,
                state: JobState::Created,
                attempt: 0,
                start_after: Instant::now(),
                expire_at: None,
                last_error: None,
            },
        );
        Ok(id)
    }

    async fn fetch(&self, queue: &str) -> Result<Option<Job>, QueueError> {
        let mut state = self.state.lock().await;
        if !state.started {
            return Err(QueueError::NotStarted);
        }
        let now = Instant::now();
        let retry_limit = self.policy.retry_limit;

        // Leases that expired on the last allowed attempt are dead-lettered.
        for job in state.jobs.values_mut() {
            if job.queue == queue
                && job.state == JobState::Active
                && job.is_available(now)
                && job.attempt > retry_limit
            {
                job.state = JobState::Failed;
                job.expire_at = None;
                job.last_error = Some("lease expired".to_string());
            }
        }

        let next = state
            .jobs
            .iter()
            .filter(|(_, job)| job.queue == queue && job.is_available(now))
            .min_by_key(|(_, job)| job.seq)
            .map(|(id, _)| *id);

        let Some(id) = next else {
            return Ok(None);
        };
        let lease = self.policy.lease;
        Ok(state.jobs.get_mut(&id).map(|job| {
            job.state = JobState::Active;
            job.attempt += 1;
            job.expire_at = Some(now + lease);
            job.job(id)
        }))
    }

    async fn complete(&self, job: &Job) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        if state.held(job).is_some() {
            state.jobs.remove(&job.id);
        }
        Ok(())
    }

    async fn fail(&self, job: &Job, reason: &str) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        if let Some(record) = state.held(job) {
            record.last_error = Some(reason.to_string());
            record.expire_at = None;
            if record.attempt > self.policy.retry_limit {
                record.state = JobState::Failed;
            } else {
                record.state = JobState::Created;
                record.start_after = Instant::now() + self.policy.retry_delay;
            }
        }
        Ok(())
    }

    async fn release(&self, job: &Job, delay: Duration) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        if let Some(record) = state.held(job) {
            record.state = JobState::Created;
            record.attempt = record.attempt.saturating_sub(1);
            record.expire_at = None;
            record.start_after = Instant::now() + delay;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUEUE: &str = "work-queue";

    fn quick_policy(retry_limit: u32) -> QueuePolicy {
        QueuePolicy {
            lease: Duration::from_secs(60),
            retry_limit,
            retry_delay: Duration::ZERO,
        }
    }

    async fn started(policy: QueuePolicy) -> MemoryJobQueue {
        let queue = MemoryJobQueue::new(policy);
        queue.start().await.unwrap();
        queue
    }

    #[tokio::test]
    async fn test_operations_require_start() {
        let queue = MemoryJobQueue::default();
        assert!(matches!(
            queue.send(QUEUE, Uuid::new_v4()).await,
            Err(QueueError::NotStarted)
        ));
        assert!(matches!(queue.fetch(QUEUE).await, Err(QueueError::NotStarted)));
    }

    #[tokio::test]
    async fn test_job_goes_to_exactly_one_fetcher() {
        let queue = started(quick_policy(3)).await;
        let process_id = Uuid::new_v4();
        let id = queue.send(QUEUE, process_id).await.unwrap();

        let job = queue.fetch(QUEUE).await.unwrap().unwrap();
        assert_eq!(job.id, id);
        assert_eq!(job.process_id, process_id);
        assert_eq!(job.attempt, 1);
        assert!(queue.fetch(QUEUE).await.unwrap().is_none());
        assert!(queue.fetch("other").await.unwrap().is_none());

        queue.complete(&job).await.unwrap();
        assert_eq!(queue.job_state(id).await, None);
        assert!(queue.fetch(QUEUE).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_is_oldest_first() {
        let queue = started(quick_policy(3)).await;
        let first = queue.send(QUEUE, Uuid::new_v4()).await.unwrap();
        let second = queue.send(QUEUE, Uuid::new_v4()).await.unwrap();

        assert_eq!(queue.fetch(QUEUE).await.unwrap().unwrap().id, first);
        assert_eq!(queue.fetch(QUEUE).await.unwrap().unwrap().id, second);
    }

    #[tokio::test]
    async fn test_failures_retry_until_limit_then_dead_letter() {
        let queue = started(quick_policy(1)).await;
        let id = queue.send(QUEUE, Uuid::new_v4()).await.unwrap();

        let job = queue.fetch(QUEUE).await.unwrap().unwrap();
        queue.fail(&job, "first").await.unwrap();
        assert_eq!(queue.job_state(id).await, Some(JobState::Created));

        let retry = queue.fetch(QUEUE).await.unwrap().unwrap();
        assert_eq!(retry.attempt, 2);
        queue.fail(&retry, "second").await.unwrap();

        assert_eq!(queue.job_state(id).await, Some(JobState::Failed));
        assert_eq!(queue.last_error(id).await.as_deref(), Some("second"));
        assert!(queue.fetch(QUEUE).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_release_does_not_consume_an_attempt() {
        let queue = started(quick_policy(0)).await;
        queue.send(QUEUE, Uuid::new_v4()).await.unwrap();

        let job = queue.fetch(QUEUE).await.unwrap().unwrap();
        queue.release(&job, Duration::ZERO).await.unwrap();

        let again = queue.fetch(QUEUE).await.unwrap().unwrap();
        assert_eq!(again.id, job.id);
        assert_eq!(again.attempt, 1);
    }

    #[tokio::test]
    async fn test_released_job_waits_for_delay() {
        let queue = started(quick_policy(0)).await;
        queue.send(QUEUE, Uuid::new_v4()).await.unwrap();

        let job = queue.fetch(QUEUE).await.unwrap().unwrap();
        queue.release(&job, Duration::from_secs(60)).await.unwrap();
        assert!(queue.fetch(QUEUE).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_lease_redelivers_then_dead_letters() {
        let queue = started(QueuePolicy {
            lease: Duration::ZERO,
            retry_limit: 1,
            retry_delay: Duration::ZERO,
        })
        .await;
        let id = queue.send(QUEUE, Uuid::new_v4()).await.unwrap();

        let first = queue.fetch(QUEUE).await.unwrap().unwrap();
        let second = queue.fetch(QUEUE).await.unwrap().unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.attempt, 2);

        assert!(queue.fetch(QUEUE).await.unwrap().is_none());
        assert_eq!(queue.job_state(id).await, Some(JobState::Failed));
        assert_eq!(queue.count(QUEUE, JobState::Failed).await, 1);
    }

    #[tokio::test]
    async fn test_acks_from_a_lost_lease_are_ignored() {
        let queue = started(QueuePolicy {
            lease: Duration::from_millis(20),
            retry_limit: 3,
            retry_delay: Duration::ZERO,
        })
        .await;
        let id = queue.send(QUEUE, Uuid::new_v4()).await.unwrap();

        let stale = queue.fetch(QUEUE).await.unwrap().unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        let current = queue.fetch(QUEUE).await.unwrap().unwrap();
        assert_eq!(current.attempt, 2);

        queue.complete(&stale).await.unwrap();
        assert_eq!(queue.job_state(id).await, Some(JobState::Active));
        queue.fail(&stale, "late").await.unwrap();
        queue.release(&stale, Duration::ZERO).await.unwrap();
        assert_eq!(queue.job_state(id).await, Some(JobState::Active));
        assert_eq!(queue.last_error(id).await, None);
        assert!(queue.fetch(QUEUE).await.unwrap().is_none());

        queue.complete(&current).await.unwrap();
        assert_eq!(queue.job_state(id).await, None);
    }

    #[tokio::test]
    async fn test_ack_after_dead_letter_is_ignored() {
        let queue = started(quick_policy(0)).await;
        let id = queue.send(QUEUE, Uuid::new_v4()).await.unwrap();

        let job = queue.fetch(QUEUE).await.unwrap().unwrap();
        queue.fail(&job, "boom").await.unwrap();
        assert_eq!(queue.job_state(id).await, Some(JobState::Failed));

        queue.release(&job, Duration::ZERO).await.unwrap();
        queue.complete(&job).await.unwrap();
        assert_eq!(queue.job_state(id).await, Some(JobState::Failed));
        assert_eq!(queue.count(QUEUE, JobState::Failed).await, 1);
    }
}
