// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::engine::reconcile::{Reconciled, Reconciler, Trigger};
use crate::errors::EngineError;
use crate::observability::messages::worker::{
    JobCompleted, JobFailed, JobReceived, JobReleased, ProcessMissing, WorkerFailed,
    WorkerPoolStartFailed, WorkerPoolStarted, WorkerStopped,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{GraphStore, Job, JobQueue};

/// Default name of the queue carrying process ids.
pub const DEFAULT_QUEUE_NAME: &str = "work-queue";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerOptions {
    /// Number of worker tasks, which is also the number of jobs in flight.
    pub workers: usize,
    pub queue_name: String,
    /// Sleep between fetches when the queue is empty.
    pub poll_interval: Duration,
    /// How long a job waits before redelivery when its process is claimed elsewhere.
    pub release_delay: Duration,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_name: DEFAULT_QUEUE_NAME.to_string(),
            poll_interval: Duration::from_millis(250),
            release_delay: Duration::from_millis(1000),
        }
    }
}

/// Durable trigger path: `n` competing workers pulling process ids off one queue.
///
/// ## Job handling
///
/// For each fetched job the worker loads the process and hands it to the
/// [`Reconciler`]. A missing process is an invariant violation: it is logged
/// and the job is failed. A process claimed by the notification path is
/// released back to the queue without consuming an attempt. Every other
/// outcome, terminal or pending, completes the job, and only after the
/// resolution write has succeeded.
///
/// ## Failure
///
/// Store and queue errors stop the worker that hit them and cancel the rest
/// of the pool; [`WorkerPoolHandle::join`] returns the first such error.
pub struct QueueWorkerPool {
    options: WorkerOptions,
    store: Arc<dyn GraphStore>,
    queue: Arc<dyn JobQueue>,
    reconciler: Arc<Reconciler>,
}

impl QueueWorkerPool {
    pub fn new(
        options: WorkerOptions,
        store: Arc<dyn GraphStore>,
        queue: Arc<dyn JobQueue>,
        reconciler: Arc<Reconciler>,
    ) -> Self {
        Self {
            options,
            store,
            queue,
            reconciler,
        }
    }

    /// Start the queue and spawn the workers.
    ///
    /// Fails fast with [`EngineError::QueueUnavailable`] when the queue cannot
    /// be started; no worker is spawned in that case. The pool stops when
    /// `cancel` fires or a worker fails.
    pub async fn start(self, cancel: CancellationToken) -> Result<WorkerPoolHandle, EngineError> {
        let queue_name = self.options.queue_name.clone();
        if let Err(e) = self.queue.start().await {
            WorkerPoolStartFailed {
                queue: &queue_name,
                error: &e,
            }
            .log();
            return Err(EngineError::QueueUnavailable(e));
        }

        let workers = self.options.workers.max(1);
        let started = WorkerPoolStarted {
            queue: &queue_name,
            workers,
        };
        started.log();

        let cancel = cancel.child_token();
        let mut tasks = JoinSet::new();
        for index in 0..workers {
            let worker = Worker {
                index,
                options: self.options.clone(),
                store: self.store.clone(),
                queue: self.queue.clone(),
                reconciler: self.reconciler.clone(),
            };
            let cancel = cancel.clone();
            tasks.spawn(
                async move {
                    let result = worker.run(&cancel).await;
                    if let Err(e) = &result {
                        WorkerFailed { worker: index, error: e }.log();
                        cancel.cancel();
                    }
                    result
                }
                .instrument(started.span("worker_pool")),
            );
        }

        Ok(WorkerPoolHandle { tasks, cancel })
    }
}

/// Running worker pool.
pub struct WorkerPoolHandle {
    tasks: JoinSet<Result<(), EngineError>>,
    cancel: CancellationToken,
}

impl WorkerPoolHandle {
    /// Wait for every worker to stop. Returns the first error any worker hit.
    pub async fn join(mut self) -> Result<(), EngineError> {
        let mut first_error = None;
        while let Some(joined) = self.tasks.join_next().await {
            let error = match joined {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(e) => EngineError::TaskAborted(e.to_string()),
            };
            self.cancel.cancel();
            first_error.get_or_insert(error);
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Stop fetching new jobs and wait for in-flight jobs to finish.
    pub async fn shutdown(self) -> Result<(), EngineError> {
        self.cancel.cancel();
        self.join().await
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

struct Worker {
    index: usize,
    options: WorkerOptions,
    store: Arc<dyn GraphStore>,
    queue: Arc<dyn JobQueue>,
    reconciler: Arc<Reconciler>,
}

impl Worker {
    async fn run(&self, cancel: &CancellationToken) -> Result<(), EngineError> {
        while !cancel.is_cancelled() {
            match self.queue.fetch(&self.options.queue_name).await? {
                Some(job) => {
                    let received = JobReceived {
                        worker: self.index,
                        job_id: job.id,
                        process_id: job.process_id,
                        attempt: job.attempt,
                    };
                    received.log();
                    self.handle(job).instrument(received.span("job")).await?;
                }
                None => {
                    tokio::select! {
                        _ = cancel.cancelled() => {}
                        _ = tokio::time::sleep(self.options.poll_interval) => {}
                    }
                }
            }
        }
        WorkerStopped { worker: self.index }.log();
        Ok(())
    }

    async fn handle(&self, job: Job) -> Result<(), EngineError> {
        let Some(record) = self.store.get_process(job.process_id).await? else {
            ProcessMissing {
                job_id: job.id,
                process_id: job.process_id,
            }
            .log();
            let reason = EngineError::ProcessNotFound(job.process_id).to_string();
            return self.fail(&job, &reason).await;
        };

        match self.reconciler.reconcile(&record, Trigger::Queue).await {
            Ok(Reconciled::Contended) => {
                self.queue.release(&job, self.options.release_delay).await?;
                JobReleased {
                    job_id: job.id,
                    process_id: job.process_id,
                    delay: self.options.release_delay,
                }
                .log();
                Ok(())
            }
            Ok(_) => {
                self.queue.complete(&job).await?;
                JobCompleted {
                    job_id: job.id,
                    process_id: job.process_id,
                }
                .log();
                Ok(())
            }
            Err(e) => {
                // Hand the job back for retry before the worker goes down.
                self.fail(&job, &e.to_string()).await?;
                Err(e)
            }
        }
    }

    async fn fail(&self, job: &Job, reason: &str) -> Result<(), EngineError> {
        self.queue.fail(job, reason).await?;
        JobFailed {
            job_id: job.id,
            process_id: job.process_id,
            reason,
        }
        .log();
        Ok(())
    }
}
