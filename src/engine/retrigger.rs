// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use uuid::Uuid;

use crate::errors::EngineError;
use crate::observability::messages::engine::DependentsRetriggered;
use crate::observability::messages::StructuredLog;
use crate::traits::{GraphStore, JobQueue};

/// Re-delivers the non-terminal dependents of a process that just became terminal.
///
/// Dependents can be enqueued on the work queue, re-published on the insert
/// channel, or both. Delivering a dependent twice is harmless: evaluation of
/// a terminal process is a no-op.
#[derive(Clone)]
pub struct Retrigger {
    store: Arc<dyn GraphStore>,
    queue: Option<(Arc<dyn JobQueue>, String)>,
    notify: bool,
}

impl Retrigger {
    /// A retrigger with no delivery path; enable one with the `via_*` methods.
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            store,
            queue: None,
            notify: false,
        }
    }

    /// Enqueue dependents on `queue_name`.
    pub fn via_queue(mut self, queue: Arc<dyn JobQueue>, queue_name: impl Into<String>) -> Self {
        self.queue = Some((queue, queue_name.into()));
        self
    }

    /// Re-publish dependents to insert subscribers.
    pub fn via_notify(mut self, notify: bool) -> Self {
        self.notify = notify;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.queue.is_some() || self.notify
    }

    /// Returns the number of dependents re-delivered.
    pub async fn dependents_of(&self, process_id: Uuid) -> Result<usize, EngineError> {
        if !self.is_enabled() {
            return Ok(0);
        }

        let mut delivered = 0;
        for dependent in self.store.dependents(process_id).await? {
            let Some(record) = self.store.get_process(dependent).await? else {
                continue;
            };
            if record.is_terminal() {
                continue;
            }
            if let Some((queue, queue_name)) = &self.queue {
                queue.send(queue_name, dependent).await?;
            }
            if self.notify {
                self.store.publish(&record.process);
            }
            delivered += 1;
        }

        if delivered > 0 {
            DependentsRetriggered {
                process_id,
                dependents: delivered,
                enqueued: self.queue.is_some(),
                notified: self.notify,
            }
            .log();
        }
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::{MemoryGraphStore, MemoryJobQueue};
    use crate::model::{Data, Process, Resolution};
    use crate::traits::QueuePolicy;

    #[tokio::test]
    async fn test_only_non_terminal_dependents_are_redelivered() {
        let store = Arc::new(MemoryGraphStore::new());
        let queue = Arc::new(MemoryJobQueue::new(QueuePolicy::default()));
        queue.start().await.unwrap();

        let seed = Process::builder("Integer").data(Data::new("Integer", "1")).build();
        let waiting = Process::builder("AddOne").input_process("n", &seed).build();
        let finished = Process::builder("Scale").input_process("n", &seed).build();
        for process in [&seed, &waiting, &finished] {
            store.insert_process(process).await.unwrap();
        }
        store
            .upsert_resolution(&Resolution::failed(finished.id(), "done"))
            .await
            .unwrap();

        let mut rx = store.subscribe();
        let retrigger = Retrigger::new(store.clone())
            .via_queue(queue.clone(), "work-queue")
            .via_notify(true);

        assert_eq!(retrigger.dependents_of(seed.id()).await.unwrap(), 1);

        let job = queue.fetch("work-queue").await.unwrap().unwrap();
        assert_eq!(job.process_id, waiting.id());
        assert!(queue.fetch("work-queue").await.unwrap().is_none());
        assert_eq!(rx.recv().await.unwrap().id(), waiting.id());
    }

    #[tokio::test]
    async fn test_disabled_retrigger_does_nothing() {
        let store = Arc::new(MemoryGraphStore::new());
        let seed = Process::builder("Integer").data(Data::new("Integer", "1")).build();
        let next = Process::builder("AddOne").input_process("n", &seed).build();
        store.insert_process(&seed).await.unwrap();
        store.insert_process(&next).await.unwrap();

        let retrigger = Retrigger::new(store.clone());
        assert!(!retrigger.is_enabled());
        assert_eq!(retrigger.dependents_of(seed.id()).await.unwrap(), 0);
    }
}
