// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::engine::reconcile::{Reconciled, Reconciler, Trigger};
use crate::config::consts::DEFAULT_REDELIVERY_DELAY_MS;
use crate::errors::EngineError;
use crate::model::{Process, ProcessRecord};
use crate::observability::messages::dispatch::{
    DispatchFailed, DispatcherStarted, DispatcherStopped, NotificationReceived,
    NotificationsLagged, RedeliveryFailed, RedeliveryScheduled,
};
use crate::observability::messages::StructuredLog;
use crate::traits::GraphStore;

/// Event-driven trigger path: evaluates every process the graph store
/// announces, one notification at a time, in arrival order.
///
/// ## Delivery
///
/// The insert channel is bounded and lossy. A listener that falls behind logs
/// how many notifications were dropped and keeps going; those processes reach
/// the engine through the queue path instead. Nothing published while the
/// listener is not subscribed is replayed.
///
/// A notification for a process whose claim is held elsewhere is published
/// again after the redelivery delay, until the process is terminal or the
/// dispatcher is cancelled. A process that only reaches the engine through
/// notifications is therefore never stranded by a contended claim.
///
/// ## Shutdown
///
/// Cancellation stops the listener from receiving further notifications. A
/// notification already being handled runs to completion first.
pub struct ProcessInsertDispatcher {
    store: Arc<dyn GraphStore>,
    reconciler: Arc<Reconciler>,
    redelivery_delay: Duration,
}

impl ProcessInsertDispatcher {
    pub fn new(store: Arc<dyn GraphStore>, reconciler: Arc<Reconciler>) -> Self {
        Self {
            store,
            reconciler,
            redelivery_delay: Duration::from_millis(DEFAULT_REDELIVERY_DELAY_MS),
        }
    }

    pub fn with_redelivery_delay(mut self, delay: Duration) -> Self {
        self.redelivery_delay = delay;
        self
    }

    /// Subscribe and start listening on a background task.
    ///
    /// The subscription is taken before this returns, so every process
    /// inserted afterwards is seen. The task ends with `Ok(())` on
    /// cancellation and with the first infrastructure error otherwise.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<Result<(), EngineError>> {
        let receiver = self.store.subscribe();
        let span = DispatcherStarted.span("dispatcher");
        tokio::spawn(self.run(receiver, cancel).instrument(span))
    }

    async fn run(
        self,
        mut receiver: broadcast::Receiver<Process>,
        cancel: CancellationToken,
    ) -> Result<(), EngineError> {
        DispatcherStarted.log();

        loop {
            let process = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    DispatcherStopped { reason: "cancelled" }.log();
                    return Ok(());
                }
                received = receiver.recv() => match received {
                    Ok(process) => process,
                    Err(RecvError::Lagged(skipped)) => {
                        NotificationsLagged { skipped }.log();
                        continue;
                    }
                    Err(RecvError::Closed) => {
                        DispatcherStopped { reason: "notification channel closed" }.log();
                        return Ok(());
                    }
                },
            };

            match self.handle(&process).await {
                Ok(Reconciled::Contended) => self.redeliver_later(process, &cancel),
                Ok(_) => {}
                Err(e) => {
                    DispatchFailed {
                        process_id: process.id(),
                        error: &e,
                    }
                    .log();
                    return Err(e);
                }
            }
        }
    }

    /// Publish `process` again once the delay passes, unless it is terminal by then.
    fn redeliver_later(&self, process: Process, cancel: &CancellationToken) {
        let scheduled = RedeliveryScheduled {
            process_id: process.id(),
            delay: self.redelivery_delay,
        };
        scheduled.log();
        let span = scheduled.span("redelivery");

        let store = self.store.clone();
        let delay = self.redelivery_delay;
        let cancel = cancel.clone();
        tokio::spawn(
            async move {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
                match store.get_resolution(process.id()).await {
                    Ok(Some(resolution)) if resolution.is_terminal() => {}
                    Ok(_) => store.publish(&process),
                    Err(e) => RedeliveryFailed {
                        process_id: process.id(),
                        error: &e,
                    }
                    .log(),
                }
            }
            .instrument(span),
        );
    }

    async fn handle(&self, process: &Process) -> Result<Reconciled, EngineError> {
        let received = NotificationReceived {
            process_id: process.id(),
            step_type: process.step_type(),
        };
        received.log();

        let resolution = self.store.get_resolution(process.id()).await?;
        let record = ProcessRecord {
            process: process.clone(),
            resolution,
        };
        self.reconciler
            .reconcile(&record, Trigger::Notification)
            .instrument(received.span("notification"))
            .await
    }
}
