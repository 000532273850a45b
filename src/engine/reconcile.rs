// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

use crate::engine::resolve::{bind_inputs, resolve_process};
use crate::engine::retrigger::Retrigger;
use crate::errors::EngineError;
use crate::model::{Process, ProcessRecord, ResolutionState};
use crate::observability::messages::engine::{
    ClaimContended, ResolutionFailed, ResolutionSkipped, ResolutionStarted, ResolutionStored,
    ResolutionSuperseded,
};
use crate::observability::messages::StructuredLog;
use crate::registry::Registry;
use crate::traits::{GraphStore, WriteOutcome};

/// Which path delivered a process for evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Notification,
    Queue,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Notification => "notification",
            Trigger::Queue => "queue",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to a delivered process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// A terminal resolution already existed; nothing was evaluated.
    AlreadyTerminal(ResolutionState),
    /// Another owner holds the evaluation claim.
    Contended,
    /// The process was evaluated and its resolution written.
    Stored(ResolutionState),
    /// The process was evaluated but a terminal resolution appeared first.
    Superseded,
}

/// Claim, resolve, store and re-trigger: the work both trigger paths share.
///
/// Every call to [`Reconciler::reconcile`] claims under a fresh owner id, so
/// one reconciler shared by the dispatcher and the workers still lets only
/// one of them evaluate a given process at a time.
pub struct Reconciler {
    registry: Arc<Registry>,
    store: Arc<dyn GraphStore>,
    retrigger: Retrigger,
    claim_lease: Duration,
}

impl Reconciler {
    pub fn new(
        registry: Arc<Registry>,
        store: Arc<dyn GraphStore>,
        retrigger: Retrigger,
        claim_lease: Duration,
    ) -> Self {
        Self {
            registry,
            store,
            retrigger,
            claim_lease,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub async fn reconcile(
        &self,
        record: &ProcessRecord,
        trigger: Trigger,
    ) -> Result<Reconciled, EngineError> {
        let id = record.process.id();
        if let Some(state) = terminal_state(record) {
            ResolutionSkipped { process_id: id, state }.log();
            return Ok(Reconciled::AlreadyTerminal(state));
        }

        let owner = Uuid::new_v4();
        if !self.store.try_claim(id, owner, self.claim_lease).await? {
            ClaimContended {
                process_id: id,
                trigger: trigger.as_str(),
            }
            .log();
            return Ok(Reconciled::Contended);
        }

        let evaluated = self.evaluate(&record.process, trigger).await;
        let released = self.store.release_claim(id, owner).await;
        let outcome = evaluated?;
        released?;
        Ok(outcome)
    }

    async fn evaluate(&self, process: &Process, trigger: Trigger) -> Result<Reconciled, EngineError> {
        let id = process.id();

        // The other path may have finished between the caller's read and our claim.
        if let Some(existing) = self.store.get_resolution(id).await? {
            if existing.is_terminal() {
                ResolutionSkipped {
                    process_id: id,
                    state: existing.state(),
                }
                .log();
                return Ok(Reconciled::AlreadyTerminal(existing.state()));
            }
        }

        let started = ResolutionStarted {
            process_id: id,
            step_type: process.step_type(),
            trigger: trigger.as_str(),
        };
        let span = started.span("reconcile");
        started.log();

        self.resolve_and_store(process).instrument(span).await
    }

    async fn resolve_and_store(&self, process: &Process) -> Result<Reconciled, EngineError> {
        let id = process.id();
        let start_time = Instant::now();
        let bound = bind_inputs(self.store.as_ref(), process).await?;
        let resolution = resolve_process(&self.registry, process, &bound).await;

        match self.store.store_resolution(&resolution).await? {
            WriteOutcome::Written => {
                ResolutionStored {
                    process_id: id,
                    step_type: process.step_type(),
                    state: resolution.state(),
                    duration: start_time.elapsed(),
                }
                .log();
                if let Some(message) = resolution.error_message() {
                    ResolutionFailed {
                        process_id: id,
                        step_type: process.step_type(),
                        message: &message,
                    }
                    .log();
                }
                if resolution.is_terminal() {
                    self.retrigger.dependents_of(id).await?;
                }
                Ok(Reconciled::Stored(resolution.state()))
            }
            WriteOutcome::AlreadyTerminal => {
                ResolutionSuperseded { process_id: id }.log();
                Ok(Reconciled::Superseded)
            }
        }
    }
}

fn terminal_state(record: &ProcessRecord) -> Option<ResolutionState> {
    record
        .resolution
        .as_ref()
        .filter(|r| r.is_terminal())
        .map(|r| r.state())
}
