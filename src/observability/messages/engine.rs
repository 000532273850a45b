// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the resolution lifecycle.
//!
//! This module contains message types for logging events related to:
//! * Process evaluation (start, stored outcome)
//! * Claim contention between the two trigger paths
//! * Conditional writes refused because of an existing terminal result
//! * Re-triggering of dependents

use crate::model::ResolutionState;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;
use uuid::Uuid;

/// Evaluation of a process started.
///
/// # Log Level
/// `debug!` - Per-process event
///
/// # Example
/// ```
/// use playbook_engine::observability::messages::engine::ResolutionStarted;
/// use uuid::Uuid;
///
/// let msg = ResolutionStarted {
///     process_id: Uuid::nil(),
///     step_type: "AddOne",
///     trigger: "queue",
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct ResolutionStarted<'a> {
    pub process_id: Uuid,
    pub step_type: &'a str,
    pub trigger: &'a str,
}

impl Display for ResolutionStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Resolving process {} ({}) via {}",
            self.process_id, self.step_type, self.trigger
        )
    }
}

impl StructuredLog for ResolutionStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            process_id = %self.process_id,
            step_type = self.step_type,
            trigger = self.trigger,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "resolution",
            span_name = name,
            process_id = %self.process_id,
            step_type = self.step_type,
            trigger = self.trigger,
        )
    }
}

/// A resolution was written to the graph store.
///
/// # Log Level
/// `info!` for terminal outcomes, `debug!` for pending
pub struct ResolutionStored<'a> {
    pub process_id: Uuid,
    pub step_type: &'a str,
    pub state: ResolutionState,
    pub duration: Duration,
}

impl Display for ResolutionStored<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Process {} ({}) resolved {} in {:?}",
            self.process_id, self.step_type, self.state, self.duration
        )
    }
}

impl StructuredLog for ResolutionStored<'_> {
    fn log(&self) {
        match self.state {
            ResolutionState::Pending => tracing::debug!(
                process_id = %self.process_id,
                step_type = self.step_type,
                state = %self.state,
                duration_ms = self.duration.as_millis() as u64,
                "{}", self
            ),
            _ => tracing::info!(
                process_id = %self.process_id,
                step_type = self.step_type,
                state = %self.state,
                duration_ms = self.duration.as_millis() as u64,
                "{}", self
            ),
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "resolution_stored",
            span_name = name,
            process_id = %self.process_id,
            state = %self.state,
        )
    }
}

/// Failed outcome, logged with its diagnostic.
pub struct ResolutionFailed<'a> {
    pub process_id: Uuid,
    pub step_type: &'a str,
    pub message: &'a str,
}

impl Display for ResolutionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Process {} ({}) failed: {}",
            self.process_id, self.step_type, self.message
        )
    }
}

impl StructuredLog for ResolutionFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            process_id = %self.process_id,
            step_type = self.step_type,
            message = self.message,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::WARN,
            "resolution_failed",
            span_name = name,
            process_id = %self.process_id,
            step_type = self.step_type,
        )
    }
}

/// Process was already terminal when a trigger arrived; nothing was evaluated.
pub struct ResolutionSkipped {
    pub process_id: Uuid,
    pub state: ResolutionState,
}

impl Display for ResolutionSkipped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Process {} already {}, skipping",
            self.process_id, self.state
        )
    }
}

impl StructuredLog for ResolutionSkipped {
    fn log(&self) {
        tracing::debug!(process_id = %self.process_id, state = %self.state, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("resolution_skipped", span_name = name, process_id = %self.process_id)
    }
}

/// Another owner holds the evaluation claim.
///
/// # Log Level
/// `debug!` - Expected whenever both trigger paths see the same process
pub struct ClaimContended<'a> {
    pub process_id: Uuid,
    pub trigger: &'a str,
}

impl Display for ClaimContended<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Process {} is being evaluated elsewhere, {} trigger backs off",
            self.process_id, self.trigger
        )
    }
}

impl StructuredLog for ClaimContended<'_> {
    fn log(&self) {
        tracing::debug!(process_id = %self.process_id, trigger = self.trigger, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "claim_contended",
            span_name = name,
            process_id = %self.process_id,
            trigger = self.trigger,
        )
    }
}

/// The conditional write found a terminal resolution that appeared during evaluation.
pub struct ResolutionSuperseded {
    pub process_id: Uuid,
}

impl Display for ResolutionSuperseded {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Process {} was resolved by another evaluation; result discarded",
            self.process_id
        )
    }
}

impl StructuredLog for ResolutionSuperseded {
    fn log(&self) {
        tracing::warn!(process_id = %self.process_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::WARN,
            "resolution_superseded",
            span_name = name,
            process_id = %self.process_id,
        )
    }
}

/// Dependents of a newly terminal process were re-delivered.
///
/// # Example
/// ```
/// use playbook_engine::observability::messages::engine::DependentsRetriggered;
/// use uuid::Uuid;
///
/// let msg = DependentsRetriggered {
///     process_id: Uuid::nil(),
///     dependents: 3,
///     enqueued: true,
///     notified: false,
/// };
///
/// assert!(msg.to_string().contains("3 dependents"));
/// ```
pub struct DependentsRetriggered {
    pub process_id: Uuid,
    pub dependents: usize,
    pub enqueued: bool,
    pub notified: bool,
}

impl Display for DependentsRetriggered {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Re-triggered {} dependents of process {} (queue={}, notify={})",
            self.dependents, self.process_id, self.enqueued, self.notified
        )
    }
}

impl StructuredLog for DependentsRetriggered {
    fn log(&self) {
        tracing::debug!(
            process_id = %self.process_id,
            dependents = self.dependents,
            enqueued = self.enqueued,
            notified = self.notified,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "retrigger",
            span_name = name,
            process_id = %self.process_id,
            dependents = self.dependents,
        )
    }
}
