// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for playbook validation and submission.
//!
//! This module contains message types for logging events related to:
//! * Playbook graph validation (start, completion, failure)
//! * Individual validation errors such as cycles
//! * Playbook submission into the graph store

use crate::errors::ValidationError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Playbook validation started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use playbook_engine::observability::messages::validation::ValidationStarted;
///
/// let msg = ValidationStarted {
///     node_count: 5,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ValidationStarted {
    pub node_count: usize,
}

impl Display for ValidationStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting playbook validation for {} nodes",
            self.node_count
        )
    }
}

impl StructuredLog for ValidationStarted {
    fn log(&self) {
        tracing::info!(
            node_count = self.node_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "span_name",
            name = name,
            node_count = self.node_count,
        )
    }
}

/// Playbook validation completed successfully.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ValidationCompleted {
    pub node_count: usize,
}

impl Display for ValidationCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Playbook validation completed successfully for {} nodes",
            self.node_count
        )
    }
}

impl StructuredLog for ValidationCompleted {
    fn log(&self) {
        tracing::info!(
            node_count = self.node_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "span_name",
            name = name,
            node_count = self.node_count,
        )
    }
}

/// Playbook validation failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use playbook_engine::observability::messages::validation::ValidationFailed;
///
/// let msg = ValidationFailed {
///     error_count: 3,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct ValidationFailed {
    pub error_count: usize,
}

impl Display for ValidationFailed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Playbook validation failed with {} errors",
            self.error_count
        )
    }
}

impl StructuredLog for ValidationFailed {
    fn log(&self) {
        tracing::error!(
            error_count = self.error_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            error_count = self.error_count,
        )
    }
}

/// One validation error, logged individually before the summary.
pub struct ValidationErrorFound<'a> {
    pub error: &'a ValidationError,
}

impl Display for ValidationErrorFound<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl StructuredLog for ValidationErrorFound<'_> {
    fn log(&self) {
        match self.error {
            ValidationError::CyclicDependency { cycle } => tracing::error!(
                cycle = cycle.join(" -> "),
                cycle_length = cycle.len(),
                "{}", self
            ),
            _ => tracing::error!("{}", self),
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(tracing::Level::ERROR, "span_name", name = name)
    }
}

/// Playbook processes were inserted and enqueued.
///
/// # Example
/// ```
/// use playbook_engine::observability::messages::validation::PlaybookSubmitted;
///
/// let msg = PlaybookSubmitted {
///     process_count: 4,
///     new_processes: 3,
///     queue: "work-queue",
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct PlaybookSubmitted<'a> {
    pub process_count: usize,
    pub new_processes: usize,
    pub queue: &'a str,
}

impl Display for PlaybookSubmitted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Submitted playbook: {} processes ({} new) enqueued on '{}'",
            self.process_count, self.new_processes, self.queue
        )
    }
}

impl StructuredLog for PlaybookSubmitted<'_> {
    fn log(&self) {
        tracing::info!(
            process_count = self.process_count,
            new_processes = self.new_processes,
            queue = self.queue,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "span_name",
            name = name,
            process_count = self.process_count,
            queue = self.queue,
        )
    }
}
