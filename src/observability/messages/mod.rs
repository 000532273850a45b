// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Every diagnostic and operational log line in the engine is a small struct
//! with a `Display` implementation and a [`StructuredLog`] implementation that
//! emits the same text together with structured fields.
//!
//! # Organization
//!
//! * `engine` - resolution lifecycle (claim, evaluate, store, re-trigger)
//! * `worker` - queue worker pool and job lifecycle
//! * `dispatch` - change-notification listener lifecycle
//! * `validation` - playbook validation and submission
//!
//! # Usage Pattern
//!
//! ```rust
//! use playbook_engine::observability::messages::worker::WorkerPoolStarted;
//! use playbook_engine::observability::messages::StructuredLog;
//!
//! let msg = WorkerPoolStarted {
//!     queue: "work-queue",
//!     workers: 4,
//! };
//!
//! msg.log();
//! ```

use tracing::Span;

pub mod dispatch;
pub mod engine;
pub mod validation;
pub mod worker;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the message at its level with structured fields.
    fn log(&self);

    /// Open a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
