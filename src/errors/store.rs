// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Infrastructure errors from the graph store and the durable queue.
//!
//! These never end up inside a stored resolution; they surface to the
//! operational logs and stop the dispatcher or worker that hit them.

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A process references an upstream process that was never inserted.
    #[error("process {process} references missing upstream process {upstream}")]
    MissingUpstream { process: Uuid, upstream: Uuid },

    /// A stored row could not be turned back into a graph entity.
    #[error("corrupt record in `{table}`: {reason}")]
    Corrupt { table: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("queue database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("queue is not started")]
    NotStarted,

    #[error("corrupt job record: {0}")]
    Corrupt(String),

    #[error("queue unavailable: {0}")]
    Unavailable(String),
}
