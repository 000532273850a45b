// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;
use uuid::Uuid;

use crate::errors::{ConfigError, QueueError, StoreError};

/// Errors that stop a dispatcher or worker. Business failures of a step never
/// show up here; they are stored as failed resolutions instead.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    /// The queue could not be started; raised once, at pool startup.
    #[error("failed to start work queue: {0}")]
    QueueUnavailable(#[source] QueueError),

    /// A job named a process that is not in the graph store.
    #[error("Process {0} not found")]
    ProcessNotFound(Uuid),

    #[error("engine task panicked or was aborted: {0}")]
    TaskAborted(String),
}
