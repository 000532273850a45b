// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::errors::StoreError;
use crate::model::{Data, Process, ProcessRecord, Resolution};

/// Result of a conditional resolution write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The resolution was stored, replacing a pending one if present.
    Written,
    /// A terminal resolution already exists and was left untouched.
    AlreadyTerminal,
}

/// Persistence and notification boundary for the process graph.
///
/// Implementations own all durable state; the engine only reads processes and
/// writes resolutions through this trait.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Store a data value. Content-addressed, so repeated inserts are no-ops.
    async fn insert_data(&self, data: &Data) -> Result<(), StoreError>;

    /// Store a process together with its literal data and input bindings.
    ///
    /// Returns `true` when the process is new. New processes are published to
    /// subscribers after the write commits. Every upstream process must
    /// already exist.
    async fn insert_process(&self, process: &Process) -> Result<bool, StoreError>;

    async fn get_process(&self, id: Uuid) -> Result<Option<ProcessRecord>, StoreError>;

    async fn get_resolution(&self, id: Uuid) -> Result<Option<Resolution>, StoreError>;

    /// Replace whatever resolution the process has, terminal or not.
    async fn upsert_resolution(&self, resolution: &Resolution) -> Result<(), StoreError>;

    /// Write the resolution unless a terminal one already exists.
    async fn store_resolution(&self, resolution: &Resolution) -> Result<WriteOutcome, StoreError>;

    /// Processes that bind `id` as an upstream input, ordered by id.
    async fn dependents(&self, id: Uuid) -> Result<Vec<Uuid>, StoreError>;

    /// Take a time-limited lease on evaluating `process_id`.
    ///
    /// Succeeds when nobody holds the lease, when it expired, or when `owner`
    /// already holds it.
    async fn try_claim(
        &self,
        process_id: Uuid,
        owner: Uuid,
        lease: Duration,
    ) -> Result<bool, StoreError>;

    async fn release_claim(&self, process_id: Uuid, owner: Uuid) -> Result<(), StoreError>;

    /// Deliver a process to every subscriber without inserting it.
    fn publish(&self, process: &Process);

    /// Receive processes as they are inserted (or re-published).
    fn subscribe(&self) -> broadcast::Receiver<Process>;
}
