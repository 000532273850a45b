// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use crate::errors::StoreError;
use crate::model::{Data, InputRef, Process, ProcessRecord, Resolution};
use crate::traits::{GraphStore, WriteOutcome};

/// Capacity of the insert notification channel.
pub const NOTIFY_CAPACITY: usize = 1024;

struct Claim {
    owner: Uuid,
    expires_at: Instant,
}

#[derive(Default)]
struct State {
    data: HashMap<Uuid, Data>,
    processes: HashMap<Uuid, Process>,
    resolutions: HashMap<Uuid, Resolution>,
    dependents: HashMap<Uuid, BTreeSet<Uuid>>,
    claims: HashMap<Uuid, Claim>,
}

/// Graph store held entirely in memory. Used by tests and embedded runs.
pub struct MemoryGraphStore {
    state: Mutex<State>,
    notify: broadcast::Sender<Process>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self {
            state: Mutex::new(State::default()),
            notify,
        }
    }
}

impl Default for MemoryGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn insert_data(&self, data: &Data) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.data.entry(data.id()).or_insert_with(|| data.clone());
        Ok(())
    }

    async fn insert_process(&self, process: &Process) -> Result<bool, StoreError> {
        {
            let mut state = self.state.lock().await;
            if state.processes.contains_key(&process.id()) {
                return Ok(false);
            }
            for upstream in process.upstream_processes() {
                if !state.processes.contains_key(&upstream) {
                    return Err(StoreError::MissingUpstream {
                        process: process.id(),
                        upstream,
                    });
                }
            }

            if let Some(data) = process.data() {
                state.data.entry(data.id()).or_insert_with(|| data.clone());
            }
            for input in process.inputs().values() {
                match input {
                    InputRef::Data(data) => {
                        state.data.entry(data.id()).or_insert_with(|| data.clone());
                    }
                    InputRef::Process(upstream) => {
                        state
                            .dependents
                            .entry(*upstream)
                            .or_default()
                            .insert(process.id());
                    }
                }
            }
            state.processes.insert(process.id(), process.clone());
        }

        self.publish(process);
        Ok(true)
    }

    async fn get_process(&self, id: Uuid) -> Result<Option<ProcessRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.processes.get(&id).map(|process| ProcessRecord {
            process: process.clone(),
            resolution: state.resolutions.get(&id).cloned(),
        }))
    }

    async fn get_resolution(&self, id: Uuid) -> Result<Option<Resolution>, StoreError> {
        Ok(self.state.lock().await.resolutions.get(&id).cloned())
    }

    async fn upsert_resolution(&self, resolution: &Resolution) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state
            .resolutions
            .insert(resolution.process_id(), resolution.clone());
        Ok(())
    }

    async fn store_resolution(&self, resolution: &Resolution) -> Result<WriteOutcome, StoreError> {
        let mut state = self.state.lock().await;
        let id = resolution.process_id();
        if state.resolutions.get(&id).is_some_and(Resolution::is_terminal) {
            return Ok(WriteOutcome::AlreadyTerminal);
        }
        state.resolutions.insert(id, resolution.clone());
        Ok(WriteOutcome::Written)
    }

    async fn dependents(&self, id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .dependents
            .get(&id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn try_claim(
        &self,
        process_id: Uuid,
        owner: Uuid,
        lease: Duration,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        if let Some(claim) = state.claims.get(&process_id) {
            if claim.owner != owner && claim.expires_at > now {
                return Ok(false);
            }
        }
        state.claims.insert(
            process_id,
            Claim {
                owner,
                expires_at: now + lease,
            },
        );
        Ok(true)
    }

    async fn release_claim(&self, process_id: Uuid, owner: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state
            .claims
            .get(&process_id)
            .is_some_and(|claim| claim.owner == owner)
        {
            state.claims.remove(&process_id);
        }
        Ok(())
    }

    fn publish(&self, process: &Process) {
        // No subscribers is not an error; the queue path still covers the process.
        let _ = self.notify.send(process.clone());
    }

    fn subscribe(&self) -> broadcast::Receiver<Process> {
        self.notify.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> Process {
        Process::builder("Integer")
            .data(Data::new("Integer", "1"))
            .build()
    }

    #[tokio::test]
    async fn test_insert_process_publishes_once() {
        let store = MemoryGraphStore::new();
        let mut rx = store.subscribe();
        let process = seed();

        assert!(store.insert_process(&process).await.unwrap());
        assert!(!store.insert_process(&process).await.unwrap());

        assert_eq!(rx.recv().await.unwrap().id(), process.id());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_insert_rejects_missing_upstream() {
        let store = MemoryGraphStore::new();
        let orphan = Process::builder("AddOne")
            .input_process("n", &seed())
            .build();

        let err = store.insert_process(&orphan).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingUpstream { .. }));
        assert!(store.get_process(orphan.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_resolution_never_replaces_terminal() {
        let store = MemoryGraphStore::new();
        let process = seed();
        store.insert_process(&process).await.unwrap();

        let pending = Resolution::pending(process.id());
        let done = Resolution::succeeded(process.id(), Data::new("Integer", "1"));
        let late = Resolution::failed(process.id(), "late");

        assert_eq!(store.store_resolution(&pending).await.unwrap(), WriteOutcome::Written);
        assert_eq!(store.store_resolution(&done).await.unwrap(), WriteOutcome::Written);
        assert_eq!(
            store.store_resolution(&late).await.unwrap(),
            WriteOutcome::AlreadyTerminal
        );
        assert_eq!(store.get_resolution(process.id()).await.unwrap(), Some(done));

        store.upsert_resolution(&late).await.unwrap();
        assert_eq!(store.get_resolution(process.id()).await.unwrap(), Some(late));
    }

    #[tokio::test]
    async fn test_claims_exclude_other_owners_until_released() {
        let store = MemoryGraphStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let id = Uuid::new_v4();
        let lease = Duration::from_secs(60);

        assert!(store.try_claim(id, a, lease).await.unwrap());
        assert!(store.try_claim(id, a, lease).await.unwrap());
        assert!(!store.try_claim(id, b, lease).await.unwrap());

        store.release_claim(id, b).await.unwrap();
        assert!(!store.try_claim(id, b, lease).await.unwrap());

        store.release_claim(id, a).await.unwrap();
        assert!(store.try_claim(id, b, lease).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_claim_can_be_taken() {
        let store = MemoryGraphStore::new();
        let id = Uuid::new_v4();

        assert!(store.try_claim(id, Uuid::new_v4(), Duration::ZERO).await.unwrap());
        assert!(store
            .try_claim(id, Uuid::new_v4(), Duration::from_secs(60))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_dependents_are_indexed_on_insert() {
        let store = MemoryGraphStore::new();
        let first = seed();
        let a = Process::builder("AddOne").input_process("n", &first).build();
        let b = Process::builder("Scale").input_process("n", &first).build();
        for process in [&first, &a, &b] {
            store.insert_process(process).await.unwrap();
        }

        let mut expected = vec![a.id(), b.id()];
        expected.sort();
        assert_eq!(store.dependents(first.id()).await.unwrap(), expected);
        assert!(store.dependents(a.id()).await.unwrap().is_empty());
    }
}
