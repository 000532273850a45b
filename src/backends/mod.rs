// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Graph store and job queue backends.
//!
//! Each backend implements [`GraphStore`](crate::traits::GraphStore) and
//! [`JobQueue`](crate::traits::JobQueue):
//!
//! - **memory**: `tokio::sync::Mutex` state with a `broadcast` insert channel.
//!   For tests and embedded runs; nothing survives the process.
//! - **sqlite**: `sqlx` over a WAL-mode SQLite file. The graph and the queue can
//!   share one pool. Insert notifications are in-process and fire after commit.
//!
//! ```rust
//! use playbook_engine::backends::memory::{MemoryGraphStore, MemoryJobQueue};
//! use playbook_engine::traits::{GraphStore, JobQueue, QueuePolicy};
//! use std::sync::Arc;
//!
//! let store: Arc<dyn GraphStore> = Arc::new(MemoryGraphStore::new());
//! let queue: Arc<dyn JobQueue> = Arc::new(MemoryJobQueue::new(QueuePolicy::default()));
//! # let _ = (store, queue);
//! ```

pub mod memory;
pub mod sqlite;
