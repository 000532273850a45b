// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! In-memory graph store and job queue.

mod queue;
mod store;

pub use queue::MemoryJobQueue;
pub use store::{MemoryGraphStore, NOTIFY_CAPACITY};
