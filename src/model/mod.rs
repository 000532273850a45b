// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Entities of the process graph: [`Data`], [`Process`] and [`Resolution`].
//!
//! Data and processes are content-addressed and immutable once created.
//! Resolutions are the only entity the engine writes.

mod data;
mod process;
mod resolution;

pub use data::{Data, ERROR_SPEC};
pub use process::{InputRef, Process, ProcessBuilder, ProcessRecord};
pub use resolution::{Outcome, Resolution, ResolutionState};

use uuid::Uuid;

/// Namespace for every content-derived id in the graph.
const GRAPH_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a4e_93b7_4d0a_8c55_e1f0_7b3d_92a6);

/// UUIDv5 over the canonical JSON rendering of `value`.
///
/// Callers build `value` with a fixed key order, so equal content renders to equal bytes.
pub(crate) fn content_id(value: &serde_json::Value) -> Uuid {
    Uuid::new_v5(&GRAPH_NAMESPACE, value.to_string().as_bytes())
}
