// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The process-graph resolution engine.
//!
//! * [`resolve`] - the pure resolution algorithm and input binding
//! * [`reconcile`] - claim, resolve, store and re-trigger for one delivered process
//! * [`dispatcher`] - trigger path driven by graph store insert notifications
//! * [`workers`] - trigger path driven by the durable job queue
//! * [`retrigger`] - re-delivery of dependents after a terminal write

pub mod dispatcher;
pub mod reconcile;
pub mod resolve;
pub mod retrigger;
pub mod workers;

pub use dispatcher::ProcessInsertDispatcher;
pub use reconcile::{Reconciled, Reconciler, Trigger};
pub use resolve::{bind_inputs, resolve_process, BoundInputs, Upstream, UNRECOGNIZED_PROCESS};
pub use retrigger::Retrigger;
pub use workers::{QueueWorkerPool, WorkerOptions, WorkerPoolHandle, DEFAULT_QUEUE_NAME};
