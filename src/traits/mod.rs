// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod compute;
pub mod queue;
pub mod store;

pub use compute::{Compute, ComputeFn, StepInputs};
pub use queue::{Job, JobQueue, JobState, QueuePolicy};
pub use store::{GraphStore, WriteOutcome};
