// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod engine;
mod playbook;
mod step;
mod store;

pub use config::{ConfigError, ValidationError};
pub use engine::EngineError;
pub use playbook::PlaybookError;
pub use step::{CodecError, ComputeError, RegistryError};
pub use store::{QueueError, StoreError};
