// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! YAML playbooks: user-authored chains of steps that become processes.

pub mod loader;
pub mod submit;
pub mod validation;

pub use loader::{load_playbook, parse_playbook, NodeInput, Playbook, PlaybookNode};
pub use submit::{materialize, submit};
pub use validation::validate_playbook;
