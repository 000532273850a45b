// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // graph store + queue implementations
pub mod config;     // engine config + runtime
pub mod engine;     // resolution, dispatcher, workers
pub mod errors;     // error handling
pub mod model;      // data, processes, resolutions
pub mod observability;
pub mod playbook;   // YAML playbooks
pub mod registry;   // step specs + codecs
pub mod steps;      // built-in step catalog
pub mod traits;     // unified abstractions
