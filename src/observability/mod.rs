// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Message types follow a struct-based pattern with a `Display` implementation
//! and a [`StructuredLog`](messages::StructuredLog) implementation, so that log
//! text lives in one place and every line carries structured fields.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - resolution lifecycle events
//! * `messages::worker` - queue worker pool and job events
//! * `messages::dispatch` - change-notification listener events
//! * `messages::validation` - playbook validation and submission
//!
//! # Usage
//!
//! ```rust
//! use playbook_engine::observability::messages::dispatch::NotificationsLagged;
//! use playbook_engine::observability::messages::StructuredLog;
//!
//! NotificationsLagged { skipped: 3 }.log();
//! ```

pub mod messages;

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber: filter from `RUST_LOG` (default `info`),
/// formatted output on stderr.
///
/// Returns `false` when a subscriber was already installed.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
