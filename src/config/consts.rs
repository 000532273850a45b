// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Environment variable holding the database connection string
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
/// Environment variable overriding the worker count
pub const WORKERS_ENV: &str = "PLAYBOOK_WORKERS";

/// Default number of queue workers (also the number of jobs in flight)
pub const DEFAULT_WORKERS: usize = 4;
/// Default process claim lease (5 minutes)
pub const DEFAULT_CLAIM_LEASE_SECONDS: u64 = 300;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;
/// Default job lease before an active job counts as abandoned (5 minutes)
pub const DEFAULT_JOB_LEASE_SECONDS: u64 = 300;
pub const DEFAULT_RETRY_LIMIT: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
/// Delay before a contended notification is published again
pub const DEFAULT_REDELIVERY_DELAY_MS: u64 = DEFAULT_RETRY_DELAY_MS;

/// Pool size for the SQLite connection pool
pub const DEFAULT_MAX_CONNECTIONS: u32 = 8;
