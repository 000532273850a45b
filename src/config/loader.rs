// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::config::consts::{
    DATABASE_URL_ENV, DEFAULT_CLAIM_LEASE_SECONDS, DEFAULT_JOB_LEASE_SECONDS,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_RETRY_DELAY_MS, DEFAULT_RETRY_LIMIT, DEFAULT_WORKERS,
    WORKERS_ENV,
};
use crate::engine::{WorkerOptions, DEFAULT_QUEUE_NAME};
use crate::errors::ConfigError;
use crate::traits::QueuePolicy;

/// Main configuration structure for the resolution engine.
///
/// Every field has a default, so an empty file (or no file at all) is a
/// valid configuration apart from the database URL, which usually comes from
/// the environment.
///
/// # Example
/// ```yaml
/// database_url: sqlite://playbook.db
/// workers: 4
/// claim_lease_seconds: 300
/// queue:
///   name: work-queue
///   poll_interval_ms: 250
///   lease_seconds: 300
///   retry_limit: 3
///   retry_delay_ms: 1000
/// dispatch:
///   listen: true
///   queue: true
///   retrigger_queue: true
///   retrigger_notify: true
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Overridden by `DATABASE_URL`.
    pub database_url: Option<String>,
    /// Overridden by `PLAYBOOK_WORKERS`.
    pub workers: usize,
    pub claim_lease_seconds: u64,
    pub queue: QueueConfig,
    pub dispatch: DispatchConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            workers: DEFAULT_WORKERS,
            claim_lease_seconds: DEFAULT_CLAIM_LEASE_SECONDS,
            queue: QueueConfig::default(),
            dispatch: DispatchConfig::default(),
        }
    }
}

/// Durable job queue settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub name: String,
    pub poll_interval_ms: u64,
    pub lease_seconds: u64,
    pub retry_limit: u32,
    pub retry_delay_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_QUEUE_NAME.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            lease_seconds: DEFAULT_JOB_LEASE_SECONDS,
            retry_limit: DEFAULT_RETRY_LIMIT,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

/// Which trigger paths run, and how dependents are re-triggered.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Run the change-notification dispatcher.
    pub listen: bool,
    /// Run the queue worker pool.
    pub queue: bool,
    /// Re-trigger dependents by enqueueing them.
    pub retrigger_queue: bool,
    /// Re-trigger dependents by republishing them to the dispatcher.
    pub retrigger_notify: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            listen: true,
            queue: true,
            retrigger_queue: true,
            retrigger_notify: true,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply the environment overrides from the process environment.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply the environment overrides using `lookup` to read variables.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(DATABASE_URL_ENV).filter(|url| !url.is_empty()) {
            self.database_url = Some(url);
        }
        if let Some(workers) = lookup(WORKERS_ENV) {
            self.workers = workers.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: WORKERS_ENV,
                reason: format!("{workers:?} is not a worker count: {e}"),
            })?;
        }
        Ok(self)
    }

    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingDatabaseUrl)
    }

    pub fn claim_lease(&self) -> Duration {
        Duration::from_secs(self.claim_lease_seconds)
    }

    pub fn queue_policy(&self) -> QueuePolicy {
        QueuePolicy {
            lease: Duration::from_secs(self.queue.lease_seconds),
            retry_limit: self.queue.retry_limit,
            retry_delay: Duration::from_millis(self.queue.retry_delay_ms),
        }
    }

    /// Worker pool options; claim contention releases use the retry delay.
    pub fn worker_options(&self) -> WorkerOptions {
        WorkerOptions {
            workers: self.workers,
            queue_name: self.queue.name.clone(),
            poll_interval: Duration::from_millis(self.queue.poll_interval_ms),
            release_delay: Duration::from_millis(self.queue.retry_delay_ms),
        }
    }

    /// How long the dispatcher waits before re-publishing a contended process.
    pub fn redelivery_delay(&self) -> Duration {
        Duration::from_millis(self.queue.retry_delay_ms)
    }
}

/// Load a config from a YAML or TOML file, chosen by extension
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => EngineConfig::from_yaml_str(&content),
        Some("toml") => EngineConfig::from_toml_str(&content),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Load a config (or start from defaults), apply the environment and validate it.
pub fn load_and_validate_config(path: Option<&Path>) -> Result<EngineConfig, ConfigError> {
    let config = match path {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    }
    .with_env()?;

    crate::config::validate_config(&config)?;
    Ok(config)
}
