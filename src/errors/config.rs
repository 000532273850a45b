// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating the engine configuration.
///
/// All of these are fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unsupported config format for {0} (expected .yaml, .yml or .toml)")]
    UnsupportedFormat(PathBuf),

    /// No database connection string in the config file or the environment.
    #[error("Missing `DATABASE_URL`")]
    MissingDatabaseUrl,

    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Errors that can occur during playbook graph validation
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A circular dependency was detected between playbook nodes
    CyclicDependency {
        /// The cycle path showing the circular dependency
        cycle: Vec<String>,
    },
    /// A node input references a node that doesn't exist
    UnresolvedDependency {
        node_id: String,
        missing_dependency: String,
    },
    /// Two nodes share the same id
    DuplicateNodeId { node_id: String },
    /// A node names a step type the registry doesn't know
    UnknownStep { node_id: String, step: String },
    /// A node binds an input its step doesn't declare
    UndeclaredInput {
        node_id: String,
        step: String,
        input: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::CyclicDependency { cycle } => {
                write!(f, "Cyclic dependency detected: {}", cycle.join(" -> "))
            }
            ValidationError::UnresolvedDependency {
                node_id,
                missing_dependency,
            } => {
                write!(
                    f,
                    "Node '{}' depends on '{}' which does not exist",
                    node_id, missing_dependency
                )
            }
            ValidationError::DuplicateNodeId { node_id } => {
                write!(f, "Duplicate node ID: '{}'", node_id)
            }
            ValidationError::UnknownStep { node_id, step } => {
                write!(f, "Node '{}' uses unknown step '{}'", node_id, step)
            }
            ValidationError::UndeclaredInput {
                node_id,
                step,
                input,
            } => {
                write!(
                    f,
                    "Node '{}' binds input '{}' which step '{}' does not declare",
                    node_id, input, step
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}
