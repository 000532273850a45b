// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised while assembling a step registry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("step '{0}' is already registered")]
    DuplicateStep(String),

    #[error("step '{step}' declares input '{input}' twice")]
    DuplicateInput { step: String, input: String },
}

/// A payload did not match the shape a codec expects.
#[derive(Error, Debug)]
#[error("{spec} codec: {source}")]
pub struct CodecError {
    pub spec: String,
    #[source]
    pub source: serde_json::Error,
}

/// Errors returned by a step's computation.
///
/// The engine records the `Display` text of the error in a failed resolution.
#[derive(Error, Debug)]
pub enum ComputeError {
    #[error("missing input '{0}'")]
    MissingInput(String),

    #[error("invalid input '{name}': {source}")]
    InvalidInput {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid parameters: {0}")]
    InvalidData(String),

    #[error("{0}")]
    Failed(String),
}

impl ComputeError {
    pub fn failed(message: impl Into<String>) -> Self {
        ComputeError::Failed(message.into())
    }
}
