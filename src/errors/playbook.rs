// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use thiserror::Error;

use crate::errors::{CodecError, QueueError, StoreError, ValidationError};

#[derive(Error, Debug)]
pub enum PlaybookError {
    #[error("failed to read playbook {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid playbook YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("playbook failed validation: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),

    #[error("node '{node_id}' has invalid literal data: {source}")]
    InvalidLiteral {
        node_id: String,
        #[source]
        source: CodecError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
