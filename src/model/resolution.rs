// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::model::Data;

/// Outcome of evaluating a process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum Outcome {
    /// Some required input is not resolved yet. The only non-terminal state.
    Pending,
    /// Output produced by the step.
    Succeeded(Data),
    /// `Error`-tagged data carrying the diagnostic.
    Failed(Data),
}

/// Discriminant of an [`Outcome`], used for logging and status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionState {
    Pending,
    Succeeded,
    Failed,
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionState::Pending => write!(f, "pending"),
            ResolutionState::Succeeded => write!(f, "succeeded"),
            ResolutionState::Failed => write!(f, "failed"),
        }
    }
}

/// The stored outcome for one process. There is at most one per process id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    process_id: Uuid,
    outcome: Outcome,
}

impl Resolution {
    pub fn pending(process_id: Uuid) -> Self {
        Self {
            process_id,
            outcome: Outcome::Pending,
        }
    }

    pub fn succeeded(process_id: Uuid, data: Data) -> Self {
        Self {
            process_id,
            outcome: Outcome::Succeeded(data),
        }
    }

    pub fn failed(process_id: Uuid, message: impl AsRef<str>) -> Self {
        Self {
            process_id,
            outcome: Outcome::Failed(Data::error(message)),
        }
    }

    /// Classify a stored (possibly absent) data value: no data is Pending,
    /// `Error` data is Failed, anything else Succeeded.
    pub fn from_data(process_id: Uuid, data: Option<Data>) -> Self {
        let outcome = match data {
            None => Outcome::Pending,
            Some(data) if data.is_error() => Outcome::Failed(data),
            Some(data) => Outcome::Succeeded(data),
        };
        Self {
            process_id,
            outcome,
        }
    }

    pub fn process_id(&self) -> Uuid {
        self.process_id
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn state(&self) -> ResolutionState {
        match self.outcome {
            Outcome::Pending => ResolutionState::Pending,
            Outcome::Succeeded(_) => ResolutionState::Succeeded,
            Outcome::Failed(_) => ResolutionState::Failed,
        }
    }

    pub fn data(&self) -> Option<&Data> {
        match &self.outcome {
            Outcome::Pending => None,
            Outcome::Succeeded(data) | Outcome::Failed(data) => Some(data),
        }
    }

    /// Succeeded and Failed resolutions are never re-evaluated automatically.
    pub fn is_terminal(&self) -> bool {
        !matches!(self.outcome, Outcome::Pending)
    }

    pub fn error_message(&self) -> Option<String> {
        match &self.outcome {
            Outcome::Failed(data) => data.error_message(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_data_classifies_states() {
        struct TestCase {
            name: &'static str,
            data: Option<Data>,
            expected: ResolutionState,
            terminal: bool,
        }

        let test_cases = vec![
            TestCase {
                name: "no data is pending",
                data: None,
                expected: ResolutionState::Pending,
                terminal: false,
            },
            TestCase {
                name: "error data is failed",
                data: Some(Data::error("boom")),
                expected: ResolutionState::Failed,
                terminal: true,
            },
            TestCase {
                name: "typed data is succeeded",
                data: Some(Data::new("Integer", "2")),
                expected: ResolutionState::Succeeded,
                terminal: true,
            },
        ];

        for case in test_cases {
            let resolution = Resolution::from_data(Uuid::nil(), case.data.clone());
            assert_eq!(resolution.state(), case.expected, "{}", case.name);
            assert_eq!(resolution.is_terminal(), case.terminal, "{}", case.name);
            assert_eq!(resolution.data(), case.data.as_ref(), "{}", case.name);
        }
    }

    #[test]
    fn test_failed_exposes_message() {
        let resolution = Resolution::failed(Uuid::nil(), "Unrecognized process");
        assert_eq!(resolution.error_message().as_deref(), Some("Unrecognized process"));
        assert_eq!(Resolution::pending(Uuid::nil()).error_message(), None);
    }
}
