// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::model::{content_id, Data, Resolution};

/// Where a process input comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum InputRef {
    /// The resolved output of another process.
    Process(Uuid),
    /// A literal value bound directly to the input.
    Data(Data),
}

impl InputRef {
    /// Identity of the referenced entity (a process id or a data id).
    pub fn id(&self) -> Uuid {
        match self {
            InputRef::Process(id) => *id,
            InputRef::Data(data) => data.id(),
        }
    }
}

/// A graph node requesting evaluation of one step.
///
/// The id is content-addressed over the step type, the literal data and every
/// input reference. Because an id can only be computed from ids that already
/// exist, a process can never depend on itself, directly or transitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    id: Uuid,
    step_type: String,
    data: Option<Data>,
    inputs: BTreeMap<String, InputRef>,
}

impl Process {
    pub fn new(
        step_type: impl Into<String>,
        data: Option<Data>,
        inputs: BTreeMap<String, InputRef>,
    ) -> Self {
        let step_type = step_type.into();
        let input_ids: BTreeMap<&str, String> = inputs
            .iter()
            .map(|(name, input)| (name.as_str(), input.id().to_string()))
            .collect();
        let id = content_id(&serde_json::json!({
            "type": step_type,
            "data": data.as_ref().map(|d| d.id().to_string()),
            "inputs": input_ids,
        }));
        Self {
            id,
            step_type,
            data,
            inputs,
        }
    }

    pub fn builder(step_type: impl Into<String>) -> ProcessBuilder {
        ProcessBuilder {
            step_type: step_type.into(),
            data: None,
            inputs: BTreeMap::new(),
        }
    }

    pub(crate) fn from_stored(
        id: Uuid,
        step_type: String,
        data: Option<Data>,
        inputs: BTreeMap<String, InputRef>,
    ) -> Self {
        Self {
            id,
            step_type,
            data,
            inputs,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn step_type(&self) -> &str {
        &self.step_type
    }

    pub fn data(&self) -> Option<&Data> {
        self.data.as_ref()
    }

    pub fn inputs(&self) -> &BTreeMap<String, InputRef> {
        &self.inputs
    }

    /// Ids of the upstream processes this process reads from.
    pub fn upstream_processes(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.inputs.values().filter_map(|input| match input {
            InputRef::Process(id) => Some(*id),
            InputRef::Data(_) => None,
        })
    }
}

/// Incremental construction of a [`Process`].
///
/// ```
/// use playbook_engine::model::{Data, Process};
///
/// let seed = Process::builder("Integer").data(Data::new("Integer", "1")).build();
/// let next = Process::builder("AddOne").input_process("n", &seed).build();
///
/// assert_eq!(next.upstream_processes().collect::<Vec<_>>(), vec![seed.id()]);
/// ```
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    step_type: String,
    data: Option<Data>,
    inputs: BTreeMap<String, InputRef>,
}

impl ProcessBuilder {
    pub fn data(mut self, data: Data) -> Self {
        self.data = Some(data);
        self
    }

    pub fn input(mut self, name: impl Into<String>, input: InputRef) -> Self {
        self.inputs.insert(name.into(), input);
        self
    }

    pub fn input_process(self, name: impl Into<String>, upstream: &Process) -> Self {
        self.input(name, InputRef::Process(upstream.id()))
    }

    pub fn input_data(self, name: impl Into<String>, data: Data) -> Self {
        self.input(name, InputRef::Data(data))
    }

    pub fn build(self) -> Process {
        Process::new(self.step_type, self.data, self.inputs)
    }
}

/// A process as read back from a graph store, together with its current resolution.
///
/// `resolution` is `None` when the process has never been evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRecord {
    pub process: Process,
    pub resolution: Option<Resolution>,
}

impl ProcessRecord {
    pub fn is_terminal(&self) -> bool {
        self.resolution.as_ref().is_some_and(Resolution::is_terminal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_depends_on_every_component() {
        let seed = Process::builder("Integer").data(Data::new("Integer", "1")).build();
        let same_seed = Process::builder("Integer").data(Data::new("Integer", "1")).build();
        let other_seed = Process::builder("Integer").data(Data::new("Integer", "2")).build();

        assert_eq!(seed.id(), same_seed.id());
        assert_ne!(seed.id(), other_seed.id());

        let from_seed = Process::builder("AddOne").input_process("n", &seed).build();
        let from_other = Process::builder("AddOne").input_process("n", &other_seed).build();
        let renamed = Process::builder("AddOne").input_process("m", &seed).build();
        let other_type = Process::builder("Scale").input_process("n", &seed).build();

        assert_ne!(from_seed.id(), from_other.id());
        assert_ne!(from_seed.id(), renamed.id());
        assert_ne!(from_seed.id(), other_type.id());
    }

    #[test]
    fn test_upstream_processes_skip_literal_inputs() {
        let seed = Process::builder("Integer").data(Data::new("Integer", "1")).build();
        let sum = Process::builder("Sum")
            .input_process("a", &seed)
            .input_data("b", Data::new("Integer", "41"))
            .build();

        let upstream: Vec<Uuid> = sum.upstream_processes().collect();
        assert_eq!(upstream, vec![seed.id()]);
        assert_eq!(sum.inputs().len(), 2);
    }

    #[test]
    fn test_input_ref_serialization_is_tagged() {
        let input = InputRef::Process(Uuid::nil());
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["kind"], "process");
        let back: InputRef = serde_json::from_value(json).unwrap();
        assert_eq!(back, input);
    }
}
