// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The step registry: every step type the engine knows how to resolve.
//!
//! A [`Registry`] is built once at startup and shared read-only as
//! `Arc<Registry>` with every engine entry point. Nothing in the engine keeps a
//! global or static registry.

mod codec;

pub use codec::{Codec, JsonCodec, TypeSpec};

use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::RegistryError;
use crate::traits::Compute;

/// How a step produces its output.
#[derive(Clone)]
pub enum StepKind {
    /// The output is the process's own literal data, nothing is computed.
    Prompt,
    /// The output is produced by a computation over the decoded inputs.
    Computed(Arc<dyn Compute>),
}

impl StepKind {
    pub fn is_prompt(&self) -> bool {
        matches!(self, StepKind::Prompt)
    }
}

impl fmt::Debug for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::Prompt => write!(f, "Prompt"),
            StepKind::Computed(_) => write!(f, "Computed"),
        }
    }
}

/// Display metadata for a step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepMeta {
    pub label: String,
    pub description: String,
}

/// An immutable registry entry describing one step type.
#[derive(Debug, Clone)]
pub struct StepSpec {
    spec: String,
    inputs: IndexMap<String, TypeSpec>,
    output: TypeSpec,
    kind: StepKind,
    meta: StepMeta,
    duplicate_inputs: Vec<String>,
}

impl StepSpec {
    /// A step that passes its literal data through unchanged.
    pub fn prompt(spec: impl Into<String>, output: TypeSpec) -> Self {
        Self::with_kind(spec.into(), output, StepKind::Prompt)
    }

    pub fn computed(spec: impl Into<String>, output: TypeSpec, compute: Arc<dyn Compute>) -> Self {
        Self::with_kind(spec.into(), output, StepKind::Computed(compute))
    }

    fn with_kind(spec: String, output: TypeSpec, kind: StepKind) -> Self {
        let meta = StepMeta {
            label: spec.clone(),
            description: String::new(),
        };
        Self {
            spec,
            inputs: IndexMap::new(),
            output,
            kind,
            meta,
            duplicate_inputs: Vec::new(),
        }
    }

    /// Declare a named input. Inputs are evaluated in declaration order.
    ///
    /// Declaring the same name twice keeps the first position and is reported
    /// as [`RegistryError::DuplicateInput`] when the step is registered.
    pub fn with_input(mut self, name: impl Into<String>, input: TypeSpec) -> Self {
        let name = name.into();
        if self.inputs.contains_key(&name) {
            self.duplicate_inputs.push(name);
        } else {
            self.inputs.insert(name, input);
        }
        self
    }

    pub fn with_meta(mut self, label: impl Into<String>, description: impl Into<String>) -> Self {
        self.meta.label = label.into();
        self.meta.description = description.into();
        self
    }

    pub fn spec(&self) -> &str {
        &self.spec
    }

    pub fn inputs(&self) -> &IndexMap<String, TypeSpec> {
        &self.inputs
    }

    pub fn output(&self) -> &TypeSpec {
        &self.output
    }

    pub fn kind(&self) -> &StepKind {
        &self.kind
    }

    pub fn meta(&self) -> &StepMeta {
        &self.meta
    }
}

/// Read-only map from step type identifier to its [`StepSpec`].
#[derive(Clone, Default)]
pub struct Registry(HashMap<String, Arc<StepSpec>>);

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn lookup(&self, step_type: &str) -> Option<&StepSpec> {
        self.0.get(step_type).map(Arc::as_ref)
    }

    pub fn contains(&self, step_type: &str) -> bool {
        self.0.contains_key(step_type)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All registered steps, sorted by identifier.
    pub fn specs(&self) -> Vec<&StepSpec> {
        let mut specs: Vec<&StepSpec> = self.0.values().map(Arc::as_ref).collect();
        specs.sort_by(|a, b| a.spec().cmp(b.spec()));
        specs
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&String> = self.0.keys().collect();
        ids.sort();
        f.debug_struct("Registry").field("steps", &ids).finish()
    }
}

/// Collects step specs, rejecting duplicates.
#[derive(Default)]
pub struct RegistryBuilder {
    steps: HashMap<String, Arc<StepSpec>>,
}

impl RegistryBuilder {
    pub fn register(mut self, step: StepSpec) -> Result<Self, RegistryError> {
        if let Some(input) = step.duplicate_inputs.first() {
            return Err(RegistryError::DuplicateInput {
                step: step.spec.clone(),
                input: input.clone(),
            });
        }
        if self.steps.contains_key(step.spec()) {
            return Err(RegistryError::DuplicateStep(step.spec.clone()));
        }
        self.steps.insert(step.spec.clone(), Arc::new(step));
        Ok(self)
    }

    pub fn build(self) -> Registry {
        Registry(self.steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{ComputeFn, StepInputs};
    use serde_json::{json, Value};

    fn add_one() -> StepSpec {
        let compute = ComputeFn::new(|inputs: StepInputs, _data| async move {
            inputs.get_as::<i64>("n").map(|n| json!(n + 1))
        });
        StepSpec::computed("AddOne", TypeSpec::json::<i64>("Integer"), Arc::new(compute))
            .with_input("n", TypeSpec::json::<i64>("Integer"))
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = Registry::builder()
            .register(StepSpec::prompt("Identity", TypeSpec::json::<Value>("Json")))
            .and_then(|b| b.register(add_one()))
            .unwrap()
            .build();

        assert_eq!(registry.len(), 2);
        assert!(registry.lookup("Identity").unwrap().kind().is_prompt());

        let step = registry.lookup("AddOne").unwrap();
        assert!(!step.kind().is_prompt());
        assert_eq!(step.output().spec(), "Integer");
        assert_eq!(step.inputs().keys().collect::<Vec<_>>(), vec!["n"]);
        assert!(registry.lookup("Missing").is_none());

        let ids: Vec<&str> = registry.specs().iter().map(|s| s.spec()).collect();
        assert_eq!(ids, vec!["AddOne", "Identity"]);
    }

    #[test]
    fn test_registration_errors() {
        struct TestCase {
            name: &'static str,
            steps: Vec<StepSpec>,
            expected: RegistryError,
        }

        let test_cases = vec![
            TestCase {
                name: "duplicate step",
                steps: vec![add_one(), add_one()],
                expected: RegistryError::DuplicateStep("AddOne".into()),
            },
            TestCase {
                name: "duplicate input",
                steps: vec![add_one().with_input("n", TypeSpec::json::<i64>("Integer"))],
                expected: RegistryError::DuplicateInput {
                    step: "AddOne".into(),
                    input: "n".into(),
                },
            },
        ];

        for case in test_cases {
            let result = case
                .steps
                .into_iter()
                .try_fold(Registry::builder(), |builder, step| builder.register(step));
            assert_eq!(result.err(), Some(case.expected), "{}", case.name);
        }
    }

    #[test]
    fn test_input_order_is_declaration_order() {
        let step = StepSpec::prompt("Form", TypeSpec::json::<Value>("Json"))
            .with_input("zeta", TypeSpec::json::<Value>("Json"))
            .with_input("alpha", TypeSpec::json::<Value>("Json"))
            .with_meta("Form", "collects answers");

        assert_eq!(step.inputs().keys().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        assert_eq!(step.meta().description, "collects answers");
    }
}
