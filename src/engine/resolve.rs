// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The resolution algorithm.
//!
//! [`bind_inputs`] reads the current upstream data for a process from the
//! graph store. [`resolve_process`] turns a process plus its bound inputs into
//! a [`Resolution`]. It never fails: unknown steps, dependency errors, decode
//! errors and computation errors (panics included) all become `Failed`
//! resolutions, and missing upstream data becomes `Pending`.

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::errors::StoreError;
use crate::model::{Data, InputRef, Process, Resolution};
use crate::registry::{Registry, StepKind};
use crate::traits::{GraphStore, StepInputs};

/// Message for a process whose step type is not registered.
pub const UNRECOGNIZED_PROCESS: &str = "Unrecognized process";

/// What an input name is bound to at evaluation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upstream {
    /// Terminal data, together with the spec of whatever produced it: the
    /// upstream step type, or the data's own type for literals.
    Ready { data: Data, producer: String },
    /// The upstream process exists but has no terminal resolution yet.
    Unbound,
}

/// Input bindings of one process, keyed by input name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundInputs(BTreeMap<String, Upstream>);

impl BoundInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, upstream: Upstream) {
        self.0.insert(name.into(), upstream);
    }

    pub fn ready(mut self, name: impl Into<String>, data: Data, producer: impl Into<String>) -> Self {
        self.insert(
            name,
            Upstream::Ready {
                data,
                producer: producer.into(),
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&Upstream> {
        self.0.get(name)
    }
}

/// Read the current data behind every input of `process`.
///
/// Only infrastructure errors are returned. An upstream process that is
/// missing, never evaluated, or pending binds as [`Upstream::Unbound`].
pub async fn bind_inputs(
    store: &dyn GraphStore,
    process: &Process,
) -> Result<BoundInputs, StoreError> {
    let mut bound = BoundInputs::new();
    for (name, input) in process.inputs() {
        let upstream = match input {
            InputRef::Data(data) => Upstream::Ready {
                data: data.clone(),
                producer: data.spec().to_string(),
            },
            InputRef::Process(id) => match store.get_process(*id).await? {
                Some(record) => match record.resolution.as_ref().and_then(|r| r.data()) {
                    Some(data) => Upstream::Ready {
                        data: data.clone(),
                        producer: record.process.step_type().to_string(),
                    },
                    None => Upstream::Unbound,
                },
                None => Upstream::Unbound,
            },
        };
        bound.insert(name.clone(), upstream);
    }
    Ok(bound)
}

/// Evaluate `process` against the registry.
///
/// Inputs are examined in the step's declaration order, so the first blocking
/// input decides the outcome and diagnostics are reproducible.
pub async fn resolve_process(
    registry: &Registry,
    process: &Process,
    bound: &BoundInputs,
) -> Resolution {
    let id = process.id();
    let step_type = process.step_type();

    let Some(step) = registry.lookup(step_type) else {
        return Resolution::failed(id, UNRECOGNIZED_PROCESS);
    };

    let mut inputs = StepInputs::new();
    for (name, codec) in step.inputs() {
        let (data, producer) = match bound.get(name) {
            Some(Upstream::Ready { data, producer }) => (data, producer),
            Some(Upstream::Unbound) | None => return Resolution::pending(id),
        };
        if data.is_error() {
            return Resolution::failed(
                id,
                format!("{step_type} can't run because of error in {producer} (input '{name}')"),
            );
        }
        match codec.decode(data.value()) {
            Ok(value) => inputs.insert(name.clone(), value),
            Err(e) => {
                return Resolution::failed(
                    id,
                    format!("{step_type} could not decode input '{name}': {e}"),
                )
            }
        }
    }

    match step.kind() {
        StepKind::Prompt => match process.data() {
            Some(data) => Resolution::succeeded(id, data.clone()),
            None => Resolution::pending(id),
        },
        StepKind::Computed(compute) => {
            let compute = Arc::clone(compute);
            let data = process.data().cloned();
            // A separate task turns a panic in the step body into a JoinError.
            let task = tokio::spawn(async move { compute.compute(inputs, data).await });
            match task.await {
                Ok(Ok(value)) => match step.output().encode(&value) {
                    Ok(payload) => Resolution::succeeded(id, Data::new(step.output().spec(), payload)),
                    Err(e) => Resolution::failed(id, format!("{step_type} produced invalid output: {e}")),
                },
                Ok(Err(e)) => Resolution::failed(id, e.to_string()),
                Err(e) if e.is_panic() => Resolution::failed(
                    id,
                    format!("{step_type} panicked: {}", panic_message(e.into_panic())),
                ),
                Err(e) => Resolution::failed(id, format!("{step_type} was aborted: {e}")),
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ComputeError;
    use crate::model::ResolutionState;
    use crate::registry::{StepSpec, TypeSpec};
    use crate::traits::ComputeFn;
    use serde_json::{json, Value};

    fn registry() -> Registry {
        let add_one = ComputeFn::new(|inputs: StepInputs, _data| async move {
            inputs.get_as::<i64>("n").map(|n| json!(n + 1))
        });
        let explode = ComputeFn::new(|_inputs: StepInputs, _data| async move {
            if true {
                panic!("kaboom");
            }
            Ok::<Value, ComputeError>(json!(0))
        });
        let boom = ComputeFn::new(|_inputs: StepInputs, _data| async move {
            Err::<Value, ComputeError>(ComputeError::failed("boom"))
        });
        let wrong_type = ComputeFn::new(|_inputs: StepInputs, _data| async move {
            Ok::<Value, ComputeError>(json!("not a number"))
        });
        let integer = || TypeSpec::json::<i64>("Integer");

        Registry::builder()
            .register(StepSpec::prompt("Identity", TypeSpec::json::<Value>("Json")))
            .and_then(|b| {
                b.register(
                    StepSpec::prompt("Confirm", TypeSpec::json::<Value>("Json"))
                        .with_input("n", integer()),
                )
            })
            .and_then(|b| {
                b.register(StepSpec::computed("AddOne", integer(), Arc::new(add_one)).with_input("n", integer()))
            })
            .and_then(|b| b.register(StepSpec::computed("Explode", integer(), Arc::new(explode))))
            .and_then(|b| b.register(StepSpec::computed("Boom", integer(), Arc::new(boom))))
            .and_then(|b| b.register(StepSpec::computed("WrongType", integer(), Arc::new(wrong_type))))
            .unwrap()
            .build()
    }

    #[tokio::test]
    async fn test_resolve_process_outcomes() {
        struct TestCase {
            name: &'static str,
            process: Process,
            bound: BoundInputs,
            expected_state: ResolutionState,
            expected_value: Option<&'static str>,
            expected_error: Option<&'static str>,
        }

        let json_seed = Process::builder("Identity")
            .data(Data::new("Json", r#"{"x":1}"#))
            .build();

        let test_cases = vec![
            TestCase {
                name: "unknown step fails",
                process: Process::builder("Nope").build(),
                bound: BoundInputs::new(),
                expected_state: ResolutionState::Failed,
                expected_value: None,
                expected_error: Some("Unrecognized process"),
            },
            TestCase {
                name: "prompt passes literal data through",
                process: json_seed.clone(),
                bound: BoundInputs::new(),
                expected_state: ResolutionState::Succeeded,
                expected_value: Some(r#"{"x":1}"#),
                expected_error: None,
            },
            TestCase {
                name: "prompt without data is pending",
                process: Process::builder("Identity").build(),
                bound: BoundInputs::new(),
                expected_state: ResolutionState::Pending,
                expected_value: None,
                expected_error: None,
            },
            TestCase {
                name: "prompt ignores input values",
                process: Process::builder("Confirm").data(Data::new("Json", "true")).build(),
                bound: BoundInputs::new().ready("n", Data::new("Integer", "5"), "Integer"),
                expected_state: ResolutionState::Succeeded,
                expected_value: Some("true"),
                expected_error: None,
            },
            TestCase {
                name: "unbound input is pending",
                process: Process::builder("AddOne").input_process("n", &json_seed).build(),
                bound: BoundInputs::new(),
                expected_state: ResolutionState::Pending,
                expected_value: None,
                expected_error: None,
            },
            TestCase {
                name: "computed step succeeds",
                process: Process::builder("AddOne").build(),
                bound: BoundInputs::new().ready("n", Data::new("Integer", "1"), "Integer"),
                expected_state: ResolutionState::Succeeded,
                expected_value: Some("2"),
                expected_error: None,
            },
            TestCase {
                name: "error input propagates with producer spec",
                process: Process::builder("AddOne").build(),
                bound: BoundInputs::new().ready("n", Data::error("boom"), "Sum"),
                expected_state: ResolutionState::Failed,
                expected_value: None,
                expected_error: Some("AddOne can't run because of error in Sum (input 'n')"),
            },
            TestCase {
                name: "computation error is recorded",
                process: Process::builder("Boom").build(),
                bound: BoundInputs::new(),
                expected_state: ResolutionState::Failed,
                expected_value: None,
                expected_error: Some("boom"),
            },
            TestCase {
                name: "panic is caught",
                process: Process::builder("Explode").build(),
                bound: BoundInputs::new(),
                expected_state: ResolutionState::Failed,
                expected_value: None,
                expected_error: Some("Explode panicked: kaboom"),
            },
        ];

        let registry = registry();
        for case in test_cases {
            let resolution = resolve_process(&registry, &case.process, &case.bound).await;
            assert_eq!(resolution.process_id(), case.process.id(), "{}", case.name);
            assert_eq!(resolution.state(), case.expected_state, "{}", case.name);
            if let Some(value) = case.expected_value {
                assert_eq!(resolution.data().map(Data::value), Some(value), "{}", case.name);
            }
            assert_eq!(
                resolution.error_message().as_deref(),
                case.expected_error,
                "{}",
                case.name
            );
        }
    }

    #[tokio::test]
    async fn test_decode_and_encode_failures() {
        let registry = registry();

        let bad_input = Process::builder("AddOne").build();
        let bound = BoundInputs::new().ready("n", Data::new("Text", "\"one\""), "Text");
        let message = resolve_process(&registry, &bad_input, &bound)
            .await
            .error_message()
            .unwrap();
        assert!(
            message.starts_with("AddOne could not decode input 'n': Integer codec:"),
            "{message}"
        );

        let bad_output = Process::builder("WrongType").build();
        let message = resolve_process(&registry, &bad_output, &BoundInputs::new())
            .await
            .error_message()
            .unwrap();
        assert!(message.starts_with("WrongType produced invalid output"), "{message}");
    }

    #[tokio::test]
    async fn test_succeeded_data_is_tagged_with_output_type() {
        let registry = registry();
        let process = Process::builder("AddOne").build();
        let bound = BoundInputs::new().ready("n", Data::new("Integer", "41"), "Integer");

        let resolution = resolve_process(&registry, &process, &bound).await;
        assert_eq!(resolution.data(), Some(&Data::new("Integer", "42")));
    }
}
