// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;

use crate::errors::ComputeError;
use crate::model::Data;

/// Decoded input values handed to a computation, keyed by input name in
/// the step's declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepInputs(pub IndexMap<String, Value>);

impl StepInputs {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Deserialize one input into a concrete type.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, ComputeError> {
        let value = self
            .0
            .get(name)
            .ok_or_else(|| ComputeError::MissingInput(name.to_string()))?;
        serde_json::from_value(value.clone()).map_err(|source| ComputeError::InvalidInput {
            name: name.to_string(),
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<IndexMap<String, Value>> for StepInputs {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self(map)
    }
}

/// The body of a computed step.
///
/// `data` is the process's literal data, used as extra parameters. Errors are
/// recorded as failed resolutions; they never stop the engine.
#[async_trait]
pub trait Compute: Send + Sync {
    async fn compute(&self, inputs: StepInputs, data: Option<Data>) -> Result<Value, ComputeError>;
}

/// Adapts an async closure into a [`Compute`].
///
/// ```
/// use playbook_engine::traits::{Compute, ComputeFn, StepInputs};
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() {
/// let double = ComputeFn::new(|inputs: StepInputs, _data| async move {
///     inputs.get_as::<i64>("n").map(|n| json!(n * 2))
/// });
///
/// let mut inputs = StepInputs::new();
/// inputs.insert("n", json!(21));
/// assert_eq!(double.compute(inputs, None).await.unwrap(), json!(42));
/// # }
/// ```
pub struct ComputeFn<F>(F);

impl<F, Fut> ComputeFn<F>
where
    F: Fn(StepInputs, Option<Data>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ComputeError>> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F, Fut> Compute for ComputeFn<F>
where
    F: Fn(StepInputs, Option<Data>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ComputeError>> + Send + 'static,
{
    async fn compute(&self, inputs: StepInputs, data: Option<Data>) -> Result<Value, ComputeError> {
        (self.0)(inputs, data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_as_reports_missing_and_invalid_inputs() {
        let mut inputs = StepInputs::new();
        inputs.insert("n", json!("not a number"));

        let missing = inputs.get_as::<i64>("m").unwrap_err();
        assert_eq!(missing.to_string(), "missing input 'm'");

        let invalid = inputs.get_as::<i64>("n").unwrap_err();
        assert!(invalid.to_string().starts_with("invalid input 'n'"));
    }

    #[tokio::test]
    async fn test_compute_fn_receives_literal_data() {
        let echo = ComputeFn::new(|_inputs: StepInputs, data: Option<Data>| async move {
            data.map(|d| json!(d.value()))
                .ok_or_else(|| ComputeError::InvalidData("missing".into()))
        });

        let output = echo
            .compute(StepInputs::new(), Some(Data::new("Json", "{}")))
            .await
            .unwrap();
        assert_eq!(output, json!("{}"));
    }
}
