// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::ComputeError;
use crate::model::Data;
use crate::steps::params;
use crate::traits::{Compute, StepInputs};

fn overflow(step: &str) -> ComputeError {
    ComputeError::failed(format!("{step} overflowed"))
}

/// `n + 1`.
pub struct AddOne;

#[async_trait]
impl Compute for AddOne {
    async fn compute(&self, inputs: StepInputs, _data: Option<Data>) -> Result<Value, ComputeError> {
        let n: i64 = inputs.get_as("n")?;
        n.checked_add(1).map(|v| json!(v)).ok_or_else(|| overflow("AddOne"))
    }
}

/// `a + b`.
pub struct Sum;

#[async_trait]
impl Compute for Sum {
    async fn compute(&self, inputs: StepInputs, _data: Option<Data>) -> Result<Value, ComputeError> {
        let a: i64 = inputs.get_as("a")?;
        let b: i64 = inputs.get_as("b")?;
        a.checked_add(b).map(|v| json!(v)).ok_or_else(|| overflow("Sum"))
    }
}

#[derive(Debug, Deserialize)]
struct ScaleParams {
    factor: i64,
}

/// `n * factor`, with the factor taken from literal data `{"factor": k}`.
pub struct Scale;

#[async_trait]
impl Compute for Scale {
    async fn compute(&self, inputs: StepInputs, data: Option<Data>) -> Result<Value, ComputeError> {
        let params: ScaleParams = params("Scale", data.as_ref(), r#"{"factor": 2}"#)?;
        let n: i64 = inputs.get_as("n")?;
        n.checked_mul(params.factor)
            .map(|v| json!(v))
            .ok_or_else(|| overflow("Scale"))
    }
}
