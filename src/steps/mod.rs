// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in step catalog.
//!
//! # Prompt steps
//! - **Identity**: any JSON value, passed through as supplied
//! - **Integer**: a 64-bit integer
//! - **Text**: a string
//!
//! # Computed steps
//! - **AddOne**: `n: Integer -> Integer`
//! - **Sum**: `a, b: Integer -> Integer`
//! - **Scale**: `n: Integer`, data `{"factor": k}` `-> Integer`
//! - **ReverseText**: `text: Text -> Text`
//! - **ChangeTextCase**: `text: Text`, data `{"case": "upper" | "lower" | "proper" | "title"}` `-> Text`
//! - **TokenCounter**: `text: Text -> TokenCount`
//!
//! ```rust
//! use playbook_engine::steps::builtin_registry;
//!
//! let registry = builtin_registry()?;
//! assert!(registry.lookup("AddOne").is_some());
//! # Ok::<(), playbook_engine::errors::RegistryError>(())
//! ```

pub mod numeric;
pub mod text;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::errors::{ComputeError, RegistryError};
use crate::model::Data;
use crate::registry::{Registry, StepSpec, TypeSpec};

pub use numeric::{AddOne, Scale, Sum};
pub use text::{CaseType, ChangeTextCase, ReverseText, TokenCount, TokenCounter};

pub const INTEGER: &str = "Integer";
pub const TEXT: &str = "Text";
pub const JSON: &str = "Json";
pub const TOKEN_COUNT: &str = "TokenCount";

pub fn integer() -> TypeSpec {
    TypeSpec::json::<i64>(INTEGER)
}

pub fn text() -> TypeSpec {
    TypeSpec::json::<String>(TEXT)
}

pub fn json() -> TypeSpec {
    TypeSpec::json::<Value>(JSON)
}

pub fn token_count() -> TypeSpec {
    TypeSpec::json::<TokenCount>(TOKEN_COUNT)
}

/// Parse a computed step's literal data into its parameter type.
pub(crate) fn params<T: DeserializeOwned>(
    step: &str,
    data: Option<&Data>,
    example: &str,
) -> Result<T, ComputeError> {
    let data = data
        .ok_or_else(|| ComputeError::InvalidData(format!("{step} requires data like {example}")))?;
    serde_json::from_str(data.value())
        .map_err(|e| ComputeError::InvalidData(format!("{step} expects data like {example}: {e}")))
}

/// Every built-in step.
pub fn builtin_specs() -> Vec<StepSpec> {
    vec![
        StepSpec::prompt("Identity", json()).with_meta("Identity", "Any JSON value, as supplied"),
        StepSpec::prompt("Integer", integer()).with_meta("Integer", "A whole number"),
        StepSpec::prompt("Text", text()).with_meta("Text", "A piece of text"),
        StepSpec::computed("AddOne", integer(), Arc::new(AddOne))
            .with_input("n", integer())
            .with_meta("Add one", "Adds one to n"),
        StepSpec::computed("Sum", integer(), Arc::new(Sum))
            .with_input("a", integer())
            .with_input("b", integer())
            .with_meta("Sum", "Adds a and b"),
        StepSpec::computed("Scale", integer(), Arc::new(Scale))
            .with_input("n", integer())
            .with_meta("Scale", "Multiplies n by the factor in the step data"),
        StepSpec::computed("ReverseText", text(), Arc::new(ReverseText))
            .with_input("text", text())
            .with_meta("Reverse text", "Reverses the characters of text"),
        StepSpec::computed("ChangeTextCase", text(), Arc::new(ChangeTextCase))
            .with_input("text", text())
            .with_meta("Change text case", "Converts text to upper, lower, proper or title case"),
        StepSpec::computed("TokenCounter", token_count(), Arc::new(TokenCounter))
            .with_input("text", text())
            .with_meta("Token counter", "Counts characters, words and lines of text"),
    ]
}

pub fn builtin_registry() -> Result<Registry, RegistryError> {
    builtin_specs()
        .into_iter()
        .try_fold(Registry::builder(), |builder, step| builder.register(step))
        .map(|builder| builder.build())
}
