// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::errors::CodecError;

/// Converts between a stored payload and the value a step works with.
pub trait Codec: Send + Sync {
    /// Parse a payload, rejecting anything that does not fit the type.
    fn decode(&self, payload: &str) -> Result<Value, serde_json::Error>;

    /// Render a value as a payload, rejecting anything that does not fit the type.
    fn encode(&self, value: &Value) -> Result<String, serde_json::Error>;
}

/// JSON codec checked against a concrete Rust type `T`.
///
/// Values pass through `T` in both directions, so a codec for `i64` refuses
/// `"abc"` on decode and `{"x":1}` on encode.
pub struct JsonCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Codec for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn decode(&self, payload: &str) -> Result<Value, serde_json::Error> {
        let typed: T = serde_json::from_str(payload)?;
        serde_json::to_value(typed)
    }

    fn encode(&self, value: &Value) -> Result<String, serde_json::Error> {
        let typed: T = serde_json::from_value(value.clone())?;
        serde_json::to_string(&typed)
    }
}

/// A type identifier bound to the codec for its payloads.
#[derive(Clone)]
pub struct TypeSpec {
    spec: String,
    codec: Arc<dyn Codec>,
}

impl TypeSpec {
    pub fn new(spec: impl Into<String>, codec: Arc<dyn Codec>) -> Self {
        Self {
            spec: spec.into(),
            codec,
        }
    }

    /// A type whose payloads are JSON renderings of `T`.
    pub fn json<T>(spec: impl Into<String>) -> Self
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        Self::new(spec, Arc::new(JsonCodec::<T>::new()))
    }

    pub fn spec(&self) -> &str {
        &self.spec
    }

    pub fn decode(&self, payload: &str) -> Result<Value, CodecError> {
        self.codec.decode(payload).map_err(|source| CodecError {
            spec: self.spec.clone(),
            source,
        })
    }

    pub fn encode(&self, value: &Value) -> Result<String, CodecError> {
        self.codec.encode(value).map_err(|source| CodecError {
            spec: self.spec.clone(),
            source,
        })
    }
}

impl fmt::Debug for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeSpec").field("spec", &self.spec).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Serialize, Deserialize)]
    struct Point {
        x: i64,
        y: i64,
    }

    #[test]
    fn test_json_codec_checks_shape() {
        struct TestCase {
            name: &'static str,
            spec: TypeSpec,
            payload: &'static str,
            decodes: bool,
        }

        let test_cases = vec![
            TestCase {
                name: "integer accepts number",
                spec: TypeSpec::json::<i64>("Integer"),
                payload: "1",
                decodes: true,
            },
            TestCase {
                name: "integer rejects string",
                spec: TypeSpec::json::<i64>("Integer"),
                payload: "\"1\"",
                decodes: false,
            },
            TestCase {
                name: "struct accepts matching object",
                spec: TypeSpec::json::<Point>("Point"),
                payload: r#"{"x":1,"y":2}"#,
                decodes: true,
            },
            TestCase {
                name: "struct rejects missing field",
                spec: TypeSpec::json::<Point>("Point"),
                payload: r#"{"x":1}"#,
                decodes: false,
            },
            TestCase {
                name: "json accepts anything",
                spec: TypeSpec::json::<Value>("Json"),
                payload: r#"[1,"two",{"three":3}]"#,
                decodes: true,
            },
        ];

        for case in test_cases {
            assert_eq!(case.spec.decode(case.payload).is_ok(), case.decodes, "{}", case.name);
        }
    }

    #[test]
    fn test_encode_error_names_the_type() {
        let spec = TypeSpec::json::<i64>("Integer");
        assert_eq!(spec.encode(&json!(2)).unwrap(), "2");

        let err = spec.encode(&json!({"x": 1})).unwrap_err();
        assert!(err.to_string().starts_with("Integer codec:"));
    }
}
