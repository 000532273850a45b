// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::content_id;

/// Type identifier reserved for failed resolutions.
pub const ERROR_SPEC: &str = "Error";

/// An immutable, type-tagged value in the process graph.
///
/// `value` is the encoded payload (JSON text for every built-in codec). The
/// identity is derived from `spec` and `value`, so two structurally identical
/// values always share the same id and can share one stored entity.
///
/// # Example
/// ```
/// use playbook_engine::model::Data;
///
/// let a = Data::new("Integer", "1");
/// let b = Data::new("Integer", "1");
/// assert_eq!(a.id(), b.id());
/// assert_ne!(a.id(), Data::new("Text", "1").id());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Data {
    id: Uuid,
    spec: String,
    value: String,
}

impl Data {
    pub fn new(spec: impl Into<String>, value: impl Into<String>) -> Self {
        let spec = spec.into();
        let value = value.into();
        let id = content_id(&serde_json::json!({ "spec": spec, "value": value }));
        Self { id, spec, value }
    }

    /// Build an `Error`-tagged value. The payload is the message encoded as a JSON string.
    pub fn error(message: impl AsRef<str>) -> Self {
        let payload = serde_json::Value::String(message.as_ref().to_string()).to_string();
        Self::new(ERROR_SPEC, payload)
    }

    /// Rebuild a value read back from storage, trusting the stored identity.
    pub(crate) fn from_stored(id: Uuid, spec: String, value: String) -> Self {
        Self { id, spec, value }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn spec(&self) -> &str {
        &self.spec
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_error(&self) -> bool {
        self.spec == ERROR_SPEC
    }

    /// The diagnostic carried by an `Error` value, `None` for any other type.
    pub fn error_message(&self) -> Option<String> {
        if !self.is_error() {
            return None;
        }
        // Payloads written by other producers may not be JSON strings.
        Some(serde_json::from_str::<String>(&self.value).unwrap_or_else(|_| self.value.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_content_derived() {
        let first = Data::new("Json", r#"{"x":1}"#);
        let second = Data::new("Json", r#"{"x":1}"#);
        let other_value = Data::new("Json", r#"{"x":2}"#);
        let other_spec = Data::new("Object", r#"{"x":1}"#);

        assert_eq!(first.id(), second.id());
        assert_eq!(first, second);
        assert_ne!(first.id(), other_value.id());
        assert_ne!(first.id(), other_spec.id());
    }

    #[test]
    fn test_error_data_round_trips_message() {
        let data = Data::error("boom \"quoted\"");
        assert!(data.is_error());
        assert_eq!(data.spec(), ERROR_SPEC);
        assert_eq!(data.value(), r#""boom \"quoted\"""#);
        assert_eq!(data.error_message().as_deref(), Some("boom \"quoted\""));
    }

    #[test]
    fn test_error_message_tolerates_raw_payloads() {
        let data = Data::new(ERROR_SPEC, "not json");
        assert_eq!(data.error_message().as_deref(), Some("not json"));
        assert_eq!(Data::new("Text", "\"hi\"").error_message(), None);
    }
}
