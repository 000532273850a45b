// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::errors::PlaybookError;

/// A chain of processing steps, as written by a user.
///
/// # Example
/// ```yaml
/// nodes:
///   - id: seed
///     step: Integer
///     data: 1
///   - id: next
///     step: AddOne
///     inputs:
///       n: seed
///   - id: scaled
///     step: Scale
///     data: { factor: 10 }
///     inputs:
///       n: next
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Playbook {
    pub nodes: Vec<PlaybookNode>,
}

/// One node of a [`Playbook`]; becomes exactly one process.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaybookNode {
    /// Label used to reference this node from other nodes' inputs.
    pub id: String,
    /// Registered step type.
    pub step: String,
    /// Literal data: the value of a prompt step, or a computed step's parameters.
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub inputs: IndexMap<String, NodeInput>,
}

/// How a node input is bound.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NodeInput {
    /// The output of another node, by id.
    Node(String),
    /// A literal value, encoded with the input's declared type.
    Literal { literal: Value },
}

impl NodeInput {
    /// The id of the node this input reads from, if any.
    pub fn node(&self) -> Option<&str> {
        match self {
            NodeInput::Node(id) => Some(id),
            NodeInput::Literal { .. } => None,
        }
    }
}

impl PlaybookNode {
    /// Ids of the nodes this node reads from, in input order.
    pub fn depends_on(&self) -> impl Iterator<Item = &str> {
        self.inputs.values().filter_map(NodeInput::node)
    }
}

pub fn parse_playbook(yaml: &str) -> Result<Playbook, PlaybookError> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Load a playbook from a YAML file
pub fn load_playbook<P: AsRef<Path>>(path: P) -> Result<Playbook, PlaybookError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| PlaybookError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_playbook(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_basic_playbook() {
        let yaml = r#"
nodes:
  - id: seed
    step: Integer
    data: 1
  - id: greeting
    step: Text
    data: hello
  - id: total
    step: Sum
    inputs:
      a: seed
      b: { literal: 41 }
"#;

        let playbook = parse_playbook(yaml).unwrap();
        assert_eq!(playbook.nodes.len(), 3);

        let seed = &playbook.nodes[0];
        assert_eq!(seed.step, "Integer");
        assert_eq!(seed.data, Some(json!(1)));
        assert!(seed.inputs.is_empty());

        assert_eq!(playbook.nodes[1].data, Some(json!("hello")));

        let total = &playbook.nodes[2];
        assert_eq!(total.data, None);
        assert_eq!(total.inputs["a"], NodeInput::Node("seed".into()));
        assert_eq!(total.inputs["b"], NodeInput::Literal { literal: json!(41) });
        assert_eq!(total.depends_on().collect::<Vec<_>>(), vec!["seed"]);
    }

    #[test]
    fn parse_rejects_nodes_without_step() {
        let yaml = r#"
nodes:
  - id: seed
    data: 1
"#;
        assert!(matches!(parse_playbook(yaml), Err(PlaybookError::Parse(_))));
    }

    #[test]
    fn load_playbook_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playbook.yaml");
        fs::write(&path, "nodes:\n  - id: only\n    step: Identity\n    data: { x: 1 }\n").unwrap();

        let playbook = load_playbook(&path).unwrap();
        assert_eq!(playbook.nodes[0].data, Some(json!({"x": 1})));

        let missing = load_playbook(dir.path().join("missing.yaml"));
        assert!(matches!(missing, Err(PlaybookError::Io { .. })));
    }
}
