// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use indexmap::IndexMap;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::errors::{PlaybookError, ValidationError};
use crate::model::{Data, InputRef, Process};
use crate::observability::messages::validation::PlaybookSubmitted;
use crate::observability::messages::StructuredLog;
use crate::playbook::{validate_playbook, NodeInput, Playbook, PlaybookNode};
use crate::registry::{Registry, StepSpec, TypeSpec};
use crate::steps;
use crate::traits::{GraphStore, JobQueue};

/// Validate `playbook` and turn every node into a process.
///
/// The returned map is in dependency order: each process appears after every
/// process it reads from. Prompt data is encoded with the step's output type;
/// a computed step's data is kept as JSON parameters.
pub fn materialize(
    playbook: &Playbook,
    registry: &Registry,
) -> Result<IndexMap<String, Process>, PlaybookError> {
    validate_playbook(playbook, registry).map_err(PlaybookError::Invalid)?;

    let nodes: HashMap<&str, &PlaybookNode> =
        playbook.nodes.iter().map(|n| (n.id.as_str(), n)).collect();
    let mut built = IndexMap::new();
    for node in &playbook.nodes {
        build_node(node, &nodes, registry, &mut built)?;
    }
    Ok(built)
}

// Post-order over inputs; terminates because validation rejected cycles.
fn build_node(
    node: &PlaybookNode,
    nodes: &HashMap<&str, &PlaybookNode>,
    registry: &Registry,
    built: &mut IndexMap<String, Process>,
) -> Result<(), PlaybookError> {
    if built.contains_key(&node.id) {
        return Ok(());
    }
    for dependency in node.depends_on() {
        if let Some(upstream) = nodes.get(dependency) {
            build_node(upstream, nodes, registry, built)?;
        }
    }

    let spec = registry.lookup(&node.step).ok_or_else(|| {
        PlaybookError::Invalid(vec![ValidationError::UnknownStep {
            node_id: node.id.clone(),
            step: node.step.clone(),
        }])
    })?;

    let data = match &node.data {
        Some(value) if spec.kind().is_prompt() => Some(literal(node, spec.output(), value)?),
        Some(value) => Some(literal(node, &steps::json(), value)?),
        None => None,
    };

    let mut inputs = BTreeMap::new();
    for (name, input) in &node.inputs {
        let input_ref = match input {
            NodeInput::Node(id) => {
                let upstream = built.get(id).ok_or_else(|| unresolved(node, id))?;
                InputRef::Process(upstream.id())
            }
            NodeInput::Literal { literal: value } => {
                let declared = declared_input(node, spec, name)?;
                InputRef::Data(literal(node, declared, value)?)
            }
        };
        inputs.insert(name.clone(), input_ref);
    }

    let process = Process::new(node.step.clone(), data, inputs);
    built.insert(node.id.clone(), process);
    Ok(())
}

fn literal(node: &PlaybookNode, ty: &TypeSpec, value: &Value) -> Result<Data, PlaybookError> {
    let encoded = ty.encode(value).map_err(|source| PlaybookError::InvalidLiteral {
        node_id: node.id.clone(),
        source,
    })?;
    Ok(Data::new(ty.spec(), encoded))
}

fn declared_input<'a>(
    node: &PlaybookNode,
    spec: &'a StepSpec,
    name: &str,
) -> Result<&'a TypeSpec, PlaybookError> {
    spec.inputs().get(name).ok_or_else(|| {
        PlaybookError::Invalid(vec![ValidationError::UndeclaredInput {
            node_id: node.id.clone(),
            step: node.step.clone(),
            input: name.to_string(),
        }])
    })
}

fn unresolved(node: &PlaybookNode, dependency: &str) -> PlaybookError {
    PlaybookError::Invalid(vec![ValidationError::UnresolvedDependency {
        node_id: node.id.clone(),
        missing_dependency: dependency.to_string(),
    }])
}

/// Materialize `playbook`, insert its processes and enqueue every one of them.
///
/// Processes already in the store are enqueued again; re-evaluating a
/// process is idempotent. Returns `node id -> process id` in dependency order.
pub async fn submit(
    playbook: &Playbook,
    registry: &Registry,
    store: &dyn GraphStore,
    queue: &dyn JobQueue,
    queue_name: &str,
) -> Result<IndexMap<String, Uuid>, PlaybookError> {
    let processes = materialize(playbook, registry)?;
    queue.start().await?;

    let mut new_processes = 0;
    for process in processes.values() {
        if store.insert_process(process).await? {
            new_processes += 1;
        }
    }
    for process in processes.values() {
        queue.send(queue_name, process.id()).await?;
    }

    PlaybookSubmitted {
        process_count: processes.len(),
        new_processes,
        queue: queue_name,
    }
    .log();

    Ok(processes
        .into_iter()
        .map(|(label, process)| (label, process.id()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::{MemoryGraphStore, MemoryJobQueue};
    use crate::playbook::parse_playbook;
    use crate::steps::builtin_registry;
    use crate::traits::JobState;

    const CHAIN: &str = r#"
nodes:
  - id: total
    step: Sum
    inputs:
      a: next
      b: { literal: 40 }
  - id: next
    step: AddOne
    inputs:
      n: seed
  - id: seed
    step: Integer
    data: 1
  - id: scaled
    step: Scale
    data: { factor: 3 }
    inputs:
      n: total
"#;

    #[test]
    fn test_materialize_orders_by_dependency() {
        let registry = builtin_registry().unwrap();
        let playbook = parse_playbook(CHAIN).unwrap();
        let processes = materialize(&playbook, &registry).unwrap();

        let order: Vec<&str> = processes.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["seed", "next", "total", "scaled"]);

        let seed = &processes["seed"];
        assert_eq!(seed.data(), Some(&Data::new("Integer", "1")));

        let total = &processes["total"];
        assert_eq!(
            total.inputs()["a"],
            InputRef::Process(processes["next"].id())
        );
        assert_eq!(total.inputs()["b"], InputRef::Data(Data::new("Integer", "40")));

        let scaled = &processes["scaled"];
        assert_eq!(scaled.data(), Some(&Data::new("Json", r#"{"factor":3}"#)));
    }

    #[test]
    fn test_materialize_is_content_addressed() {
        let registry = builtin_registry().unwrap();
        let playbook = parse_playbook(CHAIN).unwrap();
        let first = materialize(&playbook, &registry).unwrap();
        let second = materialize(&playbook, &registry).unwrap();
        assert_eq!(first["scaled"].id(), second["scaled"].id());
    }

    #[test]
    fn test_materialize_rejects_bad_playbooks() {
        let registry = builtin_registry().unwrap();

        let invalid = parse_playbook("nodes:\n  - { id: a, step: AddOne, inputs: { n: b } }\n").unwrap();
        assert!(matches!(
            materialize(&invalid, &registry),
            Err(PlaybookError::Invalid(errors)) if errors.len() == 1
        ));

        let bad_literal = parse_playbook("nodes:\n  - { id: a, step: Integer, data: one }\n").unwrap();
        let err = materialize(&bad_literal, &registry).unwrap_err();
        assert!(matches!(&err, PlaybookError::InvalidLiteral { node_id, .. } if node_id == "a"));
    }

    #[tokio::test]
    async fn test_submit_inserts_and_enqueues() {
        let registry = builtin_registry().unwrap();
        let store = MemoryGraphStore::new();
        let queue = MemoryJobQueue::default();
        let playbook = parse_playbook(CHAIN).unwrap();

        let ids = submit(&playbook, &registry, &store, &queue, "work-queue").await.unwrap();
        assert_eq!(ids.len(), 4);
        for id in ids.values() {
            assert!(store.get_process(*id).await.unwrap().is_some());
        }
        assert_eq!(queue.count("work-queue", JobState::Created).await, 4);

        // Resubmitting enqueues again without duplicating processes.
        let again = submit(&playbook, &registry, &store, &queue, "work-queue").await.unwrap();
        assert_eq!(again, ids);
        assert_eq!(queue.count("work-queue", JobState::Created).await, 8);
    }
}
