// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Playbook validation.
//!
//! # Validation Pipeline
//!
//! 1. **Uniqueness**: every node id appears once
//! 2. **References**: every node input names an existing node
//! 3. **Steps**: every node names a registered step and binds only declared inputs
//! 4. **Cycle Detection**: DFS with a recursion stack, reporting the cycle path
//!
//! Stages 1 to 3 accumulate errors so a user sees all of them at once. Cycle
//! detection needs a structurally valid graph, so it only runs once the first
//! three stages are clean.
//!
//! ```rust
//! use playbook_engine::playbook::{parse_playbook, validate_playbook};
//! use playbook_engine::steps::builtin_registry;
//!
//! let registry = builtin_registry()?;
//! let playbook = parse_playbook("nodes:\n  - id: a\n    step: AddOne\n    inputs: { n: b }\n")?;
//!
//! let errors = validate_playbook(&playbook, &registry).unwrap_err();
//! assert_eq!(errors[0].to_string(), "Node 'a' depends on 'b' which does not exist");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::{HashMap, HashSet};

use crate::errors::ValidationError;
use crate::observability::messages::validation::{
    ValidationCompleted, ValidationErrorFound, ValidationFailed, ValidationStarted,
};
use crate::observability::messages::StructuredLog;
use crate::playbook::Playbook;
use crate::registry::Registry;

/// Validates a playbook against the registry it will run with.
///
/// Returns every error found; see the module docs for the order of checks.
pub fn validate_playbook(
    playbook: &Playbook,
    registry: &Registry,
) -> Result<(), Vec<ValidationError>> {
    let node_count = playbook.nodes.len();
    ValidationStarted { node_count }.log();

    let mut errors = Vec::new();
    errors.extend(unique_node_ids(playbook));
    errors.extend(dependency_references(playbook));
    errors.extend(step_bindings(playbook, registry));

    // Cycle detection needs a valid graph
    if errors.is_empty() {
        if let Some(cycle) = find_cycle(playbook) {
            errors.push(ValidationError::CyclicDependency { cycle });
        }
    }

    if errors.is_empty() {
        ValidationCompleted { node_count }.log();
        Ok(())
    } else {
        for error in &errors {
            ValidationErrorFound { error }.log();
        }
        ValidationFailed {
            error_count: errors.len(),
        }
        .log();
        Err(errors)
    }
}

fn unique_node_ids(playbook: &Playbook) -> Vec<ValidationError> {
    let mut seen_ids = HashSet::new();
    playbook
        .nodes
        .iter()
        .filter(|node| !seen_ids.insert(node.id.as_str()))
        .map(|node| ValidationError::DuplicateNodeId {
            node_id: node.id.clone(),
        })
        .collect()
}

fn dependency_references(playbook: &Playbook) -> Vec<ValidationError> {
    let node_ids: HashSet<&str> = playbook.nodes.iter().map(|n| n.id.as_str()).collect();
    let mut errors = Vec::new();

    for node in &playbook.nodes {
        for dependency in node.depends_on() {
            if !node_ids.contains(dependency) {
                errors.push(ValidationError::UnresolvedDependency {
                    node_id: node.id.clone(),
                    missing_dependency: dependency.to_string(),
                });
            }
        }
    }
    errors
}

fn step_bindings(playbook: &Playbook, registry: &Registry) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for node in &playbook.nodes {
        let Some(spec) = registry.lookup(&node.step) else {
            errors.push(ValidationError::UnknownStep {
                node_id: node.id.clone(),
                step: node.step.clone(),
            });
            continue;
        };
        for input in node.inputs.keys() {
            if !spec.inputs().contains_key(input) {
                errors.push(ValidationError::UndeclaredInput {
                    node_id: node.id.clone(),
                    step: node.step.clone(),
                    input: input.clone(),
                });
            }
        }
    }
    errors
}

/// DFS over dependency -> dependent edges. Nodes are gray while on the
/// recursion stack; reaching a gray node closes a cycle.
fn find_cycle(playbook: &Playbook) -> Option<Vec<String>> {
    let mut graph: HashMap<&str, Vec<&str>> = playbook
        .nodes
        .iter()
        .map(|node| (node.id.as_str(), Vec::new()))
        .collect();
    for node in &playbook.nodes {
        for dependency in node.depends_on() {
            if let Some(dependents) = graph.get_mut(dependency) {
                dependents.push(&node.id);
            }
        }
    }

    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut path = Vec::new();

    // Declared order keeps the reported cycle stable
    for node in &playbook.nodes {
        if !visited.contains(node.id.as_str()) {
            if let Some(cycle) =
                dfs_cycle_detection(&node.id, &graph, &mut visited, &mut rec_stack, &mut path)
            {
                return Some(cycle);
            }
        }
    }
    None
}

fn dfs_cycle_detection<'a>(
    node: &'a str,
    graph: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    rec_stack: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    for &neighbor in graph.get(node).into_iter().flatten() {
        if !visited.contains(neighbor) {
            if let Some(cycle) = dfs_cycle_detection(neighbor, graph, visited, rec_stack, path) {
                return Some(cycle);
            }
        } else if rec_stack.contains(neighbor) {
            let cycle_start = path.iter().position(|&x| x == neighbor).unwrap_or(0);
            let mut cycle: Vec<String> = path[cycle_start..].iter().map(|s| s.to_string()).collect();
            cycle.push(neighbor.to_string()); // Close the cycle
            return Some(cycle);
        }
    }

    rec_stack.remove(node);
    path.pop();
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playbook::parse_playbook;
    use crate::steps::builtin_registry;

    #[test]
    fn test_validate_playbook() {
        struct TestCase {
            name: &'static str,
            yaml: &'static str,
            expected: Vec<ValidationError>,
        }

        let test_cases = vec![
            TestCase {
                name: "valid chain",
                yaml: r#"
nodes:
  - { id: seed, step: Integer, data: 1 }
  - { id: next, step: AddOne, inputs: { n: seed } }
  - { id: total, step: Sum, inputs: { a: seed, b: next } }
"#,
                expected: vec![],
            },
            TestCase {
                name: "duplicate ids",
                yaml: r#"
nodes:
  - { id: seed, step: Integer, data: 1 }
  - { id: seed, step: Integer, data: 2 }
"#,
                expected: vec![ValidationError::DuplicateNodeId {
                    node_id: "seed".into(),
                }],
            },
            TestCase {
                name: "unknown reference, step and input accumulate",
                yaml: r#"
nodes:
  - { id: a, step: AddOne, inputs: { n: ghost, m: ghost2 } }
  - { id: b, step: Teleport }
"#,
                expected: vec![
                    ValidationError::UnresolvedDependency {
                        node_id: "a".into(),
                        missing_dependency: "ghost".into(),
                    },
                    ValidationError::UnresolvedDependency {
                        node_id: "a".into(),
                        missing_dependency: "ghost2".into(),
                    },
                    ValidationError::UndeclaredInput {
                        node_id: "a".into(),
                        step: "AddOne".into(),
                        input: "m".into(),
                    },
                    ValidationError::UnknownStep {
                        node_id: "b".into(),
                        step: "Teleport".into(),
                    },
                ],
            },
            TestCase {
                name: "self dependency",
                yaml: r#"
nodes:
  - { id: loop, step: AddOne, inputs: { n: loop } }
"#,
                expected: vec![ValidationError::CyclicDependency {
                    cycle: vec!["loop".into(), "loop".into()],
                }],
            },
            TestCase {
                name: "cycle reports its path",
                yaml: r#"
nodes:
  - { id: seed, step: Integer, data: 1 }
  - { id: b, step: Sum, inputs: { a: seed, b: d } }
  - { id: c, step: AddOne, inputs: { n: b } }
  - { id: d, step: AddOne, inputs: { n: c } }
"#,
                expected: vec![ValidationError::CyclicDependency {
                    cycle: vec!["b".into(), "c".into(), "d".into(), "b".into()],
                }],
            },
        ];

        let registry = builtin_registry().unwrap();
        for case in test_cases {
            let playbook = parse_playbook(case.yaml).unwrap();
            let result = validate_playbook(&playbook, &registry);
            match result {
                Ok(()) => assert!(case.expected.is_empty(), "{}: expected errors", case.name),
                Err(errors) => assert_eq!(errors, case.expected, "{}", case.name),
            }
        }
    }

    #[test]
    fn test_cycle_message() {
        let error = ValidationError::CyclicDependency {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(error.to_string(), "Cyclic dependency detected: a -> b -> a");
    }
}
