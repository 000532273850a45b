// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::EngineConfig;
use crate::errors::ConfigError;

/// Reject configurations the engine cannot run with.
///
/// The database URL is not checked here; commands that need a connection
/// ask for it through [`EngineConfig::database_url`].
pub fn validate_config(config: &EngineConfig) -> Result<(), ConfigError> {
    if config.workers == 0 {
        return Err(invalid("workers", "must be at least 1"));
    }
    if config.queue.name.trim().is_empty() {
        return Err(invalid("queue.name", "must not be empty"));
    }
    if config.claim_lease_seconds == 0 {
        return Err(invalid("claim_lease_seconds", "must be at least 1"));
    }
    if config.queue.lease_seconds == 0 {
        return Err(invalid("queue.lease_seconds", "must be at least 1"));
    }
    if !config.dispatch.listen && !config.dispatch.queue {
        return Err(invalid(
            "dispatch",
            "at least one of `listen` and `queue` must be enabled",
        ));
    }
    Ok(())
}

fn invalid(key: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_config() {
        struct TestCase {
            name: &'static str,
            yaml: &'static str,
            expected_key: Option<&'static str>,
        }

        let test_cases = vec![
            TestCase {
                name: "defaults are valid",
                yaml: "{}",
                expected_key: None,
            },
            TestCase {
                name: "zero workers",
                yaml: "workers: 0",
                expected_key: Some("workers"),
            },
            TestCase {
                name: "blank queue name",
                yaml: "queue: { name: '  ' }",
                expected_key: Some("queue.name"),
            },
            TestCase {
                name: "zero claim lease",
                yaml: "claim_lease_seconds: 0",
                expected_key: Some("claim_lease_seconds"),
            },
            TestCase {
                name: "zero job lease",
                yaml: "queue: { lease_seconds: 0 }",
                expected_key: Some("queue.lease_seconds"),
            },
            TestCase {
                name: "both trigger paths disabled",
                yaml: "dispatch: { listen: false, queue: false }",
                expected_key: Some("dispatch"),
            },
            TestCase {
                name: "queue path only",
                yaml: "dispatch: { listen: false, retrigger_notify: false }",
                expected_key: None,
            },
        ];

        for case in test_cases {
            let config = EngineConfig::from_yaml_str(case.yaml).unwrap();
            match (validate_config(&config), case.expected_key) {
                (Ok(()), None) => {}
                (Err(ConfigError::InvalidValue { key, .. }), Some(expected)) => {
                    assert_eq!(key, expected, "{}", case.name)
                }
                (result, expected) => panic!("{}: got {result:?}, expected {expected:?}", case.name),
            }
        }
    }
}
