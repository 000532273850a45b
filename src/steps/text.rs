// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ComputeError;
use crate::model::Data;
use crate::steps::params;
use crate::traits::{Compute, StepInputs};

/// Reverses the characters of `text`.
pub struct ReverseText;

#[async_trait]
impl Compute for ReverseText {
    async fn compute(&self, inputs: StepInputs, _data: Option<Data>) -> Result<Value, ComputeError> {
        let text: String = inputs.get_as("text")?;
        Ok(Value::String(text.chars().rev().collect()))
    }
}

/// Target case for [`ChangeTextCase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseType {
    Upper,
    Lower,
    /// First letter of every word capitalized.
    Proper,
    /// Like proper, but short articles, conjunctions and prepositions stay lowercase.
    Title,
}

#[derive(Debug, Deserialize)]
struct CaseParams {
    case: CaseType,
}

/// Converts `text` to the case named in the literal data, e.g. `{"case": "upper"}`.
pub struct ChangeTextCase;

impl ChangeTextCase {
    pub fn apply(case: CaseType, input: &str) -> String {
        match case {
            CaseType::Upper => input.to_uppercase(),
            CaseType::Lower => input.to_lowercase(),
            CaseType::Proper => input
                .split_whitespace()
                .map(capitalize)
                .collect::<Vec<_>>()
                .join(" "),
            CaseType::Title => input
                .split_whitespace()
                .enumerate()
                .map(|(i, word)| {
                    let lower_word = word.to_lowercase();
                    if i == 0 || !is_small_word(&lower_word) {
                        capitalize(word)
                    } else {
                        lower_word
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
    }
}

fn is_small_word(word: &str) -> bool {
    matches!(
        word,
        "a" | "an" | "the" | "and" | "or" | "but" | "in" | "on" | "at" | "to" | "for" | "of" | "with" | "by"
    )
}

#[async_trait]
impl Compute for ChangeTextCase {
    async fn compute(&self, inputs: StepInputs, data: Option<Data>) -> Result<Value, ComputeError> {
        let params: CaseParams = params("ChangeTextCase", data.as_ref(), r#"{"case": "upper"}"#)?;
        let text: String = inputs.get_as("text")?;
        Ok(Value::String(Self::apply(params.case, &text)))
    }
}

/// Output of [`TokenCounter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCount {
    pub char_count: usize,
    pub word_count: usize,
    pub line_count: usize,
}

/// Counts characters, words and lines of `text`.
pub struct TokenCounter;

impl TokenCounter {
    pub fn count(input: &str) -> TokenCount {
        TokenCount {
            char_count: input.chars().count(),
            word_count: input.split_whitespace().count(),
            // At least 1 line even if empty
            line_count: input.lines().count().max(1),
        }
    }
}

#[async_trait]
impl Compute for TokenCounter {
    async fn compute(&self, inputs: StepInputs, _data: Option<Data>) -> Result<Value, ComputeError> {
        let text: String = inputs.get_as("text")?;
        serde_json::to_value(Self::count(&text))
            .map_err(|e| ComputeError::failed(format!("Failed to serialize result: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text_input(text: &str) -> StepInputs {
        let mut inputs = StepInputs::new();
        inputs.insert("text", json!(text));
        inputs
    }

    #[test]
    fn test_change_text_case() {
        struct TestCase {
            name: &'static str,
            case: CaseType,
            input: &'static str,
            expected: &'static str,
        }

        let test_cases = vec![
            TestCase {
                name: "upper",
                case: CaseType::Upper,
                input: "hello world",
                expected: "HELLO WORLD",
            },
            TestCase {
                name: "lower",
                case: CaseType::Lower,
                input: "HeLLo",
                expected: "hello",
            },
            TestCase {
                name: "proper",
                case: CaseType::Proper,
                input: "the cat IN the hat",
                expected: "The Cat In The Hat",
            },
            TestCase {
                name: "title keeps small words lowercase",
                case: CaseType::Title,
                input: "the cat IN the hat",
                expected: "The Cat in the Hat",
            },
        ];

        for case in test_cases {
            assert_eq!(ChangeTextCase::apply(case.case, case.input), case.expected, "{}", case.name);
        }
    }

    #[tokio::test]
    async fn test_change_text_case_reads_literal_data() {
        let data = Data::new("Json", r#"{"case":"upper"}"#);
        let output = ChangeTextCase
            .compute(text_input("shout"), Some(data))
            .await
            .unwrap();
        assert_eq!(output, json!("SHOUT"));

        let err = ChangeTextCase
            .compute(text_input("shout"), Some(Data::new("Json", r#"{"case":"loud"}"#)))
            .await
            .unwrap_err();
        assert!(matches!(err, ComputeError::InvalidData(_)));

        let err = ChangeTextCase
            .compute(text_input("shout"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ComputeError::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_reverse_and_count() {
        assert_eq!(
            ReverseText.compute(text_input("abc"), None).await.unwrap(),
            json!("cba")
        );

        let counted = TokenCounter
            .compute(text_input("one two\nthree"), None)
            .await
            .unwrap();
        assert_eq!(
            counted,
            json!({"char_count": 13, "word_count": 3, "line_count": 2})
        );
        assert_eq!(TokenCounter::count("").line_count, 1);
    }
}
