//! Parsing and validation of content-generator output.
//!
//! Generator replies are untrusted: the JSON is pulled out of markdown,
//! every entry is checked for shape, and anything malformed is dropped.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use crate::allocator::Slot;
use crate::error::ParseError;
use crate::fallback::synthesize_id;
use crate::model::{Question, OPTION_COUNT};
use crate::traits::extract_json_from_markdown;

/// Loose shape of a question as an LLM returns it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    #[serde(default)]
    id: Option<String>,
    text: String,
    options: Vec<String>,
    correct_option_index: i64,
    explanation: String,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// Questions recovered from one generator reply.
#[derive(Debug, Clone)]
pub struct ParsedBatch {
    /// Well-formed questions, reply order.
    pub questions: Vec<Question>,
    /// Entries dropped for a missing field or bad shape.
    pub rejected: usize,
}

/// Parse a generator reply for `slot`.
///
/// Accepts a JSON array of questions, or an object with a `questions` array,
/// optionally wrapped in a markdown code block. The slot is authoritative for
/// topic and tier; missing ids and tags are filled in. Fails when the reply is
/// not JSON or holds no usable question.
pub fn parse_generated_questions(response: &str, slot: &Slot) -> Result<ParsedBatch, ParseError> {
    let payload = extract_json_from_markdown(response);
    let value: Value = serde_json::from_str(&payload)?;

    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("questions") {
            Some(Value::Array(entries)) => entries,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    let mut questions = Vec::with_capacity(entries.len());
    let mut rejected = 0usize;

    for entry in entries {
        let raw: RawQuestion = match serde_json::from_value(entry) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!("dropping malformed question for {}: {e}", slot.topic_id);
                rejected += 1;
                continue;
            }
        };

        let index_in_range = (0..OPTION_COUNT as i64).contains(&raw.correct_option_index);
        if raw.options.len() != OPTION_COUNT || !index_in_range || raw.text.trim().is_empty() {
            rejected += 1;
            continue;
        }

        questions.push(Question {
            id: raw
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| synthesize_id(&slot.topic_id, slot.difficulty)),
            topic_id: slot.topic_id.clone(),
            text: raw.text,
            options: raw.options,
            correct_option_index: raw.correct_option_index as usize,
            explanation: raw.explanation,
            difficulty: slot.difficulty,
            tags: raw.tags.unwrap_or_else(|| vec![slot.topic_id.clone()]),
        });
    }

    if questions.is_empty() {
        return Err(ParseError::NoQuestions { rejected });
    }

    Ok(ParsedBatch {
        questions,
        rejected,
    })
}

/// A warning from question set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a question set for common issues.
pub fn validate_questions(questions: &[Question]) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "question set is empty".into(),
        });
    }

    let mut seen_ids = HashSet::new();
    for question in questions {
        if !seen_ids.insert(&question.id) {
            warnings.push(ValidationWarning {
                question_id: Some(question.id.clone()),
                message: format!("duplicate question ID: {}", question.id),
            });
        }
    }

    for question in questions {
        if question.options.len() != OPTION_COUNT {
            warnings.push(ValidationWarning {
                question_id: Some(question.id.clone()),
                message: format!(
                    "expected {OPTION_COUNT} options, found {}",
                    question.options.len()
                ),
            });
        }
        if question.correct_option_index >= OPTION_COUNT {
            warnings.push(ValidationWarning {
                question_id: Some(question.id.clone()),
                message: format!(
                    "correct option index {} is out of range",
                    question.correct_option_index
                ),
            });
        }
        if question.text.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(question.id.clone()),
                message: "question text is empty".into(),
            });
        }
    }

    warnings
}
