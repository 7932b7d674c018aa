//! Session and scorecard types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::allocator::{GenerationPlan, Slot};
use crate::analyzer::AnalysisResult;
use crate::feedback::Feedback;
use crate::model::{AnswerRecord, DiagnosticSettings, Question};
use crate::traits::TokenUsage;

/// How one slot of the plan was filled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotOutcome {
    pub slot: Slot,
    /// Questions that came from the content generator.
    pub generated: u32,
    /// Placeholder questions substituted for missing or failed output.
    pub fallback: u32,
    /// Why the generator output was not used in full, if it wasn't.
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub token_usage: TokenUsage,
}

impl SlotOutcome {
    pub fn used_fallback(&self) -> bool {
        self.fallback > 0
    }
}

/// A generated diagnostic, ready to be taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub settings: DiagnosticSettings,
    pub plan: GenerationPlan,
    /// Questions in plan order.
    pub questions: Vec<Question>,
    /// One entry per plan slot, plan order.
    pub outcomes: Vec<SlotOutcome>,
    /// Wall-clock generation time in milliseconds.
    pub duration_ms: u64,
}

impl DiagnosticSession {
    /// Number of questions that had to be substituted.
    pub fn fallback_count(&self) -> u32 {
        self.outcomes.iter().map(|o| o.fallback).sum()
    }

    pub fn total_tokens(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|o| u64::from(o.token_usage.total_tokens))
            .sum()
    }

    /// Save the session as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        write_json(self, path, "session")
    }

    /// Load a session from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        read_json(path, "session")
    }
}

/// The user's answers to a session, as captured by the quiz front end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSheet {
    #[serde(default)]
    pub session_id: Option<Uuid>,
    pub answers: Vec<AnswerRecord>,
}

impl AnswerSheet {
    /// Load answers from JSON: either an `AnswerSheet` object or a bare
    /// array of answer records.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read answers from {}", path.display()))?;
        if let Ok(answers) = serde_json::from_str::<Vec<AnswerRecord>>(&content) {
            return Ok(Self {
                session_id: None,
                answers,
            });
        }
        serde_json::from_str(&content).context("failed to parse answers JSON")
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        write_json(self, path, "answers")
    }
}

/// The analyzed outcome of a taken diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scorecard {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub question_count: usize,
    pub answered_count: usize,
    /// The user's self-assessment, when one was given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_rating: Option<String>,
    pub analysis: AnalysisResult,
    #[serde(default)]
    pub feedback: Option<Feedback>,
}

impl Scorecard {
    pub fn save_json(&self, path: &Path) -> Result<()> {
        write_json(self, path, "scorecard")
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        read_json(path, "scorecard")
    }
}

fn write_json<T: Serialize>(value: &T, path: &Path, what: &str) -> Result<()> {
    let json =
        serde_json::to_string_pretty(value).with_context(|| format!("failed to serialize {what}"))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("failed to write {what} to {}", path.display()))?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} from {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {what} JSON"))
}
