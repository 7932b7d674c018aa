//! Narrative feedback for an analyzed diagnostic.
//!
//! The provider is asked for a short JSON assessment of the scores. Any
//! failure falls back to a templated assessment built from the numbers alone.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analyzer::AnalysisResult;
use crate::traits::{extract_json_from_markdown, GenerateRequest, LlmProvider};

const DEFAULT_CONFIDENCE: u8 = 5;
const DEFAULT_PREPARATION_TIME: &str = "8-12 weeks";

/// Personalised assessment attached to a scorecard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub overall_assessment: String,
    pub strengths_analysis: String,
    pub weaknesses_analysis: String,
    pub learning_style_recommendations: String,
    pub study_plan_suggestion: String,
    pub estimated_preparation_time: String,
    /// 1 to 10.
    pub confidence_score: u8,
    /// `false` when this is the templated fallback.
    #[serde(default)]
    pub generated: bool,
}

/// Loose shape of the feedback an LLM returns.
#[derive(Debug, Deserialize)]
struct RawFeedback {
    overall_assessment: String,
    #[serde(default)]
    strengths_analysis: String,
    #[serde(default)]
    weaknesses_analysis: String,
    #[serde(default)]
    learning_style_recommendations: String,
    #[serde(default)]
    study_plan_suggestion: String,
    #[serde(default)]
    estimated_preparation_time: String,
    #[serde(default)]
    confidence_score: Value,
}

/// Templated feedback built from the scores alone.
pub fn default_feedback(result: &AnalysisResult, learning_style: &str) -> Feedback {
    Feedback {
        overall_assessment: format!(
            "You scored {}% overall in the diagnostic assessment.",
            result.overall_score
        ),
        strengths_analysis: format!(
            "Your strengths include: {}.",
            join_or_none(&result.strengths)
        ),
        weaknesses_analysis: format!("Areas to focus on: {}.", join_or_none(&result.weaknesses)),
        learning_style_recommendations: format!(
            "Based on your {learning_style} learning style, focus on appropriate learning materials."
        ),
        study_plan_suggestion:
            "Start with the fundamentals of each topic before moving to advanced concepts.".into(),
        estimated_preparation_time: DEFAULT_PREPARATION_TIME.into(),
        confidence_score: DEFAULT_CONFIDENCE,
        generated: false,
    }
}

fn join_or_none(topics: &[String]) -> String {
    if topics.is_empty() {
        "None identified yet".into()
    } else {
        topics.join(", ")
    }
}

/// Parse the provider's reply into [`Feedback`].
pub fn parse_feedback(response: &str) -> Option<Feedback> {
    let payload = extract_json_from_markdown(response);
    let raw: RawFeedback = serde_json::from_str(&payload).ok()?;

    let confidence = match &raw.confidence_score {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .map(|c| c.round().clamp(1.0, 10.0) as u8)
    .unwrap_or(DEFAULT_CONFIDENCE);

    Some(Feedback {
        overall_assessment: raw.overall_assessment,
        strengths_analysis: raw.strengths_analysis,
        weaknesses_analysis: raw.weaknesses_analysis,
        learning_style_recommendations: raw.learning_style_recommendations,
        study_plan_suggestion: raw.study_plan_suggestion,
        estimated_preparation_time: if raw.estimated_preparation_time.is_empty() {
            DEFAULT_PREPARATION_TIME.into()
        } else {
            raw.estimated_preparation_time
        },
        confidence_score: confidence,
        generated: true,
    })
}

/// Writes feedback through an optional provider.
pub struct FeedbackWriter {
    provider: Option<Arc<dyn LlmProvider>>,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl FeedbackWriter {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>, temperature: f64) -> Self {
        Self {
            provider: Some(provider),
            model: model.into(),
            temperature,
            max_tokens: 1500,
        }
    }

    /// A writer that always produces the templated feedback.
    pub fn offline() -> Self {
        Self {
            provider: None,
            model: String::new(),
            temperature: 0.0,
            max_tokens: 0,
        }
    }

    /// Ask for feedback on `result`; never fails.
    ///
    /// `self_rating` is the user's own assessment of their ability, passed to
    /// the provider as context.
    pub async fn write(
        &self,
        result: &AnalysisResult,
        learning_style: &str,
        self_rating: Option<&str>,
    ) -> Feedback {
        let Some(provider) = &self.provider else {
            return default_feedback(result, learning_style);
        };

        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: feedback_prompt(result, learning_style, self_rating),
            system_prompt: None,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        match provider.generate(&request).await {
            Ok(response) => parse_feedback(&response.content).unwrap_or_else(|| {
                tracing::warn!("feedback reply was not usable JSON, using default feedback");
                default_feedback(result, learning_style)
            }),
            Err(e) => {
                tracing::warn!("feedback generation failed: {e:#}");
                default_feedback(result, learning_style)
            }
        }
    }
}

fn feedback_prompt(
    result: &AnalysisResult,
    learning_style: &str,
    self_rating: Option<&str>,
) -> String {
    let topic_scores = serde_json::to_string(&result.topic_scores).unwrap_or_default();
    format!(
        "Assess these diagnostic results for an exam candidate.\n\
         Overall score: {}%\n\
         Topic scores: {topic_scores}\n\
         Strengths: {}\n\
         Weaknesses: {}\n\
         Learning style: {learning_style}\n\
         Self-rating: {}\n\n\
         Respond with a JSON object with the string fields overall_assessment, \
         strengths_analysis, weaknesses_analysis, learning_style_recommendations, \
         study_plan_suggestion, estimated_preparation_time (in weeks) and an integer \
         confidence_score from 1 to 10.",
        result.overall_score,
        join_or_none(&result.strengths),
        join_or_none(&result.weaknesses),
        self_rating.unwrap_or("Not provided"),
    )
}
