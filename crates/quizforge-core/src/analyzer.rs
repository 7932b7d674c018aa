//! Result analysis: per-topic accuracy, strengths, weaknesses and the
//! overall score of an answered diagnostic.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::model::{AnswerRecord, Question, SelfReport};

/// Topics scoring at least this much are strengths.
pub const STRENGTH_THRESHOLD: u32 = 70;

/// Topics scoring at most this much are weaknesses.
pub const WEAKNESS_THRESHOLD: u32 = 40;

/// Scorecard numbers for one answered question set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Percentage correct per topic. Topics with no answered questions are absent.
    pub topic_scores: BTreeMap<String, u32>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    /// Percentage correct over the whole question set, unanswered included.
    pub overall_score: u32,
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    correct: usize,
    total: usize,
}

/// Score an answered question set.
///
/// Questions without an answer are left out of their topic's tally but still
/// count against the overall score. When a question has several answers the
/// first one wins.
pub fn analyze(
    questions: &[Question],
    answers: &[AnswerRecord],
) -> Result<AnalysisResult, AnalysisError> {
    if questions.is_empty() {
        return Err(AnalysisError::EmptyQuestionSet);
    }

    let mut by_id: HashMap<&str, &Question> = HashMap::with_capacity(questions.len());
    for question in questions {
        if by_id.insert(question.id.as_str(), question).is_some() {
            return Err(AnalysisError::DuplicateQuestionId(question.id.clone()));
        }
    }

    let mut first_answer: HashMap<&str, &AnswerRecord> = HashMap::with_capacity(answers.len());
    for answer in answers {
        if !by_id.contains_key(answer.question_id.as_str()) {
            return Err(AnalysisError::UnknownQuestion(answer.question_id.clone()));
        }
        first_answer.entry(answer.question_id.as_str()).or_insert(answer);
    }

    let mut tallies: BTreeMap<&str, Tally> = BTreeMap::new();
    let mut total_correct = 0usize;
    for question in questions {
        let Some(answer) = first_answer.get(question.id.as_str()) else {
            continue;
        };
        let tally = tallies.entry(question.topic_id.as_str()).or_default();
        tally.total += 1;
        if answer.is_correct {
            tally.correct += 1;
            total_correct += 1;
        }
    }

    let mut result = AnalysisResult {
        overall_score: percentage(total_correct, questions.len()),
        ..Default::default()
    };

    for (topic, tally) in tallies {
        let score = percentage(tally.correct, tally.total);
        if score >= STRENGTH_THRESHOLD {
            result.strengths.push(topic.to_string());
        } else if score <= WEAKNESS_THRESHOLD {
            result.weaknesses.push(topic.to_string());
        }
        result.topic_scores.insert(topic.to_string(), score);
    }

    Ok(result)
}

/// [`analyze`], then fold in topics the user reported before the diagnostic.
///
/// Measured scores take precedence: a self-reported strength the diagnostic
/// measured as a weakness stays a weakness, and the other way round. A topic
/// reported as both strong and weak with no measurement is kept as a weakness.
pub fn analyze_with_self_report(
    questions: &[Question],
    answers: &[AnswerRecord],
    self_report: &SelfReport,
) -> Result<AnalysisResult, AnalysisError> {
    let mut result = analyze(questions, answers)?;

    let measured_strengths = result.strengths.clone();
    let measured_weaknesses = result.weaknesses.clone();

    for topic in &self_report.weak_topics {
        if !measured_strengths.contains(topic) && !result.weaknesses.contains(topic) {
            result.weaknesses.push(topic.clone());
        }
    }
    for topic in &self_report.strong_topics {
        if !measured_weaknesses.contains(topic)
            && !result.weaknesses.contains(topic)
            && !result.strengths.contains(topic)
        {
            result.strengths.push(topic.clone());
        }
    }

    Ok(result)
}

/// `round(part / whole * 100)`, rounding half up. `whole` must be non-zero
/// and at least `part`, so the result is at most 100.
fn percentage(part: usize, whole: usize) -> u32 {
    debug_assert!(whole > 0 && part <= whole);
    let (part, whole) = (part as u128, whole as u128);
    ((200 * part + whole) / (2 * whole)) as u32
}
