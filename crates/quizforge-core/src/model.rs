//! Core data model types for quizforge.
//!
//! These are the fundamental types shared by the allocator, the analyzer, and
//! the generation engine: settings, difficulty tiers, questions and answers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SettingsError;

/// Topic catalog used when the configuration names none.
pub const DEFAULT_TOPICS: [&str; 10] = [
    "digital_electronics",
    "analog_circuits",
    "communication_systems",
    "computer_networks",
    "operating_systems",
    "data_structures",
    "algorithms",
    "cyber_security",
    "cryptography",
    "information_theory",
];

/// Number of answer options every question carries.
pub const OPTION_COUNT: usize = 4;

/// Difficulty tier of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// All tiers, easiest first.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Position of this tier in [`Difficulty::ALL`].
    pub fn index(self) -> usize {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// Percentage of the requested questions to put in each tier.
///
/// Tiers missing from the input count as 0. The three values are not
/// required to sum to 100; the allocator reconciles rounding and skew.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DifficultyDistribution {
    #[serde(default)]
    pub easy: u32,
    #[serde(default)]
    pub medium: u32,
    #[serde(default)]
    pub hard: u32,
}

impl DifficultyDistribution {
    pub fn new(easy: u32, medium: u32, hard: u32) -> Self {
        Self { easy, medium, hard }
    }

    /// Percentage for a single tier.
    pub fn percentage(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }
}

impl Default for DifficultyDistribution {
    fn default() -> Self {
        Self {
            easy: 30,
            medium: 50,
            hard: 20,
        }
    }
}

/// How topics are picked from the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTopicSelection", into = "RawTopicSelection")]
pub enum TopicSelection {
    /// Every topic in the catalog, catalog order.
    All,
    /// A bounded random subset of the catalog.
    #[default]
    Random,
    /// An explicit ordered list, used as given.
    Explicit(Vec<String>),
}

impl FromStr for TopicSelection {
    type Err = String;

    /// Parses `all`, `random`, or a comma-separated topic list.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" => Ok(TopicSelection::All),
            "random" => Ok(TopicSelection::Random),
            list => Ok(TopicSelection::Explicit(
                list.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect(),
            )),
        }
    }
}

/// Wire shape of [`TopicSelection`]: a mode string or a list of topic ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawTopicSelection {
    Mode(String),
    Topics(Vec<String>),
}

impl TryFrom<RawTopicSelection> for TopicSelection {
    type Error = String;

    fn try_from(raw: RawTopicSelection) -> Result<Self, Self::Error> {
        match raw {
            RawTopicSelection::Mode(mode) => match mode.as_str() {
                "all" => Ok(TopicSelection::All),
                "random" => Ok(TopicSelection::Random),
                other => Err(format!(
                    "unknown topic selection '{other}', expected \"all\", \"random\" or a list"
                )),
            },
            RawTopicSelection::Topics(topics) => Ok(TopicSelection::Explicit(topics)),
        }
    }
}

impl From<TopicSelection> for RawTopicSelection {
    fn from(selection: TopicSelection) -> Self {
        match selection {
            TopicSelection::All => RawTopicSelection::Mode("all".into()),
            TopicSelection::Random => RawTopicSelection::Mode("random".into()),
            TopicSelection::Explicit(topics) => RawTopicSelection::Topics(topics),
        }
    }
}

/// Input configuration for one diagnostic session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticSettings {
    /// Total questions desired.
    #[serde(default = "default_question_count")]
    pub question_count: u32,
    /// How topics are picked.
    #[serde(default)]
    pub topic_selection: TopicSelection,
    /// Percentage per difficulty tier.
    #[serde(default)]
    pub difficulty_distribution: DifficultyDistribution,
    /// Optional time limit in seconds.
    #[serde(default = "default_time_limit")]
    pub time_limit: Option<u32>,
}

fn default_question_count() -> u32 {
    10
}

fn default_time_limit() -> Option<u32> {
    Some(600)
}

impl Default for DiagnosticSettings {
    fn default() -> Self {
        Self {
            question_count: default_question_count(),
            topic_selection: TopicSelection::default(),
            difficulty_distribution: DifficultyDistribution::default(),
            time_limit: default_time_limit(),
        }
    }
}

impl DiagnosticSettings {
    /// Reject settings that cannot be allocated.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.question_count == 0 {
            return Err(SettingsError::ZeroQuestionCount);
        }
        for difficulty in Difficulty::ALL {
            let percentage = self.difficulty_distribution.percentage(difficulty);
            if percentage > 100 {
                return Err(SettingsError::PercentageOutOfRange {
                    difficulty,
                    percentage,
                });
            }
        }
        if self.time_limit == Some(0) {
            return Err(SettingsError::ZeroTimeLimit);
        }
        Ok(())
    }
}

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique within a session.
    pub id: String,
    pub topic_id: String,
    pub text: String,
    /// Always exactly [`OPTION_COUNT`] entries.
    pub options: Vec<String>,
    pub correct_option_index: usize,
    pub explanation: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Question {
    /// Whether the option count and the correct index are in range.
    pub fn is_well_formed(&self) -> bool {
        self.options.len() == OPTION_COUNT && self.correct_option_index < OPTION_COUNT
    }
}

/// The user's answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_id: String,
    pub selected_option_index: usize,
    /// Computed when the answer was given; never re-derived.
    pub is_correct: bool,
}

impl AnswerRecord {
    /// Record an answer, grading it against the question.
    pub fn grade(question: &Question, selected_option_index: usize) -> Self {
        Self {
            question_id: question.id.clone(),
            selected_option_index,
            is_correct: selected_option_index == question.correct_option_index,
        }
    }
}

/// What the user reported about themselves before the diagnostic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfReport {
    #[serde(default)]
    pub strong_topics: Vec<String>,
    #[serde(default)]
    pub weak_topics: Vec<String>,
    /// Free-form assessment of their own learning ability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_rating: Option<String>,
}
