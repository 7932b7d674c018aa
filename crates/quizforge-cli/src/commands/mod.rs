//! Subcommand implementations.

pub mod analyze;
pub mod generate;
pub mod init;
pub mod list_models;
pub mod plan;
pub mod validate;

use anyhow::Result;
use clap::Args;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use quizforge_core::allocator::{allocate, GenerationPlan};
use quizforge_core::model::{DiagnosticSettings, TopicSelection};
use quizforge_providers::QuizforgeConfig;

/// Diagnostic settings overrides shared by `plan` and `generate`.
#[derive(Args, Debug, Clone, Default)]
pub struct PlanArgs {
    /// Total questions to allocate
    #[arg(long)]
    pub count: Option<u32>,

    /// Topic selection: "all", "random", or a comma-separated list
    #[arg(long)]
    pub topics: Option<TopicSelection>,

    /// Topic catalog override (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub catalog: Option<Vec<String>>,

    /// Percentage of easy questions
    #[arg(long)]
    pub easy: Option<u32>,

    /// Percentage of medium questions
    #[arg(long)]
    pub medium: Option<u32>,

    /// Percentage of hard questions
    #[arg(long)]
    pub hard: Option<u32>,

    /// Time limit in seconds
    #[arg(long)]
    pub time_limit: Option<u32>,

    /// Seed for topic selection, for reproducible plans
    #[arg(long)]
    pub seed: Option<u64>,
}

impl PlanArgs {
    /// Apply the overrides on top of the configured settings.
    pub fn settings(&self, base: &DiagnosticSettings) -> DiagnosticSettings {
        let mut settings = base.clone();
        if let Some(count) = self.count {
            settings.question_count = count;
        }
        if let Some(topics) = &self.topics {
            settings.topic_selection = topics.clone();
        }
        let distribution = &mut settings.difficulty_distribution;
        if let Some(easy) = self.easy {
            distribution.easy = easy;
        }
        if let Some(medium) = self.medium {
            distribution.medium = medium;
        }
        if let Some(hard) = self.hard {
            distribution.hard = hard;
        }
        if let Some(limit) = self.time_limit {
            settings.time_limit = Some(limit);
        }
        settings
    }

    pub fn catalog(&self, config: &QuizforgeConfig) -> Vec<String> {
        self.catalog
            .clone()
            .unwrap_or_else(|| config.topics.clone())
    }

    pub fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    /// Settings and plan for this invocation.
    pub fn build_plan(
        &self,
        config: &QuizforgeConfig,
    ) -> Result<(DiagnosticSettings, GenerationPlan)> {
        let settings = self.settings(&config.diagnostic);
        let plan = allocate(&settings, &self.catalog(config), &mut self.rng())?;
        Ok((settings, plan))
    }
}
