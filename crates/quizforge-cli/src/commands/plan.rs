//! The `quizforge plan` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizforge_core::allocator::GenerationPlan;
use quizforge_core::model::{DiagnosticSettings, Difficulty};
use quizforge_providers::config::load_config_from;

use super::PlanArgs;

pub fn execute(args: PlanArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let (settings, plan) = args.build_plan(&config)?;

    if plan.is_empty() {
        println!("No topics available: the plan is empty.");
        return Ok(());
    }

    print_plan(&settings, &plan);
    Ok(())
}

/// Per-topic question counts, one row per distinct topic in first-seen order.
#[derive(Debug, PartialEq, Eq)]
struct TopicRow<'a> {
    topic: &'a str,
    easy: u32,
    medium: u32,
    hard: u32,
}

impl TopicRow<'_> {
    fn total(&self) -> u32 {
        self.easy + self.medium + self.hard
    }
}

fn topic_rows(plan: &GenerationPlan) -> Vec<TopicRow<'_>> {
    let mut rows: Vec<TopicRow<'_>> = Vec::new();
    for topic in &plan.topics {
        if rows.iter().any(|r| r.topic == topic) {
            continue;
        }
        let count = |difficulty: Difficulty| -> u32 {
            plan.slots
                .iter()
                .filter(|s| &s.topic_id == topic && s.difficulty == difficulty)
                .map(|s| s.count)
                .sum()
        };
        rows.push(TopicRow {
            topic,
            easy: count(Difficulty::Easy),
            medium: count(Difficulty::Medium),
            hard: count(Difficulty::Hard),
        });
    }
    rows
}

pub fn print_plan(settings: &DiagnosticSettings, plan: &GenerationPlan) {
    let rows = topic_rows(plan);

    let mut table = Table::new();
    table.set_header(vec!["Topic", "Easy", "Medium", "Hard", "Total"]);
    for row in &rows {
        table.add_row(vec![
            Cell::new(row.topic),
            Cell::new(row.easy),
            Cell::new(row.medium),
            Cell::new(row.hard),
            Cell::new(row.total()),
        ]);
    }

    let tiers = plan.tier_counts;
    table.add_row(vec![
        Cell::new("Tier total"),
        Cell::new(tiers.get(Difficulty::Easy)),
        Cell::new(tiers.get(Difficulty::Medium)),
        Cell::new(tiers.get(Difficulty::Hard)),
        Cell::new(tiers.total()),
    ]);

    let distribution = &settings.difficulty_distribution;
    println!(
        "Plan: {} questions requested, {} planned across {} topics ({} slots)",
        plan.requested,
        plan.total(),
        rows.len(),
        plan.slots.len(),
    );
    println!(
        "Distribution: easy {}%, medium {}%, hard {}%",
        distribution.easy, distribution.medium, distribution.hard
    );
    println!("{table}");
}
